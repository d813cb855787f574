/// Application state and router builder
///
/// Defines the shared state cloned into every handler and assembles the
/// Axum router: public auth endpoints, protected project/team/task
/// endpoints behind the bearer-auth layer, CORS, and request tracing.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::auth::{identity, token::TokenKeys};
use taskhive_shared::models::user::User;
use taskhive_shared::notify::{HttpRelayNotifier, InviteNotifier, NoopNotifier};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// The authenticated user, injected into request extensions by the auth
/// layer
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// The raw bearer token as presented, kept around for logout
#[derive(Clone)]
pub struct BearerToken(pub String);

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; everything inside is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token signing/verification keys
    pub token_keys: TokenKeys,

    /// Invitation notification sink
    pub notifier: Arc<dyn InviteNotifier>,
}

impl AppState {
    /// Creates application state from a pool and loaded configuration
    ///
    /// Picks the notifier from config: an HTTP relay when one is
    /// configured, otherwise the logging no-op.
    pub fn new(db: PgPool, config: Config) -> Self {
        let token_keys = TokenKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds);

        let notifier: Arc<dyn InviteNotifier> = match &config.notify.relay_url {
            Some(url) => Arc::new(HttpRelayNotifier::new(
                url.clone(),
                config.notify.accept_url.clone(),
            )),
            None => Arc::new(NoopNotifier),
        };

        Self {
            db,
            config: Arc::new(config),
            token_keys,
            notifier,
        }
    }

    /// Creates application state with an explicit notifier (tests)
    pub fn with_notifier(db: PgPool, config: Config, notifier: Arc<dyn InviteNotifier>) -> Self {
        let token_keys = TokenKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds);

        Self {
            db,
            config: Arc::new(config),
            token_keys,
            notifier,
        }
    }
}

/// Builds the complete Axum router
///
/// # Route map
///
/// ```text
/// /
/// ├── GET  /health                                  # public
/// ├── POST /register  /login                        # public
/// ├── POST /logout                                  # bearer
/// ├── POST /create-project                          # bearer
/// ├── /projects/...   invite, accept/decline-invite,
/// │                   assign-role, remove-user,
/// │                   detail, delete                # bearer
/// ├── /teams/...      create, invite, accept/decline-invite,
/// │                   assign-role, tasks            # bearer
/// ├── DELETE /memberships/:id                       # bearer
/// ├── /roles  /permissions                          # bearer
/// └── /tasks/...      status, delete, comments      # bearer
/// ```
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/create-project", post(routes::projects::create_project))
        .route("/projects/:id/invite", post(routes::projects::invite_user))
        .route("/projects/accept-invite", post(routes::projects::accept_invite))
        .route("/projects/decline-invite", post(routes::projects::decline_invite))
        .route("/projects/assign-role", post(routes::projects::assign_role))
        .route(
            "/projects/:id/remove-user/:user_id",
            delete(routes::projects::remove_user),
        )
        .route("/projects/:id", get(routes::projects::project_detail))
        .route("/projects/:id", delete(routes::projects::delete_project))
        .route("/teams/create", post(routes::teams::create_team))
        .route("/teams/:id/invite", post(routes::teams::invite_user))
        .route("/teams/accept-invite", post(routes::teams::accept_invite))
        .route("/teams/decline-invite", post(routes::teams::decline_invite))
        .route("/teams/assign-role", post(routes::teams::assign_role))
        .route("/memberships/:id", delete(routes::teams::remove_membership))
        .route("/roles/create", post(routes::roles::create_role))
        .route("/roles", get(routes::roles::list_roles))
        .route("/permissions", get(routes::roles::list_permissions))
        .route("/teams/:id/tasks", post(routes::tasks::create_task))
        .route("/tasks/:id/status", patch(routes::tasks::set_status))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route("/tasks/:id/comments", post(routes::tasks::create_comment))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Extracts the bearer token, resolves the authenticated user (signature,
/// expiry, blacklist, user existence), and injects [`CurrentUser`] and
/// [`BearerToken`] into request extensions. Every protected route depends
/// on this and nothing else for identity.
async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?
        .to_string();

    let user = identity::resolve_current_user(&state.db, &state.token_keys, &token).await?;

    req.extensions_mut().insert(CurrentUser(user));
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}
