/// Invitation notifications
///
/// Outbound notification delivery is an external collaborator: the core
/// hands it `(recipient, context name, token)` and moves on. Dispatch is
/// fire-and-forget on a spawned task; a failed or slow delivery is logged
/// and never blocks or fails the request whose transaction already
/// committed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Delivery interface for invitation notifications
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    /// Delivers an invitation to `recipient` for the named scope, carrying
    /// the invitation token
    async fn send_invite(&self, recipient: &str, context_name: &str, token: &str)
        -> anyhow::Result<()>;
}

/// Notifier that POSTs a JSON payload to a mail relay endpoint
///
/// The relay owns SMTP credentials and templating; the API only ships the
/// recipient, the scope name, and the accept link.
pub struct HttpRelayNotifier {
    client: reqwest::Client,
    endpoint: String,
    accept_url_base: String,
}

impl HttpRelayNotifier {
    /// Creates a notifier targeting the given relay endpoint
    ///
    /// `accept_url_base` is the public URL the invitation link points at,
    /// e.g. "https://hive.example.com/accept-invite".
    pub fn new(endpoint: String, accept_url_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            accept_url_base,
        }
    }
}

#[async_trait]
impl InviteNotifier for HttpRelayNotifier {
    async fn send_invite(
        &self,
        recipient: &str,
        context_name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let link = format!("{}?token={}", self.accept_url_base, token);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "to": recipient,
                "subject": format!("Invitation to join {}", context_name),
                "body": format!("Click to accept: {}", link),
            }))
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}

/// Notifier that records the invitation in the log and does nothing else
///
/// Used when no relay endpoint is configured, and as the test double.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl InviteNotifier for NoopNotifier {
    async fn send_invite(
        &self,
        recipient: &str,
        context_name: &str,
        _token: &str,
    ) -> anyhow::Result<()> {
        info!(recipient, context_name, "Invitation notification suppressed (no relay configured)");
        Ok(())
    }
}

/// Dispatches an invitation on a detached task
///
/// Failures are logged at warn level only; the membership transaction has
/// already committed and the HTTP response does not wait.
pub fn dispatch_invite(
    notifier: Arc<dyn InviteNotifier>,
    recipient: String,
    context_name: String,
    token: String,
) {
    tokio::spawn(async move {
        if let Err(e) = notifier
            .send_invite(&recipient, &context_name, &token)
            .await
        {
            warn!(recipient, context_name, "Failed to send invitation notification: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_notifier_always_succeeds() {
        let notifier = NoopNotifier;
        assert!(notifier
            .send_invite("bob@example.com", "Apollo", "tok")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_does_not_block() {
        let notifier: Arc<dyn InviteNotifier> = Arc::new(NoopNotifier);
        // Returns immediately; the send happens on a spawned task.
        dispatch_invite(
            notifier,
            "bob@example.com".to_string(),
            "Apollo".to_string(),
            "tok".to_string(),
        );
    }
}
