use async_trait::async_trait;
use derive_more::{Display, Error, From};
use tracing::{info, warn};

pub mod line;

#[derive(Debug, Display, From, Error)]
pub enum NotifyError {
    #[display(fmt = "messaging channel is not configured")]
    #[from(ignore)]
    NotConfigured,
    #[display(fmt = "push request failed: {}", _0)]
    Http(reqwest::Error),
    #[display(fmt = "push rejected with status {}: {}", status, body)]
    #[from(ignore)]
    Rejected { status: u16, body: String },
}

/// Pushes plain-text messages to a user on the chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push_text(&self, to: &str, text: &str) -> Result<(), NotifyError>;
}

/// Used when no channel credentials are configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn push_text(&self, _to: &str, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Sends `text` and only logs the outcome; callers never see a failure.
pub async fn push_best_effort(notifier: &dyn Notifier, to: &str, text: &str) {
    match notifier.push_text(to, text).await {
        Ok(()) => info!(user_id = to, "message pushing succeeded"),
        Err(e) => warn!(error = %e, user_id = to, "message pushing failed"),
    }
}
