//! Mock mailer for testing.

use async_trait::async_trait;
use lettre::Message;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::email::{EmailError, Mailer};

/// A message handed to the mailer.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Envelope recipients (to and cc).
    pub recipients: Vec<String>,
    /// Envelope sender.
    pub from: Option<String>,
    /// Full RFC 5322 rendering of the message.
    pub formatted: String,
}

/// Mock implementation of the Mailer trait.
///
/// Records every message instead of delivering it. A failure can be queued
/// for the next send.
///
/// # Example
///
/// ```rust,ignore
/// use nics_processors_core::testing::MockMailer;
///
/// let mailer = Arc::new(MockMailer::new());
/// let dispatcher = EmailDispatcher::new(mailer.clone());
/// dispatcher.dispatch(body).await;
///
/// let sent = mailer.sent_messages().await;
/// assert_eq!(sent[0].recipients, vec!["a@example.org".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    /// If set, the next send fails with this transport error.
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Make the next send fail.
    pub async fn fail_next(&self, reason: &str) {
        *self.next_error.write().await = Some(reason.to_string());
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        if let Some(reason) = self.next_error.write().await.take() {
            return Err(EmailError::Transport(reason));
        }

        let envelope = message.envelope();
        let sent = SentMessage {
            recipients: envelope.to().iter().map(|a| a.to_string()).collect(),
            from: envelope.from().map(|a| a.to_string()),
            formatted: String::from_utf8_lossy(&message.formatted()).to_string(),
        };
        self.sent.write().await.push(sent);
        Ok(())
    }
}
