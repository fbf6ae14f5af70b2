//! Notification Dispatch
//!
//! Outbound notification abstraction. Dispatch is fire-and-forget from the
//! caller's point of view: delivery failures are reported to the caller for
//! logging but are never retried here. The default sender for local
//! development and tests logs the payload instead of delivering it.

use serde_json::Value;
use thiserror::Error;

/// Dispatch errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// A templated outbound message.
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    /// Template name understood by the delivery backend
    pub template: String,
    /// Destination address (email)
    pub to: String,
    /// Template variables
    pub variables: Value,
    /// Attachment references (paths or URLs)
    pub attachments: Vec<String>,
    pub priority: Priority,
}

impl NotificationMessage {
    pub fn new(template: impl Into<String>, to: impl Into<String>, variables: Value) -> Self {
        Self {
            template: template.into(),
            to: to.into(),
            variables,
            attachments: Vec::new(),
            priority: Priority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Notification delivery contract.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Deliver a message or return an error for the caller to log.
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError>;
}

/// Local dev/test sender that logs instead of delivering.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        tracing::info!(
            template = %message.template,
            to = %message.to,
            variables = %message.variables,
            "notification send stub"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_accepts_messages() {
        let notifier = LogNotifier;
        let message = NotificationMessage::new(
            "verify-email",
            "user@example.com",
            serde_json::json!({ "code": "123456" }),
        )
        .with_priority(Priority::High);

        assert!(notifier.send(&message).await.is_ok());
    }
}
