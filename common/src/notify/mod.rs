// Outbound notification channels
//
// Transports report one of three outcomes: delivered, skipped because the
// channel is not configured, or failed. Callers branch on the outcome to
// decide whether a reminder gets recorded in the ledger.

use crate::errors::NotifyError;
use async_trait::async_trait;

pub mod email;
pub mod slack;

pub use email::SmtpMailer;
pub use slack::SlackWebhook;

/// A rendered email ready for delivery
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub subject: String,
    pub html_body: String,
}

/// Outcome of a delivery attempt that did not error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The message went out
    Sent,
    /// The transport is not configured; nothing was attempted
    Skipped { reason: String },
}

/// Email delivery transport
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one HTML email to the configured alert recipients
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, NotifyError>;
}

/// Chat delivery transport
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post one plain-text message to the configured chat hook
    async fn post(&self, text: &str) -> Result<Delivery, NotifyError>;
}
