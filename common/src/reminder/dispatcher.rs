// Notification dispatch across channels
//
// Email goes first, then chat. Each channel's outcome is handled on its
// own: a delivered message is recorded in the ledger per license, a
// skipped channel leaves no ledger trace so the next run retries it, and
// a failed channel is logged without blocking the other one.

use crate::models::{Channel, ExpiringLicense};
use crate::notify::{ChatTransport, Delivery, EmailMessage, EmailTransport};
use crate::reminder::render;
use crate::reminder::threshold::Threshold;
use crate::reminder::ReminderLedger;
use crate::telemetry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fans one threshold batch out to the notification channels and records
/// what was actually delivered
pub struct NotificationDispatcher {
    email: Arc<dyn EmailTransport>,
    chat: Arc<dyn ChatTransport>,
    ledger: Arc<dyn ReminderLedger>,
    base_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn EmailTransport>,
        chat: Arc<dyn ChatTransport>,
        ledger: Arc<dyn ReminderLedger>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            email,
            chat,
            ledger,
            base_url: base_url.into(),
        }
    }

    /// Notify both channels about one threshold batch
    ///
    /// Never fails: channel and ledger errors are logged and contained
    /// here so the engine can move on to the next threshold.
    #[tracing::instrument(skip(self, threshold, licenses), fields(threshold = threshold.label, licenses = licenses.len()))]
    pub async fn notify(&self, threshold: &Threshold, licenses: &[ExpiringLicense]) {
        if licenses.is_empty() {
            debug!("Nothing to dispatch");
            return;
        }

        let title = render::title(threshold);

        let message = EmailMessage {
            subject: render::email_subject(&title),
            html_body: render::email_body(&title, licenses, &self.base_url),
        };
        match self.email.send(&message).await {
            Ok(Delivery::Sent) => {
                info!(channel = %Channel::Email, "Notification delivered");
                telemetry::record_notification_sent(Channel::Email, licenses.len());
                self.record_batch(threshold, Channel::Email, &title, licenses)
                    .await;
            }
            Ok(Delivery::Skipped { reason }) => {
                info!(channel = %Channel::Email, reason = %reason, "Notification skipped");
                telemetry::record_notification_skipped(Channel::Email);
            }
            Err(e) => {
                warn!(channel = %Channel::Email, error = %e, "Notification delivery failed");
                telemetry::record_notification_failed(Channel::Email);
            }
        }

        let text = render::chat_text(&title, licenses);
        match self.chat.post(&text).await {
            Ok(Delivery::Sent) => {
                info!(channel = %Channel::Slack, "Notification delivered");
                telemetry::record_notification_sent(Channel::Slack, licenses.len());
                self.record_batch(threshold, Channel::Slack, &title, licenses)
                    .await;
            }
            Ok(Delivery::Skipped { reason }) => {
                info!(channel = %Channel::Slack, reason = %reason, "Notification skipped");
                telemetry::record_notification_skipped(Channel::Slack);
            }
            Err(e) => {
                warn!(channel = %Channel::Slack, error = %e, "Notification delivery failed");
                telemetry::record_notification_failed(Channel::Slack);
            }
        }
    }

    /// Write one ledger row per license for a channel that went out
    ///
    /// Failures are logged and swallowed; a license whose row could not
    /// be written is picked up again on the next run.
    async fn record_batch(
        &self,
        threshold: &Threshold,
        channel: Channel,
        title: &str,
        licenses: &[ExpiringLicense],
    ) {
        let already = match self
            .ledger
            .already_notified_via(threshold.label, channel)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(channel = %channel, error = %e, "Failed to read ledger before recording");
                HashSet::new()
            }
        };

        for license in licenses {
            if already.contains(&license.license_id) {
                continue;
            }
            match self
                .ledger
                .record(license.license_id, threshold.label, channel, Some(title))
                .await
            {
                Ok(true) => telemetry::record_ledger_write(channel),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        license_id = license.license_id,
                        channel = %channel,
                        error = %e,
                        "Failed to record reminder, it will be retried on the next run"
                    );
                }
            }
        }
    }
}
