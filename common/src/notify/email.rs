// SMTP email transport

use crate::config::NotifierConfig;
use crate::errors::NotifyError;
use crate::notify::{Delivery, EmailMessage, EmailTransport};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP transport for reminder emails
///
/// The relay is built once at startup; recipients come from the comma
/// separated alert list in configuration. An empty list is valid and
/// turns every send into a skip.
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    /// Build a mailer from notifier configuration
    ///
    /// Fails when the from address or any recipient does not parse, or
    /// when the SMTP relay cannot be set up.
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let from: Mailbox =
            config
                .from_email
                .parse()
                .map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
                    address: config.from_email.clone(),
                    reason: e.to_string(),
                })?;

        let recipients = parse_recipients(&config.alert_to)?;

        let mut builder = if config.smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp.host)
        }
        .map_err(|e| NotifyError::SmtpSetup(e.to_string()))?
        .port(config.smtp.port);

        if let (Some(user), Some(pass)) = (&config.smtp.user, &config.smtp.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
            recipients,
        })
    }
}

/// Parse a comma separated recipient list, ignoring empty entries
fn parse_recipients(alert_to: &str) -> Result<Vec<Mailbox>, NotifyError> {
    alert_to
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|addr| {
            addr.parse::<Mailbox>()
                .map_err(|e| NotifyError::InvalidAddress {
                    address: addr.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    #[tracing::instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, NotifyError> {
        if self.recipients.is_empty() {
            return Ok(Delivery::Skipped {
                reason: "no alert recipient configured".to_string(),
            });
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        let email = builder
            .body(message.html_body.clone())
            .map_err(|e| NotifyError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::SmtpSend(e.to_string()))?;

        tracing::debug!(
            recipients = self.recipients.len(),
            "Email handed to SMTP relay"
        );
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn test_config(alert_to: &str) -> NotifierConfig {
        NotifierConfig {
            base_url: "http://localhost:8080".to_string(),
            from_email: "Licenses <no-reply@example.com>".to_string(),
            alert_to: alert_to.to_string(),
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                secure: false,
                user: None,
                pass: None,
            },
            slack_webhook_url: None,
        }
    }

    #[test]
    fn test_parse_recipients_splits_and_trims() {
        let boxes = parse_recipients("it@example.com, ops@example.com ,").unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].email.to_string(), "it@example.com");
        assert_eq!(boxes[1].email.to_string(), "ops@example.com");
    }

    #[test]
    fn test_parse_recipients_empty_list() {
        assert!(parse_recipients("").unwrap().is_empty());
        assert!(parse_recipients("  ,  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_recipients_rejects_bad_address() {
        let err = parse_recipients("not-an-address").unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress { .. }));
    }

    #[test]
    fn test_mailer_rejects_bad_from_address() {
        let mut config = test_config("it@example.com");
        config.from_email = "nope".to_string();
        assert!(SmtpMailer::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_mailer_accepts_display_name_in_from() {
        let mailer = SmtpMailer::new(&test_config("it@example.com")).unwrap();
        assert_eq!(mailer.from.email.to_string(), "no-reply@example.com");
    }

    #[tokio::test]
    async fn test_send_skips_without_recipients() {
        // Relay setup is lazy, so this never touches the network
        let mailer = SmtpMailer::new(&test_config("")).unwrap();
        let message = EmailMessage {
            subject: "[Licenses] Expired licenses".to_string(),
            html_body: "<p>Expired licenses</p>".to_string(),
        };
        match mailer.send(&message).await.unwrap() {
            Delivery::Skipped { reason } => assert!(reason.contains("recipient")),
            other => panic!("expected skip, got {:?}", other),
        }
    }
}
