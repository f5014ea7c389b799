use async_trait::async_trait;
use buddy_core::{DataOrigin, Error, Result};
use lettre::message::{header, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::{DeliveryReceipt, MessagingProvider, Outgoing};

/// SMTP message delivery (STARTTLS on 587, implicit TLS on 465).
pub struct SmtpMessagingProvider {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
}

impl SmtpMessagingProvider {
    pub fn new(host: &str, port: u16, username: &str, password: &str, from: &str) -> Self {
        let from = if from.is_empty() { username } else { from };
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            from: from.to_string(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(self.username.clone(), self.password.clone());
        let builder = if self.port == 465 {
            SmtpTransport::relay(&self.host)
                .map_err(|e| Error::ProviderUnavailable(format!("SMTP relay error: {}", e)))?
        } else {
            SmtpTransport::starttls_relay(&self.host)
                .map_err(|e| Error::ProviderUnavailable(format!("SMTP STARTTLS error: {}", e)))?
        };
        Ok(builder.credentials(creds).port(self.port).build())
    }
}

#[async_trait]
impl MessagingProvider for SmtpMessagingProvider {
    async fn send(&self, outgoing: Outgoing) -> Result<DeliveryReceipt> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid 'from' address '{}': {}", self.from, e)))?;
        let to: Mailbox = outgoing
            .target
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid recipient '{}': {}", outgoing.target, e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(&outgoing.subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(outgoing.body.clone())
            .map_err(|e| Error::Other(format!("Failed to build email: {}", e)))?;

        let mailer = self.build_transport()?;
        mailer
            .send(&email)
            .map_err(|e| Error::ProviderUnavailable(format!("Failed to send email: {}", e)))?;

        info!(to = %outgoing.target, subject = %outgoing.subject, "Email sent");

        Ok(DeliveryReceipt {
            target: outgoing.target,
            delivered: true,
            preview: None,
            origin: DataOrigin::Live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_recipient_is_validation_error() {
        let provider = SmtpMessagingProvider::new("smtp.gmail.com", 587, "me@example.com", "pw", "");
        let result = provider
            .send(Outgoing {
                target: "not-an-address".to_string(),
                subject: "hi".to_string(),
                body: "body".to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_from_defaults_to_username() {
        let provider = SmtpMessagingProvider::new("smtp.gmail.com", 587, "me@example.com", "pw", "");
        assert_eq!(provider.from, "me@example.com");
    }
}
