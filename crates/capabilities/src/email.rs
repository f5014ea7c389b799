use async_trait::async_trait;
use buddy_core::{CapabilityResult, Error, Result};
use buddy_providers::{MessagingProvider, Outgoing, PreviewMessaging};
use serde_json::{json, Value};
use tracing::warn;

use crate::{required_str, Capability, CapabilityContext, CapabilitySchema};

/// Send an email through the configured messaging provider. With no SMTP
/// credentials the message is rendered as a preview instead of delivered;
/// that still counts as success, flagged synthetic.
#[derive(Debug)]
pub struct EmailCapability;

#[async_trait]
impl Capability for EmailCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "email",
            description: "Compose and send an email. Degrades to a rendered preview when no SMTP transport is configured.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "to": {
                        "type": "string",
                        "description": "Recipient email address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Subject line, default 'Message from your assistant'"
                    },
                    "body": {
                        "type": "string",
                        "description": "Message body. Generated from the subject when omitted."
                    }
                },
                "required": ["to"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let to = required_str(params, "to")?;
        if !to.contains('@') || to.starts_with('@') || to.ends_with('@') {
            return Err(Error::Validation(format!(
                "Parameter 'to' does not look like an email address: {}",
                to
            )));
        }
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<CapabilityResult> {
        let to = params["to"].as_str().unwrap_or_default().to_string();
        let subject = params
            .get("subject")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("Message from your assistant")
            .to_string();
        let body = match params.get("body").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
            Some(body) => body.to_string(),
            None => format!("Hello,\n\nRegarding: {}\n\nBest regards,\n{}", subject, ctx.config.agent.name),
        };

        let outgoing = Outgoing {
            target: to.clone(),
            subject: subject.clone(),
            body,
        };

        let receipt = match ctx.messaging.send(outgoing.clone()).await {
            Ok(receipt) => receipt,
            Err(Error::ProviderUnavailable(reason)) => {
                warn!(to = %to, reason, "Messaging provider unavailable, degrading to preview");
                PreviewMessaging.send(outgoing).await?
            }
            Err(e) => return Err(e),
        };

        let message = if receipt.delivered {
            format!("Email sent to {}", to)
        } else {
            format!(
                "Email transport not configured; preview only.\n\n{}",
                receipt.preview.clone().unwrap_or_default()
            )
        };

        Ok(CapabilityResult::ok_with_data(
            message,
            json!({
                "to": to,
                "subject": subject,
                "delivered": receipt.delivered,
                "origin": receipt.origin,
            }),
        ))
    }
}
