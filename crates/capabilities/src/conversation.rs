use async_trait::async_trait;
use buddy_core::{CapabilityResult, Result};
use serde_json::{json, Value};

use crate::{Capability, CapabilityContext, CapabilitySchema};

/// Catch-all target for input that matches no routing rule. Every request
/// resolves to some capability; this one answers with an acknowledgement and
/// a summary of what the assistant can do.
#[derive(Debug)]
pub struct ConversationCapability;

#[async_trait]
impl Capability for ConversationCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "conversation",
            description: "General conversation fallback: acknowledges the input and lists available commands.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The original user input"
                    }
                },
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<CapabilityResult> {
        let text = params.get("text").and_then(|v| v.as_str()).unwrap_or("");
        let name = &ctx.config.agent.name;

        let message = if text.is_empty() {
            help_text(name)
        } else {
            format!(
                "I'm {} and I didn't recognize a specific request in: \"{}\".\n\n{}",
                name,
                text,
                help_text(name)
            )
        };

        Ok(CapabilityResult::ok(message))
    }
}

fn help_text(name: &str) -> String {
    format!(
        "Here's what {} can help with:\n\
         - Weather: \"What's the weather in Paris?\"\n\
         - Reminders: \"Remind me to call mom\"\n\
         - Calendar: \"Schedule team lunch at 2025-06-10T12:00:00Z\", \"Show my events\"\n\
         - Email: \"Send email to john@example.com about the meeting\"\n\
         - Social: \"Show me trending topics\", \"Post to X: hello\"",
        name
    )
}
