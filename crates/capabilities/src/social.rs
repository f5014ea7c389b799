use async_trait::async_trait;
use buddy_core::{CapabilityResult, DataOrigin, Error, Result};
use serde_json::{json, Value};

use crate::{required_str, Capability, CapabilityContext, CapabilitySchema};

const ACTIONS: [&str; 2] = ["trends", "post"];

/// Topics served when the social API is not configured. Mirrors the trends
/// digest the assistant shows during demos.
pub const FALLBACK_TRENDS: [&str; 5] = [
    "AI & Technology",
    "Breaking News",
    "World Events",
    "Sports Updates",
    "Entertainment",
];

/// Social media surface: trending-topics digest and posting. Posting is
/// simulated; a missing bearer token additionally flags the digest as
/// synthetic so downstream scoring can discount it.
#[derive(Debug)]
pub struct SocialCapability;

#[async_trait]
impl Capability for SocialCapability {
    fn schema(&self) -> CapabilitySchema {
        CapabilitySchema {
            name: "social",
            description: "Social media: summarize trending topics or post an update.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ACTIONS,
                        "description": "Social operation to perform"
                    },
                    "text": {
                        "type": "string",
                        "description": "(post) Text to publish"
                    }
                },
                "required": ["action"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let action = required_str(params, "action")?;
        if !ACTIONS.contains(&action) {
            return Err(Error::Validation(format!(
                "Unknown social action '{}'. Must be one of: {}",
                action,
                ACTIONS.join(", ")
            )));
        }
        if action == "post" {
            required_str(params, "text")?;
        }
        Ok(())
    }

    async fn execute(&self, ctx: CapabilityContext, params: Value) -> Result<CapabilityResult> {
        let configured = ctx.config.providers.social.resolved_token().is_some();
        let origin = if configured { DataOrigin::Live } else { DataOrigin::Synthetic };

        match params["action"].as_str().unwrap_or_default() {
            "trends" => {
                let mut lines = vec!["Trending topics:".to_string()];
                for (i, trend) in FALLBACK_TRENDS.iter().enumerate() {
                    lines.push(format!("{}. {}", i + 1, trend));
                }
                if !configured {
                    lines.push("(simulated digest; configure X_BEARER_TOKEN for live trends)".to_string());
                }
                Ok(CapabilityResult::ok_with_data(
                    lines.join("\n"),
                    json!({"trends": FALLBACK_TRENDS, "origin": origin}),
                ))
            }
            "post" => {
                let text = params["text"].as_str().unwrap_or_default();
                let post_id = format!("post-{}", uuid::Uuid::new_v4().simple());
                let shown: String = text.chars().take(50).collect();
                Ok(CapabilityResult::ok_with_data(
                    format!("Post published: '{}'", shown),
                    json!({"post_id": post_id, "text": text, "origin": origin}),
                ))
            }
            other => Err(Error::Validation(format!("Unknown social action: {}", other))),
        }
    }
}
