use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Query,
    Response,
    Notification,
}

/// In-process message exchanged between an agent and its specialists or
/// orchestrator peers. Queued per recipient, delivered in FIFO order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub kind: MessageKind,
    pub timestamp_ms: i64,
}

impl AgentMessage {
    pub fn new(sender: &str, recipient: &str, content: &str, kind: MessageKind) -> Self {
        Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            content: content.to_string(),
            kind,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn query(sender: &str, recipient: &str, content: &str) -> Self {
        Self::new(sender, recipient, content, MessageKind::Query)
    }

    pub fn response(sender: &str, recipient: &str, content: &str) -> Self {
        Self::new(sender, recipient, content, MessageKind::Response)
    }

    pub fn notification(sender: &str, recipient: &str, content: &str) -> Self {
        Self::new(sender, recipient, content, MessageKind::Notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        let q = AgentMessage::query("orchestrator", "weather", "check NYC");
        assert_eq!(q.kind, MessageKind::Query);
        assert_eq!(q.sender, "orchestrator");
        assert_eq!(q.recipient, "weather");

        let n = AgentMessage::notification("weather", "orchestrator", "rain expected");
        assert_eq!(n.kind, MessageKind::Notification);
        assert!(n.timestamp_ms > 0);
    }
}
