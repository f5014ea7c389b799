use buddy_core::AgentMessage;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-process message bus with one FIFO queue per recipient id.
///
/// Queues are created lazily on first send and live for the process lifetime
/// only. Each queue expects a single reader (its recipient); that discipline
/// is a convention, not enforced here.
#[derive(Clone, Default)]
pub struct MessageBus {
    queues: Arc<Mutex<HashMap<String, VecDeque<AgentMessage>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn send(&self, message: AgentMessage) {
        debug!(from = %message.sender, to = %message.recipient, "Enqueuing message");
        let mut queues = self.queues.lock().await;
        queues
            .entry(message.recipient.clone())
            .or_default()
            .push_back(message);
    }

    /// Dequeue the oldest pending message for `recipient`, or `None` when
    /// the queue is empty or was never written to.
    pub async fn receive(&self, recipient: &str) -> Option<AgentMessage> {
        let mut queues = self.queues.lock().await;
        queues.get_mut(recipient).and_then(|q| q.pop_front())
    }

    pub async fn pending(&self, recipient: &str) -> usize {
        let queues = self.queues.lock().await;
        queues.get(recipient).map(|q| q.len()).unwrap_or(0)
    }

    /// Drain every pending message for `recipient`, oldest first.
    pub async fn drain(&self, recipient: &str) -> Vec<AgentMessage> {
        let mut queues = self.queues.lock().await;
        queues
            .get_mut(recipient)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order_per_recipient() {
        let bus = MessageBus::new();
        bus.send(AgentMessage::query("a", "worker", "first")).await;
        bus.send(AgentMessage::query("a", "worker", "second")).await;
        bus.send(AgentMessage::query("a", "other", "elsewhere")).await;

        assert_eq!(bus.pending("worker").await, 2);
        assert_eq!(bus.receive("worker").await.unwrap().content, "first");
        assert_eq!(bus.receive("worker").await.unwrap().content, "second");
        assert!(bus.receive("worker").await.is_none());

        // the other queue is untouched
        assert_eq!(bus.receive("other").await.unwrap().content, "elsewhere");
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_empty() {
        let bus = MessageBus::new();
        assert!(bus.receive("nobody").await.is_none());
        assert_eq!(bus.pending("nobody").await, 0);
    }

    #[tokio::test]
    async fn test_drain() {
        let bus = MessageBus::new();
        bus.send(AgentMessage::notification("a", "user", "one")).await;
        bus.send(AgentMessage::notification("a", "user", "two")).await;
        let drained = bus.drain("user").await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].content, "one");
        assert_eq!(bus.pending("user").await, 0);
    }
}
