use std::collections::VecDeque;

use crate::fusion::Decision;
use crate::intent::Intent;

/// Per-conversation state threaded explicitly through router and fuser calls.
///
/// Owned by the caller of a request cycle; bounded so a long-lived session
/// cannot grow without limit. Nothing here survives process restart.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    intents: VecDeque<Intent>,
    decisions: VecDeque<Decision>,
    limit: usize,
}

impl ConversationContext {
    pub fn new(limit: usize) -> Self {
        Self {
            intents: VecDeque::new(),
            decisions: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn record_intent(&mut self, intent: Intent) {
        if self.intents.len() == self.limit {
            self.intents.pop_front();
        }
        self.intents.push_back(intent);
    }

    pub fn record_decision(&mut self, decision: Decision) {
        if self.decisions.len() == self.limit {
            self.decisions.pop_front();
        }
        self.decisions.push_back(decision);
    }

    pub fn last_intent(&self) -> Option<&Intent> {
        self.intents.back()
    }

    /// Most recent intent that actually routed somewhere (skips fallbacks),
    /// used for follow-up bias.
    pub fn last_routed_intent(&self) -> Option<&Intent> {
        self.intents.iter().rev().find(|i| !i.is_fallback())
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.decisions.back()
    }

    pub fn intents(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(50)
    }
}
