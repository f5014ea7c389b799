pub mod bus;
pub mod context;
pub mod evaluators;
pub mod fusion;
pub mod intent;
pub mod runtime;

pub use bus::MessageBus;
pub use context::ConversationContext;
pub use evaluators::{
    Assessment, EvalRequest, Evaluator, ScheduleEvaluator, SocialEvaluator, WeatherEvaluator,
};
pub use fusion::{Conflict, ConflictKind, Decision, DecisionFuser, FusionStage, Severity};
pub use intent::{Intent, IntentRouter, FALLBACK_CAPABILITY};
pub use runtime::{Assistant, Reply};
