pub mod config;
pub mod error;
pub mod message;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{AgentMessage, MessageKind};
pub use types::{CapabilityResult, DataOrigin, ErrorKind};
