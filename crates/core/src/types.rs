use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Machine-readable failure category carried inside a [`CapabilityResult`].
///
/// Capability execution never surfaces raw errors to the router; failures are
/// folded into the result with one of these kinds so callers can branch
/// without string matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing parameters; the handler was never invoked.
    Validation,
    /// Unknown capability or recipient.
    NotFound,
    /// Execution exceeded the caller's budget.
    Timeout,
    /// External dependency unconfigured or unreachable.
    ProviderUnavailable,
    /// Handler ran and failed.
    Execution,
}

impl ErrorKind {
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            _ => ErrorKind::Execution,
        }
    }
}

/// Whether a payload came from a live provider or a synthetic fallback.
///
/// Synthetic data is a first-class outcome: an unconfigured provider still
/// produces a successful result, clearly flagged so downstream confidence
/// scoring can discount it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    #[default]
    Live,
    Synthetic,
}

impl DataOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataOrigin::Synthetic)
    }
}

/// Structured outcome of one capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl CapabilityResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(kind),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::err(ErrorKind::from_error(err), err.to_string())
    }

    /// True when the payload is flagged as synthetic fallback data.
    pub fn is_synthetic(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("origin"))
            .and_then(|o| o.as_str())
            .map(|o| o == "synthetic")
            .unwrap_or(false)
    }
}
