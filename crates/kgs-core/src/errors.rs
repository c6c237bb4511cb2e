//! Structured error type shared across the k-graph skeleton crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`KgsError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (vertex ids, colors, sizes, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the rewrite engine.
///
/// `InvalidArgument`, `NotFound` and `PreconditionFailed` are surfaced to the
/// caller, who may retry with a different component. `InvariantViolation`
/// marks a defect: a viability check and its action disagree. It must not be
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum KgsError {
    /// Bad color, malformed component shape or inconsistent construction input.
    #[error("invalid argument: {0}")]
    InvalidArgument(ErrorInfo),
    /// A vertex or edge is absent.
    #[error("not found: {0}")]
    NotFound(ErrorInfo),
    /// An operation was invoked in a state that does not permit it.
    #[error("precondition failed: {0}")]
    PreconditionFailed(ErrorInfo),
    /// Internal invariant failure.
    #[error("invariant violation: {0}")]
    InvariantViolation(ErrorInfo),
    /// Malformed persisted payloads.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl KgsError {
    /// Builds an [`KgsError::InvalidArgument`] error.
    pub fn invalid_argument(code: impl Into<String>, message: impl Into<String>) -> Self {
        KgsError::InvalidArgument(ErrorInfo::new(code, message))
    }

    /// Builds a [`KgsError::NotFound`] error.
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        KgsError::NotFound(ErrorInfo::new(code, message))
    }

    /// Builds a [`KgsError::PreconditionFailed`] error.
    pub fn precondition(code: impl Into<String>, message: impl Into<String>) -> Self {
        KgsError::PreconditionFailed(ErrorInfo::new(code, message))
    }

    /// Builds a [`KgsError::InvariantViolation`] error.
    pub fn invariant(code: impl Into<String>, message: impl Into<String>) -> Self {
        KgsError::InvariantViolation(ErrorInfo::new(code, message))
    }

    /// Builds a [`KgsError::Serde`] error.
    pub fn serde(code: impl Into<String>, message: impl Into<String>) -> Self {
        KgsError::Serde(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            KgsError::InvalidArgument(info)
            | KgsError::NotFound(info)
            | KgsError::PreconditionFailed(info)
            | KgsError::InvariantViolation(info)
            | KgsError::Serde(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Returns whether the error signals a defect rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KgsError::InvariantViolation(_))
    }

    /// Adds a context entry to the payload, keeping the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        match self {
            KgsError::InvalidArgument(info) => {
                KgsError::InvalidArgument(info.with_context(key, value))
            }
            KgsError::NotFound(info) => KgsError::NotFound(info.with_context(key, value)),
            KgsError::PreconditionFailed(info) => {
                KgsError::PreconditionFailed(info.with_context(key, value))
            }
            KgsError::InvariantViolation(info) => {
                KgsError::InvariantViolation(info.with_context(key, value))
            }
            KgsError::Serde(info) => KgsError::Serde(info.with_context(key, value)),
        }
    }

    /// Sets a remediation hint, keeping the error family.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            KgsError::InvalidArgument(info) => KgsError::InvalidArgument(info.with_hint(hint)),
            KgsError::NotFound(info) => KgsError::NotFound(info.with_hint(hint)),
            KgsError::PreconditionFailed(info) => {
                KgsError::PreconditionFailed(info.with_hint(hint))
            }
            KgsError::InvariantViolation(info) => {
                KgsError::InvariantViolation(info.with_hint(hint))
            }
            KgsError::Serde(info) => KgsError::Serde(info.with_hint(hint)),
        }
    }
}
