//! Error handling for npc-merge.
//!
//! This module provides:
//! - [`NpcError`]: The main error enum for all merge and build operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Serializable error with code, category and hint

mod codes;

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for npc-merge operations.
#[derive(Error, Debug)]
pub enum NpcError {
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    #[error("Panicked: {0}")]
    Panicked(String),

    #[error("Invalid record key format: {0}")]
    Format(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Rule '{rule}' failed: {message}")]
    RuleEvaluation { rule: String, message: String },

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Arc<NpcError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Build blocked: {0}")]
    BuildBlocked(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NpcError {
    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PreconditionViolated(_) => ErrorCode::PreconditionViolated,
            Self::Panicked(_) => ErrorCode::Panicked,
            Self::Format(_) => ErrorCode::RecordKeyFormat,
            Self::Argument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::RecordNotFound,
            Self::RuleEvaluation { .. } => ErrorCode::RuleEvaluationFailed,
            Self::TaskFailed { .. } => ErrorCode::BuildTaskFailed,
            Self::Cancelled => ErrorCode::BuildCancelled,
            Self::BuildBlocked(_) => ErrorCode::BuildBlocked,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
        }
    }

    /// Whether this error represents a deliberate cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::RuleEvaluation { rule, message } => {
                Some(serde_json::json!({ "rule": rule, "message": message }))
            }
            Self::TaskFailed { task, source } => {
                Some(serde_json::json!({ "task": task, "cause": source.to_string() }))
            }
            Self::NotFound(key) => Some(serde_json::json!({ "record_key": key })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Error for a caught panic, keeping its message when it has one.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(message)
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_npc_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "RECORD_KEY_FORMAT")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "record", "build")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from an NpcError.
    #[must_use]
    pub fn from_npc_error(err: &NpcError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&NpcError> for StructuredError {
    fn from(err: &NpcError) -> Self {
        Self::from_npc_error(err)
    }
}

/// Result type alias using NpcError.
pub type Result<T> = std::result::Result<T, NpcError>;
