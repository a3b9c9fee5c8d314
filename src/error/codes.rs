//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Record identity errors
//! - 3xx: Config errors
//! - 4xx: Compatibility rule errors
//! - 5xx: Build errors
//! - 6xx: Storage errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `RecordKeyFormat` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Record identity errors (1xx)
    // ========================================
    /// E101: Record key text is not `{formid}:{plugin}`
    RecordKeyFormat,
    /// E102: An argument or input value was blank or malformed
    InvalidArgument,
    /// E103: No record with the requested key exists in the load order
    RecordNotFound,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Compatibility errors (4xx)
    // ========================================
    /// E401: A compatibility rule failed while evaluating a record
    RuleEvaluationFailed,

    // ========================================
    // Build errors (5xx)
    // ========================================
    /// E501: A build stage failed
    BuildTaskFailed,
    /// E502: The build was cancelled
    BuildCancelled,
    /// E503: Build blocked by a safety policy
    BuildBlocked,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Filesystem operation failed
    IoError,
    /// E602: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Caller violated a documented precondition
    PreconditionViolated,
    /// E902: A stage or rule panicked
    Panicked,
}

impl ErrorCode {
    /// Numeric code used in robot output (`E` prefix is added on display).
    #[must_use]
    pub const fn numeric(self) -> u16 {
        match self {
            Self::RecordKeyFormat => 101,
            Self::InvalidArgument => 102,
            Self::RecordNotFound => 103,
            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,
            Self::RuleEvaluationFailed => 401,
            Self::BuildTaskFailed => 501,
            Self::BuildCancelled => 502,
            Self::BuildBlocked => 503,
            Self::IoError => 601,
            Self::SerializationError => 602,
            Self::PreconditionViolated => 901,
            Self::Panicked => 902,
        }
    }

    /// Category name for grouping in robot output.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::RecordKeyFormat | Self::InvalidArgument | Self::RecordNotFound => "record",
            Self::ConfigInvalid | Self::ConfigMissingRequired => "config",
            Self::RuleEvaluationFailed => "compatibility",
            Self::BuildTaskFailed | Self::BuildCancelled | Self::BuildBlocked => "build",
            Self::IoError | Self::SerializationError => "storage",
            Self::PreconditionViolated | Self::Panicked => "internal",
        }
    }

    /// Whether the user can reasonably fix this and retry.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::PreconditionViolated | Self::Panicked)
    }

    /// Short recovery hint.
    #[must_use]
    pub const fn suggestion(self) -> &'static str {
        match self {
            Self::RecordKeyFormat => "Use the form '<formid>:<plugin>', e.g. '000A2C94:Skyrim.esm'",
            Self::InvalidArgument => "Check the command arguments and input file",
            Self::RecordNotFound => "Check that the record's plugin is enabled in the load order",
            Self::ConfigInvalid => "Fix the config file syntax and retry",
            Self::ConfigMissingRequired => "Add the missing value to the config file",
            Self::RuleEvaluationFailed => "The record was excluded; check the log for details",
            Self::BuildTaskFailed => "See the failing stage's error and retry the build",
            Self::BuildCancelled => "Start the build again",
            Self::BuildBlocked => "Resolve the reported warnings or set build.wig_safety = \"warn\"",
            Self::IoError => "Check file paths and permissions",
            Self::SerializationError => "Check that the input file is valid JSON",
            Self::PreconditionViolated | Self::Panicked => "Report this as a bug",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.numeric())
    }
}
