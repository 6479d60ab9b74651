//! Error handling for timeshift.
//!
//! This module provides:
//! - [`ShiftError`]: The main error enum for all timeshift operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for snapshot and shift operations.
#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Backup not found or unreadable: {}", .path.display())]
    MissingBackup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a SQLite snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("No anchor available: every value of {table}.{column} is missing")]
    AnchorUndefined { table: String, column: String },

    #[error("Inconsistent time zones in {column}: {}", .zones.join(", "))]
    TimeZoneInconsistency { column: String, zones: Vec<String> },

    #[error("Invalid timestamp in {table}.{column} at row {row}: {value:?}")]
    InvalidTimestamp {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Clock reading {now} cannot be placed in zone {zone}")]
    ClockOutOfRange { now: String, zone: String },

    #[error("Persist failed, working copy rolled back: {0}")]
    PersistFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),
}

impl ShiftError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingBackup { .. } => ErrorCode::MissingBackup,
            Self::InvalidSnapshot(_) => ErrorCode::InvalidSnapshot,
            Self::SchemaMismatch(_) => ErrorCode::SchemaMismatch,
            Self::AnchorUndefined { .. } => ErrorCode::AnchorUndefined,
            Self::TimeZoneInconsistency { .. } => ErrorCode::TimeZoneInconsistency,
            Self::InvalidTimestamp { .. } => ErrorCode::InvalidTimestamp,
            Self::ClockOutOfRange { .. } => ErrorCode::ClockOutOfRange,
            Self::PersistFailure(_) => ErrorCode::PersistFailure,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::MissingBackup { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            Self::AnchorUndefined { table, column } => {
                Some(serde_json::json!({ "table": table, "column": column }))
            }
            Self::TimeZoneInconsistency { column, zones } => {
                Some(serde_json::json!({ "column": column, "zones": zones }))
            }
            Self::InvalidTimestamp {
                table,
                column,
                row,
                value,
            } => Some(serde_json::json!({
                "table": table,
                "column": format!("{table}.{column}"),
                "row": row,
                "value": value,
            })),
            Self::ClockOutOfRange { now, zone } => Some(serde_json::json!({ "now": now, "zone": zone })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_shift_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Emitted in robot mode so that the calling agent can decide whether to
/// retry, re-seed, or give up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "MISSING_BACKUP")
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

    /// Error category (e.g., "snapshot", "temporal")
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

    /// Create a structured error from a [`ShiftError`].
    #[must_use]
    pub fn from_shift_error(err: &ShiftError) -> Self {
        let code = err.code();
        let context = err.context();
        let mut structured = Self::new(code, err.to_string());
        structured.suggestion = suggest_for_error(code, context.as_ref());
        structured.context = context;
        structured
    }

}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result type alias using [`ShiftError`].
pub type Result<T> = std::result::Result<T, ShiftError>;
