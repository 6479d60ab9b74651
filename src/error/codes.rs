//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Snapshot errors (backup and working files)
//! - 2xx: Schema errors
//! - 3xx: Config errors
//! - 4xx: Temporal errors (anchor, zones, timestamp text)
//! - 6xx: Storage errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `MissingBackup` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Snapshot errors (1xx)
    // ========================================
    /// E101: Backup file is absent or unreadable
    MissingBackup,
    /// E102: File is not a SQLite database
    InvalidSnapshot,

    // ========================================
    // Schema errors (2xx)
    // ========================================
    /// E201: Expected table or column is absent
    SchemaMismatch,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Temporal errors (4xx)
    // ========================================
    /// E401: Reference column has no usable value
    AnchorUndefined,
    /// E402: Reference column mixes UTC offsets
    TimeZoneInconsistency,
    /// E403: A timestamp could not be parsed
    InvalidTimestamp,
    /// E404: The clock reading falls outside the representable range
    ClockOutOfRange,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E604: Database operation failed
    DatabaseError,
    /// E605: Serialization/deserialization failed
    SerializationError,
    /// E606: Transactional write was rolled back
    PersistFailure,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `MissingBackup` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::MissingBackup => 101,
            Self::InvalidSnapshot => 102,

            Self::SchemaMismatch => 201,

            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::AnchorUndefined => 401,
            Self::TimeZoneInconsistency => 402,
            Self::InvalidTimestamp => 403,
            Self::ClockOutOfRange => 404,

            Self::DatabaseError => 604,
            Self::SerializationError => 605,
            Self::PersistFailure => 606,

            Self::IoError => 906,
        }
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::MissingBackup => "Install the dataset first with `timeshift seed <file>`, or point `snapshot.backup_path` at an existing backup",
            Self::InvalidSnapshot => "The file is not a SQLite database. Download the dataset again and re-run `timeshift seed`",
            Self::SchemaMismatch => "The backup does not have the expected tables/columns. Check `shift.columns` and `shift.reference` in the config",
            Self::ConfigInvalid => "Check the config file syntax. Run with -v to see which file was loaded",
            Self::ConfigMissingRequired => "Add the missing value to timeshift.toml or set the matching TIMESHIFT_* variable",
            Self::AnchorUndefined => "The reference column holds no timestamps. Choose another reference with `shift.reference`",
            Self::TimeZoneInconsistency => "The reference column mixes UTC offsets. Normalize the backup or choose another reference column",
            Self::InvalidTimestamp => "A shifted column holds text that is not a timestamp. Add it to `shift.null_sentinels` if it marks a missing value",
            Self::ClockOutOfRange => "The clock reading is outside the supported date range. Pass a realistic `--now`",
            Self::DatabaseError => "The SQLite file may be corrupted. Restore it with `timeshift restore`",
            Self::SerializationError => "Internal serialization failed. Re-run with -vv and report the output",
            Self::PersistFailure => "The working copy was rolled back. Retry `timeshift shift`; restore is idempotent",
            Self::IoError => "Check file permissions and free disk space for the snapshot directory",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::MissingBackup
            | Self::InvalidSnapshot
            | Self::SchemaMismatch
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::AnchorUndefined
            | Self::TimeZoneInconsistency
            | Self::InvalidTimestamp
            | Self::ClockOutOfRange
            | Self::PersistFailure
            | Self::IoError => true,

            Self::DatabaseError | Self::SerializationError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "snapshot",
            2 => "schema",
            3 => "config",
            4 => "temporal",
            6 => "storage",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::MissingBackup,
            Self::InvalidSnapshot,
            Self::SchemaMismatch,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::AnchorUndefined,
            Self::TimeZoneInconsistency,
            Self::InvalidTimestamp,
            Self::ClockOutOfRange,
            Self::DatabaseError,
            Self::SerializationError,
            Self::PersistFailure,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.numeric())
    }
}
