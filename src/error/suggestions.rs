//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! name the table, column or path involved.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::MissingBackup => suggest_missing_backup(context),
        ErrorCode::AnchorUndefined => suggest_anchor_undefined(context),
        ErrorCode::TimeZoneInconsistency => suggest_zone_inconsistency(context),
        ErrorCode::InvalidTimestamp => suggest_invalid_timestamp(context),
        _ => code.suggestion().to_string(),
    }
}

fn context_str<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_missing_backup(context: Option<&Value>) -> String {
    match context_str(context, "path") {
        Some(path) => format!(
            "No backup at {path}. Try:\n  - `timeshift seed <downloaded.sqlite>` to install one\n  - setting TIMESHIFT_BACKUP_PATH if it lives elsewhere"
        ),
        None => ErrorCode::MissingBackup.suggestion().to_string(),
    }
}

fn suggest_anchor_undefined(context: Option<&Value>) -> String {
    match (context_str(context, "table"), context_str(context, "column")) {
        (Some(table), Some(column)) => format!(
            "Every value of {table}.{column} is missing. Pick a populated column with `shift.reference`"
        ),
        _ => ErrorCode::AnchorUndefined.suggestion().to_string(),
    }
}

fn suggest_zone_inconsistency(context: Option<&Value>) -> String {
    let zones = context
        .and_then(|c| c.get("zones"))
        .and_then(Value::as_array)
        .map(|zones| {
            zones
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        });
    match (context_str(context, "column"), zones) {
        (Some(column), Some(zones)) => {
            format!("{column} mixes offsets [{zones}]. Normalize the backup to a single offset")
        }
        _ => ErrorCode::TimeZoneInconsistency.suggestion().to_string(),
    }
}

fn suggest_invalid_timestamp(context: Option<&Value>) -> String {
    match (context_str(context, "column"), context_str(context, "value")) {
        (Some(column), Some(value)) => format!(
            "{column} holds '{value}'. If it marks a missing value, add it to `shift.null_sentinels`"
        ),
        _ => ErrorCode::InvalidTimestamp.suggestion().to_string(),
    }
}
