//! Anchor, current time and the global offset, plus applying it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::plan::{ColumnRef, ShiftPlan};
use super::timestamp::{Cell, Timestamp, Zone, classify, format_utc};
use crate::dataset::{Dataset, Table};
use crate::error::{Result, ShiftError};

/// How the clock instant is placed in the reference zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPolicy {
    /// Attach the reference offset to the UTC wall-clock reading.
    #[default]
    Localize,
    /// Convert the instant into the reference zone.
    Convert,
}

impl fmt::Display for AnchorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Localize => f.write_str("localize"),
            Self::Convert => f.write_str("convert"),
        }
    }
}

impl FromStr for AnchorPolicy {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localize" => Ok(Self::Localize),
            "convert" => Ok(Self::Convert),
            other => Err(ShiftError::Config(format!(
                "unknown anchor policy {other:?} (expected localize or convert)"
            ))),
        }
    }
}

/// Result of the offset computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetComputation {
    /// Latest non-missing reference value, in the reference zone.
    pub anchor: DateTime<FixedOffset>,
    pub zone: Zone,
    pub current_time: DateTime<FixedOffset>,
    pub offset: TimeDelta,
}

/// Counts for one rewritten column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnShift {
    pub table: String,
    pub column: String,
    pub shifted: usize,
    pub missing: usize,
}

/// The single zone shared by every parsed reference value.
pub fn infer_zone(column: &ColumnRef, values: &[Timestamp]) -> Result<Zone> {
    let mut zones: Vec<Zone> = Vec::new();
    for value in values {
        if !zones.contains(&value.zone()) {
            zones.push(value.zone());
        }
    }
    match zones.as_slice() {
        [] | [Zone::Naive] => Ok(Zone::Naive),
        [zone] => Ok(*zone),
        _ => Err(ShiftError::TimeZoneInconsistency {
            column: column.to_string(),
            zones: zones.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// Place `now` in `zone` according to `policy`.
pub fn current_time(now: DateTime<Utc>, zone: Zone, policy: AnchorPolicy) -> Result<DateTime<FixedOffset>> {
    let offset = zone.offset();
    match policy {
        AnchorPolicy::Convert => Ok(now.with_timezone(&offset)),
        AnchorPolicy::Localize => {
            let shift = TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            now.naive_utc()
                .checked_sub_signed(shift)
                .map(|utc| DateTime::from_naive_utc_and_offset(utc, offset))
                .ok_or_else(|| ShiftError::ClockOutOfRange {
                    now: now.to_rfc3339(),
                    zone: zone.to_string(),
                })
        }
    }
}

/// Compute `current_time - max(reference)` over `dataset`.
pub fn compute_offset(
    dataset: &Dataset,
    plan: &ShiftPlan,
    policy: AnchorPolicy,
    now: DateTime<Utc>,
) -> Result<OffsetComputation> {
    let reference = plan.reference();
    let table = planned_table(dataset, reference)?;
    let parsed = parse_column(table, reference, plan.null_sentinels())?;
    let present: Vec<Timestamp> = parsed.into_iter().flatten().collect();
    let zone = infer_zone(reference, &present)?;

    let anchor = present
        .iter()
        .max_by_key(|ts| ts.to_utc())
        .map(Timestamp::to_fixed)
        .ok_or_else(|| ShiftError::AnchorUndefined {
            table: reference.table.clone(),
            column: reference.column.clone(),
        })?;

    let current_time = current_time(now, zone, policy)?;
    let offset = current_time.signed_duration_since(anchor);
    debug!(%anchor, %zone, %current_time, offset_seconds = offset.num_seconds(), "computed offset");
    Ok(OffsetComputation {
        anchor,
        zone,
        current_time,
        offset,
    })
}

/// Add `offset` to every non-missing value of every planned column.
///
/// All columns are parsed and shifted before any is written back, so on
/// error `dataset` is left as it was.
pub fn apply_offset(dataset: &mut Dataset, plan: &ShiftPlan, offset: TimeDelta) -> Result<Vec<ColumnShift>> {
    let mut staged: Vec<(&ColumnRef, Vec<Value>, ColumnShift)> = Vec::with_capacity(plan.columns().len());
    for column in plan.columns() {
        let table = planned_table(dataset, column)?;
        let parsed = parse_column(table, column, plan.null_sentinels())?;
        let mut counts = ColumnShift {
            table: column.table.clone(),
            column: column.column.clone(),
            shifted: 0,
            missing: 0,
        };
        let mut values = Vec::with_capacity(parsed.len());
        for (row, ts) in parsed.into_iter().enumerate() {
            let Some(ts) = ts else {
                counts.missing += 1;
                values.push(Value::Null);
                continue;
            };
            // Shifted text must stay within four-digit years to parse back.
            let shifted = ts
                .to_utc()
                .checked_add_signed(offset)
                .filter(|instant| (0..=9999).contains(&instant.year()))
                .ok_or_else(|| ShiftError::InvalidTimestamp {
                    table: column.table.clone(),
                    column: column.column.clone(),
                    row,
                    value: format!("{} (out of range after shift)", format_utc(ts.to_utc())),
                })?;
            counts.shifted += 1;
            values.push(Value::Text(format_utc(shifted)));
        }
        staged.push((column, values, counts));
    }

    let mut report = Vec::with_capacity(staged.len());
    for (column, values, counts) in staged {
        write_column(dataset, column, values)?;
        debug!(column = %column, shifted = counts.shifted, missing = counts.missing, "shifted column");
        report.push(counts);
    }
    Ok(report)
}

fn write_column(dataset: &mut Dataset, column: &ColumnRef, values: Vec<Value>) -> Result<()> {
    let written = dataset
        .table_mut(&column.table)
        .is_some_and(|table| table.replace_column(&column.column, values));
    if written {
        Ok(())
    } else {
        Err(ShiftError::SchemaMismatch(format!("cannot write shifted column: {column}")))
    }
}

fn planned_table<'a>(dataset: &'a Dataset, column: &ColumnRef) -> Result<&'a Table> {
    dataset
        .table(&column.table)
        .filter(|table| table.has_column(&column.column))
        .ok_or_else(|| ShiftError::SchemaMismatch(format!("missing column: {column}")))
}

/// Parse a column into optional timestamps; missing cells become `None`.
fn parse_column(table: &Table, column: &ColumnRef, null_sentinels: &[String]) -> Result<Vec<Option<Timestamp>>> {
    let values = table
        .column_values(&column.column)
        .ok_or_else(|| ShiftError::SchemaMismatch(format!("missing column: {column}")))?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let invalid = |value: String| ShiftError::InvalidTimestamp {
                table: column.table.clone(),
                column: column.column.clone(),
                row,
                value,
            };
            match classify(value, null_sentinels) {
                Cell::Missing => Ok(None),
                Cell::Text(text) => Timestamp::parse(text).map(Some).ok_or_else(|| invalid(text.to_string())),
                Cell::Unsupported(kind) => Err(invalid(format!("<{kind}>"))),
            }
        })
        .collect()
}
