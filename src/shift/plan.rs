//! Which columns get shifted, and which one anchors the offset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftError};
use crate::storage::Catalog;

/// A `table.column` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl FromStr for ColumnRef {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('.') {
            Some((table, column))
                if !table.is_empty() && !column.is_empty() && !column.contains('.') =>
            {
                Ok(Self::new(table, column))
            }
            _ => Err(ShiftError::Config(format!(
                "expected `table.column`, got {s:?}"
            ))),
        }
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = ShiftError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

/// Default reference column.
pub const DEFAULT_REFERENCE: &str = "flights.actual_departure";

/// Default shift set.
pub const DEFAULT_COLUMNS: [&str; 5] = [
    "bookings.book_date",
    "flights.scheduled_departure",
    "flights.scheduled_arrival",
    "flights.actual_departure",
    "flights.actual_arrival",
];

/// Default null sentinel: the two-character text `\N`.
pub const DEFAULT_NULL_SENTINEL: &str = "\\N";

/// The declared shift set plus the reference column and null sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPlan {
    reference: ColumnRef,
    columns: Vec<ColumnRef>,
    null_sentinels: Vec<String>,
}

impl Default for ShiftPlan {
    fn default() -> Self {
        let parse = |s: &str| {
            let (table, column) = s.split_once('.').unwrap_or((s, ""));
            ColumnRef::new(table, column)
        };
        Self::new(
            parse(DEFAULT_REFERENCE),
            DEFAULT_COLUMNS.iter().map(|s| parse(s)).collect(),
            vec![DEFAULT_NULL_SENTINEL.to_string()],
        )
    }
}

impl ShiftPlan {
    /// Build a plan. The reference column is added to `columns` when absent
    /// and duplicates are dropped, keeping first occurrence order.
    pub fn new(reference: ColumnRef, columns: Vec<ColumnRef>, null_sentinels: Vec<String>) -> Self {
        let mut deduped: Vec<ColumnRef> = Vec::with_capacity(columns.len() + 1);
        for column in columns.into_iter().chain(std::iter::once(reference.clone())) {
            if !deduped.contains(&column) {
                deduped.push(column);
            }
        }
        Self {
            reference,
            columns: deduped,
            null_sentinels,
        }
    }

    pub const fn reference(&self) -> &ColumnRef {
        &self.reference
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn null_sentinels(&self) -> &[String] {
        &self.null_sentinels
    }

    /// Distinct tables touched by the plan, in plan order.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for column in &self.columns {
            if !tables.contains(&column.table.as_str()) {
                tables.push(&column.table);
            }
        }
        tables
    }

    /// Check every planned pair exists in `catalog`, reporting all misses.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| {
                catalog
                    .table(&c.table)
                    .is_none_or(|table| !table.has_column(&c.column))
            })
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShiftError::SchemaMismatch(format!(
                "missing column(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Columns whose declared type looks temporal but are not planned.
    pub fn undeclared_temporal_columns(&self, catalog: &Catalog) -> Vec<ColumnRef> {
        catalog
            .tables
            .iter()
            .flat_map(|table| {
                table.columns.iter().filter_map(move |column| {
                    let declared = column.declared_type.as_deref()?.to_ascii_lowercase();
                    let temporal = ["date", "time"].iter().any(|t| declared.contains(t));
                    temporal.then(|| ColumnRef::new(&table.name, &column.name))
                })
            })
            .filter(|c| !self.columns.contains(c))
            .collect()
    }
}
