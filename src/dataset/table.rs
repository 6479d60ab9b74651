//! A single in-memory table.

use rusqlite::types::Value;

/// Schema SQL captured from `sqlite_master` so a replaced table keeps its
/// declared types, keys, indexes and triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    /// The `CREATE TABLE` statement, if the table came from a store.
    pub create_sql: Option<String>,
    /// `CREATE INDEX` / `CREATE TRIGGER` statements attached to the table.
    pub attached_sql: Vec<String>,
    /// Declared column types, parallel to the table's columns.
    pub declared_types: Vec<Option<String>>,
}

/// A named table: ordered column names plus rows of raw SQLite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    schema: TableSchema,
}

impl Table {
    /// Create an empty table with the given columns and no stored schema.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            schema: TableSchema::default(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub const fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Append a row. Short rows are padded with NULL; extra values are
    /// dropped so every row matches the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Values of one column in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Replace every value of one column. Returns `false` if the column does
    /// not exist or the value count does not match the row count.
    pub fn replace_column(&mut self, column: &str, values: Vec<Value>) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        if values.len() != self.rows.len() {
            return false;
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        true
    }

    /// Declared type of a column as written in the schema, if known.
    pub fn declared_type(&self, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.schema
            .declared_types
            .get(idx)
            .and_then(|t| t.as_deref())
    }
}
