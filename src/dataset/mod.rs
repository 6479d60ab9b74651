//! In-memory tabular representation of a snapshot.
//!
//! A [`Dataset`] is what the store loads and persists and what the shift
//! engine rewrites. Values are kept as raw [`rusqlite::types::Value`]s so
//! that columns the engine does not touch are written back unchanged.

mod table;

pub use table::{Table, TableSchema};

/// Ordered collection of named tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any existing table with the same name.
    pub fn insert(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.name() == table.name()) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name() == name)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total row count across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }
}

impl FromIterator<Table> for Dataset {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for table in iter {
            dataset.insert(table);
        }
        dataset
    }
}
