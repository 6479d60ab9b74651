//! SQLite access for snapshot files: catalog discovery, verbatim table
//! loads, and transactional whole-table replacement.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, params_from_iter};
use serde::Serialize;
use tracing::debug;

use crate::dataset::{Dataset, Table, TableSchema};
use crate::error::{Result, ShiftError};

/// A column as declared in the store's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogColumn {
    pub name: String,
    /// Declared type text; empty declarations are `None`.
    pub declared_type: Option<String>,
}

/// A user table discovered in `sqlite_master`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTable {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
    #[serde(skip)]
    pub create_sql: Option<String>,
    #[serde(skip)]
    pub attached_sql: Vec<String>,
}

impl CatalogTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    fn schema(&self) -> TableSchema {
        TableSchema {
            create_sql: self.create_sql.clone(),
            attached_sql: self.attached_sql.clone(),
            declared_types: self.columns.iter().map(|c| c.declared_type.clone()).collect(),
        }
    }
}

/// The set of user tables in a snapshot, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub tables: Vec<CatalogTable>,
}

impl Catalog {
    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Build a catalog from tables already in memory.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let tables = dataset
            .tables()
            .iter()
            .map(|table| CatalogTable {
                name: table.name().to_string(),
                columns: table
                    .columns()
                    .iter()
                    .map(|name| CatalogColumn {
                        name: name.clone(),
                        declared_type: table.declared_type(name).map(str::to_string),
                    })
                    .collect(),
                create_sql: table.schema().create_sql.clone(),
                attached_sql: table.schema().attached_sql.clone(),
            })
            .collect();
        Self { tables }
    }
}

/// SQLite connection wrapper for a snapshot file.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open a snapshot for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::configure_pragmas(&conn)?;
        Ok(Self { conn })
    }

    /// Open a snapshot without write access. Fails if the file is absent.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Get a reference to the connection
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Enumerate user tables with their columns and schema SQL.
    pub fn catalog(&self) -> Result<Catalog> {
        let mut stmt = self.conn.prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY rowid",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tables = Vec::with_capacity(entries.len());
        for (name, create_sql) in entries {
            let columns = self.columns_of(&name)?;
            let attached_sql = self.attached_sql_of(&name)?;
            tables.push(CatalogTable {
                name,
                columns,
                create_sql,
                attached_sql,
            });
        }
        Ok(Catalog { tables })
    }

    fn columns_of(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                let declared: Option<String> = row.get(1)?;
                Ok(CatalogColumn {
                    name: row.get(0)?,
                    declared_type: declared.filter(|t| !t.trim().is_empty()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    fn attached_sql_of(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT sql FROM sqlite_master
             WHERE tbl_name = ?1 AND type IN ('index', 'trigger') AND sql IS NOT NULL
             ORDER BY rowid",
        )?;
        let sql = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sql)
    }

    /// Load one catalog table verbatim.
    pub fn load_table(&self, entry: &CatalogTable) -> Result<Table> {
        let column_names: Vec<String> = entry.columns.iter().map(|c| c.name.clone()).collect();
        let select = format!(
            "SELECT {} FROM {}",
            column_names
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            quote_ident(&entry.name)
        );

        let mut table = Table::new(entry.name.clone(), column_names).with_schema(entry.schema());
        let width = table.columns().len();
        let mut stmt = self.conn.prepare(&select)?;
        let rows = stmt.query_map([], |row| {
            (0..width)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;
        for row in rows {
            table.push_row(row?);
        }

        debug!(table = %entry.name, rows = table.len(), "loaded table");
        Ok(table)
    }

    /// Load the named tables, or every user table when `names` is `None`.
    pub fn load_tables(&self, names: Option<&[&str]>) -> Result<Dataset> {
        let catalog = self.catalog()?;
        let mut dataset = Dataset::new();
        match names {
            None => {
                for entry in &catalog.tables {
                    dataset.insert(self.load_table(entry)?);
                }
            }
            Some(names) => {
                for name in names {
                    let entry = catalog.table(name).ok_or_else(|| {
                        ShiftError::SchemaMismatch(format!("table '{name}' not found"))
                    })?;
                    dataset.insert(self.load_table(entry)?);
                }
            }
        }
        Ok(dataset)
    }

    /// Replace every table of `dataset` on disk inside one transaction.
    ///
    /// Each table is dropped, recreated from its schema SQL, refilled, and
    /// gets its indexes and triggers back. Any failure rolls the whole
    /// transaction back and is reported as [`ShiftError::PersistFailure`].
    pub fn replace_tables(&mut self, dataset: &Dataset) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|err| ShiftError::PersistFailure(format!("begin transaction: {err}")))?;

        for table in dataset.tables() {
            replace_table(&tx, table).map_err(|err| {
                ShiftError::PersistFailure(format!("table '{}': {err}", table.name()))
            })?;
        }

        tx.commit()
            .map_err(|err| ShiftError::PersistFailure(format!("commit: {err}")))?;
        Ok(())
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        // Rollback journal keeps the snapshot a single self-contained file.
        conn.execute_batch(
            "PRAGMA journal_mode = DELETE;
             PRAGMA synchronous = FULL;
             PRAGMA foreign_keys = OFF;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }
}

fn replace_table(conn: &Connection, table: &Table) -> rusqlite::Result<()> {
    let name = quote_ident(table.name());
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {name};"))?;

    let create_sql = match &table.schema().create_sql {
        Some(sql) => sql.clone(),
        None => synthesize_create(table),
    };
    conn.execute_batch(&create_sql)?;

    if !table.columns().is_empty() {
        let insert = format!(
            "INSERT INTO {name} ({}) VALUES ({})",
            table
                .columns()
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            (1..=table.columns().len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = conn.prepare(&insert)?;
        for row in table.rows() {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }

    for sql in &table.schema().attached_sql {
        conn.execute_batch(sql)?;
    }

    debug!(table = %table.name(), rows = table.len(), "replaced table");
    Ok(())
}

/// `CREATE TABLE` for a table that was built in memory.
fn synthesize_create(table: &Table) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|column| match table.declared_type(column) {
            Some(declared) => format!("{} {declared}", quote_ident(column)),
            None => quote_ident(column),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_ident(table.name()))
}

/// Quote an SQL identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
