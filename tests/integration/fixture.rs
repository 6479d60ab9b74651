use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};

/// The wall clock used by most tests: `2025-06-01T10:00:00Z`.
pub fn june_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

/// Every row of `table`, ordered by rowid.
pub fn dump_table(path: &Path, table: &str) -> Vec<Vec<Value>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{table}\" ORDER BY rowid"))
        .unwrap();
    let width = stmt.column_count();
    stmt.query_map([], |row| {
        (0..width).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Vec<_>>>()
    })
    .unwrap()
    .collect::<rusqlite::Result<Vec<_>>>()
    .unwrap()
}

/// One column of `table`, ordered by rowid.
pub fn column(path: &Path, table: &str, column: &str) -> Vec<Value> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT \"{column}\" FROM \"{table}\" ORDER BY rowid"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, Value>(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

/// Text values of a column, `None` for NULL.
pub fn text_column(path: &Path, table: &str, name: &str) -> Vec<Option<String>> {
    column(path, table, name)
        .into_iter()
        .map(|value| match value {
            Value::Text(text) => Some(text),
            Value::Null => None,
            other => panic!("unexpected value in {table}.{name}: {other:?}"),
        })
        .collect()
}

/// Names of every schema object of the given type.
pub fn schema_objects(path: &Path, kind: &str) -> Vec<String> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .unwrap();
    stmt.query_map([kind], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

pub fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}
