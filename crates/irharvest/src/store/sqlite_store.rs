use std::path::{Path, PathBuf};

use irharvest_core::table::{Cell, Table};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::{storage_error, SheetStore};
use crate::prelude::*;

/// One table per sheet in a SQLite database
///
/// Columns are declared without a type, so every value keeps the storage
/// class it was written with: counts stay integers, text stays text.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_value(cell: Option<&Cell>) -> Value {
    match cell {
        Some(Cell::Int(value)) => Value::Integer(*value),
        Some(Cell::Text(value)) => Value::Text(value.clone()),
        None => Value::Null,
    }
}

fn from_value(value: Value) -> Cell {
    match value {
        Value::Integer(value) => Cell::Int(value),
        Value::Text(value) => Cell::Text(value),
        Value::Real(value) => Cell::Text(value.to_string()),
        Value::Blob(bytes) => Cell::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Null => Cell::from(""),
    }
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| storage_error(&path, e))?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table_exists(&self, sheet: &str) -> Result<bool> {
        let found: i64 = self
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [sheet],
                |row| row.get(0),
            )
            .map_err(|e| storage_error(&self.path, e))?;

        Ok(found > 0)
    }
}

impl SheetStore for SqliteStore {
    /// Delete every row; a sheet that was never written is left absent
    fn clear(&mut self, sheet: &str) -> Result<()> {
        if self.table_exists(sheet)? {
            self.conn
                .execute(&format!("DELETE FROM {}", quote_ident(sheet)), [])
                .map_err(|e| storage_error(&self.path, e))?;
        }
        Ok(())
    }

    fn write(&mut self, sheet: &str, table: &Table) -> Result<()> {
        if table.header.is_empty() {
            return Err(Error::Storage(format!("sheet {sheet} has no columns")).into());
        }

        let name = quote_ident(sheet);
        let columns = table
            .header
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; table.header.len()].join(", ");

        let path = self.path.clone();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| storage_error(&path, e))?;

        tx.execute(&format!("DROP TABLE IF EXISTS {name}"), [])
            .map_err(|e| storage_error(&path, e))?;
        tx.execute(&format!("CREATE TABLE {name} ({columns})"), [])
            .map_err(|e| storage_error(&path, e))?;

        {
            let mut insert = tx
                .prepare(&format!("INSERT INTO {name} VALUES ({placeholders})"))
                .map_err(|e| storage_error(&path, e))?;

            for row in &table.rows {
                let values = (0..table.header.len()).map(|index| to_value(row.get(index)));
                insert
                    .execute(params_from_iter(values))
                    .map_err(|e| storage_error(&path, e))?;
            }
        }

        tx.commit().map_err(|e| storage_error(&path, e))?;
        Ok(())
    }

    fn read(&self, sheet: &str) -> Result<Table> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(sheet)))
            .map_err(|e| storage_error(&self.path, e))?;

        let mut table = Table::new(stmt.column_names());
        let width = table.header.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|index| row.get::<_, Value>(index).map(from_value))
                    .collect::<rusqlite::Result<Vec<Cell>>>()
            })
            .map_err(|e| storage_error(&self.path, e))?;

        for row in rows {
            table.push(row.map_err(|e| storage_error(&self.path, e))?);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Table {
        let mut table = Table::new(["Link", "Published Year", "Facets"]);
        table.push(vec![Cell::from("a"), Cell::from("2019"), Cell::from("007")]);
        table.push(vec![Cell::from("b"), Cell::from(""), Cell::from("NWS")]);
        table
    }

    fn counts() -> Table {
        let mut table = Table::new(["Name", "Count"]);
        table.push(vec![Cell::from("Say \"hi\""), Cell::Int(4)]);
        table.push(vec![Cell::from("Total"), Cell::Int(4)]);
        table
    }

    #[test]
    fn test_write_then_read_keeps_cell_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ir.sqlite")).unwrap();

        store.write("items", &items()).unwrap();
        store.write("facet_counts", &counts()).unwrap();

        assert_eq!(store.read("items").unwrap(), items());
        assert_eq!(store.read("facet_counts").unwrap(), counts());
    }

    #[test]
    fn test_write_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ir.sqlite")).unwrap();

        store.write("facets", &items()).unwrap();
        store.write("facets", &counts()).unwrap();

        assert_eq!(store.read("facets").unwrap(), counts());
    }

    #[test]
    fn test_clear_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ir.sqlite")).unwrap();

        store.clear("items").unwrap();
        store.write("items", &items()).unwrap();
        store.clear("items").unwrap();

        let table = store.read("items").unwrap();
        assert_eq!(table.header, vec!["Link", "Published Year", "Facets"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_sheets_persist_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ir.sqlite");

        SqliteStore::open(&path)
            .unwrap()
            .write("items", &items())
            .unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.read("items").unwrap(), items());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_read_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("ir.sqlite")).unwrap();

        assert!(store.read("series").is_err());
    }

    #[test]
    fn test_write_without_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ir.sqlite")).unwrap();

        assert!(store.write("items", &Table::default()).is_err());
    }
}
