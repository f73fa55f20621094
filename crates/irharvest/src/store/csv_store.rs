use std::fs::File;
use std::path::PathBuf;

use irharvest_core::table::Table;

use super::{read_cell, storage_error, SheetStore};
use crate::prelude::*;

/// One `<sheet>.csv` file per sheet in a directory
///
/// A cleared sheet is an empty file and reads back with no header.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Use `dir` for sheets, creating it if it does not exist
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

impl SheetStore for CsvStore {
    fn clear(&mut self, sheet: &str) -> Result<()> {
        let path = self.path(sheet);
        File::create(&path).map_err(|e| storage_error(&path, e))?;
        Ok(())
    }

    fn write(&mut self, sheet: &str, table: &Table) -> Result<()> {
        let path = self.path(sheet);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| storage_error(&path, e))?;

        writer
            .write_record(&table.header)
            .map_err(|e| storage_error(&path, e))?;

        for row in &table.rows {
            writer
                .write_record(row.iter().map(ToString::to_string))
                .map_err(|e| storage_error(&path, e))?;
        }

        writer.flush().map_err(|e| storage_error(&path, e))?;
        Ok(())
    }

    fn read(&self, sheet: &str) -> Result<Table> {
        let path = self.path(sheet);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| storage_error(&path, e))?;

        let mut records = reader.records();

        let header = match records.next() {
            Some(record) => record.map_err(|e| storage_error(&path, e))?,
            None => return Ok(Table::default()),
        };

        let mut table = Table::new(header.iter());
        for record in records {
            let record = record.map_err(|e| storage_error(&path, e))?;
            let row = record
                .iter()
                .enumerate()
                .map(|(index, raw)| read_cell(header.get(index).unwrap_or_default(), raw))
                .collect();
            table.push(row);
        }

        Ok(table)
    }
}
