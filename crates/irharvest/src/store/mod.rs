//! Sheet storage
//!
//! Output sheets are addressed by name. A run clears every sheet before it
//! fetches, then writes each sheet once; a failure in between leaves the
//! cleared sheets behind.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use irharvest_core::aggregate::COUNT_HEADER;
use irharvest_core::table::{Cell, Table};
use serde::Serialize;

use crate::prelude::*;

mod csv_store;
mod sqlite_store;

pub use csv_store::CsvStore;
pub use sqlite_store::SqliteStore;

/// Named, rectangular output sheets
pub trait SheetStore {
    /// Remove every row of a sheet
    fn clear(&mut self, sheet: &str) -> Result<()>;

    /// Replace a sheet's contents with a header row plus data rows
    fn write(&mut self, sheet: &str, table: &Table) -> Result<()>;

    /// Read a sheet back
    fn read(&self, sheet: &str) -> Result<Table>;
}

fn storage_error(location: &Path, e: impl Display) -> Error {
    Error::Storage(format!("{}: {}", location.display(), e))
}

/// Write `value` as pretty JSON to `path`, replacing the file
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| storage_error(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| storage_error(path, e))?;
    writer.flush().map_err(|e| storage_error(path, e))?;

    Ok(())
}

/// Type a raw value read from an untyped store
///
/// Only a count column holds integers; every other column is text, so
/// values such as `007` survive a round trip unchanged.
fn read_cell(column: &str, raw: &str) -> Cell {
    if column == COUNT_HEADER[1] {
        Cell::parse(raw)
    } else {
        Cell::from(raw)
    }
}
