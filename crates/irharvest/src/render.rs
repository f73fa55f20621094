use colored::Colorize;
use irharvest_core::table::Table;
use prettytable::{Cell as PrettyCell, Row};
use serde::Serialize;

use crate::prelude::{println, *};

/// Convert a table into a printable grid with its header as titles
pub fn grid(table: &Table) -> prettytable::Table {
    let mut grid = new_table();
    grid.set_titles(Row::new(
        table.header.iter().map(|h| PrettyCell::new(h)).collect(),
    ));

    for row in &table.rows {
        grid.add_row(Row::new(
            row.iter()
                .map(|cell| PrettyCell::new(&cell.to_string()))
                .collect(),
        ));
    }

    grid
}

/// Print a banner line followed by the table
pub fn print_titled(title: &str, table: &Table) {
    println!("\n{}", title.bright_cyan().bold());
    println!("{}", "=".repeat(80).bright_cyan());
    grid(table).printstd();
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| eyre!("JSON serialization failed: {}", e))
}
