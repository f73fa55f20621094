//! One-to-many pivot of delimiter-joined cells

use crate::table::{Cell, Table};

/// Header of every pivot table
pub const PIVOT_HEADER: [&str; 2] = ["id", "Name"];

/// Column of a pivot table holding the exploded value
pub const VALUE_COLUMN: usize = 1;

/// Split a multi-value column into one `[id, value]` row per value
///
/// A cell without the delimiter (the empty cell included) yields exactly one
/// row, so empty cells show up as `[id, ""]`; see [`drop_empty`]. An empty
/// delimiter never splits.
pub fn explode(table: &Table, id_column: usize, value_column: usize, delimiter: &str) -> Table {
    let mut pivot = Table::new(PIVOT_HEADER);

    for row in &table.rows {
        let id = row.get(id_column).cloned().unwrap_or_else(|| Cell::from(""));
        let value = row
            .get(value_column)
            .map(ToString::to_string)
            .unwrap_or_default();

        if delimiter.is_empty() {
            pivot.push(vec![id, Cell::from(value)]);
            continue;
        }

        for token in value.split(delimiter) {
            pivot.push(vec![id.clone(), Cell::from(token)]);
        }
    }

    pivot
}

/// Remove pivot rows whose value is the empty string
pub fn drop_empty(table: &Table) -> Table {
    Table {
        header: table.header.clone(),
        rows: table
            .rows
            .iter()
            .filter(|row| !row.get(VALUE_COLUMN).is_some_and(Cell::is_blank))
            .cloned()
            .collect(),
    }
}
