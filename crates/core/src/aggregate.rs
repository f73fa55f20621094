//! Count tables with a trailing total row

use std::collections::HashMap;

use crate::collections::CollectionMap;
use crate::table::{Cell, Table};

/// Header of every count table
pub const COUNT_HEADER: [&str; 2] = ["Name", "Count"];

/// Label of the trailing total row
pub const TOTAL_LABEL: &str = "Total";

/// Count occurrences of each distinct cell value
fn item_counts<'a>(cells: impl Iterator<Item = &'a Cell>) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for cell in cells {
        *counts.entry(cell.to_string()).or_insert(0) += 1;
    }
    counts
}

/// `["Total", sum]` over the integer second cells of `rows`
///
/// Text cells (headers, labels) are ignored.
pub fn total_row(rows: &[Vec<Cell>]) -> Vec<Cell> {
    let sum: i64 = rows.iter().filter_map(|row| row.get(1)?.as_int()).sum();
    vec![Cell::from(TOTAL_LABEL), Cell::Int(sum)]
}

/// Count how often each mapped PID appears in `join_column`
///
/// One `[name, count]` row per mapping entry in mapping order, zero counts
/// included, followed by the total row. Matches are exact, so multi-valued
/// cells should be exploded first.
pub fn aggregate(table: &Table, join_column: usize, collections: &CollectionMap) -> Table {
    let counts = item_counts(table.column(join_column));
    let mut output = Table::new(COUNT_HEADER);

    for collection in collections.iter() {
        let count = counts.get(&collection.pid).copied().unwrap_or(0);
        output.push(vec![Cell::from(collection.name.as_str()), Cell::Int(count)]);
    }

    let total = total_row(&output.rows);
    output.push(total);
    output
}

/// Count every distinct value of `column`, in first-seen order, plus the total row
pub fn count_values(table: &Table, column: usize) -> Table {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, i64> = HashMap::new();

    for cell in table.column(column) {
        let key = cell.to_string();
        let count = counts.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            0
        });
        *count += 1;
    }

    let mut output = Table::new(COUNT_HEADER);
    for value in order {
        let count = counts[&value];
        output.push(vec![Cell::from(value), Cell::Int(count)]);
    }

    let total = total_row(&output.rows);
    output.push(total);
    output
}
