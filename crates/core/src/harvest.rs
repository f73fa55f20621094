//! Accumulation of fetched pages and derivation of the output sheets
//!
//! Pages are independent, disjoint offset windows. [`HarvestBatch`] folds them
//! one at a time into a single flat table; [`derive_outputs`] then builds every
//! secondary table from that flat table alone.

use serde::Serialize;
use std::collections::HashSet;

use crate::aggregate::{aggregate, count_values};
use crate::collections::CollectionMap;
use crate::explode::{drop_empty, explode, VALUE_COLUMN};
use crate::record::{columns, extract, headers, ExtractError, ExtractOptions, FlatRow, Record};
use crate::table::Table;

/// Flat rows accumulated across the pages of one run
#[derive(Debug, Clone)]
pub struct HarvestBatch {
    options: ExtractOptions,
    rows: Vec<FlatRow>,
}

impl HarvestBatch {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            rows: Vec::new(),
        }
    }

    /// Extract every document of one page and append the rows
    ///
    /// The page is all-or-nothing: on the first malformed document the batch
    /// is left as it was and the error is returned.
    pub fn push_page(&mut self, docs: &[Record]) -> Result<usize, ExtractError> {
        let page = docs
            .iter()
            .map(|doc| extract(doc, &self.options))
            .collect::<Result<Vec<_>, _>>()?;

        let added = page.len();
        self.rows.extend(page);
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The flat table, sorted ascending by creation date
    pub fn finish(self) -> Table {
        flat_table(self.rows)
    }
}

/// Build the flat table from rows, sorted ascending by creation date
pub fn flat_table(rows: Vec<FlatRow>) -> Table {
    let mut table = Table::new(headers());
    for row in rows {
        table.push(row.into_cells());
    }
    table.sort_by_column(columns::CREATED);
    table
}

/// Keep the first row for every link
pub fn dedupe_by_link(table: Table) -> Table {
    let mut seen = HashSet::new();
    let rows = table
        .rows
        .into_iter()
        .filter(|row| {
            let link = row
                .get(columns::LINK)
                .map(ToString::to_string)
                .unwrap_or_default();
            seen.insert(link)
        })
        .collect();

    Table {
        header: table.header,
        rows,
    }
}

/// Every sheet written by one run
#[derive(Debug, Clone, Serialize)]
pub struct Outputs {
    pub items: Table,
    pub collections: Table,
    pub facets: Table,
    pub series: Table,
    pub collection_counts: Table,
    pub facet_counts: Table,
}

impl Outputs {
    /// Sheet names in write order
    pub const SHEET_NAMES: [&'static str; 6] = [
        "items",
        "collections",
        "facets",
        "series",
        "collection_counts",
        "facet_counts",
    ];

    /// Sheet names paired with their tables, in write order
    pub fn sheets(&self) -> [(&'static str, &Table); 6] {
        let [items, collections, facets, series, collection_counts, facet_counts] =
            Self::SHEET_NAMES;
        [
            (items, &self.items),
            (collections, &self.collections),
            (facets, &self.facets),
            (series, &self.series),
            (collection_counts, &self.collection_counts),
            (facet_counts, &self.facet_counts),
        ]
    }
}

/// Derive the pivot and count sheets from a flat table
///
/// - `collections`: Member Of exploded on `;`
/// - `facets`: Facets exploded on `;`
/// - `series`: Series exploded on `~`, empty values dropped
/// - `collection_counts`: `collections` counted per mapped collection
/// - `facet_counts`: non-empty `facets` values counted
pub fn derive_outputs(items: Table, collections: &CollectionMap) -> Outputs {
    let membership = explode(&items, columns::LINK, columns::MEMBER_OF, ";");
    let facets = explode(&items, columns::LINK, columns::FACETS, ";");
    let series = drop_empty(&explode(&items, columns::LINK, columns::SERIES, "~"));

    let collection_counts = aggregate(&membership, VALUE_COLUMN, collections);
    let facet_counts = count_values(&drop_empty(&facets), VALUE_COLUMN);

    Outputs {
        items,
        collections: membership,
        facets,
        series,
        collection_counts,
        facet_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use serde_json::json;

    fn doc(
        pid: &str,
        created: &str,
        member_of: &[&str],
        facets: &[&str],
        series: &[&str],
    ) -> Record {
        serde_json::from_value(json!({
            "PID": pid,
            "fgs.createdDate": created,
            "fgs.lastModifiedDate": created,
            "rdf.isMemberOf": member_of,
            "mods.sm_localcorpname": facets,
            "mods.related_series": series,
        }))
        .unwrap()
    }

    fn links(table: &Table) -> Vec<String> {
        table.column(columns::LINK).map(ToString::to_string).collect()
    }

    fn link(local: &str) -> String {
        format!("https://repository.library.noaa.gov/view/noaa/{local}")
    }

    #[test]
    fn test_push_page_accumulates_across_pages() {
        let mut batch = HarvestBatch::new(ExtractOptions::default());

        let first = batch
            .push_page(&[doc("noaa:1", "2019-01-01", &["noaa:6"], &[], &[])])
            .unwrap();
        let second = batch
            .push_page(&[
                doc("noaa:2", "2018-01-01", &["noaa:6"], &[], &[]),
                doc("noaa:3", "2020-01-01", &["noaa:7"], &[], &[]),
            ])
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_finish_sorts_by_creation_date() {
        let mut batch = HarvestBatch::new(ExtractOptions::default());
        batch
            .push_page(&[
                doc("noaa:1", "2019-01-01", &["noaa:6"], &[], &[]),
                doc("noaa:2", "2018-01-01", &["noaa:6"], &[], &[]),
                doc("noaa:3", "2020-01-01", &["noaa:7"], &[], &[]),
            ])
            .unwrap();

        let table = batch.finish();

        assert_eq!(table.header.len(), 13);
        assert_eq!(links(&table), vec![link("2"), link("1"), link("3")]);
    }

    #[test]
    fn test_push_page_is_all_or_nothing() {
        let mut batch = HarvestBatch::new(ExtractOptions::default());
        let broken: Record = serde_json::from_value(json!({"mods.title": "no pid"})).unwrap();

        let valid = doc("noaa:1", "2019-01-01", &["noaa:6"], &[], &[]);

        let result = batch.push_page(&[valid, broken]);

        assert!(matches!(
            result,
            Err(ExtractError::MalformedRecord { pid: None, .. })
        ));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_dedupe_by_link_keeps_first() {
        let mut batch = HarvestBatch::new(ExtractOptions::default());
        batch
            .push_page(&[
                doc("noaa:1", "2019-01-01", &["noaa:6"], &[], &[]),
                doc("noaa:2", "2019-02-01", &["noaa:7"], &[], &[]),
            ])
            .unwrap();
        batch
            .push_page(&[doc("noaa:1", "2019-01-01", &["noaa:7"], &[], &[])])
            .unwrap();

        let table = dedupe_by_link(batch.finish());

        assert_eq!(links(&table), vec![link("1"), link("2")]);
        assert_eq!(table.rows[0][columns::MEMBER_OF], Cell::from("noaa:6"));
    }

    #[test]
    fn test_derive_outputs() {
        let mut batch = HarvestBatch::new(ExtractOptions::default());
        batch
            .push_page(&[
                doc(
                    "noaa:1",
                    "2019-01-01",
                    &["noaa:6", "noaa:7"],
                    &["NWS", "OAR"],
                    &["S1"],
                ),
                doc("noaa:2", "2019-02-01", &["noaa:6"], &[], &[]),
                doc("noaa:3", "2019-03-01", &["noaa:1"], &["NWS"], &["S1", "S2"]),
            ])
            .unwrap();

        let outputs = derive_outputs(batch.finish(), &CollectionMap::default());

        assert_eq!(outputs.collections.len(), 4);
        assert_eq!(outputs.facets.len(), 4);
        assert_eq!(outputs.series.len(), 3);
        assert!(outputs.series.rows.iter().all(|row| !row[1].is_blank()));

        let counts = &outputs.collection_counts;
        assert_eq!(counts.len(), CollectionMap::default().len() + 1);
        assert_eq!(
            counts.rows[0],
            vec![
                Cell::from("National Environmental Policy Act (NEPA)"),
                Cell::Int(1)
            ]
        );
        assert_eq!(
            counts.rows.last().unwrap(),
            &vec![Cell::from("Total"), Cell::Int(4)]
        );

        assert_eq!(
            outputs.facet_counts.rows,
            vec![
                vec![Cell::from("NWS"), Cell::Int(2)],
                vec![Cell::from("OAR"), Cell::Int(1)],
                vec![Cell::from("Total"), Cell::Int(3)],
            ]
        );
    }

    #[test]
    fn test_outputs_sheet_order() {
        let outputs = derive_outputs(Table::new(headers()), &CollectionMap::default());
        let names: Vec<&str> = outputs.sheets().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "items",
                "collections",
                "facets",
                "series",
                "collection_counts",
                "facet_counts"
            ]
        );
        assert_eq!(outputs.sheets()[0].1, &outputs.items);
    }
}
