use std::path::PathBuf;

use colored::Colorize;
use irharvest_core::collections::CollectionMap;
use irharvest_core::fiscal::FiscalCalendar;
use irharvest_core::harvest::{dedupe_by_link, derive_outputs, HarvestBatch, Outputs};
use irharvest_core::paging::plan_pages;
use irharvest_core::record::Record;
use irharvest_core::table::Table;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::{println, *};
use crate::render::{print_titled, to_json};
use crate::repository::{RepositoryClient, SearchSource};
use crate::store::{write_json, CsvStore, SheetStore, SqliteStore};

#[derive(Debug, clap::Args, Clone)]
pub struct HarvestOptions {
    /// Collection name, number or PID (e.g. `noaa:6`)
    #[arg(value_name = "COLLECTION", required_unless_present = "all")]
    pub collection: Option<String>,

    /// Harvest every configured collection, keeping each item once
    #[arg(long, conflicts_with = "collection")]
    pub all: bool,

    /// Label fiscal years with the legacy spreadsheet table
    #[arg(long)]
    pub legacy_fiscal_years: bool,

    /// Also write every sheet as a table of this SQLite database
    #[arg(long, value_name = "FILE")]
    pub sqlite: Option<PathBuf>,

    /// Also write every fetched document, undecoded, as a JSON array
    #[arg(long, value_name = "FILE")]
    pub raw_json: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Document counts of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fetched {
    reported: u64,
    received: usize,
}

impl Fetched {
    /// Documents reported by `numFound` but never returned
    fn shortfall(&self) -> Option<u64> {
        self.reported
            .checked_sub(self.received as u64)
            .filter(|missing| *missing > 0)
    }
}

#[derive(Debug, Serialize)]
struct SheetSummary {
    name: &'static str,
    rows: usize,
    path: String,
}

#[derive(Debug, Serialize)]
struct HarvestSummary<'a> {
    collections: Vec<String>,
    items: usize,
    sheets: Vec<SheetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_json: Option<String>,
    collection_counts: &'a Table,
}

pub async fn run(options: HarvestOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let collections = config.collection_map()?;
    let pids = target_pids(&options, &collections)?;

    if global.verbose {
        println!("API base: {}", config.api_base);
        println!("Page size: {}", config.page_size);
        println!("Output directory: {}", config.output_dir.display());
        if let Some(path) = &options.sqlite {
            println!("Database: {}", path.display());
        }
        println!("Collections: {}", pids.join(", "));
        println!();
    }

    let calendar = if options.legacy_fiscal_years {
        FiscalCalendar::Legacy
    } else {
        FiscalCalendar::Federal
    };

    let mut store = CsvStore::open(&config.output_dir)?;
    let mut database = options.sqlite.as_ref().map(SqliteStore::open).transpose()?;

    for sheet in Outputs::SHEET_NAMES {
        store.clear(sheet)?;
        if let Some(database) = database.as_mut() {
            database.clear(sheet)?;
        }
    }

    let client = RepositoryClient::new(&config.api_base)?;
    let mut batch = HarvestBatch::new(config.extract_options(calendar));
    let mut raw_docs = options.raw_json.as_ref().map(|_| Vec::new());

    for pid in &pids {
        harvest_collection(
            &client,
            &mut batch,
            pid,
            config.page_size,
            raw_docs.as_mut(),
        )
        .await?;
    }

    if let (Some(path), Some(docs)) = (&options.raw_json, &raw_docs) {
        write_json(path, docs)?;
        info!("wrote {} raw documents to {}", docs.len(), path.display());
    }

    let mut items = batch.finish();
    if options.all {
        let before = items.len();
        items = dedupe_by_link(items);
        info!("kept {} unique items out of {before}", items.len());
    }

    let outputs = derive_outputs(items, &collections);
    write_outputs(&mut store, &outputs)?;
    if let Some(database) = database.as_mut() {
        write_outputs(database, &outputs)?;
    }

    let summary = HarvestSummary {
        collections: pids,
        items: outputs.items.len(),
        sheets: outputs
            .sheets()
            .into_iter()
            .map(|(name, table)| SheetSummary {
                name,
                rows: table.len(),
                path: store.path(name).display().to_string(),
            })
            .collect(),
        database: database.map(|d| d.path().display().to_string()),
        raw_json: options.raw_json.map(|p| p.display().to_string()),
        collection_counts: &outputs.collection_counts,
    };

    if options.json {
        println!("{}", to_json(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// PIDs to harvest, in order
fn target_pids(options: &HarvestOptions, collections: &CollectionMap) -> Result<Vec<String>> {
    if options.all {
        return Ok(collections.iter().map(|c| c.pid.clone()).collect());
    }

    let input = options
        .collection
        .as_deref()
        .ok_or_eyre("A collection is required unless --all is given")?;

    Ok(vec![collections.resolve(input)?])
}

/// Fetch every page of one collection into the batch
///
/// Pages are requested one after another; the first failure aborts the run.
/// When `raw_docs` is given, every document of every page is appended to it
/// as received.
async fn harvest_collection<S: SearchSource>(
    source: &S,
    batch: &mut HarvestBatch,
    pid: &str,
    page_size: u64,
    mut raw_docs: Option<&mut Vec<Value>>,
) -> Result<Fetched> {
    let endpoint = source.collection_endpoint(pid);
    let total = source.total_count(&endpoint).await?;

    if total == 0 {
        warn!("{pid} reports no documents");
        return Ok(Fetched {
            reported: 0,
            received: 0,
        });
    }

    let plan = plan_pages(&endpoint, total, page_size)?;
    let urls = plan.request_urls(total);
    info!("{pid}: {total} documents in {} request(s)", urls.len());

    let mut received = 0;
    for (index, url) in urls.iter().enumerate() {
        let docs = source.fetch(url).await?.response.docs;

        let records = docs
            .iter()
            .map(Record::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::Fetch(format!("{url}: invalid document: {e}")))?;

        let count = batch
            .push_page(&records)
            .map_err(|e| eyre!("Failed to extract page {} of {}: {}", index + 1, pid, e))?;

        info!("{pid}: page {}/{} added {count} rows", index + 1, urls.len());
        received += count;

        if let Some(raw) = raw_docs.as_mut() {
            raw.extend(docs);
        }
    }

    let fetched = Fetched {
        reported: total,
        received,
    };
    if let Some(missing) = fetched.shortfall() {
        warn!("{pid}: expected {total} documents, received {received} ({missing} missing)");
    }

    Ok(fetched)
}

/// Write every derived sheet, replacing what was there
fn write_outputs<S: SheetStore>(store: &mut S, outputs: &Outputs) -> Result<()> {
    for (name, table) in outputs.sheets() {
        store.write(name, table)?;
        info!("wrote {name} ({} rows)", table.len());
    }
    Ok(())
}

fn print_summary(summary: &HarvestSummary<'_>) {
    println!("\n{}", "=".repeat(80).bright_cyan());
    println!(
        "{}",
        format!(
            "HARVESTED {} ITEM(S) FROM {} COLLECTION(S)",
            summary.items,
            summary.collections.len()
        )
        .bright_cyan()
        .bold()
    );
    println!("{}", "=".repeat(80).bright_cyan());

    let mut table = new_table();
    table.add_row(prettytable::row!["Sheet", "Rows", "File"]);
    for sheet in &summary.sheets {
        table.add_row(prettytable::row![sheet.name, sheet.rows, sheet.path]);
    }
    table.printstd();

    if let Some(path) = &summary.database {
        println!("Database: {path}");
    }
    if let Some(path) = &summary.raw_json {
        println!("Raw documents: {path}");
    }

    print_titled("Items per collection", summary.collection_counts);
}
