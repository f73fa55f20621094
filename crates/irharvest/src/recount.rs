use std::path::PathBuf;

use irharvest_core::collections::CollectionMap;
use irharvest_core::harvest::{derive_outputs, Outputs};
use irharvest_core::record::headers;
use irharvest_core::table::Table;
use log::info;

use crate::prelude::{println, *};
use crate::render::{print_titled, to_json};
use crate::store::{CsvStore, SheetStore, SqliteStore};

#[derive(Debug, clap::Args, Clone)]
pub struct RecountOptions {
    /// Read and rewrite the sheets of this SQLite database instead of the CSV directory
    #[arg(long, value_name = "FILE")]
    pub sqlite: Option<PathBuf>,

    /// Output the count tables as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(options: RecountOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let collections = config.collection_map()?;

    let outputs = match &options.sqlite {
        Some(path) => {
            if global.verbose {
                println!("Database: {}", path.display());
                println!();
            }
            recount(&mut SqliteStore::open(path)?, &collections)?
        }
        None => {
            if global.verbose {
                println!("Output directory: {}", config.output_dir.display());
                println!();
            }
            recount(&mut CsvStore::open(&config.output_dir)?, &collections)?
        }
    };

    if options.json {
        println!(
            "{}",
            to_json(&serde_json::json!({
                "collection_counts": outputs.collection_counts,
                "facet_counts": outputs.facet_counts,
            }))?
        );
    } else {
        print_titled("Items per collection", &outputs.collection_counts);
        print_titled("Items per facet", &outputs.facet_counts);
    }

    Ok(())
}

/// Rederive and rewrite every sheet except `items` from the stored `items` sheet
fn recount<S: SheetStore>(store: &mut S, collections: &CollectionMap) -> Result<Outputs> {
    let items = store.read("items")?;
    check_items_header(&items)?;

    let outputs = derive_outputs(items, collections);
    for (name, table) in outputs.sheets().into_iter().skip(1) {
        store.clear(name)?;
        store.write(name, table)?;
        info!("rewrote {name} ({} rows)", table.len());
    }

    Ok(outputs)
}

fn check_items_header(items: &Table) -> Result<()> {
    if items.header.is_empty() {
        return Err(Error::Storage(
            "the items sheet is empty; run `irharvest harvest` first".to_string(),
        )
        .into());
    }

    if !items.header.iter().map(String::as_str).eq(headers()) {
        return Err(Error::Storage(format!(
            "the items sheet has unexpected columns: {}",
            items.header.join(", ")
        ))
        .into());
    }

    Ok(())
}
