use irharvest_core::collections::{Collection, CollectionMap};

use crate::prelude::{println, *};
use crate::render::to_json;

#[derive(Debug, clap::Args, Clone)]
pub struct CollectionsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(options: CollectionsOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let map = config.collection_map()?;

    if global.verbose {
        match &config.collections_file {
            Some(path) => println!("Mapping file: {}", path.display()),
            None => println!("Mapping file: built-in"),
        }
        println!();
    }

    if options.json {
        let entries: Vec<&Collection> = map.iter().collect();
        println!("{}", to_json(&entries)?);
        return Ok(());
    }

    collections_table(&map, &config.api_base).printstd();
    Ok(())
}

fn collections_table(map: &CollectionMap, api_base: &str) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row!["Name", "PID", "Endpoint"]);

    for collection in map.iter() {
        table.add_row(prettytable::row![
            collection.name,
            collection.pid,
            format!("{api_base}{}", collection.pid)
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_table_has_one_row_per_entry() {
        let map = CollectionMap::default();
        let table = collections_table(&map, "https://example.org/");

        assert_eq!(table.len(), map.len() + 1);
        assert!(table.to_string().contains("https://example.org/noaa:6"));
    }
}
