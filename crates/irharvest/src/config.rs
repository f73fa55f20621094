//! Repository settings from environment variables, with command-line overrides

use std::path::{Path, PathBuf};

use irharvest_core::collections::{CollectionMap, PID_SCHEME};
use irharvest_core::fiscal::FiscalCalendar;
use irharvest_core::record::{ExtractOptions, DEFAULT_ITEM_BASE};

use crate::prelude::*;

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Export endpoint prefix; a collection PID is appended to it
    pub api_base: String,
    pub item_base: String,
    pub page_size: u64,
    pub collections_file: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Global flags that take precedence over the environment
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Export endpoint prefix (overrides IR_API_BASE)
    #[clap(long, global = true)]
    pub api_base: Option<String>,

    /// Landing-page base used for item links (overrides IR_ITEM_BASE)
    #[clap(long, global = true)]
    pub item_base: Option<String>,

    /// Maximum documents per request (overrides IR_PAGE_SIZE)
    #[clap(long, global = true)]
    pub page_size: Option<u64>,

    /// TOML collection mapping (overrides IR_COLLECTIONS_FILE)
    #[clap(long, global = true, value_name = "FILE")]
    pub collections: Option<PathBuf>,

    /// Directory the CSV sheets live in (overrides IR_OUTPUT_DIR)
    #[clap(long, global = true, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

impl RepositoryConfig {
    pub const DEFAULT_API_BASE: &'static str =
        "https://repository.library.noaa.gov/fedora/export/view/collection/";

    pub const DEFAULT_PAGE_SIZE: u64 = 1500;

    pub const DEFAULT_OUTPUT_DIR: &'static str = "output";

    /// Load configuration from environment variables
    ///
    /// Every variable is optional: IR_API_BASE, IR_ITEM_BASE, IR_PAGE_SIZE,
    /// IR_COLLECTIONS_FILE and IR_OUTPUT_DIR.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let page_size = match lookup("IR_PAGE_SIZE") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("IR_PAGE_SIZE must be an integer, got {raw:?}: {e}"))
            })?,
            None => Self::DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_base: lookup("IR_API_BASE").unwrap_or_else(|| Self::DEFAULT_API_BASE.to_string()),
            item_base: lookup("IR_ITEM_BASE").unwrap_or_else(|| DEFAULT_ITEM_BASE.to_string()),
            page_size,
            collections_file: lookup("IR_COLLECTIONS_FILE").map(PathBuf::from),
            output_dir: lookup("IR_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_OUTPUT_DIR)),
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(api_base) = &overrides.api_base {
            self.api_base = api_base.clone();
        }
        if let Some(item_base) = &overrides.item_base {
            self.item_base = item_base.clone();
        }
        if let Some(page_size) = overrides.page_size {
            self.page_size = page_size;
        }
        if let Some(path) = &overrides.collections {
            self.collections_file = Some(path.clone());
        }
        if let Some(dir) = &overrides.out {
            self.output_dir = dir.clone();
        }
        self
    }

    /// The mapping file when one is configured, the built-in mapping otherwise
    pub fn collection_map(&self) -> Result<CollectionMap> {
        match &self.collections_file {
            Some(path) => load_collection_map(path),
            None => Ok(CollectionMap::default()),
        }
    }

    pub fn extract_options(&self, calendar: FiscalCalendar) -> ExtractOptions {
        ExtractOptions {
            pid_scheme: PID_SCHEME.to_string(),
            item_base: self.item_base.clone(),
            calendar,
        }
    }
}

fn load_collection_map(path: &Path) -> Result<CollectionMap> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let map = CollectionMap::from_toml(&source)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    Ok(map)
}

/// Environment configuration with the global flags applied
pub fn load(global: &crate::Global) -> Result<RepositoryConfig> {
    Ok(RepositoryConfig::from_env()?.with_overrides(&global.overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn from_vars(vars: &[(&str, &str)]) -> Result<RepositoryConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RepositoryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config.api_base, RepositoryConfig::DEFAULT_API_BASE);
        assert_eq!(config.item_base, DEFAULT_ITEM_BASE);
        assert_eq!(config.page_size, 1500);
        assert_eq!(config.collections_file, None);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_environment_values() {
        let config = from_vars(&[
            ("IR_API_BASE", "http://localhost:8080/collection/"),
            ("IR_PAGE_SIZE", " 200 "),
            ("IR_COLLECTIONS_FILE", "mapping.toml"),
            ("IR_OUTPUT_DIR", "/tmp/sheets"),
        ])
        .unwrap();

        assert_eq!(config.api_base, "http://localhost:8080/collection/");
        assert_eq!(config.page_size, 200);
        assert_eq!(config.collections_file, Some(PathBuf::from("mapping.toml")));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/sheets"));
    }

    #[test]
    fn test_invalid_page_size() {
        let err = from_vars(&[("IR_PAGE_SIZE", "lots")]).unwrap_err();
        assert!(err.to_string().contains("IR_PAGE_SIZE"));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            page_size: Some(10),
            out: Some(PathBuf::from("elsewhere")),
            ..Default::default()
        };

        let config = from_vars(&[("IR_PAGE_SIZE", "200")])
            .unwrap()
            .with_overrides(&overrides);

        assert_eq!(config.page_size, 10);
        assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.api_base, RepositoryConfig::DEFAULT_API_BASE);
    }

    #[test]
    fn test_collection_map_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[collection]]\nname = \"Only\"\npid = \"noaa:42\"").unwrap();

        let config = RepositoryConfig {
            collections_file: Some(file.path().to_path_buf()),
            ..from_vars(&[]).unwrap()
        };

        let map = config.collection_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.name_for("noaa:42"), Some("Only"));
    }

    #[test]
    fn test_collection_map_missing_file() {
        let config = RepositoryConfig {
            collections_file: Some(PathBuf::from("/nonexistent/mapping.toml")),
            ..from_vars(&[]).unwrap()
        };

        let err = config.collection_map().unwrap_err();
        assert!(err.to_string().contains("mapping.toml"));
    }

    #[test]
    fn test_extract_options_use_item_base() {
        let config = RepositoryConfig {
            item_base: "https://mirror.example/view/".to_string(),
            ..from_vars(&[]).unwrap()
        };

        let options = config.extract_options(FiscalCalendar::Legacy);
        assert_eq!(options.item_base, "https://mirror.example/view/");
        assert_eq!(options.pid_scheme, "noaa:");
        assert_eq!(options.calendar, FiscalCalendar::Legacy);
    }
}
