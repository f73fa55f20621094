//! Repository collections and their persistent identifiers
//!
//! The aggregator relabels collection PIDs with human-readable names using a
//! [`CollectionMap`]. The built-in map is the hand-maintained list of
//! top-level collections; an alternate map can be loaded from TOML:
//!
//! ```toml
//! [[collection]]
//! name = "National Weather Service (NWS)"
//! pid = "noaa:6"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Scheme prefix of every repository identifier
pub const PID_SCHEME: &str = "noaa:";

const DEFAULT_COLLECTIONS: [(&str, &str); 17] = [
    ("National Environmental Policy Act (NEPA)", "noaa:1"),
    ("Coral Reef Conservation Program (CRCP)", "noaa:3"),
    ("Ocean Exploration Program", "noaa:4"),
    ("National Marine Fisheries Service (NMFS)", "noaa:5"),
    ("National Weather Service (NWS)", "noaa:6"),
    ("Office of Oceanic and Atmospheric Research (OAR)", "noaa:7"),
    ("National Ocean Service (NOS)", "noaa:8"),
    (
        "National Environmental Satellite and Data Information Service (NESDIS)",
        "noaa:9",
    ),
    ("Sea Grant Publications", "noaa:11"),
    ("Education and Outreach", "noaa:12"),
    ("NOAA General Documents", "noaa:10031"),
    ("NOAA International Agreements", "noaa:11879"),
    ("Office of Marine and Aviation Operations (OMAO)", "noaa:16402"),
    ("Integrated Ecosystem Assessment", "noaa:22022"),
    ("NOAA Cooperative Institutes", "noaa:23649"),
    ("Weather Research and Forecasting Innovation Act", "noaa:23702"),
    ("NOAA Cooperative Science Centers", "noaa:24914"),
];

/// Error type for collection lookups and mapping files
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Unknown collection: {0}")]
    Unknown(String),

    #[error("Duplicate collection name in mapping: {0}")]
    Duplicate(String),

    #[error("Invalid collection mapping: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A named collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub pid: String,
}

/// Ordered name to PID mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionMap {
    entries: Vec<Collection>,
}

#[derive(Deserialize)]
struct CollectionFile {
    #[serde(default)]
    collection: Vec<Collection>,
}

impl Default for CollectionMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_COLLECTIONS
                .iter()
                .map(|(name, pid)| Collection {
                    name: name.to_string(),
                    pid: pid.to_string(),
                })
                .collect(),
        }
    }
}

impl CollectionMap {
    /// Build a mapping, rejecting duplicate names
    pub fn new(entries: Vec<Collection>) -> Result<Self, CollectionError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(CollectionError::Duplicate(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Load a mapping from a TOML document of `[[collection]]` tables
    pub fn from_toml(source: &str) -> Result<Self, CollectionError> {
        let file: CollectionFile = toml::from_str(source)?;
        Self::new(file.collection)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name_for(&self, pid: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.pid == pid)
            .map(|entry| entry.name.as_str())
    }

    /// Resolve user input to a PID
    ///
    /// Accepts a collection name (case-insensitive), a bare number (`6`) or a
    /// full identifier (`noaa:6`). Numbers do not have to be in the mapping.
    pub fn resolve(&self, input: &str) -> Result<String, CollectionError> {
        let input = input.trim();

        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(input))
        {
            return Ok(entry.pid.clone());
        }

        static RE_PID: OnceLock<Regex> = OnceLock::new();
        let re = RE_PID.get_or_init(|| Regex::new(r"^(?:noaa:)?(\d+)$").unwrap());
        if let Some(caps) = re.captures(input) {
            return Ok(format!("{PID_SCHEME}{}", &caps[1]));
        }

        Err(CollectionError::Unknown(input.to_string()))
    }
}
