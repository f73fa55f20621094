//! Core library for irharvest
//!
//! This crate implements the **Functional Core** of the irharvest application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The irharvest project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`irharvest_core`** (this crate): Pure transformation functions with zero I/O
//! - **`irharvest`**: HTTP fetching, sheet storage and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`paging`]: Splitting a large result set into bounded requests
//! - [`record`]: Repository documents and their projection into 13-column flat rows
//! - [`fiscal`]: Fiscal-year labels for creation dates
//! - [`explode`]: One row per value of a delimiter-joined cell
//! - [`aggregate`]: `[Name, Count]` tables with a trailing total
//! - [`collections`]: Collection name to PID mapping
//! - [`harvest`]: Folding pages into the flat table and deriving every output sheet
//! - [`table`]: The cell and table types shared by all of the above
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use irharvest_core::collections::CollectionMap;
//! use irharvest_core::harvest::{derive_outputs, HarvestBatch};
//! use irharvest_core::record::ExtractOptions;
//!
//! let mut batch = HarvestBatch::new(ExtractOptions::default());
//! batch.push_page(&response.response.docs)?;
//!
//! let outputs = derive_outputs(batch.finish(), &CollectionMap::default());
//! assert_eq!(outputs.collection_counts.rows.last().unwrap()[0].to_string(), "Total");
//! ```

pub mod aggregate;
pub mod collections;
pub mod explode;
pub mod fiscal;
pub mod harvest;
pub mod paging;
pub mod record;
pub mod table;
