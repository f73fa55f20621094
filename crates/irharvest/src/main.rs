use crate::prelude::*;
use clap::Parser;

mod collections;
mod config;
mod error;
mod harvest;
mod plan;
mod prelude;
mod recount;
mod render;
mod repository;
mod store;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Harvest NOAA Institutional Repository metadata into flat sheets"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "IRHARVEST_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    #[clap(flatten)]
    overrides: config::ConfigOverrides,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Fetch a collection (or every collection) and write all output sheets
    Harvest(crate::harvest::HarvestOptions),

    /// Print the document count and page URLs of a collection
    Plan(crate::plan::PlanOptions),

    /// List the configured collections
    Collections(crate::collections::CollectionsOptions),

    /// Rebuild the derived sheets from a stored items sheet
    Recount(crate::recount::RecountOptions),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Harvest(options) => crate::harvest::run(options, app.global).await,
        SubCommands::Plan(options) => crate::plan::run(options, app.global).await,
        SubCommands::Collections(options) => crate::collections::run(options, app.global),
        SubCommands::Recount(options) => crate::recount::run(options, app.global),
    }
}
