use colored::Colorize;
use irharvest_core::paging::{plan_pages, PagePlan};
use serde::Serialize;

use crate::prelude::{println, *};
use crate::render::to_json;
use crate::repository::{RepositoryClient, SearchSource};

#[derive(Debug, clap::Args, Clone)]
pub struct PlanOptions {
    /// Collection name, number or PID (e.g. `noaa:6`)
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    pid: String,
    endpoint: String,
    total: u64,
    page_size: u64,
    plan: PagePlan,
    urls: Vec<String>,
}

pub async fn run(options: PlanOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let pid = config.collection_map()?.resolve(&options.collection)?;

    if global.verbose {
        println!("API base: {}", config.api_base);
        println!();
    }

    let client = RepositoryClient::new(&config.api_base)?;
    let endpoint = client.collection_endpoint(&pid);
    let total = client.total_count(&endpoint).await?;

    let plan = plan_pages(&endpoint, total, config.page_size)?;
    let output = PlanOutput {
        urls: plan.request_urls(total),
        pid,
        endpoint,
        total,
        page_size: config.page_size,
        plan,
    };

    if options.json {
        println!("{}", to_json(&output)?);
    } else {
        println!("{}", format_plan_text(&output));
    }

    Ok(())
}

fn format_plan_text(output: &PlanOutput) -> String {
    let mut result = String::new();

    result.push_str(&format!(
        "{}: {}\n",
        "Collection".green(),
        output.pid.bright_white().bold()
    ));
    result.push_str(&format!(
        "{}: {}\n",
        "Documents".green(),
        output.total.to_string().bright_yellow()
    ));
    result.push_str(&format!(
        "{}: {} of up to {}\n",
        "Requests".green(),
        output.urls.len().to_string().bright_yellow(),
        output.page_size
    ));

    for url in &output.urls {
        result.push_str(&format!("  {}\n", url.cyan()));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plan_text_lists_urls() {
        colored::control::set_override(false);

        let endpoint = "https://example.org/collection/noaa:6".to_string();
        let plan = plan_pages(&endpoint, 3100, 1500).unwrap();
        let output = PlanOutput {
            pid: "noaa:6".to_string(),
            urls: plan.request_urls(3100),
            endpoint,
            total: 3100,
            page_size: 1500,
            plan,
        };

        let text = format_plan_text(&output);

        assert!(text.contains("Documents: 3100"));
        assert!(text.contains("Requests: 3 of up to 1500"));
        assert!(text.contains("noaa:6?rows=1500&start=3000"));
    }
}
