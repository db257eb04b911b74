//! Fetch command - query a region and print the records as a table.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use poilayer::config::ConfigFile;
use poilayer::query::Pagination;
use poilayer::service::FetchSource;
use poilayer::PoiRecord;

use super::cache::print_stats;
use super::common::{build_query, build_service, FilterArgs, GeometryArgs};
use crate::error::CliError;

/// Page size applied when `--page` is given without `--limit`.
const DEFAULT_PAGE_LIMIT: usize = 10;

const NAME_WIDTH: usize = 28;
const DESCRIPTION_WIDTH: usize = 40;

/// Arguments for the fetch command.
#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Page number, starting at 1
    #[arg(long, value_name = "N")]
    pub page: Option<u32>,

    /// Records per page
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print cache statistics after the fetch
    #[arg(long)]
    pub stats: bool,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut query = build_query(&args.geometry, &args.filters)?;
    if args.page.is_some() || args.limit.is_some() {
        query = query.with_pagination(Pagination::new(
            args.page.unwrap_or(1),
            args.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        ));
    }

    let service = build_service(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Fetching points of interest...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let response = service.fetch(&query).await;
    spinner.finish_and_clear();

    if response.source == FetchSource::Fallback {
        println!(
            "{}",
            style("Upstream unavailable or region invalid; no data to show.").yellow()
        );
        return Ok(());
    }

    if response.records.is_empty() {
        println!("No points of interest found in this region.");
    } else {
        print_table(&response.records);
        println!();
    }
    println!(
        "Showing {} of {} records (source: {})",
        response.records.len(),
        response.total_count,
        response.source
    );

    if args.stats {
        println!();
        print_stats(&service.cache_stats());
    }
    Ok(())
}

fn print_table(records: &[PoiRecord]) {
    println!(
        "{}",
        style(format!(
            "{:<name$}  {:<14}  {:>6}  {:<20}  {}",
            "Name",
            "Type",
            "Value",
            "Coordinates",
            "Description",
            name = NAME_WIDTH
        ))
        .bold()
    );
    for record in records {
        println!(
            "{:<name$}  {:<14}  {:>6.1}  {:<20}  {}",
            truncate(&record.name, NAME_WIDTH),
            record.category,
            record.value,
            format!("{:.5}, {:.5}", record.coordinates.lat, record.coordinates.lng),
            truncate(record.description.as_deref().unwrap_or(""), DESCRIPTION_WIDTH),
            name = NAME_WIDTH,
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("Cafe", 10), "Cafe");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn test_truncate_marks_long_strings() {
        let long = "A very long point of interest name";
        let cut = truncate(long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
    }
}
