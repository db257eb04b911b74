//! Export command - write the full result set for a region to a file.

use std::path::PathBuf;
use std::time::Duration;

use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use poilayer::config::ConfigFile;
use poilayer::export::{default_file_name, write_to_file, ExportFormat};
use poilayer::service::FetchSource;

use super::common::{build_query, build_service, FilterArgs, GeometryArgs};
use crate::error::CliError;

/// Arguments for the export command.
#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format: csv, json, or geojson
    #[arg(long, value_name = "FORMAT", default_value = "csv")]
    pub format: String,

    /// Output file path (defaults to poi-export-<timestamp>.<ext>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file without asking
    #[arg(long)]
    pub force: bool,
}

/// Run the export command.
pub async fn run(args: ExportArgs, config: &ConfigFile) -> Result<(), CliError> {
    let format = args.format.parse::<ExportFormat>().map_err(|e| {
        warn!(format = %args.format, "unsupported export format requested");
        CliError::Export(e)
    })?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_file_name(format)));

    if path.exists() && !args.force {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists, overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Export aborted.");
            return Ok(());
        }
    }

    // Export always works on the full unpaginated result set.
    let query = build_query(&args.geometry, &args.filters)?;
    let service = build_service(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Fetching points of interest...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let response = service.fetch_all(&query).await;
    spinner.finish_and_clear();

    if response.source == FetchSource::Fallback {
        println!("Upstream unavailable or region invalid; nothing exported.");
        return Ok(());
    }

    write_to_file(&response.records, format, &path).await?;
    println!(
        "Exported {} records to {}",
        response.records.len(),
        path.display()
    );
    Ok(())
}
