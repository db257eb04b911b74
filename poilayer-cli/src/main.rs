//! PoiLayer CLI - fetch, export, and search OpenStreetMap points of
//! interest from the command line.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "poilayer",
    version,
    about = "Fetch OpenStreetMap points of interest for a region",
    long_about = "Fetch OpenStreetMap points of interest for a region.\n\n\
                  Regions are a bounding box, a circle, or a polygon; results \
                  can be filtered, sorted, paginated, and exported to CSV, \
                  JSON, or GeoJSON. Repeat queries are served from an \
                  in-process cache and upstream calls are rate-limited."
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to an alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Mirror logs into a file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch POI records for a region and print them as a table
    Fetch(commands::fetch::FetchArgs),
    /// Export the full result set for a region to a file
    Export(commands::export::ExportArgs),
    /// Search for a place by name
    Search(commands::search::SearchArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The guard flushes the file appender on drop; keep it for the whole run.
    let _log_guard = poilayer::logging::init(cli.verbose, cli.log_file.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", console::style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch(args) => commands::fetch::run(args, &config).await,
        Command::Export(args) => commands::export::run(args, &config).await,
        Command::Search(args) => commands::search::run(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "poilayer",
            "fetch",
            "--bbox",
            "48.9,2.4,48.8,2.3",
            "-vv",
            "--log-file",
            "/tmp/poilayer.log",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/poilayer.log")));
        assert!(matches!(cli.command, Command::Fetch(_)));
    }
}
