//! Search command - geocode a place name into candidate regions.

use console::style;

use poilayer::config::ConfigFile;
use poilayer::geocode::Place;

use super::common::build_geocoder;
use crate::error::CliError;

/// Arguments for the search command.
#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// Place name to look up, e.g. "Eiffel Tower"
    #[arg(value_name = "QUERY")]
    pub query: String,
}

/// Run the search command.
pub async fn run(args: SearchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let geocoder = build_geocoder(config)?;
    let places = geocoder.search(&args.query).await?;

    if places.is_empty() {
        println!("No places found for '{}'.", args.query);
        return Ok(());
    }

    for (index, place) in places.iter().enumerate() {
        print_place(index + 1, place);
    }
    Ok(())
}

fn print_place(rank: usize, place: &Place) {
    println!("{} {}", style(format!("{}.", rank)).bold(), place.display_name);
    println!("   lat {:.5}, lng {:.5}", place.lat, place.lng);
    if let Some(bbox) = &place.bounding_box {
        // Ready to paste into a fetch invocation.
        println!(
            "   fetch: poilayer fetch --bbox {},{},{},{}",
            bbox.north, bbox.east, bbox.south, bbox.west
        );
    }
}
