//! CLI error type.

use std::fmt;

use poilayer::config::ConfigError;
use poilayer::export::ExportError;
use poilayer::geocode::GeocodeError;

/// Errors surfaced to the user as a message and a non-zero exit code.
#[derive(Debug)]
pub enum CliError {
    /// Bad or conflicting command-line usage.
    Usage(String),
    /// Configuration or client setup failed.
    Config(String),
    /// Export rendering or writing failed.
    Export(ExportError),
    /// Place search failed.
    Geocode(GeocodeError),
    /// Terminal or file I/O failed.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Export(e) => write!(f, "export failed: {}", e),
            CliError::Geocode(e) => write!(f, "search failed: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        CliError::Export(e)
    }
}

impl From<GeocodeError> for CliError {
    fn from(e: GeocodeError) -> Self {
        CliError::Geocode(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Io(std::io::Error::other(e.to_string()))
    }
}
