//! Configuration file loading.
//!
//! Settings live in an INI file at `{config_dir}/poilayer/config.ini`
//! (for example `~/.config/poilayer/config.ini` on Linux). Every key is
//! optional; missing keys fall back to the built-in defaults so an empty
//! or absent file is always valid.
//!
//! ```ini
//! [cache]
//! max_entries = 50
//! ttl_secs = 300
//!
//! [throttle]
//! min_interval_ms = 1000
//!
//! [retry]
//! max_retries = 2
//! base_delay_ms = 1000
//! timeout_secs = 20
//!
//! [upstream]
//! endpoint = https://overpass-api.de/api/interpreter
//!
//! [geocode]
//! endpoint = https://nominatim.openstreetmap.org/search
//! limit = 10
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::geocode::{DEFAULT_GEOCODE_URL, DEFAULT_RESULT_LIMIT};
use crate::provider::{DEFAULT_OVERPASS_URL, USER_AGENT};
use crate::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use crate::throttle::DEFAULT_MIN_INTERVAL;

/// Directory under the platform config root.
pub const CONFIG_DIR_NAME: &str = "poilayer";

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors from loading or interpreting a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("invalid value for [{section}] {key}: {value}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSection {
    pub max_entries: usize,
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

/// `[throttle]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleSection {
    pub min_interval_ms: u64,
}

impl Default for ThrottleSection {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL.as_millis() as u64,
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySection {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// `[upstream]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSection {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OVERPASS_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// `[geocode]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeSection {
    pub endpoint: String,
    pub limit: u32,
}

impl Default for GeocodeSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODE_URL.to_string(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSection,
    pub throttle: ThrottleSection,
    pub retry: RetrySection,
    pub upstream: UpstreamSection,
    pub geocode: GeocodeSection,
}

impl ConfigFile {
    /// Platform default location, `None` when the platform has no config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit path. The file must exist and parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Load from the default location, falling back to defaults when no
    /// file exists there.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            cache: CacheSection {
                max_entries: parse_value(ini, "cache", "max_entries", defaults.cache.max_entries)?,
                ttl_secs: parse_value(ini, "cache", "ttl_secs", defaults.cache.ttl_secs)?,
            },
            throttle: ThrottleSection {
                min_interval_ms: parse_value(
                    ini,
                    "throttle",
                    "min_interval_ms",
                    defaults.throttle.min_interval_ms,
                )?,
            },
            retry: RetrySection {
                max_retries: parse_value(ini, "retry", "max_retries", defaults.retry.max_retries)?,
                base_delay_ms: parse_value(
                    ini,
                    "retry",
                    "base_delay_ms",
                    defaults.retry.base_delay_ms,
                )?,
                timeout_secs: parse_value(
                    ini,
                    "retry",
                    "timeout_secs",
                    defaults.retry.timeout_secs,
                )?,
            },
            upstream: UpstreamSection {
                endpoint: string_value(ini, "upstream", "endpoint", defaults.upstream.endpoint),
                user_agent: string_value(
                    ini,
                    "upstream",
                    "user_agent",
                    defaults.upstream.user_agent,
                ),
            },
            geocode: GeocodeSection {
                endpoint: string_value(ini, "geocode", "endpoint", defaults.geocode.endpoint),
                limit: parse_value(ini, "geocode", "limit", defaults.geocode.limit)?,
            },
        })
    }
}

fn parse_value<T: FromStr>(
    ini: &Ini,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match ini.get_from(Some(section), key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn string_value(ini: &Ini, section: &str, key: &str, default: String) -> String {
    ini.get_from(Some(section), key)
        .map(|raw| raw.trim().to_string())
        .unwrap_or(default)
}
