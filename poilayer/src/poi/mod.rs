//! Point-of-interest domain model.
//!
//! [`PoiRecord`] is the normalized shape every downstream consumer sees:
//! the cache stores it, filters and sorts operate on it, and the export
//! formats serialize it. Raw upstream elements are converted exactly once,
//! in [`normalize`], and never escape the provider layer unconverted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod normalize;
pub mod transform;

/// Closed set of place categories.
///
/// Serialized in snake_case, matching the `type` field of exported
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Restaurant,
    Hospital,
    School,
    Park,
    Store,
    Transport,
    PublicService,
    Tourism,
    Bank,
    Worship,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 11] = [
        Category::Restaurant,
        Category::Hospital,
        Category::School,
        Category::Park,
        Category::Store,
        Category::Transport,
        Category::PublicService,
        Category::Tourism,
        Category::Bank,
        Category::Worship,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurant => "restaurant",
            Category::Hospital => "hospital",
            Category::School => "school",
            Category::Park => "park",
            Category::Store => "store",
            Category::Transport => "transport",
            Category::PublicService => "public_service",
            Category::Tourism => "tourism",
            Category::Bank => "bank",
            Category::Worship => "worship",
            Category::Other => "other",
        }
    }

    /// Baseline value assigned to records of this category before the
    /// per-record offset is applied. See [`normalize::derive_value`].
    pub fn base_value(&self) -> f64 {
        match self {
            Category::Restaurant => 70.0,
            Category::Hospital => 90.0,
            Category::School => 80.0,
            Category::Park => 60.0,
            Category::Store => 50.0,
            Category::Transport => 75.0,
            Category::PublicService => 85.0,
            Category::Tourism => 65.0,
            Category::Bank => 55.0,
            Category::Worship => 45.0,
            Category::Other => 30.0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == lowered)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A normalized point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    /// Source-qualified identifier, e.g. `osm-123456`.
    pub id: String,
    /// Display name, or a coordinate fallback when the source has none.
    pub name: String,
    /// Free-text summary assembled from source tags. Omitted from JSON
    /// output when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Synthetic ranking value in roughly 20..100, derived from the
    /// category baseline and a stable per-record offset.
    pub value: f64,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub category: Category,
}
