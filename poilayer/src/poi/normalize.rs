//! Conversion of raw upstream elements into [`PoiRecord`]s.
//!
//! Normalization is lossy by design: elements without usable coordinates
//! are dropped one by one instead of failing the batch, names fall back to
//! a coordinate label, and the ranking value is synthesized from the
//! category baseline plus a stable per-record offset.

use tracing::debug;

use super::{Category, Coordinates, PoiRecord};
use crate::provider::RawElement;

/// Spread of the per-record value offset, centered on zero.
const VALUE_JITTER_SPAN: i64 = 20;

/// Convert a batch of raw elements, dropping the unusable ones.
pub fn normalize_elements(elements: Vec<RawElement>) -> Vec<PoiRecord> {
    let total = elements.len();
    let records: Vec<PoiRecord> = elements.into_iter().filter_map(normalize_element).collect();
    if records.len() < total {
        debug!(
            kept = records.len(),
            dropped = total - records.len(),
            "dropped elements without usable coordinates"
        );
    }
    records
}

/// Convert one raw element. Returns `None` when it has no finite
/// coordinates.
pub fn normalize_element(element: RawElement) -> Option<PoiRecord> {
    let lat = element.lat.filter(|v| v.is_finite())?;
    let lng = element.lon.filter(|v| v.is_finite())?;

    let category = category_from_tags(&element.tags);
    let name = element
        .tags
        .get("name")
        .cloned()
        .unwrap_or_else(|| format!("Location at {:.5}, {:.5}", lat, lng));
    let description = describe_tags(&element.tags);

    Some(PoiRecord {
        id: format!("osm-{}", element.id),
        name,
        description,
        value: derive_value(category, element.id),
        coordinates: Coordinates::new(lat, lng),
        category,
    })
}

/// Classify an element by its tags. Rules are checked in priority order;
/// the first match wins, and untaggable elements land in `Other`.
pub fn category_from_tags(
    tags: &std::collections::BTreeMap<String, String>,
) -> Category {
    let tag = |key: &str| tags.get(key).map(String::as_str);
    let amenity = tag("amenity").unwrap_or("");

    if matches!(
        amenity,
        "restaurant" | "cafe" | "fast_food" | "bar" | "pub" | "food_court"
    ) {
        return Category::Restaurant;
    }
    if matches!(
        amenity,
        "hospital" | "clinic" | "doctors" | "dentist" | "pharmacy"
    ) || tags.contains_key("healthcare")
    {
        return Category::Hospital;
    }
    if matches!(
        amenity,
        "school" | "university" | "college" | "kindergarten" | "library"
    ) {
        return Category::School;
    }
    if matches!(
        tag("leisure").unwrap_or(""),
        "park" | "garden" | "playground" | "sports_centre" | "stadium" | "pitch"
    ) {
        return Category::Park;
    }
    if tags.contains_key("shop") {
        return Category::Store;
    }
    if tags.contains_key("public_transport")
        || matches!(amenity, "bus_station" | "taxi")
        || tag("railway") == Some("station")
        || tag("highway") == Some("bus_stop")
    {
        return Category::Transport;
    }
    if matches!(amenity, "police" | "fire_station" | "post_office" | "townhall")
        || tag("office") == Some("government")
    {
        return Category::PublicService;
    }
    if matches!(
        tag("tourism").unwrap_or(""),
        "museum" | "gallery" | "attraction" | "hotel" | "viewpoint"
    ) || tags.contains_key("historic")
    {
        return Category::Tourism;
    }
    if matches!(amenity, "bank" | "atm") {
        return Category::Bank;
    }
    if amenity == "place_of_worship" {
        return Category::Worship;
    }
    Category::Other
}

/// Derive the ranking value for a record.
///
/// The offset is a pure function of the source id, so repeated fetches of
/// the same element always yield the same value and equal records compare
/// equal across cache generations.
pub fn derive_value(category: Category, source_id: i64) -> f64 {
    let jitter = (source_id.unsigned_abs() % VALUE_JITTER_SPAN as u64) as i64
        - VALUE_JITTER_SPAN / 2;
    category.base_value() + jitter as f64
}

/// Join all tags except `name` into a `key: value` summary, sorted by key.
/// Returns `None` when no such tags exist.
fn describe_tags(tags: &std::collections::BTreeMap<String, String>) -> Option<String> {
    let description = tags
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    (!description.is_empty()).then_some(description)
}
