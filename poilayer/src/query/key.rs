//! Canonical cache key derivation.
//!
//! Every distinct query maps to a distinct, stable string key. The key is
//! built from fixed-order segments so that two queries with equal fields
//! always produce byte-identical keys, regardless of how they were
//! constructed. Pagination is part of the key: each page is cached as its
//! own entry.
//!
//! Layout:
//!
//! ```text
//! bounds:{n},{e},{s},{w}
//! center:{lat},{lng}|radius:{r}
//! coords:{lat},{lng}|{lat},{lng}|...
//! ```
//!
//! followed by `|filters:...` when any filter field is set and
//! `|page:{p}|limit:{l}` when pagination is set.

use super::{Geometry, Query};

/// Derive the canonical cache key for a query.
pub fn derive(query: &Query) -> String {
    let mut key = match &query.geometry {
        Geometry::Bounds(bbox) => format!(
            "bounds:{},{},{},{}",
            bbox.north, bbox.east, bbox.south, bbox.west
        ),
        Geometry::Center { lat, lng, radius_m } => {
            format!("center:{},{}|radius:{}", lat, lng, radius_m)
        }
        Geometry::Polygon(points) => {
            let coords = points
                .iter()
                .map(|(lat, lng)| format!("{},{}", lat, lng))
                .collect::<Vec<_>>()
                .join("|");
            format!("coords:{}", coords)
        }
    };

    if let Some(filters) = &query.filters {
        let mut parts = Vec::new();
        if let Some(category) = filters.category {
            parts.push(format!("category={}", category));
        }
        if let Some(min) = filters.min_value {
            parts.push(format!("min={}", min));
        }
        if let Some(max) = filters.max_value {
            parts.push(format!("max={}", max));
        }
        if let Some(sort_by) = filters.sort_by {
            parts.push(format!("sort={}", sort_by));
        }
        if let Some(order) = filters.sort_order {
            parts.push(format!("order={}", order));
        }
        if !parts.is_empty() {
            key.push_str("|filters:");
            key.push_str(&parts.join(","));
        }
    }

    if let Some(pagination) = &query.pagination {
        key.push_str(&format!(
            "|page:{}|limit:{}",
            pagination.page, pagination.limit
        ));
    }

    key
}
