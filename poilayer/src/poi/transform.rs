//! Filtering, sorting, and pagination of normalized records.
//!
//! These run in the fetch pipeline after normalization and before the
//! result page is cached, always in that order: filter, then sort, then
//! slice.

use std::cmp::Ordering;

use super::PoiRecord;
use crate::query::{FilterOptions, Pagination, SortKey, SortOrder};

/// Apply category and value-range filters, then sort when requested.
pub fn apply_filters(records: Vec<PoiRecord>, filters: &FilterOptions) -> Vec<PoiRecord> {
    let mut records: Vec<PoiRecord> = records
        .into_iter()
        .filter(|record| {
            if let Some(category) = filters.category {
                if record.category != category {
                    return false;
                }
            }
            if let Some(min) = filters.min_value {
                if record.value < min {
                    return false;
                }
            }
            if let Some(max) = filters.max_value {
                if record.value > max {
                    return false;
                }
            }
            true
        })
        .collect();

    if let Some(sort_by) = filters.sort_by {
        sort_records(
            &mut records,
            sort_by,
            filters.sort_order.unwrap_or_default(),
        );
    }
    records
}

/// Stable sort by one record field. String fields compare
/// case-insensitively; values compare by total order so non-finite
/// values cannot poison the sort.
pub fn sort_records(records: &mut [PoiRecord], sort_by: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = match sort_by {
            SortKey::Id => compare_text(&a.id, &b.id),
            SortKey::Name => compare_text(&a.name, &b.name),
            SortKey::Description => compare_text(
                a.description.as_deref().unwrap_or(""),
                b.description.as_deref().unwrap_or(""),
            ),
            SortKey::Value => a.value.total_cmp(&b.value),
            SortKey::Category => a.category.as_str().cmp(b.category.as_str()),
        };
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Slice one page out of the full result set.
///
/// Returns the page together with the pre-slice total so callers can
/// report how many records matched overall. Without pagination the full
/// set is the page. A page past the end yields an empty page, never an
/// error.
pub fn paginate(
    records: Vec<PoiRecord>,
    pagination: Option<&Pagination>,
) -> (Vec<PoiRecord>, usize) {
    let total = records.len();
    match pagination {
        None => (records, total),
        Some(p) => {
            let start = p.offset().min(total);
            let end = start.saturating_add(p.limit).min(total);
            (records[start..end].to_vec(), total)
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
