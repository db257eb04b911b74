//! Geospatial query model.
//!
//! A [`Query`] pairs exactly one geometry form (bounding box, circle, or
//! polygon) with optional result filters and pagination. Queries are plain
//! values: building one performs no I/O, and the canonical cache key is a
//! pure function of its fields (see [`key`]).

use crate::poi::Category;

pub mod key;

/// Meters per degree of latitude, used to envelope circles into boxes.
pub const METERS_PER_DEGREE: f64 = 111_111.0;

/// Axis-aligned bounding box in degrees.
///
/// Stored as the four cardinal extremes. No normalization is applied;
/// callers are expected to provide `north >= south` and `east >= west`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Create a bounding box from its cardinal extremes.
    pub fn new(north: f64, east: f64, south: f64, west: f64) -> Self {
        Self {
            north,
            east,
            south,
            west,
        }
    }

    /// Whether every extreme is a finite number.
    pub fn is_valid(&self) -> bool {
        self.north.is_finite()
            && self.east.is_finite()
            && self.south.is_finite()
            && self.west.is_finite()
    }
}

/// The region a query covers.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned rectangle.
    Bounds(BoundingBox),
    /// Circle around a center point, radius in meters.
    Center { lat: f64, lng: f64, radius_m: f64 },
    /// Ordered list of `(lat, lng)` vertices.
    Polygon(Vec<(f64, f64)>),
}

impl Geometry {
    /// Whether the geometry can be fetched: all coordinates finite, the
    /// radius positive, the polygon non-empty.
    pub fn is_valid(&self) -> bool {
        match self {
            Geometry::Bounds(bbox) => bbox.is_valid(),
            Geometry::Center { lat, lng, radius_m } => {
                lat.is_finite() && lng.is_finite() && radius_m.is_finite() && *radius_m > 0.0
            }
            Geometry::Polygon(points) => {
                !points.is_empty()
                    && points
                        .iter()
                        .all(|(lat, lng)| lat.is_finite() && lng.is_finite())
            }
        }
    }

    /// The smallest bounding box enclosing this geometry.
    ///
    /// The upstream source only understands rectangles, so circles and
    /// polygons are enveloped before the request is built. Returns `None`
    /// for an empty polygon or when the envelope degenerates to
    /// non-finite extents.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let bbox = match self {
            Geometry::Bounds(bbox) => *bbox,
            Geometry::Center { lat, lng, radius_m } => {
                let dlat = radius_m / METERS_PER_DEGREE;
                // Longitude degrees shrink with latitude; clamp the cosine
                // away from zero so polar circles stay representable.
                let dlng = radius_m / (METERS_PER_DEGREE * lat.to_radians().cos().max(0.01));
                BoundingBox::new(lat + dlat, lng + dlng, lat - dlat, lng - dlng)
            }
            Geometry::Polygon(points) => {
                let (first_lat, first_lng) = *points.first()?;
                points.iter().skip(1).fold(
                    BoundingBox::new(first_lat, first_lng, first_lat, first_lng),
                    |bbox, &(lat, lng)| {
                        BoundingBox::new(
                            bbox.north.max(lat),
                            bbox.east.max(lng),
                            bbox.south.min(lat),
                            bbox.west.min(lng),
                        )
                    },
                )
            }
        };
        bbox.is_valid().then_some(bbox)
    }
}

/// Sortable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Description,
    Value,
    Category,
}

impl SortKey {
    /// Canonical name, as used in cache keys and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Description => "description",
            SortKey::Value => "value",
            SortKey::Category => "type",
        }
    }

    /// Parse from a flag or config value. Accepts `category` as an alias
    /// for `type`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "id" => Some(SortKey::Id),
            "name" => Some(SortKey::Name),
            "description" => Some(SortKey::Description),
            "value" => Some(SortKey::Value),
            "type" | "category" => Some(SortKey::Category),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result filters applied after normalization, before pagination.
///
/// All fields are optional; an all-`None` filter set behaves exactly like
/// no filter set, including in the derived cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Keep only records of this category.
    pub category: Option<Category>,
    /// Keep only records with `value >= min_value`.
    pub min_value: Option<f64>,
    /// Keep only records with `value <= max_value`.
    pub max_value: Option<f64>,
    /// Sort by this field. Unsorted when absent.
    pub sort_by: Option<SortKey>,
    /// Sort direction; ascending when absent.
    pub sort_order: Option<SortOrder>,
}

impl FilterOptions {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.sort_by.is_none()
            && self.sort_order.is_none()
    }
}

/// One page of results. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: usize,
}

impl Pagination {
    /// Create a pagination request, clamping `page` and `limit` to their
    /// minimums of 1.
    pub fn new(page: u32, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Index of the first record on this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit)
    }
}

/// A complete query: one geometry, optional filters, optional pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub geometry: Geometry,
    pub filters: Option<FilterOptions>,
    pub pagination: Option<Pagination>,
}

impl Query {
    /// Create a query covering `geometry` with no filters or pagination.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            filters: None,
            pagination: None,
        }
    }

    /// Attach filters.
    pub fn with_filters(mut self, filters: FilterOptions) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Attach pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// A copy of this query with pagination stripped, as used by the
    /// fetch-all and export flows.
    pub fn without_pagination(&self) -> Self {
        Self {
            geometry: self.geometry.clone(),
            filters: self.filters.clone(),
            pagination: None,
        }
    }

    /// Whether the geometry is fetchable. See [`Geometry::is_valid`].
    pub fn is_valid(&self) -> bool {
        self.geometry.is_valid()
    }

    /// Canonical cache key for this query. See [`key::derive`].
    pub fn cache_key(&self) -> String {
        key::derive(self)
    }
}
