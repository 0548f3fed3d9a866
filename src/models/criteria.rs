use serde::{Deserialize, Serialize};
use validator::Validate;

/// Smallest and largest page size the composer will request on behalf of
/// a caller. Out-of-range values are clamped, not rejected.
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 50;

/// Free-form CMA search criteria, mirrored from the front end.
///
/// Every field is optional; geometry is exclusive (polygon wins over bounds,
/// bounds win over plain text).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    // Geography
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub subdivision: Option<String>,
    /// User-drawn polygon as [lng, lat] pairs.
    #[serde(default)]
    pub polygon: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub bounds: Option<MapBounds>,

    // Numeric ranges
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub min_beds: Option<u32>,
    #[serde(default)]
    pub max_beds: Option<u32>,
    #[serde(default)]
    pub min_baths: Option<u32>,
    #[serde(default)]
    pub max_baths: Option<u32>,
    #[serde(default)]
    pub min_full_baths: Option<u32>,
    #[serde(default)]
    pub min_half_baths: Option<u32>,
    #[serde(default)]
    pub min_sqft: Option<u32>,
    #[serde(default)]
    pub max_sqft: Option<u32>,
    #[serde(default)]
    pub min_lot_acres: Option<f64>,
    #[serde(default)]
    pub max_lot_acres: Option<f64>,
    #[serde(default)]
    pub min_year_built: Option<u32>,
    #[serde(default)]
    pub max_year_built: Option<u32>,
    #[serde(default)]
    pub min_stories: Option<u32>,
    #[serde(default)]
    pub max_stories: Option<u32>,
    #[serde(default)]
    pub min_garage_spaces: Option<u32>,
    #[serde(default)]
    pub min_parking_spaces: Option<u32>,

    // Feature flags
    #[serde(default)]
    pub pool: Option<bool>,
    #[serde(default)]
    pub waterfront: Option<bool>,
    #[serde(default)]
    pub has_hoa: Option<bool>,
    #[serde(default)]
    pub primary_on_main: Option<bool>,

    /// MLS status labels: Active, Active Under Contract, Pending, Closed.
    #[serde(default)]
    pub statuses: Vec<String>,

    /// Free-text address / MLS-number search.
    #[serde(default)]
    pub query: Option<String>,

    /// Explicit MLS numbers; when present every other filter is bypassed.
    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 MLS numbers per lookup"))]
    pub mls_numbers: Option<Vec<String>>,

    /// Lookback window for Closed searches, in days.
    #[serde(default)]
    pub sold_lookback_days: Option<i64>,

    // Pagination
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 { 1 }
fn default_limit() -> u32 { 20 }

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            city: None,
            zip: None,
            county: None,
            area: None,
            subdivision: None,
            polygon: None,
            bounds: None,
            min_price: None,
            max_price: None,
            min_beds: None,
            max_beds: None,
            min_baths: None,
            max_baths: None,
            min_full_baths: None,
            min_half_baths: None,
            min_sqft: None,
            max_sqft: None,
            min_lot_acres: None,
            max_lot_acres: None,
            min_year_built: None,
            max_year_built: None,
            min_stories: None,
            max_stories: None,
            min_garage_spaces: None,
            min_parking_spaces: None,
            pool: None,
            waterfront: None,
            has_hoa: None,
            primary_on_main: None,
            statuses: Vec::new(),
            query: None,
            mls_numbers: None,
            sold_lookback_days: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Rectangular map viewport, expanded into a closed ring for the upstream
/// polygon search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Which geometry drives the upstream request.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<[f64; 2]>),
    Bounds(MapBounds),
    None,
}

impl SearchCriteria {
    /// Page size clamped into [1, 50] before anything is sent upstream.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.clamp(MIN_LIMIT, MAX_LIMIT)
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Exactly one geometry is honored; polygon takes precedence over bounds.
    pub fn geometry(&self) -> Geometry {
        if let Some(polygon) = &self.polygon {
            if polygon.len() >= 3 {
                return Geometry::Polygon(polygon.clone());
            }
        }
        if let Some(bounds) = self.bounds {
            return Geometry::Bounds(bounds);
        }
        Geometry::None
    }

    /// True when the request is an explicit MLS-number lookup.
    pub fn is_mls_lookup(&self) -> bool {
        self.mls_numbers
            .as_ref()
            .map(|nums| !nums.is_empty())
            .unwrap_or(false)
    }

    pub fn subdivision_term(&self) -> Option<&str> {
        self.subdivision
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
