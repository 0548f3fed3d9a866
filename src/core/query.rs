use chrono::NaiveDate;
use geo::{Coord, LineString, Rect};

use crate::models::{MapBounds, SearchCriteria};

/// Statuses the upstream API can filter with plain `standardStatus`
/// parameters. Closed listings use a different idiom entirely.
pub const ACTIVE_FAMILY: [&str; 3] = ["Active", "Active Under Contract", "Pending"];

/// How the requested statuses map onto upstream queries.
///
/// The upstream API cannot express "active-family OR closed" in one call,
/// so `Both` forces a second round trip that is merged client-side.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusScope {
    ActiveFamily(Vec<String>),
    ClosedOnly,
    Both(Vec<String>),
}

/// Partition requested status labels into the active family vs Closed.
/// Unrecognized labels are ignored; an empty request defaults to Active.
pub fn partition_statuses(statuses: &[String]) -> StatusScope {
    let mut active = Vec::new();
    let mut closed = false;

    for status in statuses {
        let trimmed = status.trim();
        if let Some(canonical) = ACTIVE_FAMILY
            .iter()
            .find(|label| label.eq_ignore_ascii_case(trimmed))
        {
            if !active.iter().any(|a: &String| a == canonical) {
                active.push(canonical.to_string());
            }
        } else if trimmed.eq_ignore_ascii_case("Closed") || trimmed.eq_ignore_ascii_case("Sold") {
            closed = true;
        }
    }

    match (active.is_empty(), closed) {
        (false, true) => StatusScope::Both(active),
        (true, true) => StatusScope::ClosedOnly,
        (false, false) => StatusScope::ActiveFamily(active),
        (true, false) => StatusScope::ActiveFamily(vec!["Active".to_string()]),
    }
}

/// Query parameters shared by every variant of the main search: geography,
/// ranges and upstream-expressible feature filters. Statuses, pagination
/// and subdivision handling are layered on by the composer.
pub fn base_params(criteria: &SearchCriteria) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    let mut push = |key: &str, value: String| params.push((key.to_string(), value));

    if let Some(city) = criteria.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        push("city", city.to_string());
    }
    if let Some(zip) = criteria.zip.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
        push("zip", zip.to_string());
    }
    if let Some(county) = criteria.county.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        push("county", county.to_string());
    }
    if let Some(area) = criteria.area.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        push("area", area.to_string());
    }

    if let Some(min) = criteria.min_price {
        push("minPrice", min.to_string());
    }
    if let Some(max) = criteria.max_price {
        push("maxPrice", max.to_string());
    }
    if let Some(min) = criteria.min_beds {
        push("minBeds", min.to_string());
    }
    if let Some(max) = criteria.max_beds {
        push("maxBeds", max.to_string());
    }
    if let Some(min) = criteria.min_baths {
        push("minBaths", min.to_string());
    }
    if let Some(max) = criteria.max_baths {
        push("maxBaths", max.to_string());
    }
    if let Some(min) = criteria.min_sqft {
        push("minSqft", min.to_string());
    }
    if let Some(max) = criteria.max_sqft {
        push("maxSqft", max.to_string());
    }
    if let Some(min) = criteria.min_lot_acres {
        push("minAcres", min.to_string());
    }
    if let Some(max) = criteria.max_lot_acres {
        push("maxAcres", max.to_string());
    }
    if let Some(min) = criteria.min_year_built {
        push("minYearBuilt", min.to_string());
    }
    if let Some(max) = criteria.max_year_built {
        push("maxYearBuilt", max.to_string());
    }
    if let Some(min) = criteria.min_stories {
        push("minStories", min.to_string());
    }
    if let Some(max) = criteria.max_stories {
        push("maxStories", max.to_string());
    }
    if let Some(min) = criteria.min_garage_spaces {
        push("minGarageSpaces", min.to_string());
    }
    if let Some(min) = criteria.min_parking_spaces {
        push("minParkingSpaces", min.to_string());
    }

    // The upstream pool filter only matches in-ground pools; the broader
    // "any pool" intent is intentionally not widened client-side.
    if criteria.pool == Some(true) {
        push("swimmingPool", "In Ground".to_string());
    }

    if let Some(query) = criteria.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        push("search", query.to_string());
    }

    params
}

/// Status parameters for one upstream call.
pub fn status_params(
    scope: &StatusScope,
    closed_leg: bool,
    sold_cutoff: &str,
) -> Vec<(String, String)> {
    if closed_leg {
        return vec![
            ("status".to_string(), "U".to_string()),
            ("lastStatus".to_string(), "Sld".to_string()),
            ("minSoldDate".to_string(), sold_cutoff.to_string()),
        ];
    }

    match scope {
        StatusScope::ActiveFamily(statuses) | StatusScope::Both(statuses) => statuses
            .iter()
            .map(|s| ("standardStatus".to_string(), s.clone()))
            .collect(),
        StatusScope::ClosedOnly => vec![
            ("status".to_string(), "U".to_string()),
            ("lastStatus".to_string(), "Sld".to_string()),
            ("minSoldDate".to_string(), sold_cutoff.to_string()),
        ],
    }
}

pub fn pagination_params(page: u32, limit: u32) -> Vec<(String, String)> {
    vec![
        ("pageNum".to_string(), page.to_string()),
        ("resultsPerPage".to_string(), limit.to_string()),
    ]
}

/// Minimum sold date for a lookback window, `YYYY-MM-DD`.
pub fn sold_cutoff(today: NaiveDate, lookback_days: i64) -> String {
    (today - chrono::Duration::days(lookback_days.max(0)))
        .format("%Y-%m-%d")
        .to_string()
}

/// Close a polygon ring: the first point is appended as the last point
/// unless it already is.
pub fn close_ring(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut ring: LineString<f64> = points
        .iter()
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();
    ring.close();
    ring.coords().map(|c| [c.x, c.y]).collect()
}

/// Expand a rectangular viewport into an explicit closed 5-point ring,
/// [lng, lat] order, northwest corner first.
pub fn bounds_ring(bounds: &MapBounds) -> Vec<[f64; 2]> {
    let rect = Rect::new(
        Coord { x: bounds.west, y: bounds.south },
        Coord { x: bounds.east, y: bounds.north },
    );
    let (min, max) = (rect.min(), rect.max());

    vec![
        [min.x, max.y],
        [max.x, max.y],
        [max.x, min.y],
        [min.x, min.y],
        [min.x, max.y],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_param(params: &[(String, String)], key: &str, value: &str) -> bool {
        params.iter().any(|(k, v)| k == key && v == value)
    }

    #[test]
    fn test_partition_active_only() {
        let scope = partition_statuses(&["Active".to_string(), "Pending".to_string()]);
        assert_eq!(
            scope,
            StatusScope::ActiveFamily(vec!["Active".to_string(), "Pending".to_string()])
        );
    }

    #[test]
    fn test_partition_closed_only() {
        let scope = partition_statuses(&["Closed".to_string()]);
        assert_eq!(scope, StatusScope::ClosedOnly);
    }

    #[test]
    fn test_partition_both_families() {
        let scope = partition_statuses(&["Active".to_string(), "Closed".to_string()]);
        assert_eq!(scope, StatusScope::Both(vec!["Active".to_string()]));
    }

    #[test]
    fn test_partition_empty_defaults_to_active() {
        let scope = partition_statuses(&[]);
        assert_eq!(scope, StatusScope::ActiveFamily(vec!["Active".to_string()]));
    }

    #[test]
    fn test_partition_case_insensitive() {
        let scope = partition_statuses(&["active under contract".to_string()]);
        assert_eq!(
            scope,
            StatusScope::ActiveFamily(vec!["Active Under Contract".to_string()])
        );
    }

    #[test]
    fn test_base_params_example_scenario() {
        let criteria = SearchCriteria {
            city: Some("Austin".to_string()),
            min_beds: Some(3),
            statuses: vec!["Active".to_string()],
            ..Default::default()
        };
        let params = base_params(&criteria);

        assert!(has_param(&params, "city", "Austin"));
        assert!(has_param(&params, "minBeds", "3"));
    }

    #[test]
    fn test_pool_filter_is_in_ground_only() {
        let criteria = SearchCriteria { pool: Some(true), ..Default::default() };
        let params = base_params(&criteria);
        assert!(has_param(&params, "swimmingPool", "In Ground"));

        let without = SearchCriteria { pool: Some(false), ..Default::default() };
        let params = base_params(&without);
        assert!(!params.iter().any(|(k, _)| k == "swimmingPool"));
    }

    #[test]
    fn test_status_params_active_family_repeats() {
        let scope = StatusScope::ActiveFamily(vec![
            "Active".to_string(),
            "Active Under Contract".to_string(),
        ]);
        let params = status_params(&scope, false, "2026-02-07");
        assert_eq!(
            params,
            vec![
                ("standardStatus".to_string(), "Active".to_string()),
                ("standardStatus".to_string(), "Active Under Contract".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_params_closed_idiom() {
        let params = status_params(&StatusScope::ClosedOnly, false, "2026-02-07");
        assert!(has_param(&params, "status", "U"));
        assert!(has_param(&params, "lastStatus", "Sld"));
        assert!(has_param(&params, "minSoldDate", "2026-02-07"));
    }

    #[test]
    fn test_sold_cutoff_180_days() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(sold_cutoff(today, 180), "2026-02-07");
    }

    #[test]
    fn test_close_ring_appends_first_point() {
        let open = vec![[-97.8, 30.2], [-97.7, 30.2], [-97.7, 30.3], [-97.8, 30.3]];
        let closed = close_ring(&open);
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.first(), closed.last());
    }

    #[test]
    fn test_close_ring_idempotent() {
        let already = vec![[-97.8, 30.2], [-97.7, 30.2], [-97.7, 30.3], [-97.8, 30.2]];
        let closed = close_ring(&already);
        assert_eq!(closed.len(), 4);
    }

    #[test]
    fn test_bounds_ring_is_closed_five_points() {
        let bounds = MapBounds { north: 30.4, south: 30.1, east: -97.6, west: -97.9 };
        let ring = bounds_ring(&bounds);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        // Northwest corner first, [lng, lat] order.
        assert_eq!(ring[0], [-97.9, 30.4]);
        assert_eq!(ring[2], [-97.6, 30.1]);
    }
}
