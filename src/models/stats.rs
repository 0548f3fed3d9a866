use serde::{Deserialize, Serialize};

/// Metro-wide dashboard numbers.
///
/// Median and per-sqft figures are computed from bounded listing samples,
/// not the full population; see `core::pulse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroStats {
    pub active_count: u64,
    pub pending_count: u64,
    pub active_under_contract_count: u64,
    pub closed_30d: u64,
    pub closed_90d: u64,
    pub new_listings_7d: u64,
    pub median_list_price: f64,
    pub median_sold_price: f64,
    pub avg_days_on_market: f64,
    pub avg_price_per_sqft: f64,
    pub months_of_supply: f64,
}

/// Per-zip market snapshot, used by the heatmap and the comparison view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipStat {
    pub zip: String,
    pub active_count: u64,
    pub median_price: f64,
    pub avg_days_on_market: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_30d: Option<u64>,
    pub latitude: f64,
    pub longitude: f64,
}

/// One calendar month of closed-sale history.
///
/// `active_inventory` is only available for the current month; the upstream
/// API has no historical inventory snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    /// Month label, `YYYY-MM`.
    pub month: String,
    pub closed_count: u64,
    pub median_sold_price: f64,
    pub avg_days_on_market: f64,
    pub active_inventory: Option<u64>,
}

/// Drill-down for a single zip code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipDetail {
    pub zip: String,
    pub active_count: u64,
    pub closed_30d: u64,
    pub closed_90d: u64,
    pub median_list_price: f64,
    pub median_sold_price: f64,
    pub avg_days_on_market: f64,
    pub months_of_supply: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
