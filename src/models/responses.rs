use serde::{Deserialize, Serialize};
use crate::models::listing::NormalizedProperty;

/// Response for the property search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub listings: Vec<NormalizedProperty>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub results_per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mls_lookup: Option<MlsLookupSummary>,
}

/// Found/not-found ledger for bulk MLS-number lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlsLookupSummary {
    pub found: Vec<String>,
    pub not_found: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
