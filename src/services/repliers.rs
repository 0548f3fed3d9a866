use crate::models::RawListing;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the Repliers listings API
#[derive(Debug, Error)]
pub enum RepliersError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// One page of upstream search results.
///
/// `listings` is empty for count-only queries (`resultsPerPage=1` probes and
/// aggregate calls); `aggregates` is present only when an `aggregates=`
/// parameter was sent.
#[derive(Debug, Clone, Default)]
pub struct ListingsResponse {
    pub count: u64,
    pub listings: Vec<RawListing>,
    pub num_pages: Option<u32>,
    /// zip -> listing count, from `aggregates=address.zip`.
    pub zip_aggregates: Option<HashMap<String, u64>>,
}

/// Repliers API client
///
/// Handles all communication with the upstream MLS search API:
/// - GET searches with query-string filters
/// - POST searches carrying a polygon body for map-drawn areas
///
/// No retries; a failed call is reported once, immediately. The request
/// timeout is explicit and configured, not inherited from platform defaults.
pub struct RepliersClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl RepliersClient {
    /// Create a new Repliers client
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// True when an API key is configured; callers answer 503 otherwise.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Issue a GET search. `params` may repeat keys (e.g. one
    /// `standardStatus` entry per requested status).
    pub async fn get_listings(
        &self,
        params: &[(String, String)],
    ) -> Result<ListingsResponse, RepliersError> {
        let url = format!(
            "{}/listings?{}",
            self.base_url.trim_end_matches('/'),
            encode_query(params)
        );

        tracing::debug!("Repliers GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("REPLIERS-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        self.parse_response(response).await
    }

    /// Issue a polygon search as a POST with a JSON body
    /// `{ "map": [[lng, lat], ...] }`. The ring must already be closed.
    pub async fn post_polygon(
        &self,
        params: &[(String, String)],
        ring: &[[f64; 2]],
    ) -> Result<ListingsResponse, RepliersError> {
        let url = format!(
            "{}/listings?{}",
            self.base_url.trim_end_matches('/'),
            encode_query(params)
        );

        tracing::debug!("Repliers POST {} ({} polygon points)", url, ring.len());

        let body = serde_json::json!({ "map": ring });

        let response = self
            .client
            .post(&url)
            .header("REPLIERS-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        self.parse_response(response).await
    }

    async fn parse_response(
        &self,
        response: reqwest::Response,
    ) -> Result<ListingsResponse, RepliersError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RepliersError::Unauthorized);
        }

        if !status.is_success() {
            // Log the body for diagnosis; it is never surfaced to callers.
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Repliers request failed: {} - {}", status, body);
            return Err(RepliersError::ApiError(format!(
                "Upstream search failed: {}",
                status
            )));
        }

        let json: Value = response.json().await?;

        let count = json.get("count").and_then(|c| c.as_u64()).unwrap_or(0);

        let num_pages = json
            .get("numPages")
            .and_then(|p| p.as_u64())
            .map(|p| p as u32);

        let listings = match json.get("listings") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        let zip_aggregates = json
            .pointer("/aggregates/address/zip")
            .and_then(|z| z.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(zip, n)| n.as_u64().map(|n| (zip.clone(), n)))
                    .collect::<HashMap<String, u64>>()
            });

        Ok(ListingsResponse {
            count,
            listings,
            num_pages,
            zip_aggregates,
        })
    }
}

fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
