use std::sync::Arc;
use thiserror::Error;

use crate::config::SearchSettings;
use crate::core::query::{self, StatusScope};
use crate::core::{post_filter, subdivision};
use crate::models::{Geometry, MlsLookupSummary, NormalizedProperty, SearchCriteria};
use crate::services::repliers::{ListingsResponse, RepliersClient, RepliersError};

/// Errors surfaced by the property-search composer
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Upstream search unavailable: {0}")]
    Upstream(#[from] RepliersError),
}

/// Result of one composed search
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub listings: Vec<NormalizedProperty>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub results_per_page: u32,
    pub mls_lookup: Option<MlsLookupSummary>,
}

/// CMA property-search composer.
///
/// Turns free-form filter criteria into one or more upstream queries,
/// merges and normalizes the responses, and applies the filters the
/// upstream API cannot express as a client-side pass.
pub struct PropertySearch {
    client: Arc<RepliersClient>,
    settings: SearchSettings,
}

impl PropertySearch {
    pub fn new(client: Arc<RepliersClient>, settings: SearchSettings) -> Self {
        Self { client, settings }
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResults, SearchError> {
        let limit = criteria.clamped_limit();
        let page = criteria.page();

        if criteria.is_mls_lookup() {
            let numbers = criteria.mls_numbers.clone().unwrap_or_default();
            return self.bulk_mls_lookup(&numbers, limit).await;
        }

        let scope = query::partition_statuses(&criteria.statuses);
        let lookback = criteria
            .sold_lookback_days
            .unwrap_or(self.settings.sold_lookback_days);
        let cutoff = query::sold_cutoff(chrono::Utc::now().date_naive(), lookback);

        let mut params = query::base_params(criteria);

        if let Some(term) = criteria.subdivision_term() {
            let resolution = subdivision::resolve(&self.client, term).await;

            if !resolution.is_empty() {
                // Zip is an exact-match field upstream; the discovered zips
                // are more precise than any city filter, which is dropped.
                params.retain(|(key, _)| key != "city");
                for zip in &resolution.zips {
                    params.push(("zip".to_string(), zip.clone()));
                }
                tracing::debug!(
                    "Subdivision '{}' resolved to zips {:?}",
                    term,
                    resolution.zips
                );
            } else if !params.iter().any(|(key, _)| key == "city" || key == "zip") {
                params.push(("city".to_string(), self.settings.default_city.clone()));
            }
        }

        if post_filter::needs_post_filter(criteria) {
            self.search_widened(criteria, params, &scope, &cutoff, page, limit)
                .await
        } else {
            self.search_direct(criteria, params, &scope, &cutoff, page, limit)
                .await
        }
    }

    /// Plain path: upstream handles pagination, totals come from upstream
    /// counts. Used when every requested filter is expressible upstream.
    async fn search_direct(
        &self,
        criteria: &SearchCriteria,
        params: Vec<(String, String)>,
        scope: &StatusScope,
        cutoff: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResults, SearchError> {
        let mut primary_params = params.clone();
        primary_params.extend(query::status_params(scope, false, cutoff));
        primary_params.extend(query::pagination_params(page, limit));

        let primary = self.execute(criteria, &primary_params).await?;

        let mut total = primary.count;
        let mut listings: Vec<NormalizedProperty> = primary
            .listings
            .iter()
            .map(NormalizedProperty::from_raw)
            .collect();

        if matches!(scope, StatusScope::Both(_)) {
            let mut closed_params = params;
            closed_params.extend(query::status_params(scope, true, cutoff));
            closed_params.extend(query::pagination_params(page, limit));

            match self.execute(criteria, &closed_params).await {
                Ok(closed) => {
                    total += closed.count;
                    listings.extend(closed.listings.iter().map(NormalizedProperty::from_raw));
                }
                Err(e) => {
                    tracing::warn!("Closed-listing merge failed, returning active only: {}", e);
                }
            }
        }

        Ok(SearchResults {
            listings,
            total,
            page,
            total_pages: total_pages(total, limit),
            results_per_page: limit,
            mls_lookup: None,
        })
    }

    /// Widened path: fetch one oversized page, apply client-side filters,
    /// and compute pagination from the filtered set rather than the raw
    /// upstream count.
    async fn search_widened(
        &self,
        criteria: &SearchCriteria,
        params: Vec<(String, String)>,
        scope: &StatusScope,
        cutoff: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResults, SearchError> {
        let widened = self.settings.widened_page_size.max(limit);

        let mut primary_params = params.clone();
        primary_params.extend(query::status_params(scope, false, cutoff));
        primary_params.extend(query::pagination_params(1, widened));

        let primary = self.execute(criteria, &primary_params).await?;
        let mut raws = primary.listings;

        if matches!(scope, StatusScope::Both(_)) {
            let mut closed_params = params;
            closed_params.extend(query::status_params(scope, true, cutoff));
            closed_params.extend(query::pagination_params(1, widened));

            match self.execute(criteria, &closed_params).await {
                Ok(closed) => raws.extend(closed.listings),
                Err(e) => {
                    tracing::warn!("Closed-listing merge failed, returning active only: {}", e);
                }
            }
        }

        let filtered: Vec<NormalizedProperty> = raws
            .iter()
            .filter(|raw| post_filter::passes_filters(raw, criteria))
            .map(NormalizedProperty::from_raw)
            .collect();

        let total = filtered.len() as u64;
        let start = ((page - 1) * limit) as usize;
        let listings: Vec<NormalizedProperty> = filtered
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        Ok(SearchResults {
            listings,
            total,
            page,
            total_pages: total_pages(total, limit),
            results_per_page: limit,
            mls_lookup: None,
        })
    }

    /// Bulk lookup: one sequential upstream call per MLS number, keeping a
    /// found/not-found ledger. Sequential on purpose, to bound concurrent
    /// outbound calls.
    async fn bulk_mls_lookup(
        &self,
        numbers: &[String],
        limit: u32,
    ) -> Result<SearchResults, SearchError> {
        let mut summary = MlsLookupSummary::default();
        let mut listings = Vec::new();

        for number in numbers {
            let number = number.trim();
            if number.is_empty() {
                continue;
            }

            let params = vec![
                ("search".to_string(), number.to_string()),
                ("resultsPerPage".to_string(), "10".to_string()),
                ("pageNum".to_string(), "1".to_string()),
            ];

            match self.client.get_listings(&params).await {
                Ok(response) if !response.listings.is_empty() => {
                    let chosen = pick_mls_record(&response, number);
                    listings.push(NormalizedProperty::from_raw(chosen));
                    summary.found.push(number.to_string());
                }
                Ok(_) => {
                    summary.not_found.push(number.to_string());
                }
                Err(e) => {
                    tracing::warn!("MLS lookup for {} failed: {}", number, e);
                    summary.not_found.push(number.to_string());
                }
            }
        }

        let total = listings.len() as u64;
        Ok(SearchResults {
            listings,
            total,
            page: 1,
            total_pages: if total == 0 { 0 } else { 1 },
            results_per_page: limit,
            mls_lookup: Some(summary),
        })
    }

    async fn execute(
        &self,
        criteria: &SearchCriteria,
        params: &[(String, String)],
    ) -> Result<ListingsResponse, RepliersError> {
        match criteria.geometry() {
            Geometry::Polygon(points) => {
                let ring = query::close_ring(&points);
                self.client.post_polygon(params, &ring).await
            }
            Geometry::Bounds(bounds) => {
                let ring = query::bounds_ring(&bounds);
                self.client.post_polygon(params, &ring).await
            }
            Geometry::None => self.client.get_listings(params).await,
        }
    }
}

/// An exact MLS-number match wins over the first record; free-text search
/// can normalize the term and return near-misses first.
fn pick_mls_record<'a>(response: &'a ListingsResponse, number: &str) -> &'a crate::models::RawListing {
    response
        .listings
        .iter()
        .find(|listing| listing.mls_number().eq_ignore_ascii_case(number))
        .unwrap_or(&response.listings[0])
}

fn total_pages(total: u64, limit: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((total + limit as u64 - 1) / limit as u64) as u32
}
