use chrono::{Datelike, Months, NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::config::PulseSettings;
use crate::core::stats::{mean, median, months_of_supply};
use crate::core::zips::ZipCentroids;
use crate::models::{MetroStats, MonthlyStat, RawListing, ZipDetail, ZipStat};
use crate::services::repliers::{ListingsResponse, RepliersClient, RepliersError};

/// Page numbers sampled for per-zip price/DOM distributions, spread across
/// the inventory so one hot neighborhood doesn't dominate. Pages past the
/// actual page count are skipped.
const SAMPLE_PAGES: [u32; 8] = [1, 5, 10, 20, 40, 70, 100, 130];

/// Most zips a comparison request may carry.
const MAX_COMPARE_ZIPS: usize = 5;

/// Most calendar months a trends request may cover.
const MAX_TRENDS_MONTHS: u32 = 24;

/// Errors surfaced by the market statistics aggregator
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream market data unavailable: {0}")]
    Upstream(#[from] RepliersError),
}

/// Market statistics aggregator.
///
/// Every statistic below is computed over bounded samples (at most
/// `sample_size` listings per sub-query), a deliberate precision/cost
/// tradeoff: the upstream API cannot cheaply serve full-population scans.
/// Individual sub-queries inside a fan-out degrade to zero/empty defaults
/// so one flaky call cannot fail the aggregate response.
pub struct MarketPulse {
    client: Arc<RepliersClient>,
    centroids: Arc<ZipCentroids>,
    settings: PulseSettings,
}

impl MarketPulse {
    pub fn new(
        client: Arc<RepliersClient>,
        centroids: Arc<ZipCentroids>,
        settings: PulseSettings,
    ) -> Self {
        Self {
            client,
            centroids,
            settings,
        }
    }

    /// Metro-wide overview: eight upstream queries in one parallel batch.
    pub async fn overview(&self) -> Result<MetroStats, PulseError> {
        let today = Utc::now().date_naive();

        let (active, pending, under_contract, closed_30d, closed_90d, new_7d, active_sample, closed_sample) =
            tokio::join!(
                self.count_or_zero(vec![p("standardStatus", "Active")]),
                self.count_or_zero(vec![p("standardStatus", "Pending")]),
                self.count_or_zero(vec![p("standardStatus", "Active Under Contract")]),
                self.count_or_zero(sold_window(today, 30)),
                self.count_or_zero(sold_window(today, 90)),
                self.count_or_zero(vec![
                    p("standardStatus", "Active"),
                    p("minListDate", &fmt(today - chrono::Duration::days(7))),
                ]),
                self.sample_or_empty(vec![p("standardStatus", "Active")], 1),
                self.sample_or_empty(sold_window(today, 90), 1),
            );

        let active_listings = active_sample.listings;
        let closed_listings = closed_sample.listings;

        Ok(MetroStats {
            active_count: active,
            pending_count: pending,
            active_under_contract_count: under_contract,
            closed_30d,
            closed_90d,
            new_listings_7d: new_7d,
            median_list_price: median(&list_prices(&active_listings)),
            median_sold_price: median(&sold_prices(&closed_listings)),
            avg_days_on_market: mean(&doms(&active_listings)),
            avg_price_per_sqft: mean(&price_per_sqft(&active_listings)),
            months_of_supply: months_of_supply(active, closed_90d),
        })
    }

    /// Per-zip heatmap: one aggregate-by-zip count call, then price/DOM
    /// samples from a fixed spread of pages. The aggregate endpoint reports
    /// counts but no distributions, hence the second pass.
    pub async fn heatmap(&self) -> Result<Vec<ZipStat>, PulseError> {
        let aggregate = self
            .client
            .get_listings(&[
                p("standardStatus", "Active"),
                p("aggregates", "address.zip"),
                p("resultsPerPage", "1"),
                p("pageNum", "1"),
            ])
            .await?;

        let zip_counts = aggregate.zip_aggregates.unwrap_or_default();

        let sample_size = self.settings.sample_size.max(1);
        let page_count =
            ((aggregate.count + sample_size as u64 - 1) / sample_size as u64) as u32;

        let pages: Vec<u32> = SAMPLE_PAGES
            .iter()
            .copied()
            .filter(|page| *page <= page_count.max(1))
            .collect();

        let samples = join_all(pages.into_iter().map(|page| {
            self.sample_or_empty(vec![p("standardStatus", "Active")], page)
        }))
        .await;

        let sampled: Vec<RawListing> = samples
            .into_iter()
            .flat_map(|response| response.listings)
            .collect();

        let mut stats: Vec<ZipStat> = zip_counts
            .into_iter()
            .filter_map(|(zip, count)| {
                // No centroid, no place on the map.
                let centroid = self.centroids.get(&zip)?;

                let in_zip: Vec<&RawListing> = sampled
                    .iter()
                    .filter(|listing| listing.address.zip.as_deref() == Some(zip.as_str()))
                    .collect();

                let prices: Vec<f64> = in_zip
                    .iter()
                    .filter_map(|l| l.list_price.filter(|price| *price > 0.0))
                    .collect();
                let dom: Vec<f64> = in_zip.iter().map(|l| l.days_on_market() as f64).collect();

                Some(ZipStat {
                    zip,
                    active_count: count,
                    median_price: median(&prices),
                    avg_days_on_market: mean(&dom),
                    closed_30d: None,
                    latitude: centroid.lat,
                    longitude: centroid.lng,
                })
            })
            .collect();

        stats.sort_by(|a, b| a.zip.cmp(&b.zip));
        Ok(stats)
    }

    /// Closed-sale history for the last `months_back` calendar months, the
    /// current partial month included, one upstream query per month in
    /// parallel. Only the newest month carries live active inventory; the
    /// upstream API has no historical inventory snapshots.
    pub async fn trends(&self, months_back: u32) -> Result<Vec<MonthlyStat>, PulseError> {
        if months_back == 0 || months_back > MAX_TRENDS_MONTHS {
            return Err(PulseError::Validation(format!(
                "monthsBack must be between 1 and {}",
                MAX_TRENDS_MONTHS
            )));
        }

        let today = Utc::now().date_naive();

        let month_queries = (0..months_back).rev().map(|offset| {
            let (start, end, label) = month_range(today, offset);
            async move {
                let response = self
                    .sample_or_empty(
                        vec![
                            p("status", "U"),
                            p("lastStatus", "Sld"),
                            p("minSoldDate", &fmt(start)),
                            p("maxSoldDate", &fmt(end)),
                        ],
                        1,
                    )
                    .await;

                let sold = sold_prices(&response.listings);
                let dom = doms(&response.listings);

                MonthlyStat {
                    month: label,
                    closed_count: response.count,
                    median_sold_price: median(&sold),
                    avg_days_on_market: mean(&dom),
                    active_inventory: None,
                }
            }
        });

        let (mut months, active_now) = tokio::join!(
            join_all(month_queries),
            self.count_or_zero(vec![p("standardStatus", "Active")]),
        );

        if let Some(newest) = months.last_mut() {
            newest.active_inventory = Some(active_now);
        }

        Ok(months)
    }

    /// Drill-down for one zip code.
    pub async fn zip_detail(&self, zip: &str) -> Result<ZipDetail, PulseError> {
        let zip = zip.trim();
        if zip.is_empty() || zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
            return Err(PulseError::Validation(
                "zip must be a 5-digit code".to_string(),
            ));
        }

        let today = Utc::now().date_naive();

        let (active_sample, closed_30d, closed_90d, closed_sample) = tokio::join!(
            self.sample_or_empty(vec![p("standardStatus", "Active"), p("zip", zip)], 1),
            self.count_or_zero(with_zip(sold_window(today, 30), zip)),
            self.count_or_zero(with_zip(sold_window(today, 90), zip)),
            self.sample_or_empty(with_zip(sold_window(today, 90), zip), 1),
        );

        let centroid = self.centroids.get(zip);

        Ok(ZipDetail {
            zip: zip.to_string(),
            active_count: active_sample.count,
            closed_30d,
            closed_90d,
            median_list_price: median(&list_prices(&active_sample.listings)),
            median_sold_price: median(&sold_prices(&closed_sample.listings)),
            avg_days_on_market: mean(&doms(&active_sample.listings)),
            months_of_supply: months_of_supply(active_sample.count, closed_90d),
            latitude: centroid.map(|c| c.lat),
            longitude: centroid.map(|c| c.lng),
        })
    }

    /// Side-by-side comparison of up to five zips. Zips without a known
    /// centroid are dropped from the output, matching the heatmap.
    pub async fn compare(&self, zips: &[String]) -> Result<Vec<ZipStat>, PulseError> {
        let zips: Vec<&str> = zips
            .iter()
            .map(|zip| zip.trim())
            .filter(|zip| !zip.is_empty())
            .collect();

        if zips.is_empty() {
            return Err(PulseError::Validation(
                "At least one zip code is required".to_string(),
            ));
        }
        if zips.len() > MAX_COMPARE_ZIPS {
            return Err(PulseError::Validation(format!(
                "Maximum {} zip codes",
                MAX_COMPARE_ZIPS
            )));
        }

        let today = Utc::now().date_naive();

        let per_zip = join_all(zips.iter().map(|zip| {
            let zip = zip.to_string();
            async move {
                let (active_sample, closed_30d) = tokio::join!(
                    self.sample_or_empty(
                        vec![p("standardStatus", "Active"), p("zip", &zip)],
                        1
                    ),
                    self.count_or_zero(with_zip(sold_window(today, 30), &zip)),
                );
                (zip, active_sample, closed_30d)
            }
        }))
        .await;

        let stats = per_zip
            .into_iter()
            .filter_map(|(zip, active_sample, closed_30d)| {
                let centroid = self.centroids.get(&zip)?;

                Some(ZipStat {
                    zip,
                    active_count: active_sample.count,
                    median_price: median(&list_prices(&active_sample.listings)),
                    avg_days_on_market: mean(&doms(&active_sample.listings)),
                    closed_30d: Some(closed_30d),
                    latitude: centroid.lat,
                    longitude: centroid.lng,
                })
            })
            .collect();

        Ok(stats)
    }

    /// Count-only query; degrades to 0 on failure.
    async fn count_or_zero(&self, mut params: Vec<(String, String)>) -> u64 {
        params.push(p("resultsPerPage", "1"));
        params.push(p("pageNum", "1"));

        match self.client.get_listings(&params).await {
            Ok(response) => response.count,
            Err(e) => {
                tracing::warn!("Pulse count query failed, defaulting to 0: {}", e);
                0
            }
        }
    }

    /// Sampled-page query; degrades to an empty response on failure.
    async fn sample_or_empty(&self, mut params: Vec<(String, String)>, page: u32) -> ListingsResponse {
        params.push(p("resultsPerPage", self.settings.sample_size.to_string().as_str()));
        params.push(p("pageNum", page.to_string().as_str()));

        match self.client.get_listings(&params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Pulse sample query failed, defaulting to empty: {}", e);
                ListingsResponse::default()
            }
        }
    }
}

fn p(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn fmt(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Sold-listing filter for a trailing window ending today.
fn sold_window(today: NaiveDate, days: i64) -> Vec<(String, String)> {
    vec![
        p("status", "U"),
        p("lastStatus", "Sld"),
        p("minSoldDate", &fmt(today - chrono::Duration::days(days))),
    ]
}

fn with_zip(mut params: Vec<(String, String)>, zip: &str) -> Vec<(String, String)> {
    params.push(p("zip", zip));
    params
}

/// Calendar-month window `offset` months back; the current month's window
/// ends today rather than at month end.
fn month_range(today: NaiveDate, offset: u32) -> (NaiveDate, NaiveDate, String) {
    let first_of_current = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .unwrap_or(today);

    let start = first_of_current
        .checked_sub_months(Months::new(offset))
        .unwrap_or(first_of_current);

    let end = if offset == 0 {
        today
    } else {
        start
            .checked_add_months(Months::new(1))
            .map(|next| next - chrono::Duration::days(1))
            .unwrap_or(start)
    };

    (start, end, start.format("%Y-%m").to_string())
}

fn list_prices(listings: &[RawListing]) -> Vec<f64> {
    listings
        .iter()
        .filter_map(|l| l.list_price.filter(|price| *price > 0.0))
        .collect()
}

fn sold_prices(listings: &[RawListing]) -> Vec<f64> {
    listings.iter().filter_map(|l| l.sold_price()).collect()
}

fn doms(listings: &[RawListing]) -> Vec<f64> {
    listings.iter().map(|l| l.days_on_market() as f64).collect()
}

fn price_per_sqft(listings: &[RawListing]) -> Vec<f64> {
    listings
        .iter()
        .filter_map(|l| {
            let price = l.list_price.filter(|price| *price > 0.0)?;
            let sqft = l.sqft();
            if sqft == 0 {
                return None;
            }
            Some(price / sqft as f64)
        })
        .collect()
}
