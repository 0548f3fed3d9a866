// Integration tests driving the composer and aggregator end-to-end
// against a mock Repliers server.

use std::sync::Arc;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use mls_gateway::config::{PulseSettings, SearchSettings};
use mls_gateway::core::pulse::PulseError;
use mls_gateway::core::search::SearchError;
use mls_gateway::core::{MarketPulse, PropertySearch, ZipCentroids};
use mls_gateway::models::SearchCriteria;
use mls_gateway::services::repliers::RepliersClient;

fn repliers(server: &ServerGuard) -> Arc<RepliersClient> {
    Arc::new(RepliersClient::new(server.url(), "test-key".to_string(), 5))
}

fn search_for(server: &ServerGuard) -> PropertySearch {
    PropertySearch::new(repliers(server), SearchSettings::default())
}

fn pulse_for(server: &ServerGuard, centroids: ZipCentroids) -> MarketPulse {
    MarketPulse::new(repliers(server), Arc::new(centroids), PulseSettings::default())
}

fn austin_centroids() -> ZipCentroids {
    ZipCentroids::from_toml_str(
        r#"
[centroids]
78704 = { lat = 30.2430, lng = -97.7650 }
78745 = { lat = 30.2070, lng = -97.7950 }
"#,
    )
    .unwrap()
}

fn listing(mls: &str, price: f64, zip: &str, neighborhood: &str) -> serde_json::Value {
    json!({
        "mlsNumber": mls,
        "listPrice": price,
        "soldPrice": price,
        "address": {
            "streetNumber": "100",
            "streetName": "Test",
            "streetSuffix": "Ln",
            "city": "Austin",
            "state": "TX",
            "zip": zip,
            "neighborhood": neighborhood
        },
        "details": { "numBedrooms": 3, "numBathrooms": 2, "sqft": 2000 },
        "daysOnMarket": 20
    })
}

#[tokio::test]
async fn test_basic_active_search() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("city".into(), "Austin".into()),
            Matcher::UrlEncoded("minBeds".into(), "3".into()),
            Matcher::UrlEncoded("standardStatus".into(), "Active".into()),
            Matcher::UrlEncoded("pageNum".into(), "1".into()),
            Matcher::UrlEncoded("resultsPerPage".into(), "20".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 2,
                "listings": [
                    listing("1000001", 450000.0, "78745", "Cherry Creek"),
                    listing("1000002", 520000.0, "78745", "Cherry Creek"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let criteria = SearchCriteria {
        city: Some("Austin".to_string()),
        min_beds: Some(3),
        statuses: vec!["Active".to_string()],
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();

    mock.assert_async().await;
    assert_eq!(results.total, 2);
    assert_eq!(results.total_pages, 1);
    assert_eq!(results.listings.len(), 2);
    assert_eq!(results.listings[0].address, "100 Test Ln");
    assert_eq!(results.listings[0].mls_number, "1000001");
}

#[tokio::test]
async fn test_merged_active_and_closed_totals() {
    let mut server = Server::new_async().await;

    let active_mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("standardStatus".into(), "Active".into()),
        ]))
        .with_body(
            json!({
                "count": 2,
                "listings": [
                    listing("2000001", 400000.0, "78704", "Zilker"),
                    listing("2000002", 410000.0, "78704", "Zilker"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let closed_mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "U".into()),
            Matcher::UrlEncoded("lastStatus".into(), "Sld".into()),
        ]))
        .with_body(
            json!({
                "count": 3,
                "listings": [listing("2000003", 395000.0, "78704", "Zilker")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let criteria = SearchCriteria {
        city: Some("Austin".to_string()),
        statuses: vec!["Active".to_string(), "Closed".to_string()],
        sold_lookback_days: Some(180),
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();

    active_mock.assert_async().await;
    closed_mock.assert_async().await;

    // Merged total is the sum of both upstream counts, active listings first.
    assert_eq!(results.total, 5);
    assert_eq!(results.listings.len(), 3);
    assert_eq!(results.listings[0].mls_number, "2000001");
    assert_eq!(results.listings[2].mls_number, "2000003");
}

#[tokio::test]
async fn test_closed_merge_failure_degrades_to_active() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("lastStatus".into(), "Sld".into()),
        ]))
        .with_status(500)
        .create_async()
        .await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("standardStatus".into(), "Active".into()),
        ]))
        .with_body(
            json!({
                "count": 2,
                "listings": [
                    listing("3000001", 400000.0, "78704", "Zilker"),
                    listing("3000002", 410000.0, "78704", "Zilker"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let criteria = SearchCriteria {
        statuses: vec!["Active".to_string(), "Closed".to_string()],
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();
    assert_eq!(results.total, 2);
    assert_eq!(results.listings.len(), 2);
}

#[tokio::test]
async fn test_primary_failure_aborts_search() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let criteria = SearchCriteria {
        city: Some("Austin".to_string()),
        ..Default::default()
    };

    let result = search_for(&server).search(&criteria).await;
    assert!(matches!(result, Err(SearchError::Upstream(_))));
}

#[tokio::test]
async fn test_oversized_limit_clamped_upstream() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("resultsPerPage".into(), "50".into()),
        ]))
        .with_body(json!({ "count": 0 }).to_string())
        .create_async()
        .await;

    let criteria = SearchCriteria { limit: 500, ..Default::default() };
    let results = search_for(&server).search(&criteria).await.unwrap();

    mock.assert_async().await;
    assert_eq!(results.total_pages, 0);
    assert_eq!(results.results_per_page, 50);
}

#[tokio::test]
async fn test_subdivision_resolution_and_post_filter() {
    let mut server = Server::new_async().await;

    // First probe discovers two zips and stops probing.
    let probe_mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("neighborhood".into(), "Circle C".into()),
        ]))
        .with_body(
            json!({
                "count": 2,
                "listings": [
                    listing("4000001", 600000.0, "78739", "Circle C Ranch Ph A Sec 04"),
                    listing("4000002", 650000.0, "78748", "Circle C West Sec 02"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    // Main search is re-issued by discovered zip, widened page size.
    let main_mock = server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("zip".into(), "78739".into()),
            Matcher::UrlEncoded("zip".into(), "78748".into()),
            Matcher::UrlEncoded("standardStatus".into(), "Active".into()),
            Matcher::UrlEncoded("resultsPerPage".into(), "100".into()),
        ]))
        .with_body(
            json!({
                "count": 3,
                "listings": [
                    listing("4000001", 600000.0, "78739", "Circle C Ranch Ph A Sec 04"),
                    listing("4000002", 650000.0, "78748", "Circle C West Sec 02"),
                    listing("4000003", 500000.0, "78748", "Shady Hollow Sec 01"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let criteria = SearchCriteria {
        city: Some("Austin".to_string()),
        subdivision: Some("Circle C".to_string()),
        statuses: vec!["Active".to_string()],
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();

    probe_mock.assert_async().await;
    main_mock.assert_async().await;

    // Pagination reflects the post-filtered set, not the raw upstream count.
    assert_eq!(results.total, 2);
    assert_eq!(results.total_pages, 1);
    assert!(results
        .listings
        .iter()
        .all(|listing| listing.subdivision.to_lowercase().contains("circle c")));
}

#[tokio::test]
async fn test_bulk_mls_lookup_ledger() {
    let mut server = Server::new_async().await;

    // Exact match is second in the list; it must still win over the first.
    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".into(), "5550001".into()),
        ]))
        .with_body(
            json!({
                "count": 2,
                "listings": [
                    listing("5550002", 300000.0, "78745", ""),
                    listing("5550001", 310000.0, "78745", ""),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".into(), "9999999".into()),
        ]))
        .with_body(json!({ "count": 0 }).to_string())
        .create_async()
        .await;

    let criteria = SearchCriteria {
        mls_numbers: Some(vec!["5550001".to_string(), "9999999".to_string()]),
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();

    let ledger = results.mls_lookup.unwrap();
    assert_eq!(ledger.found, vec!["5550001"]);
    assert_eq!(ledger.not_found, vec!["9999999"]);
    assert_eq!(results.listings.len(), 1);
    assert_eq!(results.listings[0].mls_number, "5550001");
}

#[tokio::test]
async fn test_polygon_posted_closed() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/listings")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "map": [
                [-97.80, 30.20],
                [-97.70, 30.20],
                [-97.70, 30.30],
                [-97.80, 30.30],
                [-97.80, 30.20],
            ]
        })))
        .with_body(json!({ "count": 0 }).to_string())
        .create_async()
        .await;

    let criteria = SearchCriteria {
        polygon: Some(vec![
            [-97.80, 30.20],
            [-97.70, 30.20],
            [-97.70, 30.30],
            [-97.80, 30.30],
        ]),
        statuses: vec!["Active".to_string()],
        ..Default::default()
    };

    let results = search_for(&server).search(&criteria).await.unwrap();

    mock.assert_async().await;
    assert_eq!(results.total, 0);
}

#[tokio::test]
async fn test_pulse_overview_statistics() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "count": 6,
                "listings": [
                    listing("7000001", 300000.0, "78704", ""),
                    listing("7000002", 400000.0, "78704", ""),
                    listing("7000003", 500000.0, "78704", ""),
                ]
            })
            .to_string(),
        )
        .expect_at_least(8)
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let stats = pulse.overview().await.unwrap();

    assert_eq!(stats.active_count, 6);
    assert_eq!(stats.closed_90d, 6);
    assert_eq!(stats.median_list_price, 400000.0);
    assert_eq!(stats.median_sold_price, 400000.0);
    assert_eq!(stats.avg_days_on_market, 20.0);
    // 6 active / (6 closed in 90d / 3) = 3 months of supply
    assert_eq!(stats.months_of_supply, 3.0);
}

#[tokio::test]
async fn test_pulse_overview_degrades_on_upstream_failure() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let stats = pulse.overview().await.unwrap();

    assert_eq!(stats.active_count, 0);
    assert_eq!(stats.median_list_price, 0.0);
    assert_eq!(stats.months_of_supply, 0.0);
}

#[tokio::test]
async fn test_heatmap_drops_zips_without_centroids() {
    let mut server = Server::new_async().await;

    // Page samples: resultsPerPage=100 distinguishes them from the
    // aggregate call below.
    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("resultsPerPage".into(), "100".into()),
        ]))
        .with_body(
            json!({
                "count": 120,
                "listings": [
                    listing("8000001", 350000.0, "78704", ""),
                    listing("8000002", 450000.0, "78704", ""),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("aggregates".into(), "address.zip".into()),
        ]))
        .with_body(
            json!({
                "count": 120,
                "aggregates": { "address": { "zip": { "78704": 80, "99999": 40 } } }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let stats = pulse.heatmap().await.unwrap();

    // 99999 has no centroid and is dropped.
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].zip, "78704");
    assert_eq!(stats[0].active_count, 80);
    assert_eq!(stats[0].median_price, 400000.0);
    assert!((stats[0].latitude - 30.2430).abs() < 1e-9);
}

#[tokio::test]
async fn test_trends_shape_and_inventory_annotation() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "count": 5,
                "listings": [listing("9000001", 425000.0, "78745", "")]
            })
            .to_string(),
        )
        .expect_at_least(4)
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let months = pulse.trends(3).await.unwrap();

    assert_eq!(months.len(), 3);
    // Oldest first; only the newest month carries live inventory.
    assert!(months[0].month < months[2].month);
    assert!(months[0].active_inventory.is_none());
    assert!(months[1].active_inventory.is_none());
    assert_eq!(months[2].active_inventory, Some(5));
    assert_eq!(months[2].closed_count, 5);
    assert_eq!(months[2].median_sold_price, 425000.0);
}

#[tokio::test]
async fn test_trends_rejects_out_of_range_window() {
    let server = Server::new_async().await;
    let pulse = pulse_for(&server, austin_centroids());

    assert!(matches!(pulse.trends(0).await, Err(PulseError::Validation(_))));
    assert!(matches!(pulse.trends(25).await, Err(PulseError::Validation(_))));
}

#[tokio::test]
async fn test_compare_validates_zip_count() {
    let server = Server::new_async().await;
    let pulse = pulse_for(&server, austin_centroids());

    let none: Vec<String> = vec![];
    assert!(matches!(
        pulse.compare(&none).await,
        Err(PulseError::Validation(_))
    ));

    let six: Vec<String> = vec![
        "78704", "78745", "78748", "78749", "78759", "78610",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    match pulse.compare(&six).await {
        Err(PulseError::Validation(message)) => assert!(message.contains("Maximum 5")),
        other => panic!("Expected validation error, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn test_compare_reduces_per_zip_stats() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "count": 4,
                "listings": [
                    listing("8100001", 380000.0, "78704", ""),
                    listing("8100002", 420000.0, "78704", ""),
                ]
            })
            .to_string(),
        )
        .expect_at_least(2)
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let stats = pulse
        .compare(&["78704".to_string(), "99999".to_string()])
        .await
        .unwrap();

    // The unknown zip is dropped; the known one carries both counts.
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].zip, "78704");
    assert_eq!(stats[0].active_count, 4);
    assert_eq!(stats[0].closed_30d, Some(4));
    assert_eq!(stats[0].median_price, 400000.0);
}

#[tokio::test]
async fn test_zip_detail_rejects_malformed_zip() {
    let server = Server::new_async().await;
    let pulse = pulse_for(&server, austin_centroids());

    assert!(matches!(
        pulse.zip_detail("abc").await,
        Err(PulseError::Validation(_))
    ));
    assert!(matches!(
        pulse.zip_detail("").await,
        Err(PulseError::Validation(_))
    ));
}

#[tokio::test]
async fn test_zip_detail_happy_path() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/listings")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "count": 9,
                "listings": [listing("8200001", 500000.0, "78745", "")]
            })
            .to_string(),
        )
        .expect_at_least(4)
        .create_async()
        .await;

    let pulse = pulse_for(&server, austin_centroids());
    let detail = pulse.zip_detail("78745").await.unwrap();

    assert_eq!(detail.zip, "78745");
    assert_eq!(detail.active_count, 9);
    assert_eq!(detail.closed_90d, 9);
    // 9 active / (9 closed in 90d / 3) = 3 months of supply
    assert_eq!(detail.months_of_supply, 3.0);
    assert!(detail.latitude.is_some());
}
