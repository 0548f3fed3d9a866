use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::search::SearchError;
use crate::models::{ErrorResponse, HealthResponse, SearchCriteria, SearchResponse};
use crate::routes::AppState;
use crate::services::AuthedUser;

/// Configure listing-search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/listings/search", web::post().to(search_listings));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let storage_healthy = match &state.storage {
        Some(storage) => storage.health_check().await.unwrap_or(false),
        // No database configured is a valid deployment, not a fault.
        None => true,
    };

    let status = if storage_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// CMA property search endpoint
///
/// POST /api/v1/listings/search
///
/// Request body mirrors `SearchCriteria`; the response carries normalized
/// listings plus pagination metadata.
async fn search_listings(
    state: web::Data<AppState>,
    user: AuthedUser,
    req: web::Json<SearchCriteria>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if !state.repliers.is_configured() {
        return HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: "Not configured".to_string(),
            message: "Listings search is not configured".to_string(),
            status_code: 503,
        });
    }

    tracing::info!(
        "Searching listings for {} (page {}, limit {})",
        user.user_id,
        req.page(),
        req.clamped_limit()
    );

    match state.search.search(&req).await {
        Ok(results) => HttpResponse::Ok().json(SearchResponse {
            listings: results.listings,
            total: results.total,
            page: results.page,
            total_pages: results.total_pages,
            results_per_page: results.results_per_page,
            mls_lookup: results.mls_lookup,
        }),
        Err(SearchError::Upstream(e)) => {
            tracing::error!("Listing search failed upstream: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Upstream failure".to_string(),
                message: "Failed to search listings".to_string(),
                status_code: 502,
            })
        }
    }
}
