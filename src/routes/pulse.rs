use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::core::pulse::PulseError;
use crate::models::{ErrorResponse, MetroStats, MonthlyStat, ZipDetail, ZipStat};
use crate::routes::AppState;
use crate::services::AuthedUser;

/// Configure Market Pulse routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/pulse/overview", web::get().to(overview))
        .route("/pulse/heatmap", web::get().to(heatmap))
        .route("/pulse/trends", web::get().to(trends))
        .route("/pulse/zip/{zip}", web::get().to(zip_detail))
        .route("/pulse/compare", web::get().to(compare));
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsQuery {
    #[serde(default = "default_months_back")]
    months_back: u32,
    #[serde(default)]
    refresh: bool,
}

fn default_months_back() -> u32 {
    6
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated zip codes, at most five.
    zips: String,
}

fn pulse_error_response(e: PulseError) -> HttpResponse {
    match e {
        PulseError::Validation(message) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message,
            status_code: 400,
        }),
        PulseError::Upstream(e) => {
            tracing::error!("Pulse query failed upstream: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Upstream failure".to_string(),
                message: "Market data is unavailable".to_string(),
                status_code: 502,
            })
        }
    }
}

fn not_configured() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: "Not configured".to_string(),
        message: "Market data is not configured".to_string(),
        status_code: 503,
    })
}

/// Metro-wide market overview
///
/// GET /api/v1/pulse/overview?refresh=true
async fn overview(
    state: web::Data<AppState>,
    _user: AuthedUser,
    query: web::Query<RefreshQuery>,
) -> impl Responder {
    if !state.repliers.is_configured() {
        return not_configured();
    }

    const KEY: &str = "pulse:overview";

    if !query.refresh {
        if let Some(stats) = state.cache.get::<MetroStats>(KEY).await {
            return HttpResponse::Ok().json(stats);
        }
    }

    match state.pulse.overview().await {
        Ok(stats) => {
            if let Err(e) = state.cache.set(KEY, &stats).await {
                tracing::warn!("Failed to cache overview: {}", e);
            }
            HttpResponse::Ok().json(stats)
        }
        Err(e) => pulse_error_response(e),
    }
}

/// Per-zip heatmap
///
/// GET /api/v1/pulse/heatmap?refresh=true
async fn heatmap(
    state: web::Data<AppState>,
    _user: AuthedUser,
    query: web::Query<RefreshQuery>,
) -> impl Responder {
    if !state.repliers.is_configured() {
        return not_configured();
    }

    const KEY: &str = "pulse:heatmap";

    if !query.refresh {
        if let Some(stats) = state.cache.get::<Vec<ZipStat>>(KEY).await {
            return HttpResponse::Ok().json(stats);
        }
    }

    match state.pulse.heatmap().await {
        Ok(stats) => {
            if let Err(e) = state.cache.set(KEY, &stats).await {
                tracing::warn!("Failed to cache heatmap: {}", e);
            }
            HttpResponse::Ok().json(stats)
        }
        Err(e) => pulse_error_response(e),
    }
}

/// Monthly closed-sale trends
///
/// GET /api/v1/pulse/trends?monthsBack=6
async fn trends(
    state: web::Data<AppState>,
    _user: AuthedUser,
    query: web::Query<TrendsQuery>,
) -> impl Responder {
    if !state.repliers.is_configured() {
        return not_configured();
    }

    let key = format!("pulse:trends:{}", query.months_back);

    if !query.refresh {
        if let Some(stats) = state.cache.get::<Vec<MonthlyStat>>(&key).await {
            return HttpResponse::Ok().json(stats);
        }
    }

    match state.pulse.trends(query.months_back).await {
        Ok(stats) => {
            if let Err(e) = state.cache.set(&key, &stats).await {
                tracing::warn!("Failed to cache trends: {}", e);
            }
            HttpResponse::Ok().json(stats)
        }
        Err(e) => pulse_error_response(e),
    }
}

/// Single-zip drill-down
///
/// GET /api/v1/pulse/zip/{zip}
async fn zip_detail(
    state: web::Data<AppState>,
    _user: AuthedUser,
    path: web::Path<String>,
    query: web::Query<RefreshQuery>,
) -> impl Responder {
    if !state.repliers.is_configured() {
        return not_configured();
    }

    let zip = path.into_inner();
    let key = format!("pulse:zip:{}", zip.trim());

    if !query.refresh {
        if let Some(detail) = state.cache.get::<ZipDetail>(&key).await {
            return HttpResponse::Ok().json(detail);
        }
    }

    match state.pulse.zip_detail(&zip).await {
        Ok(detail) => {
            if let Err(e) = state.cache.set(&key, &detail).await {
                tracing::warn!("Failed to cache zip detail: {}", e);
            }
            HttpResponse::Ok().json(detail)
        }
        Err(e) => pulse_error_response(e),
    }
}

/// Zip comparison
///
/// GET /api/v1/pulse/compare?zips=78704,78745
async fn compare(
    state: web::Data<AppState>,
    _user: AuthedUser,
    query: web::Query<CompareQuery>,
) -> impl Responder {
    if !state.repliers.is_configured() {
        return not_configured();
    }

    let zips: Vec<String> = query
        .zips
        .split(',')
        .map(|zip| zip.trim().to_string())
        .filter(|zip| !zip.is_empty())
        .collect();

    match state.pulse.compare(&zips).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => pulse_error_response(e),
    }
}
