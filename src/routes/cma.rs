use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateCmaRequest, ErrorResponse, UpdateCmaRequest};
use crate::routes::AppState;
use crate::services::{AuthedUser, StorageClient, StorageError};
use std::sync::Arc;

/// Configure saved-CMA routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/cma/searches", web::post().to(create_cma))
        .route("/cma/searches", web::get().to(list_cmas))
        .route("/cma/searches/{id}", web::get().to(get_cma))
        .route("/cma/searches/{id}", web::put().to(update_cma))
        .route("/cma/searches/{id}", web::delete().to(delete_cma));
}

fn storage_or_unavailable(state: &AppState) -> Result<Arc<StorageClient>, HttpResponse> {
    state.storage.clone().ok_or_else(|| {
        HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: "Not configured".to_string(),
            message: "Saved searches are not configured".to_string(),
            status_code: 503,
        })
    })
}

fn storage_error_response(e: StorageError) -> HttpResponse {
    match e {
        StorageError::NotFound(message) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message,
            status_code: 404,
        }),
        StorageError::InvalidInput(message) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message,
            status_code: 400,
        }),
        e => {
            tracing::error!("Saved-search storage error: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Storage failure".to_string(),
                message: "Failed to access saved searches".to_string(),
                status_code: 500,
            })
        }
    }
}

/// Save a CMA search
///
/// POST /api/v1/cma/searches
async fn create_cma(
    state: web::Data<AppState>,
    user: AuthedUser,
    req: web::Json<CreateCmaRequest>,
) -> impl Responder {
    let storage = match storage_or_unavailable(&state) {
        Ok(storage) => storage,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match storage.create_cma(&user.user_id, &req.name, &req.criteria).await {
        Ok(saved) => HttpResponse::Created().json(saved),
        Err(e) => storage_error_response(e),
    }
}

/// List the caller's saved searches
///
/// GET /api/v1/cma/searches
async fn list_cmas(state: web::Data<AppState>, user: AuthedUser) -> impl Responder {
    let storage = match storage_or_unavailable(&state) {
        Ok(storage) => storage,
        Err(response) => return response,
    };

    match storage.list_cmas(&user.user_id).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => storage_error_response(e),
    }
}

/// Fetch one saved search
///
/// GET /api/v1/cma/searches/{id}
async fn get_cma(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> impl Responder {
    let storage = match storage_or_unavailable(&state) {
        Ok(storage) => storage,
        Err(response) => return response,
    };

    match storage.get_cma(&user.user_id, path.into_inner()).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => storage_error_response(e),
    }
}

/// Rename or re-scope a saved search
///
/// PUT /api/v1/cma/searches/{id}
async fn update_cma(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateCmaRequest>,
) -> impl Responder {
    let storage = match storage_or_unavailable(&state) {
        Ok(storage) => storage,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match storage
        .update_cma(
            &user.user_id,
            path.into_inner(),
            req.name.as_deref(),
            req.criteria.as_ref(),
        )
        .await
    {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => storage_error_response(e),
    }
}

/// Delete a saved search
///
/// DELETE /api/v1/cma/searches/{id}
async fn delete_cma(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> impl Responder {
    let storage = match storage_or_unavailable(&state) {
        Ok(storage) => storage,
        Err(response) => return response,
    };

    match storage.delete_cma(&user.user_id, path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => storage_error_response(e),
    }
}
