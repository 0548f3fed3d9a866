// Route exports
pub mod cma;
pub mod listings;
pub mod pulse;

use actix_web::web;
use std::sync::Arc;

use crate::core::{MarketPulse, PropertySearch};
use crate::services::{PulseCache, RepliersClient, StorageClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub repliers: Arc<RepliersClient>,
    pub search: Arc<PropertySearch>,
    pub pulse: Arc<MarketPulse>,
    pub cache: Arc<PulseCache>,
    pub storage: Option<Arc<StorageClient>>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(listings::configure)
            .configure(pulse::configure)
            .configure(cma::configure),
    );
}
