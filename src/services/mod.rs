// Service exports
pub mod auth;
pub mod cache;
pub mod repliers;
pub mod storage;

pub use auth::{AuthedUser, JwtValidator};
pub use cache::{CacheError, PulseCache};
pub use repliers::{ListingsResponse, RepliersClient, RepliersError};
pub use storage::{SavedCma, StorageClient, StorageError};
