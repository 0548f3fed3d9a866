// Model exports
pub mod criteria;
pub mod listing;
pub mod requests;
pub mod responses;
pub mod stats;

pub use criteria::{Geometry, MapBounds, SearchCriteria, MAX_LIMIT, MIN_LIMIT};
pub use listing::{NormalizedProperty, RawListing};
pub use requests::{CreateCmaRequest, UpdateCmaRequest};
pub use responses::{ErrorResponse, HealthResponse, MlsLookupSummary, SearchResponse};
pub use stats::{MetroStats, MonthlyStat, ZipDetail, ZipStat};
