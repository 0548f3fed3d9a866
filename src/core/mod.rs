// Core pipeline exports
pub mod post_filter;
pub mod pulse;
pub mod query;
pub mod search;
pub mod stats;
pub mod subdivision;
pub mod zips;

pub use pulse::{MarketPulse, PulseError};
pub use query::{partition_statuses, StatusScope};
pub use search::{PropertySearch, SearchError, SearchResults};
pub use stats::{mean, median, months_of_supply};
pub use zips::{Centroid, ZipCentroids};
