pub mod api_client;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod handlers;
pub mod location;
pub mod openapi;
pub mod refresh;

pub use cache::{CacheStore, ClearReport};
pub use catalog::{WeatherCatalog, WeatherSnapshot};
pub use coordinator::{FetchFailure, RefreshOutcome, WeatherCoordinator};
pub use location::{LocationBasis, LocationRequest};
