//! Transit data models and types.

pub mod types;

// Re-exports for convenience
pub use types::{
    DirectionId, ErrorKind, NearbyRoute, NearbyRoutesResult, NearbyStop, NearbyStopsResult,
    PlaceCatalog, PlaceLevel, Result, RouteFeature, RouteInfo, ServiceError,
};
