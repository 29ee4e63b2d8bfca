//! # atlas-transit
//!
//! Transit and administrative-place data for the map explorer.
//!
//! ## Features
//!
//! - **Typed models**: routes, stops and places with cheap-to-clone identifiers
//! - **Spatial queries**: Fast R-tree based spatial indexing with Haversine refinement
//! - **Pluggable services**: Implement [`TransitService`] to provide your own data fetching
//!
//! ## Example
//!
//! ```
//! use atlas_transit::prelude::*;
//! use geo::{LineString, MultiLineString, Point};
//!
//! let route = RouteFeature {
//!     info: RouteInfo {
//!         code: RouteCode::new("R101"),
//!         name: "Centro - Soyapango".into(),
//!         kind: "Bus".into(),
//!         subtype: "Urbano".into(),
//!         direction: DirectionId::Outbound,
//!         department: "San Salvador".into(),
//!         length_km: 9.4,
//!     },
//!     geometry: MultiLineString::new(vec![LineString::from(vec![
//!         (-89.20, 13.69),
//!         (-89.20, 13.71),
//!     ])]),
//! };
//!
//! let provider = StaticTransitProvider::from_data(vec![route], vec![]);
//!
//! // Query routes within 500 m of downtown San Salvador
//! let nearby = provider.routes_near(Point::new(-89.2, 13.7), 500.0);
//! assert_eq!(nearby.len(), 1);
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::network::traits::*;
    pub use crate::provider::static_provider::StaticTransitProvider;
}

pub use prelude::*;
