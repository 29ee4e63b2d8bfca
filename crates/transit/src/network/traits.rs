//! Pluggable data-service traits.
//!
//! External crates implement these to provide geocoding, route and stop
//! lookups. Implementations report failures through [`Result`]; callers decide
//! how to fall back.

use std::future::Future;
use std::pin::Pin;

use geo::Point;

use crate::identifiers::RouteCode;
use crate::models::types::*;

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The six lookups the map core consumes
pub trait TransitService: Send + Sync {
    /// Every department, municipality and district
    fn search_places(&self) -> ServiceFuture<'_, PlaceCatalog>;

    /// Boundary of a named place, `None` when the service does not know it
    fn query_place_geometry<'a>(
        &'a self,
        name: &'a str,
        level: PlaceLevel,
    ) -> ServiceFuture<'a, Option<PlaceGeometry>>;

    /// Routes passing within `radius_km` of `center`
    fn nearby_routes(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyRoutesResult>;

    /// Full route by code, `None` when unknown
    fn route_by_code<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Option<RouteFeature>>;

    /// Stops within `radius_km` of `center`
    fn nearby_stops(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyStopsResult>;

    /// Every stop served by a route, both directions
    fn stops_for_route<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Vec<NearbyStop>>;
}
