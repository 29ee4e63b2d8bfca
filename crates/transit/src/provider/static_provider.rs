//! In-memory transit service backed by preloaded data.
//!
//! Stores every route, stop and place in memory with spatial indices for fast
//! proximity queries. Used offline and as a stand-in for the HTTP services.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::*;
use crate::models::types::*;
use crate::network::traits::{ServiceFuture, TransitService};
use crate::spatial::index::{RouteSegmentNode, StopNode};
use crate::spatial::queries::{
    haversine_distance, haversine_distance_to_line, search_envelope_degrees,
};

/// In-memory transit provider with spatial indexing
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticTransitProvider {
    // Core data
    routes: Vec<Arc<RouteFeature>>,
    stops: Vec<Arc<NearbyStop>>,
    places: Arc<PlaceCatalog>,

    // Lookup maps
    route_map: HashMap<RouteCode, Arc<RouteFeature>>,
    place_geometries: HashMap<(PlaceLevel, String), PlaceGeometry>,

    // Spatial indices
    stop_tree: RTree<StopNode>,
    route_tree: RTree<RouteSegmentNode>,
}

impl StaticTransitProvider {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            stops: Vec::new(),
            places: Arc::new(PlaceCatalog::default()),
            route_map: HashMap::new(),
            place_geometries: HashMap::new(),
            stop_tree: RTree::new(),
            route_tree: RTree::new(),
        }
    }

    /// Build provider from raw route and stop data
    pub fn from_data(routes: Vec<RouteFeature>, stops: Vec<NearbyStop>) -> Self {
        let routes: Vec<Arc<RouteFeature>> = routes.into_iter().map(Arc::new).collect();
        let stops: Vec<Arc<NearbyStop>> = stops.into_iter().map(Arc::new).collect();

        // Build lookup maps
        let route_map: HashMap<_, _> = routes
            .iter()
            .map(|r| (r.code().clone(), r.clone()))
            .collect();

        // Build spatial indices
        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .map(|s| StopNode::new(s.location, s.clone()))
                .collect(),
        );

        let mut route_segments = Vec::new();
        for route in &routes {
            for line_string in route.geometry.iter() {
                for segment in line_string.lines() {
                    route_segments.push(RouteSegmentNode::new(segment, route.clone()));
                }
            }
        }
        let route_tree = RTree::bulk_load(route_segments);

        Self {
            routes,
            stops,
            places: Arc::new(PlaceCatalog::default()),
            route_map,
            place_geometries: HashMap::new(),
            stop_tree,
            route_tree,
        }
    }

    /// Attach the administrative place catalog
    pub fn with_places(mut self, places: PlaceCatalog) -> Self {
        self.places = Arc::new(places);
        self
    }

    /// Attach the boundary of one place
    pub fn with_place_geometry(
        mut self,
        name: &str,
        level: PlaceLevel,
        geometry: PlaceGeometry,
    ) -> Self {
        self.place_geometries
            .insert((level, name.to_lowercase()), geometry);
        self
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn get_route(&self, code: &RouteCode) -> Option<&RouteFeature> {
        self.route_map.get(code).map(|r| r.as_ref())
    }

    /// Find stops within radius (meters), closest first
    pub fn stops_near(&self, point: Point, radius_m: f64) -> Vec<NearbyStop> {
        // Validate radius is positive
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let envelope = search_envelope_degrees(radius_m, point.y());
        let mut found: Vec<(f64, &Arc<NearbyStop>)> = self
            .stop_tree
            .locate_within_distance([point.x(), point.y()], envelope * envelope)
            .map(|node| (haversine_distance(point, node.stop.location), &node.stop))
            .filter(|(distance, _)| *distance <= radius_m)
            .collect();

        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, stop)| stop.as_ref().clone()).collect()
    }

    /// Find routes within radius (meters), closest first
    pub fn routes_near(&self, point: Point, radius_m: f64) -> Vec<NearbyRoute> {
        // Validate radius is positive
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let envelope = search_envelope_degrees(radius_m, point.y());
        let mut closest: HashMap<RouteCode, (f64, &Arc<RouteFeature>)> = HashMap::new();
        for node in self
            .route_tree
            .locate_within_distance([point.x(), point.y()], envelope * envelope)
        {
            let distance = haversine_distance_to_line(point, node.segment);
            if distance > radius_m {
                continue;
            }
            closest
                .entry(node.route.code().clone())
                .and_modify(|entry| entry.0 = entry.0.min(distance))
                .or_insert((distance, &node.route));
        }

        let mut found: Vec<NearbyRoute> = closest
            .into_values()
            .map(|(distance, route)| NearbyRoute {
                info: route.info.clone(),
                distance_meters: distance,
                geometry: Some(route.geometry.clone()),
            })
            .collect();

        found.sort_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then_with(|| a.code().cmp(b.code()))
        });
        found
    }

    /// Every stop served by a route
    pub fn stops_of(&self, code: &RouteCode) -> Vec<NearbyStop> {
        let mut seen = HashSet::new();
        self.stops
            .iter()
            .filter(|stop| &stop.route_code == code)
            .filter(|stop| seen.insert((stop.id.clone(), stop.direction)))
            .map(|stop| stop.as_ref().clone())
            .collect()
    }
}

impl Default for StaticTransitProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitService for StaticTransitProvider {
    fn search_places(&self) -> ServiceFuture<'_, PlaceCatalog> {
        Box::pin(async move { Ok(self.places.as_ref().clone()) })
    }

    fn query_place_geometry<'a>(
        &'a self,
        name: &'a str,
        level: PlaceLevel,
    ) -> ServiceFuture<'a, Option<PlaceGeometry>> {
        Box::pin(async move {
            Ok(self
                .place_geometries
                .get(&(level, name.to_lowercase()))
                .cloned())
        })
    }

    fn nearby_routes(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyRoutesResult> {
        Box::pin(async move {
            Ok(NearbyRoutesResult {
                radius_km,
                routes: self.routes_near(center, radius_km * 1_000.0),
            })
        })
    }

    fn route_by_code<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Option<RouteFeature>> {
        Box::pin(async move { Ok(self.get_route(code).cloned()) })
    }

    fn nearby_stops(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyStopsResult> {
        Box::pin(async move {
            Ok(NearbyStopsResult {
                radius_km,
                stops: self.stops_near(center, radius_km * 1_000.0),
            })
        })
    }

    fn stops_for_route<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Vec<NearbyStop>> {
        Box::pin(async move { Ok(self.stops_of(code)) })
    }
}
