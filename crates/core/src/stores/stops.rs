use atlas_transit::{ErrorKind, NearbyStop, RouteCode};

use crate::config::RadiusBounds;

/// Stops near the search point, and the stops of the selected route
#[derive(Debug)]
pub struct StopsStore {
    bounds: RadiusBounds,

    radius_km: f64,
    nearby: Vec<NearbyStop>,
    loading: bool,
    error: Option<ErrorKind>,

    route: Option<RouteCode>,
    route_stops: Vec<NearbyStop>,
    route_stops_loading: bool,
}

impl StopsStore {
    pub fn new(bounds: RadiusBounds) -> Self {
        Self {
            bounds,
            radius_km: bounds.default_radius(),
            nearby: Vec::new(),
            loading: false,
            error: None,
            route: None,
            route_stops: Vec::new(),
            route_stops_loading: false,
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn nearby(&self) -> &[NearbyStop] {
        &self.nearby
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn set_radius(&mut self, radius_km: f64) -> f64 {
        self.radius_km = self.bounds.clamp(radius_km);
        self.radius_km
    }

    pub fn begin_query(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn apply_nearby(&mut self, stops: Vec<NearbyStop>, error: Option<ErrorKind>) {
        self.nearby = stops;
        self.error = error;
        self.loading = false;
    }

    /// Drops the nearby stops but keeps the radius of the ongoing search
    pub fn clear_nearby_results(&mut self) {
        self.nearby.clear();
        self.error = None;
    }

    pub fn clear_nearby(&mut self) {
        self.radius_km = self.bounds.default_radius();
        self.clear_nearby_results();
        self.loading = false;
    }

    // ---- Stops of the selected route ----

    pub fn route(&self) -> Option<&RouteCode> {
        self.route.as_ref()
    }

    pub fn route_stops(&self) -> &[NearbyStop] {
        &self.route_stops
    }

    pub fn is_route_stops_loading(&self) -> bool {
        self.route_stops_loading
    }

    pub fn begin_route_stops(&mut self, code: RouteCode) {
        self.route = Some(code);
        self.route_stops.clear();
        self.route_stops_loading = true;
    }

    /// Stores the stops of `code`; ignored if another route was requested since
    pub fn apply_route_stops(&mut self, code: &RouteCode, stops: Vec<NearbyStop>) -> bool {
        if self.route.as_ref() != Some(code) {
            return false;
        }
        self.route_stops = stops;
        self.route_stops_loading = false;
        true
    }

    pub fn clear_route_stops(&mut self) {
        self.route = None;
        self.route_stops.clear();
        self.route_stops_loading = false;
    }
}
