//! Fixtures and a scripted [`TransitService`] for unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use atlas_transit::prelude::*;
use geo::{LineString, MultiLineString, Point};

pub fn route_info(code: &str) -> RouteInfo {
    RouteInfo {
        code: RouteCode::new(code),
        name: format!("Ruta {code}").into(),
        kind: "Bus".into(),
        subtype: "Urbano".into(),
        direction: DirectionId::Outbound,
        department: "San Salvador".into(),
        length_km: 12.0,
    }
}

fn path() -> MultiLineString {
    MultiLineString::new(vec![LineString::from(vec![(-89.21, 13.69), (-89.19, 13.71)])])
}

pub fn nearby_route(code: &str, distance_meters: f64) -> NearbyRoute {
    NearbyRoute {
        info: route_info(code),
        distance_meters,
        geometry: Some(path()),
    }
}

pub fn route_feature(code: &str) -> RouteFeature {
    RouteFeature {
        info: route_info(code),
        geometry: path(),
    }
}

pub fn stop(id: &str, route_code: &str) -> NearbyStop {
    NearbyStop {
        id: StopIdentifier::new(id),
        route_code: RouteCode::new(route_code),
        direction: DirectionId::Inbound,
        name: format!("Parada {id}").into(),
        location: Point::new(-89.2, 13.7),
        department: "San Salvador".into(),
    }
}

fn scripted_error(kind: ErrorKind) -> ServiceError {
    match kind {
        ErrorKind::Network => ServiceError::Network("scripted".into()),
        ErrorKind::Validation => ServiceError::InvalidPayload("scripted".into()),
        ErrorKind::Geometry => ServiceError::InvalidGeometry("scripted".into()),
        ErrorKind::Unknown => ServiceError::Other("scripted".into()),
    }
}

#[derive(Clone, Debug, Default)]
struct Round {
    routes: Vec<String>,
    stops: Vec<String>,
    delay: Duration,
    routes_error: Option<ErrorKind>,
    stops_error: Option<ErrorKind>,
}

/// Answers nearby queries round by round: the n-th routes (or stops) call is
/// served by the n-th round, the last round repeats forever.
#[derive(Debug, Default)]
pub struct ScriptedService {
    rounds: Vec<Round>,
    routes_calls: AtomicUsize,
    stops_calls: AtomicUsize,
    radii: Mutex<Vec<f64>>,
    route_lookups: Mutex<Vec<String>>,
    route_delays: HashMap<String, Duration>,
    places: PlaceCatalog,
    place_geometries: HashMap<String, PlaceGeometry>,
}

impl ScriptedService {
    pub fn with_results(routes: &[&str], stops: &[&str]) -> Self {
        Self::default().then_results(routes, stops)
    }

    /// Appends a round
    pub fn then_results(mut self, routes: &[&str], stops: &[&str]) -> Self {
        self.rounds.push(Round {
            routes: routes.iter().map(|s| s.to_string()).collect(),
            stops: stops.iter().map(|s| s.to_string()).collect(),
            ..Round::default()
        });
        self
    }

    /// Delays the last round's answers
    pub fn delayed(mut self, delay: Duration) -> Self {
        if let Some(round) = self.rounds.last_mut() {
            round.delay = delay;
        }
        self
    }

    pub fn failing_routes(mut self, kind: ErrorKind) -> Self {
        if let Some(round) = self.rounds.last_mut() {
            round.routes_error = Some(kind);
        }
        self
    }

    pub fn failing_stops(mut self, kind: ErrorKind) -> Self {
        if let Some(round) = self.rounds.last_mut() {
            round.stops_error = Some(kind);
        }
        self
    }

    /// Delays `route_by_code` for one code
    pub fn slow_route(mut self, code: &str, delay: Duration) -> Self {
        self.route_delays.insert(code.to_owned(), delay);
        self
    }

    pub fn with_places(mut self, places: PlaceCatalog) -> Self {
        self.places = places;
        self
    }

    pub fn with_place_geometry(mut self, name: &str, geometry: PlaceGeometry) -> Self {
        self.place_geometries.insert(name.to_owned(), geometry);
        self
    }

    /// Radius of every nearby call, routes and stops, in call order
    pub fn nearby_calls(&self) -> Vec<f64> {
        self.radii.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn route_lookups(&self) -> Vec<String> {
        self.route_lookups.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn round(&self, counter: &AtomicUsize, radius_km: f64) -> Round {
        self.radii.lock().unwrap_or_else(PoisonError::into_inner).push(radius_km);
        let call = counter.fetch_add(1, Ordering::SeqCst);
        self.rounds
            .get(call)
            .or(self.rounds.last())
            .cloned()
            .unwrap_or_default()
    }
}

impl TransitService for ScriptedService {
    fn search_places(&self) -> ServiceFuture<'_, PlaceCatalog> {
        Box::pin(async move { Ok(self.places.clone()) })
    }

    fn query_place_geometry<'a>(
        &'a self,
        name: &'a str,
        _level: PlaceLevel,
    ) -> ServiceFuture<'a, Option<PlaceGeometry>> {
        Box::pin(async move { Ok(self.place_geometries.get(name).cloned()) })
    }

    fn nearby_routes(&self, _center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyRoutesResult> {
        let round = self.round(&self.routes_calls, radius_km);
        Box::pin(async move {
            tokio::time::sleep(round.delay).await;
            if let Some(kind) = round.routes_error {
                return Err(scripted_error(kind));
            }
            Ok(NearbyRoutesResult {
                radius_km,
                routes: round
                    .routes
                    .iter()
                    .enumerate()
                    .map(|(i, code)| nearby_route(code, 100.0 * i as f64))
                    .collect(),
            })
        })
    }

    fn route_by_code<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Option<RouteFeature>> {
        self.route_lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code.to_string());
        let delay = self.route_delays.get(code.as_str()).copied().unwrap_or_default();

        Box::pin(async move {
            tokio::time::sleep(delay).await;
            if code.as_str() == "MISSING" {
                return Ok(None);
            }
            Ok(Some(route_feature(code.as_str())))
        })
    }

    fn nearby_stops(&self, _center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyStopsResult> {
        let round = self.round(&self.stops_calls, radius_km);
        Box::pin(async move {
            tokio::time::sleep(round.delay).await;
            if let Some(kind) = round.stops_error {
                return Err(scripted_error(kind));
            }
            Ok(NearbyStopsResult {
                radius_km,
                stops: round.stops.iter().map(|id| stop(id, "A")).collect(),
            })
        })
    }

    fn stops_for_route<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Vec<NearbyStop>> {
        Box::pin(async move {
            Ok(vec![
                stop(&format!("{code}-1"), code.as_str()),
                stop(&format!("{code}-2"), code.as_str()),
            ])
        })
    }
}
