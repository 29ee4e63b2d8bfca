use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use atlas_transit::{NearbyRoutesResult, NearbyStopsResult, TransitService};
use geo::Point;
use tokio::sync::broadcast;

use crate::{
    map::LatLng,
    proximity::{Debouncer, Generation},
    service::{Notice, guarded},
    stores::{RoutesStore, Shared, StopsStore},
};

/// What happened to a dispatched nearby query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Results were written to the stores
    Applied { routes: usize, stops: usize },
    /// A newer query or a clear happened while this one was in flight
    Superseded,
    /// No search location is set
    NoLocation,
}

/// Issues the paired routes/stops proximity queries around one search point.
///
/// This is the only writer of the nearby slices of [`RoutesStore`] and
/// [`StopsStore`]. Cloning is cheap and every clone drives the same queries.
#[derive(Clone)]
pub struct ProximityCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn TransitService>,
    routes: Shared<RoutesStore>,
    stops: Shared<StopsStore>,
    generation: Generation,
    debouncer: Debouncer,
    timeout: Duration,
    notices: Option<broadcast::Sender<Notice>>,
}

impl ProximityCoordinator {
    pub fn new(
        service: Arc<dyn TransitService>,
        routes: Shared<RoutesStore>,
        stops: Shared<StopsStore>,
        timeout: Duration,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                routes,
                stops,
                generation: Generation::new(),
                debouncer: Debouncer::new(debounce),
                timeout,
                notices: None,
            }),
        }
    }

    /// Failures are also reported on `notices`
    pub fn with_notices(
        service: Arc<dyn TransitService>,
        routes: Shared<RoutesStore>,
        stops: Shared<StopsStore>,
        timeout: Duration,
        debounce: Duration,
        notices: broadcast::Sender<Notice>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                routes,
                stops,
                generation: Generation::new(),
                debouncer: Debouncer::new(debounce),
                timeout,
                notices: Some(notices),
            }),
        }
    }

    /// Anchors a search at `location` and queries both domains concurrently.
    ///
    /// Any selected route is dropped. Resolves once both queries settled; it
    /// never fails, failures land in the stores' `error` fields.
    pub async fn search(&self, location: LatLng, radius_km: Option<f64>) -> QueryOutcome {
        let generation = self.begin_search(location, radius_km).await;
        self.run(generation).await
    }

    /// First half of [`search`](Self::search): anchors the search and marks
    /// it loading without touching the network. Returns the generation to
    /// hand to [`run`](Self::run).
    pub async fn begin_search(&self, location: LatLng, radius_km: Option<f64>) -> u64 {
        self.inner.debouncer.cancel();

        let mut routes = self.inner.routes.write().await;
        // Advanced under the lock so no older query can publish for the new location
        let generation = self.inner.generation.advance();
        if let Some(radius_km) = radius_km {
            let radius_km = routes.set_radius(radius_km);
            self.inner.stops.write().await.set_radius(radius_km);
        }
        routes.clear_selection();
        routes.begin_search(location);
        self.inner.stops.write().await.begin_query();

        tracing::info!(lat = location.lat, lng = location.lng, generation, "Searching nearby");
        generation
    }

    /// Second half of [`search`](Self::search): queries both domains for a
    /// generation returned by [`begin_search`](Self::begin_search)
    pub async fn run(&self, generation: u64) -> QueryOutcome {
        self.inner.query(generation).await
    }

    /// Updates the radius right away and schedules a debounced re-query
    /// around the current location. Returns the clamped radius.
    pub async fn set_radius(&self, radius_km: f64) -> f64 {
        let (radius_km, has_location) = {
            let mut routes = self.inner.routes.write().await;
            let radius_km = routes.set_radius(radius_km);
            self.inner.stops.write().await.set_radius(radius_km);
            (radius_km, routes.search_location().is_some())
        };

        if has_location {
            let inner = Arc::downgrade(&self.inner);
            self.inner.debouncer.schedule(move || requery(inner));
        }

        radius_km
    }

    /// Drops the search and its results. In-flight responses are discarded.
    pub async fn clear(&self) {
        self.inner.debouncer.cancel();
        self.inner.generation.advance();

        self.inner.routes.write().await.clear_nearby();
        self.inner.stops.write().await.clear_nearby();
    }

    /// True from dispatch until both queries settled
    pub async fn is_loading(&self) -> bool {
        self.inner.routes.read().await.is_loading() || self.inner.stops.read().await.is_loading()
    }

    pub fn is_requery_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.current()
    }
}

async fn requery(inner: Weak<Inner>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let generation = inner.generation.advance();
    inner.query(generation).await;
}

impl Inner {
    async fn query(&self, generation: u64) -> QueryOutcome {
        let (location, radius_km) = {
            let mut routes = self.routes.write().await;
            let Some(location) = routes.search_location() else {
                return QueryOutcome::NoLocation;
            };
            if !self.generation.is_current(generation) {
                return QueryOutcome::Superseded;
            }
            routes.begin_requery();
            self.stops.write().await.begin_query();
            (location, routes.radius_km())
        };

        let center: Point = location.into();
        let (routes, stops) = tokio::join!(
            guarded(
                "nearby routes",
                self.timeout,
                self.service.nearby_routes(center, radius_km),
                NearbyRoutesResult::empty(radius_km),
            ),
            guarded(
                "nearby stops",
                self.timeout,
                self.service.nearby_stops(center, radius_km),
                NearbyStopsResult::empty(radius_km),
            ),
        );

        let mut routes_store = self.routes.write().await;
        if !self.generation.is_current(generation) {
            tracing::debug!(generation, latest = self.generation.current(), "Discarding stale nearby results");
            return QueryOutcome::Superseded;
        }

        let outcome = QueryOutcome::Applied {
            routes: routes.value.routes.len(),
            stops: stops.value.stops.len(),
        };
        routes_store.apply_nearby(routes.value.routes, routes.error);
        self.stops.write().await.apply_nearby(stops.value.stops, stops.error);
        drop(routes_store);

        if let Some(notices) = &self.notices {
            if let Some(kind) = routes.error {
                let _ = notices.send(Notice::for_failure(kind, "nearby routes"));
            }
            if let Some(kind) = stops.error {
                let _ = notices.send(Notice::for_failure(kind, "nearby stops"));
            }
        }

        tracing::debug!(generation, ?outcome, "Applied nearby results");
        outcome
    }
}
