//! Orchestration across the domain stores.
//!
//! Stores never reach into each other. Whenever an action in one domain has
//! consequences in another (selecting a route drops the nearby stops, a new
//! search drops the selected route, closing everything clears all of them),
//! the sequencing lives here.

use std::sync::{Arc, Mutex, PoisonError};

use atlas_transit::{ErrorKind, PlaceGeometry, RouteCode, TransitService};
use futures_util::{Stream, StreamExt};
use geo::Geometry;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    config::ExplorerConfig,
    map::{LatLng, MapCommand, MapEvent, MapSources, Viewport, ViewportFitter},
    overlap::{self, Interaction, OverlapOutcome},
    panel::{
        CloseAction, ContentInputs, DisclosureArbitrator, PanelState, ScrollDirection, ScrollOutcome,
        SheetHeight,
    },
    proximity::{Generation, ProximityCoordinator, QueryOutcome},
    service::{HttpTransitService, Notice, guarded},
    stores::{
        AnnotationPayload, AnnotationStore, PlaceStore, RouteHighlight, RoutesStore, SelectedPlace,
        Shared, StopsStore, shared,
    },
};

const NOTICE_CAPACITY: usize = 16;

pub struct Explorer {
    config: ExplorerConfig,
    service: Arc<dyn TransitService>,

    routes: Shared<RoutesStore>,
    stops: Shared<StopsStore>,
    places: Shared<PlaceStore>,
    annotations: Shared<AnnotationStore>,
    panel: Shared<DisclosureArbitrator>,
    fitter: Shared<ViewportFitter>,

    proximity: ProximityCoordinator,
    route_generation: Generation,
    notices: broadcast::Sender<Notice>,

    user_location: Shared<Option<LatLng>>,
    location_watch: Mutex<Option<JoinHandle<()>>>,
}

impl Explorer {
    /// An explorer backed by the HTTP services at `config.api_base_url`
    pub fn new(config: ExplorerConfig) -> crate::Result<Self> {
        let service = Arc::new(HttpTransitService::new(&config)?);
        Ok(Self::with_service(config, service))
    }

    pub fn with_service(config: ExplorerConfig, service: Arc<dyn TransitService>) -> Self {
        let routes = shared(RoutesStore::new(config.radius));
        let stops = shared(StopsStore::new(config.radius));
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let proximity = ProximityCoordinator::with_notices(
            service.clone(),
            routes.clone(),
            stops.clone(),
            config.request_timeout(),
            config.radius_debounce(),
            notices.clone(),
        );

        Self {
            service,
            routes,
            stops,
            places: shared(PlaceStore::new()),
            annotations: shared(AnnotationStore::new()),
            panel: shared(DisclosureArbitrator::new(config.drag_threshold_px)),
            fitter: shared(ViewportFitter::new(&config.viewport)),
            proximity,
            route_generation: Generation::new(),
            notices,
            user_location: shared(None),
            location_watch: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn routes(&self) -> &Shared<RoutesStore> {
        &self.routes
    }

    pub fn stops(&self) -> &Shared<StopsStore> {
        &self.stops
    }

    pub fn places(&self) -> &Shared<PlaceStore> {
        &self.places
    }

    pub fn annotations(&self) -> &Shared<AnnotationStore> {
        &self.annotations
    }

    pub fn proximity(&self) -> &ProximityCoordinator {
        &self.proximity
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, kind: ErrorKind, what: &str) {
        // Nobody listening is fine
        let _ = self.notices.send(Notice::for_failure(kind, what));
    }

    // ---- Panel ----

    async fn content_inputs(&self) -> ContentInputs {
        let routes = self.routes.read().await;
        ContentInputs {
            has_selected_route: routes.selected().is_some(),
            has_nearby: routes.has_nearby_content(),
            has_selected_place: self.places.read().await.selected().is_some(),
            has_annotations: !self.annotations.read().await.is_empty(),
        }
    }

    /// Re-derives the panel content from the stores
    pub async fn refresh_panel(&self) -> PanelState {
        let inputs = self.content_inputs().await;
        let mut panel = self.panel.write().await;
        panel.recompute(&inputs);
        panel.state()
    }

    pub async fn panel_state(&self) -> PanelState {
        self.panel.read().await.state()
    }

    pub async fn set_panel_height(&self, height: SheetHeight) {
        self.panel.write().await.set_height(height);
    }

    /// Dragging the panel also dismisses a pending route disambiguation
    pub async fn begin_drag(&self, y: f64) {
        self.routes.write().await.clear_overlapping();
        self.panel.write().await.begin_drag(y);
    }

    pub async fn drag_to(&self, y: f64) -> f64 {
        self.panel.read().await.drag_to(y)
    }

    pub async fn end_drag(&self, y: f64) -> SheetHeight {
        self.panel.write().await.end_drag(y)
    }

    pub async fn scroll(&self, direction: ScrollDirection, content_at_top: bool) -> ScrollOutcome {
        self.panel.write().await.scroll(direction, content_at_top)
    }

    pub async fn close_content(&self) -> Option<CloseAction> {
        let action = self.panel.write().await.close_content();
        if action == Some(CloseAction::ClearPlace) {
            self.places.write().await.clear();
            self.refresh_panel().await;
        }
        action
    }

    /// Clears every domain and collapses the panel
    pub async fn close_all(&self) -> PanelState {
        self.route_generation.advance();
        self.proximity.clear().await;

        {
            let mut routes = self.routes.write().await;
            routes.clear_selection();
            routes.clear_overlapping();
            routes.set_highlight(None);
        }
        self.stops.write().await.clear_route_stops();
        self.places.write().await.clear();
        self.annotations.write().await.clear();

        self.panel.write().await.reset();
        self.refresh_panel().await
    }

    // ---- Nearby search ----

    pub async fn search_nearby(&self, location: LatLng, radius_km: Option<f64>) -> QueryOutcome {
        if !location.is_finite() {
            self.notify(ErrorKind::Validation, "nearby search");
            return QueryOutcome::NoLocation;
        }

        // A pending route pick must not land on top of the new search
        self.route_generation.advance();
        self.stops.write().await.clear_route_stops();
        self.routes.write().await.clear_overlapping();

        let generation = self.proximity.begin_search(location, radius_km).await;
        // The panel follows the anchored search while both queries load
        self.refresh_panel().await;

        let outcome = self.proximity.run(generation).await;
        self.refresh_panel().await;
        outcome
    }

    pub async fn set_radius(&self, radius_km: f64) -> f64 {
        self.proximity.set_radius(radius_km).await
    }

    /// The panel's "clear" action for nearby results
    pub async fn clear_nearby(&self) -> PanelState {
        self.proximity.clear().await;
        self.routes.write().await.clear_overlapping();
        self.refresh_panel().await
    }

    // ---- Route selection ----

    /// Loads and commits a route, then its stops. Returns whether the route
    /// is now selected. A newer selection or search supersedes this one.
    pub async fn select_route(&self, code: RouteCode) -> bool {
        let generation = self.route_generation.advance();
        self.routes.write().await.begin_selection();

        let timeout = self.config.request_timeout();
        let fetched = guarded("route lookup", timeout, self.service.route_by_code(&code), None).await;

        if !self.route_generation.is_current(generation) {
            tracing::debug!(%code, "Discarding superseded route selection");
            return false;
        }

        let Some(route) = fetched.value else {
            self.routes.write().await.abandon_selection();
            self.notify(fetched.error.unwrap_or(ErrorKind::Unknown), "the route");
            self.refresh_panel().await;
            return false;
        };

        tracing::info!(%code, "Selected route");
        self.routes.write().await.select(route);
        {
            let mut stops = self.stops.write().await;
            stops.clear_nearby_results();
            stops.begin_route_stops(code.clone());
        }
        self.refresh_panel().await;

        let stops = guarded("route stops", timeout, self.service.stops_for_route(&code), Vec::new()).await;
        if let Some(kind) = stops.error {
            self.notify(kind, "the route's stops");
        }
        self.stops.write().await.apply_route_stops(&code, stops.value);
        true
    }

    /// Resolves a pending disambiguation with one of its candidates
    ///
    /// The candidates stay pending until the route is committed, so a failed
    /// lookup leaves the choice open.
    pub async fn choose_overlapping(&self, code: RouteCode) -> bool {
        let is_candidate = self
            .routes
            .read()
            .await
            .overlapping()
            .is_some_and(|codes| codes.contains(&code));
        if !is_candidate {
            return false;
        }
        self.select_route(code).await
    }

    pub async fn clear_route(&self) -> PanelState {
        self.route_generation.advance();
        self.routes.write().await.clear_selection();
        self.stops.write().await.clear_route_stops();
        self.refresh_panel().await
    }

    async fn fit_selected_route(&self) -> Option<Viewport> {
        let geometry = self
            .routes
            .read()
            .await
            .selected()
            .map(|route| Geometry::MultiLineString(route.geometry.clone()))?;
        Some(self.fitter.read().await.fit_or_default(&geometry))
    }

    // ---- Places ----

    pub async fn load_places(&self) -> bool {
        let fetched = guarded(
            "place catalog",
            self.config.request_timeout(),
            self.service.search_places(),
            Default::default(),
        )
        .await;

        if let Some(kind) = fetched.error {
            self.notify(kind, "places");
            return false;
        }
        self.places.write().await.set_catalog(fetched.value);
        true
    }

    /// Selects a place and frames its outline once loaded
    pub async fn select_place(&self, place: SelectedPlace) -> Vec<MapCommand> {
        self.places.write().await.select(place.clone());
        self.refresh_panel().await;
        self.load_place_geometry(place).await
    }

    /// Goes up to the parent department, framing it
    pub async fn place_back(&self) -> Vec<MapCommand> {
        let parent = self.places.write().await.back();
        self.refresh_panel().await;
        match parent {
            Some(parent) => self.load_place_geometry(parent).await,
            None => Vec::new(),
        }
    }

    pub async fn clear_place(&self) -> PanelState {
        self.places.write().await.clear();
        self.refresh_panel().await
    }

    async fn load_place_geometry(&self, place: SelectedPlace) -> Vec<MapCommand> {
        let fetched = guarded(
            "place geometry",
            self.config.request_timeout(),
            self.service.query_place_geometry(&place.name, place.level),
            None,
        )
        .await;

        let geometry: Option<PlaceGeometry> = fetched.value;
        if let Some(kind) = fetched.error {
            self.notify(kind, "the place outline");
        }

        let viewport = match &geometry {
            Some(geometry) => Some(self.fitter.read().await.fit_or_default(geometry)),
            None => None,
        };

        if !self.places.write().await.apply_geometry(&place, geometry, fetched.error) {
            return Vec::new();
        }
        viewport.map(MapCommand::FitBounds).into_iter().collect()
    }

    // ---- Annotations ----

    pub async fn add_annotation(&self, name: &str, payload: AnnotationPayload) -> u64 {
        let id = self.annotations.write().await.add(name, payload);
        self.refresh_panel().await;
        id
    }

    pub async fn remove_annotation(&self, id: u64) -> bool {
        let removed = self.annotations.write().await.remove(id);
        self.refresh_panel().await;
        removed
    }

    pub async fn clear_annotations(&self) {
        self.annotations.write().await.clear();
        self.refresh_panel().await;
    }

    pub async fn export_annotations(&self) -> geojson::FeatureCollection {
        self.annotations.read().await.to_geojson()
    }

    // ---- Map surface ----

    pub async fn handle_map_event(&self, event: MapEvent) -> Vec<MapCommand> {
        match event {
            MapEvent::PointClick { hits, .. } => match overlap::resolve(Interaction::Click, &hits) {
                OverlapOutcome::Select(code) => {
                    if self.select_route(code).await {
                        return self.fit_selected_route().await.map(MapCommand::FitBounds).into_iter().collect();
                    }
                }
                OverlapOutcome::Disambiguate(codes) => {
                    tracing::debug!(candidates = codes.len(), "Routes overlap under click");
                    self.routes.write().await.set_overlapping(codes);
                }
                // A click on empty map leaves a pending disambiguation alone
                OverlapOutcome::NoOp | OverlapOutcome::Highlight(_) | OverlapOutcome::Tooltip(_) => {}
            },
            MapEvent::PointHover { hits, .. } => {
                let highlight = match overlap::resolve(Interaction::Hover, &hits) {
                    OverlapOutcome::Highlight(code) => Some(RouteHighlight::Single(code)),
                    OverlapOutcome::Tooltip(codes) => Some(RouteHighlight::Candidates(codes)),
                    _ => None,
                };
                self.routes.write().await.set_highlight(highlight);
            }
            MapEvent::ViewportChange(_) => {
                self.routes.write().await.clear_overlapping();
            }
            MapEvent::RightClick { at } => {
                if at.is_finite() {
                    let name = format!("Pin {:.5}, {:.5}", at.lat, at.lng);
                    self.add_annotation(&name, AnnotationPayload::Pin(at)).await;
                }
            }
        }
        Vec::new()
    }

    pub async fn sources(&self) -> MapSources {
        let routes = self.routes.read().await;
        let stops = self.stops.read().await;
        MapSources::build(&routes, &stops)
    }

    pub async fn default_viewport(&self) -> Viewport {
        self.fitter.read().await.default_viewport()
    }

    pub async fn set_viewport_frame(&self, width_px: f64, height_px: f64) {
        self.fitter.write().await.set_frame(width_px, height_px);
    }

    pub async fn fit(&self, geometry: &Geometry<f64>) -> Viewport {
        self.fitter.read().await.fit_or_default(geometry)
    }

    // ---- Device location ----

    /// Follows a stream of device fixes until [`stop_location_watch`](Self::stop_location_watch)
    /// or drop. Replaces any earlier watch.
    pub fn watch_location<S>(&self, fixes: S)
    where
        S: Stream<Item = LatLng> + Send + 'static,
    {
        let user_location = self.user_location.clone();
        let task = tokio::spawn(async move {
            let mut fixes = std::pin::pin!(fixes);
            while let Some(fix) = fixes.next().await {
                if fix.is_finite() {
                    *user_location.write().await = Some(fix);
                }
            }
        });

        let previous = self
            .location_watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Returns whether a watch was running
    pub fn stop_location_watch(&self) -> bool {
        let task = self
            .location_watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match task {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub async fn user_location(&self) -> Option<LatLng> {
        *self.user_location.read().await
    }

    /// Nearby search around the last device fix
    pub async fn search_near_user(&self) -> QueryOutcome {
        match self.user_location().await {
            Some(location) => self.search_nearby(location, None).await,
            None => {
                let _ = self
                    .notices
                    .send(Notice::new(ErrorKind::Unknown, "Your location is not available yet"));
                QueryOutcome::NoLocation
            }
        }
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        let task = self
            .location_watch
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::{HitFeature, SourceId},
        panel::{ContentType, PanelTab},
        stores::AnnotationKind,
        testing::ScriptedService,
    };
    use approx::assert_relative_eq;
    use atlas_transit::{PlaceLevel, StaticTransitProvider};
    use geo::polygon;
    use std::time::Duration;

    fn explorer(service: ScriptedService) -> (Explorer, Arc<ScriptedService>) {
        let service = Arc::new(service);
        (Explorer::with_service(ExplorerConfig::default(), service.clone()), service)
    }

    fn click(codes: &[&str]) -> MapEvent {
        MapEvent::PointClick {
            at: LatLng::new(13.7, -89.2),
            hits: codes
                .iter()
                .map(|code| HitFeature::route(SourceId::NearbyRoutes, *code))
                .collect(),
        }
    }

    const CENTER: LatLng = LatLng::new(13.70, -89.20);

    #[tokio::test(start_paused = true)]
    async fn test_search_opens_nearby_content() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &["S1"]));

        explorer.search_nearby(CENTER, None).await;

        let state = explorer.panel_state().await;
        assert_eq!(state.content_type, ContentType::NearbyRoutes);
        assert_eq!(state.sheet_height, SheetHeight::Half);

        let sources = explorer.sources().await;
        assert_eq!(sources.nearby_routes.features.len(), 2);
        assert_eq!(sources.stops.features.len(), 1);
        assert_eq!(sources.search_radius.features.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_follows_search_while_loading() {
        let (explorer, _) =
            explorer(ScriptedService::with_results(&["A"], &["S1"]).delayed(Duration::from_secs(3)));
        let explorer = Arc::new(explorer);

        let pending = tokio::spawn({
            let explorer = explorer.clone();
            async move { explorer.search_nearby(CENTER, None).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(explorer.proximity().is_loading().await);
        let state = explorer.panel_state().await;
        assert_eq!(state.content_type, ContentType::NearbyRoutes);
        assert!(state.is_open());

        assert_eq!(pending.await.unwrap(), QueryOutcome::Applied { routes: 1, stops: 1 });
        assert_eq!(explorer.panel_state().await.content_type, ContentType::NearbyRoutes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_over_selected_route_swaps_panel_before_results() {
        let (explorer, _) =
            explorer(ScriptedService::with_results(&["A"], &[]).delayed(Duration::from_secs(3)));
        let explorer = Arc::new(explorer);
        assert!(explorer.select_route(RouteCode::new("A")).await);
        assert_eq!(explorer.panel_state().await.content_type, ContentType::Route);

        let pending = tokio::spawn({
            let explorer = explorer.clone();
            async move { explorer.search_nearby(CENTER, None).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(explorer.routes().read().await.selected().is_none());
        assert_eq!(explorer.panel_state().await.content_type, ContentType::NearbyRoutes);
        pending.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_hit_commits_route_and_loads_its_stops() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &["S1"]));
        explorer.search_nearby(CENTER, None).await;

        let commands = explorer.handle_map_event(click(&["A"])).await;
        assert!(matches!(commands.as_slice(), [MapCommand::FitBounds(_)]));

        let routes = explorer.routes().read().await;
        assert_eq!(routes.selected().map(|r| r.code().as_str()), Some("A"));
        assert!(routes.overlapping().is_none());
        drop(routes);

        let stops = explorer.stops().read().await;
        assert!(stops.nearby().is_empty());
        assert_eq!(stops.route_stops().len(), 2);
        assert!(!stops.is_route_stops_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_click_requires_choice() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &[]));
        explorer.search_nearby(CENTER, None).await;

        explorer.handle_map_event(click(&["A", "B"])).await;
        {
            let routes = explorer.routes().read().await;
            assert!(routes.selected().is_none());
            assert_eq!(routes.overlapping().map(|set| set.len()), Some(2));
        }

        // An empty click keeps the choice pending
        explorer.handle_map_event(click(&[])).await;
        assert!(explorer.routes().read().await.overlapping().is_some());

        assert!(!explorer.choose_overlapping(RouteCode::new("Z")).await);
        assert!(explorer.choose_overlapping(RouteCode::new("B")).await);

        let routes = explorer.routes().read().await;
        assert!(routes.overlapping().is_none());
        assert_eq!(routes.selected().map(|r| r.code().as_str()), Some("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_choice_keeps_candidates() {
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]));

        explorer.handle_map_event(click(&["A", "MISSING"])).await;
        assert!(!explorer.choose_overlapping(RouteCode::new("MISSING")).await);

        {
            let routes = explorer.routes().read().await;
            assert!(routes.selected().is_none());
            assert_eq!(routes.overlapping().map(|set| set.len()), Some(2));
        }

        assert!(explorer.choose_overlapping(RouteCode::new("A")).await);
        assert!(explorer.routes().read().await.overlapping().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pan_and_drag_dismiss_disambiguation() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &[]));

        explorer.handle_map_event(click(&["A", "B"])).await;
        explorer
            .handle_map_event(MapEvent::ViewportChange(explorer.default_viewport().await))
            .await;
        assert!(explorer.routes().read().await.overlapping().is_none());

        explorer.handle_map_event(click(&["A", "B"])).await;
        explorer.begin_drag(300.0).await;
        assert!(explorer.routes().read().await.overlapping().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_never_commits() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &[]));
        explorer.search_nearby(CENTER, None).await;

        let hover = MapEvent::PointHover {
            at: CENTER,
            hits: vec![
                HitFeature::route(SourceId::NearbyRoutes, "A"),
                HitFeature::route(SourceId::NearbyRoutes, "B"),
            ],
        };
        explorer.handle_map_event(hover).await;

        let routes = explorer.routes().read().await;
        assert!(routes.selected().is_none());
        assert!(routes.overlapping().is_none());
        assert_eq!(routes.tooltip().as_deref(), Some("A Ruta A / B Ruta B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_swap_keeps_panel_height() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A", "B"], &[]));
        explorer.search_nearby(CENTER, None).await;
        explorer.set_panel_height(SheetHeight::Full).await;

        explorer.select_route(RouteCode::new("A")).await;
        let state = explorer.panel_state().await;
        assert_eq!(state.content_type, ContentType::Route);
        assert_eq!(state.sheet_height, SheetHeight::Full);
        assert!(state.manual_override);

        explorer.clear_route().await;
        let state = explorer.panel_state().await;
        assert_eq!(state.content_type, ContentType::NearbyRoutes);
        assert_eq!(state.sheet_height, SheetHeight::Full);
        assert!(state.manual_override);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_route_selection_wins() {
        let (explorer, service) =
            explorer(ScriptedService::with_results(&[], &[]).slow_route("SLOW", Duration::from_secs(2)));
        let explorer = Arc::new(explorer);

        let slow = tokio::spawn({
            let explorer = explorer.clone();
            async move { explorer.select_route(RouteCode::new("SLOW")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(explorer.select_route(RouteCode::new("FAST")).await);
        assert!(!slow.await.unwrap());

        assert_eq!(service.route_lookups(), vec!["SLOW", "FAST"]);
        let routes = explorer.routes().read().await;
        assert_eq!(routes.selected().map(|r| r.code().as_str()), Some("FAST"));
        assert!(!routes.is_selection_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_route_notifies() {
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]));
        let mut notices = explorer.subscribe_notices();

        assert!(!explorer.select_route(RouteCode::new("MISSING")).await);

        assert!(!explorer.routes().read().await.is_selection_loading());
        assert_eq!(notices.recv().await.unwrap().kind, ErrorKind::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stops_search_sends_notice() {
        let (explorer, _) =
            explorer(ScriptedService::with_results(&["A"], &[]).failing_stops(ErrorKind::Validation));
        let mut notices = explorer.subscribe_notices();

        explorer.search_nearby(CENTER, None).await;

        assert_eq!(notices.recv().await.unwrap().kind, ErrorKind::Validation);
        assert_eq!(explorer.routes().read().await.nearby().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_search_drops_selected_route() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A"], &["S1"]));
        explorer.select_route(RouteCode::new("A")).await;

        explorer.search_nearby(CENTER, None).await;

        assert!(explorer.routes().read().await.selected().is_none());
        assert!(explorer.stops().read().await.route().is_none());
        assert_eq!(explorer.panel_state().await.content_type, ContentType::NearbyRoutes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_all_empties_every_domain() {
        let (explorer, _) = explorer(ScriptedService::with_results(&["A"], &["S1"]));
        explorer.search_nearby(CENTER, Some(3.0)).await;
        explorer.select_route(RouteCode::new("A")).await;
        explorer
            .select_place(SelectedPlace::new("San Salvador", PlaceLevel::Department))
            .await;
        explorer
            .handle_map_event(MapEvent::RightClick { at: CENTER })
            .await;
        explorer.set_panel_height(SheetHeight::Full).await;

        let state = explorer.close_all().await;

        assert_eq!(state.sheet_height, SheetHeight::Peek);
        assert!(!state.manual_override);
        assert_eq!(state.content_type, ContentType::None);

        let routes = explorer.routes().read().await;
        assert!(routes.selected().is_none());
        assert!(routes.search_location().is_none());
        assert!(routes.nearby().is_empty());
        assert_eq!(routes.radius_km(), 0.5);
        assert!(explorer.stops().read().await.route_stops().is_empty());
        assert!(explorer.places().read().await.selected().is_none());
        assert!(explorer.annotations().read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_content_per_owner() {
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]));

        explorer
            .select_place(SelectedPlace::new("San Salvador", PlaceLevel::Department))
            .await;
        assert_eq!(explorer.close_content().await, Some(CloseAction::ClearPlace));
        assert!(explorer.places().read().await.selected().is_none());

        explorer
            .add_annotation("Zona", AnnotationPayload::DrawnPolygon(polygon![
                (x: -89.3, y: 13.6),
                (x: -89.1, y: 13.6),
                (x: -89.1, y: 13.8),
            ]))
            .await;
        assert_eq!(explorer.panel_state().await.active_tab, PanelTab::Journal);
        assert_eq!(explorer.close_content().await, Some(CloseAction::SwitchTab));
        assert_eq!(explorer.panel_state().await.active_tab, PanelTab::Explore);
        assert_eq!(explorer.annotations().read().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_place_selection_fits_outline() {
        let outline = Geometry::Polygon(polygon![
            (x: -89.3, y: 13.6),
            (x: -89.1, y: 13.6),
            (x: -89.1, y: 13.8),
            (x: -89.3, y: 13.8),
        ]);
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]).with_place_geometry("San Salvador", outline));

        let commands = explorer
            .select_place(SelectedPlace::new("San Salvador", PlaceLevel::Department))
            .await;

        match commands.as_slice() {
            [MapCommand::FitBounds(viewport)] => {
                assert!(viewport.is_finite());
                assert_relative_eq!(viewport.center.lat, 13.7, epsilon = 1e-9);
                assert_relative_eq!(viewport.center.lng, -89.2, epsilon = 1e-9);
            }
            other => panic!("expected a fit command, got {other:?}"),
        }
        assert_eq!(explorer.panel_state().await.content_type, ContentType::GeoInfo);
        assert!(explorer.places().read().await.geometry().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_district_and_back() {
        use atlas_transit::{Department, District, PlaceCatalog};

        let catalog = PlaceCatalog {
            departments: vec![Department {
                code: "05".into(),
                name: "La Libertad".into(),
            }],
            municipalities: vec![],
            districts: vec![District {
                code: "0511".into(),
                name: "Santa Tecla".into(),
                municipality: "La Libertad Sur".into(),
                department: "La Libertad".into(),
            }],
        };
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]).with_places(catalog));

        assert!(explorer.load_places().await);
        explorer
            .select_place(SelectedPlace::new("Santa Tecla", PlaceLevel::District))
            .await;
        assert_eq!(
            explorer.places().read().await.parent().map(|p| p.department.to_string()),
            Some("La Libertad".to_owned())
        );

        explorer.place_back().await;
        assert_eq!(
            explorer.places().read().await.selected(),
            Some(&SelectedPlace::new("La Libertad", PlaceLevel::Department))
        );
        assert_eq!(explorer.panel_state().await.content_type, ContentType::GeoInfo);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_place_has_no_fit() {
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]));

        let commands = explorer
            .select_place(SelectedPlace::new("Atlantis", PlaceLevel::District))
            .await;

        assert!(commands.is_empty());
        assert!(!explorer.places().read().await.is_geometry_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_right_click_keeps_one_pin() {
        let (explorer, _) = explorer(ScriptedService::with_results(&[], &[]));

        explorer.handle_map_event(MapEvent::RightClick { at: CENTER }).await;
        explorer
            .handle_map_event(MapEvent::RightClick { at: LatLng::new(13.8, -89.1) })
            .await;

        let annotations = explorer.annotations().read().await;
        assert_eq!(annotations.len(), 1);
        assert!(annotations.iter().all(|a| a.kind() == AnnotationKind::Pin));
        drop(annotations);

        let exported = explorer.export_annotations().await;
        assert_eq!(exported.features.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_near_user_follows_location_watch() {
        let (explorer, service) = explorer(ScriptedService::with_results(&["A"], &[]));
        let mut notices = explorer.subscribe_notices();

        assert_eq!(explorer.search_near_user().await, QueryOutcome::NoLocation);
        assert!(notices.recv().await.is_ok());

        explorer.watch_location(futures_util::stream::iter(vec![
            LatLng::new(f64::NAN, 0.0),
            CENTER,
        ]));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(explorer.user_location().await, Some(CENTER));

        assert!(matches!(explorer.search_near_user().await, QueryOutcome::Applied { .. }));
        assert_eq!(service.nearby_calls().len(), 2);

        assert!(explorer.stop_location_watch());
        assert!(!explorer.stop_location_watch());
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_provider_end_to_end() {
        use atlas_transit::{DirectionId, NearbyStop, RouteFeature, RouteInfo, StopIdentifier};
        use geo::{LineString, MultiLineString, Point};

        let route = RouteFeature {
            info: RouteInfo {
                code: RouteCode::new("101"),
                name: "Centro".into(),
                kind: "Bus".into(),
                subtype: "Urbano".into(),
                direction: DirectionId::Outbound,
                department: "San Salvador".into(),
                length_km: 4.0,
            },
            geometry: MultiLineString::new(vec![LineString::from(vec![(-89.2, 13.69), (-89.2, 13.71)])]),
        };
        let stop = NearbyStop {
            id: StopIdentifier::new("P1"),
            route_code: RouteCode::new("101"),
            direction: DirectionId::Outbound,
            name: "Parque".into(),
            location: Point::new(-89.2, 13.7),
            department: "San Salvador".into(),
        };
        let provider = StaticTransitProvider::from_data(vec![route], vec![stop]);
        let explorer = Explorer::with_service(ExplorerConfig::default(), Arc::new(provider));

        let outcome = explorer.search_nearby(CENTER, None).await;
        assert_eq!(outcome, QueryOutcome::Applied { routes: 1, stops: 1 });

        assert!(explorer.select_route(RouteCode::new("101")).await);
        assert_eq!(explorer.stops().read().await.route_stops().len(), 1);
    }
}
