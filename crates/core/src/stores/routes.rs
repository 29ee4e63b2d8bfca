use std::collections::BTreeSet;

use atlas_transit::{ErrorKind, NearbyRoute, RouteCode, RouteFeature};

use crate::{config::RadiusBounds, map::LatLng};

/// Transient hover state used for draw emphasis and tooltips only
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteHighlight {
    /// Exactly one route under the pointer
    Single(RouteCode),
    /// Several coinciding routes under the pointer, in hit order
    Candidates(Vec<RouteCode>),
}

/// Selected route, nearby routes and the search that produced them
#[derive(Debug)]
pub struct RoutesStore {
    bounds: RadiusBounds,

    selected: Option<RouteFeature>,
    selection_loading: bool,

    search_location: Option<LatLng>,
    radius_km: f64,
    nearby: Vec<NearbyRoute>,
    loading: bool,
    error: Option<ErrorKind>,

    overlapping: Option<BTreeSet<RouteCode>>,
    highlight: Option<RouteHighlight>,
}

impl RoutesStore {
    pub fn new(bounds: RadiusBounds) -> Self {
        Self {
            bounds,
            selected: None,
            selection_loading: false,
            search_location: None,
            radius_km: bounds.default_radius(),
            nearby: Vec::new(),
            loading: false,
            error: None,
            overlapping: None,
            highlight: None,
        }
    }

    // ---- Selection ----

    pub fn selected(&self) -> Option<&RouteFeature> {
        self.selected.as_ref()
    }

    pub fn is_selection_loading(&self) -> bool {
        self.selection_loading
    }

    pub fn begin_selection(&mut self) {
        self.selection_loading = true;
    }

    /// Commits a route; any pending disambiguation is resolved by it
    pub fn select(&mut self, route: RouteFeature) {
        self.selected = Some(route);
        self.selection_loading = false;
        self.overlapping = None;
    }

    /// Ends a selection attempt that produced no route
    pub fn abandon_selection(&mut self) {
        self.selection_loading = false;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.selection_loading = false;
    }

    // ---- Nearby search ----

    pub fn search_location(&self) -> Option<LatLng> {
        self.search_location
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn nearby(&self) -> &[NearbyRoute] {
        &self.nearby
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// True while a search is anchored or results are on display
    pub fn has_nearby_content(&self) -> bool {
        self.search_location.is_some() || !self.nearby.is_empty()
    }

    /// Clamps and stores the radius, returning the stored value
    pub fn set_radius(&mut self, radius_km: f64) -> f64 {
        self.radius_km = self.bounds.clamp(radius_km);
        self.radius_km
    }

    pub fn begin_search(&mut self, location: LatLng) {
        self.search_location = Some(location);
        self.loading = true;
        self.error = None;
    }

    /// Marks a query as in flight for the current location
    pub fn begin_requery(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn apply_nearby(&mut self, routes: Vec<NearbyRoute>, error: Option<ErrorKind>) {
        self.nearby = routes;
        self.error = error;
        self.loading = false;
    }

    pub fn clear_nearby(&mut self) {
        self.search_location = None;
        self.radius_km = self.bounds.default_radius();
        self.nearby.clear();
        self.loading = false;
        self.error = None;
        self.highlight = None;
    }

    /// Nearby routes with the highlighted one moved last so it draws on top
    pub fn nearby_in_draw_order(&self) -> Vec<&NearbyRoute> {
        let hovered = match &self.highlight {
            Some(RouteHighlight::Single(code)) => Some(code),
            _ => None,
        };

        let (mut rest, top): (Vec<&NearbyRoute>, Vec<&NearbyRoute>) = self
            .nearby
            .iter()
            .partition(|route| Some(route.code()) != hovered);
        rest.extend(top);
        rest
    }

    // ---- Overlap and hover ----

    pub fn overlapping(&self) -> Option<&BTreeSet<RouteCode>> {
        self.overlapping.as_ref()
    }

    pub fn set_overlapping(&mut self, codes: BTreeSet<RouteCode>) {
        self.overlapping = if codes.is_empty() { None } else { Some(codes) };
    }

    pub fn clear_overlapping(&mut self) {
        self.overlapping = None;
    }

    pub fn highlight(&self) -> Option<&RouteHighlight> {
        self.highlight.as_ref()
    }

    pub fn set_highlight(&mut self, highlight: Option<RouteHighlight>) {
        self.highlight = highlight;
    }

    /// Human readable label for the hover tooltip
    pub fn tooltip(&self) -> Option<String> {
        let codes = match self.highlight.as_ref()? {
            RouteHighlight::Single(code) => std::slice::from_ref(code),
            RouteHighlight::Candidates(codes) => codes.as_slice(),
        };

        let labels: Vec<String> = codes.iter().map(|code| self.label_for(code)).collect();
        Some(labels.join(" / "))
    }

    fn label_for(&self, code: &RouteCode) -> String {
        let name = self
            .nearby
            .iter()
            .find(|route| route.code() == code)
            .map(|route| route.info.name.clone())
            .or_else(|| {
                self.selected
                    .as_ref()
                    .filter(|route| route.code() == code)
                    .map(|route| route.info.name.clone())
            });

        match name {
            Some(name) => format!("{code} {name}"),
            None => code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_transit::{DirectionId, RouteInfo};

    fn nearby(code: &str, distance_meters: f64) -> NearbyRoute {
        NearbyRoute {
            info: RouteInfo {
                code: RouteCode::new(code),
                name: format!("Ruta {code}").into(),
                kind: "Bus".into(),
                subtype: "Urbano".into(),
                direction: DirectionId::Outbound,
                department: "San Salvador".into(),
                length_km: 10.0,
            },
            distance_meters,
            geometry: None,
        }
    }

    #[test]
    fn test_radius_is_clamped() {
        let mut store = RoutesStore::new(RadiusBounds::default());

        assert_eq!(store.radius_km(), 0.5);
        assert_eq!(store.set_radius(7.5), 5.0);
        assert_eq!(store.set_radius(0.0), 0.5);
    }

    #[test]
    fn test_location_alone_counts_as_nearby_content() {
        let mut store = RoutesStore::new(RadiusBounds::default());
        assert!(!store.has_nearby_content());

        store.begin_search(LatLng::new(13.7, -89.2));
        assert!(store.has_nearby_content());
        assert!(store.is_loading());

        store.apply_nearby(vec![], Some(ErrorKind::Network));
        assert!(store.has_nearby_content());
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some(ErrorKind::Network));

        store.clear_nearby();
        assert!(!store.has_nearby_content());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_hovered_route_draws_last() {
        let mut store = RoutesStore::new(RadiusBounds::default());
        store.apply_nearby(vec![nearby("A", 10.0), nearby("B", 20.0), nearby("C", 30.0)], None);
        store.set_highlight(Some(RouteHighlight::Single(RouteCode::new("A"))));

        let order: Vec<&str> = store
            .nearby_in_draw_order()
            .iter()
            .map(|r| r.code().as_str())
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);

        // The stored order itself is untouched
        assert_eq!(store.nearby()[0].code().as_str(), "A");
    }

    #[test]
    fn test_tooltip_names_every_candidate() {
        let mut store = RoutesStore::new(RadiusBounds::default());
        store.apply_nearby(vec![nearby("A", 10.0)], None);
        store.set_highlight(Some(RouteHighlight::Candidates(vec![
            RouteCode::new("A"),
            RouteCode::new("Z"),
        ])));

        assert_eq!(store.tooltip().as_deref(), Some("A Ruta A / Z"));
    }

    #[test]
    fn test_empty_overlap_set_is_none() {
        let mut store = RoutesStore::new(RadiusBounds::default());
        store.set_overlapping(BTreeSet::new());
        assert!(store.overlapping().is_none());
    }
}
