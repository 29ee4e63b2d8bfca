//! GeoJSON sources handed to the map surface.

use atlas_transit::{NearbyStop, RouteInfo, spatial::circle_polygon};
use geo::{Geometry, MultiLineString};
use geojson::{Feature, FeatureCollection, JsonObject};

use crate::stores::{RouteHighlight, RoutesStore, StopsStore};

/// Vertex count of the search radius outline
pub const RADIUS_CIRCLE_VERTICES: usize = 64;

/// Identifies a map layer; hit features report the source they were drawn from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SourceId {
    SelectedRoute,
    NearbyRoutes,
    Stops,
    SearchRadius,
}

impl SourceId {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Layers whose features carry a `code` property and can be clicked
    pub fn is_route_layer(self) -> bool {
        matches!(self, SourceId::SelectedRoute | SourceId::NearbyRoutes)
    }
}

/// A snapshot of everything the map draws
#[derive(Clone, Debug, PartialEq)]
pub struct MapSources {
    pub selected_route: FeatureCollection,
    /// Hovered route last, so it is drawn on top
    pub nearby_routes: FeatureCollection,
    /// The selected route's stops, or the nearby stops when no route is selected
    pub stops: FeatureCollection,
    pub search_radius: FeatureCollection,
}

impl MapSources {
    pub fn build(routes: &RoutesStore, stops: &StopsStore) -> Self {
        let selected_route = routes
            .selected()
            .map(|route| route_feature(&route.info, &route.geometry, None, false))
            .into_iter()
            .collect();

        let hovered = match routes.highlight() {
            Some(RouteHighlight::Single(code)) => Some(code),
            _ => None,
        };
        let nearby_routes = routes
            .nearby_in_draw_order()
            .into_iter()
            .filter_map(|route| {
                let geometry = route.geometry.as_ref()?;
                Some(route_feature(
                    &route.info,
                    geometry,
                    Some(route.distance_meters),
                    Some(route.code()) == hovered,
                ))
            })
            .collect();

        let shown_stops = if routes.selected().is_some() {
            stops.route_stops()
        } else {
            stops.nearby()
        };

        let search_radius = routes
            .search_location()
            .map(|center| {
                let circle = circle_polygon(center.into(), routes.radius_km() * 1_000.0, RADIUS_CIRCLE_VERTICES);
                let mut properties = JsonObject::new();
                properties.insert("radius_km".to_owned(), routes.radius_km().into());
                feature(Geometry::Polygon(circle), properties)
            })
            .into_iter()
            .collect();

        Self {
            selected_route: collection(selected_route),
            nearby_routes: collection(nearby_routes),
            stops: collection(shown_stops.iter().map(stop_feature).collect()),
            search_radius: collection(search_radius),
        }
    }

    pub fn get(&self, source: SourceId) -> &FeatureCollection {
        match source {
            SourceId::SelectedRoute => &self.selected_route,
            SourceId::NearbyRoutes => &self.nearby_routes,
            SourceId::Stops => &self.stops,
            SourceId::SearchRadius => &self.search_radius,
        }
    }
}

fn route_feature(
    info: &RouteInfo,
    geometry: &MultiLineString,
    distance_meters: Option<f64>,
    highlighted: bool,
) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("code".to_owned(), info.code.as_str().into());
    properties.insert("name".to_owned(), info.name.as_ref().into());
    properties.insert("type".to_owned(), info.kind.as_ref().into());
    properties.insert("subtype".to_owned(), info.subtype.as_ref().into());
    properties.insert("direction".to_owned(), info.direction.code().into());
    properties.insert("highlighted".to_owned(), highlighted.into());
    if let Some(distance) = distance_meters {
        properties.insert("distance_meters".to_owned(), distance.into());
    }

    feature(Geometry::MultiLineString(geometry.clone()), properties)
}

fn stop_feature(stop: &NearbyStop) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_owned(), stop.id.as_str().into());
    properties.insert("route_code".to_owned(), stop.route_code.as_str().into());
    properties.insert("direction".to_owned(), stop.direction.code().into());
    properties.insert("name".to_owned(), stop.name.as_ref().into());

    feature(Geometry::Point(stop.location), properties)
}

fn feature(geometry: Geometry<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
