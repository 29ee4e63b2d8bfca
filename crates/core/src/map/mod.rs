//! The seam between the explorer core and the map rendering surface.
//!
//! The surface reports [`MapEvent`]s and consumes a [`Viewport`], a set of
//! GeoJSON sources and [`MapCommand`]s. Nothing in here renders.

pub mod sources;
pub mod viewport;

use atlas_transit::RouteCode;
use serde::{Deserialize, Serialize};

pub use sources::{MapSources, SourceId};
pub use viewport::{FitError, Viewport, ViewportFitter};

/// A WGS84 position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<LatLng> for geo::Point {
    fn from(value: LatLng) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl From<geo::Point> for LatLng {
    fn from(value: geo::Point) -> Self {
        LatLng::new(value.y(), value.x())
    }
}

/// One rendered feature under the pointer
#[derive(Clone, Debug, PartialEq)]
pub struct HitFeature {
    pub source: SourceId,
    pub route_code: Option<RouteCode>,
}

impl HitFeature {
    pub fn route(source: SourceId, code: impl Into<RouteCode>) -> Self {
        Self {
            source,
            route_code: Some(code.into()),
        }
    }
}

/// Events emitted by the map surface
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    PointClick { at: LatLng, hits: Vec<HitFeature> },
    PointHover { at: LatLng, hits: Vec<HitFeature> },
    ViewportChange(Viewport),
    RightClick { at: LatLng },
}

/// Imperative instructions for the map surface
#[derive(Clone, Debug, PartialEq)]
pub enum MapCommand {
    /// Jump to a viewport as-is
    SetViewport(Viewport),
    /// Frame a geometry; the viewport was computed by [`ViewportFitter`]
    FitBounds(Viewport),
}
