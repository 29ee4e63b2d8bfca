//! Viewport fitting: from an arbitrary geometry to a center and zoom level.

use atlas_transit::spatial::haversine_distance;
use geo::{BoundingRect, Geometry};
use serde::{Deserialize, Serialize};

use crate::{config::ViewportSettings, map::LatLng};

/// Width of the Web Mercator world at zoom 0, i.e. the equatorial circumference
pub const WORLD_WIDTH_KM: f64 = 40_075.016_686;

/// The only state the map surface needs to position itself
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

impl Viewport {
    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.zoom.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("geometry has no coordinates")]
    Empty,

    #[error("bounding box has no extent (diagonal {diagonal_km} km)")]
    Degenerate { diagonal_km: f64 },

    #[error("non-finite {0} while fitting viewport")]
    NonFinite(&'static str),

    #[error("viewport frame {width_px}x{height_px} px is unusable")]
    InvalidFrame { width_px: f64, height_px: f64 },

    #[error("invalid geometry: {0}")]
    Geometry(String),
}

/// Computes viewports for a fixed screen frame
#[derive(Clone, Debug)]
pub struct ViewportFitter {
    width_px: f64,
    height_px: f64,
    min_zoom: f64,
    max_zoom: f64,
    default: Viewport,
}

impl ViewportFitter {
    pub fn new(settings: &ViewportSettings) -> Self {
        Self {
            width_px: settings.width_px,
            height_px: settings.height_px,
            min_zoom: settings.min_zoom.min(settings.max_zoom),
            max_zoom: settings.max_zoom.max(settings.min_zoom),
            default: Viewport {
                center: settings.default_center,
                zoom: settings.default_zoom,
            },
        }
    }

    /// The viewport used whenever fitting is impossible
    pub fn default_viewport(&self) -> Viewport {
        self.default
    }

    /// Resize the frame, e.g. after the window or the panel changed size
    pub fn set_frame(&mut self, width_px: f64, height_px: f64) {
        self.width_px = width_px;
        self.height_px = height_px;
    }

    /// Center on the bounding box of `geometry` at the deepest zoom that keeps
    /// its diagonal on screen.
    pub fn fit(&self, geometry: &Geometry<f64>) -> Result<Viewport, FitError> {
        let aspect = self.width_px / self.height_px;
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(FitError::InvalidFrame {
                width_px: self.width_px,
                height_px: self.height_px,
            });
        }
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err(FitError::NonFinite("zoom bounds"));
        }

        let bbox = geometry.bounding_rect().ok_or(FitError::Empty)?;

        let mid = bbox.center();
        let center = LatLng::new(mid.y, mid.x);
        if !center.is_finite() {
            return Err(FitError::NonFinite("center"));
        }

        let diagonal_km = haversine_distance(bbox.min().into(), bbox.max().into()) / 1_000.0;
        if !diagonal_km.is_finite() {
            return Err(FitError::NonFinite("diagonal"));
        }
        if diagonal_km <= 0.0 {
            return Err(FitError::Degenerate { diagonal_km });
        }

        let zoom = ((WORLD_WIDTH_KM * aspect) / diagonal_km).log2();
        if !zoom.is_finite() {
            return Err(FitError::NonFinite("zoom"));
        }

        Ok(Viewport {
            center,
            zoom: zoom.clamp(self.min_zoom, self.max_zoom).round(),
        })
    }

    /// [`fit`](Self::fit), falling back to the default viewport
    pub fn fit_or_default(&self, geometry: &Geometry<f64>) -> Viewport {
        match self.fit(geometry) {
            Ok(viewport) => viewport,
            Err(error) => {
                tracing::warn!("Using default viewport: {error}");
                self.default
            }
        }
    }

    pub fn fit_geojson(&self, geojson: &geojson::GeoJson) -> Result<Viewport, FitError> {
        let collection = geo::GeometryCollection::<f64>::try_from(geojson)
            .map_err(|e| FitError::Geometry(e.to_string()))?;
        self.fit(&Geometry::GeometryCollection(collection))
    }
}
