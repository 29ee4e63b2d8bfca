use std::time::Duration;

use serde::Deserialize;

use crate::{error::Result, map::LatLng};

/// Runtime settings of the explorer core.
///
/// Every field has a default, so a partial JSON document (or none at all) is
/// a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Base URL of the geocoding/route/stop services, without trailing slash
    pub api_base_url: String,
    /// Upper bound for every service call before it resolves to an empty result
    pub request_timeout_ms: u64,
    /// Quiet period after the last radius edit before re-querying
    pub radius_debounce_ms: u64,
    pub radius: RadiusBounds,
    pub viewport: ViewportSettings,
    /// Net vertical drag, in logical pixels, that moves the panel one level
    pub drag_threshold_px: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_owned(),
            request_timeout_ms: 10_000,
            radius_debounce_ms: 500,
            radius: RadiusBounds::default(),
            viewport: ViewportSettings::default(),
            drag_threshold_px: 80.0,
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn radius_debounce(&self) -> Duration {
        Duration::from_millis(self.radius_debounce_ms)
    }
}

/// Inclusive search radius range in kilometres, shared by the route and stop queries
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadiusBounds {
    pub min_km: f64,
    pub max_km: f64,
    pub default_km: f64,
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self {
            min_km: 0.5,
            max_km: 5.0,
            default_km: 0.5,
        }
    }
}

impl RadiusBounds {
    /// Clamps into `[min_km, max_km]`; a non-finite value falls back to the default
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default_km.clamp(self.min_km, self.max_km);
        }
        value.clamp(self.min_km, self.max_km)
    }

    pub fn default_radius(&self) -> f64 {
        self.clamp(self.default_km)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportSettings {
    pub width_px: f64,
    pub height_px: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub default_center: LatLng,
    pub default_zoom: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width_px: 1280.0,
            height_px: 800.0,
            min_zoom: 7.0,
            max_zoom: 18.0,
            // Geographic center of El Salvador
            default_center: LatLng::new(13.7942, -88.8965),
            default_zoom: 8.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExplorerConfig::from_json_str(
            r#"{"api_base_url": "https://rutas.example/api", "radius": {"max_km": 10.0}}"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://rutas.example/api");
        assert_eq!(config.radius.max_km, 10.0);
        assert_eq!(config.radius.min_km, 0.5);
        assert_eq!(config.radius_debounce(), Duration::from_millis(500));
        assert_eq!(config.viewport, ViewportSettings::default());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ExplorerConfig::from_json_str("{radius: 3").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_radius_clamp() {
        let bounds = RadiusBounds::default();

        assert_eq!(bounds.clamp(0.1), 0.5);
        assert_eq!(bounds.clamp(2.5), 2.5);
        assert_eq!(bounds.clamp(12.0), 5.0);
        assert_eq!(bounds.clamp(f64::NAN), 0.5);
        assert_eq!(bounds.clamp(f64::INFINITY), 0.5);
    }
}
