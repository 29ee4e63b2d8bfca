//! Core data types and enums for transit and place data.

use std::sync::Arc;

use geo::{Geometry, MultiLineString, Point};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Direction a route runs in ("I" = ida/outbound, "R" = regreso/inbound)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectionId {
    #[cfg_attr(feature = "serde", serde(rename = "I"))]
    Outbound,
    #[cfg_attr(feature = "serde", serde(rename = "R"))]
    Inbound,
}

impl DirectionId {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "I" | "i" => Some(Self::Outbound),
            "R" | "r" => Some(Self::Inbound),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Outbound => "I",
            Self::Inbound => "R",
        }
    }
}

/// Administrative level of a place in the country's geography
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PlaceLevel {
    Department,
    Municipality,
    District,
}

impl PlaceLevel {
    /// Level code understood by the geometry service
    pub fn code(&self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Municipality => "municipality",
            Self::District => "district",
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Descriptive metadata shared by every representation of a route
#[derive(Clone, Debug, PartialEq)]
pub struct RouteInfo {
    pub code: RouteCode,
    pub name: Arc<str>,
    /// Service type, e.g. "Bus" or "Microbus"
    pub kind: Arc<str>,
    /// Service subtype, e.g. "Urbano" or "Interdepartamental"
    pub subtype: Arc<str>,
    pub direction: DirectionId,
    pub department: Arc<str>,
    pub length_km: f64,
}

/// A route found by a proximity query
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyRoute {
    pub info: RouteInfo,
    /// Distance from the search point to the closest part of the route
    pub distance_meters: f64,
    pub geometry: Option<MultiLineString>,
}

impl NearbyRoute {
    pub fn code(&self) -> &RouteCode {
        &self.info.code
    }
}

/// A full route with its path, as returned by a route lookup
#[derive(Clone, Debug, PartialEq)]
pub struct RouteFeature {
    pub info: RouteInfo,
    pub geometry: MultiLineString,
}

impl RouteFeature {
    pub fn code(&self) -> &RouteCode {
        &self.info.code
    }
}

/// A boarding point served by one route in one direction
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyStop {
    pub id: StopIdentifier,
    pub route_code: RouteCode,
    pub direction: DirectionId,
    pub name: Arc<str>,
    pub location: Point,
    pub department: Arc<str>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NearbyRoutesResult {
    pub radius_km: f64,
    pub routes: Vec<NearbyRoute>,
}

impl NearbyRoutesResult {
    pub fn empty(radius_km: f64) -> Self {
        Self {
            radius_km,
            routes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NearbyStopsResult {
    pub radius_km: f64,
    pub stops: Vec<NearbyStop>,
}

impl NearbyStopsResult {
    pub fn empty(radius_km: f64) -> Self {
        Self {
            radius_km,
            stops: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Department {
    pub code: Arc<str>,
    pub name: Arc<str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Municipality {
    pub code: Arc<str>,
    pub name: Arc<str>,
    pub department: Arc<str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct District {
    pub code: Arc<str>,
    pub name: Arc<str>,
    pub municipality: Arc<str>,
    pub department: Arc<str>,
}

/// Every administrative place known to the geocoding service
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaceCatalog {
    pub departments: Vec<Department>,
    pub municipalities: Vec<Municipality>,
    pub districts: Vec<District>,
}

impl PlaceCatalog {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.municipalities.is_empty() && self.districts.is_empty()
    }

    pub fn district(&self, name: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn districts_of<'a>(&'a self, department: &'a str) -> impl Iterator<Item = &'a District> + 'a {
        self.districts
            .iter()
            .filter(move |d| d.department.eq_ignore_ascii_case(department))
    }
}

/// Geometry of an administrative place (usually a MultiPolygon)
pub type PlaceGeometry = Geometry<f64>;

// ============================================================================
// Errors
// ============================================================================

/// Coarse failure classes every external call is folded into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Validation,
    Geometry,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Route not found: {0}")]
    RouteNotFound(RouteCode),

    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Status { .. } => ErrorKind::Network,
            Self::InvalidPayload(_) => ErrorKind::Validation,
            Self::InvalidGeometry(_) => ErrorKind::Geometry,
            Self::RouteNotFound(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
