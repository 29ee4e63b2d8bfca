//! Wire payloads of the geocoding, route and stop services.
//!
//! Every payload converts into the matching `atlas-transit` model. Conversions
//! fail with [`ServiceError::InvalidGeometry`] when a geometry does not have
//! the expected shape.

use atlas_transit::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DepartmentDto {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MunicipalityDto {
    pub code: String,
    pub name: String,
    pub department: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DistrictDto {
    pub code: String,
    pub name: String,
    pub municipality: String,
    pub department: String,
}

/// `GET /places`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub departments: Vec<DepartmentDto>,
    #[serde(default)]
    pub municipalities: Vec<MunicipalityDto>,
    #[serde(default)]
    pub districts: Vec<DistrictDto>,
}

impl From<PlacesResponse> for PlaceCatalog {
    fn from(response: PlacesResponse) -> Self {
        PlaceCatalog {
            departments: response
                .departments
                .into_iter()
                .map(|d| Department { code: d.code.into(), name: d.name.into() })
                .collect(),
            municipalities: response
                .municipalities
                .into_iter()
                .map(|m| Municipality {
                    code: m.code.into(),
                    name: m.name.into(),
                    department: m.department.into(),
                })
                .collect(),
            districts: response
                .districts
                .into_iter()
                .map(|d| District {
                    code: d.code.into(),
                    name: d.name.into(),
                    municipality: d.municipality.into(),
                    department: d.department.into(),
                })
                .collect(),
        }
    }
}

/// Route metadata as it appears in nearby results and feature properties
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoutePropertiesDto {
    pub code: RouteCode,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: String,
    pub direction: DirectionId,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub length_km: f64,
}

impl From<RoutePropertiesDto> for RouteInfo {
    fn from(dto: RoutePropertiesDto) -> Self {
        RouteInfo {
            code: dto.code,
            name: dto.name.into(),
            kind: dto.kind.into(),
            subtype: dto.subtype.into(),
            direction: dto.direction,
            department: dto.department.into(),
            length_km: dto.length_km,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NearbyRouteDto {
    #[serde(flatten)]
    pub properties: RoutePropertiesDto,
    pub distance_meters: f64,
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,
}

impl TryFrom<NearbyRouteDto> for NearbyRoute {
    type Error = ServiceError;

    fn try_from(dto: NearbyRouteDto) -> Result<Self> {
        let geometry = dto.geometry.map(path_from_geojson).transpose()?;
        Ok(NearbyRoute {
            info: dto.properties.into(),
            distance_meters: dto.distance_meters,
            geometry,
        })
    }
}

/// `GET /routes/nearby`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NearbyRoutesResponse {
    pub radius_km: f64,
    #[serde(default)]
    pub routes: Vec<NearbyRouteDto>,
}

impl TryFrom<NearbyRoutesResponse> for NearbyRoutesResult {
    type Error = ServiceError;

    fn try_from(response: NearbyRoutesResponse) -> Result<Self> {
        Ok(NearbyRoutesResult {
            radius_km: response.radius_km,
            routes: response
                .routes
                .into_iter()
                .map(NearbyRoute::try_from)
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StopDto {
    pub id: StopIdentifier,
    pub route_code: RouteCode,
    pub direction: DirectionId,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub department: String,
}

impl TryFrom<StopDto> for NearbyStop {
    type Error = ServiceError;

    fn try_from(dto: StopDto) -> Result<Self> {
        if !dto.lat.is_finite() || !dto.lng.is_finite() {
            return Err(ServiceError::InvalidGeometry(format!(
                "stop {} has no usable position",
                dto.id
            )));
        }

        Ok(NearbyStop {
            id: dto.id,
            route_code: dto.route_code,
            direction: dto.direction,
            name: dto.name.into(),
            location: geo::Point::new(dto.lng, dto.lat),
            department: dto.department.into(),
        })
    }
}

/// `GET /stops/nearby`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NearbyStopsResponse {
    pub radius_km: f64,
    #[serde(default)]
    pub stops: Vec<StopDto>,
}

impl TryFrom<NearbyStopsResponse> for NearbyStopsResult {
    type Error = ServiceError;

    fn try_from(response: NearbyStopsResponse) -> Result<Self> {
        Ok(NearbyStopsResult {
            radius_km: response.radius_km,
            stops: stops_from_dtos(response.stops)?,
        })
    }
}

/// `GET /routes/{code}/stops`
pub fn stops_from_dtos(stops: Vec<StopDto>) -> Result<Vec<NearbyStop>> {
    stops.into_iter().map(NearbyStop::try_from).collect()
}

/// `GET /routes/{code}` answers with a single GeoJSON feature
pub fn route_from_feature(feature: geojson::Feature) -> Result<RouteFeature> {
    let properties = feature
        .properties
        .ok_or_else(|| ServiceError::InvalidPayload("route feature has no properties".into()))?;
    let properties: RoutePropertiesDto =
        serde_json::from_value(serde_json::Value::Object(properties))
            .map_err(|e| ServiceError::InvalidPayload(e.to_string()))?;
    let geometry = feature
        .geometry
        .ok_or_else(|| ServiceError::InvalidGeometry(format!("route {} has no geometry", properties.code)))?;

    Ok(RouteFeature {
        geometry: path_from_geojson(geometry)?,
        info: properties.into(),
    })
}

/// Converts a place boundary from GeoJSON
pub fn place_geometry_from_geojson(geojson: geojson::GeoJson) -> Result<PlaceGeometry> {
    let collection = geo::GeometryCollection::<f64>::try_from(&geojson)
        .map_err(|e| ServiceError::InvalidGeometry(e.to_string()))?;

    let mut geometries = collection.0;
    match geometries.len() {
        0 => Err(ServiceError::InvalidGeometry("place has no geometry".into())),
        1 => Ok(geometries.remove(0)),
        _ => Ok(geo::Geometry::GeometryCollection(geo::GeometryCollection(geometries))),
    }
}

fn path_from_geojson(geometry: geojson::Geometry) -> Result<geo::MultiLineString> {
    let geometry: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| ServiceError::InvalidGeometry(e.to_string()))?;

    match geometry {
        geo::Geometry::LineString(line) => Ok(geo::MultiLineString::new(vec![line])),
        geo::Geometry::MultiLineString(lines) => Ok(lines),
        other => Err(ServiceError::InvalidGeometry(format!(
            "expected a line geometry, got {}",
            geometry_name(&other)
        ))),
    }
}

fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
