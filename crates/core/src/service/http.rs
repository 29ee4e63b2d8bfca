//! [`TransitService`] over the JSON HTTP API.

use std::time::Duration;

use atlas_api_types::{
    NearbyRoutesResponse, NearbyStopsResponse, PlacesResponse, StopDto, place_geometry_from_geojson,
    route_from_feature, stops_from_dtos,
};
use atlas_transit::prelude::*;
use geo::Point;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{config::ExplorerConfig, error::Error};

pub struct HttpTransitService {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransitService {
    pub fn new(config: &ExplorerConfig) -> crate::Result<Self> {
        let base = Url::parse(&config.api_base_url).map_err(|e| Error::BaseUrl {
            url: config.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::BaseUrl {
                url: config.api_base_url.clone(),
                reason: "not a hierarchical URL".to_owned(),
            });
        }

        let timeout = config.request_timeout();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        url
    }

    fn nearby_query(center: Point, radius_km: f64) -> [(&'static str, String); 3] {
        [
            ("lat", center.y().to_string()),
            ("lng", center.x().to_string()),
            ("radius_km", radius_km.to_string()),
        ]
    }

    /// GET and decode; a 404 is `None`
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.json::<T>().await.map(Some).map_err(|e| self.classify(e))
    }

    async fn get_required<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let shown = url.to_string();
        self.get_json(url).await?.ok_or(ServiceError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            url: shown,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::Timeout(self.timeout.as_millis() as u64)
        } else if error.is_decode() {
            ServiceError::InvalidPayload(error.to_string())
        } else {
            ServiceError::Network(error.to_string())
        }
    }
}

impl TransitService for HttpTransitService {
    fn search_places(&self) -> ServiceFuture<'_, PlaceCatalog> {
        Box::pin(async move {
            let response: PlacesResponse = self.get_required(self.endpoint(&["places"], &[])).await?;
            Ok(response.into())
        })
    }

    fn query_place_geometry<'a>(
        &'a self,
        name: &'a str,
        level: PlaceLevel,
    ) -> ServiceFuture<'a, Option<PlaceGeometry>> {
        Box::pin(async move {
            let url = self.endpoint(
                &["places", "geometry"],
                &[("name", name.to_owned()), ("level", level.code().to_owned())],
            );
            match self.get_json::<geojson::GeoJson>(url).await? {
                Some(geojson) => place_geometry_from_geojson(geojson).map(Some),
                None => Ok(None),
            }
        })
    }

    fn nearby_routes(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyRoutesResult> {
        Box::pin(async move {
            let url = self.endpoint(&["routes", "nearby"], &Self::nearby_query(center, radius_km));
            let response: NearbyRoutesResponse = self.get_required(url).await?;
            response.try_into()
        })
    }

    fn route_by_code<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Option<RouteFeature>> {
        Box::pin(async move {
            let url = self.endpoint(&["routes", code.as_str()], &[]);
            match self.get_json::<geojson::Feature>(url).await? {
                Some(feature) => route_from_feature(feature).map(Some),
                None => Ok(None),
            }
        })
    }

    fn nearby_stops(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, NearbyStopsResult> {
        Box::pin(async move {
            let url = self.endpoint(&["stops", "nearby"], &Self::nearby_query(center, radius_km));
            let response: NearbyStopsResponse = self.get_required(url).await?;
            response.try_into()
        })
    }

    fn stops_for_route<'a>(&'a self, code: &'a RouteCode) -> ServiceFuture<'a, Vec<NearbyStop>> {
        Box::pin(async move {
            let url = self.endpoint(&["routes", code.as_str(), "stops"], &[]);
            let stops: Option<Vec<StopDto>> = self.get_json(url).await?;
            stops.map(stops_from_dtos).unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}
