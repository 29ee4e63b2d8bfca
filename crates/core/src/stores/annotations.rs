use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::{Geometry, Polygon};
use geojson::{Feature, FeatureCollection, JsonObject};
use strum::{EnumDiscriminants, IntoDiscriminant};

use crate::map::LatLng;

#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(AnnotationKind))]
#[strum_discriminants(derive(Hash, strum::IntoStaticStr))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum AnnotationPayload {
    /// Dropped with a right click; only the latest one is kept
    Pin(LatLng),

    /// Outlined by the user; any number may coexist
    DrawnPolygon(Polygon<f64>),

    /// Result of a place search; only the latest one is kept
    SearchResult {
        location: LatLng,
        geometry: Option<Geometry<f64>>,
    },
}

impl AnnotationKind {
    /// At most one annotation of this kind exists at a time
    pub fn is_singleton(self) -> bool {
        !matches!(self, AnnotationKind::DrawnPolygon)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: u64,
    pub name: Arc<str>,
    pub created_at: DateTime<Utc>,
    pub payload: AnnotationPayload,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        self.payload.discriminant()
    }

    fn geometry(&self) -> Geometry<f64> {
        match &self.payload {
            AnnotationPayload::Pin(at) => Geometry::Point((*at).into()),
            AnnotationPayload::DrawnPolygon(polygon) => Geometry::Polygon(polygon.clone()),
            AnnotationPayload::SearchResult { geometry: Some(geometry), .. } => geometry.clone(),
            AnnotationPayload::SearchResult { location, .. } => Geometry::Point((*location).into()),
        }
    }

    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("id".to_owned(), self.id.into());
        properties.insert("kind".to_owned(), self.kind().as_str().into());
        properties.insert("name".to_owned(), self.name.as_ref().into());
        properties.insert("created_at".to_owned(), self.created_at.to_rfc3339().into());

        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry()))),
            id: Some(geojson::feature::Id::Number(self.id.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// The session journal of pins, drawings and search results
#[derive(Debug, Default)]
pub struct AnnotationStore {
    next_id: u64,
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an annotation, replacing the previous one of a singleton kind
    pub fn add(&mut self, name: impl Into<Arc<str>>, payload: AnnotationPayload) -> u64 {
        let kind = payload.discriminant();
        if kind.is_singleton() {
            self.annotations.retain(|annotation| annotation.kind() != kind);
        }

        self.next_id += 1;
        let id = self.next_id;
        self.annotations.push(Annotation {
            id,
            name: name.into(),
            created_at: Utc::now(),
            payload,
        });
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| annotation.id != id);
        self.annotations.len() != before
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn get(&self, id: u64) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Every annotation as one exportable collection, oldest first
    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.annotations.iter().map(Annotation::to_feature).collect(),
            foreign_members: None,
        }
    }
}
