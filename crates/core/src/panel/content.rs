use serde::Serialize;

use crate::panel::SheetHeight;

/// What currently owns the disclosure panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContentType {
    #[default]
    None,
    Route,
    NearbyRoutes,
    GeoInfo,
    Annotations,
}

/// Highest priority first. Anything not listed never owns the panel.
pub const PRIORITY: [ContentType; 4] = [
    ContentType::Route,
    ContentType::NearbyRoutes,
    ContentType::GeoInfo,
    ContentType::Annotations,
];

/// The facts about the domain stores the panel content depends on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentInputs {
    pub has_selected_route: bool,
    /// A search location is set or the nearby route list is non-empty
    pub has_nearby: bool,
    pub has_selected_place: bool,
    pub has_annotations: bool,
}

impl ContentType {
    pub fn derive(inputs: &ContentInputs) -> Self {
        PRIORITY
            .into_iter()
            .find(|content| content.applies(inputs))
            .unwrap_or(ContentType::None)
    }

    fn applies(self, inputs: &ContentInputs) -> bool {
        match self {
            ContentType::None => false,
            ContentType::Route => inputs.has_selected_route,
            ContentType::NearbyRoutes => inputs.has_nearby,
            ContentType::GeoInfo => inputs.has_selected_place,
            ContentType::Annotations => inputs.has_annotations,
        }
    }

    pub fn is_open(self) -> bool {
        self != ContentType::None
    }

    /// Height the panel opens at when this content takes over
    pub fn initial_height(self) -> SheetHeight {
        match self {
            ContentType::Route | ContentType::NearbyRoutes | ContentType::Annotations => SheetHeight::Half,
            ContentType::GeoInfo | ContentType::None => SheetHeight::Peek,
        }
    }

    /// Picking a route out of the nearby list (or going back to it) stays in
    /// the same visual context
    pub fn is_same_context(self, other: ContentType) -> bool {
        matches!(
            (self, other),
            (ContentType::Route, ContentType::NearbyRoutes) | (ContentType::NearbyRoutes, ContentType::Route)
        )
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
