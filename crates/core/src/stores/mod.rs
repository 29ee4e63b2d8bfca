//! Independently owned domain state.
//!
//! Each store only knows about its own data and exposes the actions that keep
//! its invariants. Cross-store effects are sequenced by [`crate::Explorer`].

pub mod annotations;
pub mod places;
pub mod routes;
pub mod stops;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use annotations::{Annotation, AnnotationKind, AnnotationPayload, AnnotationStore};
pub use places::{NavigationLevel, ParentInfo, PlaceStore, SelectedPlace};
pub use routes::{RouteHighlight, RoutesStore};
pub use stops::StopsStore;

/// A store handle that can be injected into several components
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}
