//! # atlas-core
//!
//! State arbitration and nearby search for the transit and place explorer.
//!
//! - [`stores`]: independently owned domain state (routes, stops, places, annotations)
//! - [`proximity`]: debounced, generation-tagged nearby queries
//! - [`overlap`]: click and hover resolution when routes coincide
//! - [`panel`]: which domain owns the disclosure panel, and its height
//! - [`map`]: viewport fitting and the GeoJSON sources for the map surface
//! - [`Explorer`]: the orchestration layer tying them together

pub mod config;
pub mod error;
pub mod explorer;
pub mod map;
pub mod overlap;
pub mod panel;
pub mod proximity;
pub mod service;
pub mod stores;

#[cfg(test)]
mod testing;

pub use config::ExplorerConfig;
pub use error::{Error, Result};
pub use explorer::Explorer;

// Re-export transit from the transit crate
pub use atlas_transit as transit;
