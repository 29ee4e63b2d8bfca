//! Spatial indexing and query utilities.

pub mod index;
pub mod queries;

pub use queries::{
    circle_polygon, haversine_distance, haversine_distance_to_line, haversine_distance_to_path,
};
