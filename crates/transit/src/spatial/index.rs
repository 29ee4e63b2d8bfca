//! R-tree nodes for spatial indexing.
//!
//! Wraps transit entities with geometric data for efficient spatial queries.
//!
//! ## Two-Stage Filtering
//!
//! The spatial queries use a two-stage filtering approach:
//! 1. **R-tree filter**: Uses Euclidean distance in degrees for fast approximate filtering
//! 2. **Haversine filter**: Applies accurate geodesic distance on filtered results
//!
//! The R-tree radius is derived from the widest degree span the requested
//! meters can cover at the query latitude, so stage one never drops a
//! candidate that stage two would accept.

use std::sync::Arc;

use geo::{Line, Point};
use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::{NearbyStop, RouteFeature};

// ============================================================================
// Stop Spatial Node
// ============================================================================

#[derive(Clone)]
pub struct StopNode {
    pub stop: Arc<NearbyStop>,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(location: Point, stop: Arc<NearbyStop>) -> Self {
        Self {
            stop,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ============================================================================
// Route Segment Spatial Node
// ============================================================================

#[derive(Clone)]
pub struct RouteSegmentNode {
    pub route: Arc<RouteFeature>,
    pub segment: Line,
    aabb: AABB<[f64; 2]>,
}

impl RouteSegmentNode {
    pub fn new(segment: Line, route: Arc<RouteFeature>) -> Self {
        let start = [segment.start.x, segment.start.y];
        let end = [segment.end.x, segment.end.y];

        let aabb = AABB::from_corners(start, end);

        Self {
            route,
            segment,
            aabb,
        }
    }
}

impl RTreeObject for RouteSegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for RouteSegmentNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        // Distance from point to line segment (squared Euclidean distance)
        let p = [point[0], point[1]];
        let a = [self.segment.start.x, self.segment.start.y];
        let b = [self.segment.end.x, self.segment.end.y];

        let ab = [b[0] - a[0], b[1] - a[1]];
        let ap = [p[0] - a[0], p[1] - a[1]];

        let ab_ab = ab[0] * ab[0] + ab[1] * ab[1];

        if ab_ab == 0.0 {
            // Segment is actually a point
            return ap[0] * ap[0] + ap[1] * ap[1];
        }

        let ab_ap = ab[0] * ap[0] + ab[1] * ap[1];
        let t = (ab_ap / ab_ab).clamp(0.0, 1.0);

        let closest = [a[0] + t * ab[0], a[1] + t * ab[1]];
        let dx = p[0] - closest[0];
        let dy = p[1] - closest[1];

        dx * dx + dy * dy
    }
}
