//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{
    ClosestPoint, Coord, HaversineDestination, HaversineDistance, Line, LineString,
    MultiLineString, Point, Polygon,
};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Calculate distance from point to line segment in meters
pub fn haversine_distance_to_line(point: Point, line: Line) -> f64 {
    // Convert line to LineString for ClosestPoint trait
    let line_string = LineString::from(vec![line.start, line.end]);

    match line_string.closest_point(&point) {
        geo::Closest::Intersection(p) | geo::Closest::SinglePoint(p) => {
            haversine_distance(point, p)
        }
        geo::Closest::Indeterminate => f64::INFINITY,
    }
}

/// Shortest distance in meters from a point to any segment of a path
pub fn haversine_distance_to_path(point: Point, path: &MultiLineString) -> f64 {
    path.iter()
        .flat_map(|line_string| line_string.lines())
        .map(|segment| haversine_distance_to_line(point, segment))
        .fold(f64::INFINITY, f64::min)
}

/// Mean earth radius in meters, the one geo's haversine algorithms use
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

/// Slack on the R-tree envelope for the curvature the flat degree box ignores
const ENVELOPE_PADDING: f64 = 1.01;

/// Degrees of arc along a great circle spanned by `meters`
pub fn meters_to_degrees(meters: f64) -> f64 {
    (meters / MEAN_EARTH_RADIUS).to_degrees()
}

/// Degrees of longitude spanned by `meters` at the given latitude.
///
/// Always at least the latitude span of the same distance, so it is safe as
/// an R-tree search envelope in both axes.
pub fn meters_to_longitude_degrees(meters: f64, latitude: f64) -> f64 {
    let cos = latitude.to_radians().cos().abs().max(0.01);
    meters_to_degrees(meters) / cos
}

/// Euclidean search radius, in degrees, for candidates within `meters` of a
/// point at `latitude`
pub fn search_envelope_degrees(meters: f64, latitude: f64) -> f64 {
    meters_to_longitude_degrees(meters, latitude) * ENVELOPE_PADDING
}

/// Closed polygon approximating a geodesic circle of `radius_m` around `center`
pub fn circle_polygon(center: Point, radius_m: f64, vertices: usize) -> Polygon {
    let vertices = vertices.max(3);
    let step = 360.0 / vertices as f64;

    let mut ring: Vec<Coord> = (0..vertices)
        .map(|i| center.haversine_destination(i as f64 * step, radius_m).into())
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    Polygon::new(LineString::from(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_distance() {
        // San Salvador to San Miguel is roughly 115 km as the crow flies
        let san_salvador = Point::new(-89.2182, 13.6929);
        let san_miguel = Point::new(-88.1770, 13.4833);

        let dist = haversine_distance(san_salvador, san_miguel);
        assert!((dist - 115_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_distance_to_line() {
        let point = Point::new(-89.2, 13.7);
        let line = Line::new(
            geo::Coord { x: -89.2, y: 13.6 },
            geo::Coord { x: -89.2, y: 13.8 },
        );

        // Point is on the line, distance should be near 0
        let dist = haversine_distance_to_line(point, line);
        assert!(dist < 100.0); // Within 100 meters
    }

    #[test]
    fn test_distance_to_path_takes_closest_segment() {
        let path = MultiLineString::new(vec![
            LineString::from(vec![(-89.30, 13.60), (-89.30, 13.65)]),
            LineString::from(vec![(-89.20, 13.69), (-89.20, 13.71)]),
        ]);

        let dist = haversine_distance_to_path(Point::new(-89.20, 13.70), &path);
        assert!(dist < 50.0);

        let empty = MultiLineString::<f64>::new(vec![]);
        assert!(haversine_distance_to_path(Point::new(0.0, 0.0), &empty).is_infinite());
    }

    #[test]
    fn test_longitude_degrees_widen_away_from_equator() {
        let at_equator = meters_to_longitude_degrees(1_000.0, 0.0);
        let at_60 = meters_to_longitude_degrees(1_000.0, 60.0);

        assert_relative_eq!(at_equator, meters_to_degrees(1_000.0), epsilon = 1e-12);
        assert_relative_eq!(at_60, at_equator * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degrees_agree_with_haversine() {
        // One degree of arc along the equator
        let east = haversine_distance(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert_relative_eq!(meters_to_degrees(east), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_envelope_covers_points_on_the_radius() {
        let center = Point::new(-89.2, 13.7);
        let envelope = search_envelope_degrees(1_000.0, center.y());

        for bearing in (0..360).step_by(15) {
            let edge = center.haversine_destination(bearing as f64, 999.9);
            let (dx, dy) = (edge.x() - center.x(), edge.y() - center.y());
            assert!((dx * dx + dy * dy).sqrt() <= envelope, "bearing {bearing}");
        }
    }

    #[test]
    fn test_circle_polygon_radius() {
        let center = Point::new(-89.2, 13.7);
        let circle = circle_polygon(center, 500.0, 64);

        assert_eq!(circle.exterior().0.len(), 65);
        assert_eq!(circle.exterior().0.first(), circle.exterior().0.last());
        for coord in circle.exterior().coords() {
            assert_relative_eq!(haversine_distance(center, Point::from(*coord)), 500.0, epsilon = 0.5);
        }
    }
}
