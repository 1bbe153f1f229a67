//! Spatial math for buffers and distance-to-route calculations.

use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Conversion factor used for every provider distance (meters per statute mile).
pub const METERS_PER_MILE: f64 = 1609.34;

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Calculate distance between two points in meters using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two coordinates in miles.
pub fn distance_mi(a: Coordinate, b: Coordinate) -> f64 {
    meters_to_miles(haversine_distance(a.lat, a.lon, b.lat, b.lon))
}

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Closed ring of `segments` vertices approximating a circle, as `[lon, lat]`.
///
/// The first vertex is repeated at the end so the ring is valid GeoJSON.
pub fn circle_polygon(center: Coordinate, radius_mi: f64, segments: usize) -> Vec<[f64; 2]> {
    let segments = segments.max(4);
    let radius_m = miles_to_meters(radius_mi);
    let mut ring = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let bearing = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
        let (lat, lon) = offset_by_bearing(center.lat, center.lon, radius_m, bearing);
        ring.push([lon, lat]);
    }
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

/// Longitude difference `to - from` wrapped into [-180, 180).
fn wrapped_dlon(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Minimum distance from a point to a line segment, in meters.
///
/// The closest point is found in a local east/north plane anchored at the
/// segment midpoint; the distance to it is then measured along the great
/// circle so far-away points keep their true distance.
pub fn distance_to_segment_m(
    point_lat: f64,
    point_lon: f64,
    seg_start_lat: f64,
    seg_start_lon: f64,
    seg_end_lat: f64,
    seg_end_lon: f64,
) -> f64 {
    let ref_lat = (seg_start_lat + seg_end_lat) / 2.0;
    let m_lat = meters_per_deg_lat(ref_lat);
    let m_lon = meters_per_deg_lon(ref_lat);

    let seg_dlon = wrapped_dlon(seg_start_lon, seg_end_lon);
    let px = wrapped_dlon(seg_start_lon, point_lon) * m_lon;
    let py = (point_lat - seg_start_lat) * m_lat;
    let sx = seg_dlon * m_lon;
    let sy = (seg_end_lat - seg_start_lat) * m_lat;

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        // Degenerate segment; fall back to great-circle point distance.
        return haversine_distance(point_lat, point_lon, seg_start_lat, seg_start_lon);
    }

    // t = ((P-A) · (B-A)) / |B-A|², clamped onto the segment
    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let closest_lat = seg_start_lat + t * (seg_end_lat - seg_start_lat);
    let closest_lon = seg_start_lon + t * seg_dlon;

    haversine_distance(point_lat, point_lon, closest_lat, closest_lon)
}

/// Minimum distance in miles from `point` to a polyline of `[lon, lat]` pairs.
///
/// Returns `None` for an empty polyline.
pub fn distance_to_polyline_mi(point: Coordinate, line: &[[f64; 2]]) -> Option<f64> {
    match line {
        [] => None,
        [only] => Some(distance_mi(point, Coordinate::new(only[1], only[0]))),
        _ => line
            .windows(2)
            .map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                distance_to_segment_m(point.lat, point.lon, a[1], a[0], b[1], b[0])
            })
            .min_by(|a, b| a.total_cmp(b))
            .map(meters_to_miles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(33.6846, -117.8265, 33.6846, -117.8265);
        assert!(dist < 0.001);
    }

    #[test]
    fn mile_conversion_uses_provider_factor() {
        assert!((meters_to_miles(1609.34) - 1.0).abs() < 1e-12);
        assert!((miles_to_meters(5.0) - 8046.7).abs() < 1e-9);
    }

    #[test]
    fn circle_polygon_is_closed_and_at_radius() {
        let center = Coordinate::new(34.05, -118.25);
        let ring = circle_polygon(center, 5.0, 16);
        assert_eq!(ring.len(), 17);
        assert_eq!(ring.first(), ring.last());
        for vertex in &ring {
            let d = distance_mi(center, Coordinate::new(vertex[1], vertex[0]));
            assert!((d - 5.0).abs() < 0.01, "vertex at {d} mi");
        }
    }

    #[test]
    fn segment_distance_uses_interior_projection() {
        // Horizontal segment along the equator; point 1km north of its midpoint.
        let north = 1000.0 / meters_per_deg_lat(0.0);
        let d = distance_to_segment_m(north, 0.5, 0.0, 0.0, 0.0, 1.0);
        let expected = haversine_distance(north, 0.5, 0.0, 0.5);
        assert!((d - expected).abs() < 1.0, "got {d}, expected {expected}");
    }

    #[test]
    fn polyline_distance_handles_short_inputs() {
        let p = Coordinate::new(0.0, 0.0);
        assert!(distance_to_polyline_mi(p, &[]).is_none());
        let single = distance_to_polyline_mi(p, &[[0.0, 1.0]]).unwrap();
        assert!((single - 69.09).abs() < 0.1);
    }

    #[test]
    fn segment_crossing_antimeridian_is_short() {
        // 0.2 degrees of longitude across the date line, point 0.1 degrees north of it.
        let d = distance_to_segment_m(0.1, 180.0, 0.0, 179.9, 0.0, -179.9);
        let expected = haversine_distance(0.1, 180.0, 0.0, 180.0);
        assert!((d - expected).abs() < 1.0, "got {d}, expected {expected}");
    }

    #[test]
    fn far_point_distance_matches_great_circle() {
        let d = distance_to_segment_m(40.0, -117.5, 34.0, -118.0, 34.0, -117.0);
        let expected = haversine_distance(40.0, -117.5, 34.0, -117.5);
        assert!((d - expected).abs() / expected < 0.005, "got {d}, expected {expected}");
    }
}
