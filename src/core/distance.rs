use crate::models::BoundingBox;

/// Earth's mean radius in miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Miles per degree of latitude
const MILES_PER_DEGREE: f64 = 69.0;

/// Calculate the Haversine distance between two points in miles
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in miles
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Calculate a bounding box around a center point
///
/// Used as a cheap pre-filter in storage before the exact Haversine check.
/// 1° latitude ≈ 69mi, 1° longitude ≈ 69mi * cos(latitude).
///
/// Near the poles, or when the box would wrap across the antimeridian, the
/// longitude range widens to the full [-180, 180] span. The box may then
/// include extra points, never fewer.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_miles: f64) -> BoundingBox {
    let lat_delta = radius_miles / MILES_PER_DEGREE;
    let min_lat = (lat - lat_delta).max(-90.0);
    let max_lat = (lat + lat_delta).min(90.0);

    // Widest parallel inside the box decides the longitude span
    let widest_lat = min_lat.abs().max(max_lat.abs());
    let cos_lat = widest_lat.to_radians().cos();

    if cos_lat <= f64::EPSILON || max_lat >= 90.0 || min_lat <= -90.0 {
        return BoundingBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }

    let lon_delta = radius_miles / (MILES_PER_DEGREE * cos_lat);
    let (min_lon, max_lon) = (lon - lon_delta, lon + lon_delta);

    if lon_delta >= 180.0 || min_lon < -180.0 || max_lon > 180.0 {
        return BoundingBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }

    BoundingBox { min_lat, max_lat, min_lon, max_lon }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 214 miles)
        let london_lat = 51.5074;
        let london_lon = -0.1278;
        let paris_lat = 48.8566;
        let paris_lon = 2.3522;

        let distance = haversine_distance(london_lat, london_lon, paris_lat, paris_lon);
        assert!((distance - 214.0).abs() < 6.0, "Distance should be ~214mi, got {}", distance);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let there = haversine_distance(40.7128, -74.0060, 34.0522, -118.2437);
        let back = haversine_distance(34.0522, -118.2437, 40.7128, -74.0060);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        assert!(bbox.min_lat < 40.7128);
        assert!(bbox.max_lat > 40.7128);
        assert!(bbox.min_lon < -74.0060);
        assert!(bbox.max_lon > -74.0060);

        // 20mi / 69mi per degree = ~0.29 degrees
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.29).abs() < 0.02, "Lat span should be ~0.29 degrees");
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        // A point due east at exactly the radius must fall inside the box
        let (lat, lon) = (60.0, 10.0);
        let bbox = calculate_bounding_box(lat, lon, 50.0);
        let east_lon = lon + 50.0 / (MILES_PER_DEGREE * lat.to_radians().cos());
        assert!(is_within_bounding_box(lat, east_lon - 1e-6, &bbox));
    }

    #[test]
    fn test_bounding_box_near_pole_and_antimeridian() {
        let polar = calculate_bounding_box(89.9, 0.0, 50.0);
        assert_eq!(polar.min_lon, -180.0);
        assert_eq!(polar.max_lon, 180.0);
        assert_eq!(polar.max_lat, 90.0);

        let wrapped = calculate_bounding_box(0.0, 179.9, 50.0);
        assert_eq!(wrapped.min_lon, -180.0);
        assert_eq!(wrapped.max_lon, 180.0);
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        // Center point should be within
        assert!(is_within_bounding_box(40.7128, -74.0060, &bbox));

        // Close point should be within
        assert!(is_within_bounding_box(40.71, -74.0, &bbox));

        // Far point should not be within
        assert!(!is_within_bounding_box(50.0, -80.0, &bbox));
    }
}
