//! Great-circle math for radius search
//!
//! Distances are angular: a radius of `d` km on a sphere of radius
//! [`EARTH_RADIUS_KM`] is `d / EARTH_RADIUS_KM` radians.

/// Mean Earth radius used for radius search
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Central angle to `other` in radians (haversine)
    pub fn angular_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    }

    /// Whether `other` lies within `radians` of this point
    pub fn within(&self, other: &GeoPoint, radians: f64) -> bool {
        self.angular_distance(other) <= radians
    }
}

/// Search radius in radians for a distance in kilometres
pub fn radius_radians(distance_km: f64) -> f64 {
    distance_km / EARTH_RADIUS_KM
}

/// Degree bounds enclosing a spherical cap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    /// `None` when the cap reaches a pole or crosses the antimeridian
    pub longitude: Option<(f64, f64)>,
}

/// Bounds of the cap of `radians` around `center`, used as a coarse prefilter
pub fn bounding_box(center: GeoPoint, radians: f64) -> BoundingBox {
    let delta_lat = radians.to_degrees();
    let min_latitude = center.latitude - delta_lat;
    let max_latitude = center.latitude + delta_lat;

    let longitude = if min_latitude <= -90.0 || max_latitude >= 90.0 {
        None
    } else {
        let ratio = radians.sin() / center.latitude.to_radians().cos();
        if ratio >= 1.0 {
            None
        } else {
            let delta_lng = ratio.asin().to_degrees();
            let (min, max) = (center.longitude - delta_lng, center.longitude + delta_lng);
            (min >= -180.0 && max <= 180.0).then_some((min, max))
        }
    };

    BoundingBox {
        min_latitude: min_latitude.max(-90.0),
        max_latitude: max_latitude.min(90.0),
        longitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOSTON: GeoPoint = GeoPoint {
        latitude: 42.350846,
        longitude: -71.10216,
    };
    const LOWELL: GeoPoint = GeoPoint {
        latitude: 42.6478,
        longitude: -71.3284,
    };
    const BURLINGTON: GeoPoint = GeoPoint {
        latitude: 44.4775,
        longitude: -73.1985,
    };

    fn km(a: &GeoPoint, b: &GeoPoint) -> f64 {
        a.angular_distance(b) * EARTH_RADIUS_KM
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(BOSTON.angular_distance(&BOSTON), 0.0);
    }

    #[test]
    fn test_known_distances() {
        let boston_lowell = km(&BOSTON, &LOWELL);
        assert!((36.0..40.0).contains(&boston_lowell), "{boston_lowell}");

        let boston_burlington = km(&BOSTON, &BURLINGTON);
        assert!((280.0..300.0).contains(&boston_burlington), "{boston_burlington}");
    }

    #[test]
    fn test_within_uses_radius_in_radians() {
        assert!(BOSTON.within(&LOWELL, radius_radians(50.0)));
        assert!(!BOSTON.within(&BURLINGTON, radius_radians(50.0)));
    }

    #[test]
    fn test_bounding_box_contains_cap() {
        let radians = radius_radians(50.0);
        let bbox = bounding_box(BOSTON, radians);
        let (min_lng, max_lng) = bbox.longitude.unwrap();

        assert!(bbox.min_latitude < LOWELL.latitude && LOWELL.latitude < bbox.max_latitude);
        assert!(min_lng < LOWELL.longitude && LOWELL.longitude < max_lng);
        assert!(BURLINGTON.latitude > bbox.max_latitude);
    }

    #[test]
    fn test_bounding_box_near_pole_drops_longitude() {
        let bbox = bounding_box(GeoPoint::new(89.9, 10.0), radius_radians(100.0));
        assert_eq!(bbox.longitude, None);
        assert_eq!(bbox.max_latitude, 90.0);
    }

    #[test]
    fn test_bounding_box_across_antimeridian_drops_longitude() {
        let bbox = bounding_box(GeoPoint::new(0.0, 179.9), radius_radians(100.0));
        assert_eq!(bbox.longitude, None);
    }
}
