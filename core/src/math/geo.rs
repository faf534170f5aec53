/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

pub struct GeoHelper;

impl GeoHelper {
    /// Great-circle distance between two lat/lon points in degrees, in nautical miles.
    pub fn distance_nm(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
        let (phi_a, phi_b) = (lat_a.to_radians(), lat_b.to_radians());
        let d_phi = (lat_b - lat_a).to_radians();
        let d_lambda = (lon_b - lon_a).to_radians();
        let h = (d_phi / 2.0).sin().powi(2)
            + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_NM * h.sqrt().min(1.0).asin()
    }

    /// Point reached after travelling `distance_nm` from a start point on `heading_deg`.
    pub fn project(lat: f64, lon: f64, heading_deg: f64, distance_nm: f64) -> (f64, f64) {
        let delta = distance_nm / EARTH_RADIUS_NM;
        let theta = heading_deg.to_radians();
        let phi = lat.to_radians();
        let lambda = lon.to_radians();
        let phi2 = (phi.sin() * delta.cos() + phi.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda
            + (theta.sin() * delta.sin() * phi.cos()).atan2(delta.cos() - phi.sin() * phi2.sin());
        let lon2 = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
        (phi2.to_degrees(), lon2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_zero_for_same_point() {
        assert!(GeoHelper::distance_nm(37.6, -122.4, 37.6, -122.4).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_sixty_miles() {
        let d = GeoHelper::distance_nm(10.0, 20.0, 11.0, 20.0);
        assert!((d - 60.04).abs() < 0.1, "got {d}");
    }

    #[test]
    fn projection_round_trips_distance() {
        let (lat, lon) = GeoHelper::project(37.6, -122.4, 45.0, 25.0);
        let d = GeoHelper::distance_nm(37.6, -122.4, lat, lon);
        assert!((d - 25.0).abs() < 0.01, "got {d}");
    }
}
