//! Great-circle math shared by the stitcher, the kinematics deriver and the
//! row assembler. All angles are degrees unless a name says otherwise.

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two lat/lon pairs, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Forward azimuth from point 1 to point 2, normalized to [0, 360).
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let y = d_lon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lon.cos();
    norm_360(y.atan2(x).to_degrees())
}

/// Normalize an angle into [0, 360).
pub fn norm_360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Signed smallest rotation from `a_deg` to `b_deg`, in (-180, 180].
pub fn signed_delta_deg(a_deg: f64, b_deg: f64) -> f64 {
    let mut d = norm_360(b_deg) - norm_360(a_deg);
    if d > 180.0 {
        d -= 360.0;
    }
    if d <= -180.0 {
        d += 360.0;
    }
    d
}
