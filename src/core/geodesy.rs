use crate::core::vector::Vector3;

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis (m)
pub const WGS84_B: f64 = 6_356_752.314_245;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 0.00669437999014;

/// Geodetic position in degrees / meters above the ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Convert lat/lon/height to ECEF coordinates
pub fn geo_to_xyz_wgs84(lat: f64, lon: f64, height: f64) -> Vector3 {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();

    let n = WGS84_A / (1.0 - WGS84_E2 * lat_rad.sin().powi(2)).sqrt();

    Vector3::new(
        (n + height) * lat_rad.cos() * lon_rad.cos(),
        (n + height) * lat_rad.cos() * lon_rad.sin(),
        (n * (1.0 - WGS84_E2) + height) * lat_rad.sin(),
    )
}

/// Convert ECEF coordinates to (lat, lon, height).
///
/// Fixed-point iteration on the geodetic latitude; converges to sub-millimetre
/// height within a handful of steps for points near the surface.
pub fn xyz_to_geo_wgs84(xyz: &Vector3) -> (f64, f64, f64) {
    let p = (xyz.x * xyz.x + xyz.y * xyz.y).sqrt();
    let lon = xyz.y.atan2(xyz.x);

    if p < 1e-9 {
        let lat = if xyz.z >= 0.0 { 90.0 } else { -90.0 };
        return (lat, lon.to_degrees(), xyz.z.abs() - WGS84_B);
    }

    let mut lat = xyz.z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = p / lat.cos() - n;
        let next = xyz.z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
        if (next - lat).abs() < 1e-14 {
            lat = next;
            break;
        }
        lat = next;
    }

    (lat.to_degrees(), lon.to_degrees(), height)
}

/// Ground distance in meters expressed as an angle along the equator (degrees)
pub fn pixel_spacing_in_degree(pixel_spacing_m: f64) -> f64 {
    (pixel_spacing_m / WGS84_A).to_degrees()
}

/// Angular spacing in degrees expressed as meters along a meridian
pub fn pixel_spacing_in_meter(pixel_spacing_deg: f64) -> f64 {
    pixel_spacing_deg.to_radians() * WGS84_B
}
