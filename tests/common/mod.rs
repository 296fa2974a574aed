#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use sargeo::core::{geo_to_xyz_wgs84, xyz_to_geo_wgs84, OrbitStateVectors, Vector3};
use sargeo::io::SyntheticOrbit;
use sargeo::types::SECONDS_PER_DAY;

pub const WAVELENGTH: f64 = 0.05546576;
pub const EARTH_RADIUS: f64 = 6_371_000.0;
pub const PRF: f64 = 486.5;
/// Ground point offset from the orbital plane (radians)
pub const LOOK_OFFSET: f64 = 0.06;
/// Seconds after the first state vector at which the test target is imaged
pub const TARGET_ELAPSED_S: f64 = 97.3;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 20 state vectors 10 s apart
pub fn synthetic_orbit() -> SyntheticOrbit {
    let start = Utc.with_ymd_and_hms(2002, 1, 3, 17, 0, 0).unwrap();
    SyntheticOrbit::new(start, 10.0, 20)
}

pub fn orbit_store(orbit: &SyntheticOrbit) -> OrbitStateVectors {
    OrbitStateVectors::new(&orbit.state_vectors()).expect("Failed to build orbit store")
}

/// Line time interval in days
pub fn line_time_interval() -> f64 {
    1.0 / PRF / SECONDS_PER_DAY
}

/// Target broadside to the orbit `elapsed_s` seconds after the first vector,
/// with its exact zero-Doppler time in MJD-2000 days
pub fn target(orbit: &SyntheticOrbit, elapsed_s: f64) -> (Vector3, f64) {
    let point = orbit.ground_point(orbit.angle_at(elapsed_s), LOOK_OFFSET, EARTH_RADIUS);
    (point, orbit.mjd_at(elapsed_s))
}

/// (lat, lon) of the default target, and the same position on the ellipsoid surface
pub fn target_on_ellipsoid(orbit: &SyntheticOrbit) -> (f64, f64, Vector3) {
    let (point, _) = target(orbit, TARGET_ELAPSED_S);
    let (lat, lon, _) = xyz_to_geo_wgs84(&point);
    (lat, lon, geo_to_xyz_wgs84(lat, lon, 0.0))
}

pub fn seconds(days: f64) -> f64 {
    days * SECONDS_PER_DAY
}
