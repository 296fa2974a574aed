use crate::core::config::GeocodingConfig;
use crate::core::orbit::{OrbitStateVector, OrbitStateVectors};
use crate::core::vector::Vector3;
use crate::types::{OrbitData, SarError, SarResult, StateVector, SECONDS_PER_DAY};
use chrono::{DateTime, TimeZone, Utc};
use std::f64::consts::PI;

/// Unix timestamp of 2000-01-01T00:00:00Z, the MJD-2000 epoch
const MJD2000_EPOCH_UNIX_SECONDS: i64 = 946_684_800;

/// Days since 2000-01-01T00:00:00Z
pub fn mjd2000_from_datetime(time: &DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() - MJD2000_EPOCH_UNIX_SECONDS;
    let days = seconds.div_euclid(86_400);
    let second_of_day = seconds.rem_euclid(86_400) as f64 + time.timestamp_subsec_nanos() as f64 * 1e-9;
    days as f64 + second_of_day / SECONDS_PER_DAY
}

/// Inverse of [`mjd2000_from_datetime`], rounded to the microsecond
pub fn datetime_from_mjd2000(mjd: f64) -> SarResult<DateTime<Utc>> {
    if !mjd.is_finite() {
        return Err(SarError::InvalidFormat(format!("Invalid MJD-2000 time: {}", mjd)));
    }

    let days = mjd.floor();
    let micros_of_day = ((mjd - days) * SECONDS_PER_DAY * 1e6).round() as i64;
    let seconds = days as i64 * 86_400 + micros_of_day.div_euclid(1_000_000) + MJD2000_EPOCH_UNIX_SECONDS;
    let nanos = (micros_of_day.rem_euclid(1_000_000) * 1_000) as u32;

    Utc.timestamp_opt(seconds, nanos)
        .single()
        .ok_or_else(|| SarError::InvalidFormat(format!("MJD-2000 time out of range: {}", mjd)))
}

/// Conversion from product orbit metadata to the geocoding orbit store
pub struct OrbitReader;

impl OrbitReader {
    /// Metadata state vectors with times in MJD-2000 days
    pub fn to_orbit_state_vectors(orbit: &OrbitData) -> Vec<OrbitStateVector> {
        orbit
            .state_vectors
            .iter()
            .map(|sv| {
                OrbitStateVector::new(
                    mjd2000_from_datetime(&sv.time),
                    Vector3::from_array(sv.position),
                    Vector3::from_array(sv.velocity),
                )
            })
            .collect()
    }

    /// Build the interpolating orbit store for a product
    pub fn build_orbit(orbit: &OrbitData, config: &GeocodingConfig) -> SarResult<OrbitStateVectors> {
        log::info!(
            "Building orbit store from {} state vectors (reference time {})",
            orbit.state_vectors.len(),
            orbit.reference_time
        );
        let vectors = Self::to_orbit_state_vectors(orbit);
        OrbitStateVectors::with_config(&vectors, config)
    }
}

/// Circular orbit for tests and demos.
///
/// The sensor moves on a circle of radius `radius` in the plane spanned by
/// `u = (1, 0, 0)` and `w = (0, cos i, sin i)`; the orbit angle is
/// `initial_angle + 2 * PI * t / period`.
#[derive(Debug, Clone)]
pub struct SyntheticOrbit {
    pub start_time: DateTime<Utc>,
    pub vector_interval_s: f64,
    pub num_vectors: usize,
    pub radius: f64,
    pub period_s: f64,
    pub inclination_deg: f64,
    pub initial_angle: f64,
}

impl SyntheticOrbit {
    /// Sentinel-1-like orbit (700 km altitude, 98.18 deg inclination)
    pub fn new(start_time: DateTime<Utc>, vector_interval_s: f64, num_vectors: usize) -> Self {
        Self {
            start_time,
            vector_interval_s,
            num_vectors,
            radius: 7_070_000.0,
            period_s: 5940.0,
            inclination_deg: 98.18,
            initial_angle: 0.3,
        }
    }

    fn angular_rate(&self) -> f64 {
        2.0 * PI / self.period_s
    }

    fn plane_axes(&self) -> (Vector3, Vector3, Vector3) {
        let inclination = self.inclination_deg.to_radians();
        let u = Vector3::new(1.0, 0.0, 0.0);
        let w = Vector3::new(0.0, inclination.cos(), inclination.sin());
        let normal = Vector3::new(0.0, -inclination.sin(), inclination.cos());
        (u, w, normal)
    }

    /// Orbit angle `elapsed_s` seconds after the start time
    pub fn angle_at(&self, elapsed_s: f64) -> f64 {
        self.initial_angle + self.angular_rate() * elapsed_s
    }

    /// Seconds after the start time at which the sensor reaches `angle`
    pub fn elapsed_at_angle(&self, angle: f64) -> f64 {
        (angle - self.initial_angle) / self.angular_rate()
    }

    /// Exact position and velocity `elapsed_s` seconds after the start time
    pub fn state_at(&self, elapsed_s: f64) -> (Vector3, Vector3) {
        let (u, w, _) = self.plane_axes();
        let angle = self.angle_at(elapsed_s);
        let speed = self.radius * self.angular_rate();

        let position = (u * angle.cos() + w * angle.sin()) * self.radius;
        let velocity = (u * -angle.sin() + w * angle.cos()) * speed;
        (position, velocity)
    }

    /// Point at distance `earth_radius` from the centre, broadside to the
    /// orbit at `angle` and `look_offset` radians off the orbital plane.
    /// Its zero-Doppler time is exactly `elapsed_at_angle(angle)`.
    pub fn ground_point(&self, angle: f64, look_offset: f64, earth_radius: f64) -> Vector3 {
        let (u, w, normal) = self.plane_axes();
        let in_plane = u * angle.cos() + w * angle.sin();
        (in_plane * look_offset.cos() + normal * look_offset.sin()) * earth_radius
    }

    /// Time of the state vector `elapsed_s` seconds after the start, in MJD-2000 days
    pub fn mjd_at(&self, elapsed_s: f64) -> f64 {
        mjd2000_from_datetime(&self.start_time) + elapsed_s / SECONDS_PER_DAY
    }

    /// State vectors as they would come from product metadata
    pub fn orbit_data(&self) -> OrbitData {
        let state_vectors = (0..self.num_vectors)
            .map(|i| {
                let elapsed = i as f64 * self.vector_interval_s;
                let (position, velocity) = self.state_at(elapsed);
                StateVector {
                    time: self.start_time + chrono::Duration::microseconds((elapsed * 1e6).round() as i64),
                    position: position.to_array(),
                    velocity: velocity.to_array(),
                }
            })
            .collect();

        OrbitData {
            state_vectors,
            reference_time: self.start_time,
        }
    }

    /// State vectors directly in MJD-2000 days
    pub fn state_vectors(&self) -> Vec<OrbitStateVector> {
        (0..self.num_vectors)
            .map(|i| {
                let elapsed = i as f64 * self.vector_interval_s;
                let (position, velocity) = self.state_at(elapsed);
                OrbitStateVector::new(self.mjd_at(elapsed), position, velocity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mjd2000_epoch() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(mjd2000_from_datetime(&epoch), 0.0);

        let noon = Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(mjd2000_from_datetime(&noon), 6999.5);

        let before = Utc.with_ymd_and_hms(1999, 12, 31, 18, 0, 0).unwrap();
        assert_eq!(mjd2000_from_datetime(&before), -0.25);
    }

    #[test]
    fn test_mjd2000_round_trip() {
        let time = Utc.with_ymd_and_hms(2020, 1, 3, 17, 8, 15).unwrap() + chrono::Duration::microseconds(123_456);
        let mjd = mjd2000_from_datetime(&time);
        let back = datetime_from_mjd2000(mjd).unwrap();
        assert_eq!(back, time);

        assert!(datetime_from_mjd2000(f64::NAN).is_err());
    }

    #[test]
    fn test_synthetic_orbit_is_circular() {
        let start = Utc.with_ymd_and_hms(2020, 1, 3, 17, 0, 0).unwrap();
        let orbit = SyntheticOrbit::new(start, 10.0, 12);

        for sv in orbit.state_vectors() {
            assert!((sv.position.magnitude() - orbit.radius).abs() < 1e-6);
            assert!(sv.position.dot(&sv.velocity).abs() < 1e-3);
        }

        let data = orbit.orbit_data();
        assert_eq!(data.state_vectors.len(), 12);
        let store = OrbitReader::build_orbit(&data, &GeocodingConfig::default()).unwrap();
        assert!((store.mean_dt() * SECONDS_PER_DAY - 10.0).abs() < 1e-6);
    }
}
