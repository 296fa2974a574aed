use crate::core::config::GeocodingConfig;
use crate::core::vector::Vector3;
use crate::types::{SarError, SarResult};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Orbit state vector with time in MJD days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitStateVector {
    pub time_mjd: f64,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl OrbitStateVector {
    pub fn new(time_mjd: f64, position: Vector3, velocity: Vector3) -> Self {
        Self {
            time_mjd,
            position,
            velocity,
        }
    }
}

/// Interpolated sensor state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionVelocity {
    pub position: Vector3,
    pub velocity: Vector3,
}

/// Memo of interpolation results keyed by the exact bits of the query time
#[derive(Debug)]
struct InterpolationCache {
    entries: HashMap<u64, PositionVelocity>,
    max_size: usize,
}

impl InterpolationCache {
    fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
        }
    }

    fn get(&self, time: f64) -> Option<PositionVelocity> {
        self.entries.get(&time.to_bits()).copied()
    }

    fn insert(&mut self, time: f64, value: PositionVelocity) {
        if self.max_size == 0 {
            return;
        }
        if self.entries.len() >= self.max_size {
            // Simple eviction: clear half the cache
            let keys_to_remove: Vec<_> = self
                .entries
                .keys()
                .take(self.entries.len() / 2 + 1)
                .copied()
                .collect();
            for key in keys_to_remove {
                self.entries.remove(&key);
            }
            log::debug!("Orbit interpolation cache evicted, {} entries kept", self.entries.len());
        }
        self.entries.insert(time.to_bits(), value);
    }
}

/// Upper bound on the number of independently locked cache shards
const MAX_CACHE_SHARDS: usize = 16;

/// Memo cache split into independently locked shards, picked by time bits
#[derive(Debug)]
struct ShardedCache {
    shards: Vec<RwLock<InterpolationCache>>,
}

impl ShardedCache {
    /// Total size stays within `capacity`; zero disables caching
    fn new(capacity: usize) -> Self {
        let num_shards = capacity.clamp(1, MAX_CACHE_SHARDS);
        let shards = (0..num_shards)
            .map(|_| RwLock::new(InterpolationCache::new(capacity / num_shards)))
            .collect();
        Self { shards }
    }

    fn shard(&self, time: f64) -> &RwLock<InterpolationCache> {
        let hash = time.to_bits().wrapping_mul(0x9E37_79B9_7F4A_7C15);
        &self.shards[(hash >> 32) as usize % self.shards.len()]
    }

    fn get(&self, time: f64) -> Option<PositionVelocity> {
        self.shard(time).read().ok()?.get(time)
    }

    /// Skipped when the shard is busy or poisoned
    fn insert(&self, time: f64, value: PositionVelocity) {
        if let Ok(mut cache) = self.shard(time).try_write() {
            cache.insert(time, value);
        }
    }

    fn len(&self) -> usize {
        self.shards
            .iter()
            .filter_map(|shard| shard.read().ok().map(|c| c.entries.len()))
            .sum()
    }
}

/// Deduplicated orbit state vectors with memoized Lagrange interpolation.
///
/// The store is shared read-mostly between worker threads; the memo cache is
/// the only mutable part and is split into `RwLock` shards.
#[derive(Debug)]
pub struct OrbitStateVectors {
    vectors: Vec<OrbitStateVector>,
    mean_dt: f64,
    window: usize,
    cache: ShardedCache,
}

impl OrbitStateVectors {
    /// Build the store with the default interpolation settings
    pub fn new(raw_vectors: &[OrbitStateVector]) -> SarResult<Self> {
        Self::with_config(raw_vectors, &GeocodingConfig::default())
    }

    /// Build the store. Vectors whose time does not strictly exceed the last
    /// retained one are dropped; fewer than two survivors is an error.
    pub fn with_config(raw_vectors: &[OrbitStateVector], config: &GeocodingConfig) -> SarResult<Self> {
        let vectors = Self::remove_redundant_vectors(raw_vectors);

        let dropped = raw_vectors.len() - vectors.len();
        if dropped > 0 {
            log::warn!(
                "Dropped {} duplicate or out-of-order orbit state vector(s)",
                dropped
            );
        }

        if vectors.len() < 2 {
            return Err(SarError::InsufficientOrbitData {
                available: vectors.len(),
            });
        }

        let first = vectors[0].time_mjd;
        let last = vectors[vectors.len() - 1].time_mjd;
        let mean_dt = (last - first) / (vectors.len() - 1) as f64;

        log::debug!(
            "Orbit store: {} state vectors, mean spacing {:.3} s",
            vectors.len(),
            mean_dt * crate::types::SECONDS_PER_DAY
        );

        Ok(Self {
            vectors,
            mean_dt,
            window: config.interpolation_window.max(2),
            cache: ShardedCache::new(config.orbit_cache_capacity),
        })
    }

    fn remove_redundant_vectors(raw_vectors: &[OrbitStateVector]) -> Vec<OrbitStateVector> {
        let mut retained: Vec<OrbitStateVector> = Vec::with_capacity(raw_vectors.len());
        for sv in raw_vectors {
            match retained.last() {
                Some(prev) if sv.time_mjd <= prev.time_mjd => continue,
                _ => {
                    if sv.time_mjd.is_finite() {
                        retained.push(*sv);
                    }
                }
            }
        }
        retained
    }

    pub fn vectors(&self) -> &[OrbitStateVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Mean spacing between state vectors (days)
    pub fn mean_dt(&self) -> f64 {
        self.mean_dt
    }

    pub fn first_time(&self) -> f64 {
        self.vectors[0].time_mjd
    }

    pub fn last_time(&self) -> f64 {
        self.vectors[self.vectors.len() - 1].time_mjd
    }

    pub fn first(&self) -> &OrbitStateVector {
        &self.vectors[0]
    }

    pub fn last(&self) -> &OrbitStateVector {
        &self.vectors[self.vectors.len() - 1]
    }

    /// Index range [i0, iN] of the interpolation window for `time`
    fn window_bounds(&self, time: f64) -> (usize, usize) {
        let n = self.vectors.len();
        let nv = self.window;
        if n <= nv {
            return (0, n - 1);
        }

        let estimate = ((time - self.first_time()) / self.mean_dt) as i64;
        let i0 = (estimate - (nv / 2) as i64 + 1).max(0) as usize;
        let i_n = (i0 + nv - 1).min(n - 1);
        let i0 = if i_n < n - 1 { i0 } else { i_n + 1 - nv };
        (i0, i_n)
    }

    /// Lagrange-interpolated position and velocity at `time` (MJD days)
    pub fn position_velocity(&self, time: f64) -> PositionVelocity {
        if let Some(pv) = self.cache.get(time) {
            return pv;
        }

        let pv = self.lagrange_interpolate(time);
        self.cache.insert(time, pv);
        pv
    }

    pub fn position(&self, time: f64) -> Vector3 {
        self.position_velocity(time).position
    }

    /// Sensor speed |V(t)| in m/s
    pub fn velocity_magnitude(&self, time: f64) -> f64 {
        self.position_velocity(time).velocity.magnitude()
    }

    fn lagrange_interpolate(&self, time: f64) -> PositionVelocity {
        let (i0, i_n) = self.window_bounds(time);
        let window = &self.vectors[i0..=i_n];

        let mut position = Vector3::ZERO;
        let mut velocity = Vector3::ZERO;

        for (i, sv_i) in window.iter().enumerate() {
            let mut weight = 1.0;
            for (j, sv_j) in window.iter().enumerate() {
                if i != j {
                    weight *= (time - sv_j.time_mjd) / (sv_i.time_mjd - sv_j.time_mjd);
                }
            }
            position += sv_i.position * weight;
            velocity += sv_i.velocity * weight;
        }

        PositionVelocity { position, velocity }
    }

    /// Number of memoized interpolation results
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// Sensor position and velocity precomputed for every image line
#[derive(Debug, Clone)]
pub struct SensorTrack {
    pub first_line_time: f64,
    pub line_time_interval: f64,
    pub positions: Vec<Vector3>,
    pub velocities: Vec<Vector3>,
}

impl SensorTrack {
    /// Interpolate the orbit at `first_line_time + i * line_time_interval` for
    /// each of the `num_lines` lines
    pub fn new(
        orbit: &OrbitStateVectors,
        first_line_time: f64,
        line_time_interval: f64,
        num_lines: usize,
    ) -> Self {
        log::debug!("Interpolating sensor track for {} lines", num_lines);

        let line_state = |line: usize| orbit.position_velocity(first_line_time + line as f64 * line_time_interval);

        #[cfg(feature = "parallel")]
        let states: Vec<PositionVelocity> = (0..num_lines).into_par_iter().map(line_state).collect();

        #[cfg(not(feature = "parallel"))]
        let states: Vec<PositionVelocity> = (0..num_lines).map(line_state).collect();

        let (positions, velocities) = states
            .into_iter()
            .map(|pv| (pv.position, pv.velocity))
            .unzip();

        Self {
            first_line_time,
            line_time_interval,
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn line_time(&self, line: f64) -> f64 {
        self.first_line_time + line * self.line_time_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_vectors(n: usize) -> Vec<OrbitStateVector> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                OrbitStateVector::new(
                    100.0 + t,
                    Vector3::new(10.0 * t, -2.0 * t, 5.0),
                    Vector3::new(10.0, -2.0, 0.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_redundant_vectors_dropped() {
        let mut raw = linear_vectors(5);
        raw.insert(2, raw[1]);
        raw.push(raw[0]);

        let orbit = OrbitStateVectors::new(&raw).unwrap();
        assert_eq!(orbit.len(), 5);
        assert_eq!(orbit.mean_dt(), 1.0);
    }

    #[test]
    fn test_insufficient_vectors() {
        let raw = linear_vectors(1);
        match OrbitStateVectors::new(&raw) {
            Err(SarError::InsufficientOrbitData { available }) => assert_eq!(available, 1),
            other => panic!("unexpected result: {:?}", other.map(|o| o.len())),
        }

        // Two identical timestamps collapse to one
        let raw = vec![raw[0], raw[0]];
        assert!(OrbitStateVectors::new(&raw).is_err());
    }

    #[test]
    fn test_window_stays_inside_array() {
        let orbit = OrbitStateVectors::new(&linear_vectors(20)).unwrap();

        assert_eq!(orbit.window_bounds(95.0), (0, 7));
        assert_eq!(orbit.window_bounds(100.0), (0, 7));
        assert_eq!(orbit.window_bounds(110.0), (7, 14));
        assert_eq!(orbit.window_bounds(119.0), (12, 19));
        assert_eq!(orbit.window_bounds(150.0), (12, 19));

        let small = OrbitStateVectors::new(&linear_vectors(5)).unwrap();
        assert_eq!(small.window_bounds(102.5), (0, 4));
    }

    #[test]
    fn test_linear_motion_reproduced() {
        let orbit = OrbitStateVectors::new(&linear_vectors(12)).unwrap();
        let pv = orbit.position_velocity(104.25);

        assert!((pv.position.x - 42.5).abs() < 1e-9);
        assert!((pv.position.y + 8.5).abs() < 1e-9);
        assert!((pv.position.z - 5.0).abs() < 1e-9);
        assert!((pv.velocity.x - 10.0).abs() < 1e-9);
        assert!((orbit.velocity_magnitude(104.25) - 104.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_cache_memoizes_and_evicts() {
        let config = GeocodingConfig {
            orbit_cache_capacity: 4,
            ..GeocodingConfig::default()
        };
        let orbit = OrbitStateVectors::with_config(&linear_vectors(10), &config).unwrap();

        let first = orbit.position_velocity(103.5);
        let again = orbit.position_velocity(103.5);
        assert_eq!(first, again);
        assert_eq!(orbit.cached_entries(), 1);

        for i in 0..10 {
            orbit.position_velocity(101.0 + i as f64 * 0.1);
        }
        assert!(orbit.cached_entries() <= 4);
    }

    #[test]
    fn test_cache_shards_respect_capacity() {
        let config = GeocodingConfig {
            orbit_cache_capacity: 100,
            ..GeocodingConfig::default()
        };
        let orbit = OrbitStateVectors::with_config(&linear_vectors(10), &config).unwrap();
        for i in 0..1000 {
            orbit.position_velocity(101.0 + i as f64 * 0.005);
        }
        assert!(orbit.cached_entries() > 0);
        assert!(orbit.cached_entries() <= 100);

        let disabled = GeocodingConfig {
            orbit_cache_capacity: 0,
            ..GeocodingConfig::default()
        };
        let orbit = OrbitStateVectors::with_config(&linear_vectors(10), &disabled).unwrap();
        orbit.position_velocity(103.5);
        assert_eq!(orbit.cached_entries(), 0);
    }

    #[test]
    fn test_sensor_track_lines() {
        let orbit = OrbitStateVectors::new(&linear_vectors(10)).unwrap();
        let track = SensorTrack::new(&orbit, 101.0, 0.5, 7);

        assert_eq!(track.len(), 7);
        assert!((track.positions[2].x - 20.0).abs() < 1e-9);
        assert_eq!(track.line_time(4.0), 103.0);
    }
}
