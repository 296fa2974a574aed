use crate::core::config::{GeocodingConfig, ZeroDopplerMethod};
use crate::core::orbit::{OrbitStateVectors, SensorTrack};
use crate::core::vector::Vector3;
use crate::types::NON_VALID_ZERO_DOPPLER_TIME;

/// Upper bound on bisection steps, independent of the line interval
const MAX_BISECTION_STEPS: usize = 128;

/// Doppler frequency (Hz) of `earth_point` seen from a sensor at
/// `sensor_position` moving with `sensor_velocity`
pub fn doppler_frequency(
    earth_point: &Vector3,
    sensor_position: &Vector3,
    sensor_velocity: &Vector3,
    wavelength: f64,
) -> f64 {
    let look = *earth_point - *sensor_position;
    2.0 * sensor_velocity.dot(&look) / (look.magnitude() * wavelength)
}

/// Slant range from the sensor at `time` to `earth_point`, with the sensor position
pub fn compute_slant_range(
    time: f64,
    orbit: &OrbitStateVectors,
    earth_point: &Vector3,
) -> (f64, Vector3) {
    let sensor_position = orbit.position(time);
    (sensor_position.distance(earth_point), sensor_position)
}

/// Zero-Doppler time search.
///
/// All solve methods return `NON_VALID_ZERO_DOPPLER_TIME` when the ground
/// point is not imaged inside the searched span.
#[derive(Debug, Clone)]
pub struct ZeroDopplerSolver {
    /// Radar wavelength (m)
    pub wavelength: f64,
    /// Azimuth line time interval (days)
    pub line_time_interval: f64,
    pub method: ZeroDopplerMethod,
    pub doppler_threshold_hz: f64,
    pub newton_tolerance_hz: f64,
    pub newton_max_iterations: usize,
}

impl ZeroDopplerSolver {
    pub fn new(wavelength: f64, line_time_interval: f64, config: &GeocodingConfig) -> Self {
        Self {
            wavelength,
            line_time_interval,
            method: config.zero_doppler_method,
            doppler_threshold_hz: config.doppler_threshold_hz,
            newton_tolerance_hz: config.newton_tolerance_hz,
            newton_max_iterations: config.newton_max_iterations,
        }
    }

    pub fn with_method(mut self, method: ZeroDopplerMethod) -> Self {
        self.method = method;
        self
    }

    /// Doppler frequency of `earth_point` at orbit time `time`
    pub fn doppler_at(&self, time: f64, orbit: &OrbitStateVectors, earth_point: &Vector3) -> f64 {
        let pv = orbit.position_velocity(time);
        doppler_frequency(earth_point, &pv.position, &pv.velocity, self.wavelength)
    }

    /// Search a per-line sensor track
    pub fn solve_with_track(&self, earth_point: &Vector3, track: &SensorTrack) -> f64 {
        self.solve_with_lines(
            earth_point,
            track.first_line_time,
            track.line_time_interval,
            &track.positions,
            &track.velocities,
        )
    }

    /// Search borrowed per-line sensor states. Only the lines present in
    /// both slices are searched.
    pub fn solve_with_lines(
        &self,
        earth_point: &Vector3,
        first_line_time: f64,
        line_time_interval: f64,
        positions: &[Vector3],
        velocities: &[Vector3],
    ) -> f64 {
        let lines = LineStates {
            first_line_time,
            line_time_interval,
            positions,
            velocities,
        };
        match self.method {
            ZeroDopplerMethod::Bisection => self.bisect_lines(earth_point, &lines),
            ZeroDopplerMethod::Newton => self.newton_lines(earth_point, &lines),
        }
    }

    /// Search the continuous orbit time span of the store
    pub fn solve_with_orbit(&self, earth_point: &Vector3, orbit: &OrbitStateVectors) -> f64 {
        match self.method {
            ZeroDopplerMethod::Bisection => self.bisect_orbit(earth_point, orbit),
            ZeroDopplerMethod::Newton => self.newton_orbit(earth_point, orbit),
        }
    }

    fn line_frequency(&self, earth_point: &Vector3, lines: &LineStates<'_>, line: usize) -> f64 {
        doppler_frequency(
            earth_point,
            &lines.positions[line],
            &lines.velocities[line],
            self.wavelength,
        )
    }

    /// Check the outermost lines. `Ok` carries a final answer, `Err` the two
    /// bracketing frequencies when the search has to continue.
    fn check_track_ends(&self, earth_point: &Vector3, lines: &LineStates<'_>) -> Result<f64, (f64, f64)> {
        let num_lines = lines.len();
        if num_lines == 0 {
            return Ok(NON_VALID_ZERO_DOPPLER_TIME);
        }

        let f_first = self.line_frequency(earth_point, lines, 0);
        if f_first.abs() < self.doppler_threshold_hz {
            return Ok(lines.first_line_time);
        }
        if num_lines == 1 {
            return Ok(NON_VALID_ZERO_DOPPLER_TIME);
        }

        let last = num_lines - 1;
        let f_last = self.line_frequency(earth_point, lines, last);
        if f_last.abs() < self.doppler_threshold_hz {
            return Ok(lines.line_time(last as f64));
        }

        if f_first * f_last > 0.0 || !(f_first * f_last).is_finite() {
            return Ok(NON_VALID_ZERO_DOPPLER_TIME);
        }
        Err((f_first, f_last))
    }

    fn bisect_lines(&self, earth_point: &Vector3, lines: &LineStates<'_>) -> f64 {
        let (mut f_lo, mut f_hi) = match self.check_track_ends(earth_point, lines) {
            Ok(time) => return time,
            Err(bracket) => bracket,
        };

        let mut lo = 0usize;
        let mut hi = lines.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            let f_mid = self.line_frequency(earth_point, lines, mid);
            if f_mid * f_lo > 0.0 {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
                f_hi = f_mid;
            }
        }

        let line = lo as f64 - f_lo * (hi - lo) as f64 / (f_hi - f_lo);
        lines.line_time(line)
    }

    /// Newton on line indices; once the step drops to two lines the zero is
    /// bracketed by neighbouring lines and interpolated linearly
    fn newton_lines(&self, earth_point: &Vector3, lines: &LineStates<'_>) -> f64 {
        let (f_first, _) = match self.check_track_ends(earth_point, lines) {
            Ok(time) => return time,
            Err(bracket) => bracket,
        };

        let last = lines.len() - 1;
        let mut line = last as f64 / 2.0;

        for _ in 0..self.newton_max_iterations {
            let i = (line.floor() as usize).min(last - 1);
            let f_i = self.line_frequency(earth_point, lines, i);
            let derivative = self.line_frequency(earth_point, lines, i + 1) - f_i;
            if derivative == 0.0 || !derivative.is_finite() {
                break;
            }

            let step = -f_i / derivative;
            let next = (i as f64 + step).clamp(0.0, last as f64);
            if step.abs() <= 2.0 {
                return self.interpolate_near_line(earth_point, lines, next, f_first);
            }
            line = next;
        }

        log::debug!("Line Newton did not settle, falling back to bisection");
        self.bisect_lines(earth_point, lines)
    }

    /// Walk from `line` to the adjacent pair of lines whose frequencies change
    /// sign and interpolate the zero between them
    fn interpolate_near_line(
        &self,
        earth_point: &Vector3,
        lines: &LineStates<'_>,
        line: f64,
        f_first: f64,
    ) -> f64 {
        let last = lines.len() - 1;
        let mut j = (line.floor() as usize).min(last - 1);

        for _ in 0..=last {
            let f_j = self.line_frequency(earth_point, lines, j);
            let f_next = self.line_frequency(earth_point, lines, j + 1);
            if f_j * f_next <= 0.0 {
                if f_next == f_j {
                    return lines.line_time(j as f64);
                }
                let zero = j as f64 - f_j / (f_next - f_j);
                return lines.line_time(zero);
            }
            // Frequencies on the near side share the sign of the first line
            if f_j * f_first > 0.0 {
                if j + 1 >= last {
                    break;
                }
                j += 1;
            } else {
                if j == 0 {
                    break;
                }
                j -= 1;
            }
        }

        self.bisect_lines(earth_point, lines)
    }

    fn bisect_orbit(&self, earth_point: &Vector3, orbit: &OrbitStateVectors) -> f64 {
        let vectors = orbit.vectors();
        let sv_frequency = |i: usize| {
            doppler_frequency(
                earth_point,
                &vectors[i].position,
                &vectors[i].velocity,
                self.wavelength,
            )
        };

        let last = vectors.len() - 1;
        let f_first = sv_frequency(0);
        if f_first.abs() < self.doppler_threshold_hz {
            return vectors[0].time_mjd;
        }
        let f_last = sv_frequency(last);
        if f_last.abs() < self.doppler_threshold_hz {
            return vectors[last].time_mjd;
        }
        if f_first * f_last > 0.0 || !(f_first * f_last).is_finite() {
            return NON_VALID_ZERO_DOPPLER_TIME;
        }

        // First pair of state vectors around the zero crossing
        let mut bracket = None;
        let mut f_prev = f_first;
        for i in 1..=last {
            let f_i = if i == last { f_last } else { sv_frequency(i) };
            if f_prev * f_i <= 0.0 {
                bracket = Some((i - 1, f_prev, f_i));
                break;
            }
            f_prev = f_i;
        }
        let (i_lo, mut f_lo, mut f_hi) = match bracket {
            Some(b) => b,
            None => return NON_VALID_ZERO_DOPPLER_TIME,
        };

        let mut lo = vectors[i_lo].time_mjd;
        let mut hi = vectors[i_lo + 1].time_mjd;
        if f_lo == 0.0 {
            return lo;
        }

        let interval = self.line_time_interval.abs();
        let max_steps = if interval > 0.0 {
            (((hi - lo) / interval) as usize + 1).min(MAX_BISECTION_STEPS)
        } else {
            MAX_BISECTION_STEPS
        };

        let mut steps = 0;
        while hi - lo > interval && steps < max_steps {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            let f_mid = self.doppler_at(mid, orbit, earth_point);
            if f_mid * f_lo > 0.0 {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
                f_hi = f_mid;
            }
            steps += 1;
        }

        lo - f_lo * (hi - lo) / (f_hi - f_lo)
    }

    fn newton_orbit(&self, earth_point: &Vector3, orbit: &OrbitStateVectors) -> f64 {
        let first_sv = orbit.first();
        let last_sv = orbit.last();
        let f_first = doppler_frequency(earth_point, &first_sv.position, &first_sv.velocity, self.wavelength);
        let f_last = doppler_frequency(earth_point, &last_sv.position, &last_sv.velocity, self.wavelength);
        if f_first == 0.0 {
            return first_sv.time_mjd;
        }
        if f_last == 0.0 {
            return last_sv.time_mjd;
        }
        if f_first * f_last > 0.0 || !(f_first * f_last).is_finite() {
            return NON_VALID_ZERO_DOPPLER_TIME;
        }

        let first = first_sv.time_mjd;
        let last = last_sv.time_mjd;
        let delta = if self.line_time_interval != 0.0 {
            self.line_time_interval
        } else {
            orbit.mean_dt() * 1e-4
        };

        let mut time = 0.5 * (first + last);
        let mut f = self.doppler_at(time, orbit, earth_point);
        let mut iterations = 0;
        while f.abs() > self.newton_tolerance_hz {
            if iterations == self.newton_max_iterations {
                log::debug!(
                    "Newton zero-Doppler search hit the {} iteration cap, |f| = {:.3e} Hz",
                    iterations,
                    f.abs()
                );
                break;
            }

            let derivative = (self.doppler_at(time + delta, orbit, earth_point) - f) / delta;
            if derivative == 0.0 || !derivative.is_finite() {
                log::debug!(
                    "Newton zero-Doppler search stopped after {} iteration(s) on a degenerate derivative, |f| = {:.3e} Hz",
                    iterations,
                    f.abs()
                );
                break;
            }

            time = (time - f / derivative).clamp(first, last);
            f = self.doppler_at(time, orbit, earth_point);
            iterations += 1;
        }
        time
    }
}

/// Borrowed per-line sensor states
#[derive(Debug, Clone, Copy)]
struct LineStates<'a> {
    first_line_time: f64,
    line_time_interval: f64,
    positions: &'a [Vector3],
    velocities: &'a [Vector3],
}

impl LineStates<'_> {
    fn len(&self) -> usize {
        self.positions.len().min(self.velocities.len())
    }

    fn line_time(&self, line: f64) -> f64 {
        self.first_line_time + line * self.line_time_interval
    }
}

/// Bisection over a per-line sensor state array with the default 1 Hz threshold
pub fn zero_doppler_time_bisection(
    first_line_time: f64,
    line_time_interval: f64,
    wavelength: f64,
    earth_point: &Vector3,
    sensor_positions: &[Vector3],
    sensor_velocities: &[Vector3],
) -> f64 {
    ZeroDopplerSolver::new(wavelength, line_time_interval, &GeocodingConfig::default())
        .with_method(ZeroDopplerMethod::Bisection)
        .solve_with_lines(
            earth_point,
            first_line_time,
            line_time_interval,
            sensor_positions,
            sensor_velocities,
        )
}

/// Bisection on continuous orbit time
pub fn zero_doppler_time_with_orbit(
    line_time_interval: f64,
    wavelength: f64,
    earth_point: &Vector3,
    orbit: &OrbitStateVectors,
) -> f64 {
    ZeroDopplerSolver::new(wavelength, line_time_interval, &GeocodingConfig::default())
        .with_method(ZeroDopplerMethod::Bisection)
        .solve_with_orbit(earth_point, orbit)
}

/// Newton iteration on continuous orbit time
pub fn zero_doppler_time_newton(
    line_time_interval: f64,
    wavelength: f64,
    earth_point: &Vector3,
    orbit: &OrbitStateVectors,
) -> f64 {
    ZeroDopplerSolver::new(wavelength, line_time_interval, &GeocodingConfig::default())
        .with_method(ZeroDopplerMethod::Newton)
        .solve_with_orbit(earth_point, orbit)
}
