use crate::types::NON_VALID_RANGE_INDEX;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Upper bound on ground-range bisection steps; an f64 bracket collapses well
/// before this
const MAX_GROUND_RANGE_STEPS: usize = 128;

/// Ground-range to slant-range polynomial valid from `time_mjd` onwards.
///
/// `slant = sum(coefficients[k] * ground^k)`, evaluated on the absolute ground
/// range; `ground_range_origin` is the ground range of the first pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrgrCoefficientList {
    pub time_mjd: f64,
    pub ground_range_origin: f64,
    pub coefficients: Vec<f64>,
}

impl SrgrCoefficientList {
    pub fn new(time_mjd: f64, ground_range_origin: f64, coefficients: Vec<f64>) -> Self {
        Self {
            time_mjd,
            ground_range_origin,
            coefficients,
        }
    }
}

/// Evaluate `sum(coefficients[k] * x^k)` with Horner's scheme
pub fn polynomial_value<T: Float>(coefficients: &[T], x: T) -> T {
    coefficients
        .iter()
        .rev()
        .fold(T::zero(), |acc, &c| acc * x + c)
}

/// Invert the SRGR polynomial for `slant_range` over
/// `[origin, origin + width * spacing]`.
///
/// Returns `None` when the slant range is outside the polynomial's values at
/// the bracket ends.
pub fn compute_ground_range(
    source_image_width: usize,
    range_spacing: f64,
    slant_range: f64,
    coefficients: &[f64],
    ground_range_origin: f64,
) -> Option<f64> {
    let mut lower = ground_range_origin;
    let mut upper = ground_range_origin + source_image_width as f64 * range_spacing;

    let lower_slant = polynomial_value(coefficients, lower);
    let upper_slant = polynomial_value(coefficients, upper);
    if slant_range < lower_slant || slant_range > upper_slant {
        return None;
    }
    if slant_range == lower_slant {
        return Some(lower);
    }
    if slant_range == upper_slant {
        return Some(upper);
    }

    for _ in 0..MAX_GROUND_RANGE_STEPS {
        let mid = 0.5 * (lower + upper);
        if mid <= lower || mid >= upper {
            return Some(mid);
        }

        let mid_slant = polynomial_value(coefficients, mid);
        if mid_slant < slant_range {
            lower = mid;
        } else if mid_slant > slant_range {
            upper = mid;
        } else {
            return Some(mid);
        }
    }

    Some(0.5 * (lower + upper))
}

/// Index of the last set whose time is not after `time`, so that
/// `list[idx]` and `list[idx + 1]` bracket it
fn bracketing_index(time: f64, srgr_list: &[SrgrCoefficientList]) -> usize {
    let mut idx = 0;
    for (i, srgr) in srgr_list.iter().enumerate() {
        if time >= srgr.time_mjd {
            idx = i;
        } else {
            break;
        }
    }
    if idx == srgr_list.len() - 1 {
        idx = idx.saturating_sub(1);
    }
    idx
}

/// Linear blend of two coefficient sets; missing trailing terms count as zero
fn interpolate_coefficients(lo: &SrgrCoefficientList, hi: &SrgrCoefficientList, mu: f64) -> Vec<f64> {
    let n = lo.coefficients.len().max(hi.coefficients.len());
    (0..n)
        .map(|k| {
            let c0 = lo.coefficients.get(k).copied().unwrap_or(0.0);
            let c1 = hi.coefficients.get(k).copied().unwrap_or(0.0);
            (1.0 - mu) * c0 + mu * c1
        })
        .collect()
}

/// Coefficients and ground range origin in effect at `time`; a single set or
/// a boundary set is borrowed as-is
fn coefficients_at(time: f64, srgr_list: &[SrgrCoefficientList], extend: bool) -> Option<(Cow<'_, [f64]>, f64)> {
    let first = srgr_list.first()?;
    if srgr_list.len() == 1 {
        return Some((Cow::Borrowed(first.coefficients.as_slice()), first.ground_range_origin));
    }

    if extend {
        let last = &srgr_list[srgr_list.len() - 1];
        if time < first.time_mjd {
            return Some((Cow::Borrowed(first.coefficients.as_slice()), first.ground_range_origin));
        }
        if time > last.time_mjd {
            return Some((Cow::Borrowed(last.coefficients.as_slice()), last.ground_range_origin));
        }
    }

    let idx = bracketing_index(time, srgr_list);
    let lo = &srgr_list[idx];
    let hi = &srgr_list[idx + 1];
    let span = hi.time_mjd - lo.time_mjd;
    let mu = if span != 0.0 { (time - lo.time_mjd) / span } else { 0.0 };

    Some((Cow::Owned(interpolate_coefficients(lo, hi, mu)), lo.ground_range_origin))
}

#[allow(clippy::too_many_arguments)]
fn range_index(
    extend: bool,
    srgr_flag: bool,
    source_image_width: usize,
    first_line_time: f64,
    last_line_time: f64,
    range_spacing: f64,
    zero_doppler_time: f64,
    slant_range: f64,
    near_edge_slant_range: f64,
    srgr_list: &[SrgrCoefficientList],
) -> f64 {
    let t_min = first_line_time.min(last_line_time);
    let t_max = first_line_time.max(last_line_time);
    if !(zero_doppler_time >= t_min && zero_doppler_time <= t_max) {
        return NON_VALID_RANGE_INDEX;
    }

    if !srgr_flag {
        return (slant_range - near_edge_slant_range) / range_spacing;
    }

    let (coefficients, origin) = match coefficients_at(zero_doppler_time, srgr_list, extend) {
        Some(c) => c,
        None => return NON_VALID_RANGE_INDEX,
    };

    match compute_ground_range(source_image_width, range_spacing, slant_range, &*coefficients, origin) {
        Some(ground_range) => (ground_range - origin) / range_spacing,
        None => NON_VALID_RANGE_INDEX,
    }
}

/// Range index of a ground point in a slant-range (`srgr_flag == false`) or
/// ground-range image. `NON_VALID_RANGE_INDEX` marks points outside the image.
#[allow(clippy::too_many_arguments)]
pub fn compute_range_index(
    srgr_flag: bool,
    source_image_width: usize,
    first_line_time: f64,
    last_line_time: f64,
    range_spacing: f64,
    zero_doppler_time: f64,
    slant_range: f64,
    near_edge_slant_range: f64,
    srgr_list: &[SrgrCoefficientList],
) -> f64 {
    range_index(
        false,
        srgr_flag,
        source_image_width,
        first_line_time,
        last_line_time,
        range_spacing,
        zero_doppler_time,
        slant_range,
        near_edge_slant_range,
        srgr_list,
    )
}

/// As [`compute_range_index`], but times before the first or after the last
/// SRGR set use that boundary polynomial unchanged
#[allow(clippy::too_many_arguments)]
pub fn compute_extended_range_index(
    srgr_flag: bool,
    source_image_width: usize,
    first_line_time: f64,
    last_line_time: f64,
    range_spacing: f64,
    zero_doppler_time: f64,
    slant_range: f64,
    near_edge_slant_range: f64,
    srgr_list: &[SrgrCoefficientList],
) -> f64 {
    range_index(
        true,
        srgr_flag,
        source_image_width,
        first_line_time,
        last_line_time,
        range_spacing,
        zero_doppler_time,
        slant_range,
        near_edge_slant_range,
        srgr_list,
    )
}

/// Image geometry needed to turn (zero-Doppler time, slant range) into pixel
/// coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeGeometry {
    pub srgr_flag: bool,
    pub source_image_width: usize,
    pub source_image_height: usize,
    /// First line time (MJD days)
    pub first_line_time: f64,
    /// Line time interval (days)
    pub line_time_interval: f64,
    /// Range pixel spacing (m)
    pub range_spacing: f64,
    /// Slant range to the first pixel (m)
    pub near_edge_slant_range: f64,
    pub srgr_coefficients: Vec<SrgrCoefficientList>,
}

impl RangeGeometry {
    pub fn last_line_time(&self) -> f64 {
        self.first_line_time
            + self.source_image_height.saturating_sub(1) as f64 * self.line_time_interval
    }

    pub fn range_index(&self, zero_doppler_time: f64, slant_range: f64) -> f64 {
        compute_range_index(
            self.srgr_flag,
            self.source_image_width,
            self.first_line_time,
            self.last_line_time(),
            self.range_spacing,
            zero_doppler_time,
            slant_range,
            self.near_edge_slant_range,
            &self.srgr_coefficients,
        )
    }

    pub fn extended_range_index(&self, zero_doppler_time: f64, slant_range: f64) -> f64 {
        compute_extended_range_index(
            self.srgr_flag,
            self.source_image_width,
            self.first_line_time,
            self.last_line_time(),
            self.range_spacing,
            zero_doppler_time,
            slant_range,
            self.near_edge_slant_range,
            &self.srgr_coefficients,
        )
    }

    /// Fractional line of a zero-Doppler time
    pub fn azimuth_index(&self, zero_doppler_time: f64) -> f64 {
        (zero_doppler_time - self.first_line_time) / self.line_time_interval
    }

    /// True when (range, azimuth) falls inside the source image
    pub fn contains(&self, range_index: f64, azimuth_index: f64) -> bool {
        range_index >= 0.0
            && azimuth_index >= 0.0
            && range_index <= (self.source_image_width.saturating_sub(1)) as f64
            && azimuth_index <= (self.source_image_height.saturating_sub(1)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_value() {
        assert_eq!(polynomial_value(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(polynomial_value::<f32>(&[], 5.0), 0.0);
        assert_eq!(polynomial_value(&[4.0f32], 100.0), 4.0);
    }

    #[test]
    fn test_identity_polynomial() {
        let srgr = vec![SrgrCoefficientList::new(0.0, 0.0, vec![0.0, 1.0])];
        let index = compute_range_index(true, 100, 0.0, 1.0, 1.0, 0.5, 42.0, 0.0, &srgr);
        assert!((index - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_ground_range_outside_polynomial() {
        let coefficients = [800_000.0, 0.5];
        assert_eq!(compute_ground_range(100, 10.0, 799_999.0, &coefficients, 0.0), None);
        assert_eq!(compute_ground_range(100, 10.0, 800_501.0, &coefficients, 0.0), None);
        assert_eq!(compute_ground_range(100, 10.0, 800_500.0, &coefficients, 0.0), Some(1000.0));
    }

    #[test]
    fn test_slant_range_image() {
        let index = compute_range_index(false, 100, 1.0, 2.0, 2.5, 1.5, 850_010.0, 850_000.0, &[]);
        assert_eq!(index, 4.0);

        // Line times given in descending order
        let index = compute_range_index(false, 100, 2.0, 1.0, 2.5, 1.5, 850_010.0, 850_000.0, &[]);
        assert_eq!(index, 4.0);
    }

    #[test]
    fn test_time_outside_lines() {
        let srgr = vec![SrgrCoefficientList::new(0.0, 0.0, vec![0.0, 1.0])];
        assert_eq!(compute_range_index(true, 100, 1.0, 2.0, 1.0, 0.999, 42.0, 0.0, &srgr), -1.0);
        assert_eq!(compute_range_index(false, 100, 1.0, 2.0, 1.0, 2.001, 42.0, 0.0, &srgr), -1.0);
        // Bounds are inclusive
        assert_ne!(compute_range_index(false, 100, 1.0, 2.0, 1.0, 2.0, 42.0, 0.0, &srgr), -1.0);
    }

    #[test]
    fn test_coefficients_interpolated_between_sets() {
        let srgr = vec![
            SrgrCoefficientList::new(10.0, 0.0, vec![0.0, 1.0]),
            SrgrCoefficientList::new(20.0, 0.0, vec![10.0, 1.0]),
        ];

        // Halfway: slant = 5 + g
        let index = compute_range_index(true, 100, 10.0, 20.0, 1.0, 15.0, 47.0, 0.0, &srgr);
        assert!((index - 42.0).abs() < 1e-9);

        // Missing higher order terms are zero
        let uneven = vec![
            SrgrCoefficientList::new(10.0, 0.0, vec![0.0, 1.0, 0.002]),
            SrgrCoefficientList::new(20.0, 0.0, vec![0.0, 1.0]),
        ];
        let (coefficients, _) = coefficients_at(15.0, &uneven, false).unwrap();
        assert_eq!(&*coefficients, &[0.0, 1.0, 0.001][..]);
    }

    #[test]
    fn test_extended_range_uses_boundary_sets() {
        let srgr = vec![
            SrgrCoefficientList::new(10.0, 0.0, vec![0.0, 1.0]),
            SrgrCoefficientList::new(20.0, 0.0, vec![10.0, 1.0]),
        ];

        let before = compute_extended_range_index(true, 100, 0.0, 30.0, 1.0, 5.0, 42.0, 0.0, &srgr);
        assert!((before - 42.0).abs() < 1e-9);

        let after = compute_extended_range_index(true, 100, 0.0, 30.0, 1.0, 25.0, 52.0, 0.0, &srgr);
        assert!((after - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_and_single_sets_are_borrowed() {
        let srgr = vec![
            SrgrCoefficientList::new(10.0, 0.0, vec![0.0, 1.0]),
            SrgrCoefficientList::new(20.0, 0.0, vec![10.0, 1.0]),
        ];

        assert!(matches!(coefficients_at(5.0, &srgr, true), Some((Cow::Borrowed(_), _))));
        assert!(matches!(coefficients_at(25.0, &srgr, true), Some((Cow::Borrowed(_), _))));
        assert!(matches!(coefficients_at(15.0, &srgr, true), Some((Cow::Owned(_), _))));
        assert!(matches!(coefficients_at(99.0, &srgr[..1], false), Some((Cow::Borrowed(_), _))));
        assert!(coefficients_at(15.0, &[], false).is_none());
    }

    #[test]
    fn test_range_geometry_indices() {
        let geometry = RangeGeometry {
            srgr_flag: false,
            source_image_width: 200,
            source_image_height: 101,
            first_line_time: 100.0,
            line_time_interval: 0.5,
            range_spacing: 2.0,
            near_edge_slant_range: 800_000.0,
            srgr_coefficients: Vec::new(),
        };

        assert_eq!(geometry.last_line_time(), 150.0);
        assert_eq!(geometry.azimuth_index(110.25), 20.5);
        assert_eq!(geometry.range_index(120.0, 800_100.0), 50.0);
        assert_eq!(geometry.range_index(151.0, 800_100.0), -1.0);
        assert!(geometry.contains(50.0, 20.5));
        assert!(!geometry.contains(199.5, 20.5));
    }
}
