mod common;

use approx::assert_abs_diff_eq;
use sargeo::core::{
    compute_extended_range_index, compute_ground_range, compute_range_index, compute_slant_range,
    polynomial_value, zero_doppler_time_with_orbit, RangeGeometry, SrgrCoefficientList,
};
use sargeo::NON_VALID_RANGE_INDEX;

/// Typical C-band ground range to slant range polynomial
fn srgr_polynomial() -> Vec<f64> {
    vec![830_000.0, 0.55, 2.1e-6, -1.0e-12]
}

#[test]
fn test_identity_polynomial_scenario() {
    common::init_logging();

    let srgr = vec![SrgrCoefficientList::new(7000.0, 0.0, vec![0.0, 1.0])];
    let index = compute_range_index(true, 100, 7000.0, 7000.001, 1.0, 7000.0005, 42.0, 0.0, &srgr);
    assert_abs_diff_eq!(index, 42.0, epsilon = 1e-9);
}

#[test]
fn test_ground_range_round_trip() {
    let coefficients = srgr_polynomial();
    let srgr = vec![SrgrCoefficientList::new(7000.0, 0.0, coefficients.clone())];
    let spacing = 10.0;

    for &ground_range in &[0.0, 1234.5, 87_654.3, 199_999.9, 250_000.0] {
        let slant_range = polynomial_value(&coefficients, ground_range);
        let index = compute_range_index(true, 25_000, 7000.0, 7000.01, spacing, 7000.005, slant_range, 0.0, &srgr);
        assert_abs_diff_eq!(index, ground_range / spacing, epsilon = 1e-6);
    }

    // Beyond the far edge of the image
    let beyond = polynomial_value(&coefficients, 250_010.0);
    assert_eq!(
        compute_range_index(true, 25_000, 7000.0, 7000.01, spacing, 7000.005, beyond, 0.0, &srgr),
        NON_VALID_RANGE_INDEX
    );
    assert_eq!(compute_ground_range(25_000, spacing, beyond, &coefficients, 0.0), None);
}

#[test]
fn test_ground_range_origin_offset() {
    let coefficients = srgr_polynomial();
    let origin = 5_000.0;
    let slant_range = polynomial_value(&coefficients, origin + 1_000.0);

    let ground_range = compute_ground_range(1_000, 5.0, slant_range, &coefficients, origin).unwrap();
    assert_abs_diff_eq!(ground_range, origin + 1_000.0, epsilon = 1e-6);

    let srgr = vec![SrgrCoefficientList::new(7000.0, origin, coefficients)];
    let index = compute_range_index(true, 1_000, 7000.0, 7000.01, 5.0, 7000.005, slant_range, 0.0, &srgr);
    assert_abs_diff_eq!(index, 200.0, epsilon = 1e-6);
}

#[test]
fn test_zero_doppler_time_outside_lines_is_exactly_minus_one() {
    let srgr = vec![SrgrCoefficientList::new(7000.0, 0.0, srgr_polynomial())];

    for &(srgr_flag, time) in &[(false, 6999.9999), (false, 7000.0101), (true, 6999.9999), (true, 7000.0101)] {
        let index = compute_range_index(srgr_flag, 25_000, 7000.0, 7000.01, 10.0, time, 830_500.0, 830_000.0, &srgr);
        assert_eq!(index, -1.0);
        let index = compute_extended_range_index(srgr_flag, 25_000, 7000.0, 7000.01, 10.0, time, 830_500.0, 830_000.0, &srgr);
        assert_eq!(index, -1.0);
    }
}

#[test]
fn test_extended_index_beyond_srgr_span() {
    let early = SrgrCoefficientList::new(7000.002, 0.0, vec![830_000.0, 0.5]);
    let late = SrgrCoefficientList::new(7000.004, 0.0, vec![830_100.0, 0.5]);
    let srgr = vec![early, late];

    // Line window covers times outside the SRGR span
    let (first, last) = (7000.0, 7000.006);

    // Before the first set the extended variant uses it unchanged
    let slant_range = 830_000.0 + 0.5 * 4_000.0;
    let extended = compute_extended_range_index(true, 1_000, first, last, 10.0, 7000.001, slant_range, 0.0, &srgr);
    assert_abs_diff_eq!(extended, 400.0, epsilon = 1e-6);

    // The plain variant extrapolates the coefficients instead: c0 = 829_950
    let plain = compute_range_index(true, 1_000, first, last, 10.0, 7000.001, slant_range, 0.0, &srgr);
    assert_abs_diff_eq!(plain, 410.0, epsilon = 1e-6);

    // After the last set
    let slant_range = 830_100.0 + 0.5 * 4_000.0;
    let extended = compute_extended_range_index(true, 1_000, first, last, 10.0, 7000.005, slant_range, 0.0, &srgr);
    assert_abs_diff_eq!(extended, 400.0, epsilon = 1e-6);
}

#[test]
fn test_slant_range_image_from_orbit() {
    let orbit = common::synthetic_orbit();
    let store = common::orbit_store(&orbit);
    let (point, _) = common::target(&orbit, common::TARGET_ELAPSED_S);

    let time = zero_doppler_time_with_orbit(common::line_time_interval(), common::WAVELENGTH, &point, &store);
    let (slant_range, _) = compute_slant_range(time, &store, &point);

    let geometry = RangeGeometry {
        srgr_flag: false,
        source_image_width: 10_000,
        source_image_height: (60.0 * common::PRF) as usize,
        first_line_time: orbit.mjd_at(50.0),
        line_time_interval: common::line_time_interval(),
        range_spacing: 2.33,
        near_edge_slant_range: slant_range - 2.33 * 4321.0,
        srgr_coefficients: Vec::new(),
    };

    let range_index = geometry.range_index(time, slant_range);
    let azimuth_index = geometry.azimuth_index(time);
    assert_abs_diff_eq!(range_index, 4321.0, epsilon = 1e-6);
    assert_abs_diff_eq!(azimuth_index, (common::TARGET_ELAPSED_S - 50.0) * common::PRF, epsilon = 0.5);
    assert!(geometry.contains(range_index, azimuth_index));
}
