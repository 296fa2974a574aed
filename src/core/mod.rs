//! Core geocoding modules

pub mod config;
pub mod doppler;
pub mod geodesy;
pub mod incidence;
pub mod orbit;
pub mod range;
pub mod terrain_correction;
pub mod vector;

// Re-export main types
pub use config::{GeocodingConfig, ZeroDopplerMethod};
pub use doppler::{
    compute_slant_range, doppler_frequency, zero_doppler_time_bisection, zero_doppler_time_newton,
    zero_doppler_time_with_orbit, ZeroDopplerSolver,
};
pub use geodesy::{geo_to_xyz_wgs84, pixel_spacing_in_degree, pixel_spacing_in_meter, xyz_to_geo_wgs84, GeoPos};
pub use incidence::{
    compute_local_incidence_angle, compute_local_incidence_angle_with_dem, ElevationModel, Georeferencing,
    LocalGeometry, LocalIncidenceAngles,
};
pub use orbit::{OrbitStateVector, OrbitStateVectors, PositionVelocity, SensorTrack};
pub use range::{
    compute_extended_range_index, compute_ground_range, compute_range_index, polynomial_value, RangeGeometry,
    SrgrCoefficientList,
};
pub use terrain_correction::{GeocodedPixel, GeocodingGrid, RangeDopplerParams, TerrainCorrector};
pub use vector::Vector3;
