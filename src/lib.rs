//! sargeo: Range-Doppler geocoding core for SAR terrain correction
//!
//! Orbit interpolation, zero-Doppler time search, slant/ground range to
//! image column conversion and local incidence angles from a DEM.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    GeoTransform, OrbitData, SarError, SarResult, StateVector, NON_VALID_RANGE_INDEX,
    NON_VALID_ZERO_DOPPLER_TIME,
};

pub use crate::core::{
    GeocodingConfig, OrbitStateVector, OrbitStateVectors, TerrainCorrector, Vector3, ZeroDopplerMethod,
    ZeroDopplerSolver,
};
pub use io::{DemGrid, OrbitReader};
