//! Input adapters: in-memory DEM and orbit metadata conversion

pub mod dem;
pub mod orbit;

pub use dem::DemGrid;
pub use orbit::{datetime_from_mjd2000, mjd2000_from_datetime, OrbitReader, SyntheticOrbit};
