use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel returned by the zero-Doppler solvers when the ground point is not
/// imaged within the available orbit / line span.
pub const NON_VALID_ZERO_DOPPLER_TIME: f64 = -99999.0;

/// Sentinel range index for ground points outside the valid range of an image.
pub const NON_VALID_RANGE_INDEX: f64 = -1.0;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Seconds per day, used to move between MJD days and seconds
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Orbit state vector as delivered by product metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVector {
    pub time: DateTime<Utc>,
    pub position: [f64; 3],  // [x, y, z] in meters
    pub velocity: [f64; 3],  // [vx, vy, vz] in m/s
}

/// Orbit information attached to a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitData {
    pub state_vectors: Vec<StateVector>,
    pub reference_time: DateTime<Utc>,
}

/// Geospatial transformation parameters (GDAL order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Map coordinates of grid node (col, row)
    pub fn pixel_to_map(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Fractional (col, row) of a map coordinate; rotation terms are ignored
    pub fn map_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.top_left_x) / self.pixel_width;
        let row = (y - self.top_left_y) / self.pixel_height;
        (col, row)
    }
}

/// Error types for SAR geocoding
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("Insufficient orbit data: {available} usable state vector(s), at least 2 required")]
    InsufficientOrbitData { available: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geotransform_round_trip() {
        let gt = GeoTransform {
            top_left_x: 10.0,
            pixel_width: 0.5,
            rotation_x: 0.0,
            top_left_y: 50.0,
            rotation_y: 0.0,
            pixel_height: -0.25,
        };

        let (x, y) = gt.pixel_to_map(4.0, 8.0);
        assert_eq!((x, y), (12.0, 48.0));

        let (col, row) = gt.map_to_pixel(x, y);
        assert!((col - 4.0).abs() < 1e-12);
        assert!((row - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_messages() {
        let err = SarError::InsufficientOrbitData { available: 1 };
        assert_eq!(
            err.to_string(),
            "Insufficient orbit data: 1 usable state vector(s), at least 2 required"
        );
    }
}
