use crate::core::geodesy::GeoPos;
use crate::core::incidence::{ElevationModel, Georeferencing};
use crate::types::{GeoTransform, SarError, SarResult};
use ndarray::{Array2, ArrayView2};

/// In-memory DEM on a regular lat/lon grid.
///
/// Heights are point samples at the grid nodes; the geotransform maps node
/// (column, row) to (longitude, latitude) in degrees.
#[derive(Debug, Clone)]
pub struct DemGrid {
    heights: Array2<f32>,
    transform: GeoTransform,
    no_data: f32,
}

impl DemGrid {
    pub fn new(heights: Array2<f32>, transform: GeoTransform, no_data: f32) -> SarResult<Self> {
        let (rows, cols) = heights.dim();
        if rows < 2 || cols < 2 {
            return Err(SarError::InvalidFormat(format!(
                "DEM grid must be at least 2x2, got {}x{}",
                rows, cols
            )));
        }
        if transform.pixel_width == 0.0 || transform.pixel_height == 0.0 {
            return Err(SarError::InvalidFormat(
                "DEM geotransform has zero pixel size".to_string(),
            ));
        }

        log::debug!("DEM size: {}x{}", cols, rows);
        log::debug!("DEM geotransform: {:?}", transform);

        Ok(Self {
            heights,
            transform,
            no_data,
        })
    }

    pub fn heights(&self) -> ArrayView2<'_, f32> {
        self.heights.view()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn no_data(&self) -> f32 {
        self.no_data
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.heights.dim()
    }

    /// Height of a node, `None` for no data or outside the grid
    pub fn height_at(&self, row: usize, col: usize) -> Option<f32> {
        self.heights
            .get([row, col])
            .copied()
            .filter(|&h| h != self.no_data)
    }

    /// Bilinear interpolation at fractional (col, row); any no-data corner gives `None`
    fn interpolate(&self, col: f64, row: f64) -> Option<f64> {
        let (rows, cols) = self.heights.dim();
        if !(col >= 0.0 && row >= 0.0 && col <= (cols - 1) as f64 && row <= (rows - 1) as f64) {
            return None;
        }

        let x1 = (col.floor() as usize).min(cols - 2);
        let y1 = (row.floor() as usize).min(rows - 2);
        let x2 = x1 + 1;
        let y2 = y1 + 1;

        let dx = col - x1 as f64;
        let dy = row - y1 as f64;

        let v11 = self.height_at(y1, x1)? as f64;
        let v12 = self.height_at(y2, x1)? as f64;
        let v21 = self.height_at(y1, x2)? as f64;
        let v22 = self.height_at(y2, x2)? as f64;

        Some(
            v11 * (1.0 - dx) * (1.0 - dy)
                + v21 * dx * (1.0 - dy)
                + v12 * (1.0 - dx) * dy
                + v22 * dx * dy,
        )
    }
}

impl ElevationModel for DemGrid {
    fn elevation(&self, lat: f64, lon: f64) -> Option<f64> {
        let (col, row) = self.transform.map_to_pixel(lon, lat);
        self.interpolate(col, row)
    }
}

impl Georeferencing for DemGrid {
    fn geo_pos(&self, x: f64, y: f64) -> GeoPos {
        let (lon, lat) = self.transform.pixel_to_map(x, y);
        GeoPos::new(lat, lon)
    }
}
