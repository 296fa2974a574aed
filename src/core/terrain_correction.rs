use crate::core::config::GeocodingConfig;
use crate::core::doppler::{compute_slant_range, ZeroDopplerSolver};
use crate::core::geodesy::geo_to_xyz_wgs84;
use crate::core::incidence::{
    compute_local_incidence_angle_with_dem, ElevationModel, Georeferencing, LocalGeometry,
    LocalIncidenceAngles,
};
use crate::core::orbit::OrbitStateVectors;
use crate::core::range::{RangeGeometry, SrgrCoefficientList};
use crate::io::dem::DemGrid;
use crate::types::{
    GeoTransform, SarError, SarResult, NON_VALID_RANGE_INDEX, NON_VALID_ZERO_DOPPLER_TIME,
    SECONDS_PER_DAY, SPEED_OF_LIGHT,
};
use ndarray::Array2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::Arc;

/// Range-Doppler geometry of the source SAR image
#[derive(Debug, Clone)]
pub struct RangeDopplerParams {
    /// Radar wavelength (meters)
    pub wavelength: f64,
    /// Range pixel spacing in meters
    pub range_pixel_spacing: f64,
    /// Two-way slant range time to first pixel (seconds)
    pub slant_range_time: f64,
    /// Pulse repetition frequency (Hz), one image line per pulse
    pub prf: f64,
    /// Zero-Doppler time of the first line (MJD-2000 days)
    pub first_line_time: f64,
    pub image_width: usize,
    pub image_height: usize,
    /// Ground-range product; range indices then go through the SRGR polynomials
    pub srgr_flag: bool,
    pub srgr_coefficients: Vec<SrgrCoefficientList>,
}

impl Default for RangeDopplerParams {
    fn default() -> Self {
        Self {
            wavelength: 0.0555,          // C-band
            range_pixel_spacing: 2.33,   // Sentinel-1 IW typical
            slant_range_time: 5.44e-3,   // Sentinel-1 IW typical
            prf: 486.5,                  // Sentinel-1 IW typical
            first_line_time: 0.0,
            image_width: 0,
            image_height: 0,
            srgr_flag: false,
            srgr_coefficients: Vec::new(),
        }
    }
}

impl RangeDopplerParams {
    /// Azimuth line time interval in days
    pub fn line_time_interval(&self) -> f64 {
        1.0 / self.prf / SECONDS_PER_DAY
    }

    /// Slant range to the first pixel in meters
    pub fn near_edge_slant_range(&self) -> f64 {
        self.slant_range_time * SPEED_OF_LIGHT / 2.0
    }

    pub fn range_geometry(&self) -> RangeGeometry {
        RangeGeometry {
            srgr_flag: self.srgr_flag,
            source_image_width: self.image_width,
            source_image_height: self.image_height,
            first_line_time: self.first_line_time,
            line_time_interval: self.line_time_interval(),
            range_spacing: self.range_pixel_spacing,
            near_edge_slant_range: self.near_edge_slant_range(),
            srgr_coefficients: self.srgr_coefficients.clone(),
        }
    }

    fn validate(&self) -> SarResult<()> {
        if !(self.wavelength > 0.0) {
            return Err(SarError::InvalidConfig(format!("Invalid wavelength: {}", self.wavelength)));
        }
        if !(self.range_pixel_spacing > 0.0) {
            return Err(SarError::InvalidConfig(format!(
                "Invalid range pixel spacing: {}",
                self.range_pixel_spacing
            )));
        }
        if !(self.prf > 0.0) {
            return Err(SarError::InvalidConfig(format!("Invalid PRF: {}", self.prf)));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(SarError::InvalidConfig(format!(
                "Empty source image: {}x{}",
                self.image_width, self.image_height
            )));
        }
        if self.srgr_flag && self.srgr_coefficients.is_empty() {
            return Err(SarError::Metadata(
                "Ground-range image without SRGR coefficients".to_string(),
            ));
        }
        Ok(())
    }
}

/// Geocoding result for a single ground point
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPixel {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    /// Zero-Doppler time (MJD-2000 days)
    pub zero_doppler_time: f64,
    /// Slant range at zero Doppler (meters)
    pub slant_range: f64,
    pub range_index: f64,
    pub azimuth_index: f64,
}

/// Range / azimuth lookup grids; `NaN` marks output cells without a source pixel
#[derive(Debug, Clone)]
pub struct GeocodingGrid {
    pub range_index: Array2<f64>,
    pub azimuth_index: Array2<f64>,
    pub valid_pixels: usize,
}

/// Range-Doppler terrain correction driver
pub struct TerrainCorrector {
    dem: DemGrid,
    orbit: Arc<OrbitStateVectors>,
    params: RangeDopplerParams,
    geometry: RangeGeometry,
    solver: ZeroDopplerSolver,
    config: GeocodingConfig,
}

impl TerrainCorrector {
    /// Create new terrain correction processor
    pub fn new(
        dem: DemGrid,
        orbit: Arc<OrbitStateVectors>,
        params: RangeDopplerParams,
        config: GeocodingConfig,
    ) -> SarResult<Self> {
        config.validate()?;
        params.validate()?;

        let geometry = params.range_geometry();
        let solver = ZeroDopplerSolver::new(params.wavelength, geometry.line_time_interval, &config);

        log::info!(
            "Terrain corrector: {}x{} source image, {}x{} DEM, {} zero-Doppler search",
            params.image_width,
            params.image_height,
            dem.dim().1,
            dem.dim().0,
            config.zero_doppler_method
        );

        Ok(Self {
            dem,
            orbit,
            params,
            geometry,
            solver,
            config,
        })
    }

    pub fn dem(&self) -> &DemGrid {
        &self.dem
    }

    pub fn orbit(&self) -> &OrbitStateVectors {
        &self.orbit
    }

    pub fn params(&self) -> &RangeDopplerParams {
        &self.params
    }

    pub fn geometry(&self) -> &RangeGeometry {
        &self.geometry
    }

    /// Map a ground position to source image coordinates.
    ///
    /// `None` when the DEM has no height there, the point is not imaged by
    /// the orbit span, or it falls outside the source image.
    pub fn geocode(&self, lat: f64, lon: f64) -> Option<GeocodedPixel> {
        let elevation = self.dem.elevation(lat, lon)?;
        let earth_point = geo_to_xyz_wgs84(lat, lon, elevation);

        let zero_doppler_time = self.solver.solve_with_orbit(&earth_point, &self.orbit);
        if zero_doppler_time == NON_VALID_ZERO_DOPPLER_TIME {
            return None;
        }

        let (slant_range, _) = compute_slant_range(zero_doppler_time, &self.orbit, &earth_point);
        let range_index = self.geometry.range_index(zero_doppler_time, slant_range);
        if range_index == NON_VALID_RANGE_INDEX {
            return None;
        }

        let azimuth_index = self.geometry.azimuth_index(zero_doppler_time);
        if !self.geometry.contains(range_index, azimuth_index) {
            return None;
        }

        Some(GeocodedPixel {
            latitude: lat,
            longitude: lon,
            elevation,
            zero_doppler_time,
            slant_range,
            range_index,
            azimuth_index,
        })
    }

    fn geocode_row(&self, grid: &GeoTransform, row: usize, width: usize) -> Vec<(f64, f64)> {
        (0..width)
            .map(|col| {
                let (lon, lat) = grid.pixel_to_map(col as f64, row as f64);
                match self.geocode(lat, lon) {
                    Some(pixel) => (pixel.range_index, pixel.azimuth_index),
                    None => (f64::NAN, f64::NAN),
                }
            })
            .collect()
    }

    /// Geocode every node of an output lat/lon grid
    pub fn geocode_grid(&self, grid: &GeoTransform, height: usize, width: usize) -> GeocodingGrid {
        log::info!("Geocoding output grid: {}x{} pixels", width, height);

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<(f64, f64)>> = (0..height)
            .into_par_iter()
            .map(|row| self.geocode_row(grid, row, width))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<(f64, f64)>> = (0..height)
            .map(|row| {
                if row % 100 == 0 && height > 0 {
                    let progress = (row as f64 / height as f64) * 100.0;
                    log::info!("Geocoding progress: {:.1}%", progress);
                }
                self.geocode_row(grid, row, width)
            })
            .collect();

        let mut range_index = Array2::from_elem((height, width), f64::NAN);
        let mut azimuth_index = Array2::from_elem((height, width), f64::NAN);
        let mut valid_pixels = 0;

        for (i, row) in rows.into_iter().enumerate() {
            for (j, (r, a)) in row.into_iter().enumerate() {
                if r.is_finite() {
                    valid_pixels += 1;
                }
                range_index[[i, j]] = r;
                azimuth_index[[i, j]] = a;
            }
        }

        let total = height * width;
        let coverage = if total > 0 {
            valid_pixels as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        log::info!("Geocoding completed: {:.1}% coverage", coverage);

        GeocodingGrid {
            range_index,
            azimuth_index,
            valid_pixels,
        }
    }

    /// Local and projected local incidence angle at a DEM node.
    ///
    /// The sensor position is taken at the node's zero-Doppler time; cells
    /// beyond the DEM edge are looked up through the elevation model.
    pub fn incidence_angles_at(
        &self,
        row: usize,
        col: usize,
        compute_projected: bool,
    ) -> Option<LocalIncidenceAngles> {
        let height = self.dem.height_at(row, col)? as f64;
        let centre = self.dem.geo_pos(col as f64, row as f64);
        let centre_point = geo_to_xyz_wgs84(centre.lat, centre.lon, height);

        let zero_doppler_time = self.solver.solve_with_orbit(&centre_point, &self.orbit);
        if zero_doppler_time == NON_VALID_ZERO_DOPPLER_TIME {
            return None;
        }
        let sensor_pos = self.orbit.position(zero_doppler_time);

        let offset = (self.config.incidence_neighborhood / 2) as f64;
        let geometry = LocalGeometry::from_georeferencing(
            &self.dem,
            col as f64,
            row as f64,
            offset,
            sensor_pos,
            centre_point,
        );

        compute_local_incidence_angle_with_dem(
            &geometry,
            self.dem.heights(),
            row,
            col,
            self.dem.no_data(),
            self.config.incidence_neighborhood,
            compute_projected,
            &self.dem,
            &self.dem,
        )
    }
}
