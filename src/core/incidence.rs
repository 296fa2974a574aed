use crate::core::geodesy::{geo_to_xyz_wgs84, GeoPos};
use crate::core::vector::Vector3;
use ndarray::ArrayView2;

/// Elevation lookup by geodetic position. `None` means no data.
pub trait ElevationModel {
    fn elevation(&self, lat: f64, lon: f64) -> Option<f64>;
}

/// Pixel to geodetic position mapping of a DEM patch. Coordinates are
/// (column, row) relative to the patch and may lie outside it.
pub trait Georeferencing {
    fn geo_pos(&self, x: f64, y: f64) -> GeoPos;
}

/// Geodetic neighbours of a DEM cell together with the sensor position
#[derive(Debug, Clone, PartialEq)]
pub struct LocalGeometry {
    pub sensor_pos: Vector3,
    pub centre_point: Vector3,
    pub right: GeoPos,
    pub left: GeoPos,
    pub up: GeoPos,
    pub down: GeoPos,
}

impl LocalGeometry {
    /// Neighbours `offset` cells right / left / up / down of (x, y)
    pub fn from_georeferencing<G: Georeferencing + ?Sized>(
        georef: &G,
        x: f64,
        y: f64,
        offset: f64,
        sensor_pos: Vector3,
        centre_point: Vector3,
    ) -> Self {
        Self {
            sensor_pos,
            centre_point,
            right: georef.geo_pos(x + offset, y),
            left: georef.geo_pos(x - offset, y),
            up: georef.geo_pos(x, y - offset),
            down: georef.geo_pos(x, y + offset),
        }
    }
}

/// Local and projected local incidence angle in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalIncidenceAngles {
    pub local_incidence_angle: f64,
    pub projected_local_incidence_angle: Option<f64>,
}

/// Incidence angles from the four averaged side heights.
///
/// The ground plane normal is built from the right-left and down-up
/// directions and oriented away from the Earth's centre.
fn incidence_from_heights(
    geometry: &LocalGeometry,
    centre_point: &Vector3,
    heights: [f64; 4],
    compute_projected: bool,
) -> LocalIncidenceAngles {
    let [right_h, left_h, up_h, down_h] = heights;
    let right = geo_to_xyz_wgs84(geometry.right.lat, geometry.right.lon, right_h);
    let left = geo_to_xyz_wgs84(geometry.left.lat, geometry.left.lon, left_h);
    let up = geo_to_xyz_wgs84(geometry.up.lat, geometry.up.lon, up_h);
    let down = geo_to_xyz_wgs84(geometry.down.lat, geometry.down.lon, down_h);

    let mut n = (right - left).cross(&(down - up)).normalize();
    if n.dot(centre_point) < 0.0 {
        n = -n;
    }

    let s = (geometry.sensor_pos - *centre_point).normalize();
    let local_incidence_angle = acos_deg(n.dot(&s));

    let projected_local_incidence_angle = if compute_projected {
        // Range plane normal
        let m = s.cross(centre_point).normalize();
        let n1 = (n - m * m.dot(&n)).normalize();
        Some(acos_deg(n1.dot(&s)))
    } else {
        None
    };

    LocalIncidenceAngles {
        local_incidence_angle,
        projected_local_incidence_angle,
    }
}

fn acos_deg(cosine: f64) -> f64 {
    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Incidence angles from an N x N DEM neighbourhood whose top-left cell is
/// `local_dem[[row0, col0]]`.
///
/// Returns `None` if any cell of the neighbourhood is no data or the
/// neighbourhood does not fit into the patch.
pub fn compute_local_incidence_angle(
    geometry: &LocalGeometry,
    local_dem: ArrayView2<f32>,
    row0: usize,
    col0: usize,
    dem_no_data: f32,
    neighborhood: usize,
    compute_projected: bool,
) -> Option<LocalIncidenceAngles> {
    let (rows, cols) = local_dem.dim();
    if neighborhood < 2 || row0 + neighborhood > rows || col0 + neighborhood > cols {
        return None;
    }

    let last = neighborhood - 1;
    let window = local_dem.slice(ndarray::s![row0..row0 + neighborhood, col0..col0 + neighborhood]);
    if window.iter().any(|&h| h == dem_no_data) {
        return None;
    }

    let count = neighborhood as f64;
    let column_mean = |c: usize| window.column(c).iter().map(|&h| h as f64).sum::<f64>() / count;
    let row_mean = |r: usize| window.row(r).iter().map(|&h| h as f64).sum::<f64>() / count;

    let heights = [column_mean(last), column_mean(0), row_mean(0), row_mean(last)];
    Some(incidence_from_heights(
        geometry,
        &geometry.centre_point,
        heights,
        compute_projected,
    ))
}

/// Incidence angles around the centre cell `local_dem[[row, col]]`, reading
/// cells beyond the patch from `elevation_model`.
///
/// Each side averages the centre cell and the `neighborhood - 1` cells
/// beyond it in that direction; no-data cells are skipped and a side with
/// no valid cell gives `None`. The centre point is taken from the centre
/// cell's own position and height, not from `geometry.centre_point`.
#[allow(clippy::too_many_arguments)]
pub fn compute_local_incidence_angle_with_dem<E, G>(
    geometry: &LocalGeometry,
    local_dem: ArrayView2<f32>,
    row: usize,
    col: usize,
    dem_no_data: f32,
    neighborhood: usize,
    compute_projected: bool,
    elevation_model: &E,
    georef: &G,
) -> Option<LocalIncidenceAngles>
where
    E: ElevationModel + ?Sized,
    G: Georeferencing + ?Sized,
{
    let (rows, cols) = local_dem.dim();
    if row >= rows || col >= cols {
        return None;
    }

    let sample = |r: isize, c: isize| -> Option<f64> {
        let inside = r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols;
        let value = if inside {
            Some(local_dem[[r as usize, c as usize]] as f64)
        } else {
            let geo = georef.geo_pos(c as f64, r as f64);
            elevation_model.elevation(geo.lat, geo.lon)
        };
        value.filter(|&h| h != dem_no_data as f64 && h.is_finite())
    };

    let side_mean = |dr: isize, dc: isize| -> Option<f64> {
        let (sum, valid) = (0..neighborhood as isize)
            .filter_map(|n| sample(row as isize + dr * n, col as isize + dc * n))
            .fold((0.0, 0usize), |(sum, valid), h| (sum + h, valid + 1));
        if valid == 0 {
            None
        } else {
            Some(sum / valid as f64)
        }
    };

    let heights = [
        side_mean(0, 1)?,
        side_mean(0, -1)?,
        side_mean(-1, 0)?,
        side_mean(1, 0)?,
    ];

    let centre_height = local_dem[[row, col]];
    if centre_height == dem_no_data {
        return None;
    }
    let centre_geo = georef.geo_pos(col as f64, row as f64);
    let centre_point = geo_to_xyz_wgs84(centre_geo.lat, centre_geo.lon, centre_height as f64);

    Some(incidence_from_heights(geometry, &centre_point, heights, compute_projected))
}
