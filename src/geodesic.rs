//! Great-circle distance matrix provider.
//!
//! Uses the haversine formula on a spherical earth. No external calls, so it
//! is always available and cheap to recompute.

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::location::LocationSet;
use crate::matrix::{Distance, DistanceMatrix, MatrixMode};
use crate::traits::DistanceMatrixProvider;

/// Mean earth radius in miles (IUGG mean radius, 6371.0088 km).
pub const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Decimal places kept in geodesic matrix cells.
const DEFAULT_PRECISION: u32 = 2;

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone)]
pub struct GeodesicMatrix {
    /// Decimal places each cell is rounded to.
    pub precision: u32,
}

impl Default for GeodesicMatrix {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl GeodesicMatrix {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    fn round(&self, miles: f64) -> f64 {
        let scale = 10f64.powi(self.precision as i32);
        (miles * scale).round() / scale
    }
}

/// Great-circle distance between two (lat, lng) points in miles.
pub fn haversine_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_MILES * c
}

impl DistanceMatrixProvider for GeodesicMatrix {
    fn matrix_for(&self, locations: &LocationSet) -> Result<DistanceMatrix> {
        let coords = locations.coords();
        let n = coords.len();
        debug!(locations = n, "computing geodesic matrix");

        // Each cell reads only the immutable coordinates and is written once.
        let cells: Vec<Distance> = (0..n * n)
            .into_par_iter()
            .map(|k| {
                let (i, j) = (k / n, k % n);
                if i == j {
                    return Distance::ZERO;
                }
                // Canonical argument order keeps m[i][j] and m[j][i] identical.
                let (a, b) = if i < j { (i, j) } else { (j, i) };
                Distance::Miles(self.round(haversine_miles(coords[a], coords[b])))
            })
            .collect();

        let names = locations.names().map(str::to_string).collect();
        DistanceMatrix::from_cells(MatrixMode::Geodesic, names, cells)
    }
}
