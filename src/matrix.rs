//! Distance matrices and the builder that produces them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlannerError, Result};
use crate::geodesic::GeodesicMatrix;
use crate::location::LocationSet;
use crate::traits::DistanceMatrixProvider;

/// Meters to statute miles.
pub const METERS_TO_MILES: f64 = 0.000_621_371;

/// Which distance model produced a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixMode {
    /// Great-circle distance on a spherical earth.
    Geodesic,
    /// Road distance from a routing-table provider.
    Network,
}

impl fmt::Display for MatrixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geodesic => f.write_str("geodesic"),
            Self::Network => f.write_str("network"),
        }
    }
}

/// One cell of a distance matrix.
///
/// Serializes as a number of miles, or `null` when unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distance {
    Miles(f64),
    Unreachable,
}

impl Distance {
    pub const ZERO: Self = Self::Miles(0.0);

    pub fn miles(self) -> Option<f64> {
        match self {
            Self::Miles(miles) => Some(miles),
            Self::Unreachable => None,
        }
    }

    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Miles(_))
    }
}

/// A square table of distances in miles, indexed by location set position.
///
/// `get(i, j)` is the distance from location `i` to location `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    mode: MatrixMode,
    names: Vec<String>,
    cells: Vec<Distance>,
}

impl DistanceMatrix {
    /// Build a matrix from row-major `cells`.
    ///
    /// Fails unless names are unique, `cells` holds exactly `names.len()²`
    /// entries, the diagonal is zero, and every finite entry is non-negative.
    pub fn from_cells(mode: MatrixMode, names: Vec<String>, cells: Vec<Distance>) -> Result<Self> {
        let n = names.len();
        if cells.len() != n * n {
            return Err(PlannerError::validation(format!(
                "expected {} cells for {n} locations, got {}",
                n * n,
                cells.len()
            )));
        }
        let mut seen = HashSet::with_capacity(n);
        if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(PlannerError::validation(format!(
                "matrix names {duplicate} more than once"
            )));
        }
        for (k, cell) in cells.iter().enumerate() {
            let (i, j) = (k / n, k % n);
            match *cell {
                Distance::Miles(miles) if !miles.is_finite() || miles < 0.0 => {
                    return Err(PlannerError::validation(format!(
                        "distance {miles} from {} to {} is not a non-negative number",
                        names[i], names[j]
                    )));
                }
                Distance::Miles(miles) if i == j && miles != 0.0 => {
                    return Err(PlannerError::validation(format!(
                        "distance from {} to itself must be zero",
                        names[i]
                    )));
                }
                Distance::Unreachable if i == j => {
                    return Err(PlannerError::validation(format!(
                        "{} cannot be unreachable from itself",
                        names[i]
                    )));
                }
                _ => {}
            }
        }
        Ok(Self { mode, names, cells })
    }

    /// Build a matrix from nested rows.
    pub fn from_rows(mode: MatrixMode, names: Vec<String>, rows: Vec<Vec<Distance>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != names.len()) {
            return Err(PlannerError::validation(format!(
                "row of length {} does not match {} locations",
                row.len(),
                names.len()
            )));
        }
        Self::from_cells(mode, names, rows.into_iter().flatten().collect())
    }

    pub fn mode(&self) -> MatrixMode {
        self.mode
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, from: usize, to: usize) -> Distance {
        self.cells[from * self.size() + to]
    }

    pub fn get_by_name(&self, from: &str, to: &str) -> Option<Distance> {
        let i = self.names.iter().position(|name| name == from)?;
        let j = self.names.iter().position(|name| name == to)?;
        Some(self.get(i, j))
    }

    pub fn row(&self, from: usize) -> &[Distance] {
        let n = self.size();
        &self.cells[from * n..(from + 1) * n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Distance]> {
        self.cells.chunks(self.size().max(1))
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.size();
        (0..n).all(|i| (i + 1..n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn unreachable_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_reachable()).count()
    }

    /// Whether this matrix is indexed by exactly the names of `locations`, in order.
    pub fn matches(&self, locations: &LocationSet) -> bool {
        self.size() == locations.len()
            && self.names.iter().map(String::as_str).eq(locations.names())
    }
}

/// Builds distance matrices in either mode.
///
/// Geodesic matrices are computed locally; network matrices are delegated to
/// the injected provider.
#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder<P> {
    geodesic: GeodesicMatrix,
    network: P,
}

impl<P: DistanceMatrixProvider> DistanceMatrixBuilder<P> {
    pub fn new(network: P) -> Self {
        Self {
            geodesic: GeodesicMatrix::default(),
            network,
        }
    }

    pub fn build(&self, locations: &LocationSet, mode: MatrixMode) -> Result<DistanceMatrix> {
        locations.require_at_least(2)?;

        let matrix = match mode {
            MatrixMode::Geodesic => self.geodesic.matrix_for(locations)?,
            MatrixMode::Network => self.network.matrix_for(locations)?,
        };

        if !matrix.matches(locations) {
            return Err(PlannerError::malformed(format!(
                "{mode} matrix of size {} does not line up with {} locations",
                matrix.size(),
                locations.len()
            )));
        }

        info!(
            locations = locations.len(),
            %mode,
            unreachable = matrix.unreachable_count(),
            "built distance matrix"
        );
        Ok(matrix)
    }
}
