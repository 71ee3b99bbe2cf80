//! park-tour core
//!
//! Distance matrices (geodesic and road network) over named locations, a
//! nearest-neighbor tour builder, and an OSRM adapter that renders a tour
//! into a connected route.

pub mod error;
pub mod location;
pub mod matrix;
pub mod geodesic;
pub mod solver;
pub mod tour;
pub mod traits;
pub mod osrm;
pub mod polyline;
pub mod route;
pub mod repository;
pub mod planner;

pub use error::{ErrorKind, PlannerError, Result};
pub use location::{Location, LocationSet};
pub use matrix::{Distance, DistanceMatrix, DistanceMatrixBuilder, MatrixMode};
pub use solver::{NearestNeighborTourBuilder, TourOptions};
pub use tour::{StopReason, StoredTour, Tour};
