//! Seams between the planner core and its external collaborators.
//!
//! The OSRM client implements both provider traits. Tests and host
//! applications can substitute their own.

use crate::error::Result;
use crate::location::LocationSet;
use crate::matrix::DistanceMatrix;
use crate::polyline::Polyline;
use crate::tour::StoredTour;

/// Provides a distance matrix for a set of locations.
///
/// The matrix is indexed by the location set's order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &LocationSet) -> Result<DistanceMatrix>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &T {
    fn matrix_for(&self, locations: &LocationSet) -> Result<DistanceMatrix> {
        (**self).matrix_for(locations)
    }
}

/// A connected path returned by a route-geometry provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub geometry: Polyline,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Renders an ordered coordinate sequence into a connected path.
pub trait RouteGeometryProvider {
    /// Route through `waypoints` (lat, lng) in the given order.
    ///
    /// A closed loop is requested by repeating the first waypoint at the end.
    fn route_for(&self, waypoints: &[(f64, f64)]) -> Result<RouteGeometry>;
}

impl<T: RouteGeometryProvider + ?Sized> RouteGeometryProvider for &T {
    fn route_for(&self, waypoints: &[(f64, f64)]) -> Result<RouteGeometry> {
        (**self).route_for(waypoints)
    }
}

/// Storage for the inputs and intermediate artifacts of a planning run.
pub trait LocationRepository {
    fn load_locations(&self) -> Result<LocationSet>;

    /// A previously computed tour, as names or as an index permutation.
    fn load_tour(&self) -> Result<StoredTour>;
}

/// Receives raw provider payloads for diagnostics.
///
/// `service` is the OSRM service name (`"table"` or `"route"`).
pub trait ResponseRecorder: Send + Sync {
    fn record(&self, service: &str, body: &serde_json::Value) -> Result<()>;
}
