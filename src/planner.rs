//! One-call planning: matrix, tour and rendered route for a request.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::location::LocationSet;
use crate::matrix::{DistanceMatrix, DistanceMatrixBuilder, MatrixMode};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::route::{RenderedRoute, render_stops, render_tour};
use crate::solver::{NearestNeighborTourBuilder, TourOptions};
use crate::tour::Tour;
use crate::traits::{DistanceMatrixProvider, LocationRepository, RouteGeometryProvider};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub start: String,
    pub mode: MatrixMode,
    pub max_stops: Option<usize>,
    pub closed: bool,
}

impl PlanRequest {
    pub fn new(start: impl Into<String>, mode: MatrixMode) -> Self {
        Self {
            start: start.into(),
            mode,
            max_stops: None,
            closed: true,
        }
    }

    fn tour_options(&self) -> TourOptions {
        TourOptions {
            max_stops: self.max_stops,
            closed: self.closed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannedTour {
    pub matrix: DistanceMatrix,
    pub tour: Tour,
    pub route: RenderedRoute,
}

/// Wires the matrix builder, tour builder and route adapter together.
///
/// Holds no state between calls beyond its collaborators.
#[derive(Debug, Clone)]
pub struct TourPlanner<M, R> {
    matrices: DistanceMatrixBuilder<M>,
    tours: NearestNeighborTourBuilder,
    routes: R,
}

impl TourPlanner<OsrmClient, OsrmClient> {
    /// A planner using one OSRM server for both tables and routes.
    pub fn osrm(config: OsrmConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = OsrmClient::new(config)?;
        Ok(Self::new(client.clone(), client))
    }
}

impl<M, R> TourPlanner<M, R>
where
    M: DistanceMatrixProvider,
    R: RouteGeometryProvider,
{
    pub fn new(network: M, routes: R) -> Self {
        Self {
            matrices: DistanceMatrixBuilder::new(network),
            tours: NearestNeighborTourBuilder::new(),
            routes,
        }
    }

    pub fn matrix(&self, locations: &LocationSet, mode: MatrixMode) -> Result<DistanceMatrix> {
        self.matrices.build(locations, mode)
    }

    pub fn plan(&self, locations: &LocationSet, request: &PlanRequest) -> Result<PlannedTour> {
        // Reject a bad start or cap before spending a provider call on the matrix.
        locations.find(&request.start)?;
        let options = request.tour_options();
        options.stop_limit(locations.len())?;

        let matrix = self.matrices.build(locations, request.mode)?;
        let tour = self
            .tours
            .build(locations, &matrix, &request.start, &options)?;
        let route = render_tour(&self.routes, &tour)?;

        Ok(PlannedTour {
            matrix,
            tour,
            route,
        })
    }

    /// Re-render a previously stored tour.
    ///
    /// Only the route provider is called. Use [`crate::tour::StoredTour::into_tour`]
    /// with a matrix to measure the stored order.
    pub fn resume<S>(&self, repository: &S, closed: bool) -> Result<RenderedRoute>
    where
        S: LocationRepository + ?Sized,
    {
        let locations = repository.load_locations()?;
        let stored = repository.load_tour()?;
        debug!(locations = locations.len(), ?stored, "resuming stored tour");

        let stops = stored.stops(&locations)?;
        render_stops(&self.routes, &stops, closed)
    }
}
