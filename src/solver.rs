//! Nearest-neighbor tour construction.

use tracing::{info, warn};

use crate::error::{PlannerError, Result};
use crate::location::LocationSet;
use crate::matrix::{Distance, DistanceMatrix};
use crate::tour::{StopReason, Tour, TourStop};

#[derive(Debug, Clone)]
pub struct TourOptions {
    /// Maximum number of stops, start included. `None` visits everything reachable.
    pub max_stops: Option<usize>,
    /// Whether the tour is meant to return to its start.
    pub closed: bool,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            max_stops: None,
            closed: true,
        }
    }
}

impl TourOptions {
    pub fn with_max_stops(mut self, max_stops: usize) -> Self {
        self.max_stops = Some(max_stops);
        self
    }

    pub fn open(mut self) -> Self {
        self.closed = false;
        self
    }

    /// The number of stops a tour over `locations` may have.
    ///
    /// Fails when `max_stops` is outside `1..=locations`.
    pub fn stop_limit(&self, locations: usize) -> Result<usize> {
        match self.max_stops {
            Some(max) if max == 0 || max > locations => Err(PlannerError::validation(format!(
                "max_stops must be between 1 and {locations}, got {max}"
            ))),
            Some(max) => Ok(max),
            None => Ok(locations),
        }
    }
}

/// Greedy tour builder: always step to the closest unvisited location.
///
/// Ties go to the candidate with the lowest index in the location set.
/// Unreachable cells are never stepped over; if every remaining candidate is
/// unreachable the tour ends early with [`StopReason::Unreachable`]. A start
/// that reaches nothing at all is a validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborTourBuilder;

impl NearestNeighborTourBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        locations: &LocationSet,
        matrix: &DistanceMatrix,
        start: &str,
        options: &TourOptions,
    ) -> Result<Tour> {
        let (start_index, _) = locations.find(start)?;
        let n = locations.len();

        let limit = options.stop_limit(n)?;

        if !matrix.matches(locations) {
            return Err(PlannerError::validation(format!(
                "distance matrix of size {} does not match {n} locations",
                matrix.size()
            )));
        }

        let mut visited = vec![false; n];
        visited[start_index] = true;
        let mut order = Vec::with_capacity(limit);
        order.push(start_index);
        let mut total_miles = 0.0;

        let stop_reason = loop {
            if order.len() == n {
                break StopReason::AllVisited;
            }
            if order.len() == limit {
                break StopReason::MaxStops;
            }

            let current = order[order.len() - 1];
            match nearest_unvisited(matrix, current, &visited) {
                Some((next, miles)) => {
                    visited[next] = true;
                    order.push(next);
                    total_miles += miles;
                }
                None if order.len() == 1 => {
                    return Err(PlannerError::validation(format!(
                        "no other location is reachable from {start}"
                    )));
                }
                None => {
                    warn!(
                        from = %locations.as_slice()[current].name(),
                        remaining = n - order.len(),
                        "no reachable location left; stopping tour early"
                    );
                    break StopReason::Unreachable;
                }
            }
        };

        let stops = order
            .iter()
            .map(|&index| TourStop {
                index,
                location: locations.as_slice()[index].clone(),
            })
            .collect::<Vec<_>>();

        info!(
            start,
            stops = stops.len(),
            total_miles,
            mode = %matrix.mode(),
            "built nearest-neighbor tour"
        );

        Ok(Tour::from_parts(stops, total_miles, options.closed, stop_reason))
    }
}

/// The closest unvisited, reachable location from `from`.
///
/// Scans in index order and only replaces the best on a strictly smaller
/// distance, so the lowest index wins ties.
fn nearest_unvisited(matrix: &DistanceMatrix, from: usize, visited: &[bool]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (candidate, cell) in matrix.row(from).iter().enumerate() {
        if visited[candidate] {
            continue;
        }
        let Distance::Miles(miles) = *cell else {
            continue;
        };
        if best.is_none_or(|(_, best_miles)| miles < best_miles) {
            best = Some((candidate, miles));
        }
    }
    best
}
