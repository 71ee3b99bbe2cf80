//! Tours: ordered visiting sequences over a location set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::location::{Location, LocationSet};
use crate::matrix::{Distance, DistanceMatrix};

/// Why tour construction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every location in the set is on the tour.
    AllVisited,
    /// The requested stop cap was reached.
    MaxStops,
    /// Every remaining location was unreachable from the last stop.
    Unreachable,
}

/// A location on a tour, with its position in the source location set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourStop {
    pub index: usize,
    pub location: Location,
}

/// An ordered, non-repeating sequence of stops beginning at the start location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    stops: Vec<TourStop>,
    total_miles: f64,
    closed: bool,
    stop_reason: StopReason,
}

impl Tour {
    /// Build a tour that visits `order` (indices into `locations`).
    ///
    /// The total is the sum of matrix lookups between consecutive stops.
    /// Fails if `order` is empty, repeats an index, is out of range, or
    /// crosses an unreachable hop.
    pub fn from_order(
        locations: &LocationSet,
        matrix: &DistanceMatrix,
        order: &[usize],
        closed: bool,
    ) -> Result<Self> {
        if !matrix.matches(locations) {
            return Err(PlannerError::validation(
                "distance matrix does not match the location set",
            ));
        }
        let stops = collect_stops(locations, order)?;

        let mut total_miles = 0.0;
        for pair in order.windows(2) {
            match matrix.get(pair[0], pair[1]) {
                Distance::Miles(miles) => total_miles += miles,
                Distance::Unreachable => {
                    return Err(PlannerError::validation(format!(
                        "no path from {} to {}",
                        stops_name(locations, pair[0]),
                        stops_name(locations, pair[1])
                    )));
                }
            }
        }

        let stop_reason = if stops.len() == locations.len() {
            StopReason::AllVisited
        } else if has_reachable_unvisited(matrix, order) {
            StopReason::MaxStops
        } else {
            StopReason::Unreachable
        };

        Ok(Self {
            stops,
            total_miles,
            closed,
            stop_reason,
        })
    }

    pub(crate) fn from_parts(
        stops: Vec<TourStop>,
        total_miles: f64,
        closed: bool,
        stop_reason: StopReason,
    ) -> Self {
        Self {
            stops,
            total_miles,
            closed,
            stop_reason,
        }
    }

    pub fn stops(&self) -> &[TourStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn start(&self) -> Option<&Location> {
        self.stops.first().map(|stop| &stop.location)
    }

    /// Stop positions relative to the source location set.
    pub fn indices(&self) -> Vec<usize> {
        self.stops.iter().map(|stop| stop.index).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stops.iter().map(|stop| stop.location.name()).collect()
    }

    /// Sum of matrix distances between consecutive stops, excluding any
    /// return leg.
    pub fn total_miles(&self) -> f64 {
        self.total_miles
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// True when construction gave up because nothing else was reachable.
    pub fn is_blocked(&self) -> bool {
        self.stop_reason == StopReason::Unreachable
    }

    /// Distance of the leg from the last stop back to the start.
    pub fn closing_leg(&self, matrix: &DistanceMatrix) -> Distance {
        match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => matrix.get(last.index, first.index),
            _ => Distance::ZERO,
        }
    }

    /// Stop coordinates as (lat, lng), with the start repeated at the end
    /// for closed tours.
    pub fn waypoints(&self) -> Vec<(f64, f64)> {
        waypoints(&self.stops, self.closed)
    }

    pub fn to_stored(&self) -> StoredTour {
        StoredTour::Names(self.names().into_iter().map(str::to_string).collect())
    }
}

/// Stop coordinates as (lat, lng), repeating the first at the end when `closed`.
pub fn waypoints(stops: &[TourStop], closed: bool) -> Vec<(f64, f64)> {
    let mut waypoints: Vec<(f64, f64)> = stops.iter().map(|stop| stop.location.coords()).collect();
    if closed {
        if let Some(&first) = waypoints.first() {
            waypoints.push(first);
        }
    }
    waypoints
}

/// Look up each index of `order`, rejecting an empty, repeating or
/// out-of-range order.
fn collect_stops(locations: &LocationSet, order: &[usize]) -> Result<Vec<TourStop>> {
    if order.is_empty() {
        return Err(PlannerError::validation("a tour needs at least one stop"));
    }

    let mut seen = HashSet::with_capacity(order.len());
    let mut stops = Vec::with_capacity(order.len());
    for &index in order {
        let location = locations.get(index).ok_or_else(|| {
            PlannerError::validation(format!(
                "tour index {index} is out of range for {} locations",
                locations.len()
            ))
        })?;
        if !seen.insert(index) {
            return Err(PlannerError::validation(format!(
                "{} appears more than once in the tour",
                location.name()
            )));
        }
        stops.push(TourStop {
            index,
            location: location.clone(),
        });
    }
    Ok(stops)
}

/// Whether any location left off `order` can be reached from its last stop.
fn has_reachable_unvisited(matrix: &DistanceMatrix, order: &[usize]) -> bool {
    let Some(&last) = order.last() else {
        return false;
    };
    matrix
        .row(last)
        .iter()
        .enumerate()
        .any(|(candidate, cell)| cell.is_reachable() && !order.contains(&candidate))
}

fn stops_name(locations: &LocationSet, index: usize) -> &str {
    locations.get(index).map_or("<unknown>", Location::name)
}

/// A tour read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredTour {
    /// Location names in visiting order.
    Names(Vec<String>),
    /// Indices into the original location set order.
    Permutation(Vec<usize>),
}

impl StoredTour {
    /// Resolve to indices into `locations`.
    pub fn resolve(&self, locations: &LocationSet) -> Result<Vec<usize>> {
        match self {
            Self::Names(names) => names
                .iter()
                .map(|name| locations.find(name).map(|(index, _)| index))
                .collect(),
            Self::Permutation(indices) => {
                if let Some(bad) = indices.iter().find(|&&i| i >= locations.len()) {
                    return Err(PlannerError::validation(format!(
                        "permutation index {bad} is out of range for {} locations",
                        locations.len()
                    )));
                }
                Ok(indices.clone())
            }
        }
    }

    /// The stops in visiting order, without measuring any legs.
    pub fn stops(&self, locations: &LocationSet) -> Result<Vec<TourStop>> {
        let order = self.resolve(locations)?;
        collect_stops(locations, &order)
    }

    /// Rebuild the full tour against `locations` and `matrix`.
    pub fn into_tour(
        &self,
        locations: &LocationSet,
        matrix: &DistanceMatrix,
        closed: bool,
    ) -> Result<Tour> {
        let order = self.resolve(locations)?;
        Tour::from_order(locations, matrix, &order, closed)
    }
}
