//! Rendering a tour into a connected travel path.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlannerError, Result};
use crate::matrix::METERS_TO_MILES;
use crate::polyline::Polyline;
use crate::tour::{Tour, TourStop, waypoints};
use crate::traits::RouteGeometryProvider;

/// A stop as shown to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A tour with its road geometry and aggregate totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRoute {
    pub geometry: Polyline,
    pub waypoints: Vec<Waypoint>,
    pub total_distance_miles: f64,
    pub total_duration_hours: f64,
    pub closed_tour: bool,
}

/// Route `tour` through `provider` and package the result.
///
/// Closed tours repeat the start coordinate at the end of the request.
/// Totals are rounded to one decimal place.
pub fn render_tour<P>(provider: &P, tour: &Tour) -> Result<RenderedRoute>
where
    P: RouteGeometryProvider + ?Sized,
{
    render_stops(provider, tour.stops(), tour.is_closed())
}

/// Route an ordered list of stops that has no distance matrix behind it.
pub fn render_stops<P>(provider: &P, stops: &[TourStop], closed: bool) -> Result<RenderedRoute>
where
    P: RouteGeometryProvider + ?Sized,
{
    let coordinates = waypoints(stops, closed);
    if coordinates.len() < 2 {
        return Err(PlannerError::InsufficientData {
            required: 2,
            actual: coordinates.len(),
        });
    }

    let route = provider.route_for(&coordinates)?;

    let waypoints = stops
        .iter()
        .map(|stop| Waypoint {
            name: stop.location.name().to_string(),
            latitude: stop.location.latitude(),
            longitude: stop.location.longitude(),
        })
        .collect();

    let rendered = RenderedRoute {
        geometry: route.geometry,
        waypoints,
        total_distance_miles: round_tenths(route.distance_meters * METERS_TO_MILES),
        total_duration_hours: round_tenths(route.duration_seconds / 3600.0),
        closed_tour: closed,
    };

    info!(
        stops = stops.len(),
        miles = rendered.total_distance_miles,
        hours = rendered.total_duration_hours,
        closed = rendered.closed_tour,
        "rendered tour route"
    );
    Ok(rendered)
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
