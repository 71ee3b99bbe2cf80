//! Polyline representation for route geometries.
//!
//! Providers speak GeoJSON (`[lng, lat]` positions); internally points are
//! kept as (latitude, longitude) like every other coordinate in the crate.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::geodesic::haversine_miles;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from (latitude, longitude) points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decode a GeoJSON `LineString` geometry object.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Self> {
        let line: GeoJsonLineString = serde_json::from_value(value.clone())
            .map_err(|err| PlannerError::malformed(format!("route geometry: {err}")))?;

        if line.kind != "LineString" {
            return Err(PlannerError::malformed(format!(
                "route geometry has type {}, expected LineString",
                line.kind
            )));
        }
        if line.coordinates.len() < 2 {
            return Err(PlannerError::malformed(
                "route geometry must contain at least two positions",
            ));
        }

        let points = line
            .coordinates
            .into_iter()
            .map(|position| match position.as_slice() {
                [lng, lat, ..] if lat.is_finite() && lng.is_finite() => Ok((*lat, *lng)),
                _ => Err(PlannerError::malformed(format!(
                    "invalid GeoJSON position {position:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { points })
    }

    /// Encode as a GeoJSON `LineString` geometry object.
    pub fn to_geojson(&self) -> serde_json::Value {
        let coordinates: Vec<[f64; 2]> = self.points.iter().map(|&(lat, lng)| [lng, lat]).collect();
        serde_json::json!({ "type": "LineString", "coordinates": coordinates })
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Great-circle length of the line in miles.
    pub fn length_miles(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_miles(pair[0], pair[1]))
            .sum()
    }
}

#[derive(Debug, Deserialize)]
struct GeoJsonLineString {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<Vec<f64>>,
}
