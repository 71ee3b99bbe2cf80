//! Named locations and the validated set every computation starts from.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// A named point on the earth's surface.
///
/// Identity is the name: two locations with the same name compare equal
/// regardless of their coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlannerError::validation("location name must not be empty"));
        }
        validate_coordinates(&name, latitude, longitude)?;
        Ok(Self {
            name,
            latitude,
            longitude,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Coordinates as (lat, lng).
    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

fn validate_coordinates(name: &str, latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(PlannerError::validation(format!(
            "latitude {latitude} of {name} is outside [-90, 90]"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(PlannerError::validation(format!(
            "longitude {longitude} of {name} is outside [-180, 180]"
        )));
    }
    Ok(())
}

/// An ordered, non-empty collection of uniquely named locations.
///
/// Positions in the set are the indices used by [`crate::matrix::DistanceMatrix`]
/// and by tour permutations.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSet {
    locations: Vec<Location>,
    index: HashMap<String, usize>,
}

impl LocationSet {
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        if locations.is_empty() {
            return Err(PlannerError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let mut index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            // Deserialized locations bypass `Location::new`.
            validate_coordinates(&location.name, location.latitude, location.longitude)?;
            if index.insert(location.name.clone(), i).is_some() {
                return Err(PlannerError::validation(format!(
                    "duplicate location name: {}",
                    location.name
                )));
            }
        }

        Ok(Self { locations, index })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.locations.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Look up a location by name, failing with `NotFound`.
    pub fn find(&self, name: &str) -> Result<(usize, &Location)> {
        self.index_of(name)
            .map(|i| (i, &self.locations[i]))
            .ok_or_else(|| PlannerError::not_found(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(Location::name)
    }

    /// All coordinates in set order as (lat, lng).
    pub fn coords(&self) -> Vec<(f64, f64)> {
        self.locations.iter().map(Location::coords).collect()
    }

    pub fn require_at_least(&self, required: usize) -> Result<()> {
        if self.len() < required {
            return Err(PlannerError::InsufficientData {
                required,
                actual: self.len(),
            });
        }
        Ok(())
    }

    /// A new set containing the locations at `order`, in that order.
    pub fn reordered(&self, order: &[usize]) -> Result<Self> {
        let locations = order
            .iter()
            .map(|&i| {
                self.locations.get(i).cloned().ok_or_else(|| {
                    PlannerError::validation(format!(
                        "index {i} is out of range for {} locations",
                        self.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(locations)
    }
}

impl<'a> IntoIterator for &'a LocationSet {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}
