//! National park locations for realistic test fixtures.
//!
//! Coordinates are the park reference points published by the NPS, rounded
//! to four decimals. All lie in the contiguous US and are routable on OSRM's
//! public car profile.

use park_tour::{Location, LocationSet};

/// A named park with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Park {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Park {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::new(self.name, self.lat, self.lng).expect("fixture coordinates are valid")
    }
}

// ============================================================================
// Colorado Plateau
// ============================================================================

pub const COLORADO_PLATEAU: &[Park] = &[
    Park::new("Zion", 37.2982, -113.0263),
    Park::new("Bryce Canyon", 37.5930, -112.1871),
    Park::new("Capitol Reef", 38.2821, -111.2471),
    Park::new("Arches", 38.7331, -109.5925),
    Park::new("Canyonlands", 38.2136, -109.9025),
    Park::new("Mesa Verde", 37.2309, -108.4618),
    Park::new("Grand Canyon", 36.0544, -112.1401),
    Park::new("Petrified Forest", 34.9100, -109.8068),
];

// ============================================================================
// Rockies
// ============================================================================

pub const ROCKIES: &[Park] = &[
    Park::new("Yellowstone", 44.4280, -110.5885),
    Park::new("Grand Teton", 43.7904, -110.6818),
    Park::new("Glacier", 48.7596, -113.7870),
    Park::new("Rocky Mountain", 40.3428, -105.6836),
    Park::new("Great Sand Dunes", 37.7916, -105.5943),
    Park::new("Black Canyon of the Gunnison", 38.5754, -107.7416),
];

// ============================================================================
// East
// ============================================================================

pub const EAST: &[Park] = &[
    Park::new("Acadia", 44.3386, -68.2733),
    Park::new("Shenandoah", 38.2928, -78.6796),
    Park::new("Great Smoky Mountains", 35.6118, -83.4895),
    Park::new("Mammoth Cave", 37.1862, -86.1000),
    Park::new("Everglades", 25.2866, -80.8987),
];

pub fn all_parks() -> Vec<Park> {
    let mut all = Vec::with_capacity(COLORADO_PLATEAU.len() + ROCKIES.len() + EAST.len());
    all.extend_from_slice(COLORADO_PLATEAU);
    all.extend_from_slice(ROCKIES);
    all.extend_from_slice(EAST);
    all
}

pub fn park_set(parks: &[Park]) -> LocationSet {
    LocationSet::new(parks.iter().map(Park::location).collect()).expect("fixture names are unique")
}

/// The first `count` parks as a location set.
pub fn sample_parks(count: usize) -> LocationSet {
    park_set(&all_parks()[..count])
}

/// Three points one degree apart on the prime meridian: A(0,0), B(1,0), C(2,0).
pub fn meridian_line() -> LocationSet {
    LocationSet::new(vec![
        Location::new("A", 0.0, 0.0).unwrap(),
        Location::new("B", 1.0, 0.0).unwrap(),
        Location::new("C", 2.0, 0.0).unwrap(),
    ])
    .unwrap()
}
