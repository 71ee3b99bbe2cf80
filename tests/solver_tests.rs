//! Nearest-neighbor tour tests
//!
//! Tours over geodesic park matrices and hand-built network matrices.

mod fixtures;

use std::collections::HashSet;

use rstest::rstest;

use park_tour::geodesic::GeodesicMatrix;
use park_tour::traits::DistanceMatrixProvider;
use park_tour::{
    Distance, DistanceMatrix, Location, LocationSet, MatrixMode, NearestNeighborTourBuilder,
    PlannerError, StopReason, StoredTour, Tour, TourOptions,
};

use fixtures::{COLORADO_PLATEAU, all_parks, meridian_line, park_set};

// ============================================================================
// Helpers
// ============================================================================

fn geodesic(locations: &LocationSet) -> DistanceMatrix {
    GeodesicMatrix::default().matrix_for(locations).unwrap()
}

fn network(names: &[&str], rows: Vec<Vec<Option<f64>>>) -> DistanceMatrix {
    DistanceMatrix::from_rows(
        MatrixMode::Network,
        names.iter().map(|name| name.to_string()).collect(),
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.map_or(Distance::Unreachable, Distance::Miles))
                    .collect()
            })
            .collect(),
    )
    .unwrap()
}

fn leg_sum(tour: &Tour, matrix: &DistanceMatrix) -> f64 {
    tour.indices()
        .windows(2)
        .map(|pair| matrix.get(pair[0], pair[1]).miles().unwrap())
        .sum()
}

fn build(locations: &LocationSet, matrix: &DistanceMatrix, start: &str, options: TourOptions) -> Tour {
    NearestNeighborTourBuilder::new()
        .build(locations, matrix, start, &options)
        .unwrap()
}

// ============================================================================
// Uncapped tours
// ============================================================================

#[test]
fn uncapped_tour_visits_every_park_once() {
    let parks = all_parks();
    let locations = park_set(&parks);
    let matrix = geodesic(&locations);

    let tour = build(&locations, &matrix, "Yellowstone", TourOptions::default());

    assert_eq!(tour.len(), locations.len());
    assert_eq!(tour.start().map(Location::name), Some("Yellowstone"));
    assert_eq!(tour.stop_reason(), StopReason::AllVisited);

    let unique: HashSet<&str> = tour.names().into_iter().collect();
    assert_eq!(unique.len(), locations.len());
}

#[rstest]
#[case("Zion")]
#[case("Arches")]
#[case("Petrified Forest")]
fn total_is_sum_of_legs(#[case] start: &str) {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);

    let tour = build(&locations, &matrix, start, TourOptions::default());

    assert!((tour.total_miles() - leg_sum(&tour, &matrix)).abs() < 1e-9);
    assert!(tour.total_miles() > 0.0);
}

#[test]
fn meridian_tour_walks_the_line() {
    let locations = meridian_line();
    let matrix = geodesic(&locations);

    let tour = build(&locations, &matrix, "A", TourOptions::default());

    assert_eq!(tour.names(), vec!["A", "B", "C"]);
    let ab = matrix.get(0, 1).miles().unwrap();
    let bc = matrix.get(1, 2).miles().unwrap();
    assert!((tour.total_miles() - (ab + bc)).abs() < 1e-9);
}

#[test]
fn each_step_takes_the_closest_remaining_park() {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);
    let tour = build(&locations, &matrix, "Zion", TourOptions::default());

    let order = tour.indices();
    for (step, pair) in order.windows(2).enumerate() {
        let taken = matrix.get(pair[0], pair[1]).miles().unwrap();
        for &later in &order[step + 2..] {
            let skipped = matrix.get(pair[0], later).miles().unwrap();
            assert!(taken <= skipped, "step {step} skipped a closer park");
        }
    }
}

// ============================================================================
// Caps and options
// ============================================================================

#[rstest]
#[case(1)]
#[case(3)]
#[case(8)]
fn max_stops_caps_the_tour(#[case] max_stops: usize) {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);

    let tour = build(
        &locations,
        &matrix,
        "Bryce Canyon",
        TourOptions::default().with_max_stops(max_stops),
    );

    assert_eq!(tour.len(), max_stops);
    assert_eq!(tour.start().map(Location::name), Some("Bryce Canyon"));
    let expected = if max_stops == locations.len() {
        StopReason::AllVisited
    } else {
        StopReason::MaxStops
    };
    assert_eq!(tour.stop_reason(), expected);
}

#[rstest]
#[case(0)]
#[case(9)]
fn max_stops_out_of_range_is_rejected(#[case] max_stops: usize) {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);

    let err = NearestNeighborTourBuilder::new()
        .build(
            &locations,
            &matrix,
            "Zion",
            &TourOptions::default().with_max_stops(max_stops),
        )
        .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(_)), "got {err:?}");
}

#[test]
fn unknown_start_is_not_found() {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);

    let err = NearestNeighborTourBuilder::new()
        .build(&locations, &matrix, "Yosemite", &TourOptions::default())
        .unwrap_err();
    assert_eq!(err, PlannerError::not_found("Yosemite"));
}

#[test]
fn open_tour_does_not_return_to_start() {
    let locations = meridian_line();
    let matrix = geodesic(&locations);

    let closed = build(&locations, &matrix, "A", TourOptions::default());
    let open = build(&locations, &matrix, "A", TourOptions::default().open());

    assert_eq!(closed.waypoints().len(), 4);
    assert_eq!(open.waypoints().len(), 3);
    assert_eq!(closed.total_miles(), open.total_miles());
}

// ============================================================================
// Network matrices
// ============================================================================

#[test]
fn network_tour_avoids_unreachable_hops() {
    let locations = meridian_line();
    let matrix = network(
        &["A", "B", "C"],
        vec![
            vec![Some(0.0), Some(100.0), None],
            vec![Some(100.0), Some(0.0), Some(50.0)],
            vec![None, Some(50.0), Some(0.0)],
        ],
    );

    let tour = build(&locations, &matrix, "A", TourOptions::default());

    assert_eq!(tour.names(), vec!["A", "B", "C"]);
    assert_eq!(tour.total_miles(), 150.0);
    assert_eq!(tour.closing_leg(&matrix), Distance::Unreachable);
}

#[test]
fn network_tour_uses_directed_distances() {
    let locations = meridian_line();
    let matrix = network(
        &["A", "B", "C"],
        vec![
            vec![Some(0.0), Some(10.0), Some(5.0)],
            vec![Some(1.0), Some(0.0), Some(3.0)],
            vec![Some(9.0), Some(2.0), Some(0.0)],
        ],
    );

    let tour = build(&locations, &matrix, "A", TourOptions::default());

    assert_eq!(tour.names(), vec!["A", "C", "B"]);
    assert_eq!(tour.total_miles(), 7.0);
}

#[test]
fn isolated_location_ends_tour_early() {
    let locations = meridian_line();
    let matrix = network(
        &["A", "B", "C"],
        vec![
            vec![Some(0.0), Some(4.0), None],
            vec![Some(4.0), Some(0.0), None],
            vec![None, None, Some(0.0)],
        ],
    );

    let tour = build(&locations, &matrix, "A", TourOptions::default());

    assert_eq!(tour.names(), vec!["A", "B"]);
    assert_eq!(tour.stop_reason(), StopReason::Unreachable);
    assert!(tour.is_blocked());

    let err = NearestNeighborTourBuilder::new()
        .build(&locations, &matrix, "C", &TourOptions::default())
        .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(_)), "got {err:?}");
}

#[test]
fn ties_go_to_the_earlier_location() {
    let locations = LocationSet::new(vec![
        Location::new("Hub", 0.0, 0.0).unwrap(),
        Location::new("East", 0.0, 1.0).unwrap(),
        Location::new("North", 1.0, 0.0).unwrap(),
    ])
    .unwrap();
    let matrix = network(
        &["Hub", "East", "North"],
        vec![
            vec![Some(0.0), Some(5.0), Some(5.0)],
            vec![Some(5.0), Some(0.0), Some(7.0)],
            vec![Some(5.0), Some(7.0), Some(0.0)],
        ],
    );

    let tour = build(&locations, &matrix, "Hub", TourOptions::default());
    assert_eq!(tour.names(), vec!["Hub", "East", "North"]);
}

// ============================================================================
// Stored tours
// ============================================================================

#[test]
fn stored_tour_rebuilds_the_same_tour() {
    let locations = park_set(COLORADO_PLATEAU);
    let matrix = geodesic(&locations);
    let tour = build(&locations, &matrix, "Mesa Verde", TourOptions::default());

    let stored = tour.to_stored();
    let rebuilt = stored.into_tour(&locations, &matrix, true).unwrap();

    assert_eq!(rebuilt.indices(), tour.indices());
    assert!((rebuilt.total_miles() - tour.total_miles()).abs() < 1e-9);
}

#[test]
fn stored_permutation_resolves_by_index() {
    let locations = meridian_line();
    let matrix = geodesic(&locations);

    let tour = StoredTour::Permutation(vec![2, 0, 1])
        .into_tour(&locations, &matrix, false)
        .unwrap();
    assert_eq!(tour.names(), vec!["C", "A", "B"]);
}
