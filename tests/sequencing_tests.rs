//! Tests for route sequencing: nearest neighbor, 2-opt and the genetic strategy.

use delivery_router::config::{GeneticConfig, SequencingConfig};
use delivery_router::error::RoutingError;
use delivery_router::geometry::{euclidean, DistanceMatrix, DistanceMetric};
use delivery_router::problem::Coordinate;
use delivery_router::sequencing::genetic::{build_graph, rotate_to};
use delivery_router::sequencing::two_opt::evaluate_reversal;
use delivery_router::sequencing::*;
use proptest::prelude::*;

/// Corners of a unit square; the first corner is the start.
fn unit_square() -> Vec<Coordinate> {
    vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 1.0),
        Coordinate::new(1.0, 1.0),
        Coordinate::new(1.0, 0.0),
    ]
}

fn ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("stop-{}", i)).collect()
}

fn euclidean_config(strategy: SequencingStrategy) -> SequencingConfig {
    SequencingConfig {
        strategy,
        metric: DistanceMetric::Euclidean,
        ..SequencingConfig::default()
    }
}

#[test]
fn test_unit_square_gives_perimeter_path() {
    let square = unit_square();
    let matrix = DistanceMatrix::from_coordinates(&square, DistanceMetric::Euclidean);

    let route = sequence_nearest_neighbor(&matrix);

    // Ties between (0,1) and (1,0) go to the lower index
    assert_eq!(route.stops, vec![0, 1, 2, 3]);
    assert!((route.path_distance - 3.0).abs() < 1e-12);

    // The three stops after the start are covered in 2.0, without a diagonal
    assert!((matrix.path_length(&route.stops[1..]) - 2.0).abs() < 1e-12);

    // Closing the path adds the edge back to the start
    assert!((route.tour_distance - 4.0).abs() < 1e-12);
    assert!((route.closing_distance() - 1.0).abs() < 1e-12);
}

#[test]
fn test_two_opt_removes_crossing() {
    let points = vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(1.0, 1.0),
        Coordinate::new(1.0, 0.0),
        Coordinate::new(0.0, 1.0),
    ];
    let matrix = DistanceMatrix::from_coordinates(&points, DistanceMetric::Euclidean);

    // Both diagonals of the square
    let mut crossing = vec![0, 1, 3, 2];
    let before = matrix.path_length(&crossing);
    let moves = two_opt(&mut crossing, &matrix);

    assert!(moves > 0);
    assert!(matrix.path_length(&crossing) < before);
    assert_eq!(crossing[0], 0);

    // A second pass finds nothing left to improve
    let mut again = crossing.clone();
    assert_eq!(two_opt(&mut again, &matrix), 0);
    assert_eq!(again, crossing);
}

#[test]
fn test_evaluate_reversal_matches_recomputed_length() {
    let points: Vec<Coordinate> = (0..6)
        .map(|i| Coordinate::new((i * 7 % 5) as f64, (i * 3 % 4) as f64))
        .collect();
    let matrix = DistanceMatrix::from_coordinates(&points, DistanceMetric::Euclidean);
    let path: Vec<usize> = (0..6).collect();

    for i in 1..6 {
        for j in (i + 2)..6 {
            let mut reversed = path.clone();
            reversed[i..=j].reverse();
            let expected = matrix.path_length(&reversed) - matrix.path_length(&path);
            assert!((evaluate_reversal(&path, &matrix, i, j) - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn test_nearest_neighbor_visits_every_stop_once() {
    let points: Vec<Coordinate> = (0..12)
        .map(|i| Coordinate::new(-23.5 - (i % 4) as f64 * 0.01, -46.6 - (i / 4) as f64 * 0.01))
        .collect();
    let matrix = DistanceMatrix::from_coordinates(&points, DistanceMetric::Haversine);

    let path = nearest_neighbor_path(&matrix);

    assert_eq!(path[0], 0);
    let mut sorted = path.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..12).collect::<Vec<_>>());
}

#[test]
fn test_sequencer_edge_cases() {
    let mut sequencer = RouteSequencer::new(SequencingConfig::default());

    let empty = sequencer.sequence(&[], &[]).unwrap();
    assert!(empty.stops.is_empty());
    assert_eq!(empty.path_distance, 0.0);

    let single = sequencer
        .sequence(&ids(1), &[Coordinate::new(-23.5, -46.6)])
        .unwrap();
    assert_eq!(single.stops, vec![0]);
    assert_eq!(single.path_distance, 0.0);
    assert_eq!(single.tour_distance, 0.0);

    let mismatched = sequencer.sequence(&ids(2), &[Coordinate::new(0.0, 0.0)]);
    assert!(matches!(mismatched, Err(RoutingError::InvalidInput(_))));

    let broken = sequencer.sequence(&ids(2), &[Coordinate::new(0.0, 0.0), Coordinate::new(f64::NAN, 0.0)]);
    assert!(matches!(broken, Err(RoutingError::InvalidInput(_))));
}

#[test]
fn test_route_positions_by_stop() {
    let route = SequencedRoute {
        stops: vec![2, 0, 1],
        path_distance: 2.0,
        tour_distance: 3.0,
    };

    assert_eq!(route.positions(3), vec![Some(1), Some(2), Some(0)]);
    // Stops the route never visits have no position
    assert_eq!(route.positions(4)[3], None);
    assert_eq!(route.closing_distance(), 1.0);
}

#[test]
fn test_sequencer_caches_matrices() {
    let mut sequencer = RouteSequencer::new(euclidean_config(SequencingStrategy::NearestNeighborTwoOpt));
    let stop_ids = ids(4);

    let first = sequencer.sequence(&stop_ids, &unit_square()).unwrap();
    let second = sequencer.sequence(&stop_ids, &unit_square()).unwrap();

    assert_eq!(first, second);
    assert_eq!(sequencer.cache().misses(), 1);
    assert_eq!(sequencer.cache().hits(), 1);
}

#[test]
fn test_genetic_strategy_with_depot() {
    let square = unit_square();
    let depot = square[0];
    let stops = square[1..].to_vec();

    let mut config = euclidean_config(SequencingStrategy::Genetic);
    config.origin = Some(depot);
    config.genetic = GeneticConfig::new()
        .with_population_size(30)
        .with_generations(30);
    let mut sequencer = RouteSequencer::new(config);

    let route = sequencer.sequence(&ids(3), &stops).unwrap();

    // The depot is not listed; the best closed tour is the perimeter
    let mut visited = route.stops.clone();
    visited.sort_unstable();
    assert_eq!(visited, vec![0, 1, 2]);
    assert!((route.tour_distance - 4.0).abs() < 1e-9);
    assert!((route.path_distance - 3.0).abs() < 1e-9);

    // The difference between both distances is exactly the closing edge
    let last = stops[*route.stops.last().unwrap()];
    assert!((route.closing_distance() - euclidean(last, depot)).abs() < 1e-9);
}

#[test]
fn test_genetic_strategy_without_depot() {
    let points: Vec<Coordinate> = (0..8)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / 8.0;
            Coordinate::new(angle.cos(), angle.sin())
        })
        .collect();

    let route = sequence_genetic(
        &points,
        None,
        DistanceMetric::Euclidean,
        TourKind::Cycle,
        &GeneticConfig::new().with_population_size(60).with_generations(150),
    )
    .unwrap();

    assert_eq!(route.stops.len(), 8);
    assert_eq!(route.stops[0], 0);

    // Input order walks the octagon, the shortest possible tour
    let matrix = DistanceMatrix::from_coordinates(&points, DistanceMetric::Euclidean);
    let input_order: Vec<usize> = (0..8).collect();
    assert!(route.tour_distance >= matrix.tour_length(&input_order) - 1e-9);
    assert!(route.tour_distance <= matrix.tour_length(&input_order) * 1.5);
}

#[test]
fn test_tsp_problem_tour_kinds() {
    let matrix = DistanceMatrix::from_coordinates(&unit_square(), DistanceMetric::Euclidean);
    let tour = vec![2, 3, 0, 1];

    let cycle = TspProblem::new(&matrix, TourKind::Cycle, 0);
    let anchored = TspProblem::new(&matrix, TourKind::AnchoredPath, 0);

    assert!((cycle.length(&tour) - 4.0).abs() < 1e-12);
    // Rotated to [0, 1, 2, 3] and left open
    assert!((anchored.length(&tour) - 3.0).abs() < 1e-12);
}

#[test]
fn test_rotate_and_graph_helpers() {
    assert_eq!(rotate_to(&[3, 1, 0, 2], 0), vec![0, 2, 3, 1]);
    assert_eq!(rotate_to(&[3, 1, 2], 0), vec![3, 1, 2]);

    let stops = unit_square();
    let graph = build_graph(&stops[1..], Some(stops[0]), DistanceMetric::Euclidean);

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 6);

    // The depot is the last node
    let matrix = DistanceMatrix::from_graph(&graph);
    assert!((matrix.get(3, 0) - 1.0).abs() < 1e-12);
}

#[test]
fn test_strategy_names() {
    assert_eq!(
        "genetic".parse::<SequencingStrategy>().unwrap(),
        SequencingStrategy::Genetic
    );
    assert_eq!(
        SequencingStrategy::from_name("2opt").unwrap(),
        SequencingStrategy::NearestNeighborTwoOpt
    );
    assert!(matches!(
        SequencingStrategy::from_name("simulated-annealing"),
        Err(RoutingError::InvalidMethod { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_two_opt_never_lengthens_nearest_neighbor(
        raw in prop::collection::vec((-24.0f64..-23.0, -47.0f64..-46.0), 2..25)
    ) {
        let points: Vec<Coordinate> = raw.iter().map(|&(lat, lon)| Coordinate::new(lat, lon)).collect();
        let matrix = DistanceMatrix::from_coordinates(&points, DistanceMetric::Haversine);

        let initial = nearest_neighbor_path(&matrix);
        let route = sequence_nearest_neighbor(&matrix);

        prop_assert!(route.path_distance <= matrix.path_length(&initial) + 1e-9);
        prop_assert_eq!(route.stops[0], 0);

        let mut again = route.stops.clone();
        prop_assert_eq!(two_opt(&mut again, &matrix), 0);
    }
}
