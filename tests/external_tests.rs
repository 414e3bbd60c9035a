//! Tests for the geocoding fallback chain and the external solver seam.

use delivery_router::error::RoutingError;
use delivery_router::external::*;
use delivery_router::geometry::{DistanceMatrix, DistanceMetric};
use delivery_router::problem::{Coordinate, Order};

/// A geocoder that only knows one street.
fn street_geocoder(address: &str) -> Option<Coordinate> {
    if address == "Rua Augusta, 1500" {
        Some(Coordinate::new(-23.556, -46.662))
    } else {
        None
    }
}

fn unlocated(id: &str, address: &str) -> Order {
    let mut order = Order::new(id, Coordinate::new(0.0, 0.0), 1.0, 1).with_address(address);
    order.coordinate = None;
    order
}

/// Sends every vehicle but the first home empty.
struct SingleRouteSolver;

impl VrpSolver for SingleRouteSolver {
    fn solve(&self, matrix: &DistanceMatrix, vehicle_count: usize, depot: usize) -> Option<Vec<Vec<usize>>> {
        let mut routes = vec![vec![depot, depot]; vehicle_count];
        routes[0] = std::iter::once(depot)
            .chain((0..matrix.len()).filter(|&node| node != depot))
            .chain(std::iter::once(depot))
            .collect();
        Some(routes)
    }
}

/// Never finds a solution.
struct FailingSolver;

impl VrpSolver for FailingSolver {
    fn solve(&self, _matrix: &DistanceMatrix, _vehicle_count: usize, _depot: usize) -> Option<Vec<Vec<usize>>> {
        None
    }
}

/// Returns routes that never leave the depot.
struct IdleSolver;

impl VrpSolver for IdleSolver {
    fn solve(&self, _matrix: &DistanceMatrix, vehicle_count: usize, depot: usize) -> Option<Vec<Vec<usize>>> {
        Some(vec![vec![depot]; vehicle_count])
    }
}

fn create_test_matrix() -> DistanceMatrix {
    let points = vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 1.0),
        Coordinate::new(1.0, 1.0),
    ];
    DistanceMatrix::from_coordinates(&points, DistanceMetric::Euclidean)
}

#[test]
fn test_resolver_chain_order() {
    let manual = Coordinate::new(-23.96, -46.33);
    let fallback = Coordinate::new(-23.55, -46.63);
    let resolver = GeocodeResolver::new(Some(street_geocoder))
        .with_manual("Av. Ana Costa, 200", manual)
        .with_manual("Rua Augusta, 1500", manual)
        .with_default(fallback);

    // The geocoder wins over the manual table
    assert_eq!(
        resolver.resolve("Rua Augusta, 1500"),
        Some((Coordinate::new(-23.556, -46.662), GeocodeSource::Geocoder))
    );
    assert_eq!(
        resolver.resolve("Av. Ana Costa, 200"),
        Some((manual, GeocodeSource::Manual))
    );
    // Manual entries match the exact address only
    assert_eq!(
        resolver.resolve("av. ana costa, 200"),
        Some((fallback, GeocodeSource::Default))
    );
}

#[test]
fn test_resolver_without_geocoder_or_default() {
    let resolver: GeocodeResolver<fn(&str) -> Option<Coordinate>> = GeocodeResolver::new(None);

    assert_eq!(resolver.resolve("Rua Augusta, 1500"), None);
}

#[test]
fn test_non_finite_geocoder_answers_fall_through() {
    let broken = |_: &str| Some(Coordinate::new(f64::NAN, 0.0));
    let manual = Coordinate::new(-22.90, -43.20);
    let resolver = GeocodeResolver::new(Some(broken)).with_manual("Praia de Botafogo", manual);

    assert_eq!(
        resolver.resolve("Praia de Botafogo"),
        Some((manual, GeocodeSource::Manual))
    );
}

#[test]
fn test_fill_missing_coordinates() {
    let located = Order::new("P0", Coordinate::new(-23.0, -46.0), 1.0, 1).with_address("Rua Augusta, 1500");
    let mut orders = vec![
        located.clone(),
        unlocated("P1", "Rua Augusta, 1500"),
        unlocated("P2", "Estrada Velha, km 3"),
    ];
    let resolver = GeocodeResolver::new(Some(street_geocoder));

    let report = resolver.fill_missing(&mut orders);

    // Orders that already have a coordinate are left alone
    assert_eq!(orders[0], located);
    assert_eq!(orders[1].coordinate, Some(Coordinate::new(-23.556, -46.662)));
    assert_eq!(orders[2].coordinate, None);

    assert_eq!(report.resolved, vec![("P1".to_string(), GeocodeSource::Geocoder)]);
    assert_eq!(report.unresolved, vec!["P2".to_string()]);
}

#[test]
fn test_external_solver_unavailable() {
    let result = solve_with_external(None, &create_test_matrix(), 2, 0);

    match result {
        Err(error) => {
            assert!(matches!(error, RoutingError::SolverUnavailable));
            assert!(error.is_recoverable());
        }
        Ok(routes) => panic!("expected SolverUnavailable, got {:?}", routes),
    }
}

#[test]
fn test_external_solver_routes() {
    let matrix = create_test_matrix();

    let routes = solve_with_external(Some(&SingleRouteSolver as &dyn VrpSolver), &matrix, 2, 0).unwrap();

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0], vec![0, 1, 2, 0]);
}

#[test]
fn test_external_solver_failures() {
    let matrix = create_test_matrix();

    assert!(matches!(
        solve_with_external(Some(&FailingSolver as &dyn VrpSolver), &matrix, 2, 0),
        Err(RoutingError::NoRouteFound(_))
    ));
    assert!(matches!(
        solve_with_external(Some(&IdleSolver as &dyn VrpSolver), &matrix, 2, 0),
        Err(RoutingError::NoRouteFound(_))
    ));
    assert!(matches!(
        solve_with_external(Some(&SingleRouteSolver as &dyn VrpSolver), &matrix, 2, 7),
        Err(RoutingError::InvalidInput(_))
    ));
    assert!(matches!(
        solve_with_external(Some(&SingleRouteSolver as &dyn VrpSolver), &matrix, 0, 0),
        Err(RoutingError::InvalidInput(_))
    ));
}
