//! Seams to services outside the crate: geocoding and external VRP solvers.
//!
//! Neither service is implemented here. Callers plug in their own
//! [`Geocoder`] or [`VrpSolver`] and the crate handles the fallbacks.

use crate::error::{Result, RoutingError};
use crate::geometry::DistanceMatrix;
use crate::problem::{Coordinate, Order};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Resolves a free-text address to a coordinate.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Option<Coordinate>;
}

impl<F> Geocoder for F
where
    F: Fn(&str) -> Option<Coordinate>,
{
    fn geocode(&self, address: &str) -> Option<Coordinate> {
        self(address)
    }
}

/// Which fallback produced a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeSource {
    Geocoder,
    /// Manual table keyed by exact address
    Manual,
    /// The caller's default coordinate
    Default,
}

/// Outcome of filling in missing order coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeReport {
    /// Order ids and the source that located them
    pub resolved: Vec<(String, GeocodeSource)>,
    /// Orders that are still without a coordinate
    pub unresolved: Vec<String>,
}

/// Chains a geocoder, a manual address table and a default coordinate.
pub struct GeocodeResolver<G> {
    geocoder: Option<G>,
    manual: HashMap<String, Coordinate>,
    default: Option<Coordinate>,
}

impl<G: Geocoder> GeocodeResolver<G> {
    /// Create a resolver; `None` skips the geocoder step.
    pub fn new(geocoder: Option<G>) -> Self {
        GeocodeResolver {
            geocoder,
            manual: HashMap::new(),
            default: None,
        }
    }

    /// Add a manual coordinate for an exact address.
    pub fn with_manual(mut self, address: impl Into<String>, coordinate: Coordinate) -> Self {
        self.manual.insert(address.into(), coordinate);
        self
    }

    /// Coordinate used when every other source fails.
    pub fn with_default(mut self, coordinate: Coordinate) -> Self {
        self.default = Some(coordinate);
        self
    }

    /// Resolve one address through the chain.
    pub fn resolve(&self, address: &str) -> Option<(Coordinate, GeocodeSource)> {
        let geocoded = self
            .geocoder
            .as_ref()
            .and_then(|geocoder| geocoder.geocode(address))
            .filter(Coordinate::is_finite);

        if let Some(coordinate) = geocoded {
            return Some((coordinate, GeocodeSource::Geocoder));
        }
        if let Some(&coordinate) = self.manual.get(address) {
            return Some((coordinate, GeocodeSource::Manual));
        }
        self.default.map(|coordinate| (coordinate, GeocodeSource::Default))
    }

    /// Fill in the coordinate of every order that lacks one.
    pub fn fill_missing(&self, orders: &mut [Order]) -> GeocodeReport {
        let mut report = GeocodeReport::default();

        for order in orders.iter_mut().filter(|order| order.coordinate.is_none()) {
            match self.resolve(&order.address) {
                Some((coordinate, source)) => {
                    debug!("Order {} located via {:?}", order.id, source);
                    order.coordinate = Some(coordinate);
                    report.resolved.push((order.id.clone(), source));
                }
                None => {
                    warn!("Could not locate order {} at '{}'", order.id, order.address);
                    report.unresolved.push(order.id.clone());
                }
            }
        }

        if !report.resolved.is_empty() || !report.unresolved.is_empty() {
            info!(
                "Geocoding: {} located, {} unresolved",
                report.resolved.len(),
                report.unresolved.len()
            );
        }

        report
    }
}

/// An external multi-vehicle routing solver.
pub trait VrpSolver {
    /// One node sequence per vehicle, or `None` when no solution was found.
    fn solve(&self, matrix: &DistanceMatrix, vehicle_count: usize, depot: usize) -> Option<Vec<Vec<usize>>>;
}

/// Route with an external solver if one is configured.
///
/// Fails with `SolverUnavailable` when `solver` is `None` and with
/// `NoRouteFound` when the solver returns nothing usable.
pub fn solve_with_external(
    solver: Option<&dyn VrpSolver>,
    matrix: &DistanceMatrix,
    vehicle_count: usize,
    depot: usize,
) -> Result<Vec<Vec<usize>>> {
    let solver = solver.ok_or(RoutingError::SolverUnavailable)?;

    if vehicle_count == 0 {
        return Err(RoutingError::InvalidInput(
            "external routing needs at least one vehicle".to_string(),
        ));
    }
    if depot >= matrix.len() {
        return Err(RoutingError::InvalidInput(format!(
            "depot index {} is outside a matrix of {} nodes",
            depot,
            matrix.len()
        )));
    }

    let routes = solver.solve(matrix, vehicle_count, depot).ok_or_else(|| {
        RoutingError::NoRouteFound(format!(
            "external solver found no solution for {} nodes and {} vehicles",
            matrix.len(),
            vehicle_count
        ))
    })?;

    if matrix.len() > 1 && routes.iter().all(|route| route.iter().all(|&node| node == depot)) {
        return Err(RoutingError::NoRouteFound(
            "external solver returned only empty routes".to_string(),
        ));
    }

    Ok(routes)
}
