//! Visiting order of a region's stops.
//!
//! Two interchangeable strategies are available: a genetic search over
//! permutations and a nearest-neighbor construction refined by 2-opt.

pub mod genetic;
pub mod nearest_neighbor;
pub mod two_opt;

use crate::config::SequencingConfig;
use crate::error::{Result, RoutingError};
use crate::geometry::DistanceMatrixCache;
use crate::problem::Coordinate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use self::genetic::{sequence_genetic, TspProblem};
pub use self::nearest_neighbor::{nearest_neighbor_path, sequence_nearest_neighbor};
pub use self::two_opt::two_opt;

/// Which heuristic orders the stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencingStrategy {
    /// Genetic search over permutations of stops and depot
    Genetic,
    /// Greedy nearest-neighbor path improved by 2-opt
    NearestNeighborTwoOpt,
}

impl SequencingStrategy {
    /// Resolve a strategy name as used on the command line.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "genetic" | "ga" => Ok(SequencingStrategy::Genetic),
            "nearest_neighbor" | "nearest-neighbor" | "2opt" | "two_opt" | "nn2opt" => {
                Ok(SequencingStrategy::NearestNeighborTwoOpt)
            }
            _ => Err(RoutingError::InvalidMethod {
                name: name.to_string(),
                expected: "genetic, nearest_neighbor",
            }),
        }
    }
}

impl FromStr for SequencingStrategy {
    type Err = RoutingError;

    fn from_str(name: &str) -> Result<Self> {
        SequencingStrategy::from_name(name)
    }
}

/// How the genetic strategy scores a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourKind {
    /// Closed tour, the edge back to the first node included
    #[default]
    Cycle,
    /// Open path starting at the anchor node (the depot when there is one)
    AnchoredPath,
}

/// An ordered visiting sequence of one region's stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedRoute {
    /// Stop indices in visiting order; the depot is never listed
    pub stops: Vec<usize>,
    /// Length of the open path actually driven, from the depot when there is one
    pub path_distance: f64,
    /// Length of the same order as a closed tour
    pub tour_distance: f64,
}

impl SequencedRoute {
    pub fn empty() -> Self {
        SequencedRoute {
            stops: Vec::new(),
            path_distance: 0.0,
            tour_distance: 0.0,
        }
    }

    /// Distance of the return leg the open path does not drive.
    pub fn closing_distance(&self) -> f64 {
        self.tour_distance - self.path_distance
    }

    /// Position of each stop in the route, indexed by stop.
    pub fn positions(&self, stop_count: usize) -> Vec<Option<usize>> {
        let mut positions = vec![None; stop_count];
        for (position, &stop) in self.stops.iter().enumerate() {
            if stop < stop_count {
                positions[stop] = Some(position);
            }
        }
        positions
    }
}

/// Sequences regions with the configured strategy.
///
/// Owns the distance-matrix cache for the matrices it builds.
pub struct RouteSequencer {
    config: SequencingConfig,
    cache: DistanceMatrixCache,
}

impl RouteSequencer {
    /// Create a new sequencer.
    pub fn new(config: SequencingConfig) -> Self {
        RouteSequencer {
            config,
            cache: DistanceMatrixCache::new(),
        }
    }

    pub fn config(&self) -> &SequencingConfig {
        &self.config
    }

    pub fn cache(&self) -> &DistanceMatrixCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DistanceMatrixCache {
        &mut self.cache
    }

    /// Order the stops identified by `stop_ids`, located at `stops`.
    pub fn sequence(&mut self, stop_ids: &[String], stops: &[Coordinate]) -> Result<SequencedRoute> {
        if stop_ids.len() != stops.len() {
            return Err(RoutingError::InvalidInput(format!(
                "{} stop ids given for {} stops",
                stop_ids.len(),
                stops.len()
            )));
        }
        if let Some(stop) = stops.iter().position(|stop| !stop.is_finite()) {
            return Err(RoutingError::InvalidInput(format!(
                "stop {} has a non-finite coordinate",
                stop_ids[stop]
            )));
        }
        if stops.is_empty() {
            return Ok(SequencedRoute::empty());
        }

        let route = match self.config.strategy {
            SequencingStrategy::Genetic => sequence_genetic(
                stops,
                self.config.origin,
                self.config.metric,
                self.config.tour_kind,
                &self.config.genetic,
            )?,
            SequencingStrategy::NearestNeighborTwoOpt => {
                let matrix = self.cache.get_or_build(stop_ids, stops, self.config.metric);
                sequence_nearest_neighbor(matrix)
            }
        };

        debug!(
            "Sequenced {} stops: path {:.2}, closed tour {:.2}",
            route.stops.len(),
            route.path_distance,
            route.tour_distance
        );

        Ok(route)
    }
}
