//! Distances between coordinates and the matrices built from them.

use crate::problem::Coordinate;
use petgraph::graph::UnGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = a.to_radians();
    let (lat2, lon2) = b.to_radians();
    haversine_radians(lat1, lon1, lat2, lon2) * EARTH_RADIUS_KM
}

/// Central angle between two points given in radians.
pub fn haversine_radians(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Planar distance treating degrees as Cartesian units.
pub fn euclidean(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = a.lat - b.lat;
    let dlon = a.lon - b.lon;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// How the distance between two coordinates is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Great-circle kilometres
    #[default]
    Haversine,
    /// Planar distance in degrees
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        match self {
            DistanceMetric::Haversine => haversine_km(a, b),
            DistanceMetric::Euclidean => euclidean(a, b),
        }
    }
}

/// Square, symmetric table of pairwise distances over a fixed node ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    distances: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Build the full matrix for the given coordinates.
    pub fn from_coordinates(coordinates: &[Coordinate], metric: DistanceMetric) -> Self {
        let distances = (0..coordinates.len())
            .into_par_iter()
            .map(|i| {
                coordinates
                    .iter()
                    .enumerate()
                    .map(|(j, &other)| {
                        if i == j {
                            0.0
                        } else {
                            metric.distance(coordinates[i], other)
                        }
                    })
                    .collect()
            })
            .collect();

        DistanceMatrix { distances }
    }

    /// Build the matrix from the edge weights of an undirected graph.
    ///
    /// Node indices of the graph become matrix indices. Pairs without an edge
    /// are unreachable and get an infinite distance.
    pub fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut distances = vec![vec![f64::INFINITY; n]; n];

        for (i, row) in distances.iter_mut().enumerate() {
            row[i] = 0.0;
        }

        for edge in graph.edge_indices() {
            if let (Some((a, b)), Some(&weight)) = (graph.edge_endpoints(edge), graph.edge_weight(edge)) {
                distances[a.index()][b.index()] = weight;
                distances[b.index()][a.index()] = weight;
            }
        }

        DistanceMatrix { distances }
    }

    /// Wrap an existing table. Rows must all have the table's length.
    pub fn from_rows(distances: Vec<Vec<f64>>) -> Self {
        DistanceMatrix { distances }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.distances
    }

    /// Length of the open path visiting `order` front to back.
    pub fn path_length(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|pair| self.get(pair[0], pair[1])).sum()
    }

    /// Length of the closed tour, including the edge back to the first node.
    pub fn tour_length(&self, order: &[usize]) -> f64 {
        match (order.first(), order.last()) {
            (Some(&first), Some(&last)) if order.len() > 1 => {
                self.path_length(order) + self.get(last, first)
            }
            _ => 0.0,
        }
    }

    /// The unvisited node closest to `from`; ties go to the lowest index.
    pub fn nearest(&self, from: usize, visited: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (candidate, &distance) in self.distances[from].iter().enumerate() {
            if visited[candidate] {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((candidate, distance)),
            }
        }

        best.map(|(candidate, _)| candidate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    node_ids: Vec<String>,
    metric: DistanceMetric,
}

/// Distance matrices memoized per node-id set.
///
/// Entries are keyed by the exact, ordered list of node identifiers, so a
/// changed node set never reuses a matrix. Call [`invalidate`](Self::invalidate)
/// when the coordinates behind an unchanged id set move.
#[derive(Debug, Default)]
pub struct DistanceMatrixCache {
    entries: HashMap<CacheKey, DistanceMatrix>,
    hits: usize,
    misses: usize,
}

impl DistanceMatrixCache {
    pub fn new() -> Self {
        DistanceMatrixCache::default()
    }

    /// Return the cached matrix for `node_ids` or build it from `coordinates`.
    pub fn get_or_build(
        &mut self,
        node_ids: &[String],
        coordinates: &[Coordinate],
        metric: DistanceMetric,
    ) -> &DistanceMatrix {
        let key = CacheKey {
            node_ids: node_ids.to_vec(),
            metric,
        };

        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let matrix = DistanceMatrix::from_coordinates(coordinates, metric);
            self.entries.insert(key.clone(), matrix);
        }

        &self.entries[&key]
    }

    /// Drop every matrix built for this node-id set, under any metric.
    pub fn invalidate(&mut self, node_ids: &[String]) {
        self.entries.retain(|key, _| key.node_ids != node_ids);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
