//! Greedy nearest-neighbor construction.

use super::two_opt::two_opt;
use super::SequencedRoute;
use crate::geometry::DistanceMatrix;

/// Path from node 0 that always moves to the nearest unvisited node.
pub fn nearest_neighbor_path(matrix: &DistanceMatrix) -> Vec<usize> {
    let n = matrix.len();
    if n == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut path = Vec::with_capacity(n);
    let mut current = 0;
    visited[current] = true;
    path.push(current);

    while let Some(next) = matrix.nearest(current, &visited) {
        visited[next] = true;
        path.push(next);
        current = next;
    }

    path
}

/// Nearest-neighbor path refined by 2-opt. Deterministic for a given matrix.
pub fn sequence_nearest_neighbor(matrix: &DistanceMatrix) -> SequencedRoute {
    let mut path = nearest_neighbor_path(matrix);
    two_opt(&mut path, matrix);

    SequencedRoute {
        path_distance: matrix.path_length(&path),
        tour_distance: matrix.tour_length(&path),
        stops: path,
    }
}
