//! Genetic sequencing over a complete graph of stops and depot.

use super::{SequencedRoute, TourKind};
use crate::config::GeneticConfig;
use crate::error::Result;
use crate::genetic::{ordered_crossover, swap_mutation, GeneticEngine, GeneticProblem};
use crate::geometry::{DistanceMatrix, DistanceMetric};
use crate::problem::Coordinate;
use itertools::Itertools;
use petgraph::graph::UnGraph;
use rand::seq::SliceRandom;
use rand::Rng;

/// Traveling-salesman instance over the nodes of a distance matrix.
pub struct TspProblem<'a> {
    matrix: &'a DistanceMatrix,
    kind: TourKind,
    anchor: usize,
}

impl<'a> TspProblem<'a> {
    /// Create a new problem; `anchor` is where an anchored path starts.
    pub fn new(matrix: &'a DistanceMatrix, kind: TourKind, anchor: usize) -> Self {
        TspProblem {
            matrix,
            kind,
            anchor,
        }
    }

    /// Length of a permutation under this problem's tour kind.
    pub fn length(&self, tour: &[usize]) -> f64 {
        match self.kind {
            TourKind::Cycle => self.matrix.tour_length(tour),
            TourKind::AnchoredPath => self.matrix.path_length(&rotate_to(tour, self.anchor)),
        }
    }
}

impl GeneticProblem for TspProblem<'_> {
    type Candidate = Vec<usize>;

    fn random_candidate<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut tour: Vec<usize> = (0..self.matrix.len()).collect();
        tour.shuffle(rng);
        tour
    }

    fn fitness(&self, tour: &Vec<usize>) -> f64 {
        -self.length(tour)
    }

    fn crossover<R: Rng>(&self, parent1: &Vec<usize>, parent2: &Vec<usize>, rng: &mut R) -> Vec<usize> {
        ordered_crossover(parent1, parent2, rng)
    }

    fn mutate<R: Rng>(&self, tour: &mut Vec<usize>, rate: f64, rng: &mut R) {
        swap_mutation(tour, rate, rng);
    }
}

/// Rotate a tour so that it starts at `start`; unchanged when `start` is absent.
pub fn rotate_to(tour: &[usize], start: usize) -> Vec<usize> {
    match tour.iter().position(|&node| node == start) {
        Some(position) => tour[position..].iter().chain(&tour[..position]).copied().collect(),
        None => tour.to_vec(),
    }
}

/// Complete graph over the stops followed by the depot, weighted by `metric`.
pub fn build_graph(
    stops: &[Coordinate],
    depot: Option<Coordinate>,
    metric: DistanceMetric,
) -> UnGraph<Coordinate, f64> {
    let mut graph = UnGraph::with_capacity(stops.len() + 1, stops.len() * (stops.len() + 1) / 2);

    let nodes: Vec<_> = stops.iter().chain(depot.iter()).map(|&point| graph.add_node(point)).collect();

    for (a, b) in nodes.iter().tuple_combinations() {
        let weight = metric.distance(graph[*a], graph[*b]);
        graph.add_edge(*a, *b, weight);
    }

    graph
}

/// Sequence the stops with a genetic search.
///
/// The depot, when given, takes part in the permutation as the last node of
/// the graph. The best permutation is rotated to start at the depot and the
/// depot is then dropped from the stop list.
pub fn sequence_genetic(
    stops: &[Coordinate],
    depot: Option<Coordinate>,
    metric: DistanceMetric,
    kind: TourKind,
    config: &GeneticConfig,
) -> Result<SequencedRoute> {
    if stops.is_empty() {
        return Ok(SequencedRoute::empty());
    }

    let graph = build_graph(stops, depot, metric);
    let matrix = DistanceMatrix::from_graph(&graph);
    let anchor = if depot.is_some() { stops.len() } else { 0 };

    let problem = TspProblem::new(&matrix, kind, anchor);
    let evolution = GeneticEngine::new(config.clone()).run(&problem)?;

    let tour = rotate_to(&evolution.best, anchor);
    let stops_only = tour.iter().copied().filter(|&node| node < stops.len()).collect();

    Ok(SequencedRoute {
        stops: stops_only,
        path_distance: matrix.path_length(&tour),
        tour_distance: matrix.tour_length(&tour),
    })
}
