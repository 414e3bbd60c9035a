//! Individual representation for the genetic search population.

use std::cmp::Ordering;

/// A candidate solution together with its evaluated fitness.
#[derive(Debug, Clone)]
pub struct Individual<C> {
    /// The candidate this individual wraps
    pub candidate: C,
    /// Fitness of the candidate, higher is better
    pub fitness: f64,
}

impl<C> Individual<C> {
    /// Create a new individual from an evaluated candidate.
    pub fn new(candidate: C, fitness: f64) -> Self {
        Individual { candidate, fitness }
    }

    /// Ranking order: better fitness first. NaN sorts last.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        match (self.fitness.is_nan(), other.fitness.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => other.fitness.total_cmp(&self.fitness),
        }
    }

    /// Check if this individual is fitter than another.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Less
    }
}
