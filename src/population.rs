//! Population management for the genetic search.

use crate::genetic::GeneticProblem;
use crate::individual::Individual;
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

/// A population ranked by descending fitness.
pub struct Population<C> {
    /// Individuals, best first
    individuals: Vec<Individual<C>>,
}

impl<C: Clone + Send + Sync> Population<C> {
    /// Evaluate every candidate and rank the result.
    ///
    /// Evaluation runs in parallel; ranking is a stable sort, so candidates
    /// with equal fitness keep their original relative order.
    pub fn evaluate<P>(problem: &P, candidates: Vec<C>) -> Self
    where
        P: GeneticProblem<Candidate = C>,
    {
        let mut individuals: Vec<Individual<C>> = candidates
            .into_par_iter()
            .map(|candidate| {
                let fitness = problem.fitness(&candidate);
                Individual::new(candidate, fitness)
            })
            .collect();

        individuals.sort_by(|a, b| a.rank_cmp(b));

        Population { individuals }
    }

    /// Get the population size.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get the fittest individual.
    pub fn best(&self) -> Option<&Individual<C>> {
        self.individuals.first()
    }

    pub fn individuals(&self) -> &[Individual<C>] {
        &self.individuals
    }

    /// Candidates of the `count` fittest individuals, cloned for the next generation.
    pub fn elite(&self, count: usize) -> Vec<C> {
        self.individuals
            .iter()
            .take(count)
            .map(|individual| individual.candidate.clone())
            .collect()
    }

    /// The top-ranked individuals parents are drawn from.
    ///
    /// Shrinks with the population, so a pool smaller than `size` is normal.
    pub fn parent_pool(&self, size: usize) -> &[Individual<C>] {
        let count = size.min(self.individuals.len());
        &self.individuals[..count]
    }

    /// Sample two parents uniformly from the pool of the `pool_size` best.
    ///
    /// Parents are distinct whenever the pool holds at least two individuals.
    pub fn select_parents<R: Rng>(
        &self,
        pool_size: usize,
        rng: &mut R,
    ) -> Option<(&Individual<C>, &Individual<C>)> {
        let pool = self.parent_pool(pool_size.max(1));

        match pool.len() {
            0 => None,
            1 => Some((&pool[0], &pool[0])),
            len => {
                let picked = index::sample(rng, len, 2);
                Some((&pool[picked.index(0)], &pool[picked.index(1)]))
            }
        }
    }

    /// Average fitness of the population.
    pub fn mean_fitness(&self) -> f64 {
        if self.individuals.is_empty() {
            return 0.0;
        }

        let total: f64 = self.individuals.iter().map(|i| i.fitness).sum();
        total / self.individuals.len() as f64
    }
}
