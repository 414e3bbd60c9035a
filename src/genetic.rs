//! Generic genetic search and the operators shared by its instantiations.
//!
//! A [`GeneticProblem`] describes the candidate representation and its
//! fitness, crossover and mutation. [`GeneticEngine`] runs the generational
//! loop: evaluate, rank, keep the elite, breed the rest from the top-ranked
//! pool and discard children the problem refuses.

use crate::config::GeneticConfig;
use crate::error::{Result, RoutingError};
use crate::individual::Individual;
use crate::population::Population;
use log::{debug, info, warn};
use rand::seq::index;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// A problem the genetic engine can optimize.
pub trait GeneticProblem: Sync {
    type Candidate: Clone + Send + Sync;

    /// Draw a random member of the initial population.
    fn random_candidate<R: Rng>(&self, rng: &mut R) -> Self::Candidate;

    /// Higher is better. Invalid candidates may score a large penalty.
    fn fitness(&self, candidate: &Self::Candidate) -> f64;

    /// Produce one child from two parents.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Candidate,
        parent2: &Self::Candidate,
        rng: &mut R,
    ) -> Self::Candidate;

    /// Mutate a child in place; `rate` is the configured mutation rate.
    fn mutate<R: Rng>(&self, candidate: &mut Self::Candidate, rate: f64, rng: &mut R);

    /// Whether a child may enter the next generation.
    fn is_admissible(&self, _candidate: &Self::Candidate) -> bool {
        true
    }
}

/// Result of a genetic search.
#[derive(Debug, Clone)]
pub struct Evolution<C> {
    /// Best candidate seen in any generation
    pub best: C,
    /// Fitness of `best`
    pub best_fitness: f64,
    /// Best-ever fitness after each evaluated generation, the initial population first
    pub history: Vec<f64>,
    /// Generations actually bred
    pub generations: usize,
    /// Children refused by the admissibility check
    pub discarded: usize,
    /// Whether some generation shrank to its elite only
    pub collapsed: bool,
    /// Size of the last population
    pub final_population: usize,
}

/// Runs the generational loop for any [`GeneticProblem`].
pub struct GeneticEngine {
    config: GeneticConfig,
    rng: ChaCha8Rng,
}

impl GeneticEngine {
    /// Create an engine seeded from the configuration.
    pub fn new(config: GeneticConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        GeneticEngine { config, rng }
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Run the search from a random initial population.
    pub fn run<P: GeneticProblem>(&mut self, problem: &P) -> Result<Evolution<P::Candidate>> {
        let initial = (0..self.config.population_size)
            .map(|_| problem.random_candidate(&mut self.rng))
            .collect();

        self.evolve(problem, initial)
    }

    /// Run the search from the given initial population.
    pub fn evolve<P: GeneticProblem>(
        &mut self,
        problem: &P,
        initial: Vec<P::Candidate>,
    ) -> Result<Evolution<P::Candidate>> {
        let mut population = Population::evaluate(problem, initial);

        let mut best = match population.best() {
            Some(best) => best.clone(),
            None => {
                return Err(RoutingError::InvalidInput(
                    "genetic search needs a non-empty initial population".to_string(),
                ))
            }
        };
        let mut history = vec![best.fitness];
        let mut discarded = 0;
        let mut collapsed = false;
        let mut generations = 0;

        for generation in 0..self.config.generations {
            let (offspring, refused) = self.breed(problem, &population);
            discarded += refused;

            let elite = self.config.elite.min(population.len());
            if offspring.len() <= elite && self.config.population_size > elite {
                if !collapsed {
                    warn!(
                        "Generation {}: every child was discarded, population collapsed to {} elite candidates",
                        generation + 1,
                        offspring.len()
                    );
                }
                collapsed = true;
            }

            population = Population::evaluate(problem, offspring);
            generations += 1;

            if let Some(candidate) = population.best() {
                if candidate.is_better_than(&best) {
                    best = candidate.clone();
                }
            }
            history.push(best.fitness);

            debug!(
                "Generation {}/{}: best = {:.2}, mean = {:.2}, size = {}",
                generation + 1,
                self.config.generations,
                best.fitness,
                population.mean_fitness(),
                population.len()
            );

            if population.is_empty() {
                warn!(
                    "Population is empty after generation {}, stopping search",
                    generation + 1
                );
                break;
            }
        }

        info!(
            "Genetic search finished after {} generations: best fitness = {:.2}",
            generations, best.fitness
        );

        let Individual { candidate, fitness } = best;

        Ok(Evolution {
            best: candidate,
            best_fitness: fitness,
            history,
            generations,
            discarded,
            collapsed,
            final_population: population.len(),
        })
    }

    /// Build the next generation: the elite plus admissible children.
    fn breed<P: GeneticProblem>(
        &mut self,
        problem: &P,
        population: &Population<P::Candidate>,
    ) -> (Vec<P::Candidate>, usize) {
        let slots = self.config.population_size.max(self.config.elite);
        let mut next = population.elite(self.config.elite);
        let mut refused = 0;

        for _ in next.len()..slots {
            let Some((parent1, parent2)) =
                population.select_parents(self.config.parent_pool, &mut self.rng)
            else {
                break;
            };

            let mut child = problem.crossover(&parent1.candidate, &parent2.candidate, &mut self.rng);
            problem.mutate(&mut child, self.config.mutation_rate, &mut self.rng);

            if problem.is_admissible(&child) {
                next.push(child);
            } else {
                refused += 1;
            }
        }

        (next, refused)
    }
}

/// Ordered crossover (OX) with randomly chosen cut points.
pub fn ordered_crossover<R: Rng>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    if parent1.is_empty() {
        return Vec::new();
    }

    let cut1 = rng.gen_range(0..parent1.len());
    let cut2 = rng.gen_range(0..parent1.len());
    let (start, end) = if cut1 <= cut2 { (cut1, cut2) } else { (cut2, cut1) };

    ordered_crossover_between(parent1, parent2, start, end)
}

/// Ordered crossover copying `parent1[start..=end]` into the same positions.
///
/// The remaining positions are filled left to right with the nodes of
/// `parent2` in their order of appearance, skipping nodes already placed.
pub fn ordered_crossover_between(
    parent1: &[usize],
    parent2: &[usize],
    start: usize,
    end: usize,
) -> Vec<usize> {
    let size = parent1.len();
    let mut child: Vec<Option<usize>> = vec![None; size];
    let mut used = HashSet::with_capacity(size);

    for i in start..=end.min(size.saturating_sub(1)) {
        child[i] = Some(parent1[i]);
        used.insert(parent1[i]);
    }

    let mut donors = parent2.iter().filter(|node| !used.contains(*node));
    for slot in child.iter_mut().filter(|slot| slot.is_none()) {
        *slot = donors.next().copied();
    }

    child.into_iter().flatten().collect()
}

/// With probability `rate`, swap two distinct random positions.
pub fn swap_mutation<R: Rng>(tour: &mut [usize], rate: f64, rng: &mut R) {
    if tour.len() < 2 || rng.gen::<f64>() >= rate {
        return;
    }

    let picked = index::sample(rng, tour.len(), 2);
    tour.swap(picked.index(0), picked.index(1));
}

/// Take each gene from either parent with equal probability.
pub fn uniform_crossover<T: Copy, R: Rng>(parent1: &[T], parent2: &[T], rng: &mut R) -> Vec<T> {
    parent1
        .iter()
        .zip(parent2.iter())
        .map(|(&gene1, &gene2)| if rng.gen_bool(0.5) { gene1 } else { gene2 })
        .collect()
}

/// Independently reassign each gene to a uniform value in `0..choices` with probability `rate`.
pub fn reassign_mutation<R: Rng>(genes: &mut [usize], choices: usize, rate: f64, rng: &mut R) {
    if choices == 0 {
        return;
    }

    for gene in genes.iter_mut() {
        if rng.gen::<f64>() < rate {
            *gene = rng.gen_range(0..choices);
        }
    }
}
