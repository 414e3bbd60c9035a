//! Genetic bin packing: every order mapped to one vehicle.

use super::{assign_load, AllocationReport};
use crate::config::AllocationConfig;
use crate::error::Result;
use crate::genetic::{reassign_mutation, uniform_crossover, GeneticEngine, GeneticProblem};
use crate::problem::{Order, RegionId, Vehicle};
use log::{info, warn};
use rand::Rng;
use std::collections::BTreeMap;

/// Fitness penalty per vehicle loaded beyond its capacity.
pub const CAPACITY_PENALTY: f64 = 1000.0;

/// Orders to pack into a fleet. A candidate holds one vehicle index per order.
pub struct BinPackingProblem {
    weights: Vec<f64>,
    boxes: Vec<f64>,
    vehicles: Vec<Vehicle>,
}

impl BinPackingProblem {
    /// Create a new problem; `vehicles` carry their already scaled capacities.
    pub fn new(orders: &[&Order], vehicles: Vec<Vehicle>) -> Self {
        BinPackingProblem {
            weights: orders.iter().map(|order| order.weight).collect(),
            boxes: orders.iter().map(|order| order.boxes as f64).collect(),
            vehicles,
        }
    }

    pub fn order_count(&self) -> usize {
        self.weights.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Summed weight and boxes per vehicle.
    pub fn totals(&self, assignment: &[usize]) -> Vec<(f64, f64)> {
        let mut totals = vec![(0.0, 0.0); self.vehicles.len()];
        for (order, &vehicle) in assignment.iter().enumerate() {
            totals[vehicle].0 += self.weights[order];
            totals[vehicle].1 += self.boxes[order];
        }
        totals
    }

    /// Number of vehicles loaded beyond weight or box capacity.
    pub fn overloaded(&self, assignment: &[usize]) -> usize {
        self.totals(assignment)
            .iter()
            .zip(&self.vehicles)
            .filter(|((weight, boxes), vehicle)| {
                *weight > vehicle.weight_capacity || *boxes > vehicle.box_capacity
            })
            .count()
    }
}

impl GeneticProblem for BinPackingProblem {
    type Candidate = Vec<usize>;

    fn random_candidate<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        (0..self.order_count())
            .map(|_| rng.gen_range(0..self.vehicles.len()))
            .collect()
    }

    fn fitness(&self, assignment: &Vec<usize>) -> f64 {
        self.totals(assignment)
            .iter()
            .zip(&self.vehicles)
            .map(|(&(weight, boxes), vehicle)| {
                if weight > vehicle.weight_capacity || boxes > vehicle.box_capacity {
                    -CAPACITY_PENALTY
                } else {
                    weight + boxes
                }
            })
            .sum()
    }

    fn crossover<R: Rng>(&self, parent1: &Vec<usize>, parent2: &Vec<usize>, rng: &mut R) -> Vec<usize> {
        uniform_crossover(parent1, parent2, rng)
    }

    fn mutate<R: Rng>(&self, assignment: &mut Vec<usize>, rate: f64, rng: &mut R) {
        reassign_mutation(assignment, self.vehicles.len(), rate, rng);
    }

    fn is_admissible(&self, assignment: &Vec<usize>) -> bool {
        self.overloaded(assignment) == 0
    }
}

/// Allocate with the genetic strategy.
///
/// Each used vehicle receives its orders region by region, ascending, as
/// consecutive loads of at most `max_orders_per_load` orders. Vehicles are
/// taken in fleet order.
pub(crate) fn allocate(
    orders: &mut [Order],
    fleet: Vec<Vehicle>,
    config: &AllocationConfig,
) -> Result<AllocationReport> {
    let mut report = AllocationReport::default();

    let candidates: Vec<usize> = orders
        .iter()
        .enumerate()
        .filter(|(_, order)| match order.region {
            Some(RegionId::Unclustered) => config.include_unclustered,
            Some(_) => true,
            None => false,
        })
        .map(|(index, _)| index)
        .collect();

    if fleet.is_empty() || candidates.is_empty() {
        return Ok(report);
    }

    let problem = {
        let members: Vec<&Order> = candidates.iter().map(|&i| &orders[i]).collect();
        BinPackingProblem::new(&members, fleet)
    };

    let evolution = GeneticEngine::new(config.genetic.clone()).run(&problem)?;
    let overloaded = problem.overloaded(&evolution.best);
    if overloaded > 0 {
        warn!(
            "Best assignment found still overloads {} vehicles (fitness {:.2})",
            overloaded, evolution.best_fitness
        );
    }
    info!(
        "Genetic allocation: fitness {:.2} after {} generations, {} children discarded",
        evolution.best_fitness, evolution.generations, evolution.discarded
    );

    let mut next_load = 1u32;
    for (vehicle_index, vehicle) in problem.vehicles().iter().enumerate() {
        let mut regions: BTreeMap<RegionId, Vec<usize>> = BTreeMap::new();
        for (&order_index, _) in candidates
            .iter()
            .zip(&evolution.best)
            .filter(|(_, &assigned)| assigned == vehicle_index)
        {
            if let Some(region) = orders[order_index].region {
                regions.entry(region).or_default().push(order_index);
            }
        }

        // Loads never span regions, routes are sequenced per region
        for (region, members) in regions {
            for chunk in members.chunks(config.max_orders_per_load) {
                report
                    .loads
                    .push(assign_load(orders, chunk, next_load, vehicle, Some(region)));
                next_load += 1;
            }
        }
    }

    Ok(report)
}
