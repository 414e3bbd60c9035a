//! Configuration parameters for the planning pipeline.

use crate::allocation::{AllocationStrategy, SelectionPolicy};
use crate::clustering::ClusterMethod;
use crate::error::Result;
use crate::geometry::DistanceMetric;
use crate::problem::Coordinate;
use crate::sequencing::{SequencingStrategy, TourKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parameters of the genetic search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of candidates in the initial population
    pub population_size: usize,
    /// Number of generations to evolve
    pub generations: usize,
    /// Mutation probability, interpreted by each problem's mutation operator
    pub mutation_rate: f64,
    /// Candidates copied unmodified into the next generation
    pub elite: usize,
    /// Size of the top-ranked pool parents are drawn from
    pub parent_pool: usize,
    /// Seed of the random source
    pub seed: u64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            elite: 2,
            parent_pool: 10,
            seed: 42,
        }
    }
}

impl GeneticConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        GeneticConfig::default()
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the number of generations.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the number of elite candidates.
    pub fn with_elite(mut self, elite: usize) -> Self {
        self.elite = elite;
        self
    }

    /// Set the size of the parent pool.
    pub fn with_parent_pool(mut self, pool: usize) -> Self {
        self.parent_pool = pool;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Region clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub method: ClusterMethod,
    /// Cluster each delivery city on its own
    pub city_scoped: bool,
    /// Seed for centroid initialization
    pub seed: u64,
    /// Upper bound on centroid refinement rounds
    pub max_iterations: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            method: ClusterMethod::Centroid { clusters: 3 },
            city_scoped: false,
            seed: 42,
            max_iterations: 300,
        }
    }
}

/// Load allocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Share of each vehicle's capacity that may be used, 0-100
    pub fleet_utilization: f64,
    /// Maximum number of orders in one load
    pub max_orders_per_load: usize,
    pub strategy: AllocationStrategy,
    /// Allocate unclustered orders as a final group instead of leaving them out
    pub include_unclustered: bool,
    /// Engine settings for the genetic strategy
    pub genetic: GeneticConfig,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        AllocationConfig {
            fleet_utilization: 100.0,
            max_orders_per_load: 12,
            strategy: AllocationStrategy::Greedy {
                policy: SelectionPolicy::LargestFirst,
            },
            include_unclustered: true,
            genetic: GeneticConfig::default(),
        }
    }
}

/// Route sequencing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencingConfig {
    pub strategy: SequencingStrategy,
    pub metric: DistanceMetric,
    /// Fitness tour kind of the genetic strategy
    pub tour_kind: TourKind,
    /// Fixed starting point of every route
    pub origin: Option<Coordinate>,
    /// Engine settings for the genetic strategy
    pub genetic: GeneticConfig,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        SequencingConfig {
            strategy: SequencingStrategy::NearestNeighborTwoOpt,
            metric: DistanceMetric::Haversine,
            tour_kind: TourKind::Cycle,
            origin: None,
            genetic: GeneticConfig::default()
                .with_population_size(100)
                .with_generations(200)
                .with_mutation_rate(0.2),
        }
    }
}

/// Configuration settings for a full planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clustering: ClusterConfig,
    pub allocation: AllocationConfig,
    pub sequencing: SequencingConfig,
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Set the clustering method.
    pub fn with_cluster_method(mut self, method: ClusterMethod) -> Self {
        self.clustering.method = method;
        self
    }

    /// Cluster each delivery city separately.
    pub fn with_city_scope(mut self, city_scoped: bool) -> Self {
        self.clustering.city_scoped = city_scoped;
        self
    }

    /// Set the fleet utilization percentage.
    pub fn with_fleet_utilization(mut self, percentage: f64) -> Self {
        self.allocation.fleet_utilization = percentage;
        self
    }

    /// Set the maximum number of orders per load.
    pub fn with_max_orders_per_load(mut self, max_orders: usize) -> Self {
        self.allocation.max_orders_per_load = max_orders;
        self
    }

    /// Set the allocation strategy.
    pub fn with_allocation_strategy(mut self, strategy: AllocationStrategy) -> Self {
        self.allocation.strategy = strategy;
        self
    }

    /// Set the sequencing strategy.
    pub fn with_sequencing_strategy(mut self, strategy: SequencingStrategy) -> Self {
        self.sequencing.strategy = strategy;
        self
    }

    /// Set the distance metric used for sequencing.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.sequencing.metric = metric;
        self
    }

    /// Set the route origin.
    pub fn with_origin(mut self, origin: Coordinate) -> Self {
        self.sequencing.origin = Some(origin);
        self
    }

    /// Set one seed for every stochastic stage.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.clustering.seed = seed;
        self.allocation.genetic.seed = seed;
        self.sequencing.genetic.seed = seed;
        if let AllocationStrategy::Greedy {
            policy: SelectionPolicy::RandomSample { seed: policy_seed },
        } = &mut self.allocation.strategy
        {
            *policy_seed = seed;
        }
        self
    }
}
