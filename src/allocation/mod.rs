//! Capacity-constrained assignment of orders to numbered vehicle loads.

pub mod bin_packing;

use crate::config::AllocationConfig;
use crate::error::{Result, RoutingError};
use crate::problem::{Order, RegionId, Vehicle};
use log::{debug, error, info, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Slack allowed on capacity comparisons of summed floating-point amounts.
const CAPACITY_TOLERANCE: f64 = 1e-9;

/// How eligible orders are prioritized for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Heaviest first, then most boxes
    LargestFirst,
    /// Random order drawn from a seeded source
    RandomSample { seed: u64 },
}

/// How orders are assigned to vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Region by region, vehicle by vehicle packing
    Greedy { policy: SelectionPolicy },
    /// Genetic bin packing over all orders at once
    Genetic,
}

impl AllocationStrategy {
    /// Resolve a strategy name as used on the command line.
    pub fn from_name(name: &str, seed: u64) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "greedy" | "largest_first" | "largest-first" => Ok(AllocationStrategy::Greedy {
                policy: SelectionPolicy::LargestFirst,
            }),
            "random" | "random_sample" | "random-sample" => Ok(AllocationStrategy::Greedy {
                policy: SelectionPolicy::RandomSample { seed },
            }),
            "genetic" | "ga" => Ok(AllocationStrategy::Genetic),
            _ => Err(RoutingError::InvalidMethod {
                name: name.to_string(),
                expected: "greedy, random, genetic",
            }),
        }
    }
}

/// A numbered group of orders bound to one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: u32,
    pub vehicle_id: String,
    /// Region shared by every member, if any
    pub region: Option<RegionId>,
    pub order_ids: Vec<String>,
    pub weight: f64,
    pub boxes: f64,
    /// Scaled weight capacity of the vehicle
    pub weight_capacity: f64,
    /// Scaled box capacity of the vehicle
    pub box_capacity: f64,
    /// False when the load breaks its vehicle's capacity
    pub valid: bool,
}

impl Load {
    fn over_capacity(&self, weight: f64, boxes: f64) -> bool {
        weight > self.weight_capacity + CAPACITY_TOLERANCE
            || boxes > self.box_capacity + CAPACITY_TOLERANCE
    }

    pub fn exceeds_capacity(&self) -> bool {
        self.over_capacity(self.weight, self.boxes)
    }

    /// The violation of this load when its vehicle carries `weight` and
    /// `boxes` over all of its loads.
    fn violation(&self, weight: f64, boxes: f64) -> Option<RoutingError> {
        self.over_capacity(weight, boxes)
            .then(|| RoutingError::CapacityExceeded {
                load_id: self.id,
                vehicle_id: self.vehicle_id.clone(),
                weight,
                weight_capacity: self.weight_capacity,
                boxes,
                box_capacity: self.box_capacity,
            })
    }
}

/// Outcome of an allocation pass.
#[derive(Debug, Default)]
pub struct AllocationReport {
    pub loads: Vec<Load>,
    pub allocated: usize,
    pub total: usize,
    /// Ids of orders no vehicle could take
    pub unassigned: Vec<String>,
    /// Loads found over capacity
    pub violations: Vec<RoutingError>,
}

impl AllocationReport {
    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Share of orders allocated, in percent.
    pub fn allocation_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.allocated as f64 / self.total as f64 * 100.0
    }

    /// `NoAllocation` when some orders were left unassigned.
    pub fn shortfall(&self) -> Option<RoutingError> {
        (!self.is_complete()).then(|| RoutingError::NoAllocation {
            allocated: self.allocated,
            total: self.total,
        })
    }
}

/// A vehicle with capacity left in the current pass.
#[derive(Debug, Clone)]
pub(crate) struct FleetSlot {
    pub vehicle: Vehicle,
    pub remaining_weight: f64,
    pub remaining_boxes: f64,
}

impl FleetSlot {
    fn new(vehicle: Vehicle) -> Self {
        FleetSlot {
            remaining_weight: vehicle.weight_capacity,
            remaining_boxes: vehicle.box_capacity,
            vehicle,
        }
    }

    fn fits(&self, weight: f64, boxes: f64) -> bool {
        weight <= self.remaining_weight + CAPACITY_TOLERANCE
            && boxes <= self.remaining_boxes + CAPACITY_TOLERANCE
    }
}

/// Scale the fleet by the utilization percentage and keep available vehicles.
pub fn scale_fleet(vehicles: &[Vehicle], percentage: f64) -> Vec<Vehicle> {
    vehicles
        .iter()
        .filter(|vehicle| vehicle.available)
        .map(|vehicle| vehicle.scaled(percentage))
        .collect()
}

/// Assigns orders to loads.
pub struct LoadAllocator {
    config: AllocationConfig,
}

impl LoadAllocator {
    /// Create a new allocator.
    pub fn new(config: AllocationConfig) -> Self {
        LoadAllocator { config }
    }

    /// Allocate the clustered orders in place and report the outcome.
    ///
    /// Earlier assignments are cleared first. Partial allocation is a valid
    /// result and is surfaced through [`AllocationReport::shortfall`].
    pub fn allocate(&self, orders: &mut [Order], vehicles: &[Vehicle]) -> Result<AllocationReport> {
        self.validate(orders)?;

        for order in orders.iter_mut() {
            order.load_id = 0;
            order.vehicle_id.clear();
        }

        let fleet = scale_fleet(vehicles, self.config.fleet_utilization);
        if fleet.is_empty() {
            warn!("No available vehicles in a fleet of {}", vehicles.len());
        }

        let mut report = match self.config.strategy {
            AllocationStrategy::Greedy { policy } => self.allocate_greedy(orders, fleet, policy),
            AllocationStrategy::Genetic => bin_packing::allocate(orders, fleet, &self.config)?,
        };

        report.total = orders.len();
        report.allocated = orders.iter().filter(|order| order.is_assigned()).count();
        report.unassigned = orders
            .iter()
            .filter(|order| !order.is_assigned())
            .map(|order| order.id.clone())
            .collect();

        report.violations = validate_loads(&report.loads);
        for violation in &report.violations {
            error!("Allocation defect: {}", violation);
            if let RoutingError::CapacityExceeded { load_id, .. } = violation {
                for load in report.loads.iter_mut().filter(|load| load.id == *load_id) {
                    load.valid = false;
                }
            }
        }

        if !report.is_complete() {
            error!(
                "{} orders could not be assigned to any vehicle: {}",
                report.unassigned.len(),
                report.unassigned.join(", ")
            );
        }

        info!(
            "Allocated orders: {}/{} ({:.2}%) in {} loads",
            report.allocated,
            report.total,
            report.allocation_rate(),
            report.loads.len()
        );

        Ok(report)
    }

    fn validate(&self, orders: &[Order]) -> Result<()> {
        if orders.is_empty() {
            return Err(RoutingError::InvalidInput(
                "cannot allocate an empty order set".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.config.fleet_utilization) {
            return Err(RoutingError::InvalidInput(format!(
                "fleet utilization must be between 0 and 100, got {}",
                self.config.fleet_utilization
            )));
        }
        if self.config.max_orders_per_load == 0 {
            return Err(RoutingError::InvalidInput(
                "a load must hold at least one order".to_string(),
            ));
        }
        if let Some(order) = orders.iter().find(|order| order.region.is_none()) {
            return Err(RoutingError::InvalidInput(format!(
                "order {} has not been assigned a region",
                order.id
            )));
        }
        Ok(())
    }

    /// Order indices grouped by region, ascending, honoring `include_unclustered`.
    fn regions(&self, orders: &[Order]) -> BTreeMap<RegionId, Vec<usize>> {
        let mut regions: BTreeMap<RegionId, Vec<usize>> = BTreeMap::new();

        for (index, order) in orders.iter().enumerate() {
            match order.region {
                Some(RegionId::Unclustered) if !self.config.include_unclustered => {}
                Some(region) => regions.entry(region).or_default().push(index),
                None => {}
            }
        }

        regions
    }

    fn allocate_greedy(
        &self,
        orders: &mut [Order],
        fleet: Vec<Vehicle>,
        policy: SelectionPolicy,
    ) -> AllocationReport {
        let mut fleet: Vec<FleetSlot> = fleet.into_iter().map(FleetSlot::new).collect();
        let mut rng = match policy {
            SelectionPolicy::RandomSample { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
            SelectionPolicy::LargestFirst => None,
        };
        let mut report = AllocationReport::default();
        let mut next_load = 1u32;

        for (region, members) in self.regions(orders) {
            debug!("Allocating {} orders of region {}", members.len(), region);

            for slot in fleet.iter_mut() {
                let pending = members.iter().filter(|&&i| !orders[i].is_assigned()).count();
                if pending == 0 {
                    break;
                }

                let mut eligible: Vec<usize> = members
                    .iter()
                    .copied()
                    .filter(|&i| !orders[i].is_assigned())
                    .filter(|&i| slot.fits(orders[i].weight, orders[i].boxes as f64))
                    .collect();

                match rng.as_mut() {
                    Some(rng) => eligible.shuffle(rng),
                    None => eligible.sort_by(|&a, &b| {
                        orders[b]
                            .weight
                            .total_cmp(&orders[a].weight)
                            .then(orders[b].boxes.cmp(&orders[a].boxes))
                    }),
                }

                let selected = self.select(orders, &eligible, slot);
                if selected.is_empty() {
                    warn!(
                        "No orders were allocated to vehicle {} in region {}",
                        slot.vehicle.id, region
                    );
                    continue;
                }

                let load = assign_load(orders, &selected, next_load, &slot.vehicle, Some(region));
                slot.remaining_weight -= load.weight;
                slot.remaining_boxes -= load.boxes;
                debug!(
                    "Load {}: {} orders on vehicle {} ({:.2} kg, {:.0} boxes)",
                    load.id,
                    load.order_ids.len(),
                    load.vehicle_id,
                    load.weight,
                    load.boxes
                );

                report.loads.push(load);
                next_load += 1;
            }
        }

        report
    }

    /// Take eligible orders in priority order while the running sums fit.
    fn select(&self, orders: &[Order], eligible: &[usize], slot: &FleetSlot) -> Vec<usize> {
        let mut selected = Vec::new();
        let mut weight = 0.0;
        let mut boxes = 0.0;

        for &index in eligible {
            if selected.len() >= self.config.max_orders_per_load {
                break;
            }
            let order = &orders[index];
            if slot.fits(weight + order.weight, boxes + order.boxes as f64) {
                weight += order.weight;
                boxes += order.boxes as f64;
                selected.push(index);
            }
        }

        selected
    }
}

/// Stamp `members` with a load id and vehicle and describe the load.
pub(crate) fn assign_load(
    orders: &mut [Order],
    members: &[usize],
    load_id: u32,
    vehicle: &Vehicle,
    region: Option<RegionId>,
) -> Load {
    let mut load = Load {
        id: load_id,
        vehicle_id: vehicle.id.clone(),
        region,
        order_ids: Vec::with_capacity(members.len()),
        weight: 0.0,
        boxes: 0.0,
        weight_capacity: vehicle.weight_capacity,
        box_capacity: vehicle.box_capacity,
        valid: true,
    };

    for &index in members {
        let order = &mut orders[index];
        order.load_id = load_id;
        order.vehicle_id = vehicle.id.clone();
        load.order_ids.push(order.id.clone());
        load.weight += order.weight;
        load.boxes += order.boxes as f64;
    }

    load
}

/// Capacity violations among the given loads.
///
/// Loads on the same vehicle share its capacity, so every load of a vehicle
/// whose combined weight or boxes exceed it is reported.
pub fn validate_loads(loads: &[Load]) -> Vec<RoutingError> {
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
    for load in loads {
        let total = totals.entry(load.vehicle_id.as_str()).or_insert((0.0, 0.0));
        total.0 += load.weight;
        total.1 += load.boxes;
    }

    loads
        .iter()
        .filter_map(|load| {
            let (weight, boxes) = totals[load.vehicle_id.as_str()];
            load.violation(weight, boxes)
        })
        .collect()
}
