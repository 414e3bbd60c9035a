//! # Delivery Router
//!
//! Plans delivery routes for a fleet in three stages:
//!
//! 1. orders are grouped into geographic regions (k-means or DBSCAN),
//! 2. each region's orders are packed into numbered vehicle loads under
//!    weight and box capacity,
//! 3. each region's stops are put in visiting order, either by a genetic
//!    search or by nearest neighbor refined with 2-opt.
//!
//! The [`Planner`] runs the stages in order and labels every assigned order
//! with its load and position in the route.

pub mod allocation;
pub mod clustering;
pub mod config;
pub mod error;
pub mod external;
pub mod genetic;
pub mod geometry;
pub mod individual;
pub mod population;
pub mod problem;
pub mod sequencing;
pub mod solution;
pub mod utils;

use crate::allocation::{AllocationReport, LoadAllocator};
use crate::clustering::{ClusteringSummary, RegionClusterer};
use crate::config::Config;
use crate::error::Result;
use crate::problem::{validate_orders, Coordinate, Order, RegionId, Vehicle};
use crate::sequencing::{RouteSequencer, SequencedRoute};
use crate::solution::{
    assign_delivery_labels, delivery_records, map_data, summarize, DeliveryRecord, MapData,
    RegionVehicleSummary,
};
use crate::utils::PlanStatistics;

use log::info;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// The visiting order of one region.
#[derive(Debug, Clone)]
pub struct RegionRoute {
    /// Order ids in visiting order
    pub order_ids: Vec<String>,
    pub route: SequencedRoute,
}

/// Everything a planning run produced.
#[derive(Debug)]
pub struct Plan {
    /// Input orders augmented with region, load, vehicle and delivery label
    pub orders: Vec<Order>,
    pub clustering: ClusteringSummary,
    pub allocation: AllocationReport,
    pub routes: BTreeMap<RegionId, RegionRoute>,
    pub summaries: Vec<RegionVehicleSummary>,
    pub map: MapData,
    pub run_time: Duration,
}

impl Plan {
    /// Output table, one row per order in input order.
    pub fn records(&self) -> Vec<DeliveryRecord> {
        delivery_records(&self.orders)
    }

    /// Sum of the driven path lengths over all regions.
    pub fn total_distance(&self) -> f64 {
        self.routes.values().map(|region| region.route.path_distance).sum()
    }

    pub fn statistics(&self) -> PlanStatistics {
        PlanStatistics {
            orders: self.orders.len(),
            regions: self.clustering.clusters,
            unclustered: self.clustering.unclustered,
            loads: self.allocation.loads.len(),
            allocated: self.allocation.allocated,
            allocation_rate: self.allocation.allocation_rate(),
            capacity_violations: self.allocation.violations.len(),
            total_distance: self.total_distance(),
            runtime: self.run_time,
        }
    }
}

/// Runs clustering, allocation and sequencing over one order set.
pub struct Planner {
    config: Config,
    sequencer: RouteSequencer,
}

impl Planner {
    /// Create a new planner for the given configuration.
    pub fn new(config: Config) -> Self {
        let sequencer = RouteSequencer::new(config.sequencing.clone());
        Planner { config, sequencer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sequencer(&self) -> &RouteSequencer {
        &self.sequencer
    }

    /// Plan deliveries for `orders` with the given fleet.
    ///
    /// Fails on invalid input. Orders no vehicle could take are reported in
    /// [`Plan::allocation`] and keep no load or label.
    pub fn plan(&mut self, mut orders: Vec<Order>, vehicles: &[Vehicle]) -> Result<Plan> {
        let start_time = Instant::now();

        validate_orders(&orders)?;
        // Ids may come back with new coordinates in a later run
        self.sequencer.cache_mut().clear();

        let clustering = RegionClusterer::new(self.config.clustering.clone()).cluster(&mut orders)?;
        let allocation = LoadAllocator::new(self.config.allocation.clone()).allocate(&mut orders, vehicles)?;
        let routes = self.sequence_regions(&mut orders)?;

        assign_delivery_labels(&mut orders);

        let summaries = summarize(&orders);
        let map = map_data(&orders, self.config.sequencing.origin);
        let run_time = start_time.elapsed();

        info!(
            "Planned {} orders in {} regions and {} loads in {:.2?}",
            orders.len(),
            routes.len(),
            allocation.loads.len(),
            run_time
        );

        Ok(Plan {
            orders,
            clustering,
            allocation,
            routes,
            summaries,
            map,
            run_time,
        })
    }

    /// Sequence every region in ascending order and record each order's position.
    fn sequence_regions(&mut self, orders: &mut [Order]) -> Result<BTreeMap<RegionId, RegionRoute>> {
        let mut regions: BTreeMap<RegionId, Vec<usize>> = BTreeMap::new();
        for (index, order) in orders.iter_mut().enumerate() {
            order.sequence_index = None;
            if let Some(region) = order.region {
                regions.entry(region).or_default().push(index);
            }
        }

        let mut routes = BTreeMap::new();

        for (region, members) in regions {
            let stop_ids: Vec<String> = members.iter().map(|&i| orders[i].id.clone()).collect();
            let stops = members
                .iter()
                .map(|&i| orders[i].require_coordinate())
                .collect::<Result<Vec<Coordinate>>>()?;

            let route = self.sequencer.sequence(&stop_ids, &stops)?;

            for (stop, position) in route.positions(members.len()).into_iter().enumerate() {
                orders[members[stop]].sequence_index = position;
            }

            let order_ids = route.stops.iter().map(|&stop| stop_ids[stop].clone()).collect();
            routes.insert(region, RegionRoute { order_ids, route });
        }

        Ok(routes)
    }
}
