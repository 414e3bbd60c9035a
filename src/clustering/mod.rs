//! Region clustering of orders by coordinate.

pub mod dbscan;
pub mod kmeans;

use crate::config::ClusterConfig;
use crate::error::{Result, RoutingError};
use crate::problem::{Coordinate, Order, RegionId};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How orders are grouped into regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Fixed number of clusters around centroids (k-means)
    Centroid { clusters: usize },
    /// Density-based clusters with an unclustered outcome (DBSCAN)
    Density { radius_km: f64, min_points: usize },
}

impl ClusterMethod {
    /// Resolve a method name as used on the command line.
    pub fn from_name(name: &str, clusters: usize, radius_km: f64, min_points: usize) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "kmeans" | "k-means" | "centroid" => Ok(ClusterMethod::Centroid { clusters }),
            "dbscan" | "density" => Ok(ClusterMethod::Density {
                radius_km,
                min_points,
            }),
            _ => Err(RoutingError::InvalidMethod {
                name: name.to_string(),
                expected: "kmeans, dbscan",
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClusterMethod::Centroid { .. } => "kmeans",
            ClusterMethod::Density { .. } => "dbscan",
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            ClusterMethod::Centroid { clusters: 0 } => Err(RoutingError::InvalidInput(
                "centroid clustering needs at least one cluster".to_string(),
            )),
            ClusterMethod::Density { radius_km, .. } if !(radius_km >= 0.0) || !radius_km.is_finite() => {
                Err(RoutingError::InvalidInput(format!(
                    "density radius must be a finite, non-negative distance, got {}",
                    radius_km
                )))
            }
            ClusterMethod::Density { min_points: 0, .. } => Err(RoutingError::InvalidInput(
                "density clustering needs a minimum of at least one point".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Outcome of a clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusteringSummary {
    /// Number of distinct regions formed
    pub clusters: usize,
    /// Orders left with the unclustered sentinel
    pub unclustered: usize,
    /// Number of partitions clustered independently
    pub partitions: usize,
}

/// Assigns a region to every order.
pub struct RegionClusterer {
    config: ClusterConfig,
}

impl RegionClusterer {
    /// Create a new clusterer.
    pub fn new(config: ClusterConfig) -> Self {
        RegionClusterer { config }
    }

    /// Cluster the orders in place.
    ///
    /// Nothing is written unless the whole input validates. Cluster ids are
    /// offset per partition so they stay unique across cities.
    pub fn cluster(&self, orders: &mut [Order]) -> Result<ClusteringSummary> {
        self.config.method.validate()?;

        if orders.is_empty() {
            return Err(RoutingError::InvalidInput(
                "cannot cluster an empty order set".to_string(),
            ));
        }

        let mut coordinates = Vec::with_capacity(orders.len());
        for order in orders.iter() {
            coordinates.push(order.require_coordinate()?);
            if self.config.city_scoped && order.city.trim().is_empty() {
                return Err(RoutingError::InvalidInput(format!(
                    "order {} has no delivery city",
                    order.id
                )));
            }
        }

        let partitions = self.partition(orders);
        let mut summary = ClusteringSummary {
            partitions: partitions.len(),
            ..ClusteringSummary::default()
        };
        let mut offset = 0u32;

        for (city, members) in &partitions {
            let points: Vec<Coordinate> = members.iter().map(|&i| coordinates[i]).collect();
            let (labels, clusters) = self.cluster_points(&points);

            for (&order_index, label) in members.iter().zip(labels) {
                let region = match label {
                    Some(label) => RegionId::Cluster(offset + label as u32),
                    None => {
                        summary.unclustered += 1;
                        RegionId::Unclustered
                    }
                };
                orders[order_index].region = Some(region);
            }

            debug!(
                "Partition '{}': {} orders in {} clusters starting at id {}",
                city,
                members.len(),
                clusters,
                offset
            );

            offset += clusters as u32;
            summary.clusters += clusters;
        }

        info!(
            "Clustered {} orders with {} into {} regions ({} unclustered)",
            orders.len(),
            self.config.method.name(),
            summary.clusters,
            summary.unclustered
        );

        Ok(summary)
    }

    /// Group order indices by city, or into a single group when not city-scoped.
    fn partition(&self, orders: &[Order]) -> BTreeMap<String, Vec<usize>> {
        let mut partitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (index, order) in orders.iter().enumerate() {
            let key = if self.config.city_scoped {
                order.city.trim().to_string()
            } else {
                String::new()
            };
            partitions.entry(key).or_default().push(index);
        }

        partitions
    }

    /// Labels per point (`None` = unclustered) and the number of clusters formed.
    fn cluster_points(&self, points: &[Coordinate]) -> (Vec<Option<usize>>, usize) {
        match self.config.method {
            ClusterMethod::Centroid { clusters } => {
                let k = clusters.min(points.len());
                let labels = kmeans::kmeans(points, k, self.config.seed, self.config.max_iterations);
                (labels.into_iter().map(Some).collect(), k)
            }
            ClusterMethod::Density {
                radius_km,
                min_points,
            } => {
                let labels = dbscan::dbscan(points, radius_km, min_points);
                let clusters = labels.iter().flatten().max().map_or(0, |&max| max + 1);
                (labels, clusters)
            }
        }
    }
}

/// Cluster orders with the given settings.
pub fn cluster_orders(orders: &mut [Order], config: &ClusterConfig) -> Result<ClusteringSummary> {
    RegionClusterer::new(config.clone()).cluster(orders)
}
