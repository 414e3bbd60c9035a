//! Output of a planning run: augmented order records and their aggregations.

use crate::problem::{Coordinate, Order, RegionId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the output table, one per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub order_id: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weight: f64,
    pub boxes: u32,
    /// Cluster id; empty for unclustered orders
    pub region: String,
    /// 0 when unassigned
    pub load: u32,
    pub vehicle: String,
    /// `"{load}-{position}"`; empty when unassigned
    pub delivery_order: String,
}

impl From<&Order> for DeliveryRecord {
    fn from(order: &Order) -> Self {
        DeliveryRecord {
            order_id: order.id.clone(),
            address: order.address.clone(),
            city: order.city.clone(),
            latitude: order.coordinate.map(|c| c.lat),
            longitude: order.coordinate.map(|c| c.lon),
            weight: order.weight,
            boxes: order.boxes,
            region: order
                .region
                .and_then(|region| region.cluster())
                .map(|id| id.to_string())
                .unwrap_or_default(),
            load: order.load_id,
            vehicle: order.vehicle_id.clone(),
            delivery_order: order.delivery_label.clone().unwrap_or_default(),
        }
    }
}

/// Build the output table in input order.
pub fn delivery_records(orders: &[Order]) -> Vec<DeliveryRecord> {
    orders.iter().map(DeliveryRecord::from).collect()
}

/// Label every assigned order with `"{load_id}-{position}"`.
///
/// Positions count from 1 within each load, following `sequence_index`;
/// orders without one come last, in input order. Unassigned orders lose
/// any previous label.
pub fn assign_delivery_labels(orders: &mut [Order]) {
    let mut loads: BTreeMap<u32, Vec<usize>> = BTreeMap::new();

    for (index, order) in orders.iter_mut().enumerate() {
        if order.is_assigned() {
            loads.entry(order.load_id).or_default().push(index);
        } else {
            order.delivery_label = None;
        }
    }

    for (load_id, mut members) in loads {
        members.sort_by_key(|&index| (orders[index].sequence_index.unwrap_or(usize::MAX), index));

        for (position, index) in members.into_iter().enumerate() {
            orders[index].delivery_label = Some(format!("{}-{}", load_id, position + 1));
        }
    }
}

/// Orders, weight and boxes carried by one vehicle within one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionVehicleSummary {
    pub region: Option<RegionId>,
    pub vehicle_id: String,
    pub order_count: usize,
    pub total_weight: f64,
    pub total_boxes: u64,
}

/// Aggregate assigned orders per (region, vehicle), ascending.
pub fn summarize(orders: &[Order]) -> Vec<RegionVehicleSummary> {
    let groups = orders
        .iter()
        .filter(|order| order.is_assigned())
        .sorted_by(|a, b| (a.region, &a.vehicle_id).cmp(&(b.region, &b.vehicle_id)))
        .group_by(|order| (order.region, order.vehicle_id.clone()));

    groups
        .into_iter()
        .map(|((region, vehicle_id), members)| {
            let members: Vec<&Order> = members.collect();
            RegionVehicleSummary {
                region,
                vehicle_id,
                order_count: members.len(),
                total_weight: members.iter().map(|order| order.weight).sum(),
                total_boxes: members.iter().map(|order| order.boxes as u64).sum(),
            }
        })
        .collect()
}

/// A labelled point on the delivery map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub coordinate: Coordinate,
    pub label: String,
}

/// Input of the map visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub origin: Option<Coordinate>,
    pub markers: Vec<MapMarker>,
}

/// Markers for every located order, labelled by delivery order when assigned.
pub fn map_data(orders: &[Order], origin: Option<Coordinate>) -> MapData {
    let markers = orders
        .iter()
        .filter_map(|order| {
            let coordinate = order.coordinate?;
            let label = match &order.delivery_label {
                Some(label) => format!("{} ({})", order.id, label),
                None => order.id.clone(),
            };
            Some(MapMarker { coordinate, label })
        })
        .collect();

    MapData { origin, markers }
}
