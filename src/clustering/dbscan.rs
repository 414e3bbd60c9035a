//! Density-based clustering (DBSCAN) under the great-circle metric.

use crate::geometry::{haversine_radians, EARTH_RADIUS_KM};
use crate::problem::Coordinate;
use std::collections::HashSet;

#[derive(Clone, Copy, PartialEq, Eq)]
enum PointType {
    Unvisited,
    Noise,
    Clustered(usize),
}

/// Cluster points whose neighborhoods hold at least `min_points` points.
///
/// A neighborhood is every point (the point itself included) within
/// `radius_km` along the great circle. Returns a cluster label per point,
/// numbered from 0 in discovery order, or `None` for unclustered points.
pub fn dbscan(points: &[Coordinate], radius_km: f64, min_points: usize) -> Vec<Option<usize>> {
    let radians: Vec<(f64, f64)> = points.iter().map(|point| point.to_radians()).collect();
    let radius = radius_km / EARTH_RADIUS_KM;

    let neighborhood = |index: usize| -> Vec<usize> {
        let (lat, lon) = radians[index];
        radians
            .iter()
            .enumerate()
            .filter(|&(_, &(other_lat, other_lon))| {
                haversine_radians(lat, lon, other_lat, other_lon) <= radius
            })
            .map(|(other, _)| other)
            .collect()
    };

    let mut point_types = vec![PointType::Unvisited; points.len()];
    let mut clusters = 0;

    for point in 0..points.len() {
        if point_types[point] != PointType::Unvisited {
            continue;
        }

        let mut neighbors = neighborhood(point);
        if neighbors.len() < min_points {
            point_types[point] = PointType::Noise;
            continue;
        }

        let cluster = clusters;
        clusters += 1;
        point_types[point] = PointType::Clustered(cluster);

        let mut queued: HashSet<usize> = neighbors.iter().copied().collect();
        let mut index = 0;
        while index < neighbors.len() {
            let other = neighbors[index];
            index += 1;

            match point_types[other] {
                PointType::Clustered(_) => continue,
                PointType::Noise => {
                    // border point: joins the cluster but does not expand it
                    point_types[other] = PointType::Clustered(cluster);
                    continue;
                }
                PointType::Unvisited => point_types[other] = PointType::Clustered(cluster),
            }

            let other_neighbors = neighborhood(other);
            if other_neighbors.len() >= min_points {
                for candidate in other_neighbors {
                    if queued.insert(candidate) {
                        neighbors.push(candidate);
                    }
                }
            }
        }
    }

    point_types
        .into_iter()
        .map(|point_type| match point_type {
            PointType::Clustered(cluster) => Some(cluster),
            _ => None,
        })
        .collect()
}
