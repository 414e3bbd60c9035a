//! Tests for region clustering with the centroid and density methods.

use delivery_router::clustering::dbscan::dbscan;
use delivery_router::clustering::kmeans::kmeans;
use delivery_router::clustering::{cluster_orders, ClusterMethod, RegionClusterer};
use delivery_router::config::ClusterConfig;
use delivery_router::error::RoutingError;
use delivery_router::problem::{Coordinate, Order, RegionId};
use std::collections::HashSet;

/// Centers of three well separated neighborhoods.
const CENTERS: [(f64, f64); 3] = [(-23.55, -46.63), (-22.90, -43.20), (-19.92, -43.94)];

/// Four orders tightly packed around each center, grouped by center.
fn create_test_orders() -> Vec<Order> {
    let mut orders = Vec::new();
    for (group, &(lat, lon)) in CENTERS.iter().enumerate() {
        for i in 0..4 {
            let offset = i as f64 * 0.001;
            orders.push(Order::new(
                format!("g{}-{}", group, i),
                Coordinate::new(lat + offset, lon - offset),
                1.0,
                1,
            ));
        }
    }
    orders
}

fn config(method: ClusterMethod) -> ClusterConfig {
    ClusterConfig {
        method,
        ..ClusterConfig::default()
    }
}

fn regions(orders: &[Order]) -> Vec<RegionId> {
    orders
        .iter()
        .map(|order| order.region.expect("every order has a region"))
        .collect()
}

#[test]
fn test_centroid_clustering_separates_groups() {
    let mut orders = create_test_orders();
    let clusterer = RegionClusterer::new(config(ClusterMethod::Centroid { clusters: 3 }));

    let summary = clusterer.cluster(&mut orders).unwrap();
    assert_eq!(summary.clusters, 3);
    assert_eq!(summary.unclustered, 0);
    assert_eq!(summary.partitions, 1);

    let regions = regions(&orders);

    // Centroid mode never leaves an order unclustered
    assert!(regions.iter().all(|region| !region.is_unclustered()));

    // Each group lands in a single region, and groups do not share one
    for group in regions.chunks(4) {
        assert!(group.iter().all(|region| *region == group[0]));
    }
    let distinct: HashSet<RegionId> = regions.iter().copied().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_centroid_clustering_caps_clusters_at_order_count() {
    let mut orders = create_test_orders();
    orders.truncate(2);

    let summary = cluster_orders(&mut orders, &config(ClusterMethod::Centroid { clusters: 5 })).unwrap();

    assert_eq!(summary.clusters, 2);
    assert_ne!(orders[0].region, orders[1].region);
}

#[test]
fn test_centroid_clustering_is_reproducible() {
    let mut first = create_test_orders();
    let mut second = create_test_orders();
    let config = config(ClusterMethod::Centroid { clusters: 4 });

    cluster_orders(&mut first, &config).unwrap();
    cluster_orders(&mut second, &config).unwrap();

    assert_eq!(regions(&first), regions(&second));
}

#[test]
fn test_kmeans_produces_exactly_k_non_empty_clusters() {
    // Duplicated points make empty clusters likely without repair
    let mut points = vec![Coordinate::new(0.0, 0.0); 6];
    points.push(Coordinate::new(1.0, 1.0));
    points.push(Coordinate::new(2.0, 2.0));

    let labels = kmeans(&points, 4, 7, 100);

    assert_eq!(labels.len(), points.len());
    let used: HashSet<usize> = labels.iter().copied().collect();
    assert_eq!(used, (0..4).collect());
}

#[test]
fn test_density_clustering_flags_outliers() {
    let mut orders = create_test_orders();
    // Keep two groups and add a lone order far from both
    orders.truncate(8);
    orders.push(Order::new("lonely", Coordinate::new(-15.79, -47.88), 1.0, 1));

    let clusterer = RegionClusterer::new(config(ClusterMethod::Density {
        radius_km: 1.0,
        min_points: 3,
    }));
    let summary = clusterer.cluster(&mut orders).unwrap();

    assert_eq!(summary.clusters, 2);
    assert_eq!(summary.unclustered, 1);
    assert_eq!(orders[8].region, Some(RegionId::Unclustered));

    // The unclustered count matches the sentinel count
    let sentinels = orders
        .iter()
        .filter(|order| order.region == Some(RegionId::Unclustered))
        .count();
    assert_eq!(sentinels, summary.unclustered);

    assert_eq!(orders[0].region, Some(RegionId::Cluster(0)));
    assert_eq!(orders[4].region, Some(RegionId::Cluster(1)));
}

#[test]
fn test_density_clustering_with_zero_radius() {
    // Two points about 1 km apart along a meridian
    let mut orders = vec![
        Order::new("a", Coordinate::new(-23.5500, -46.6300), 1.0, 1),
        Order::new("b", Coordinate::new(-23.5590, -46.6300), 1.0, 1),
    ];

    let summary = cluster_orders(
        &mut orders,
        &config(ClusterMethod::Density {
            radius_km: 0.0,
            min_points: 2,
        }),
    )
    .unwrap();

    assert_eq!(summary.clusters, 0);
    assert_eq!(summary.unclustered, 2);
    assert!(orders.iter().all(|order| order.region == Some(RegionId::Unclustered)));
}

#[test]
fn test_dbscan_border_points_join_cluster() {
    // The point at 0.011 deg is only within reach of the one at 0.005 deg
    let points = vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 0.005),
        Coordinate::new(0.0, 0.001),
        Coordinate::new(0.0, 0.011),
    ];

    let labels = dbscan(&points, 0.7, 3);

    assert_eq!(labels[0], Some(0));
    assert_eq!(labels[1], Some(0));
    assert_eq!(labels[2], Some(0));
    assert_eq!(labels[3], Some(0));
}

#[test]
fn test_city_scoped_ids_are_unique_across_cities() {
    let mut orders = Vec::new();
    for (city, lat) in [("Santos", -23.96), ("Campinas", -22.90)] {
        for i in 0..6 {
            let lon = if i < 3 { -46.30 } else { -46.90 };
            orders.push(
                Order::new(format!("{}-{}", city, i), Coordinate::new(lat + i as f64 * 0.001, lon), 1.0, 1)
                    .with_city(city),
            );
        }
    }

    let clusterer = RegionClusterer::new(ClusterConfig {
        method: ClusterMethod::Centroid { clusters: 2 },
        city_scoped: true,
        ..ClusterConfig::default()
    });
    let summary = clusterer.cluster(&mut orders).unwrap();

    assert_eq!(summary.partitions, 2);
    assert_eq!(summary.clusters, 4);

    let santos: HashSet<RegionId> = orders[..6].iter().filter_map(|order| order.region).collect();
    let campinas: HashSet<RegionId> = orders[6..].iter().filter_map(|order| order.region).collect();

    assert_eq!(santos.len(), 2);
    assert_eq!(campinas.len(), 2);
    assert!(santos.is_disjoint(&campinas));
}

#[test]
fn test_city_scoped_requires_city() {
    let mut orders = create_test_orders();
    let clusterer = RegionClusterer::new(ClusterConfig {
        city_scoped: true,
        ..ClusterConfig::default()
    });

    let result = clusterer.cluster(&mut orders);
    assert!(matches!(result, Err(RoutingError::InvalidInput(_))));
    assert!(orders.iter().all(|order| order.region.is_none()));
}

#[test]
fn test_empty_order_set_is_invalid() {
    let mut orders: Vec<Order> = Vec::new();
    let result = cluster_orders(&mut orders, &ClusterConfig::default());

    assert!(matches!(result, Err(RoutingError::InvalidInput(_))));
}

#[test]
fn test_missing_coordinate_aborts_without_partial_assignment() {
    let mut orders = create_test_orders();
    orders[5].coordinate = None;

    let result = cluster_orders(&mut orders, &ClusterConfig::default());

    assert!(matches!(result, Err(RoutingError::InvalidInput(_))));
    assert!(orders.iter().all(|order| order.region.is_none()));
}

#[test]
fn test_invalid_parameters() {
    let mut orders = create_test_orders();

    let zero_clusters = cluster_orders(&mut orders, &config(ClusterMethod::Centroid { clusters: 0 }));
    assert!(matches!(zero_clusters, Err(RoutingError::InvalidInput(_))));

    let negative_radius = cluster_orders(
        &mut orders,
        &config(ClusterMethod::Density {
            radius_km: -1.0,
            min_points: 2,
        }),
    );
    assert!(matches!(negative_radius, Err(RoutingError::InvalidInput(_))));
}

#[test]
fn test_method_names() {
    assert_eq!(
        ClusterMethod::from_name("KMeans", 4, 1.0, 2).unwrap(),
        ClusterMethod::Centroid { clusters: 4 }
    );
    assert_eq!(
        ClusterMethod::from_name("dbscan", 4, 1.5, 2).unwrap(),
        ClusterMethod::Density {
            radius_km: 1.5,
            min_points: 2
        }
    );
    assert!(matches!(
        ClusterMethod::from_name("hierarchical", 4, 1.0, 2),
        Err(RoutingError::InvalidMethod { .. })
    ));
}
