//! Centroid clustering (k-means) over raw latitude/longitude.

use crate::geometry::euclidean;
use crate::problem::Coordinate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Partition `points` into exactly `k` non-empty clusters.
///
/// Centers are seeded with k-means++ from `seed` and refined with Lloyd
/// iterations. Requires `k <= points.len()`; returns one label in `0..k` per
/// point.
pub fn kmeans(points: &[Coordinate], k: usize, seed: u64, max_iterations: usize) -> Vec<usize> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }
    if k == 1 {
        return vec![0; points.len()];
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centers = initial_centers(points, k, &mut rng);

    let mut labels = assign(points, &centers);
    repair_empty(points, &mut labels, &mut centers);

    for _ in 0..max_iterations {
        centers = update_centers(points, &labels, &centers);

        let mut next = assign(points, &centers);
        repair_empty(points, &mut next, &mut centers);

        if next == labels {
            break;
        }
        labels = next;
    }

    labels
}

/// k-means++ seeding.
fn initial_centers<R: Rng>(points: &[Coordinate], k: usize, rng: &mut R) -> Vec<Coordinate> {
    let mut centers = vec![points[rng.gen_range(0..points.len())]];

    while centers.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|&point| {
                centers
                    .iter()
                    .map(|&center| euclidean(point, center).powi(2))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            weights
                .iter()
                .position(|&weight| {
                    cumulative += weight;
                    cumulative > target
                })
                .unwrap_or(points.len() - 1)
        } else {
            rng.gen_range(0..points.len())
        };

        centers.push(points[chosen]);
    }

    centers
}

/// Nearest center per point; ties go to the lowest center index.
fn assign(points: &[Coordinate], centers: &[Coordinate]) -> Vec<usize> {
    points
        .iter()
        .map(|&point| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (index, &center) in centers.iter().enumerate() {
                let distance = euclidean(point, center);
                if distance < best_distance {
                    best = index;
                    best_distance = distance;
                }
            }
            best
        })
        .collect()
}

/// Give every empty cluster the point farthest from its own center,
/// taken from a cluster that has more than one member.
fn repair_empty(points: &[Coordinate], labels: &mut [usize], centers: &mut [Coordinate]) {
    let mut sizes = vec![0usize; centers.len()];
    for &label in labels.iter() {
        sizes[label] += 1;
    }

    for empty in 0..centers.len() {
        if sizes[empty] > 0 {
            continue;
        }

        let donor = (0..points.len())
            .filter(|&i| sizes[labels[i]] > 1)
            .map(|i| (i, euclidean(points[i], centers[labels[i]])))
            .fold(None, |best: Option<(usize, f64)>, (i, distance)| match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((i, distance)),
            });

        if let Some((point, _)) = donor {
            sizes[labels[point]] -= 1;
            labels[point] = empty;
            sizes[empty] = 1;
            centers[empty] = points[point];
        }
    }
}

/// Mean of each cluster's members; an empty cluster keeps its center.
fn update_centers(points: &[Coordinate], labels: &[usize], centers: &[Coordinate]) -> Vec<Coordinate> {
    let mut sums = vec![(0.0, 0.0, 0usize); centers.len()];

    for (point, &label) in points.iter().zip(labels) {
        let entry = &mut sums[label];
        entry.0 += point.lat;
        entry.1 += point.lon;
        entry.2 += 1;
    }

    sums.iter()
        .zip(centers)
        .map(|(&(lat, lon, count), &center)| {
            if count == 0 {
                center
            } else {
                Coordinate::new(lat / count as f64, lon / count as f64)
            }
        })
        .collect()
}
