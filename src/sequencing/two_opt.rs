//! 2-Opt improvement of an open path.

use crate::geometry::DistanceMatrix;
use log::trace;

/// Smallest length reduction accepted as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Apply first-improvement 2-opt until no reversal shortens the path.
///
/// Scans pairs `(i, j)` with `1 <= i` and `j > i + 1`, reversing positions
/// `i..=j` on the first improving pair and restarting the scan. The first
/// node never moves and the path is not closed. Returns the number of moves.
pub fn two_opt(path: &mut [usize], matrix: &DistanceMatrix) -> usize {
    let n = path.len();
    let mut moves = 0;

    loop {
        let mut improved = false;

        'scan: for i in 1..n {
            for j in (i + 2)..n {
                let delta = evaluate_reversal(path, matrix, i, j);

                if delta < -IMPROVEMENT_EPSILON {
                    path[i..=j].reverse();
                    moves += 1;
                    improved = true;
                    trace!("2-opt move {}: reversed {}..={} (delta {:.6})", moves, i, j, delta);
                    break 'scan;
                }
            }
        }

        if !improved {
            break;
        }
    }

    moves
}

/// Length change of reversing `path[i..=j]`, for `i >= 1`.
pub fn evaluate_reversal(path: &[usize], matrix: &DistanceMatrix, i: usize, j: usize) -> f64 {
    let before = path[i - 1];
    let first = path[i];
    let last = path[j];

    let mut old_cost = matrix.get(before, first);
    let mut new_cost = matrix.get(before, last);

    if let Some(&after) = path.get(j + 1) {
        old_cost += matrix.get(last, after);
        new_cost += matrix.get(first, after);
    }

    new_cost - old_cost
}
