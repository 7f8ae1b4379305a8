//! Minimum-cost perfect matching oracle (box -> goal assignment).
//!
//! Treated as a pure function with a stable contract, per the design
//! notes: any polynomial assignment algorithm suffices since the search's
//! behavior depends only on the scalar it returns. This implementation is
//! the classic O(n^3) Kuhn-Munkres algorithm with potentials, run over a
//! Manhattan-distance cost matrix.

use crate::board::Pos;

/// Minimum total Manhattan distance of a perfect assignment from `boxes`
/// to `goals`.
///
/// The contract is undefined when `boxes.len() != goals.len()` (spec
/// §4.5): callers - in practice, `Board` construction, which rejects
/// mismatched counts - guarantee equal counts. Debug builds assert it.
pub fn min_cost_matching(boxes: &[Pos], goals: &[Pos]) -> f64 {
    debug_assert_eq!(
        boxes.len(),
        goals.len(),
        "min_cost_matching requires equal box/goal counts"
    );

    let n = boxes.len();
    if n == 0 {
        return 0.0;
    }

    let cost: Vec<Vec<i64>> = boxes
        .iter()
        .map(|b| goals.iter().map(|g| b.manhattan(*g) as i64).collect())
        .collect();

    hungarian(&cost) as f64
}

/// Solves the square assignment problem, returning the minimum total cost.
///
/// 1-indexed internally (the textbook presentation of this algorithm reads
/// far more naturally with a sentinel row/column 0 than translated to
/// 0-indexing throughout).
fn hungarian(cost: &[Vec<i64>]) -> i64 {
    let n = cost.len();
    const INF: i64 = i64::MAX / 4;

    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    // p[j] = row currently matched to column j (1-indexed, 0 = unmatched)
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;

            for j in 1..=n {
                if !used[j] {
                    let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=n).map(|j| cost[p[j] - 1][j - 1]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matching_is_free() {
        assert_eq!(min_cost_matching(&[], &[]), 0.0);
    }

    #[test]
    fn single_box_single_goal_is_manhattan_distance() {
        let boxes = [Pos::new(0, 0)];
        let goals = [Pos::new(3, 4)];
        assert_eq!(min_cost_matching(&boxes, &goals), 7.0);
    }

    #[test]
    fn finds_the_optimal_assignment_not_just_input_order() {
        // Matching goals in listed order would cost (0,0)->(0,1)=1 plus
        // (0,1)->(0,5)=4, total 5. The optimal assignment crosses them:
        // (0,0)->(0,5)=5, (0,1)->(0,1)=0, total 5... pick a layout where
        // crossing is strictly better instead of tied.
        let boxes = [Pos::new(0, 0), Pos::new(0, 5)];
        let goals = [Pos::new(0, 5), Pos::new(0, 0)];
        // Input-order pairing: (0,0)->(0,5)=5, (0,5)->(0,0)=5, total 10.
        // Optimal (swapped) pairing: (0,0)->(0,0)=0, (0,5)->(0,5)=0, total 0.
        assert_eq!(min_cost_matching(&boxes, &goals), 0.0);
    }

    #[test]
    fn already_on_goals_costs_nothing() {
        let positions = [Pos::new(1, 1), Pos::new(2, 2), Pos::new(3, 3)];
        assert_eq!(min_cost_matching(&positions, &positions), 0.0);
    }
}
