//! Bounded breadth-first rollout: an upper-bound probe, not a random
//! playout.
//!
//! ## Architecture
//! - Level 3: BFS coordination
//! - Level 4: frontier bookkeeping

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use sokoban_core::{Board, Reward, RewardKind, StateHash};

/// Depth cutoff for `rollout`, in pushes. Spec default.
pub const LOOKAHEAD: u32 = 7;

/// Breadth-first search from `start`, up to `lookahead` pushes deep,
/// looking for a winning successor and tracking the best reward value
/// seen along the way. Fully deterministic: the only source of ordering
/// is `Board::valid_moves`'s `BTreeSet`, so two calls on the same board
/// always explore states in the same order.
///
/// A `WIN` successor short-circuits immediately. A `LOSS` successor is
/// not enqueued - it has no children worth exploring - but does not fail
/// the probe. Everything else (`STEP`) is enqueued and folded into the
/// running best-value reward.
pub fn rollout(start: &Board, lookahead: u32) -> Reward {
    let mut visited: FxHashSet<StateHash> = FxHashSet::default();
    visited.insert(start.hash().clone());

    let mut best = start.reward();
    let mut frontier: VecDeque<(Board, u32)> = VecDeque::new();
    frontier.push_back((start.clone(), 0));

    while let Some((board, depth)) = frontier.pop_front() {
        if depth >= lookahead {
            continue;
        }

        for mv in board.valid_moves() {
            let successor = board.push(mv);
            if !visited.insert(successor.hash().clone()) {
                continue;
            }

            let reward = successor.reward();
            match reward.kind {
                RewardKind::Win => return reward,
                RewardKind::Step => {
                    if reward.value > best.value {
                        best = reward;
                    }
                    frontier.push_back((successor, depth + 1));
                }
                RewardKind::Loss => {}
            }
        }
    }

    best
}
