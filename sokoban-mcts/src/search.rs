//! MCTS driver: the `run(simulations)` loop, backpropagation, and solution
//! extraction.
//!
//! ## Architecture
//! - Level 1: `Mcts` (orchestration)
//! - Level 2: iteration loop, solution extraction
//! - Level 3: backpropagation, fallback BFS

use std::collections::VecDeque;

use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;
use sokoban_core::{Board, Push, Reward, RewardKind, StateHash};
use tracing::debug;

use crate::node::NodeRef;
use crate::rollout::rollout;
use crate::tree::SearchTree;
use crate::MctsConfig;

/// Owns one search tree for one root board and drives simulations against
/// it. Construct fresh per board; the tree lives for a single `run` call,
/// per the spec's node lifecycle.
pub struct Mcts {
    tree: SearchTree,
    config: MctsConfig,
    rng: ChaCha8Rng,
}

impl Mcts {
    pub fn new(root: Board, config: MctsConfig) -> Self {
        let root = root.with_max_steps(config.max_step);
        Self {
            tree: SearchTree::new(root),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Run up to `simulations` iterations of selection, expansion/rollout,
    /// and backpropagation, stopping early once the root's subtree has
    /// proven a win. Returns the reconstructed push sequence, `Some(vec![])`
    /// if the root is already won, or `None` if the tree is exhausted
    /// before any solution was found.
    pub fn run(&mut self, simulations: usize) -> Option<Vec<Push>> {
        debug!(
            root_hash = ?self.tree.root().map(|r| r.borrow().hash().clone()),
            simulations,
            "starting mcts run"
        );

        for i in 0..simulations {
            let leaf = self
                .tree
                .select_leaf(self.config.c_puct, self.config.d, &mut self.rng)?;

            let n = leaf.borrow().n;
            if n == 0 {
                let reward = rollout(&leaf.borrow().state, self.config.lookahead);
                update(&leaf, reward.value, reward);
            } else {
                self.tree.expand_node(&leaf);
                if let Some(child) = choose_uniform_child(&leaf, &mut self.rng) {
                    let reward = rollout(&child.borrow().state, self.config.lookahead);
                    update(&child, reward.value, reward);
                }
            }

            if root_has_won(&self.tree) {
                debug!(simulation = i, "root proved a win");
                break;
            }
        }

        extract_solution(&self.tree, &mut self.rng)
    }

    /// Single highest-`max_value` root push, ignoring everything rollouts
    /// may have discovered below unexpanded leaves.
    pub fn best_move(&mut self) -> Option<Push> {
        let root = self.tree.root()?;
        let mv = root.borrow().select_move(&mut self.rng);
        mv
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> &SearchTree {
        &self.tree
    }
}

fn root_has_won(tree: &SearchTree) -> bool {
    tree.root()
        .map(|r| r.borrow().max_value.kind == RewardKind::Win)
        .unwrap_or(false)
}

fn choose_uniform_child<R: Rng>(node: &NodeRef, rng: &mut R) -> Option<NodeRef> {
    node.borrow().children.values().cloned().choose(rng)
}

/// Propagate `value`/`max_value` from `node` up to the root. Iterative: the
/// chain walked here is a root-to-leaf path, but an iterative walk costs
/// nothing and matches the pruning cascade's own style.
fn update(node: &NodeRef, value: f64, max_value: Reward) {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        let parent = {
            let mut node = n.borrow_mut();
            let old_n = f64::from(node.n);
            node.q = (node.q * old_n + value) / (old_n + 1.0);
            node.n += 1;
            node.sum_of_squares += value * value;
            if max_value.value > node.max_value.value {
                node.max_value = max_value;
            }
            node.parent.clone()
        };
        current = parent.and_then(|weak| weak.upgrade());
    }
}

/// Reconstruct the winning push sequence once `root.max_value.kind == WIN`.
/// Descends via `select_move` until a childless node; if that node's own
/// state isn't itself a win (the win was only ever seen inside a rollout),
/// completes the path with an unbounded BFS from there. If the root never
/// proved a win, falls back to its single best immediate push.
fn extract_solution<R: Rng>(tree: &SearchTree, rng: &mut R) -> Option<Vec<Push>> {
    let root = tree.root()?;

    if root.borrow().max_value.kind != RewardKind::Win {
        return Some(root.borrow().select_move(rng).into_iter().collect());
    }

    let mut pushes = Vec::new();
    let mut current = root;
    loop {
        let next = {
            let node = current.borrow();
            if node.children.is_empty() {
                None
            } else {
                let mv = node
                    .select_move(rng)
                    .expect("non-empty children set always has a selectable move");
                let child = node
                    .children
                    .get(&mv)
                    .cloned()
                    .expect("select_move only returns keys present in children");
                Some((mv, child))
            }
        };
        match next {
            Some((mv, child)) => {
                pushes.push(mv);
                current = child;
            }
            None => break,
        }
    }

    if current.borrow().reward.kind != RewardKind::Win {
        let state = current.borrow().state.clone();
        let tail = bfs_to_win(&state)
            .expect("root.max_value == WIN guarantees a reachable win from this leaf");
        pushes.extend(tail);
    }

    Some(pushes)
}

/// Unbounded breadth-first search for a winning push sequence from `start`.
/// Unlike `rollout`, this has no depth cutoff and reconstructs the actual
/// path rather than just a best-seen reward - it only ever runs once a
/// rollout has already proven a win is reachable, so termination is
/// guaranteed in practice even though the search itself has no bound.
fn bfs_to_win(start: &Board) -> Option<Vec<Push>> {
    let mut visited: FxHashSet<StateHash> = FxHashSet::default();
    visited.insert(start.hash().clone());

    let mut frontier: VecDeque<(Board, Vec<Push>)> = VecDeque::new();
    frontier.push_back((start.clone(), Vec::new()));

    while let Some((board, path)) = frontier.pop_front() {
        for mv in board.valid_moves() {
            let successor = board.push(mv);
            if !visited.insert(successor.hash().clone()) {
                continue;
            }

            let mut next_path = path.clone();
            next_path.push(mv);

            let reward = successor.reward();
            match reward.kind {
                RewardKind::Win => return Some(next_path),
                RewardKind::Step => frontier.push_back((successor, next_path)),
                RewardKind::Loss => {}
            }
        }
    }

    None
}
