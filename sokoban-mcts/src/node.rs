//! Search tree node: statistics, children-by-move, and the pruning rules
//! that keep the tree free of dead subtrees.
//!
//! ## Architecture
//! - Level 2: selection, backpropagation, pruning (operated on by `SearchTree`)
//! - Level 3: UCT+variance scoring
//! - Level 4: node accessors

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::seq::IteratorRandom;
use rand::Rng;
use sokoban_core::{Board, Push, Reward, RewardKind, StateHash};

/// Exploration constant for the UCT term. Spec default; see
/// `MctsConfig::c_puct` for the configurable value actually used.
pub const C_PUCT: f64 = 32.0;
/// Additive floor under the variance term, guaranteeing it stays positive
/// even when a child's backpropagated values have zero spread. Spec
/// default; see `MctsConfig::d`.
pub const D: f64 = 8.0;

/// A node is reference-counted and interior-mutable: the tree holds one
/// owning `NodeRef` per live state (via `children`, and the registry's own
/// clone of the same `Rc`), while the back-pointer to `parent` is a `Weak`
/// so the ownership graph stays acyclic. See `SearchTree::remove` for how
/// a node's forward edges are severed before it is dropped.
pub type NodeRef = Rc<RefCell<Node>>;

/// A node in the MCTS tree: one board position plus the statistics
/// accumulated from every simulation that passed through it.
#[derive(Debug)]
pub struct Node {
    pub state: Board,
    pub parent: Option<Weak<RefCell<Node>>>,
    /// The push that produced this node from its parent; `None` at root.
    pub incoming_move: Option<Push>,
    pub depth: u32,
    pub children: std::collections::BTreeMap<Push, NodeRef>,
    pub n: u32,
    pub q: f64,
    pub sum_of_squares: f64,
    pub reward: Reward,
    /// Best reward ever observed anywhere in this node's subtree.
    pub max_value: Reward,
}

impl Node {
    pub fn new_root(state: Board) -> NodeRef {
        let reward = state.reward();
        Rc::new(RefCell::new(Node {
            state,
            parent: None,
            incoming_move: None,
            depth: 0,
            children: Default::default(),
            n: 0,
            q: 0.0,
            sum_of_squares: 0.0,
            reward,
            max_value: reward,
        }))
    }

    fn new_child(parent: &NodeRef, mv: Push, state: Board) -> NodeRef {
        let reward = state.reward();
        let depth = parent.borrow().depth + 1;
        Rc::new(RefCell::new(Node {
            state,
            parent: Some(Rc::downgrade(parent)),
            incoming_move: Some(mv),
            depth,
            children: Default::default(),
            n: 0,
            q: 0.0,
            sum_of_squares: 0.0,
            reward,
            max_value: reward,
        }))
    }

    pub fn hash(&self) -> &StateHash {
        self.state.hash()
    }

    /// A node is worth keeping only if it has surviving children or its
    /// subtree has already proven a win; otherwise pruning removes it.
    pub fn should_remove(&self) -> bool {
        self.children.is_empty() && self.max_value.kind != RewardKind::Win
    }

    /// UCT-with-variance score used to rank children. `parent_n` is this
    /// node's own visit count (the parent, from the child's perspective).
    fn score(child: &Node, parent_n: u32, c_puct: f64, d: f64) -> f64 {
        let n = f64::from(child.n);
        let exploration = c_puct * (2.0 * (parent_n as f64).ln() / n).sqrt();
        let variance = (child.sum_of_squares / n - child.q * child.q + d).sqrt();
        child.q + exploration + variance
    }

    /// Pick a child to descend into: any never-visited child uniformly,
    /// else the highest-scoring child (ties broken uniformly).
    pub fn select_child<R: Rng>(&self, c_puct: f64, d: f64, rng: &mut R) -> Option<NodeRef> {
        let unvisited: Vec<&NodeRef> = self.children.values().filter(|c| c.borrow().n == 0).collect();
        if !unvisited.is_empty() {
            return unvisited.into_iter().choose(rng).cloned();
        }

        let mut best_score = f64::NEG_INFINITY;
        let mut best: Vec<&NodeRef> = Vec::new();
        for child in self.children.values() {
            let s = Self::score(&child.borrow(), self.n, c_puct, d);
            if s > best_score {
                best_score = s;
                best.clear();
                best.push(child);
            } else if s == best_score {
                best.push(child);
            }
        }
        best.into_iter().choose(rng).cloned()
    }

    /// Among children, the one whose `max_value` is largest (ties broken
    /// uniformly). This is max-of-subtree, not most-visited: the goal is
    /// to find any discovered win, not the most-explored line.
    pub fn select_move<R: Rng>(&self, rng: &mut R) -> Option<Push> {
        let mut best_value = f64::NEG_INFINITY;
        let mut best: Vec<Push> = Vec::new();
        for (mv, child) in &self.children {
            let v = child.borrow().max_value.value;
            if v > best_value {
                best_value = v;
                best.clear();
                best.push(*mv);
            } else if v == best_value {
                best.push(*mv);
            }
        }
        best.into_iter().choose(rng)
    }
}

/// Expand `node` with fresh successors, registering each in `tree.nodes`
/// and returning the ones just created (before any loss-pruning). Returns
/// an empty vec both when every push leads to an already-known state and
/// when `node` has no valid pushes at all - in both cases the caller
/// removes `node` itself.
///
/// Kept as a free function (rather than a `SearchTree` method) because it
/// needs to build children via `Node::new_child`, which does not belong on
/// the tree's own API surface.
pub(crate) fn expand_children(node: &NodeRef, existing: impl Fn(&StateHash) -> bool) -> Vec<NodeRef> {
    let mut fresh = Vec::new();
    let moves = node.borrow().state.valid_moves();
    for mv in moves {
        let successor = node.borrow().state.push(mv);
        if existing(successor.hash()) {
            continue;
        }
        let child = Node::new_child(node, mv, successor);
        node.borrow_mut().children.insert(mv, child.clone());
        fresh.push(child);
    }
    fresh
}
