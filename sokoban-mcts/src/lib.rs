//! SOKOBAN MCTS - transposition-aware Monte Carlo Tree Search over the
//! push graph.
//!
//! This crate provides:
//! - A hash-indexed search tree with upward pruning of dead subtrees
//! - A bounded breadth-first rollout used as the leaf evaluator
//! - Backpropagation of mean-value and max-value statistics
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Mcts (orchestration)
//! - Level 2: search loop, tree operations
//! - Level 3: UCT+variance calculation, expansion, backprop
//! - Level 4: utilities, node accessors

mod node;
mod rollout;
mod search;
mod tree;

pub use node::{NodeRef, C_PUCT, D};
pub use rollout::{rollout, LOOKAHEAD};
pub use search::Mcts;
pub use tree::SearchTree;

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// MCTS configuration. All tunables the spec calls out as "exposed with
/// these defaults": `c_puct`, `d`, `lookahead`, `max_step`, plus the PRNG
/// seed every tie-break and uniform child choice is drawn from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MctsConfig {
    /// UCT exploration constant.
    pub c_puct: f64,
    /// Additive floor under the variance term.
    pub d: f64,
    /// Depth cutoff, in pushes, for the bounded rollout.
    pub lookahead: u32,
    /// Hard step-budget cutoff; boards beyond it are scored LOSS.
    pub max_step: u32,
    /// Seed for the search's PRNG (tie-breaks and child sampling).
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            c_puct: node::C_PUCT,
            d: node::D,
            lookahead: rollout::LOOKAHEAD,
            max_step: 1000,
            seed: 0,
        }
    }
}

impl MctsConfig {
    /// Config fixed to a particular seed, everything else default - the
    /// usual way to get a reproducible search for tests.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
