//! Sokoban core - board representation, push-move generation, and the
//! box-to-goal matching heuristic.
//!
//! This crate provides the immutable game model a Sokoban search sits on
//! top of:
//! - Grid geometry and the fixed level-character table (`cell`)
//! - Push-move generation, canonical hashing, and deadlock detection (`board`)
//! - Reward classification (STEP / WIN / LOSS) (`reward`)
//! - The minimum-cost box-to-goal matching oracle (`matcher`)
//! - Construction-time and post-move error variants (`error`)

pub mod board;
pub mod cell;
pub mod error;
pub mod matcher;
pub mod reward;

pub use board::{Board, Direction, Pos, Push, StateHash};
pub use cell::Cell;
pub use error::BoardError;
pub use reward::{Reward, RewardKind};
