//! Construction-time failures for a [`crate::Board`].
//!
//! Per the error-handling design, malformed boards are precondition
//! violations caught at construction and returned in-band as a `Result`;
//! they are never something a running search recovers from. Invariant
//! breaches *during* a move (box count changing, two players existing)
//! are a different class of failure - programmer error, never user
//! input - and are asserted instead of raised (see `Board::push`).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("level has no rows")]
    EmptyLevel,

    #[error("level contains an unrecognized character {0:?}")]
    UnknownChar(char),

    #[error("level must have exactly one player, found {0}")]
    NoPlayer(usize),

    #[error("box count ({boxes}) and goal count ({goals}) must match")]
    BoxGoalMismatch { boxes: usize, goals: usize },
}
