//! The scalar signal a board position hands back to the search: how good
//! the position looks (`value`) and whether it is terminal (`kind`).

use serde::{Deserialize, Serialize};

/// Classifies a position as ongoing or terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    /// Play continues; `value` is the heuristic estimate only.
    Step,
    /// Every box sits on a goal.
    Win,
    /// No push is reachable, a box is wedged into a wall corner off its
    /// goal, or the step budget is exhausted.
    Loss,
}

/// `value` is `-min_cost_matching(boxes, goals)`: zero at a win, more
/// negative the further the position is from one, regardless of `kind`.
/// Kept alongside `kind` rather than folded into it so the search can use
/// the scalar for ranking even at terminal positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub value: f64,
    pub kind: RewardKind,
}

impl Reward {
    pub fn new(value: f64, kind: RewardKind) -> Self {
        Self { value, kind }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, RewardKind::Step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_step_is_non_terminal() {
        assert!(!Reward::new(0.0, RewardKind::Step).is_terminal());
        assert!(Reward::new(0.0, RewardKind::Win).is_terminal());
        assert!(Reward::new(-3.0, RewardKind::Loss).is_terminal());
    }
}
