//! Grid cell kinds and the fixed level-character table.

use serde::{Deserialize, Serialize};

/// One cell of a Sokoban grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
    Goal,
    Box,
    BoxOnGoal,
    Player,
    PlayerOnGoal,
}

impl Cell {
    /// Decode a level-file character per the fixed table documented in
    /// the external-interfaces section: `#`=wall, ` `=floor, `.`=goal,
    /// `$`=box, `*`=box-on-goal, `@`=player, `+`=player-on-goal.
    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '#' => Some(Cell::Wall),
            ' ' => Some(Cell::Floor),
            '.' => Some(Cell::Goal),
            '$' => Some(Cell::Box),
            '*' => Some(Cell::BoxOnGoal),
            '@' => Some(Cell::Player),
            '+' => Some(Cell::PlayerOnGoal),
            _ => None,
        }
    }

    /// Encode back to the level-file character table.
    pub fn to_char(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Floor => ' ',
            Cell::Goal => '.',
            Cell::Box => '$',
            Cell::BoxOnGoal => '*',
            Cell::Player => '@',
            Cell::PlayerOnGoal => '+',
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }

    pub fn is_box(self) -> bool {
        matches!(self, Cell::Box | Cell::BoxOnGoal)
    }

    pub fn is_player(self) -> bool {
        matches!(self, Cell::Player | Cell::PlayerOnGoal)
    }

    pub fn has_goal(self) -> bool {
        matches!(self, Cell::Goal | Cell::BoxOnGoal | Cell::PlayerOnGoal)
    }

    /// The underlying floor/goal cell once a box or player vacates it.
    pub fn vacated(self) -> Cell {
        match self {
            Cell::Player => Cell::Floor,
            Cell::PlayerOnGoal => Cell::Goal,
            Cell::Box => Cell::Floor,
            Cell::BoxOnGoal => Cell::Goal,
            other => other,
        }
    }
}
