//! Grid geometry, push-move generation, canonical hashing, and the
//! deadlock test.

use std::collections::BTreeSet;
use std::fmt;

use crate::cell::Cell;
use crate::error::BoardError;
use crate::reward::{Reward, RewardKind};

/// Default hard cutoff on pushes since root before a position is LOSS.
pub const DEFAULT_MAX_STEPS: u32 = 1000;

/// A grid coordinate. Signed so neighbor arithmetic never needs to guard
/// against underflow; validity is checked with `Board::in_bounds`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    fn offset(self, d: Direction) -> Pos {
        let (dr, dc) = d.delta();
        Pos::new(self.row + dr, self.col + dc)
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// The four orthogonal push/walk directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// The perpendicular direction used by the corner-deadlock check:
    /// walking the 4-cycle Up, Right, Down, Left and pairing each
    /// direction with the next one clockwise.
    const fn next_clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }
}

/// A single box displacement: the player stands at `player`, adjacent to
/// a box in direction `dir`, and pushes it one cell further in `dir`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Push {
    pub player: Pos,
    pub dir: Direction,
}

/// The canonical transposition key: `(interior, box_positions)` rendered
/// as a stable string. Two boards with the same hash are search-equivalent
/// - they have the same reachable push set regardless of exactly where
/// inside the interior the player happens to stand.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateHash(String);

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable Sokoban position.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Vec<Vec<Cell>>,
    player: Pos,
    steps: u32,
    max_steps: u32,
    interior: BTreeSet<Pos>,
    box_positions: Vec<Pos>,
    hash: StateHash,
}

impl Board {
    /// Parse a level from its text representation (one line per row,
    /// rows right-padded with walls to the longest line), per the fixed
    /// character table: `#`=wall, ` `=floor, `.`=goal, `$`=box,
    /// `*`=box-on-goal, `@`=player, `+`=player-on-goal.
    pub fn parse(text: &str) -> Result<Board, BoardError> {
        Self::parse_with_max_steps(text, DEFAULT_MAX_STEPS)
    }

    pub fn parse_with_max_steps(text: &str, max_steps: u32) -> Result<Board, BoardError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return Err(BoardError::EmptyLevel);
        }

        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut grid = Vec::with_capacity(lines.len());
        for line in &lines {
            let mut row: Vec<Cell> = line
                .chars()
                .map(|c| Cell::from_char(c).ok_or(BoardError::UnknownChar(c)))
                .collect::<Result<_, _>>()?;
            row.resize(width, Cell::Wall);
            grid.push(row);
        }

        let mut players = Vec::new();
        let mut boxes = Vec::new();
        let mut goals = Vec::new();
        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let pos = Pos::new(r as i32, c as i32);
                if cell.is_player() {
                    players.push(pos);
                }
                if cell.is_box() {
                    boxes.push(pos);
                }
                if cell.has_goal() {
                    goals.push(pos);
                }
            }
        }

        if players.len() != 1 {
            return Err(BoardError::NoPlayer(players.len()));
        }
        if boxes.len() != goals.len() {
            return Err(BoardError::BoxGoalMismatch {
                boxes: boxes.len(),
                goals: goals.len(),
            });
        }

        Ok(Board::from_parts(grid, players[0], 0, max_steps))
    }

    fn from_parts(grid: Vec<Vec<Cell>>, player: Pos, steps: u32, max_steps: u32) -> Board {
        let interior = flood_fill_interior(&grid, player);
        let mut box_positions = find_boxes(&grid);
        box_positions.sort();
        let hash = canonical_hash(&interior, &box_positions);

        Board {
            grid,
            player,
            steps,
            max_steps,
            interior,
            box_positions,
            hash,
        }
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn width(&self) -> usize {
        self.grid.first().map(Vec::len).unwrap_or(0)
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Rebuild this board with a different step-budget cutoff, preserving
    /// the grid, player, and step count. Used by callers (the MCTS driver)
    /// that construct a `Board` independently of the budget they want to
    /// search it with.
    pub fn with_max_steps(&self, max_steps: u32) -> Board {
        Board::from_parts(self.grid.clone(), self.player, self.steps, max_steps)
    }

    pub fn interior(&self) -> &BTreeSet<Pos> {
        &self.interior
    }

    pub fn box_positions(&self) -> &[Pos] {
        &self.box_positions
    }

    pub fn goal_positions(&self) -> Vec<Pos> {
        let mut goals: Vec<Pos> = self.cells().filter(|(_, c)| c.has_goal()).map(|(p, _)| p).collect();
        goals.sort();
        goals
    }

    pub fn hash(&self) -> &StateHash {
        &self.hash
    }

    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.grid[pos.row as usize][pos.col as usize])
    }

    fn in_bounds(&self, pos: Pos) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.height() && (pos.col as usize) < self.width()
    }

    fn cells(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        self.grid.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (Pos::new(r as i32, c as i32), *cell))
        })
    }

    /// Every push reachable from the current player-accessible region.
    ///
    /// For each box and each direction `d`, the push `(stand, d)` is valid
    /// when `stand = box - d` lies in the interior and `box + d` is
    /// neither a wall nor another box. Duplicates across boxes/directions
    /// collapse naturally since a `Push` is identified by `(stand, d)`.
    pub fn valid_moves(&self) -> BTreeSet<Push> {
        let mut moves = BTreeSet::new();
        for &box_pos in &self.box_positions {
            for dir in Direction::ALL {
                let stand = box_pos.offset(opposite(dir));
                let dest = box_pos.offset(dir);
                if self.interior.contains(&stand) && !self.blocks_box(dest) {
                    moves.insert(Push { player: stand, dir });
                }
            }
        }
        moves
    }

    fn blocks_box(&self, pos: Pos) -> bool {
        match self.cell(pos) {
            Some(cell) => cell.is_wall() || cell.is_box(),
            None => true,
        }
    }

    /// Apply a push, returning the resulting board. Panics (via
    /// `debug_assert`) if invariants it must preserve - box count, goal
    /// count, exactly one player - are violated; that can only happen if
    /// `push` was not actually a member of `self.valid_moves()`, which is
    /// a programmer error, never user input.
    pub fn push(&self, mv: Push) -> Board {
        let box_pos = mv.player.offset(mv.dir);
        let dest = box_pos.offset(mv.dir);
        debug_assert!(self.cell(box_pos).map(Cell::is_box).unwrap_or(false));

        let mut grid = self.grid.clone();

        let old_player_cell = grid[mv.player.row as usize][mv.player.col as usize];
        grid[mv.player.row as usize][mv.player.col as usize] = old_player_cell.vacated();

        let old_box_cell = grid[box_pos.row as usize][box_pos.col as usize];
        grid[box_pos.row as usize][box_pos.col as usize] = if old_box_cell.has_goal() {
            Cell::PlayerOnGoal
        } else {
            Cell::Player
        };

        let old_dest_cell = grid[dest.row as usize][dest.col as usize];
        grid[dest.row as usize][dest.col as usize] = if old_dest_cell.has_goal() {
            Cell::BoxOnGoal
        } else {
            Cell::Box
        };

        let next = Board::from_parts(grid, box_pos, self.steps + 1, self.max_steps);

        debug_assert_eq!(next.box_positions.len(), self.box_positions.len());
        debug_assert_eq!(next.goal_positions().len(), self.goal_positions().len());
        debug_assert_eq!(
            next.cells().filter(|(_, c)| c.is_player()).count(),
            1,
            "push must leave exactly one player on the board"
        );

        next
    }

    /// `(value, kind)` where `value = -min_cost_matching(boxes, goals)`
    /// and `kind` classifies the position as WIN / LOSS / STEP.
    pub fn reward(&self) -> Reward {
        let goals = self.goal_positions();
        let value = -crate::matcher::min_cost_matching(&self.box_positions, &goals);

        let boxes_off_goal = self.cells().filter(|(_, c)| *c == Cell::Box).count();
        if boxes_off_goal == 0 {
            return Reward::new(value, RewardKind::Win);
        }
        if self.check_deadlock() || self.steps > self.max_steps {
            return Reward::new(value, RewardKind::Loss);
        }
        Reward::new(value, RewardKind::Step)
    }

    /// True if no push is reachable, or some off-goal box is wedged into
    /// a wall corner (two perpendicular wall neighbors). Boxes already on
    /// a goal are exempt from the corner rule.
    pub fn check_deadlock(&self) -> bool {
        if self.valid_moves().is_empty() {
            return true;
        }
        self.box_positions.iter().any(|&b| self.is_corner_trapped(b))
    }

    fn is_corner_trapped(&self, box_pos: Pos) -> bool {
        if self.cell(box_pos) == Some(Cell::BoxOnGoal) {
            return false;
        }
        Direction::ALL.iter().any(|&d1| {
            let d2 = d1.next_clockwise();
            self.blocks_box(box_pos.offset(d1)) && self.blocks_box(box_pos.offset(d2))
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for cell in row {
                write!(f, "{}", cell.to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn opposite(d: Direction) -> Direction {
    match d {
        Direction::Up => Direction::Down,
        Direction::Down => Direction::Up,
        Direction::Left => Direction::Right,
        Direction::Right => Direction::Left,
    }
}

fn find_boxes(grid: &[Vec<Cell>]) -> Vec<Pos> {
    let mut boxes = Vec::new();
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if cell.is_box() {
                boxes.push(Pos::new(r as i32, c as i32));
            }
        }
    }
    boxes
}

/// Flood-fill from `start` over non-wall, non-box cells, 4-connected.
fn flood_fill_interior(grid: &[Vec<Cell>], start: Pos) -> BTreeSet<Pos> {
    let height = grid.len() as i32;
    let width = grid.first().map(Vec::len).unwrap_or(0) as i32;

    let mut interior = BTreeSet::new();
    let mut frontier = vec![start];
    interior.insert(start);

    while let Some(pos) = frontier.pop() {
        for dir in Direction::ALL {
            let next = pos.offset(dir);
            if next.row < 0 || next.col < 0 || next.row >= height || next.col >= width {
                continue;
            }
            let cell = grid[next.row as usize][next.col as usize];
            if cell.is_wall() || cell.is_box() {
                continue;
            }
            if interior.insert(next) {
                frontier.push(next);
            }
        }
    }

    interior
}

fn canonical_hash(interior: &BTreeSet<Pos>, box_positions: &[Pos]) -> StateHash {
    let mut s = String::with_capacity(interior.len() * 8 + box_positions.len() * 8 + 2);
    s.push('I');
    for p in interior {
        s.push('(');
        s.push_str(&p.row.to_string());
        s.push(',');
        s.push_str(&p.col.to_string());
        s.push(')');
    }
    s.push('B');
    for p in box_positions {
        s.push('(');
        s.push_str(&p.row.to_string());
        s.push(',');
        s.push_str(&p.col.to_string());
        s.push(')');
    }
    StateHash(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::RewardKind;

    fn parse(s: &str) -> Board {
        Board::parse(s).unwrap()
    }

    #[test]
    fn rejects_missing_player() {
        let err = Board::parse("#####\n#  .#\n#####").unwrap_err();
        assert_eq!(err, BoardError::NoPlayer(0));
    }

    #[test]
    fn rejects_box_goal_mismatch() {
        let err = Board::parse("#####\n#@$ #\n#####").unwrap_err();
        assert_eq!(err, BoardError::BoxGoalMismatch { boxes: 1, goals: 0 });
    }

    #[test]
    fn rejects_unknown_character() {
        assert_eq!(
            Board::parse("#####\n#@?.#\n#####").unwrap_err(),
            BoardError::UnknownChar('?')
        );
    }

    #[test]
    fn pads_ragged_rows_with_walls() {
        let board = parse("#####\n#@$.#\n##");
        assert_eq!(board.width(), 5);
        assert_eq!(board.cell(Pos::new(2, 4)), Some(Cell::Wall));
    }

    // Testable property 1: hash canonicalisation. Two player positions
    // within the same interior yield identical hashes iff box positions
    // match.
    #[test]
    fn hash_depends_only_on_interior_not_player_position() {
        let board = parse("#####\n#@  #\n#$ .#\n#####");
        let a = move_player_for_test(&board, Pos::new(1, 2));
        let b = move_player_for_test(&board, Pos::new(1, 3));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_differs_once_box_positions_differ() {
        let board = parse("#####\n#@$.#\n#####");
        let pushed = board.push(Push {
            player: Pos::new(1, 1),
            dir: Direction::Right,
        });
        assert_ne!(board.hash(), pushed.hash());
    }

    /// Rebuild a board with the player relocated to `new_player`, keeping
    /// every other cell as-is. Used to probe hash canonicalisation without
    /// a walk-move primitive (this design only has pushes).
    fn move_player_for_test(board: &Board, new_player: Pos) -> Board {
        let mut grid = vec![vec![Cell::Floor; board.width()]; board.height()];
        for r in 0..board.height() {
            for c in 0..board.width() {
                let pos = Pos::new(r as i32, c as i32);
                let mut cell = board.cell(pos).unwrap();
                if cell.is_player() {
                    cell = cell.vacated();
                }
                grid[r][c] = cell;
            }
        }
        let underlying = grid[new_player.row as usize][new_player.col as usize];
        grid[new_player.row as usize][new_player.col as usize] = if underlying.has_goal() {
            Cell::PlayerOnGoal
        } else {
            Cell::Player
        };
        Board::from_parts(grid, new_player, board.steps(), board.max_steps())
    }

    // Testable property 2: move conservation.
    #[test]
    fn push_conserves_box_and_goal_counts_and_increments_steps() {
        let board = parse("#####\n#@$.#\n#####");
        let mv = Push {
            player: Pos::new(1, 1),
            dir: Direction::Right,
        };
        let pushed = board.push(mv);
        assert_eq!(pushed.box_positions().len(), board.box_positions().len());
        assert_eq!(pushed.goal_positions().len(), board.goal_positions().len());
        assert_eq!(pushed.steps(), board.steps() + 1);
        assert_eq!(pushed.reward().kind, RewardKind::Win);
    }

    // Testable property 3: reachability soundness.
    #[test]
    fn every_valid_move_stands_in_the_interior_adjacent_to_its_box() {
        let board = parse("#######\n#@ $ .#\n#  #  #\n#######");
        for mv in board.valid_moves() {
            assert!(board.interior().contains(&mv.player));
            let box_pos = mv.player.offset(mv.dir);
            assert!(board.cell(box_pos).map(Cell::is_box).unwrap_or(false));
        }
    }

    // Testable property 4: the corner rule can declare a deadlock even
    // while other pushes remain available elsewhere on the board - it is
    // not simply a restatement of "no valid moves". Box (1,2) is freely
    // pushable toward its goal; box (3,1) is wedged into the bottom-left
    // corner (walls below and to its left) and sits off its goal.
    #[test]
    fn corner_trapped_box_off_goal_is_a_deadlock_even_with_other_moves_available() {
        let board = parse("######\n#@$ .#\n#    #\n#$  .#\n######");
        assert!(!board.valid_moves().is_empty());
        assert!(board.check_deadlock());
    }

    #[test]
    fn box_on_goal_is_exempt_from_corner_rule() {
        let board = parse("######\n#@$ .#\n#    #\n#*   #\n######");
        assert!(!board.valid_moves().is_empty());
        assert!(!board.check_deadlock());
    }

    #[test]
    fn no_moves_available_is_a_deadlock() {
        let board = parse("###\n#@#\n###");
        assert!(board.valid_moves().is_empty());
        assert!(board.check_deadlock());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let text = "#####\n#@$.#\n#####\n";
        let board = Board::parse(text).unwrap();
        assert_eq!(board.to_string(), text);
    }
}
