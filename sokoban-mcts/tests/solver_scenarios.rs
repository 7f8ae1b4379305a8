//! End-to-end solver scenarios against the public `sokoban-mcts` API.
//!
//! Tests the full stack: board parsing, the search tree, rollout, and
//! solution extraction together, against literal level grids.

use sokoban_core::{Board, Direction, Pos, RewardKind};
use sokoban_mcts::{Mcts, MctsConfig, SearchTree, LOOKAHEAD};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn board(s: &str) -> Board {
    Board::parse(s).unwrap()
}

fn apply_all(start: &Board, pushes: &[sokoban_core::Push]) -> Board {
    let mut state = start.clone();
    for &mv in pushes {
        state = state.push(mv);
    }
    state
}

// ============================================================================
// S1 - trivial push
// ============================================================================

#[test]
fn s1_trivial_push_solves_in_one_move() {
    let start = board("#####\n#@$.#\n#####");
    let mut mcts = Mcts::new(start.clone(), MctsConfig::deterministic(1));

    let solution = mcts.run(5).expect("a one-push solution exists");
    assert_eq!(solution.len(), 1);
    assert_eq!(solution[0].player, Pos::new(1, 1));
    assert_eq!(solution[0].dir, Direction::Right);

    let end = apply_all(&start, &solution);
    assert_eq!(end.reward().kind, RewardKind::Win);
}

// ============================================================================
// S2 - already solved
// ============================================================================

#[test]
fn s2_already_solved_returns_an_empty_solution() {
    let start = board("###\n#*#\n#@#\n###");
    assert_eq!(start.reward().kind, RewardKind::Win);

    let mut mcts = Mcts::new(start, MctsConfig::deterministic(1));
    let solution = mcts.run(5);
    assert_eq!(solution, Some(Vec::new()));
}

// ============================================================================
// S3 - immediate deadlock
// ============================================================================

#[test]
fn s3_immediate_deadlock_returns_none() {
    let start = board("####\n#@$#\n# .#\n####");
    assert!(start.check_deadlock());

    let mut mcts = Mcts::new(start, MctsConfig::deterministic(1));
    assert_eq!(mcts.run(10), None);
}

// ============================================================================
// S4 - two boxes, sequencing required
// ============================================================================

#[test]
fn s4_one_box_must_clear_the_way_before_the_other_reaches_its_goal() {
    // boxY (2,3) sits between boxX (3,2) and boxX's own goal (3,4); boxX
    // must route around through the open room above while boxY is moved
    // clear, then boxY completes its own trip to (1,1).
    let start = board("######\n#.   #\n#  $ #\n#@$ .#\n######");
    let mut mcts = Mcts::new(start.clone(), MctsConfig::deterministic(3));

    let solution = mcts.run(200).expect("a solution exists within a handful of pushes");
    assert!(!solution.is_empty());

    let end = apply_all(&start, &solution);
    assert_eq!(end.reward().kind, RewardKind::Win);
}

// ============================================================================
// S5 - transposition
// ============================================================================

#[test]
fn s5_commuting_push_orders_register_as_one_node() {
    // Two independent boxes, each one push from its own goal: pushing box
    // 1 then box 2 and box 2 then box 1 both land on the same box-position
    // set, so the registry must hold exactly one node for that state
    // rather than two.
    let start = board("#######\n#.$ $.#\n#  @  #\n#######");
    let mut tree = SearchTree::new(start);
    let root = tree.root().unwrap();
    tree.expand_node(&root);

    let first_level: Vec<_> = root.borrow().children.values().cloned().collect();
    assert_eq!(first_level.len(), 4, "two boxes x two directions each");
    for child in &first_level {
        tree.expand_node(child);
    }

    let win_nodes = first_level
        .iter()
        .flat_map(|c| c.borrow().children.values().cloned().collect::<Vec<_>>())
        .filter(|n| n.borrow().reward.kind == RewardKind::Win)
        .count();
    assert_eq!(win_nodes, 1, "both push orders converge on a single win node, not two");
}

// ============================================================================
// S6 - lookahead finds win
// ============================================================================

#[test]
fn s6_win_exactly_at_the_lookahead_boundary_is_still_extracted() {
    // A single-row corridor where the win lies exactly LOOKAHEAD pushes
    // away from the root: the first rollout's BFS frontier reaches it on
    // its last permitted layer, and since the root itself is never
    // expanded, solution extraction must fall back to its own BFS to
    // reconstruct the path.
    let n = LOOKAHEAD - 1;
    let content = format!("@${}.", " ".repeat(n as usize));
    let row = format!("#{}#", content);
    let border = "#".repeat(row.len());
    let start = board(&format!("{border}\n{row}\n{border}"));

    let mut mcts = Mcts::new(start.clone(), MctsConfig::deterministic(5));
    let solution = mcts.run(3).expect("win lies within LOOKAHEAD pushes");
    assert_eq!(solution.len() as u32, n + 1);

    let end = apply_all(&start, &solution);
    assert_eq!(end.reward().kind, RewardKind::Win);
}
