//! Hash-indexed node registry and the pruning cascade.
//!
//! ## Architecture
//! - Level 2: tree-wide operations (`select_leaf`, `expand_node`, `remove`)
//! - Level 3: registry bookkeeping

use rustc_hash::{FxHashMap, FxHashSet};
use sokoban_core::{Board, StateHash};
use tracing::trace;

use crate::node::{expand_children, Node, NodeRef};

/// Owns the root and indexes every live node by its canonical hash, so a
/// transposition is recognized instead of re-expanded. `del_nodes` records
/// hashes that have been pruned, so a state that was once explored and
/// found dead is never re-added within the same search.
pub struct SearchTree {
    root_hash: StateHash,
    nodes: FxHashMap<StateHash, NodeRef>,
    del_nodes: FxHashSet<StateHash>,
}

impl SearchTree {
    pub fn new(root: Board) -> Self {
        let root = Node::new_root(root);
        let root_hash = root.borrow().hash().clone();
        let mut nodes = FxHashMap::default();
        nodes.insert(root_hash.clone(), root);
        Self {
            root_hash,
            nodes,
            del_nodes: FxHashSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `None` once the root itself has been pruned away - the tree is
    /// exhausted and the search can conclude there is no reachable win.
    pub fn root(&self) -> Option<NodeRef> {
        self.nodes.get(&self.root_hash).cloned()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, hash: &StateHash) -> bool {
        self.nodes.contains_key(hash)
    }

    #[cfg(test)]
    pub(crate) fn is_deleted(&self, hash: &StateHash) -> bool {
        self.del_nodes.contains(hash)
    }

    /// Descend from `root` via `select_child` while the current node has
    /// children and is non-terminal. Returns the node at which descent
    /// stopped, or `None` if the root itself is gone.
    pub fn select_leaf<R: rand::Rng>(&self, c_puct: f64, d: f64, rng: &mut R) -> Option<NodeRef> {
        let mut current = self.root()?;
        loop {
            let stop = {
                let node = current.borrow();
                node.children.is_empty() || node.reward.kind != sokoban_core::RewardKind::Step
            };
            if stop {
                return Some(current);
            }
            let next = current.borrow().select_child(c_puct, d, rng);
            match next {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
    }

    /// Two-pass expansion (see design notes): every push is added as a
    /// fresh node before any of them are evaluated for pruning, so the
    /// removal cascade in pass two always sees the full sibling set.
    pub fn expand_node(&mut self, node: &NodeRef) {
        let fresh = expand_children(node, |hash| self.nodes.contains_key(hash) || self.del_nodes.contains(hash));

        for child in &fresh {
            let hash = child.borrow().hash().clone();
            self.nodes.insert(hash, child.clone());
        }

        if node.borrow().children.is_empty() {
            self.remove(node.clone());
            return;
        }

        for child in fresh {
            let dead = {
                let c = child.borrow();
                c.reward.kind == sokoban_core::RewardKind::Loss
            };
            let already_gone = self.del_nodes.contains(child.borrow().hash());
            if dead || already_gone {
                self.remove(child);
            }
        }
    }

    /// Remove `start` and cascade upward through any ancestor whose last
    /// surviving child this removal just took away. Implemented
    /// iteratively (a work stack, not recursion) since a pathological
    /// tree can cascade arbitrarily deep.
    pub fn remove(&mut self, start: NodeRef) {
        let mut stack = vec![start];
        let mut freed = 0usize;
        while let Some(node) = stack.pop() {
            debug_assert!(
                node.borrow().children.is_empty(),
                "remove() precondition: node must already be childless"
            );

            let hash = node.borrow().hash().clone();
            self.nodes.remove(&hash);
            self.del_nodes.insert(hash);
            freed += 1;

            let parent = node.borrow().parent.clone().and_then(|weak| weak.upgrade());
            let Some(parent) = parent else { continue };

            let mv = node
                .borrow()
                .incoming_move
                .expect("non-root node always has an incoming move");
            parent.borrow_mut().children.remove(&mv);

            let parent_dead = {
                let p = parent.borrow();
                p.should_remove() || self.del_nodes.contains(p.hash())
            };
            if parent_dead {
                stack.push(parent);
            }
        }
        trace!(freed, "pruning cascade");
    }

    /// Registry invariant: a hash is never both live and deleted.
    #[cfg(test)]
    pub(crate) fn registry_is_disjoint(&self) -> bool {
        self.nodes.keys().all(|h| !self.del_nodes.contains(h))
    }
}
