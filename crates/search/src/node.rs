//! Search tree nodes and edges.
//!
//! Nodes use `Arc<Mutex<_>>` rather than single-threaded `Rc<RefCell<_>>`
//! so multiple workers can hold a node concurrently under a per-node
//! lock discipline, with `Weak` parent back-links so a subtree doesn't
//! keep its ancestors alive.

use std::sync::{Arc, Mutex, Weak};

use fusion_core::{GameState, Piece, Placement};

/// `(placement, child_node_ref, transient_reward)`. Holding the
/// placement twice (once for play, once to know which hold choice it
/// represents) would duplicate data, so `hold_used` rides alongside it
/// instead.
#[derive(Clone)]
pub struct Edge {
    pub placement: Placement,
    /// Whether this edge plays the held piece (swapping first) rather
    /// than the head of `next`.
    pub hold_used: bool,
    pub child: Node,
    pub transient_reward: i32,
}

/// A node's children: either fully known (the next piece is revealed) or
/// partitioned per still-possible next piece, as a tagged variant
/// `{Known(edges) | Speculative(bucket_per_piece)}`.
pub enum Children {
    Known(Vec<Edge>),
    Speculative(Vec<(Piece, Vec<Edge>)>),
}

pub(crate) struct NodeData {
    pub state: GameState,
    pub state_hash: u64,
    /// `None` means "not yet expanded".
    pub children: Option<Children>,
    /// Aggregated best reward below this node.
    /// For a leaf this is the evaluator's accumulated board score; for an
    /// expanded node it is recomputed from `children` on every backprop.
    pub value: i64,
    pub visits: u64,
    pub terminal: bool,
    pub parents: Vec<(WeakNode, usize)>,
}

/// A reference-counted, interned search-tree node. Cloning a [`Node`]
/// clones the `Arc`, not the underlying state — the same node may be
/// reached from multiple parent edges (transposition).
#[derive(Clone)]
pub struct Node(pub(crate) Arc<Mutex<NodeData>>);

/// Non-owning handle used for parent back-links, so a node's children
/// subtree does not keep the node's own parents alive past root reclaim.
#[derive(Clone)]
pub struct WeakNode(pub(crate) Weak<Mutex<NodeData>>);

impl Node {
    pub fn new(state: GameState, state_hash: u64, leaf_value: i64, terminal: bool) -> Self {
        Node(Arc::new(Mutex::new(NodeData {
            state,
            state_hash,
            children: None,
            value: leaf_value,
            visits: 0,
            terminal,
            parents: Vec::new(),
        })))
    }

    pub fn state_hash(&self) -> u64 {
        self.0.lock().expect("node lock poisoned").state_hash
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Arc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn value(&self) -> i64 {
        self.0.lock().expect("node lock poisoned").value
    }

    pub fn visits(&self) -> u64 {
        self.0.lock().expect("node lock poisoned").visits
    }

    pub fn is_terminal(&self) -> bool {
        self.0.lock().expect("node lock poisoned").terminal
    }

    pub fn is_expanded(&self) -> bool {
        self.0.lock().expect("node lock poisoned").children.is_some()
    }

    pub fn state(&self) -> GameState {
        self.0.lock().expect("node lock poisoned").state.clone()
    }

    /// Append a newly revealed piece to this node's own queue snapshot,
    /// propagated node-by-node by the search tree since each node
    /// carries its own `GameState`.
    pub fn push_piece(&self, piece: Piece) {
        self.0.lock().expect("node lock poisoned").state.push_piece(piece);
    }

    pub fn add_parent(&self, parent: WeakNode, edge_index: usize) {
        self.0
            .lock()
            .expect("node lock poisoned")
            .parents
            .push((parent, edge_index));
    }

    pub fn record_visit(&self) {
        self.0.lock().expect("node lock poisoned").visits += 1;
    }

    /// Raise this node's own value to at least `floor`, independent of
    /// its children (used by the perfect-clear sub-search to
    /// short-circuit the evaluator for a leaf that has a guaranteed PC
    /// continuation). Returns whether the value changed so the caller
    /// knows whether to back-propagate.
    pub fn boost_value(&self, floor: i64) -> bool {
        let mut data = self.0.lock().expect("node lock poisoned");
        if floor > data.value {
            data.value = floor;
            true
        } else {
            false
        }
    }

    /// Selection's forward-pass comparator: highest
    /// `transient + child.value`, ties by lower visit count then by
    /// index (placement ordering, since edges are pushed in generation
    /// order). Only defined for `Known` children; a `Speculative` node
    /// has no single edge list to index into (see [`Self::select_child`]
    /// for descent through one).
    pub fn best_edge_index(&self) -> Option<usize> {
        let data = self.0.lock().expect("node lock poisoned");
        let edges = match &data.children {
            Some(Children::Known(edges)) if !edges.is_empty() => edges,
            _ => return None,
        };
        Some(best_edge_index_of(edges))
    }

    /// Selection's descent step, valid for both `Known` and `Speculative`
    /// nodes (DESIGN.md Open Question resolution #5): for a speculative
    /// node, pick the bucket whose best edge scores highest — the same
    /// bucket [`Self::recompute_value`] would average over — then the
    /// best edge inside it. This lets selection keep deepening through
    /// an unresolved-next-piece node instead of stalling there, which is
    /// required for the tree to search past the first unknown piece at
    /// all.
    pub fn select_child(&self) -> Option<Node> {
        let data = self.0.lock().expect("node lock poisoned");
        match &data.children {
            Some(Children::Known(edges)) if !edges.is_empty() => {
                Some(best_edge(edges).child.clone())
            }
            Some(Children::Speculative(buckets)) if !buckets.is_empty() => {
                let mut best_bucket = &buckets[0].1;
                let mut best_score = bucket_score(best_bucket);
                for (_, edges) in buckets.iter().skip(1) {
                    if edges.is_empty() {
                        continue;
                    }
                    let score = bucket_score(edges);
                    if score > best_score {
                        best_bucket = edges;
                        best_score = score;
                    }
                }
                Some(best_edge(best_bucket).child.clone())
            }
            _ => None,
        }
    }

    /// The edge [`Self::select_child`] would descend into, with its
    /// placement and transient reward intact — unlike `select_child`,
    /// which discards the edge and returns only the child node. Used to
    /// reconstruct a principal-variation plan for `poll_move`'s optional
    /// `plan` field.
    pub fn selected_edge(&self) -> Option<Edge> {
        let data = self.0.lock().expect("node lock poisoned");
        match &data.children {
            Some(Children::Known(edges)) if !edges.is_empty() => {
                Some(best_edge(edges).clone())
            }
            Some(Children::Speculative(buckets)) if !buckets.is_empty() => {
                let mut best_bucket = &buckets[0].1;
                let mut best_score = bucket_score(best_bucket);
                for (_, edges) in buckets.iter().skip(1) {
                    if edges.is_empty() {
                        continue;
                    }
                    let score = bucket_score(edges);
                    if score > best_score {
                        best_bucket = edges;
                        best_score = score;
                    }
                }
                Some(best_edge(best_bucket).clone())
            }
            _ => None,
        }
    }

    /// Recompute this node's aggregated value from its children, returning
    /// whether the value changed.
    fn recompute_value(&self) -> bool {
        let mut data = self.0.lock().expect("node lock poisoned");
        let new_value = match &data.children {
            None => return false,
            Some(Children::Known(edges)) => {
                if edges.is_empty() {
                    data.terminal = true;
                    data.value
                } else {
                    edges
                        .iter()
                        .map(|e| e.transient_reward as i64 + e.child.value())
                        .max()
                        .unwrap_or(data.value)
                }
            }
            Some(Children::Speculative(buckets)) => {
                if buckets.is_empty() {
                    data.value
                } else {
                    let total: i64 = buckets
                        .iter()
                        .map(|(_, edges)| {
                            edges
                                .iter()
                                .map(|e| e.transient_reward as i64 + e.child.value())
                                .max()
                                .unwrap_or(0)
                        })
                        .sum();
                    total / buckets.len() as i64
                }
            }
        };
        let changed = new_value != data.value;
        data.value = new_value;
        changed
    }

    /// Back-propagate a value change from this node up through every
    /// recorded parent. Bounded because the tree is a DAG: parent links
    /// only ever point to nodes allocated strictly earlier in a
    /// generation.
    pub fn backpropagate(&self) {
        if !self.recompute_value() {
            return;
        }
        let parents = self.0.lock().expect("node lock poisoned").parents.clone();
        for (weak_parent, _edge_index) in parents {
            if let Some(parent) = weak_parent.upgrade() {
                parent.backpropagate();
            }
        }
    }

    pub(crate) fn set_children(&self, children: Children) {
        self.0.lock().expect("node lock poisoned").children = Some(children);
    }

    pub fn children_snapshot(&self) -> Option<Vec<Edge>> {
        match &self.0.lock().expect("node lock poisoned").children {
            Some(Children::Known(edges)) => Some(edges.clone()),
            Some(Children::Speculative(buckets)) => {
                Some(buckets.iter().flat_map(|(_, e)| e.clone()).collect())
            }
            None => None,
        }
    }

    pub fn is_speculative(&self) -> bool {
        matches!(
            self.0.lock().expect("node lock poisoned").children,
            Some(Children::Speculative(_))
        )
    }

    /// Collapse a speculative node to the bucket matching `piece`,
    /// discarding the others. Returns `None` if this node isn't
    /// speculative or has no matching bucket.
    pub fn collapse_speculative(&self, piece: Piece) -> Option<Vec<Edge>> {
        let mut data = self.0.lock().expect("node lock poisoned");
        match data.children.take() {
            Some(Children::Speculative(mut buckets)) => {
                let matched = buckets
                    .iter()
                    .position(|(p, _)| *p == piece)
                    .map(|i| buckets.remove(i).1);
                data.children = matched.clone().map(Children::Known);
                matched
            }
            other => {
                data.children = other;
                None
            }
        }
    }
}

/// Index of the best edge in a non-empty slice, by the same
/// score-then-visits-then-order comparator `Node::best_edge_index` and
/// `Node::select_child` both rely on.
fn best_edge_index_of(edges: &[Edge]) -> usize {
    let mut best = 0usize;
    let mut best_score = edges[0].transient_reward as i64 + edges[0].child.value();
    let mut best_visits = edges[0].child.visits();
    for (i, edge) in edges.iter().enumerate().skip(1) {
        let score = edge.transient_reward as i64 + edge.child.value();
        let visits = edge.child.visits();
        let better = score > best_score || (score == best_score && visits < best_visits);
        if better {
            best = i;
            best_score = score;
            best_visits = visits;
        }
    }
    best
}

fn best_edge(edges: &[Edge]) -> &Edge {
    &edges[best_edge_index_of(edges)]
}

fn bucket_score(edges: &[Edge]) -> i64 {
    edges
        .iter()
        .map(|e| e.transient_reward as i64 + e.child.value())
        .max()
        .unwrap_or(i64::MIN)
}

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::GameState;

    #[test]
    fn test_leaf_value_is_stable_until_expanded() {
        let node = Node::new(GameState::new(), 0, 42, false);
        assert_eq!(node.value(), 42);
        assert!(!node.is_expanded());
    }

    #[test]
    fn test_expansion_and_backprop_takes_max_edge() {
        let child_a = Node::new(GameState::new(), 0, 10, false);
        let child_b = Node::new(GameState::new(), 0, 50, false);
        let root = Node::new(GameState::new(), 0, 0, false);

        let edges = vec![
            Edge {
                placement: fusion_core::Placement::new(
                    fusion_core::Piece::T,
                    fusion_core::Rotation::North,
                    4,
                    0,
                ),
                hold_used: false,
                child: child_a.clone(),
                transient_reward: 0,
            },
            Edge {
                placement: fusion_core::Placement::new(
                    fusion_core::Piece::T,
                    fusion_core::Rotation::North,
                    4,
                    0,
                ),
                hold_used: false,
                child: child_b.clone(),
                transient_reward: 5,
            },
        ];
        root.set_children(Children::Known(edges));
        root.backpropagate();
        assert_eq!(root.value(), 55);
        assert_eq!(root.best_edge_index(), Some(1));
    }

    #[test]
    fn test_empty_children_marks_terminal() {
        let root = Node::new(GameState::new(), 0, 0, false);
        root.set_children(Children::Known(Vec::new()));
        root.backpropagate();
        assert!(root.is_terminal());
    }

    #[test]
    fn test_speculative_value_is_uniform_average() {
        let root = Node::new(GameState::new(), 0, 0, false);
        let bucket_a_child = Node::new(GameState::new(), 0, 10, false);
        let bucket_b_child = Node::new(GameState::new(), 0, 30, false);
        let make_edge = |child: Node| Edge {
            placement: fusion_core::Placement::new(
                fusion_core::Piece::T,
                fusion_core::Rotation::North,
                4,
                0,
            ),
            hold_used: false,
            child,
            transient_reward: 0,
        };
        root.set_children(Children::Speculative(vec![
            (fusion_core::Piece::I, vec![make_edge(bucket_a_child)]),
            (fusion_core::Piece::O, vec![make_edge(bucket_b_child)]),
        ]));
        root.backpropagate();
        assert_eq!(root.value(), 20);
    }

    #[test]
    fn test_collapse_speculative_keeps_matching_bucket() {
        let root = Node::new(GameState::new(), 0, 0, false);
        let bucket_i_child = Node::new(GameState::new(), 0, 10, false);
        let bucket_o_child = Node::new(GameState::new(), 0, 30, false);
        let make_edge = |child: Node| Edge {
            placement: fusion_core::Placement::new(
                fusion_core::Piece::T,
                fusion_core::Rotation::North,
                4,
                0,
            ),
            hold_used: false,
            child,
            transient_reward: 0,
        };
        root.set_children(Children::Speculative(vec![
            (fusion_core::Piece::I, vec![make_edge(bucket_i_child.clone())]),
            (fusion_core::Piece::O, vec![make_edge(bucket_o_child)]),
        ]));
        let collapsed = root.collapse_speculative(fusion_core::Piece::I).unwrap();
        assert_eq!(collapsed.len(), 1);
        assert!(collapsed[0].child.ptr_eq(&bucket_i_child));
        assert!(!root.is_speculative());
    }
}
