//! Arena-allocated thought tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeIndex`]; the opaque
//! string ids handed to callers are resolved through a side index.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::scoring::Estimates;

/// Index into the node arena. The root is always at index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Frontier,
    Expanded,
    Pruned,
    Terminal,
}

impl NodeState {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Frontier => "frontier",
            NodeState::Expanded => "expanded",
            NodeState::Pruned => "pruned",
            NodeState::Terminal => "terminal",
        }
    }
}

/// Why a node was excluded from expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    /// Submitted after the run's node budget was exhausted.
    Budget,
    /// Scored below the low-water mark of its depth.
    LowWater,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    pub depth: usize,
    pub thought: String,
    /// Caller estimates; `None` only for the root.
    pub estimates: Option<Estimates>,
    pub delta: Option<Map<String, Value>>,
    /// Derived from `estimates`; `None` only for the root.
    pub score: Option<f64>,
    /// Submission order within the run (root is 0).
    pub seq: u64,
    pub state: NodeState,
    pub prune_reason: Option<PruneReason>,
}

impl Node {
    pub fn root(id: String, thought: String) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            depth: 0,
            thought,
            estimates: None,
            delta: None,
            score: None,
            seq: 0,
            state: NodeState::Frontier,
            prune_reason: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_pruned(&self) -> bool {
        self.state == NodeState::Pruned
    }

    /// On the frontier: childless and not pruned. A terminal label does not
    /// close a leaf.
    pub fn is_open(&self) -> bool {
        self.children.is_empty() && !self.is_pruned()
    }

    pub fn risk(&self) -> f64 {
        self.estimates.map_or(0.0, |e| e.risk)
    }

    /// A child was attached. Terminal nodes keep their label.
    pub(crate) fn mark_expanded(&mut self) {
        if matches!(self.state, NodeState::Frontier) {
            self.state = NodeState::Expanded;
        }
    }

    /// Only frontier nodes may be pruned; returns whether the state changed.
    pub(crate) fn prune(&mut self, reason: PruneReason) -> bool {
        if self.state != NodeState::Frontier {
            return false;
        }
        self.state = NodeState::Pruned;
        self.prune_reason = Some(reason);
        true
    }

    pub(crate) fn mark_terminal(&mut self) {
        if !self.is_root() {
            self.state = NodeState::Terminal;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        let index = HashMap::from([(root.id.clone(), NodeIndex::ROOT)]);
        Self {
            nodes: vec![root],
            index,
        }
    }

    pub fn root(&self) -> &Node {
        self.get(NodeIndex::ROOT)
    }

    /// # Panics
    /// Panics if `idx` did not come from this tree.
    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }

    pub(crate) fn get_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    pub fn lookup(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.lookup(id).map(|idx| self.get(idx))
    }

    /// Attach `node` under its parent and return its index.
    ///
    /// The caller sets `node.parent`; the parent is marked expanded.
    pub(crate) fn attach(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        let parent = node.parent.unwrap_or(NodeIndex::ROOT);
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        let parent = self.get_mut(parent);
        parent.children.push(idx);
        parent.mark_expanded();
        idx
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    /// Ancestors of `idx`, root first, excluding `idx` itself.
    pub fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut cursor = self.get(idx).parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.get(parent).parent;
        }
        chain.reverse();
        chain
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}
