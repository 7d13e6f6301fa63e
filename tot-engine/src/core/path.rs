//! Best-path search over a thought tree.
//!
//! A chain is only as strong as its weakest step, so paths are compared by the
//! minimum score along them (root excluded).

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::tree::{NodeIndex, Tree};

/// Winning leaf of a path search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathChoice {
    pub leaf: NodeIndex,
    /// Minimum node score along the path.
    pub confidence: f64,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep {
    pub node_id: String,
    pub depth: usize,
    pub thought: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Map<String, Value>>,
}

/// Choose the root-to-leaf path maximizing its minimum score.
///
/// Pruned nodes are skipped unless no other path exists. Ties prefer the
/// deeper path, then the lower-risk leaf, then the earliest-submitted leaf.
/// Returns `None` when the root has no children.
pub fn best_path(tree: &Tree) -> Option<PathChoice> {
    search(tree, false).or_else(|| search(tree, true))
}

/// Node indices from the root's child down to `leaf`.
pub fn path_to(tree: &Tree, leaf: NodeIndex) -> Vec<NodeIndex> {
    let mut path: Vec<NodeIndex> = tree
        .ancestors(leaf)
        .into_iter()
        .filter(|&idx| idx != NodeIndex::ROOT)
        .collect();
    path.push(leaf);
    path
}

pub fn steps(tree: &Tree, path: &[NodeIndex]) -> Vec<PathStep> {
    path.iter()
        .map(|&idx| {
            let node = tree.get(idx);
            PathStep {
                node_id: node.id.clone(),
                depth: node.depth,
                thought: node.thought.clone(),
                score: node.score.unwrap_or(0.0),
                delta: node.delta.clone(),
            }
        })
        .collect()
}

fn search(tree: &Tree, include_pruned: bool) -> Option<PathChoice> {
    let mut best = None;
    for &child in &tree.root().children {
        visit(tree, child, f64::INFINITY, include_pruned, &mut best);
    }
    best
}

fn visit(
    tree: &Tree,
    idx: NodeIndex,
    floor: f64,
    include_pruned: bool,
    best: &mut Option<PathChoice>,
) {
    let node = tree.get(idx);
    if node.is_pruned() && !include_pruned {
        return;
    }
    let floor = floor.min(node.score.unwrap_or(0.0));

    let mut descended = false;
    for &child in &node.children {
        if include_pruned || !tree.get(child).is_pruned() {
            descended = true;
            visit(tree, child, floor, include_pruned, best);
        }
    }
    if descended {
        return;
    }

    let choice = PathChoice {
        leaf: idx,
        confidence: floor,
        depth: node.depth,
    };
    let replace = match best {
        Some(current) => compare(tree, &choice, current) == Ordering::Less,
        None => true,
    };
    if replace {
        *best = Some(choice);
    }
}

/// `Less` means `a` is the better path.
fn compare(tree: &Tree, a: &PathChoice, b: &PathChoice) -> Ordering {
    let (leaf_a, leaf_b) = (tree.get(a.leaf), tree.get(b.leaf));
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.depth.cmp(&a.depth))
        .then_with(|| leaf_a.risk().total_cmp(&leaf_b.risk()))
        .then_with(|| leaf_a.seq.cmp(&leaf_b.seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{child, child_with, root_tree};
    use crate::tree::PruneReason;

    #[test]
    fn empty_tree_has_no_path() {
        assert_eq!(best_path(&root_tree()), None);
    }

    #[test]
    fn weakest_link_decides_between_paths() {
        let mut tree = root_tree();
        // Strong start, weak follow-up: min 0.3.
        let a = tree.attach(child("a", NodeIndex::ROOT, 1, 0.95));
        tree.attach(child("a1", a, 2, 0.3));
        // Steady path: min 0.6.
        let b = tree.attach(child("b", NodeIndex::ROOT, 1, 0.6));
        let b1 = tree.attach(child("b1", b, 2, 0.7));

        let choice = best_path(&tree).expect("path");
        assert_eq!(choice.leaf, b1);
        assert!((choice.confidence - 0.6).abs() < 1e-12);
        assert_eq!(path_to(&tree, b1), vec![b, b1]);
    }

    #[test]
    fn ties_prefer_deeper_then_lower_risk_then_earlier() {
        let mut tree = root_tree();
        let a = tree.attach(child("a", NodeIndex::ROOT, 1, 0.5));
        let a1 = tree.attach(child("a1", a, 2, 0.5));
        tree.attach(child("b", NodeIndex::ROOT, 1, 0.5));
        assert_eq!(best_path(&tree).expect("path").leaf, a1);

        let mut tree = root_tree();
        tree.attach(child_with("risky", NodeIndex::ROOT, 1, 0.5, 0.3, 1));
        let safe = tree.attach(child_with("safe", NodeIndex::ROOT, 1, 0.5, 0.1, 2));
        tree.attach(child_with("late", NodeIndex::ROOT, 1, 0.5, 0.1, 3));
        assert_eq!(best_path(&tree).expect("path").leaf, safe);
    }

    #[test]
    fn pruned_leaves_are_a_last_resort() {
        let mut tree = root_tree();
        let mut strong = child("strong", NodeIndex::ROOT, 1, 0.9);
        strong.prune(PruneReason::Budget);
        tree.attach(strong);
        let weak = tree.attach(child("weak", NodeIndex::ROOT, 1, 0.2));
        assert_eq!(best_path(&tree).expect("path").leaf, weak);

        let mut only_pruned = root_tree();
        let mut node = child("only", NodeIndex::ROOT, 1, 0.4);
        node.prune(PruneReason::LowWater);
        let idx = only_pruned.attach(node);
        assert_eq!(best_path(&only_pruned).expect("path").leaf, idx);
    }

    #[test]
    fn pruned_children_do_not_hide_their_parent() {
        let mut tree = root_tree();
        let a = tree.attach(child("a", NodeIndex::ROOT, 1, 0.7));
        let mut a1 = child("a1", a, 2, 0.9);
        a1.prune(PruneReason::Budget);
        tree.attach(a1);
        let choice = best_path(&tree).expect("path");
        assert_eq!(choice.leaf, a);
        assert_eq!(steps(&tree, &path_to(&tree, a))[0].node_id, "a");
    }
}
