//! Structural invariants of a thought tree.

use std::collections::HashSet;

use crate::tree::{NodeIndex, NodeState, Tree};

/// Check structural invariants:
/// - No duplicate ids
/// - Parent/child links agree and depth is parent depth + 1
/// - Only the root lacks estimates and a score; scores lie in `[0, 1]`
/// - `frontier` nodes have no children; `expanded` nodes have some
/// - Pruned nodes are leaves; the root is never pruned or terminal
pub fn validate_invariants(tree: &Tree) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (idx, node) in tree.iter() {
        if !seen.insert(node.id.as_str()) {
            errors.push(format!("duplicate id '{}'", node.id));
        }

        match node.parent {
            None if idx != NodeIndex::ROOT => {
                errors.push(format!("{}: non-root node without parent", node.id));
            }
            None => {
                if node.estimates.is_some() || node.score.is_some() {
                    errors.push(format!("{}: root must not carry estimates", node.id));
                }
                if matches!(node.state, NodeState::Pruned | NodeState::Terminal) {
                    errors.push(format!("{}: root cannot be {}", node.id, node.state.as_str()));
                }
            }
            Some(parent) => {
                let parent_node = tree.get(parent);
                if !parent_node.children.contains(&idx) {
                    errors.push(format!(
                        "{}: missing from children of '{}'",
                        node.id, parent_node.id
                    ));
                }
                if node.depth != parent_node.depth + 1 {
                    errors.push(format!(
                        "{}: depth {} does not follow parent depth {}",
                        node.id, node.depth, parent_node.depth
                    ));
                }
                match node.score {
                    Some(score) if (0.0..=1.0).contains(&score) => {}
                    Some(score) => errors.push(format!("{}: score {} out of range", node.id, score)),
                    None => errors.push(format!("{}: missing score", node.id)),
                }
            }
        }

        let has_children = !node.children.is_empty();
        match node.state {
            NodeState::Frontier if has_children => {
                errors.push(format!("{}: frontier node has children", node.id));
            }
            NodeState::Expanded if !has_children => {
                errors.push(format!("{}: expanded node has no children", node.id));
            }
            NodeState::Pruned if has_children => {
                errors.push(format!("{}: pruned node has children", node.id));
            }
            _ => {}
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{child, root_tree};
    use crate::tree::PruneReason;

    #[test]
    fn well_formed_tree_passes() {
        let mut tree = root_tree();
        let a = tree.attach(child("a", NodeIndex::ROOT, 1, 0.5));
        tree.attach(child("a1", a, 2, 0.6));
        assert!(validate_invariants(&tree).is_empty());
    }

    #[test]
    fn reports_duplicate_ids_and_bad_depth() {
        let mut tree = root_tree();
        tree.attach(child("a", NodeIndex::ROOT, 1, 0.5));
        tree.attach(child("a", NodeIndex::ROOT, 3, 0.5));
        let errors = validate_invariants(&tree);
        assert!(errors.iter().any(|err| err.contains("duplicate id")));
        assert!(errors.iter().any(|err| err.contains("does not follow")));
    }

    #[test]
    fn reports_pruned_parent() {
        let mut tree = root_tree();
        let mut a = child("a", NodeIndex::ROOT, 1, 0.5);
        a.prune(PruneReason::LowWater);
        let a = tree.attach(a);
        tree.attach(child("a1", a, 2, 0.5));
        let errors = validate_invariants(&tree);
        assert!(errors.iter().any(|err| err.contains("pruned node has children")));
    }
}
