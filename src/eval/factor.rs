//! De-duplication factor for nested ground-truth labels.
//!
//! Nested labels ("Mayor of Paris" containing "Paris") overlap, and a naive
//! count would charge the system twice for one stretch of text. The factor is
//! a 0/1 inclusion weight: for every covered root-to-leaf path through the
//! label tree, exactly one label keeps `factor = 1` and everything redundant
//! drops to 0. Factor-0 cases still exist (and may carry error labels), but
//! every counter multiplies by the factor, so they never inflate statistics.
//!
//! The walk is depth-first with a memo map seeded from the roots; a visited
//! set converts any cycle in the (supposedly acyclic) tree into a fatal
//! [`Error::FactorCycle`] instead of infinite recursion.

use crate::error::{Error, Result};
use crate::eval::cases::PredictionIndex;
use crate::eval::tree::GroundTruthTree;
use crate::label::LabelId;
use crate::span::expand_to_word_boundaries;
use std::collections::{HashMap, HashSet};

/// Resolves the inclusion factor for every label of one article.
pub struct FactorResolver<'a> {
    tree: &'a GroundTruthTree,
    index: &'a PredictionIndex<'a>,
    chars: &'a [char],
    /// Local factor per label (the exported factor_dict).
    memo: HashMap<LabelId, u32>,
    /// Value returned to callers (max of local factor and child factors).
    resolved: HashMap<LabelId, u32>,
    in_progress: HashSet<LabelId>,
}

impl<'a> FactorResolver<'a> {
    /// Create a resolver over the article's tree and prediction index.
    #[must_use]
    pub fn new(tree: &'a GroundTruthTree, index: &'a PredictionIndex<'a>, chars: &'a [char]) -> Self {
        Self {
            tree,
            index,
            chars,
            memo: HashMap::new(),
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolve factors for the whole tree, seeded from the roots.
    ///
    /// # Errors
    ///
    /// [`Error::FactorCycle`] if the tree contains a cycle.
    pub fn resolve_all(&mut self) -> Result<()> {
        for &root in self.tree.roots() {
            self.determine_factor(root)?;
        }
        Ok(())
    }

    /// The resolved factor of a label (0 for anything not in the tree).
    #[must_use]
    pub fn factor(&self, id: LabelId) -> u32 {
        self.memo.get(&id).copied().unwrap_or(0)
    }

    /// The full label → factor map.
    #[must_use]
    pub fn factors(&self) -> &HashMap<LabelId, u32> {
        &self.memo
    }

    /// Determine the factor of `id`, memoizing the local value and returning
    /// `max(child_max, local)` (for roots, the local value itself).
    pub fn determine_factor(&mut self, id: LabelId) -> Result<u32> {
        self.walk(id, true)
    }

    fn predicted_entity(&self, id: LabelId) -> Option<String> {
        let label = self.tree.get(id)?;
        self.index
            .covering(label.span)
            .and_then(|p| p.entity_id.clone())
    }

    fn walk(&mut self, id: LabelId, check_siblings: bool) -> Result<u32> {
        if let Some(&f) = self.resolved.get(&id) {
            return Ok(f);
        }
        if !self.in_progress.insert(id) {
            return Err(Error::factor_cycle(id));
        }
        let result = self.walk_inner(id, check_siblings);
        self.in_progress.remove(&id);
        result
    }

    fn walk_inner(&mut self, id: LabelId, check_siblings: bool) -> Result<u32> {
        let label = match self.tree.get(id) {
            Some(l) => l.clone(),
            None => return Ok(0),
        };
        let predicted = self.predicted_entity(id);

        // Exactly and correctly accounted for: no ancestor or descendant may
        // also claim credit for this mention.
        if predicted.as_deref() == Some(label.entity_id.as_str()) {
            if check_siblings {
                self.memo.insert(id, 1);
                self.resolved.insert(id, 1);
            }
            return Ok(1);
        }

        let mut child_max = 0;
        for &child in &label.children {
            child_max = child_max.max(self.walk(child, check_siblings)?);
        }

        let (local, result) = match label.parent {
            // A root is shown only if nothing nested under it already
            // explains the mention.
            None => {
                let local = u32::from(child_max == 0);
                (local, local)
            }
            Some(parent_id) => {
                let parent_span = self
                    .tree
                    .get(parent_id)
                    .map(|p| p.span)
                    .unwrap_or(label.span);
                let expanded_self = expand_to_word_boundaries(label.span, self.chars);
                let expanded_parent = expand_to_word_boundaries(parent_span, self.chars);

                let local = if predicted.is_some()
                    && child_max == 0
                    && expanded_self != expanded_parent
                {
                    // Detected under its own distinct span and no grandchild
                    // already explains it.
                    1
                } else if predicted.is_none() && child_max == 0 {
                    if check_siblings {
                        let mut sibling_nonzero = false;
                        let siblings: Vec<LabelId> = self.tree.siblings(id).collect();
                        for sibling in siblings {
                            // Probe without cascading through the sibling's
                            // own siblings, and without memoizing.
                            if self.walk(sibling, false)? != 0 {
                                sibling_nonzero = true;
                            }
                        }
                        u32::from(!sibling_nonzero)
                    } else {
                        1
                    }
                } else {
                    0
                };
                (local, child_max.max(local))
            }
        };

        // Sibling probes are side-effect free; only the seeded walk writes.
        if check_siblings {
            self.memo.insert(id, local);
            self.resolved.insert(id, result);
        }
        Ok(result)
    }

    /// True iff every leaf path below this label reaches a mention whose
    /// predicted entity equals its ground-truth entity.
    #[must_use]
    pub fn recursively_children_correctly_linked(&self, id: LabelId) -> bool {
        let Some(label) = self.tree.get(id) else {
            return false;
        };
        if self.predicted_entity(id).as_deref() == Some(label.entity_id.as_str()) {
            return true;
        }
        !label.children.is_empty()
            && label
                .children
                .iter()
                .all(|&c| self.recursively_children_correctly_linked(c))
    }

    /// True iff every leaf path below this label reaches a mention that was
    /// detected at all (linked or not).
    #[must_use]
    pub fn recursively_children_detected(&self, id: LabelId) -> bool {
        let Some(label) = self.tree.get(id) else {
            return false;
        };
        if self.index.covering(label.span).is_some() {
            return true;
        }
        !label.children.is_empty()
            && label
                .children
                .iter()
                .all(|&c| self.recursively_children_detected(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::cases::PredictionIndex;
    use crate::label::{GroundTruthLabel, Prediction};
    use crate::span::Span;
    use std::collections::HashMap;

    fn label(id: LabelId, start: usize, end: usize) -> GroundTruthLabel {
        GroundTruthLabel::new(id, Span::new(start, end), format!("Q{id}"), "Q515")
    }

    fn predictions(entries: &[(usize, usize, &str)]) -> HashMap<Span, Prediction> {
        entries
            .iter()
            .map(|&(s, e, q)| (Span::new(s, e), Prediction::new(Span::new(s, e), q)))
            .collect()
    }

    #[test]
    fn test_flat_correct_prediction() {
        let chars: Vec<char> = "aaaaaaaaaa".chars().collect();
        let labels = vec![label(1, 0, 10)];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[(0, 10, "Q1")]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all().unwrap();
        assert_eq!(resolver.factor(1), 1);
    }

    #[test]
    fn test_nothing_detected_single_root() {
        let chars: Vec<char> = "aaaaaaaaaa".chars().collect();
        let labels = vec![label(1, 0, 10)];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all().unwrap();
        assert_eq!(resolver.factor(1), 1);
    }

    /// Reproduces the nested doctest: the child chain wins, the root and the
    /// intermediate links drop to factor 0.
    #[test]
    fn test_nested_child_wins() {
        let chars: Vec<char> = "ab  cd  ef".chars().collect();
        let labels = vec![
            label(1, 0, 10).with_children(vec![2]),
            label(2, 0, 2).with_parent(1).with_children(vec![3]),
            label(3, 0, 2).with_parent(2),
            label(5, 4, 6).with_children(vec![6]),
            label(6, 4, 6).with_parent(5).with_children(vec![8]),
            label(8, 4, 6).with_parent(6),
            label(7, 8, 10),
        ];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[(0, 2, "Q3"), (4, 6, "Q8"), (8, 10, "Q7")]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);

        assert_eq!(resolver.determine_factor(1).unwrap(), 0);
        resolver.resolve_all().unwrap();

        let expected: HashMap<LabelId, u32> =
            [(1, 0), (2, 0), (3, 1), (5, 0), (6, 0), (7, 1), (8, 1)]
                .into_iter()
                .collect();
        assert_eq!(resolver.factors(), &expected);
    }

    /// With every child undetected, exactly one child carries the miss and
    /// the root drops to 0.
    #[test]
    fn test_undetected_children_single_carrier() {
        let chars: Vec<char> = "ab  cd  ef".chars().collect();
        let labels = vec![
            label(1, 0, 10).with_children(vec![2, 3]),
            label(2, 0, 2).with_parent(1),
            label(3, 4, 6).with_parent(1),
        ];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all().unwrap();

        assert_eq!(resolver.factor(1), 0);
        assert_eq!(resolver.factor(2) + resolver.factor(3), 1);
    }

    /// A single undetected child takes the miss from its root.
    #[test]
    fn test_single_undetected_child_carries_miss() {
        let chars: Vec<char> = "ab  cd  ef".chars().collect();
        let labels = vec![
            label(1, 0, 10).with_children(vec![2]),
            label(2, 0, 2).with_parent(1),
        ];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all().unwrap();

        assert_eq!(resolver.factor(2), 1);
        assert_eq!(resolver.factor(1), 0);
    }

    #[test]
    fn test_detected_child_with_distinct_span() {
        let chars: Vec<char> = "ab  cd  ef".chars().collect();
        let labels = vec![
            label(1, 0, 10).with_children(vec![2, 3]),
            label(2, 0, 2).with_parent(1),
            label(3, 4, 6).with_parent(1),
        ];
        let tree = GroundTruthTree::new(&labels).unwrap();
        // Child 2 detected (wrong entity) under its own span; child 3 not.
        let preds = predictions(&[(0, 2, "Q99")]);
        let index = PredictionIndex::new(&preds, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all().unwrap();

        // Child 2: detected under a distinct span, no grandchildren.
        assert_eq!(resolver.factor(2), 1);
        // Child 3: undetected, but sibling 2 has nonzero factor.
        assert_eq!(resolver.factor(3), 0);
        // Root: a child already explains the mention.
        assert_eq!(resolver.factor(1), 0);
    }

    #[test]
    fn test_cycle_is_fatal() {
        // Hand-build a cyclic "tree" by bypassing validation.
        let chars: Vec<char> = "abcd".chars().collect();
        let labels = vec![
            label(1, 0, 4).with_children(vec![2]),
            label(2, 0, 2).with_parent(1).with_children(vec![1]),
        ];
        // Tree validation itself rejects this shape.
        assert!(GroundTruthTree::new(&labels).is_err());
        let _ = chars;
    }

    #[test]
    fn test_recursive_predicates() {
        let chars: Vec<char> = "ab  cd  ef".chars().collect();
        let labels = vec![
            label(1, 0, 10).with_children(vec![2, 3]),
            label(2, 0, 2).with_parent(1),
            label(3, 4, 6).with_parent(1),
        ];
        let tree = GroundTruthTree::new(&labels).unwrap();
        let preds = predictions(&[(0, 2, "Q2"), (4, 6, "Q99")]);
        let index = PredictionIndex::new(&preds, &chars);
        let resolver = FactorResolver::new(&tree, &index, &chars);

        // Both children detected, but child 3 linked to the wrong entity.
        assert!(resolver.recursively_children_detected(1));
        assert!(!resolver.recursively_children_correctly_linked(1));
        assert!(resolver.recursively_children_correctly_linked(2));
    }
}
