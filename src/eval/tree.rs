//! Ground-truth label tree for one article.
//!
//! Validates the tree invariants at construction time: every referenced
//! parent exists and precedes its children, and `parent`/`children` links are
//! mutual inverses. A violated invariant is an upstream data-integrity bug
//! and aborts evaluation of the article.

use crate::error::{Error, Result};
use crate::label::{GroundTruthLabel, LabelId};
use std::collections::HashMap;

/// Index over the ground-truth labels of one article.
#[derive(Debug, Clone)]
pub struct GroundTruthTree {
    labels: HashMap<LabelId, GroundTruthLabel>,
    roots: Vec<LabelId>,
    order: Vec<LabelId>,
}

impl GroundTruthTree {
    /// Build and validate the tree from the article's label list.
    ///
    /// # Errors
    ///
    /// [`Error::MissingParent`] if a label references a parent that does not
    /// exist or appears after it; [`Error::InconsistentLinks`] if the
    /// parent/children links are not mutual inverses.
    pub fn new(labels: &[GroundTruthLabel]) -> Result<Self> {
        let mut map: HashMap<LabelId, GroundTruthLabel> = HashMap::with_capacity(labels.len());
        let mut roots = Vec::new();
        let order: Vec<LabelId> = labels.iter().map(|l| l.id).collect();

        for label in labels {
            if let Some(parent_id) = label.parent {
                // Parents must precede their children in the input order.
                let parent = map
                    .get(&parent_id)
                    .ok_or_else(|| Error::missing_parent(label.id, parent_id))?;
                if !parent.children.contains(&label.id) {
                    return Err(Error::InconsistentLinks {
                        label: label.id,
                        other: parent_id,
                    });
                }
            } else {
                roots.push(label.id);
            }
            map.insert(label.id, label.clone());
        }

        // Every claimed child must exist and point back.
        for label in labels {
            for &child_id in &label.children {
                let child = map.get(&child_id).ok_or(Error::InconsistentLinks {
                    label: label.id,
                    other: child_id,
                })?;
                if child.parent != Some(label.id) {
                    return Err(Error::InconsistentLinks {
                        label: child_id,
                        other: label.id,
                    });
                }
            }
        }

        Ok(Self {
            labels: map,
            roots,
            order,
        })
    }

    /// Label by id.
    #[must_use]
    pub fn get(&self, id: LabelId) -> Option<&GroundTruthLabel> {
        self.labels.get(&id)
    }

    /// Parent of a label, if nested.
    #[must_use]
    pub fn parent(&self, id: LabelId) -> Option<&GroundTruthLabel> {
        self.get(id)
            .and_then(|l| l.parent)
            .and_then(|p| self.labels.get(&p))
    }

    /// Direct children ids of a label.
    #[must_use]
    pub fn children(&self, id: LabelId) -> &[LabelId] {
        self.get(id).map_or(&[], |l| l.children.as_slice())
    }

    /// Sibling ids (other children of the same parent).
    pub fn siblings(&self, id: LabelId) -> impl Iterator<Item = LabelId> + '_ {
        self.parent(id)
            .map(|p| p.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&s| s != id)
    }

    /// Root label ids.
    #[must_use]
    pub fn roots(&self) -> &[LabelId] {
        &self.roots
    }

    /// Label ids in the original (parent-before-children) input order.
    #[must_use]
    pub fn order(&self) -> &[LabelId] {
        &self.order
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the article has no ground truth.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate all labels in input order.
    pub fn iter(&self) -> impl Iterator<Item = &GroundTruthLabel> + '_ {
        self.order.iter().filter_map(move |id| self.labels.get(id))
    }
}
