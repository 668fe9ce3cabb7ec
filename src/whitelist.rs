//! Whitelist of coarse entity types and the adjustment ruleset.
//!
//! Raw knowledge-base types are mapped onto a curated, ordered set of
//! canonical type ids before aggregation. The adjustment ruleset is an opaque
//! input: `replace_with` substitutes one type for another, `minus` removes a
//! type whenever another is present (e.g. drop "fictional character" when a
//! more specific type survives).

use crate::label::TYPE_OTHER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Adjustment rules applied when normalizing raw types to the whitelist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeAdjustments {
    /// Substitute the key type with the value type.
    #[serde(default)]
    pub replace_with: HashMap<String, String>,
    /// Remove the key type whenever the value type is also present.
    #[serde(default)]
    pub minus: HashMap<String, String>,
}

/// Ordered set of canonical type ids with display names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeWhitelist {
    /// Canonical type ids in display order, with human-readable names.
    pub types: Vec<(String, String)>,
    /// Adjustment ruleset.
    #[serde(default)]
    pub adjustments: TypeAdjustments,
}

impl TypeWhitelist {
    /// Create a whitelist from `(type id, display name)` pairs.
    #[must_use]
    pub fn new(types: Vec<(&str, &str)>) -> Self {
        Self {
            types: types
                .into_iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            adjustments: TypeAdjustments::default(),
        }
    }

    /// Set the adjustment ruleset.
    #[must_use]
    pub fn with_adjustments(mut self, adjustments: TypeAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    /// True if the id is a whitelist type.
    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.iter().any(|(id, _)| id == type_id)
    }

    /// Display name for a type id, or the id itself if unlisted.
    #[must_use]
    pub fn display_name<'a>(&'a self, type_id: &'a str) -> &'a str {
        self.types
            .iter()
            .find(|(id, _)| id == type_id)
            .map_or(type_id, |(_, name)| name.as_str())
    }

    /// Map raw entity types onto the whitelist.
    ///
    /// Applies `replace_with`, then `minus`, then filters to whitelist
    /// members. An empty result collapses to `[OTHER]`.
    #[must_use]
    pub fn normalize(&self, raw_types: &[String]) -> Vec<String> {
        let mut result: Vec<String> = raw_types
            .iter()
            .map(|t| {
                self.adjustments
                    .replace_with
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| t.clone())
            })
            .collect();

        result.retain(|t| {
            self.adjustments
                .minus
                .get(t)
                .map_or(true, |suppressor| !raw_types.iter().any(|r| r == suppressor))
        });

        result.retain(|t| self.contains(t));
        result.dedup();
        if result.is_empty() {
            result.push(TYPE_OTHER.to_string());
        }
        result
    }
}
