//! Ground-truth labels, predictions, and article input.
//!
//! A [`GroundTruthLabel`] is one node of a per-article label tree: nested
//! mentions ("Mayor of Paris" containing "Paris") are represented as
//! parent/child links between labels. A [`Prediction`] is one mention emitted
//! by a linker or coreference stage. An [`Article`] bundles everything the
//! evaluation engine consumes for a single document.

use crate::span::Span;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Sentinel entity-id prefix meaning "no specific referent known".
pub const UNKNOWN_ENTITY_PREFIX: &str = "Unknown";

/// Sentinel type id for quantity mentions.
pub const TYPE_QUANTITY: &str = "QUANTITY";
/// Sentinel type id for date/time mentions.
pub const TYPE_DATETIME: &str = "DATETIME";
/// Sentinel type id for entities outside the whitelist.
pub const TYPE_OTHER: &str = "OTHER";

/// Non-entity pronouns that mark a spurious coreference detection.
pub static COREFERENCE_PRONOUNS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["it", "this", "that", "its"].into_iter().collect());

/// True for the `Unknown*` sentinel family of entity ids.
#[must_use]
pub fn is_unknown_entity(entity_id: &str) -> bool {
    entity_id.starts_with(UNKNOWN_ENTITY_PREFIX)
}

/// Unique id of a ground-truth label within one article.
pub type LabelId = u32;

/// A single ground-truth annotation.
///
/// Labels are produced in an order where a label's parent always precedes it;
/// `parent`/`children` are mutual inverses and child spans are contained in
/// their parent's span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthLabel {
    /// Unique id within the article.
    pub id: LabelId,
    /// Mention span (half-open char interval).
    pub span: Span,
    /// Knowledge-base entity id, or an `Unknown*` sentinel.
    pub entity_id: String,
    /// `|`-joined whitelist type ids, or one of the QUANTITY/DATETIME/OTHER
    /// sentinels.
    pub entity_type: String,
    /// Explicit optional flag from the benchmark.
    pub optional: bool,
    /// Id of the enclosing label, if nested.
    pub parent: Option<LabelId>,
    /// Ordered ids of directly nested labels.
    pub children: Vec<LabelId>,
}

impl GroundTruthLabel {
    /// Create a root label with no parent or children.
    #[must_use]
    pub fn new(
        id: LabelId,
        span: Span,
        entity_id: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            span,
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            optional: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the explicit optional flag.
    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the parent id.
    #[must_use]
    pub fn with_parent(mut self, parent: LabelId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the children ids.
    #[must_use]
    pub fn with_children(mut self, children: Vec<LabelId>) -> Self {
        self.children = children;
        self
    }

    /// Split the `|`-joined type list.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entity_type.split('|').filter(|t| !t.is_empty())
    }

    /// True if the label is typed as a quantity.
    #[must_use]
    pub fn is_quantity(&self) -> bool {
        self.entity_type == TYPE_QUANTITY
    }

    /// True if the label is typed as a date/time.
    #[must_use]
    pub fn is_datetime(&self) -> bool {
        self.entity_type == TYPE_DATETIME
    }

    /// Optional for evaluation: explicitly flagged, or a quantity/datetime.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional || self.is_quantity() || self.is_datetime()
    }

    /// True if the label refers to a concrete known entity, i.e. it is not
    /// an `Unknown*` sentinel and not a quantity/datetime.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !is_unknown_entity(&self.entity_id) && !self.is_quantity() && !self.is_datetime()
    }
}

/// Tag identifying which stage produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// An entity linker proper.
    Linker,
    /// A coreference resolution stage.
    Coreference,
}

/// A predicted mention read from the prediction source. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted mention span.
    pub span: Span,
    /// Predicted entity id; `None` means detected but not linked (NIL).
    pub entity_id: Option<String>,
    /// Knowledge-base ids the linker considered for this mention.
    #[serde(default)]
    pub candidates: HashSet<String>,
    /// Which linker/coref stage produced this mention.
    pub source: PredictionSource,
    /// Antecedent mention span, set only by coreference stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_span: Option<Span>,
}

impl Prediction {
    /// Create a linker prediction.
    #[must_use]
    pub fn new(span: Span, entity_id: impl Into<String>) -> Self {
        Self {
            span,
            entity_id: Some(entity_id.into()),
            candidates: HashSet::new(),
            source: PredictionSource::Linker,
            referenced_span: None,
        }
    }

    /// Create a detected-but-unlinked (NIL) prediction.
    #[must_use]
    pub fn nil(span: Span) -> Self {
        Self {
            span,
            entity_id: None,
            candidates: HashSet::new(),
            source: PredictionSource::Linker,
            referenced_span: None,
        }
    }

    /// Set the candidate set.
    #[must_use]
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = String>) -> Self {
        self.candidates = candidates.into_iter().collect();
        self
    }

    /// Mark as produced by a coreference stage referencing `antecedent`.
    #[must_use]
    pub fn with_coreference(mut self, antecedent: Span) -> Self {
        self.source = PredictionSource::Coreference;
        self.referenced_span = Some(antecedent);
        self
    }

    /// True if the prediction carries a concrete (non-NIL, non-Unknown)
    /// entity id.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.entity_id.as_deref().is_some_and(|e| !is_unknown_entity(e))
    }

    /// True if this mention came from a coreference stage.
    #[must_use]
    pub fn is_coreference(&self) -> bool {
        self.source == PredictionSource::Coreference
    }
}

/// Coarse mention category used for the aggregate breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionType {
    /// A named entity mention ("Angela Merkel").
    EntityNamed,
    /// An entity mention that is not a name (e.g. an all-caps code or
    /// non-capitalized proper reference).
    EntityOther,
    /// A nominal coreference mention ("the chancellor").
    Nominal,
    /// A pronominal coreference mention ("she").
    Pronominal,
}

impl MentionType {
    /// True for the two coreference categories.
    #[must_use]
    pub fn is_coreference(&self) -> bool {
        matches!(self, MentionType::Nominal | MentionType::Pronominal)
    }

    /// Derive the mention type from the surface text and producer.
    ///
    /// Pronouns are pronominal; other coreference-stage mentions and
    /// all-lowercase mentions are nominal; mentions with an
    /// uppercase-initial word are named; the rest are other.
    #[must_use]
    pub fn derive(text: &str, from_coreference: bool) -> Self {
        let folded = text.trim().to_lowercase();
        if COREFERENCE_PRONOUNS.contains(folded.as_str()) {
            return MentionType::Pronominal;
        }
        let has_named_word = text
            .split_whitespace()
            .any(|w| w.chars().next().is_some_and(char::is_uppercase));
        if from_coreference || !text.chars().any(char::is_uppercase) {
            return MentionType::Nominal;
        }
        if has_named_word {
            MentionType::EntityNamed
        } else {
            MentionType::EntityOther
        }
    }
}

/// Everything the evaluation engine consumes for a single article.
#[derive(Debug, Clone)]
pub struct Article {
    /// Plain text of the article (used for substring extraction and
    /// word-boundary lookups).
    pub text: String,
    /// Ground-truth labels, parents before children.
    pub labels: Vec<GroundTruthLabel>,
    /// Predicted mentions keyed by span.
    pub predictions: HashMap<Span, Prediction>,
    /// Raw hyperlink spans from the source document.
    pub hyperlinks: HashSet<Span>,
}

impl Article {
    /// Create an article from text, labels, and predictions.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        labels: Vec<GroundTruthLabel>,
        predictions: impl IntoIterator<Item = Prediction>,
    ) -> Self {
        Self {
            text: text.into(),
            labels,
            predictions: predictions.into_iter().map(|p| (p.span, p)).collect(),
            hyperlinks: HashSet::new(),
        }
    }

    /// Set the hyperlink spans.
    #[must_use]
    pub fn with_hyperlinks(mut self, hyperlinks: impl IntoIterator<Item = Span>) -> Self {
        self.hyperlinks = hyperlinks.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sentinel() {
        assert!(is_unknown_entity("Unknown"));
        assert!(is_unknown_entity("Unknown3"));
        assert!(!is_unknown_entity("Q42"));
    }

    #[test]
    fn test_label_optionality() {
        let quantity = GroundTruthLabel::new(1, Span::new(0, 3), "Unknown1", TYPE_QUANTITY);
        assert!(quantity.is_optional());
        assert!(!quantity.is_known());

        let explicit =
            GroundTruthLabel::new(2, Span::new(0, 3), "Q64", "Q515").with_optional(true);
        assert!(explicit.is_optional());
        assert!(explicit.is_known());

        let plain = GroundTruthLabel::new(3, Span::new(0, 3), "Q64", "Q515");
        assert!(!plain.is_optional());
    }

    #[test]
    fn test_type_list_split() {
        let label = GroundTruthLabel::new(1, Span::new(0, 3), "Q64", "Q515|Q43229");
        let types: Vec<&str> = label.types().collect();
        assert_eq!(types, vec!["Q515", "Q43229"]);
    }

    #[test]
    fn test_mention_type_derivation() {
        assert_eq!(MentionType::derive("she", false), MentionType::Nominal);
        assert_eq!(MentionType::derive("it", true), MentionType::Pronominal);
        assert_eq!(
            MentionType::derive("the chancellor", true),
            MentionType::Nominal
        );
        assert_eq!(
            MentionType::derive("Angela Merkel", false),
            MentionType::EntityNamed
        );
        assert_eq!(MentionType::derive("iPhone", false), MentionType::EntityOther);
    }

    #[test]
    fn test_nil_prediction() {
        let p = Prediction::nil(Span::new(0, 4));
        assert!(!p.is_known());
        assert!(p.entity_id.is_none());
    }
}
