//! Case generation: merging predictions and ground truth per article.
//!
//! A [`Case`] is the unit of evaluation: one mention, either annotated in the
//! ground truth (detected or not) or hallucinated by the system. The
//! generator matches predicted spans to labels under the word-boundary-
//! tolerant rule, resolves the de-duplication factor for nested labels, and
//! derives everything the classifier and labeler need so that both stay pure.

use crate::error::{Error, Result};
use crate::eval::error_label::ErrorLabel;
use crate::eval::factor::FactorResolver;
use crate::eval::modes::{EvalTypeSet, PerMode};
use crate::eval::tree::GroundTruthTree;
use crate::kb::KnowledgeBase;
use crate::label::{
    is_unknown_entity, Article, MentionType, Prediction, PredictionSource, TYPE_DATETIME,
    TYPE_QUANTITY,
};
use crate::span::{expand_to_word_boundaries, span_text, Span};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

// =============================================================================
// Prediction index
// =============================================================================

/// Merged lookup over raw prediction spans and their word-boundary
/// expansions. Exact-span keys take priority over expanded ones.
pub struct PredictionIndex<'a> {
    merged: HashMap<Span, &'a Prediction>,
    chars: &'a [char],
}

impl<'a> PredictionIndex<'a> {
    /// Build the merged map. Collisions between expanded keys are resolved
    /// in span order so the index is deterministic.
    #[must_use]
    pub fn new(predictions: &'a HashMap<Span, Prediction>, chars: &'a [char]) -> Self {
        let mut spans: Vec<Span> = predictions.keys().copied().collect();
        spans.sort();

        let mut merged: HashMap<Span, &'a Prediction> = HashMap::with_capacity(spans.len() * 2);
        for span in &spans {
            merged.insert(*span, &predictions[span]);
        }
        for span in &spans {
            let expanded = expand_to_word_boundaries(*span, chars);
            merged.entry(expanded).or_insert(&predictions[span]);
        }
        Self { merged, chars }
    }

    /// The prediction covering a span: exact match first, then the span's
    /// word-boundary expansion.
    #[must_use]
    pub fn covering(&self, span: Span) -> Option<&'a Prediction> {
        self.merged.get(&span).copied().or_else(|| {
            self.merged
                .get(&expand_to_word_boundaries(span, self.chars))
                .copied()
        })
    }
}

// =============================================================================
// Case
// =============================================================================

/// Ground-truth side of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseGroundTruth {
    /// Label id within the article.
    pub id: u32,
    /// Gold entity id (possibly an `Unknown*` sentinel).
    pub entity_id: String,
    /// `|`-joined type list of the label.
    pub entity_type: String,
    /// Explicit optional flag.
    pub optional: bool,
    /// True if the label has nested children.
    pub has_children: bool,
}

impl CaseGroundTruth {
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

    /// True if the gold referent is a concrete known entity.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !is_unknown_entity(&self.entity_id) && !self.is_quantity() && !self.is_datetime()
    }
}

/// Prediction side of a case. Quantity/datetime flags are resolved against
/// the knowledge base at generation time so the classifier stays pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasePrediction {
    /// Predicted entity id; `None` means detected but not linked.
    pub entity_id: Option<String>,
    /// Candidate ids the linker considered.
    #[serde(default)]
    pub candidates: BTreeSet<String>,
    /// Producing stage.
    pub source: PredictionSource,
    /// The predicted entity is a quantity.
    #[serde(default)]
    pub is_quantity: bool,
    /// The predicted entity is a point in time.
    #[serde(default)]
    pub is_datetime: bool,
}

impl CasePrediction {
    /// True if the prediction names a concrete known entity.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.entity_id.as_deref().is_some_and(|e| !is_unknown_entity(e))
    }
}

/// The unit of evaluation: one mention with everything needed to judge it.
///
/// Created once by the generator, annotated in place by the classifier and
/// the labeler, then read-only for aggregation. Serde round trips preserve
/// eval types, error labels, and the factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Mention span.
    pub span: Span,
    /// Mention surface string.
    pub text: String,
    /// Ground-truth side, if the mention is annotated.
    pub ground_truth: Option<CaseGroundTruth>,
    /// Prediction side, if the mention was detected.
    pub prediction: Option<CasePrediction>,
    /// Derived optionality: explicit flag OR quantity/datetime.
    pub is_optional: bool,
    /// Inclusion weight for nested labels, 0 or 1.
    pub factor: u32,
    /// Coarse mention category.
    pub mention_type: MentionType,
    /// Linking judgement per evaluation mode.
    pub linking_eval_types: PerMode<EvalTypeSet>,
    /// NER (span-only) judgement per evaluation mode.
    pub ner_eval_types: PerMode<EvalTypeSet>,
    /// Diagnostic labels per evaluation mode.
    pub error_labels: PerMode<BTreeSet<ErrorLabel>>,
    /// The ground truth is a pronominal mention, or the covering prediction
    /// came out of a coreference stage. Narrower than [`MentionType`]'s
    /// nominal bucket so that lowercase noun phrases still count toward the
    /// plain detection diagnostics.
    pub is_true_coreference: bool,
    /// The coreference stage referenced a span holding the right entity.
    pub correct_span_referenced: bool,
    /// Antecedent span reported by a coreference stage.
    pub referenced_span: Option<Span>,
    /// Factor-0 fallback: every leaf below is correctly linked.
    pub children_correctly_linked: Option<bool>,
    /// Factor-0 fallback: every leaf below is detected.
    pub children_correctly_detected: Option<bool>,
}

impl Case {
    /// True if the mention is annotated in the ground truth.
    #[must_use]
    pub fn has_ground_truth(&self) -> bool {
        self.ground_truth.is_some()
    }

    /// True if the mention was detected by the system.
    #[must_use]
    pub fn has_prediction(&self) -> bool {
        self.prediction.is_some()
    }

    /// The predicted entity id, if any.
    #[must_use]
    pub fn predicted_entity(&self) -> Option<&str> {
        self.prediction.as_ref()?.entity_id.as_deref()
    }

    /// The gold entity id, if any.
    #[must_use]
    pub fn gold_entity(&self) -> Option<&str> {
        self.ground_truth.as_ref().map(|gt| gt.entity_id.as_str())
    }

    /// Coreference case: a coreference mention in the ground truth, or a
    /// mention produced by a coreference stage.
    #[must_use]
    pub fn is_coreference(&self) -> bool {
        self.mention_type.is_coreference()
            || self
                .prediction
                .as_ref()
                .is_some_and(|p| p.source == PredictionSource::Coreference)
    }

    /// Gold and predicted entity agree: identical ids, or both sides are a
    /// quantity, or both are a date/time.
    #[must_use]
    pub fn entities_match(&self) -> bool {
        let (Some(gt), Some(pred)) = (self.ground_truth.as_ref(), self.prediction.as_ref())
        else {
            return false;
        };
        if gt.is_quantity() {
            return pred.is_quantity;
        }
        if gt.is_datetime() {
            return pred.is_datetime;
        }
        pred.entity_id.as_deref() == Some(gt.entity_id.as_str())
    }

    /// The surface text contains no uppercase character.
    #[must_use]
    pub fn is_lowercase(&self) -> bool {
        !self.text.chars().any(char::is_uppercase)
    }
}

// =============================================================================
// Case generator
// =============================================================================

/// Builds the per-article case list.
pub struct CaseGenerator<'a, K: KnowledgeBase + ?Sized> {
    kb: &'a K,
}

impl<'a, K: KnowledgeBase + ?Sized> CaseGenerator<'a, K> {
    /// Create a generator over the injected knowledge base.
    #[must_use]
    pub fn new(kb: &'a K) -> Self {
        Self { kb }
    }

    /// Generate the span-sorted case list for one article.
    ///
    /// # Errors
    ///
    /// Propagates ground-truth tree validation failures and factor cycles,
    /// which abort evaluation of the article.
    pub fn generate(&self, article: &Article) -> Result<Vec<Case>> {
        let chars: Vec<char> = article.text.chars().collect();

        // An annotation outside the text is a benchmark-integrity bug; a
        // prediction outside the text is system output and only clamped.
        for label in &article.labels {
            if label.span.end > chars.len() {
                return Err(Error::SpanOutOfBounds {
                    start: label.span.start,
                    end: label.span.end,
                    len: chars.len(),
                });
            }
        }
        for span in article.predictions.keys() {
            if span.end > chars.len() {
                log::warn!("prediction span {span} exceeds text length {}", chars.len());
            }
        }

        let tree = GroundTruthTree::new(&article.labels)?;
        let index = PredictionIndex::new(&article.predictions, &chars);
        let mut resolver = FactorResolver::new(&tree, &index, &chars);
        resolver.resolve_all()?;

        let mut cases = Vec::with_capacity(tree.len() + article.predictions.len());
        let mut consumed: HashSet<Span> = HashSet::new();

        for label in tree.iter() {
            let prediction = index.covering(label.span);
            if let Some(p) = prediction {
                consumed.insert(p.span);
            }
            let factor = resolver.factor(label.id);
            let text = span_text(label.span, &chars);
            let mention_type = MentionType::derive(
                &text,
                prediction.is_some_and(Prediction::is_coreference),
            );

            let (children_linked, children_detected) = if factor == 0 {
                (
                    Some(resolver.recursively_children_correctly_linked(label.id)),
                    Some(resolver.recursively_children_detected(label.id)),
                )
            } else {
                (None, None)
            };

            cases.push(Case {
                span: label.span,
                text,
                ground_truth: Some(CaseGroundTruth {
                    id: label.id,
                    entity_id: label.entity_id.clone(),
                    entity_type: label.entity_type.clone(),
                    optional: label.optional,
                    has_children: !label.children.is_empty(),
                }),
                prediction: prediction.map(|p| self.case_prediction(p)),
                is_optional: label.is_optional(),
                factor,
                mention_type,
                linking_eval_types: PerMode::default(),
                ner_eval_types: PerMode::default(),
                error_labels: PerMode::default(),
                is_true_coreference: mention_type == MentionType::Pronominal
                    || prediction.is_some_and(Prediction::is_coreference),
                correct_span_referenced: prediction
                    .is_some_and(|p| self.references_correct_span(p, &label.entity_id, &tree, &chars)),
                referenced_span: prediction.and_then(|p| p.referenced_span),
                children_correctly_linked: children_linked,
                children_correctly_detected: children_detected,
            });
        }

        // Unmatched predictions become ground-truth-less cases.
        let mut remaining: Vec<&Prediction> = article
            .predictions
            .values()
            .filter(|p| !consumed.contains(&p.span))
            .collect();
        remaining.sort_by_key(|p| p.span);

        for p in remaining {
            let text = span_text(p.span, &chars);
            let mention_type = MentionType::derive(&text, p.is_coreference());
            cases.push(Case {
                span: p.span,
                text,
                ground_truth: None,
                prediction: Some(self.case_prediction(p)),
                is_optional: false,
                factor: 1,
                mention_type,
                linking_eval_types: PerMode::default(),
                ner_eval_types: PerMode::default(),
                error_labels: PerMode::default(),
                is_true_coreference: false,
                correct_span_referenced: false,
                referenced_span: p.referenced_span,
                children_correctly_linked: None,
                children_correctly_detected: None,
            });
        }

        cases.sort_by_key(|c| (c.span, c.ground_truth.is_none()));
        Ok(cases)
    }

    fn case_prediction(&self, p: &Prediction) -> CasePrediction {
        let (is_quantity, is_datetime) = match p.entity_id.as_deref() {
            Some(e) => (self.kb.is_quantity(e), self.kb.is_datetime(e)),
            None => (false, false),
        };
        CasePrediction {
            entity_id: p.entity_id.clone(),
            candidates: p.candidates.iter().cloned().collect(),
            source: p.source,
            is_quantity,
            is_datetime,
        }
    }

    /// The coreference antecedent span points at a ground-truth occurrence
    /// of this case's gold entity.
    fn references_correct_span(
        &self,
        p: &Prediction,
        gold_entity: &str,
        tree: &GroundTruthTree,
        chars: &[char],
    ) -> bool {
        let Some(referenced) = p.referenced_span else {
            return false;
        };
        let expanded = expand_to_word_boundaries(referenced, chars);
        tree.iter().any(|l| {
            l.entity_id == gold_entity
                && (l.span == referenced
                    || expand_to_word_boundaries(l.span, chars) == expanded)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::InMemoryKb;
    use crate::label::GroundTruthLabel;

    fn kb() -> InMemoryKb {
        let mut kb = InMemoryKb::new();
        kb.add_entity("Q1", vec!["Q515"], 10);
        kb.add_entity("Q2", vec!["Q515"], 5);
        kb
    }

    fn article(
        labels: Vec<GroundTruthLabel>,
        predictions: Vec<Prediction>,
    ) -> Article {
        Article::new("Berlin is in Germany today", labels, predictions)
    }

    #[test]
    fn test_matched_prediction_consumed() {
        let labels = vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q1", "Q515")];
        let preds = vec![Prediction::new(Span::new(0, 6), "Q1")];
        let kb = kb();
        let cases = CaseGenerator::new(&kb).generate(&article(labels, preds)).unwrap();

        assert_eq!(cases.len(), 1);
        assert!(cases[0].has_ground_truth());
        assert!(cases[0].has_prediction());
        assert_eq!(cases[0].factor, 1);
        assert_eq!(cases[0].text, "Berlin");
    }

    #[test]
    fn test_expanded_span_matches() {
        // Prediction covers "Berli"; expansion matches the gold span.
        let labels = vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q1", "Q515")];
        let preds = vec![Prediction::new(Span::new(0, 5), "Q1")];
        let kb = kb();
        let cases = CaseGenerator::new(&kb).generate(&article(labels, preds)).unwrap();

        assert_eq!(cases.len(), 1);
        assert!(cases[0].has_prediction());
        assert!(cases[0].entities_match());
    }

    #[test]
    fn test_unmatched_prediction_becomes_case() {
        let labels = vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q1", "Q515")];
        let preds = vec![Prediction::new(Span::new(13, 20), "Q2")];
        let kb = kb();
        let cases = CaseGenerator::new(&kb).generate(&article(labels, preds)).unwrap();

        assert_eq!(cases.len(), 2);
        assert!(!cases[1].has_ground_truth());
        assert_eq!(cases[1].text, "Germany");
        assert_eq!(cases[1].factor, 1);
    }

    #[test]
    fn test_cases_sorted_by_span() {
        let labels = vec![
            GroundTruthLabel::new(1, Span::new(13, 20), "Q2", "Q515"),
            GroundTruthLabel::new(2, Span::new(0, 6), "Q1", "Q515"),
        ];
        let kb = kb();
        let cases = CaseGenerator::new(&kb).generate(&article(labels, vec![])).unwrap();
        assert_eq!(cases[0].span, Span::new(0, 6));
        assert_eq!(cases[1].span, Span::new(13, 20));
    }

    #[test]
    fn test_quantity_match() {
        let mut kb = kb();
        kb.add_quantity("Q100");
        let labels = vec![GroundTruthLabel::new(
            1,
            Span::new(0, 6),
            "Unknown1",
            TYPE_QUANTITY,
        )];
        let preds = vec![Prediction::new(Span::new(0, 6), "Q100")];
        let cases = CaseGenerator::new(&kb).generate(&article(labels, preds)).unwrap();

        assert!(cases[0].is_optional);
        assert!(cases[0].entities_match());
    }

    #[test]
    fn test_out_of_bounds_label_is_fatal() {
        let labels = vec![GroundTruthLabel::new(1, Span::new(0, 99), "Q1", "Q515")];
        let kb = kb();
        let err = CaseGenerator::new(&kb)
            .generate(&article(labels, vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::SpanOutOfBounds { end: 99, .. }));
    }

    #[test]
    fn test_case_serde_roundtrip() {
        let labels = vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q1", "Q515")];
        let preds = vec![Prediction::new(Span::new(0, 6), "Q2")];
        let kb = kb();
        let cases = CaseGenerator::new(&kb).generate(&article(labels, preds)).unwrap();

        let json = serde_json::to_string(&cases[0]).unwrap();
        let back: Case = serde_json::from_str(&json).unwrap();
        assert_eq!(cases[0], back);
    }
}
