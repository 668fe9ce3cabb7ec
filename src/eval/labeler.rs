//! Diagnostic error labeling.
//!
//! Second pass over an article's classified cases: assigns zero or more
//! [`ErrorLabel`]s per evaluation mode, using lexical and statistical
//! predicates over the knowledge base (demonym lists, candidate popularity,
//! partial names). Runs after classification because the groups are keyed on
//! the linking/NER judgements, and needs the whole case list for overlap
//! checks and the backward coreference-antecedent scan.

use crate::eval::cases::{Case, CasePrediction};
use crate::eval::error_label::ErrorLabel;
use crate::eval::modes::{EvalMode, EvalType};
use crate::kb::{most_popular_candidate, KnowledgeBase};
use crate::label::{MentionType, PredictionSource, COREFERENCE_PRONOUNS};
use crate::span::Span;
use std::collections::{BTreeSet, HashSet};

/// Whitelist type id for geographic locations.
pub const TYPE_LOCATION: &str = "Q27096213";
/// Whitelist type id for persons.
pub const TYPE_PERSON: &str = "Q215627";
/// Whitelist type id for ethnic groups.
pub const TYPE_ETHNIC_GROUP: &str = "Q41710";
/// Whitelist type id for languoids (languages and dialects).
pub const TYPE_LANGUOID: &str = "Q17376908";

/// Assigns diagnostic error labels to classified cases.
pub struct ErrorLabeler<'a, K: KnowledgeBase + ?Sized> {
    kb: &'a K,
    hyperlinks: &'a HashSet<Span>,
    /// False when the benchmark is known not to contain "unknown" labels,
    /// which changes how non-overlapping false detections are subtyped.
    benchmark_has_unknowns: bool,
    /// Session-level gate for candidate bookkeeping; true once any case in
    /// the evaluation run carried more than one candidate.
    has_candidates: bool,
}

/// Ground-truth facts needed for overlap checks, gathered up front so the
/// per-case loop can borrow the case list immutably.
struct GtSpan {
    index: usize,
    span: Span,
    entity_id: String,
    known: bool,
    is_quantity: bool,
    is_datetime: bool,
}

impl<'a, K: KnowledgeBase + ?Sized> ErrorLabeler<'a, K> {
    /// Create a labeler for one article.
    #[must_use]
    pub fn new(
        kb: &'a K,
        hyperlinks: &'a HashSet<Span>,
        benchmark_has_unknowns: bool,
        has_candidates: bool,
    ) -> Self {
        Self {
            kb,
            hyperlinks,
            benchmark_has_unknowns,
            has_candidates,
        }
    }

    /// Label every case for one evaluation mode.
    pub fn label_cases(&self, cases: &mut [Case], mode: EvalMode) {
        let gt_spans: Vec<GtSpan> = cases
            .iter()
            .enumerate()
            .filter_map(|(index, c)| {
                let gt = c.ground_truth.as_ref()?;
                Some(GtSpan {
                    index,
                    span: c.span,
                    entity_id: gt.entity_id.clone(),
                    known: gt.is_known(),
                    is_quantity: gt.is_quantity(),
                    is_datetime: gt.is_datetime(),
                })
            })
            .collect();

        let fp_spans: Vec<(usize, Span)> = cases
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.has_prediction()
                    && !c.is_coreference()
                    && c.ner_eval_types[mode].contains(EvalType::FP)
            })
            .map(|(index, c)| (index, c.span))
            .collect();

        let mut assigned: Vec<BTreeSet<ErrorLabel>> = Vec::with_capacity(cases.len());
        for index in 0..cases.len() {
            assigned.push(self.labels_for_case(cases, index, mode, &gt_spans, &fp_spans));
        }
        for (case, labels) in cases.iter_mut().zip(assigned) {
            case.error_labels[mode].extend(labels);
        }
    }

    fn labels_for_case(
        &self,
        cases: &[Case],
        index: usize,
        mode: EvalMode,
        gt_spans: &[GtSpan],
        fp_spans: &[(usize, Span)],
    ) -> BTreeSet<ErrorLabel> {
        let case = &cases[index];
        let mut labels = BTreeSet::new();

        let linking = case.linking_eval_types[mode];
        let ner = case.ner_eval_types[mode];
        let linking_tp = linking.contains(EvalType::TP);
        let disambiguation_error =
            linking.contains(EvalType::FN) && linking.contains(EvalType::FP);
        let coreference = case.is_true_coreference
            || case
                .prediction
                .as_ref()
                .is_some_and(|p| p.source == PredictionSource::Coreference);

        let wrong_span = linking.contains(EvalType::FP) && self.is_wrong_span(case, index, gt_spans);
        if wrong_span {
            labels.insert(ErrorLabel::WrongSpan);
        }

        if !coreference {
            if ner.contains(EvalType::FN) && !case.has_prediction() {
                self.label_undetected(case, index, fp_spans, &mut labels);
            }
            if linking_tp && case.has_ground_truth() {
                self.label_correct_link(case, &mut labels);
            }
            if disambiguation_error
                && !wrong_span
                && case.has_ground_truth()
                && case.prediction.as_ref().is_some_and(CasePrediction::is_known)
            {
                self.label_disambiguation_error(case, &mut labels);
            }
            if ner.contains(EvalType::FP) && case.has_prediction() {
                self.label_false_detection(case, index, gt_spans, &mut labels);
            }
        }

        if self.hyperlinks.contains(&case.span) {
            if linking_tp && !linking.contains(EvalType::FN) {
                labels.insert(ErrorLabel::HyperlinkCorrect);
            } else if linking.contains(EvalType::FN) || linking.contains(EvalType::FP) {
                labels.insert(ErrorLabel::HyperlinkWrong);
            }
        }

        // Coreference diagnostics.
        if !case.has_ground_truth()
            && case.has_prediction()
            && ner.contains(EvalType::FP)
            && COREFERENCE_PRONOUNS.contains(case.text.trim().to_lowercase().as_str())
        {
            labels.insert(ErrorLabel::CoreferenceFalseDetection);
        }
        if case.is_true_coreference {
            if ner.contains(EvalType::FN) && !case.has_prediction() {
                labels.insert(ErrorLabel::CoreferenceUndetected);
            }
            if disambiguation_error && case.has_prediction() {
                labels.insert(self.coreference_error(cases, index));
            }
        }

        labels
    }

    // --- Undetected (NER FN, non-coreference) ---

    fn label_undetected(
        &self,
        case: &Case,
        index: usize,
        fp_spans: &[(usize, Span)],
        labels: &mut BTreeSet<ErrorLabel>,
    ) {
        labels.insert(ErrorLabel::Undetected);
        let others = fp_spans.iter().filter(|(i, _)| *i != index);
        let subtype = if !has_uppercase_word(&case.text) {
            ErrorLabel::UndetectedLowercase
        } else if fp_spans
            .iter()
            .any(|(i, s)| *i != index && case.span.strictly_contains(s))
        {
            ErrorLabel::UndetectedPartiallyIncluded
        } else if others.clone().any(|(_, s)| s.overlaps(&case.span)) {
            ErrorLabel::UndetectedPartialOverlap
        } else {
            ErrorLabel::UndetectedOther
        };
        labels.insert(subtype);
    }

    // --- Correct links (linking TP, non-coreference) ---

    fn label_correct_link(&self, case: &Case, labels: &mut BTreeSet<ErrorLabel>) {
        let Some(gold) = case.gold_entity() else {
            return;
        };
        if self.is_demonym_mention(case, gold) {
            labels.insert(ErrorLabel::DisambiguationDemonymCorrect);
        } else if self.is_metonymy(case, gold) {
            labels.insert(ErrorLabel::DisambiguationMetonymyCorrect);
        } else if self.is_partial_name(case, gold) {
            labels.insert(ErrorLabel::DisambiguationPartialNameCorrect);
        } else if self.is_rare_case(case, gold) {
            labels.insert(ErrorLabel::DisambiguationRareCorrect);
        }

        if self.has_candidates && self.gold_among_multiple_candidates(case, gold) {
            labels.insert(ErrorLabel::DisambiguationMultiCandidatesCorrect);
        }
    }

    // --- Disambiguation errors (linking FN+FP, non-coreference) ---

    fn label_disambiguation_error(&self, case: &Case, labels: &mut BTreeSet<ErrorLabel>) {
        let Some(gold) = case.gold_entity() else {
            return;
        };
        labels.insert(ErrorLabel::DisambiguationWrong);

        let subtype = if self.is_demonym_mention(case, gold) {
            ErrorLabel::DisambiguationDemonymWrong
        } else if self.is_metonymy_error(case, gold) {
            ErrorLabel::DisambiguationMetonymyWrong
        } else if self.is_partial_name(case, gold) {
            ErrorLabel::DisambiguationPartialNameWrong
        } else if self.is_rare_case(case, gold) {
            ErrorLabel::DisambiguationRareWrong
        } else {
            ErrorLabel::DisambiguationWrongOther
        };
        labels.insert(subtype);

        if self.has_candidates {
            if let Some(candidates) = case.prediction.as_ref().map(|p| &p.candidates) {
                if !candidates.contains(gold) {
                    labels.insert(ErrorLabel::DisambiguationWrongCandidates);
                } else if candidates.len() > 1 {
                    labels.insert(ErrorLabel::DisambiguationMultiCandidatesWrong);
                }
            }
        }
    }

    // --- False detections (NER FP, non-coreference) ---

    fn label_false_detection(
        &self,
        case: &Case,
        index: usize,
        gt_spans: &[GtSpan],
        labels: &mut BTreeSet<ErrorLabel>,
    ) {
        labels.insert(ErrorLabel::FalseDetection);
        let overlapping: Vec<&GtSpan> = gt_spans
            .iter()
            .filter(|g| g.index != index && g.span.overlaps(&case.span))
            .collect();
        let overlaps_unknown = overlapping.iter().any(|g| !g.known);

        let subtype = if overlapping.is_empty() && !has_uppercase_word(&case.text) {
            ErrorLabel::FalseDetectionLowercased
        } else if overlaps_unknown || (overlapping.is_empty() && !self.benchmark_has_unknowns) {
            ErrorLabel::FalseDetectionGroundtruthUnknown
        } else {
            ErrorLabel::FalseDetectionOther
        };
        labels.insert(subtype);
    }

    // --- Span boundaries ---

    /// The predicted entity is right but the boundaries are not: the span
    /// overlaps (without equaling) a ground-truth span holding the same
    /// entity (or a matching quantity/datetime).
    fn is_wrong_span(&self, case: &Case, index: usize, gt_spans: &[GtSpan]) -> bool {
        let Some(pred) = case.prediction.as_ref() else {
            return false;
        };
        gt_spans.iter().any(|g| {
            g.index != index
                && g.span.overlaps(&case.span)
                && g.span != case.span
                && gt_matches_prediction(g, pred)
        })
    }

    // --- Coreference ---

    /// Backward scan for the intended antecedent: the nearest prior named
    /// mention of this case's gold entity.
    fn coreference_error(&self, cases: &[Case], index: usize) -> ErrorLabel {
        let case = &cases[index];
        let gold = case.gold_entity();
        let predicted = case.predicted_entity();

        for prior in cases[..index].iter().rev() {
            if prior.mention_type != MentionType::EntityNamed {
                continue;
            }
            if prior.gold_entity().is_none() || prior.gold_entity() != gold {
                continue;
            }
            // Right mention referenced, but that mention was itself wrongly
            // disambiguated to the entity the resolver then propagated.
            return if prior.predicted_entity().is_some() && prior.predicted_entity() == predicted
            {
                ErrorLabel::CoreferenceReferenceWronglyDisambiguated
            } else {
                ErrorLabel::CoreferenceWrongMentionReferenced
            };
        }
        ErrorLabel::CoreferenceWrongMentionReferenced
    }

    // --- Knowledge-base predicates ---

    fn gold_types(&self, gold: &str) -> Vec<String> {
        self.kb.entity_types(gold)
    }

    fn is_demonym_mention(&self, case: &Case, gold: &str) -> bool {
        self.kb.is_demonym(case.text.trim())
            && self.gold_types(gold).iter().any(|t| {
                t == TYPE_LOCATION || t == TYPE_ETHNIC_GROUP || t == TYPE_LANGUOID
            })
    }

    fn is_metonymy(&self, case: &Case, gold: &str) -> bool {
        let gold_types = self.gold_types(gold);
        let excluded = gold_types
            .iter()
            .any(|t| t == TYPE_LOCATION || t == TYPE_PERSON || t == TYPE_ETHNIC_GROUP);
        if excluded {
            return false;
        }
        most_popular_candidate(self.kb, case.text.trim())
            .is_some_and(|top| self.kb.entity_types(&top).iter().any(|t| t == TYPE_LOCATION))
    }

    fn is_metonymy_error(&self, case: &Case, gold: &str) -> bool {
        self.is_metonymy(case, gold)
            && case.predicted_entity().is_some_and(|p| {
                self.kb.entity_types(p).iter().any(|t| t == TYPE_LOCATION)
            })
    }

    fn is_partial_name(&self, case: &Case, gold: &str) -> bool {
        let Some(name) = self.kb.entity_name(gold) else {
            return false;
        };
        let text = case.text.trim();
        name.contains(' ') && name.len() > text.len() && name.contains(text)
    }

    fn is_rare_case(&self, case: &Case, gold: &str) -> bool {
        match most_popular_candidate(self.kb, case.text.trim()) {
            Some(top) => top != gold,
            None => false,
        }
    }

    fn gold_among_multiple_candidates(&self, case: &Case, gold: &str) -> bool {
        case.prediction
            .as_ref()
            .is_some_and(|p| p.candidates.len() > 1 && p.candidates.contains(gold))
    }
}

/// True if any whitespace-separated word starts with an uppercase letter.
fn has_uppercase_word(text: &str) -> bool {
    text.split_whitespace()
        .any(|w| w.chars().next().is_some_and(char::is_uppercase))
}

fn gt_matches_prediction(gt: &GtSpan, pred: &CasePrediction) -> bool {
    if gt.is_quantity {
        return pred.is_quantity;
    }
    if gt.is_datetime {
        return pred.is_datetime;
    }
    pred.entity_id.as_deref() == Some(gt.entity_id.as_str())
}
