//! Result aggregation and reporting.
//!
//! [`ResultAggregator`] folds classified, labeled cases into per-mode
//! counters and renders them as an [`EvalReport`] with precision, recall,
//! and F1 per mention category, per whitelist type, and an error breakdown
//! as `{errors, total}` pairs. Aggregators from disjoint article sets can
//! be [`merge`](ResultAggregator::merge)d, so evaluation can be sharded and
//! combined without shared state.

use crate::eval::cases::Case;
use crate::eval::error_label::ErrorLabel;
use crate::eval::modes::{EvalMode, EvalType, EvalTypeSet, PerMode};
use crate::label::MentionType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

// ============================================================================
// Counters
// ============================================================================

/// TP/FP/FN tallies for one mention category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCounts {
    /// Correctly produced results.
    pub true_positives: u32,
    /// Spurious results with no matching ground truth.
    pub false_positives: u32,
    /// Ground-truth mentions the system missed.
    pub false_negatives: u32,
}

impl EvalCounts {
    /// Number of ground-truth mentions in this category.
    #[must_use]
    pub fn ground_truth(&self) -> u32 {
        self.true_positives + self.false_negatives
    }

    /// Fold one judgement in, weighted by the case factor.
    pub fn add(&mut self, types: EvalTypeSet, factor: u32) {
        for eval_type in types.iter() {
            match eval_type {
                EvalType::TP => self.true_positives += factor,
                EvalType::FP => self.false_positives += factor,
                EvalType::FN => self.false_negatives += factor,
            }
        }
    }

    /// Add another tally into this one.
    pub fn merge(&mut self, other: &EvalCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.ground_truth())
    }

    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

/// All counters for one evaluation mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeCounts {
    /// Linking judgements over every mention.
    pub all: EvalCounts,
    /// Span-only detection judgements.
    pub ner: EvalCounts,
    /// Named + other entity mentions.
    pub entity: EvalCounts,
    pub entity_named: EvalCounts,
    pub entity_other: EvalCounts,
    /// Nominal + pronominal mentions.
    pub coref: EvalCounts,
    pub coref_nominal: EvalCounts,
    pub coref_pronominal: EvalCounts,
    /// Linking judgements keyed by whitelist type id.
    pub by_type: BTreeMap<String, EvalCounts>,
    /// Factor-weighted tallies per diagnostic label.
    pub error_labels: BTreeMap<ErrorLabel, u32>,
    /// Ground-truth mentions without an uppercase character.
    pub lowercase_mentions: u32,
    /// Ground-truth mentions whose surface text contains a space.
    pub mentions_with_space: u32,
}

impl ModeCounts {
    fn add_case(&mut self, case: &Case, mode: EvalMode) {
        let factor = case.factor;
        let linking = case.linking_eval_types[mode];
        let ner = case.ner_eval_types[mode];

        self.all.add(linking, factor);
        self.ner.add(ner, factor);

        let category = match case.mention_type {
            MentionType::EntityNamed => &mut self.entity_named,
            MentionType::EntityOther => &mut self.entity_other,
            MentionType::Nominal => &mut self.coref_nominal,
            MentionType::Pronominal => &mut self.coref_pronominal,
        };
        category.add(linking, factor);
        if case.mention_type.is_coreference() {
            self.coref.add(linking, factor);
        } else {
            self.entity.add(linking, factor);
        }

        if let Some(gt) = &case.ground_truth {
            for type_id in gt.entity_type.split('|').filter(|t| !t.is_empty()) {
                self.by_type
                    .entry(type_id.to_string())
                    .or_default()
                    .add(linking, factor);
            }
            if case.is_lowercase() {
                self.lowercase_mentions += factor;
            }
            if case.text.contains(' ') {
                self.mentions_with_space += factor;
            }
        }

        for label in &case.error_labels[mode] {
            *self.error_labels.entry(*label).or_insert(0) += factor;
        }
    }

    fn merge(&mut self, other: &ModeCounts) {
        self.all.merge(&other.all);
        self.ner.merge(&other.ner);
        self.entity.merge(&other.entity);
        self.entity_named.merge(&other.entity_named);
        self.entity_other.merge(&other.entity_other);
        self.coref.merge(&other.coref);
        self.coref_nominal.merge(&other.coref_nominal);
        self.coref_pronominal.merge(&other.coref_pronominal);
        for (type_id, counts) in &other.by_type {
            self.by_type
                .entry(type_id.clone())
                .or_default()
                .merge(counts);
        }
        for (label, count) in &other.error_labels {
            *self.error_labels.entry(*label).or_insert(0) += count;
        }
        self.lowercase_mentions += other.lowercase_mentions;
        self.mentions_with_space += other.mentions_with_space;
    }

    fn label_count(&self, label: ErrorLabel) -> u32 {
        self.error_labels.get(&label).copied().unwrap_or(0)
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Accumulates cases across articles into per-mode counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultAggregator {
    pub per_mode: PerMode<ModeCounts>,
    /// Number of articles folded in.
    pub articles: u32,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one case into every mode's counters.
    pub fn add_case(&mut self, case: &Case) {
        for mode in EvalMode::ALL {
            self.per_mode[mode].add_case(case, mode);
        }
    }

    /// Fold a whole article's cases in.
    pub fn add_article(&mut self, cases: &[Case]) {
        for case in cases {
            self.add_case(case);
        }
        self.articles += 1;
    }

    /// Combine a partial aggregate from another article shard.
    pub fn merge(&mut self, other: &ResultAggregator) {
        for mode in EvalMode::ALL {
            self.per_mode[mode].merge(&other.per_mode[mode]);
        }
        self.articles += other.articles;
    }

    /// Render the final report.
    #[must_use]
    pub fn report(&self) -> EvalReport {
        let mut per_mode = PerMode::<ModeReport>::default();
        for mode in EvalMode::ALL {
            per_mode[mode] = ModeReport::from_counts(&self.per_mode[mode]);
        }
        EvalReport {
            articles: self.articles,
            per_mode,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Precision/recall/F1 plus the underlying tallies for one category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// TP / (TP + FP); 0.0 when no results were produced.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when there is no ground truth.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Correctly produced results.
    pub true_positives: u32,
    /// Spurious results with no matching ground truth.
    pub false_positives: u32,
    /// Ground-truth mentions the system missed.
    pub false_negatives: u32,
    /// Total ground-truth mentions (TP + FN).
    pub ground_truth: u32,
}

impl Metrics {
    fn from_counts(counts: &EvalCounts) -> Self {
        Self {
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            true_positives: counts.true_positives,
            false_positives: counts.false_positives,
            false_negatives: counts.false_negatives,
            ground_truth: counts.ground_truth(),
        }
    }
}

/// An error count over its reference population.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ErrorFraction {
    pub errors: u32,
    pub total: u32,
}

impl ErrorFraction {
    fn new(errors: u32, total: u32) -> Self {
        Self { errors, total }
    }
}

/// Error breakdown mirroring the diagnostic taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    pub undetected: ErrorFraction,
    pub undetected_lowercase: ErrorFraction,
    pub undetected_partially_included: ErrorFraction,
    pub undetected_partial_overlap: ErrorFraction,
    pub undetected_other: ErrorFraction,
    pub false_detection: ErrorFraction,
    pub false_detection_lowercased: ErrorFraction,
    pub false_detection_groundtruth_unknown: ErrorFraction,
    pub false_detection_other: ErrorFraction,
    pub wrong_span: ErrorFraction,
    pub disambiguation_wrong: ErrorFraction,
    pub disambiguation_demonym: ErrorFraction,
    pub disambiguation_metonymy: ErrorFraction,
    pub disambiguation_partial_name: ErrorFraction,
    pub disambiguation_rare: ErrorFraction,
    pub disambiguation_wrong_other: ErrorFraction,
    pub disambiguation_wrong_candidates: ErrorFraction,
    pub disambiguation_multi_candidates: ErrorFraction,
    pub hyperlink: ErrorFraction,
    pub coreference_false_detection: ErrorFraction,
    pub coreference_undetected: ErrorFraction,
    pub coreference_reference_wrongly_disambiguated: ErrorFraction,
    pub coreference_wrong_mention_referenced: ErrorFraction,
}

/// Per-mode slice of the final report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeReport {
    pub all: Metrics,
    pub ner: Metrics,
    pub entity: Metrics,
    pub entity_named: Metrics,
    pub entity_other: Metrics,
    pub coref: Metrics,
    pub coref_nominal: Metrics,
    pub coref_pronominal: Metrics,
    pub by_type: BTreeMap<String, Metrics>,
    pub errors: ErrorBreakdown,
}

impl ModeReport {
    fn from_counts(counts: &ModeCounts) -> Self {
        Self {
            all: Metrics::from_counts(&counts.all),
            ner: Metrics::from_counts(&counts.ner),
            entity: Metrics::from_counts(&counts.entity),
            entity_named: Metrics::from_counts(&counts.entity_named),
            entity_other: Metrics::from_counts(&counts.entity_other),
            coref: Metrics::from_counts(&counts.coref),
            coref_nominal: Metrics::from_counts(&counts.coref_nominal),
            coref_pronominal: Metrics::from_counts(&counts.coref_pronominal),
            by_type: counts
                .by_type
                .iter()
                .map(|(k, v)| (k.clone(), Metrics::from_counts(v)))
                .collect(),
            errors: Self::error_breakdown(counts),
        }
    }

    fn error_breakdown(c: &ModeCounts) -> ErrorBreakdown {
        let undetected = c.label_count(ErrorLabel::Undetected);
        let false_detection = c.label_count(ErrorLabel::FalseDetection);
        let disambiguation_wrong = c.label_count(ErrorLabel::DisambiguationWrong);
        let detected_gt = c.ner.true_positives + c.ner.false_negatives;
        let detected_sys = c.ner.true_positives + c.ner.false_positives;
        let linked = c.all.true_positives + disambiguation_wrong;
        let hyperlink_correct = c.label_count(ErrorLabel::HyperlinkCorrect);
        let hyperlink_wrong = c.label_count(ErrorLabel::HyperlinkWrong);
        let coref_gt = c.coref.ground_truth();

        ErrorBreakdown {
            undetected: ErrorFraction::new(undetected, detected_gt),
            undetected_lowercase: ErrorFraction::new(
                c.label_count(ErrorLabel::UndetectedLowercase),
                c.lowercase_mentions,
            ),
            undetected_partially_included: ErrorFraction::new(
                c.label_count(ErrorLabel::UndetectedPartiallyIncluded),
                undetected,
            ),
            undetected_partial_overlap: ErrorFraction::new(
                c.label_count(ErrorLabel::UndetectedPartialOverlap),
                undetected,
            ),
            undetected_other: ErrorFraction::new(
                c.label_count(ErrorLabel::UndetectedOther),
                undetected,
            ),
            false_detection: ErrorFraction::new(false_detection, detected_sys),
            false_detection_lowercased: ErrorFraction::new(
                c.label_count(ErrorLabel::FalseDetectionLowercased),
                false_detection,
            ),
            false_detection_groundtruth_unknown: ErrorFraction::new(
                c.label_count(ErrorLabel::FalseDetectionGroundtruthUnknown),
                false_detection,
            ),
            false_detection_other: ErrorFraction::new(
                c.label_count(ErrorLabel::FalseDetectionOther),
                false_detection,
            ),
            wrong_span: ErrorFraction::new(
                c.label_count(ErrorLabel::WrongSpan),
                c.mentions_with_space,
            ),
            disambiguation_wrong: ErrorFraction::new(disambiguation_wrong, linked),
            disambiguation_demonym: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationDemonymWrong),
                c.label_count(ErrorLabel::DisambiguationDemonymWrong)
                    + c.label_count(ErrorLabel::DisambiguationDemonymCorrect),
            ),
            disambiguation_metonymy: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationMetonymyWrong),
                c.label_count(ErrorLabel::DisambiguationMetonymyWrong)
                    + c.label_count(ErrorLabel::DisambiguationMetonymyCorrect),
            ),
            disambiguation_partial_name: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationPartialNameWrong),
                c.label_count(ErrorLabel::DisambiguationPartialNameWrong)
                    + c.label_count(ErrorLabel::DisambiguationPartialNameCorrect),
            ),
            disambiguation_rare: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationRareWrong),
                c.label_count(ErrorLabel::DisambiguationRareWrong)
                    + c.label_count(ErrorLabel::DisambiguationRareCorrect),
            ),
            disambiguation_wrong_other: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationWrongOther),
                disambiguation_wrong,
            ),
            disambiguation_wrong_candidates: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationWrongCandidates),
                disambiguation_wrong,
            ),
            disambiguation_multi_candidates: ErrorFraction::new(
                c.label_count(ErrorLabel::DisambiguationMultiCandidatesWrong),
                c.label_count(ErrorLabel::DisambiguationMultiCandidatesWrong)
                    + c.label_count(ErrorLabel::DisambiguationMultiCandidatesCorrect),
            ),
            hyperlink: ErrorFraction::new(hyperlink_wrong, hyperlink_correct + hyperlink_wrong),
            coreference_false_detection: ErrorFraction::new(
                c.label_count(ErrorLabel::CoreferenceFalseDetection),
                detected_sys,
            ),
            coreference_undetected: ErrorFraction::new(
                c.label_count(ErrorLabel::CoreferenceUndetected),
                coref_gt,
            ),
            coreference_reference_wrongly_disambiguated: ErrorFraction::new(
                c.label_count(ErrorLabel::CoreferenceReferenceWronglyDisambiguated),
                coref_gt,
            ),
            coreference_wrong_mention_referenced: ErrorFraction::new(
                c.label_count(ErrorLabel::CoreferenceWrongMentionReferenced),
                coref_gt,
            ),
        }
    }
}

/// Final cross-article evaluation report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalReport {
    pub articles: u32,
    pub per_mode: PerMode<ModeReport>,
}

impl EvalReport {
    /// Format the headline metrics as a markdown table, one row per
    /// category and mode.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::from(
            "| Mode | Category | Precision | Recall | F1 | GT |\n\
             |------|----------|-----------|--------|----|----|\n",
        );
        for mode in EvalMode::ALL {
            let report = &self.per_mode[mode];
            for (name, metrics) in [
                ("all", &report.all),
                ("ner", &report.ner),
                ("entity", &report.entity),
                ("entity_named", &report.entity_named),
                ("entity_other", &report.entity_other),
                ("coref", &report.coref),
                ("coref_nominal", &report.coref_nominal),
                ("coref_pronominal", &report.coref_pronominal),
            ] {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.1}% | {:.1}% | {:.1}% | {} |",
                    mode,
                    name,
                    metrics.precision * 100.0,
                    metrics.recall * 100.0,
                    metrics.f1 * 100.0,
                    metrics.ground_truth,
                );
            }
        }
        out
    }
}
