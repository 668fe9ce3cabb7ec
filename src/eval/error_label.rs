//! Closed taxonomy of diagnostic error labels.
//!
//! Every classified case receives zero or more labels per evaluation mode.
//! The taxonomy is a closed enum so every branch of the labeling pass is
//! compiler-checked; exhaustive matches below keep the report structure in
//! sync with the labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fine-grained, human-readable error (and correctness) classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLabel {
    // --- NER false negatives (non-coreference) ---
    /// Ground-truth mention the system did not detect.
    Undetected,
    /// Undetected and not a named entity by capitalization.
    UndetectedLowercase,
    /// Undetected; some false-positive span is a strict subspan of it.
    UndetectedPartiallyIncluded,
    /// Undetected; overlaps a false-positive span without subspan nesting.
    UndetectedPartialOverlap,
    /// Undetected for none of the above reasons.
    UndetectedOther,

    // --- Correct links (linking TP, non-coreference) ---
    /// Correctly linked demonym.
    DisambiguationDemonymCorrect,
    /// Correctly linked metonymic mention.
    DisambiguationMetonymyCorrect,
    /// Correctly linked partial name.
    DisambiguationPartialNameCorrect,
    /// Correctly linked although the gold entity is not the most popular
    /// candidate for the surface form.
    DisambiguationRareCorrect,

    // --- Disambiguation errors (linking FN+FP, non-coreference) ---
    /// Detected but linked to the wrong entity.
    DisambiguationWrong,
    /// Wrongly disambiguated demonym.
    DisambiguationDemonymWrong,
    /// Location entity chosen for a metonymic mention.
    DisambiguationMetonymyWrong,
    /// Wrongly disambiguated partial name.
    DisambiguationPartialNameWrong,
    /// Most popular candidate chosen over the rarer gold entity.
    DisambiguationRareWrong,
    /// Wrong disambiguation for none of the above reasons.
    DisambiguationWrongOther,
    /// The gold entity is not in the candidate set at all.
    DisambiguationWrongCandidates,
    /// Correct despite multiple candidates containing the gold entity.
    DisambiguationMultiCandidatesCorrect,
    /// Wrong although the candidate set contained the gold entity.
    DisambiguationMultiCandidatesWrong,

    // --- NER false positives (non-coreference) ---
    /// Predicted mention with no counterpart in the ground truth.
    FalseDetection,
    /// False detection of an all-lowercase mention.
    FalseDetectionLowercased,
    /// False detection overlapping unknown or absent ground truth.
    FalseDetectionGroundtruthUnknown,
    /// False detection for none of the above reasons.
    FalseDetectionOther,

    // --- Span boundary ---
    /// Right entity, wrong span boundaries.
    WrongSpan,

    // --- Hyperlinks ---
    /// The mention coincides with a source hyperlink and is correctly linked.
    HyperlinkCorrect,
    /// The mention coincides with a source hyperlink and is wrongly linked.
    HyperlinkWrong,

    // --- Coreference ---
    /// A bare non-entity pronoun predicted as a mention.
    CoreferenceFalseDetection,
    /// Coreference mention the system did not detect.
    CoreferenceUndetected,
    /// Right antecedent mention, but that mention was itself wrongly
    /// disambiguated.
    CoreferenceReferenceWronglyDisambiguated,
    /// The resolver referenced the wrong antecedent mention.
    CoreferenceWrongMentionReferenced,
}

impl ErrorLabel {
    /// All labels, in taxonomy order (used to render the report).
    pub const ALL: [ErrorLabel; 29] = [
        ErrorLabel::Undetected,
        ErrorLabel::UndetectedLowercase,
        ErrorLabel::UndetectedPartiallyIncluded,
        ErrorLabel::UndetectedPartialOverlap,
        ErrorLabel::UndetectedOther,
        ErrorLabel::DisambiguationDemonymCorrect,
        ErrorLabel::DisambiguationMetonymyCorrect,
        ErrorLabel::DisambiguationPartialNameCorrect,
        ErrorLabel::DisambiguationRareCorrect,
        ErrorLabel::DisambiguationWrong,
        ErrorLabel::DisambiguationDemonymWrong,
        ErrorLabel::DisambiguationMetonymyWrong,
        ErrorLabel::DisambiguationPartialNameWrong,
        ErrorLabel::DisambiguationRareWrong,
        ErrorLabel::DisambiguationWrongOther,
        ErrorLabel::DisambiguationWrongCandidates,
        ErrorLabel::DisambiguationMultiCandidatesCorrect,
        ErrorLabel::DisambiguationMultiCandidatesWrong,
        ErrorLabel::FalseDetection,
        ErrorLabel::FalseDetectionLowercased,
        ErrorLabel::FalseDetectionGroundtruthUnknown,
        ErrorLabel::FalseDetectionOther,
        ErrorLabel::WrongSpan,
        ErrorLabel::HyperlinkCorrect,
        ErrorLabel::HyperlinkWrong,
        ErrorLabel::CoreferenceFalseDetection,
        ErrorLabel::CoreferenceUndetected,
        ErrorLabel::CoreferenceReferenceWronglyDisambiguated,
        ErrorLabel::CoreferenceWrongMentionReferenced,
    ];

    /// Stable snake_case key for reports.
    #[must_use]
    pub fn as_key(&self) -> &'static str {
        match self {
            ErrorLabel::Undetected => "undetected",
            ErrorLabel::UndetectedLowercase => "undetected_lowercase",
            ErrorLabel::UndetectedPartiallyIncluded => "undetected_partially_included",
            ErrorLabel::UndetectedPartialOverlap => "undetected_partial_overlap",
            ErrorLabel::UndetectedOther => "undetected_other",
            ErrorLabel::DisambiguationDemonymCorrect => "disambiguation_demonym_correct",
            ErrorLabel::DisambiguationMetonymyCorrect => "disambiguation_metonymy_correct",
            ErrorLabel::DisambiguationPartialNameCorrect => "disambiguation_partial_name_correct",
            ErrorLabel::DisambiguationRareCorrect => "disambiguation_rare_correct",
            ErrorLabel::DisambiguationWrong => "disambiguation_wrong",
            ErrorLabel::DisambiguationDemonymWrong => "disambiguation_demonym_wrong",
            ErrorLabel::DisambiguationMetonymyWrong => "disambiguation_metonymy_wrong",
            ErrorLabel::DisambiguationPartialNameWrong => "disambiguation_partial_name_wrong",
            ErrorLabel::DisambiguationRareWrong => "disambiguation_rare_wrong",
            ErrorLabel::DisambiguationWrongOther => "disambiguation_wrong_other",
            ErrorLabel::DisambiguationWrongCandidates => "disambiguation_wrong_candidates",
            ErrorLabel::DisambiguationMultiCandidatesCorrect => {
                "disambiguation_multi_candidates_correct"
            }
            ErrorLabel::DisambiguationMultiCandidatesWrong => {
                "disambiguation_multi_candidates_wrong"
            }
            ErrorLabel::FalseDetection => "false_detection",
            ErrorLabel::FalseDetectionLowercased => "false_detection_lowercased",
            ErrorLabel::FalseDetectionGroundtruthUnknown => "false_detection_groundtruth_unknown",
            ErrorLabel::FalseDetectionOther => "false_detection_other",
            ErrorLabel::WrongSpan => "wrong_span",
            ErrorLabel::HyperlinkCorrect => "hyperlink_correct",
            ErrorLabel::HyperlinkWrong => "hyperlink_wrong",
            ErrorLabel::CoreferenceFalseDetection => "coreference_false_detection",
            ErrorLabel::CoreferenceUndetected => "coreference_undetected",
            ErrorLabel::CoreferenceReferenceWronglyDisambiguated => {
                "coreference_reference_wrongly_disambiguated"
            }
            ErrorLabel::CoreferenceWrongMentionReferenced => {
                "coreference_wrong_mention_referenced"
            }
        }
    }
}

impl fmt::Display for ErrorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_labels_unique() {
        let keys: HashSet<&str> = ErrorLabel::ALL.iter().map(ErrorLabel::as_key).collect();
        assert_eq!(keys.len(), ErrorLabel::ALL.len());
        assert_eq!(keys.len(), 29);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ErrorLabel::UndetectedLowercase).unwrap();
        assert_eq!(json, r#""UNDETECTED_LOWERCASE""#);
    }
}
