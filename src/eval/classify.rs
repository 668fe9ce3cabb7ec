//! Case classification under the three evaluation modes.
//!
//! Two questions are judged separately for every case:
//!
//! - **linking**: did the system link this mention to the right entity?
//! - **NER**: did the system detect this span at all (entity identity
//!   ignored)?
//!
//! Both produce a (possibly empty) set of {TP, FP, FN} per mode. A wrongly
//! linked but detected mention is simultaneously a false negative (the right
//! entity was not produced) and a false positive (a wrong one was), hence
//! `{FN, FP}` rather than a single judgement.
//!
//! Factor-0 cases are not independently counted; their judgement is derived
//! from their descendants so a parent mention never double-counts a child
//! that already explains the same stretch of text.

use crate::eval::cases::Case;
use crate::eval::modes::{EvalMode, EvalType, EvalTypeSet};

/// Fill in the per-mode linking and NER judgements of a case.
pub fn classify_case(case: &mut Case) {
    for mode in EvalMode::ALL {
        case.linking_eval_types[mode] = linking_types(case, mode);
        case.ner_eval_types[mode] = ner_types(case, mode);
    }
}

fn tp() -> EvalTypeSet {
    EvalTypeSet::of(&[EvalType::TP])
}

fn fp() -> EvalTypeSet {
    EvalTypeSet::of(&[EvalType::FP])
}

fn fn_() -> EvalTypeSet {
    EvalTypeSet::of(&[EvalType::FN])
}

fn fn_fp() -> EvalTypeSet {
    EvalTypeSet::of(&[EvalType::FN, EvalType::FP])
}

/// Judgement inherited from descendants for a factor-0 case.
fn inherited(correct: Option<bool>, has_children: bool) -> EvalTypeSet {
    if !has_children {
        return EvalTypeSet::EMPTY;
    }
    match correct {
        Some(true) => tp(),
        Some(false) => fn_(),
        None => EvalTypeSet::EMPTY,
    }
}

/// The linking question: right entity?
#[must_use]
pub fn linking_types(case: &Case, mode: EvalMode) -> EvalTypeSet {
    if case.factor == 0 {
        let has_children = case
            .ground_truth
            .as_ref()
            .is_some_and(|gt| gt.has_children);
        return inherited(case.children_correctly_linked, has_children);
    }

    match (case.ground_truth.as_ref(), case.prediction.as_ref()) {
        // Hallucinated mention. A NIL prediction asserts nothing, so it is
        // forgiven outside Required scoring.
        (None, Some(pred)) => {
            if !pred.is_known() && matches!(mode, EvalMode::Ignored | EvalMode::Optional) {
                EvalTypeSet::EMPTY
            } else {
                fp()
            }
        }

        // Undetected mention.
        (Some(gt), None) => {
            if case.is_optional {
                match mode {
                    EvalMode::Ignored | EvalMode::Optional => EvalTypeSet::EMPTY,
                    EvalMode::Required => fn_(),
                }
            } else if mode == EvalMode::Ignored && !gt.is_known() {
                EvalTypeSet::EMPTY
            } else {
                fn_()
            }
        }

        // Detected mention.
        (Some(gt), Some(pred)) => {
            if case.is_optional {
                if pred.is_known() {
                    match mode {
                        EvalMode::Ignored => fp(),
                        EvalMode::Optional | EvalMode::Required => {
                            if case.entities_match() {
                                if mode == EvalMode::Required {
                                    tp()
                                } else {
                                    EvalTypeSet::EMPTY
                                }
                            } else {
                                fn_fp()
                            }
                        }
                    }
                } else {
                    match (mode, gt.is_known()) {
                        (EvalMode::Ignored, false) => EvalTypeSet::EMPTY,
                        (EvalMode::Ignored, true) => fn_fp(),
                        (_, false) => tp(),
                        (_, true) => fn_fp(),
                    }
                }
            } else {
                match (gt.is_known(), pred.is_known()) {
                    (true, true) => {
                        if case.entities_match() {
                            tp()
                        } else {
                            fn_fp()
                        }
                    }
                    (true, false) => {
                        if mode == EvalMode::Ignored {
                            fn_()
                        } else {
                            fn_fp()
                        }
                    }
                    (false, true) => {
                        if mode == EvalMode::Ignored {
                            fp()
                        } else {
                            fn_fp()
                        }
                    }
                    (false, false) => match mode {
                        EvalMode::Ignored | EvalMode::Optional => EvalTypeSet::EMPTY,
                        EvalMode::Required => tp(),
                    },
                }
            }
        }

        (None, None) => EvalTypeSet::EMPTY,
    }
}

/// The NER question: right span, entity identity ignored?
#[must_use]
pub fn ner_types(case: &Case, mode: EvalMode) -> EvalTypeSet {
    if case.factor == 0 {
        let has_children = case
            .ground_truth
            .as_ref()
            .is_some_and(|gt| gt.has_children);
        return inherited(case.children_correctly_detected, has_children);
    }

    match (case.ground_truth.as_ref(), case.prediction.as_ref()) {
        (None, Some(pred)) => {
            if !pred.is_known() && matches!(mode, EvalMode::Ignored | EvalMode::Optional) {
                EvalTypeSet::EMPTY
            } else {
                fp()
            }
        }

        (Some(gt), None) => {
            if case.is_optional {
                match mode {
                    EvalMode::Ignored | EvalMode::Optional => EvalTypeSet::EMPTY,
                    EvalMode::Required => fn_(),
                }
            } else if mode == EvalMode::Ignored && !gt.is_known() {
                EvalTypeSet::EMPTY
            } else {
                fn_()
            }
        }

        (Some(gt), Some(pred)) => {
            if case.is_optional {
                if pred.is_known() {
                    // Detection is correct regardless of the entity chosen.
                    match mode {
                        EvalMode::Ignored => fp(),
                        EvalMode::Optional | EvalMode::Required => tp(),
                    }
                } else {
                    match (mode, gt.is_known()) {
                        (EvalMode::Ignored, false) => EvalTypeSet::EMPTY,
                        (EvalMode::Ignored, true) => fn_fp(),
                        (_, false) => tp(),
                        (_, true) => fn_fp(),
                    }
                }
            } else {
                match (gt.is_known(), pred.is_known()) {
                    (true, true) => tp(),
                    (true, false) => {
                        if mode == EvalMode::Ignored {
                            fn_()
                        } else {
                            fn_fp()
                        }
                    }
                    (false, true) => {
                        if mode == EvalMode::Ignored {
                            fp()
                        } else {
                            fn_fp()
                        }
                    }
                    (false, false) => match mode {
                        EvalMode::Ignored | EvalMode::Optional => EvalTypeSet::EMPTY,
                        EvalMode::Required => tp(),
                    },
                }
            }
        }

        (None, None) => EvalTypeSet::EMPTY,
    }
}
