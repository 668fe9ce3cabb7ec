//! End-to-end pipeline tests: article in, classified and labeled cases plus
//! an aggregate report out.

use linkeval::eval::{ErrorLabel, EvalMode, EvalType, Evaluator};
use linkeval::{Article, GroundTruthLabel, InMemoryKb, Prediction, Span};

const LOCATION: &str = "Q27096213";

fn kb() -> InMemoryKb {
    let mut kb = InMemoryKb::new();
    kb.add_entity("Q1", vec![LOCATION], 500);
    kb.add_name("Q1", "Entity One");
    kb.add_entity("Q2", vec![LOCATION], 400);
    kb.add_entity("Q3", vec![LOCATION], 300);
    kb.add_entity("Q5", vec![LOCATION], 250);
    kb.add_entity("Q6", vec![LOCATION], 200);
    kb.add_entity("Q7", vec![LOCATION], 150);
    kb.add_entity("Q8", vec![LOCATION], 100);
    kb.add_entity("Q142", vec![LOCATION], 300);
    kb.add_name("Q142", "France");
    kb.add_demonym("French", vec!["Q142"]);
    kb
}

#[test]
fn flat_correct_prediction_is_tp_in_all_modes() {
    let kb = kb();
    let article = Article::new(
        "Abcdefghij rest",
        vec![GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION)],
        vec![Prediction::new(Span::new(0, 10), "Q1")],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].factor, 1);
    for mode in EvalMode::ALL {
        assert!(cases[0].linking_eval_types[mode].contains(EvalType::TP));
        assert!(!cases[0].linking_eval_types[mode].contains(EvalType::FN));
    }
}

#[test]
fn nested_labels_are_not_double_counted() {
    // Root (0,10) with a nested chain down to (0,2); two more roots with
    // their own chains. The innermost detected labels carry the counts.
    let kb = kb();
    let labels = vec![
        GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION).with_children(vec![2]),
        GroundTruthLabel::new(2, Span::new(0, 2), "Q2", LOCATION)
            .with_parent(1)
            .with_children(vec![3]),
        GroundTruthLabel::new(3, Span::new(0, 2), "Q3", LOCATION).with_parent(2),
        GroundTruthLabel::new(5, Span::new(4, 6), "Q5", LOCATION).with_children(vec![6]),
        GroundTruthLabel::new(6, Span::new(4, 6), "Q6", LOCATION)
            .with_parent(5)
            .with_children(vec![8]),
        GroundTruthLabel::new(8, Span::new(4, 6), "Q8", LOCATION).with_parent(6),
        GroundTruthLabel::new(7, Span::new(8, 10), "Q7", LOCATION),
    ];
    let article = Article::new(
        "ab  cd  ef",
        labels,
        vec![
            Prediction::new(Span::new(0, 2), "Q3"),
            Prediction::new(Span::new(4, 6), "Q8"),
            Prediction::new(Span::new(8, 10), "Q7"),
        ],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    let factor_of = |id: u32| {
        cases
            .iter()
            .find(|c| c.ground_truth.as_ref().map(|g| g.id) == Some(id))
            .map(|c| c.factor)
            .unwrap()
    };
    assert_eq!(factor_of(1), 0);
    assert_eq!(factor_of(2), 0);
    assert_eq!(factor_of(3), 1);
    assert_eq!(factor_of(5), 0);
    assert_eq!(factor_of(6), 0);
    assert_eq!(factor_of(7), 1);
    assert_eq!(factor_of(8), 1);

    // Three detected leaves, all correct, and nothing counted twice.
    let report = evaluator.report();
    let required = &report.per_mode[EvalMode::Required];
    assert_eq!(required.all.true_positives, 3);
    assert_eq!(required.all.false_positives, 0);
    assert_eq!(required.all.false_negatives, 0);
}

#[test]
fn undetected_label_is_fn_per_mode() {
    let kb = kb();

    // Known entity: FN in every mode.
    let article = Article::new(
        "Abcdefghij rest",
        vec![GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION)],
        vec![],
    );
    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();
    assert_eq!(cases[0].factor, 1);
    for mode in EvalMode::ALL {
        assert!(cases[0].linking_eval_types[mode].contains(EvalType::FN));
        assert!(cases[0].ner_eval_types[mode].contains(EvalType::FN));
    }

    // Unknown entity: contributes nothing under Ignored.
    let article = Article::new(
        "Abcdefghij rest",
        vec![GroundTruthLabel::new(
            1,
            Span::new(0, 10),
            "Unknown1",
            LOCATION,
        )],
        vec![],
    );
    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();
    assert!(cases[0].linking_eval_types[EvalMode::Ignored].is_empty());
    assert!(cases[0].linking_eval_types[EvalMode::Optional].contains(EvalType::FN));
    assert!(cases[0].linking_eval_types[EvalMode::Required].contains(EvalType::FN));
}

#[test]
fn lowercase_false_positive_gets_diagnostics() {
    let kb = kb();
    let article = Article::new(
        "nothing to see here",
        vec![],
        vec![Prediction::new(Span::new(0, 7), "Q1")],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    let labels = &cases[0].error_labels[EvalMode::Required];
    assert!(labels.contains(&ErrorLabel::FalseDetection));
    assert!(labels.contains(&ErrorLabel::FalseDetectionLowercased));
}

#[test]
fn demonym_mention_correct_and_wrong() {
    let kb = kb();

    let gt = || vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q142", LOCATION)];

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator
        .evaluate_article(&Article::new(
            "French cuisine",
            gt(),
            vec![Prediction::new(Span::new(0, 6), "Q142")],
        ))
        .unwrap();
    let labels = &cases[0].error_labels[EvalMode::Required];
    assert!(cases[0].linking_eval_types[EvalMode::Required].contains(EvalType::TP));
    assert!(labels.contains(&ErrorLabel::DisambiguationDemonymCorrect));

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator
        .evaluate_article(&Article::new(
            "French cuisine",
            gt(),
            vec![Prediction::new(Span::new(0, 6), "Q1")],
        ))
        .unwrap();
    let labels = &cases[0].error_labels[EvalMode::Required];
    assert!(labels.contains(&ErrorLabel::DisambiguationWrong));
    assert!(labels.contains(&ErrorLabel::DisambiguationDemonymWrong));
}

#[test]
fn expanded_span_still_matches() {
    // Prediction misses the trailing character of the word; boundary
    // expansion aligns it with the annotation.
    let kb = kb();
    let article = Article::new(
        "Abcdefghij rest",
        vec![GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION)],
        vec![Prediction::new(Span::new(0, 9), "Q1")],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    assert_eq!(cases.len(), 1);
    assert!(cases[0].has_prediction());
    assert!(cases[0].linking_eval_types[EvalMode::Required].contains(EvalType::TP));
}

#[test]
fn optional_label_judgement_depends_on_mode() {
    let kb = kb();
    let article = Article::new(
        "Abcdefghij rest",
        vec![GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION).with_optional(true)],
        vec![Prediction::new(Span::new(0, 10), "Q1")],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    // Correct link to an optional mention: punished under Ignored, neutral
    // under Optional, rewarded under Required.
    assert!(cases[0].linking_eval_types[EvalMode::Ignored].contains(EvalType::FP));
    assert!(cases[0].linking_eval_types[EvalMode::Optional].is_empty());
    assert!(cases[0].linking_eval_types[EvalMode::Required].contains(EvalType::TP));
}

#[test]
fn required_mode_types_are_consistent() {
    // Mixed article: correct link, wrong link, miss, spurious detection.
    let kb = kb();
    let article = Article::new(
        "Abcdefghij Klmnop Qrstuv wxyz",
        vec![
            GroundTruthLabel::new(1, Span::new(0, 10), "Q1", LOCATION),
            GroundTruthLabel::new(2, Span::new(11, 17), "Q2", LOCATION),
            GroundTruthLabel::new(3, Span::new(18, 24), "Q3", LOCATION),
        ],
        vec![
            Prediction::new(Span::new(0, 10), "Q1"),
            Prediction::new(Span::new(11, 17), "Q5"),
            Prediction::new(Span::new(25, 29), "Q7"),
        ],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    for case in &cases {
        if case.factor == 1 {
            let types = case.linking_eval_types[EvalMode::Required];
            assert!(!types.is_empty());
            assert!(!(types.contains(EvalType::TP) && types.contains(EvalType::FN)));
        }
    }

    let report = evaluator.report();
    let required = &report.per_mode[EvalMode::Required];
    assert_eq!(required.all.true_positives, 1);
    assert_eq!(required.all.false_negatives, 2);
    assert_eq!(required.all.false_positives, 2);
    assert_eq!(required.ner.true_positives, 2);
    assert_eq!(required.ner.false_negatives, 1);
    assert_eq!(required.ner.false_positives, 1);
}

#[test]
fn case_serde_round_trip() {
    let kb = kb();
    let article = Article::new(
        "French cuisine",
        vec![GroundTruthLabel::new(1, Span::new(0, 6), "Q142", LOCATION)],
        vec![Prediction::new(Span::new(0, 6), "Q1")],
    );

    let mut evaluator = Evaluator::new(&kb);
    let cases = evaluator.evaluate_article(&article).unwrap();

    let json = serde_json::to_string(&cases).unwrap();
    let restored: Vec<linkeval::eval::Case> = serde_json::from_str(&json).unwrap();

    assert_eq!(cases.len(), restored.len());
    for (a, b) in cases.iter().zip(&restored) {
        assert_eq!(a.factor, b.factor);
        for mode in EvalMode::ALL {
            assert_eq!(a.linking_eval_types[mode], b.linking_eval_types[mode]);
            assert_eq!(a.ner_eval_types[mode], b.ner_eval_types[mode]);
            assert_eq!(a.error_labels[mode], b.error_labels[mode]);
        }
    }
}
