//! Entity-linking evaluation pipeline.
//!
//! # Overview
//!
//! Evaluation of one article runs in four stages:
//! 1. [`cases::CaseGenerator`] merges predictions and ground truth into a
//!    span-sorted list of [`cases::Case`] records, computing the nested-label
//!    de-duplication factor along the way.
//! 2. [`classify::classify_case`] assigns linking and NER TP/FP/FN sets under
//!    each [`modes::EvalMode`].
//! 3. [`labeler::ErrorLabeler`] attaches diagnostic [`error_label::ErrorLabel`]s
//!    (undetected subtypes, disambiguation subtypes, hyperlink and
//!    coreference diagnostics).
//! 4. [`aggregate::ResultAggregator`] folds cases into per-mode counters and
//!    renders precision/recall/F1 plus an error breakdown.
//!
//! [`evaluator::Evaluator`] drives the whole pipeline and supports merging
//! partial aggregates from sharded runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use linkeval::eval::{EvalMode, Evaluator};
//! use linkeval::{Article, GroundTruthLabel, InMemoryKb, Prediction, Span};
//!
//! let mut kb = InMemoryKb::new();
//! kb.add_entity("Q90", vec!["Q27096213"], 250);
//!
//! let article = Article::new(
//!     "Paris is large",
//!     vec![GroundTruthLabel::new(1, Span::new(0, 5), "Q90", "Q27096213")],
//!     vec![Prediction::new(Span::new(0, 5), "Q90")],
//! );
//!
//! let mut evaluator = Evaluator::new(&kb);
//! evaluator.evaluate_article(&article)?;
//! let report = evaluator.report();
//! println!("{}", report.to_markdown());
//! ```

pub mod aggregate;
pub mod cases;
pub mod classify;
pub mod error_label;
pub mod evaluator;
pub mod factor;
pub mod labeler;
pub mod modes;
pub mod tree;

pub use aggregate::{EvalCounts, EvalReport, Metrics, ModeCounts, ModeReport, ResultAggregator};
pub use cases::{Case, CaseGenerator, CaseGroundTruth, CasePrediction, PredictionIndex};
pub use classify::classify_case;
pub use error_label::ErrorLabel;
pub use evaluator::Evaluator;
pub use factor::FactorResolver;
pub use labeler::ErrorLabeler;
pub use modes::{EvalMode, EvalType, EvalTypeSet, PerMode};
pub use tree::GroundTruthTree;
