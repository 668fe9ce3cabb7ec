//! # linkeval
//!
//! Entity-linking evaluation for Rust.
//!
//! - **Span matching**: word-boundary-tolerant alignment of predicted
//!   mention spans against ground truth
//! - **Nested labels**: recursive factor computation so nested annotations
//!   are never double-counted
//! - **Three policies**: every mention judged under Ignored, Optional, and
//!   Required handling of optional/unknown ground truth
//! - **Error taxonomy**: a closed set of diagnostic labels (undetected,
//!   disambiguation, false detection, hyperlink, coreference subtypes)
//! - **Reporting**: precision/recall/F1 per mention category and whitelist
//!   type, mergeable across article shards
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linkeval::eval::Evaluator;
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
//! println!("{}", evaluator.report().to_markdown());
//! ```
//!
//! ## Architecture
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`span`] | Half-open char spans, word-boundary expansion |
//! | [`label`] | Ground-truth labels, predictions, articles |
//! | [`kb`] | Knowledge-base interface and in-memory implementation |
//! | [`whitelist`] | Entity-type whitelist and normalization |
//! | [`eval`] | Case generation, classification, labeling, aggregation |

pub mod error;
pub mod eval;
pub mod kb;
pub mod label;
pub mod span;
pub mod whitelist;

pub use error::{Error, Result};
pub use kb::{most_popular_candidate, InMemoryKb, KnowledgeBase};
pub use label::{
    Article, GroundTruthLabel, MentionType, Prediction, PredictionSource, COREFERENCE_PRONOUNS,
    TYPE_DATETIME, TYPE_OTHER, TYPE_QUANTITY, UNKNOWN_ENTITY_PREFIX,
};
pub use span::{expand_to_word_boundaries, span_text, Span};
pub use whitelist::{TypeAdjustments, TypeWhitelist};
