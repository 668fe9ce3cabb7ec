//! End-to-end article evaluation.
//!
//! [`Evaluator`] wires the pipeline together: for each article it generates
//! cases, classifies them under all three evaluation modes, runs the
//! diagnostic labeler, and folds the result into a [`ResultAggregator`].
//! Evaluators over disjoint article sets can be combined with
//! [`merge`](Evaluator::merge), so sharded runs fold into one report.

use crate::error::Result;
use crate::eval::aggregate::{EvalReport, ResultAggregator};
use crate::eval::cases::{Case, CaseGenerator};
use crate::eval::classify::classify_case;
use crate::eval::labeler::ErrorLabeler;
use crate::eval::modes::EvalMode;
use crate::kb::KnowledgeBase;
use crate::label::Article;
use crate::whitelist::TypeWhitelist;

/// Orchestrates case generation, classification, labeling, and aggregation.
pub struct Evaluator<'a, K: KnowledgeBase + ?Sized> {
    kb: &'a K,
    whitelist: Option<&'a TypeWhitelist>,
    /// Whether the benchmark annotates unknown entities; changes how
    /// non-overlapping false detections are subtyped.
    benchmark_has_unknowns: bool,
    /// Sticky across articles: once any prediction in this run carried more
    /// than one candidate, candidate-set diagnostics stay enabled for the
    /// rest of the run.
    has_candidates: bool,
    aggregator: ResultAggregator,
}

impl<'a, K: KnowledgeBase + ?Sized> Evaluator<'a, K> {
    /// Create an evaluator for one run.
    #[must_use]
    pub fn new(kb: &'a K) -> Self {
        Self {
            kb,
            whitelist: None,
            benchmark_has_unknowns: true,
            has_candidates: false,
            aggregator: ResultAggregator::new(),
        }
    }

    /// Normalize ground-truth type lists against a whitelist before
    /// evaluating.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: &'a TypeWhitelist) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// Declare whether the benchmark contains unknown-entity labels.
    #[must_use]
    pub fn with_benchmark_has_unknowns(mut self, has_unknowns: bool) -> Self {
        self.benchmark_has_unknowns = has_unknowns;
        self
    }

    /// Evaluate one article and fold it into the running aggregate.
    /// Returns the annotated cases for inspection or serialization.
    pub fn evaluate_article(&mut self, article: &Article) -> Result<Vec<Case>> {
        let normalized;
        let article = match self.whitelist {
            Some(whitelist) => {
                normalized = self.normalize_types(article, whitelist);
                &normalized
            }
            None => article,
        };

        let mut cases = CaseGenerator::new(self.kb).generate(article)?;

        if !self.has_candidates {
            self.has_candidates = cases.iter().any(|c| {
                c.prediction
                    .as_ref()
                    .is_some_and(|p| p.candidates.len() > 1)
            });
        }

        for case in &mut cases {
            classify_case(case);
        }

        let labeler = ErrorLabeler::new(
            self.kb,
            &article.hyperlinks,
            self.benchmark_has_unknowns,
            self.has_candidates,
        );
        for mode in EvalMode::ALL {
            labeler.label_cases(&mut cases, mode);
        }

        self.aggregator.add_article(&cases);
        log::debug!(
            "evaluated article: {} labels, {} predictions, {} cases",
            article.labels.len(),
            article.predictions.len(),
            cases.len()
        );
        Ok(cases)
    }

    /// Fold another evaluator's aggregate into this one. The candidate gate
    /// stays sticky across the union of both runs.
    pub fn merge(&mut self, other: &Evaluator<'a, K>) {
        self.aggregator.merge(&other.aggregator);
        self.has_candidates = self.has_candidates || other.has_candidates;
    }

    /// Render the report over everything evaluated so far.
    #[must_use]
    pub fn report(&self) -> EvalReport {
        self.aggregator.report()
    }

    /// Access the running aggregate.
    #[must_use]
    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    fn normalize_types(&self, article: &Article, whitelist: &TypeWhitelist) -> Article {
        let mut article = article.clone();
        for label in &mut article.labels {
            let raw: Vec<String> = label.types().map(String::from).collect();
            label.entity_type = whitelist.normalize(&raw).join("|");
        }
        article
    }
}
