//! Quality Scoring Module
//!
//! Deterministic rubric scoring of generated documentation:
//! - `markdown`: heading / fenced block extraction
//! - `rubric`: weights, keyword tables and suggestions per doc type
//! - `criteria`: per-format detection of each criterion
//!
//! `score` is always the sum of the earned points in the breakdown.

pub mod criteria;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod markdown;
pub mod rubric;

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::constants::scoring as scoring_constants;
use crate::types::{
    CodeAnalysis, Criterion, CriterionScore, CriterionStatus, DocType, Grade, QualityScore,
    QualitySummary,
};
use criteria::{Share, jsdoc, narrative, openapi};
use markdown::MarkdownDoc;
pub use rubric::RubricWeights;

const ALL_COMPLETE: &str = "Documentation covers every rubric criterion.";

/// Rubric scorer. Holds only immutable weight tables.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    overrides: HashMap<DocType, RubricWeights>,
}

impl QualityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer with per-doc-type weight overrides (already validated)
    pub fn with_weights(overrides: HashMap<DocType, RubricWeights>) -> Self {
        Self { overrides }
    }

    pub fn weights(&self, doc_type: DocType) -> RubricWeights {
        self.overrides
            .get(&doc_type)
            .copied()
            .unwrap_or_else(|| RubricWeights::for_doc_type(doc_type))
    }

    /// Score `documentation` written for `analysis` as `doc_type`.
    pub fn score(
        &self,
        documentation: &str,
        analysis: &CodeAnalysis,
        doc_type: DocType,
    ) -> QualityScore {
        let weights = self.weights(doc_type);
        let shares = measure(documentation, analysis, doc_type);

        let breakdown: BTreeMap<Criterion, CriterionScore> = weights
            .criteria()
            .map(|criterion| {
                let max = weights.get(criterion);
                let earned = shares
                    .get(&criterion)
                    .copied()
                    .unwrap_or(Share::NONE)
                    .points(max);
                (criterion, criterion_score(criterion, doc_type, earned, max))
            })
            .collect();

        let score: u32 = breakdown.values().map(|c| c.points_earned).sum();
        let summary = summarize(&breakdown);

        debug!(
            doc_type = doc_type.as_str(),
            score,
            strengths = summary.strengths.len(),
            "Documentation scored"
        );

        QualityScore {
            score,
            grade: Grade::from_score(score),
            breakdown,
            summary,
        }
    }
}

fn measure(
    documentation: &str,
    analysis: &CodeAnalysis,
    doc_type: DocType,
) -> HashMap<Criterion, Share> {
    let names = analysis.documentable_names();
    let mut shares = HashMap::new();

    match doc_type {
        DocType::Readme | DocType::Api | DocType::Architecture => {
            let doc = MarkdownDoc::parse(documentation);
            shares.insert(Criterion::Overview, narrative::overview(&doc));
            shares.insert(
                Criterion::Installation,
                narrative::installation(&doc, documentation),
            );
            shares.insert(Criterion::Examples, narrative::examples(&doc));
            shares.insert(Criterion::ApiDocs, narrative::api_docs(&doc, &names));
            shares.insert(Criterion::Structure, narrative::structure(&doc));
        }
        DocType::Jsdoc => {
            let blocks = jsdoc::blocks(documentation);
            shares.insert(Criterion::Overview, jsdoc::overview(documentation, &blocks));
            shares.insert(Criterion::Examples, jsdoc::examples(documentation));
            shares.insert(
                Criterion::ApiDocs,
                jsdoc::api_docs(documentation, &blocks, &names),
            );
            shares.insert(Criterion::Structure, jsdoc::structure(documentation));
        }
        DocType::Openapi => {
            let keys = openapi::key_lines(documentation);
            shares.insert(Criterion::Overview, openapi::overview(documentation, &keys));
            shares.insert(Criterion::Installation, openapi::installation(&keys));
            shares.insert(Criterion::Examples, openapi::examples(&keys));
            shares.insert(
                Criterion::ApiDocs,
                openapi::api_docs(documentation, &keys, &names),
            );
            shares.insert(Criterion::Structure, openapi::structure(&keys));
        }
    }
    shares
}

fn criterion_score(criterion: Criterion, doc_type: DocType, earned: u32, max: u32) -> CriterionScore {
    let status = if earned * 100 >= max * scoring_constants::COMPLETE_THRESHOLD_PCT {
        CriterionStatus::Complete
    } else if earned > 0 {
        CriterionStatus::Partial
    } else {
        CriterionStatus::Missing
    };
    let suggestion = (status != CriterionStatus::Complete)
        .then(|| rubric::suggestion(criterion, doc_type).to_string());

    CriterionScore {
        points_earned: earned,
        points_max: max,
        status,
        suggestion,
    }
}

fn summarize(breakdown: &BTreeMap<Criterion, CriterionScore>) -> QualitySummary {
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    // Lowest earned/max ratio wins; strict comparison keeps declaration order on ties
    let mut weakest: Option<&CriterionScore> = None;

    for (criterion, score) in breakdown {
        if score.status == CriterionStatus::Complete {
            strengths.push(*criterion);
            continue;
        }
        improvements.push(*criterion);
        let lower = match weakest {
            None => true,
            Some(current) => {
                (score.points_earned as u64) * (current.points_max as u64)
                    < (current.points_earned as u64) * (score.points_max as u64)
            }
        };
        if lower {
            weakest = Some(score);
        }
    }

    let top_suggestion = weakest
        .and_then(|s| s.suggestion.clone())
        .unwrap_or_else(|| ALL_COMPLETE.to_string());

    QualitySummary {
        strengths,
        improvements,
        top_suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::CodeAnalyzer;
    use super::fixtures::ADD_README;
    use proptest::prelude::*;

    fn add_analysis() -> CodeAnalysis {
        CodeAnalyzer::new().analyze("function add(a,b){return a+b}", "javascript")
    }

    #[test]
    fn test_end_to_end_readme_score() {
        let score = QualityScorer::new().score(ADD_README, &add_analysis(), DocType::Readme);

        let examples = score.criterion(Criterion::Examples).unwrap();
        assert_eq!(examples.status, CriterionStatus::Partial);
        assert_eq!(examples.points_earned, 12);
        assert!(examples.suggestion.is_some());

        let api = score.criterion(Criterion::ApiDocs).unwrap();
        assert_eq!(api.status, CriterionStatus::Complete);
        assert!(api.suggestion.is_none());

        assert_eq!(score.score, 92);
        assert!(score.grade <= Grade::B);
        assert_eq!(score.summary.improvements, vec![Criterion::Examples]);
        assert_eq!(
            score.summary.top_suggestion,
            rubric::suggestion(Criterion::Examples, DocType::Readme)
        );
    }

    #[test]
    fn test_empty_documentation_scores_zero() {
        let score = QualityScorer::new().score("", &add_analysis(), DocType::Readme);
        assert_eq!(score.score, 0);
        assert_eq!(score.grade, Grade::F);
        assert!(score.summary.strengths.is_empty());
        assert_eq!(score.summary.improvements.len(), 5);
        // all ratios are zero; first in declaration order wins
        assert_eq!(
            score.summary.top_suggestion,
            rubric::suggestion(Criterion::Overview, DocType::Readme)
        );
    }

    #[test]
    fn test_jsdoc_uses_adjusted_weights() {
        let doc = "/**\n * @fileoverview Arithmetic helpers.\n */\n\n/**\n * Adds two numbers.\n * @param {number} a\n * @param {number} b\n * @returns {number}\n * @example\n * add(1, 2)\n */\nfunction add(a, b) { return a + b }\n";
        let score = QualityScorer::new().score(doc, &add_analysis(), DocType::Jsdoc);

        assert!(score.criterion(Criterion::Installation).is_none());
        assert_eq!(score.breakdown.len(), 4);
        assert_eq!(score.criterion(Criterion::Overview).unwrap().points_earned, 15);
        assert_eq!(score.criterion(Criterion::ApiDocs).unwrap().points_earned, 40);
        assert_eq!(score.criterion(Criterion::Examples).unwrap().points_earned, 12);
        assert_eq!(score.earned_total(), score.score);
    }

    #[test]
    fn test_openapi_structure_and_operations() {
        let doc = "openapi: 3.0.0\ninfo:\n  title: Calc\n  description: Adds numbers over HTTP\nservers:\n  - url: https://api.example.com\npaths:\n  /add:\n    post:\n      operationId: add\n      summary: Add two numbers\ncomponents:\n  schemas: {}\n";
        let score = QualityScorer::new().score(doc, &add_analysis(), DocType::Openapi);

        assert_eq!(score.criterion(Criterion::Overview).unwrap().points_earned, 15);
        assert_eq!(score.criterion(Criterion::Installation).unwrap().points_earned, 10);
        assert_eq!(score.criterion(Criterion::ApiDocs).unwrap().points_earned, 35);
        assert_eq!(score.criterion(Criterion::Structure).unwrap().points_earned, 20);
        assert_eq!(
            score.criterion(Criterion::Examples).unwrap().status,
            CriterionStatus::Missing
        );
    }

    #[test]
    fn test_weight_overrides_apply() {
        let mut overrides = HashMap::new();
        overrides.insert(
            DocType::Readme,
            RubricWeights {
                overview: 50,
                installation: 0,
                examples: 0,
                api_docs: 50,
                structure: 0,
            },
        );
        let scorer = QualityScorer::with_weights(overrides);
        let score = scorer.score(ADD_README, &add_analysis(), DocType::Readme);
        assert_eq!(score.breakdown.len(), 2);
        assert_eq!(score.score, 100);
        assert_eq!(score.summary.top_suggestion, ALL_COMPLETE);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = QualityScorer::new();
        let analysis = add_analysis();
        for doc_type in DocType::ALL {
            let first = scorer.score(ADD_README, &analysis, doc_type);
            let second = scorer.score(ADD_README, &analysis, doc_type);
            assert_eq!(first, second);
        }
    }

    proptest! {
        #[test]
        fn prop_score_is_sum_of_breakdown(
            doc in "(#{1,3} [a-z ]{0,20}\n|```\n|[a-z ,.]{0,60}\n|@param x\n|info:\n  title: t\n){0,30}",
            doc_type in prop::sample::select(DocType::ALL.to_vec()),
        ) {
            let score = QualityScorer::new().score(&doc, &add_analysis(), doc_type);
            prop_assert_eq!(score.earned_total(), score.score);
            prop_assert!(score.score <= 100);
            prop_assert_eq!(score.grade, Grade::from_score(score.score));
            for criterion in score.breakdown.values() {
                prop_assert!(criterion.points_earned <= criterion.points_max);
            }
        }
    }
}
