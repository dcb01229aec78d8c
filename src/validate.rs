//! Consistency checks over a parsed document.
//!
//! Parsing preserves whatever the document says; this pass reports where a
//! document disagrees with itself. It never mutates the document and is
//! never run implicitly by the parser.

use crate::model::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("total features is {declared} but the features table has {actual} rows")]
    TotalFeaturesMismatch { declared: u32, actual: usize },

    #[error("feature id 0 is not allowed")]
    ZeroFeatureId,

    #[error("feature id {0} appears more than once")]
    DuplicateFeatureId(FeatureId),

    #[error("{evaluations} evaluations for {features} features")]
    EvaluationCountMismatch { features: usize, evaluations: usize },

    #[error("evaluation {index} rates feature {found}, expected feature {expected}")]
    EvaluationOrderMismatch {
        index: usize,
        expected: FeatureId,
        found: FeatureId,
    },

    #[error("feature {id}: primary location ends at line {end} but starts at line {start}")]
    InvalidPrimaryLocation { id: FeatureId, start: u32, end: u32 },

    #[error("feature {id}: {dimension} evidence range {start}-{end} is reversed")]
    InvalidEvidenceRange {
        id: FeatureId,
        dimension: &'static str,
        start: u32,
        end: u32,
    },

    #[error("feature {id}: {field} of {value}% exceeds 100%")]
    PercentageOutOfRange {
        id: FeatureId,
        field: &'static str,
        value: u8,
    },

    #[error("summary counts {rating} as {declared}, evaluations rate {actual} features {rating}")]
    SummaryCountMismatch {
        rating: CompletenessRating,
        declared: u32,
        actual: u32,
    },
}

/// Report every consistency problem in `doc`, in document order.
pub fn validate(doc: &AgreementDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let features = &doc.feature_identification.features_table;
    let evaluations = &doc.feature_evaluations;

    let declared = doc.feature_identification.total_features;
    if usize::try_from(declared).map_or(true, |d| d != features.len()) {
        issues.push(ValidationIssue::TotalFeaturesMismatch {
            declared,
            actual: features.len(),
        });
    }

    let mut seen = HashSet::new();
    for feature in features {
        if feature.id.0 == 0 {
            issues.push(ValidationIssue::ZeroFeatureId);
        }
        if !seen.insert(feature.id) {
            issues.push(ValidationIssue::DuplicateFeatureId(feature.id));
        }
        let loc = &feature.primary_location;
        if loc.end_line <= loc.start_line {
            issues.push(ValidationIssue::InvalidPrimaryLocation {
                id: feature.id,
                start: loc.start_line,
                end: loc.end_line,
            });
        }
    }

    if evaluations.len() != features.len() {
        issues.push(ValidationIssue::EvaluationCountMismatch {
            features: features.len(),
            evaluations: evaluations.len(),
        });
    }
    for (index, (feature, eval)) in features.iter().zip(evaluations).enumerate() {
        if feature.id != eval.feature_id {
            issues.push(ValidationIssue::EvaluationOrderMismatch {
                index,
                expected: feature.id,
                found: eval.feature_id,
            });
        }
    }

    for eval in evaluations {
        check_evaluation(eval, &mut issues);
    }

    let actual = CompletenessCounts::from_evaluations(evaluations);
    let declared = doc.component_summary.completeness_counts;
    for rating in CompletenessRating::ALL {
        if declared.get(*rating) != actual.get(*rating) {
            issues.push(ValidationIssue::SummaryCountMismatch {
                rating: *rating,
                declared: declared.get(*rating),
                actual: actual.get(*rating),
            });
        }
    }

    tracing::debug!(issues = issues.len(), "validated agreement");
    issues
}

fn check_evaluation(eval: &FeatureEvaluation, issues: &mut Vec<ValidationIssue>) {
    let id = eval.feature_id;

    for (field, value) in [
        ("completeness", eval.completeness.percentage),
        ("documentation coverage", eval.documentation.coverage_percentage),
    ] {
        if value > 100 {
            issues.push(ValidationIssue::PercentageOutOfRange { id, field, value });
        }
    }

    let evidence = [
        ("completeness", &eval.completeness.evidence),
        ("code quality", &eval.code_quality.evidence),
        ("documentation", &eval.documentation.evidence),
        ("reliability", &eval.reliability.evidence),
        ("performance", &eval.performance.evidence),
        ("integration", &eval.integration.evidence),
        ("maintenance", &eval.maintenance.evidence),
    ];
    for (dimension, evidence) in evidence {
        if let Some(e) = evidence {
            if e.start_line > e.end_line {
                issues.push(ValidationIssue::InvalidEvidenceRange {
                    id,
                    dimension,
                    start: e.start_line,
                    end: e.end_line,
                });
            }
        }
    }
}
