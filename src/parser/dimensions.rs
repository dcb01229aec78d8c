//! Decoders for the eight per-feature dimension sections.

use super::Scope;
use crate::error::{ParseError, Result};
use crate::grammar::ChecklistItem;
use crate::layout::{self, field};
use crate::model::*;

pub(super) fn parse_evaluation(
    scope: &Scope<'_, '_>,
    feature_id: FeatureId,
) -> Result<FeatureEvaluation> {
    Ok(FeatureEvaluation {
        feature_id,
        completeness: completeness(&scope.child(layout::COMPLETENESS)?)?,
        code_quality: code_quality(&scope.child(layout::CODE_QUALITY)?)?,
        documentation: documentation(&scope.child(layout::DOCUMENTATION)?)?,
        reliability: reliability(&scope.child(layout::RELIABILITY)?)?,
        performance: performance(&scope.child(layout::PERFORMANCE)?)?,
        integration: integration(&scope.child(layout::INTEGRATION)?)?,
        maintenance: maintenance(&scope.child(layout::MAINTENANCE)?)?,
        stress_collapse: stress_collapse(&scope.child(layout::STRESS_COLLAPSE)?)?,
    })
}

fn completeness(scope: &Scope<'_, '_>) -> Result<CompletenessEvaluation> {
    let (implemented, missing) = partition(scope.child(layout::CAPABILITIES)?.checklist()?);
    Ok(CompletenessEvaluation {
        rating: scope.label(field::RATING)?,
        percentage: scope.percent(field::PERCENTAGE)?,
        implemented,
        missing,
        incomplete: scope.child(layout::INCOMPLETE)?.list()?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn code_quality(scope: &Scope<'_, '_>) -> Result<CodeQualityEvaluation> {
    Ok(CodeQualityEvaluation {
        rating: scope.label(field::RATING)?,
        strengths: scope.child(layout::STRENGTHS)?.list()?,
        issues: scope.child(layout::ISSUES)?.list()?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn documentation(scope: &Scope<'_, '_>) -> Result<DocumentationEvaluation> {
    Ok(DocumentationEvaluation {
        rating: scope.label(field::RATING)?,
        coverage_percentage: scope.percent(field::COVERAGE)?,
        has_inline_comments: scope.flag(field::INLINE_COMMENTS)?,
        has_doc_comments: scope.flag(field::DOC_COMMENTS)?,
        has_examples: scope.flag(field::EXAMPLES)?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn reliability(scope: &Scope<'_, '_>) -> Result<ReliabilityEvaluation> {
    let (present, missing) = partition(scope.child(layout::ERROR_HANDLING)?.checklist()?);
    Ok(ReliabilityEvaluation {
        rating: scope.label(field::RATING)?,
        error_handling_present: present,
        error_handling_missing: missing,
        has_input_validation: scope.flag(field::INPUT_VALIDATION)?,
        has_retry_logic: scope.flag(field::RETRY_LOGIC)?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn performance(scope: &Scope<'_, '_>) -> Result<PerformanceEvaluation> {
    Ok(PerformanceEvaluation {
        rating: scope.label(field::RATING)?,
        complexity: scope.label(field::COMPLEXITY)?,
        bottlenecks: scope.child(layout::BOTTLENECKS)?.list()?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn integration(scope: &Scope<'_, '_>) -> Result<IntegrationEvaluation> {
    Ok(IntegrationEvaluation {
        rating: scope.label(field::RATING)?,
        feature_isolation: scope.label(field::FEATURE_ISOLATION)?,
        dependencies: scope.child(layout::DEPENDENCIES)?.list()?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn maintenance(scope: &Scope<'_, '_>) -> Result<MaintenanceEvaluation> {
    Ok(MaintenanceEvaluation {
        rating: scope.label(field::RATING)?,
        modification_ease: scope.label(field::MODIFICATION_EASE)?,
        has_extension_points: scope.flag(field::EXTENSION_POINTS)?,
        is_configurable: scope.flag(field::CONFIGURABLE)?,
        has_tests: scope.flag(field::TESTS)?,
        assessment: scope.field(field::ASSESSMENT)?,
        evidence: evidence(scope)?,
    })
}

fn stress_collapse(scope: &Scope<'_, '_>) -> Result<StressCollapseEvaluation> {
    let robust = scope.flag(field::ROBUST)?;
    let mut condition_sections = scope
        .children()
        .filter(|c| layout::is_condition_title(c.title()))
        .peekable();

    if robust {
        if let Some(condition) = condition_sections.peek() {
            return Err(scope.invalid("collapse conditions", condition.title()));
        }
        return Ok(StressCollapseEvaluation::Robust {
            reason: scope.field(field::REASON)?,
        });
    }

    if let Ok(reason) = scope.field(field::REASON) {
        return Err(scope.invalid(field::REASON, reason));
    }

    let conditions = condition_sections
        .map(|c| {
            Ok(CollapseCondition {
                trigger: c.field(field::TRIGGER)?,
                threshold: c.field(field::THRESHOLD)?,
                expected_behavior: c.field(field::EXPECTED_BEHAVIOR)?,
                reasoning: c.ordered_list(&[
                    field::TRIGGER,
                    field::THRESHOLD,
                    field::EXPECTED_BEHAVIOR,
                ])?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let conditions = CollapseConditions::new(conditions)
        .map_err(|_| scope.invalid("collapse conditions", "none"))?;
    Ok(StressCollapseEvaluation::Collapses { conditions })
}

/// Optional `Evidence` sub-section.
fn evidence(scope: &Scope<'_, '_>) -> Result<Option<CodeEvidence>> {
    let Some(section) = scope.optional_child(layout::EVIDENCE) else {
        return Ok(None);
    };
    let (start_line, end_line) = section.range(field::LINES)?;
    let fence = section.fence().ok_or_else(|| ParseError::MissingField {
        section: section.path().to_string(),
        field: "snippet".to_string(),
    })?;
    Ok(Some(CodeEvidence {
        file_path: section.field(field::FILE)?,
        start_line,
        end_line,
        language: fence.language,
        snippet: fence.content,
    }))
}

/// Split a checklist into (done, not done), keeping order within each.
fn partition(items: Vec<ChecklistItem>) -> (Vec<String>, Vec<String>) {
    let (done, open): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.done);
    (
        done.into_iter().map(|i| i.text).collect(),
        open.into_iter().map(|i| i.text).collect(),
    )
}
