//! Canonical AGREEMENT.md serializer.
//!
//! Sections and fields are emitted in the fixed order defined by
//! [`crate::layout`], so identical documents always produce byte-identical
//! output. Field lines of a section always precede its sub-headings.

use crate::grammar::{
    render_checklist, render_field, render_fence, render_heading, render_list,
    render_ordered_list, render_table, ChecklistItem,
};
use crate::layout::{self, field};
use crate::model::*;
use crate::render::Renderer;
use anyhow::Result;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &AgreementDocument) -> Result<String> {
        Ok(serialize_agreement(doc))
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Serialize a document into its canonical Markdown form.
pub fn serialize_agreement(doc: &AgreementDocument) -> String {
    tracing::debug!(
        component = %doc.header.component_name,
        features = doc.feature_identification.features_table.len(),
        "serializing agreement"
    );

    let mut w = Writer::default();
    w.heading(1, layout::DOCUMENT_TITLE);
    write_header(&mut w, &doc.header);
    write_identification(&mut w, &doc.feature_identification);

    w.heading(2, layout::FEATURE_EVALUATIONS);
    for (feature, eval) in doc.evaluations() {
        write_evaluation(&mut w, feature, eval);
    }

    write_summary(&mut w, &doc.component_summary);
    w.finish()
}

/// Block writer: every block is followed by one blank line.
#[derive(Default)]
struct Writer {
    lines: Vec<String>,
}

impl Writer {
    fn heading(&mut self, level: usize, text: &str) {
        self.block(render_heading(level, text));
    }

    fn field(&mut self, key: &str, value: &str) {
        self.block(render_field(key, value));
    }

    /// Push a rendered block. Empty blocks (empty lists, no rows) are skipped.
    fn block(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.lines.push(text);
        self.lines.push(String::new());
    }

    fn finish(mut self) -> String {
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

// -- Header and feature identification ----------------------------------------

fn write_header(w: &mut Writer, header: &Header) {
    w.heading(2, layout::HEADER);
    w.field(field::COMPONENT, &header.component_name);
    w.field(field::CLASSIFICATION, header.classification.label());
    w.field(field::EVALUATION_DATE, &header.evaluation_date);
    w.field(field::SOURCE_PATH, &header.source_path);
    w.field(field::LINES_OF_CODE, &header.lines_of_code.to_string());
}

fn write_identification(w: &mut Writer, ident: &FeatureIdentification) {
    w.heading(2, layout::FEATURE_IDENTIFICATION);

    w.heading(3, layout::METHODOLOGY);
    w.block(render_list(&ident.methodology));

    w.heading(3, layout::FEATURES);
    let rows: Vec<Vec<String>> = ident
        .features_table
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                f.name.clone(),
                f.description.clone(),
                f.lines_of_code.to_string(),
                f.primary_location.file_path.clone(),
                f.primary_location.start_line.to_string(),
                f.primary_location.end_line.to_string(),
            ]
        })
        .collect();
    w.block(render_table(layout::FEATURE_COLUMNS, &rows));
    w.field(field::TOTAL_FEATURES, &ident.total_features.to_string());

    w.heading(3, layout::FEATURE_STRUCTURE);
    for feature in &ident.features_table {
        write_structure(w, feature);
    }

    w.heading(3, layout::EXTERNAL_DEPENDENCIES);
    let rows: Vec<Vec<String>> = ident
        .external_dependencies
        .iter()
        .map(|d| vec![d.package.clone(), d.purpose.clone(), d.import_path.clone()])
        .collect();
    w.block(render_table(layout::DEPENDENCY_COLUMNS, &rows));
}

fn write_structure(w: &mut Writer, feature: &AtomicFeature) {
    w.heading(4, &layout::feature_title(feature.id));

    w.heading(5, layout::CODE_BLOCKS);
    let rows: Vec<Vec<String>> = feature
        .code_blocks
        .iter()
        .map(|b| {
            vec![
                b.name.clone(),
                b.purpose.clone(),
                b.location.file_path.clone(),
                b.location.start_line.to_string(),
                b.location.end_line.to_string(),
            ]
        })
        .collect();
    w.block(render_table(layout::CODE_BLOCK_COLUMNS, &rows));

    w.heading(5, layout::STATE_MANAGEMENT);
    let rows: Vec<Vec<String>> = feature
        .state_management
        .iter()
        .map(|s| vec![s.name.clone(), s.kind.clone(), s.description.clone()])
        .collect();
    w.block(render_table(layout::STATE_COLUMNS, &rows));

    w.heading(5, layout::EVENT_HANDLERS);
    let rows: Vec<Vec<String>> = feature
        .event_handlers
        .iter()
        .map(|h| vec![h.event.clone(), h.handler.clone(), h.description.clone()])
        .collect();
    w.block(render_table(layout::EVENT_HANDLER_COLUMNS, &rows));
}

// -- Feature evaluations ------------------------------------------------------

fn write_evaluation(w: &mut Writer, feature: Option<&AtomicFeature>, eval: &FeatureEvaluation) {
    let name = feature.map(|f| f.name.as_str());
    w.heading(3, &layout::evaluation_title(eval.feature_id, name));

    let c = &eval.completeness;
    w.heading(4, layout::COMPLETENESS);
    w.field(field::RATING, c.rating.label());
    w.field(field::PERCENTAGE, &layout::render_percent(c.percentage));
    w.field(field::ASSESSMENT, &c.assessment);
    w.heading(5, layout::CAPABILITIES);
    let capabilities: Vec<ChecklistItem> = c
        .implemented
        .iter()
        .map(|text| ChecklistItem { text: text.clone(), done: true })
        .chain(c.missing.iter().map(|text| ChecklistItem {
            text: text.clone(),
            done: false,
        }))
        .collect();
    w.block(render_checklist(&capabilities));
    w.heading(5, layout::INCOMPLETE);
    w.block(render_list(&c.incomplete));
    write_evidence(w, c.evidence.as_ref());

    let q = &eval.code_quality;
    w.heading(4, layout::CODE_QUALITY);
    w.field(field::RATING, q.rating.label());
    w.field(field::ASSESSMENT, &q.assessment);
    w.heading(5, layout::STRENGTHS);
    w.block(render_list(&q.strengths));
    w.heading(5, layout::ISSUES);
    w.block(render_list(&q.issues));
    write_evidence(w, q.evidence.as_ref());

    let d = &eval.documentation;
    w.heading(4, layout::DOCUMENTATION);
    w.field(field::RATING, d.rating.label());
    w.field(field::COVERAGE, &layout::render_percent(d.coverage_percentage));
    w.field(field::INLINE_COMMENTS, layout::render_flag(d.has_inline_comments));
    w.field(field::DOC_COMMENTS, layout::render_flag(d.has_doc_comments));
    w.field(field::EXAMPLES, layout::render_flag(d.has_examples));
    w.field(field::ASSESSMENT, &d.assessment);
    write_evidence(w, d.evidence.as_ref());

    let r = &eval.reliability;
    w.heading(4, layout::RELIABILITY);
    w.field(field::RATING, r.rating.label());
    w.field(field::INPUT_VALIDATION, layout::render_flag(r.has_input_validation));
    w.field(field::RETRY_LOGIC, layout::render_flag(r.has_retry_logic));
    w.field(field::ASSESSMENT, &r.assessment);
    w.heading(5, layout::ERROR_HANDLING);
    let patterns: Vec<ChecklistItem> = r
        .error_handling_present
        .iter()
        .map(|text| ChecklistItem { text: text.clone(), done: true })
        .chain(r.error_handling_missing.iter().map(|text| ChecklistItem {
            text: text.clone(),
            done: false,
        }))
        .collect();
    w.block(render_checklist(&patterns));
    write_evidence(w, r.evidence.as_ref());

    let p = &eval.performance;
    w.heading(4, layout::PERFORMANCE);
    w.field(field::RATING, p.rating.label());
    w.field(field::COMPLEXITY, p.complexity.label());
    w.field(field::ASSESSMENT, &p.assessment);
    w.heading(5, layout::BOTTLENECKS);
    w.block(render_list(&p.bottlenecks));
    write_evidence(w, p.evidence.as_ref());

    let i = &eval.integration;
    w.heading(4, layout::INTEGRATION);
    w.field(field::RATING, i.rating.label());
    w.field(field::FEATURE_ISOLATION, i.feature_isolation.label());
    w.field(field::ASSESSMENT, &i.assessment);
    w.heading(5, layout::DEPENDENCIES);
    w.block(render_list(&i.dependencies));
    write_evidence(w, i.evidence.as_ref());

    let m = &eval.maintenance;
    w.heading(4, layout::MAINTENANCE);
    w.field(field::RATING, m.rating.label());
    w.field(field::MODIFICATION_EASE, m.modification_ease.label());
    w.field(field::EXTENSION_POINTS, layout::render_flag(m.has_extension_points));
    w.field(field::CONFIGURABLE, layout::render_flag(m.is_configurable));
    w.field(field::TESTS, layout::render_flag(m.has_tests));
    w.field(field::ASSESSMENT, &m.assessment);
    write_evidence(w, m.evidence.as_ref());

    write_stress_collapse(w, &eval.stress_collapse);
}

fn write_stress_collapse(w: &mut Writer, stress: &StressCollapseEvaluation) {
    w.heading(4, layout::STRESS_COLLAPSE);
    w.field(field::ROBUST, layout::render_flag(stress.is_robust()));
    match stress {
        StressCollapseEvaluation::Robust { reason } => {
            w.field(field::REASON, reason);
        }
        StressCollapseEvaluation::Collapses { conditions } => {
            for (index, condition) in conditions.as_slice().iter().enumerate() {
                w.heading(5, &layout::condition_title(index));
                w.field(field::TRIGGER, &condition.trigger);
                w.field(field::THRESHOLD, &condition.threshold);
                w.field(field::EXPECTED_BEHAVIOR, &condition.expected_behavior);
                w.block(render_ordered_list(&condition.reasoning));
            }
        }
    }
}

fn write_evidence(w: &mut Writer, evidence: Option<&CodeEvidence>) {
    let Some(evidence) = evidence else {
        return;
    };
    w.heading(5, layout::EVIDENCE);
    w.field(field::FILE, &evidence.file_path);
    w.field(
        field::LINES,
        &layout::render_range(evidence.start_line, evidence.end_line),
    );
    w.block(render_fence(&evidence.language, &evidence.snippet));
}

// -- Component summary --------------------------------------------------------

fn write_summary(w: &mut Writer, summary: &ComponentSummary) {
    w.heading(2, layout::COMPONENT_SUMMARY);
    w.field(field::OVERALL_READINESS, summary.overall_readiness.label());

    w.heading(3, layout::COMPLETENESS_DISTRIBUTION);
    let rows: Vec<Vec<String>> = CompletenessRating::ALL
        .iter()
        .map(|rating| {
            vec![
                rating.label().to_string(),
                summary.completeness_counts.get(*rating).to_string(),
            ]
        })
        .collect();
    w.block(render_table(layout::DISTRIBUTION_COLUMNS, &rows));

    w.heading(3, layout::STRENGTHS);
    w.block(render_list(&summary.strengths));
    w.heading(3, layout::ISSUES);
    w.block(render_list(&summary.issues));
    w.heading(3, layout::RECOMMENDED_ACTIONS);
    w.block(render_ordered_list(&summary.recommended_actions));
}
