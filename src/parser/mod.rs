//! AGREEMENT.md parser — recursive descent over the heading tree.
//!
//! The parser assumes the serializer's fixed layout and is not a
//! general-purpose Markdown reader. The first structural problem aborts the
//! parse; nothing is defaulted silently.

mod dimensions;

use crate::error::{ParseError, Result};
use crate::grammar::{self, ChecklistItem, Section, Table};
use crate::layout::{self, field};
use crate::model::*;
use std::str::FromStr;

/// Parse a canonical AGREEMENT.md document.
pub fn parse_agreement(markdown: &str) -> Result<AgreementDocument> {
    let root = grammar::split_sections(markdown);
    let doc_section = root
        .child(layout::DOCUMENT_TITLE)
        .ok_or_else(|| ParseError::MissingSection {
            section: layout::DOCUMENT_TITLE.to_string(),
        })?;
    let doc = Scope::root(doc_section);

    let header = parse_header(&doc.child(layout::HEADER)?)?;
    let feature_identification =
        parse_identification(&doc.child(layout::FEATURE_IDENTIFICATION)?)?;
    let feature_evaluations = parse_evaluations(&doc.child(layout::FEATURE_EVALUATIONS)?)?;
    let component_summary = parse_summary(&doc.child(layout::COMPONENT_SUMMARY)?)?;

    tracing::debug!(
        component = %header.component_name,
        features = feature_identification.features_table.len(),
        evaluations = feature_evaluations.len(),
        "parsed agreement"
    );

    Ok(AgreementDocument {
        header,
        feature_identification,
        feature_evaluations,
        component_summary,
    })
}

// -- Scope --------------------------------------------------------------------

/// A section together with its path from the document root, used to label
/// errors.
pub(crate) struct Scope<'s, 'a> {
    section: &'s Section<'a>,
    path: String,
}

impl<'s, 'a> Scope<'s, 'a> {
    fn root(section: &'s Section<'a>) -> Self {
        Self {
            section,
            path: String::new(),
        }
    }

    fn nested(&self, section: &'s Section<'a>) -> Self {
        Self {
            section,
            path: self.join(&section.title),
        }
    }

    fn join(&self, title: &str) -> String {
        if self.path.is_empty() {
            title.to_string()
        } else {
            format!("{} > {}", self.path, title)
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn child(&self, title: &str) -> Result<Scope<'s, 'a>> {
        self.optional_child(title)
            .ok_or_else(|| ParseError::MissingSection {
                section: self.join(title),
            })
    }

    pub(crate) fn optional_child(&self, title: &str) -> Option<Scope<'s, 'a>> {
        self.section.child(title).map(|s| self.nested(s))
    }

    /// Direct children in document order.
    pub(crate) fn children(&self) -> impl Iterator<Item = Scope<'s, 'a>> + '_ {
        self.section.children.iter().map(move |s| self.nested(s))
    }

    pub(crate) fn title(&self) -> &str {
        &self.section.title
    }

    pub(crate) fn field(&self, key: &str) -> Result<String> {
        grammar::find_field(&self.section.prose(), key).ok_or_else(|| ParseError::MissingField {
            section: self.path.clone(),
            field: key.to_string(),
        })
    }

    pub(crate) fn label<T: Label>(&self, key: &str) -> Result<T> {
        let value = self.field(key)?;
        T::from_label(&value).ok_or_else(|| ParseError::UnknownEnumValue {
            section: self.path.clone(),
            kind: T::KIND,
            value,
        })
    }

    pub(crate) fn number<T: FromStr>(&self, key: &str) -> Result<T> {
        let value = self.field(key)?;
        self.decode(key, value, |v| v.parse().ok())
    }

    pub(crate) fn flag(&self, key: &str) -> Result<bool> {
        let value = self.field(key)?;
        self.decode(key, value, layout::parse_flag)
    }

    pub(crate) fn percent(&self, key: &str) -> Result<u8> {
        let value = self.field(key)?;
        self.decode(key, value, layout::parse_percent)
    }

    pub(crate) fn range(&self, key: &str) -> Result<(u32, u32)> {
        let value = self.field(key)?;
        self.decode(key, value, layout::parse_range)
    }

    fn decode<T>(&self, key: &str, value: String, f: impl FnOnce(&str) -> Option<T>) -> Result<T> {
        f(&value).ok_or_else(|| self.invalid(key, value))
    }

    pub(crate) fn invalid(&self, what: &str, value: impl Into<String>) -> ParseError {
        ParseError::InvalidValue {
            section: self.path.clone(),
            field: what.to_string(),
            value: value.into(),
        }
    }

    pub(crate) fn table(&self, columns: &[&str]) -> Result<Table> {
        grammar::parse_table(&self.path, columns, &self.section.prose())?.ok_or_else(|| {
            ParseError::MissingField {
                section: self.path.clone(),
                field: "table".to_string(),
            }
        })
    }

    pub(crate) fn list(&self) -> Result<Vec<String>> {
        grammar::parse_list(&self.path, &self.section.prose())
    }

    /// Numbered list, skipping the given field lines that share the body.
    pub(crate) fn ordered_list(&self, fields: &[&str]) -> Result<Vec<String>> {
        let lines: Vec<&str> = self
            .section
            .prose()
            .into_iter()
            .filter(|line| grammar::field_key(line).map_or(true, |key| !fields.iter().any(|f| *f == key)))
            .collect();
        grammar::parse_ordered_list(&self.path, &lines)
    }

    pub(crate) fn checklist(&self) -> Result<Vec<ChecklistItem>> {
        grammar::parse_checklist(&self.path, &self.section.prose())
    }

    pub(crate) fn fence(&self) -> Option<grammar::Fence> {
        grammar::parse_fence(&self.section.body)
    }
}

/// Parse a numeric table cell.
fn cell<T: FromStr>(scope: &Scope<'_, '_>, column: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| scope.invalid(column, value))
}

// -- Header -------------------------------------------------------------------

fn parse_header(scope: &Scope<'_, '_>) -> Result<Header> {
    Ok(Header {
        component_name: scope.field(field::COMPONENT)?,
        classification: scope.label(field::CLASSIFICATION)?,
        evaluation_date: scope.field(field::EVALUATION_DATE)?,
        source_path: scope.field(field::SOURCE_PATH)?,
        lines_of_code: scope.number(field::LINES_OF_CODE)?,
    })
}

// -- Feature identification ---------------------------------------------------

fn parse_identification(scope: &Scope<'_, '_>) -> Result<FeatureIdentification> {
    let methodology = scope.child(layout::METHODOLOGY)?.list()?;

    let features = scope.child(layout::FEATURES)?;
    let table = features.table(layout::FEATURE_COLUMNS)?;
    let total_features = features.number(field::TOTAL_FEATURES)?;

    let structure = scope.child(layout::FEATURE_STRUCTURE)?;
    let mut structure_sections = structure.children();

    let mut features_table = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let id = FeatureId(cell(&features, layout::FEATURE_COLUMNS[0], &row[0])?);
        let expected = layout::feature_title(id);
        let detail = structure_sections
            .next()
            .filter(|s| s.title() == expected)
            .ok_or_else(|| ParseError::MissingSection {
                section: structure.join(&expected),
            })?;

        tracing::trace!(feature = %id, "parsing feature structure");
        features_table.push(AtomicFeature {
            id,
            name: row[1].clone(),
            description: row[2].clone(),
            lines_of_code: cell(&features, layout::FEATURE_COLUMNS[3], &row[3])?,
            primary_location: SourceLocation {
                file_path: row[4].clone(),
                start_line: cell(&features, layout::FEATURE_COLUMNS[5], &row[5])?,
                end_line: cell(&features, layout::FEATURE_COLUMNS[6], &row[6])?,
            },
            code_blocks: parse_code_blocks(&detail.child(layout::CODE_BLOCKS)?)?,
            state_management: parse_state(&detail.child(layout::STATE_MANAGEMENT)?)?,
            event_handlers: parse_event_handlers(&detail.child(layout::EVENT_HANDLERS)?)?,
        });
    }

    if let Some(extra) = structure_sections.next() {
        return Err(structure.invalid("feature structure", extra.title()));
    }

    let deps = scope.child(layout::EXTERNAL_DEPENDENCIES)?;
    let external_dependencies = deps
        .table(layout::DEPENDENCY_COLUMNS)?
        .rows
        .iter()
        .map(|row| ExternalDependency {
            package: row[0].clone(),
            purpose: row[1].clone(),
            import_path: row[2].clone(),
        })
        .collect();

    Ok(FeatureIdentification {
        methodology,
        features_table,
        total_features,
        external_dependencies,
    })
}

fn parse_code_blocks(scope: &Scope<'_, '_>) -> Result<Vec<CodeBlock>> {
    let columns = layout::CODE_BLOCK_COLUMNS;
    scope
        .table(columns)?
        .rows
        .iter()
        .map(|row| {
            Ok(CodeBlock {
                name: row[0].clone(),
                purpose: row[1].clone(),
                location: SourceLocation {
                    file_path: row[2].clone(),
                    start_line: cell(scope, columns[3], &row[3])?,
                    end_line: cell(scope, columns[4], &row[4])?,
                },
            })
        })
        .collect()
}

fn parse_state(scope: &Scope<'_, '_>) -> Result<Vec<StateItem>> {
    Ok(scope
        .table(layout::STATE_COLUMNS)?
        .rows
        .iter()
        .map(|row| StateItem {
            name: row[0].clone(),
            kind: row[1].clone(),
            description: row[2].clone(),
        })
        .collect())
}

fn parse_event_handlers(scope: &Scope<'_, '_>) -> Result<Vec<EventHandler>> {
    Ok(scope
        .table(layout::EVENT_HANDLER_COLUMNS)?
        .rows
        .iter()
        .map(|row| EventHandler {
            event: row[0].clone(),
            handler: row[1].clone(),
            description: row[2].clone(),
        })
        .collect())
}

// -- Feature evaluations ------------------------------------------------------

fn parse_evaluations(scope: &Scope<'_, '_>) -> Result<Vec<FeatureEvaluation>> {
    scope
        .children()
        .map(|section| {
            let feature_id = layout::parse_feature_title(section.title())
                .ok_or_else(|| scope.invalid("feature heading", section.title()))?;
            tracing::trace!(feature = %feature_id, "parsing feature evaluation");
            dimensions::parse_evaluation(&section, feature_id)
        })
        .collect()
}

// -- Component summary --------------------------------------------------------

fn parse_summary(scope: &Scope<'_, '_>) -> Result<ComponentSummary> {
    let overall_readiness = scope.label(field::OVERALL_READINESS)?;

    let distribution = scope.child(layout::COMPLETENESS_DISTRIBUTION)?;
    let table = distribution.table(layout::DISTRIBUTION_COLUMNS)?;
    let mut counts = CompletenessCounts::default();
    let mut seen = [false; 4];
    for row in &table.rows {
        let rating = CompletenessRating::from_label(&row[0]).ok_or_else(|| {
            ParseError::UnknownEnumValue {
                section: distribution.path().to_string(),
                kind: CompletenessRating::KIND,
                value: row[0].clone(),
            }
        })?;
        if let Some(index) = CompletenessRating::ALL.iter().position(|r| *r == rating) {
            if seen[index] {
                return Err(distribution.invalid("duplicate row", rating.label()));
            }
            seen[index] = true;
        }
        *counts.get_mut(rating) = cell(&distribution, layout::DISTRIBUTION_COLUMNS[1], &row[1])?;
    }
    if let Some(index) = seen.iter().position(|s| !s) {
        return Err(ParseError::MissingField {
            section: distribution.path().to_string(),
            field: CompletenessRating::ALL[index].label().to_string(),
        });
    }

    Ok(ComponentSummary {
        completeness_counts: counts,
        strengths: scope.child(layout::STRENGTHS)?.list()?,
        issues: scope.child(layout::ISSUES)?.list()?,
        recommended_actions: scope.child(layout::RECOMMENDED_ACTIONS)?.ordered_list(&[])?,
        overall_readiness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
# AGREEMENT

## Header

**Component:** tokenizer

**Classification:** Component

**Evaluation Date:** 2025-03-01

**Source Path:** src/tokenizer

**Lines of Code:** 120

## Feature Identification

### Methodology

### Features

| ID | Name | Description | Lines of Code | File | Start Line | End Line |
| --- | --- | --- | --- | --- | --- | --- |

**Total Features:** 0

### Feature Structure

### External Dependencies

| Package | Purpose | Import Path |
| --- | --- | --- |

## Feature Evaluations

## Component Summary

**Overall Readiness:** Not Ready

### Completeness Distribution

| Rating | Count |
| --- | --- |
| Not Implemented | 0 |
| Partial | 0 |
| Full | 0 |
| Enterprise-Level | 0 |

### Strengths

### Issues

### Recommended Actions
";

    #[test]
    fn parse_empty_component() {
        let doc = parse_agreement(MINIMAL).unwrap();
        assert_eq!(doc.header.component_name, "tokenizer");
        assert_eq!(doc.header.classification, Classification::Component);
        assert_eq!(doc.header.lines_of_code, 120);
        assert!(doc.feature_identification.features_table.is_empty());
        assert!(doc.feature_evaluations.is_empty());
        assert_eq!(doc.component_summary.overall_readiness, Readiness::NotReady);
    }

    #[test]
    fn empty_component_is_canonical() {
        let doc = parse_agreement(MINIMAL).unwrap();
        assert_eq!(crate::render::markdown::serialize_agreement(&doc), MINIMAL);
    }

    #[test]
    fn missing_title() {
        let err = parse_agreement("## Header\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingSection {
                section: "AGREEMENT".to_string()
            }
        );
    }

    #[test]
    fn missing_component_summary() {
        let truncated = MINIMAL.split("## Component Summary").next().unwrap();
        let err = parse_agreement(truncated).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingSection {
                section: "Component Summary".to_string()
            }
        );
    }

    #[test]
    fn unknown_classification() {
        let input = MINIMAL.replace("**Classification:** Component", "**Classification:** Library");
        let err = parse_agreement(&input).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownEnumValue {
                section: "Header".to_string(),
                kind: "classification",
                value: "Library".to_string(),
            }
        );
    }

    #[test]
    fn missing_field() {
        let input = MINIMAL.replace("**Source Path:** src/tokenizer\n", "");
        let err = parse_agreement(&input).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                section: "Header".to_string(),
                field: "Source Path".to_string(),
            }
        );
    }

    #[test]
    fn invalid_number() {
        let input = MINIMAL.replace("**Lines of Code:** 120", "**Lines of Code:** many");
        let err = parse_agreement(&input).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref value, .. } if value == "many"));
    }

    #[test]
    fn distribution_row_missing() {
        let input = MINIMAL.replace("| Partial | 0 |\n", "");
        let err = parse_agreement(&input).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                section: "Component Summary > Completeness Distribution".to_string(),
                field: "Partial".to_string(),
            }
        );
    }

    #[test]
    fn feature_row_without_structure() {
        let input = MINIMAL.replace(
            "| --- | --- | --- | --- | --- | --- | --- |\n",
            "| --- | --- | --- | --- | --- | --- | --- |\n| 1 | lex | split input | 40 | src/lex.rs | 1 | 40 |\n",
        );
        let err = parse_agreement(&input).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingSection {
                section: "Feature Identification > Feature Structure > Feature 1".to_string(),
            }
        );
    }

    #[test]
    fn features_table_column_mismatch() {
        let input = MINIMAL.replace(
            "| --- | --- | --- | --- | --- | --- | --- |\n",
            "| --- | --- | --- | --- | --- | --- | --- |\n| 1 | lex |\n",
        );
        let err = parse_agreement(&input).unwrap_err();
        assert!(matches!(
            err,
            ParseError::TableColumnMismatch { expected: 7, found: 2, .. }
        ));
    }

    #[test]
    fn extra_feature_structure_is_rejected() {
        let input = MINIMAL.replace(
            "### Feature Structure\n",
            "### Feature Structure\n\n#### Feature 4\n",
        );
        assert_eq!(
            parse_agreement(&input).unwrap_err(),
            ParseError::InvalidValue {
                section: "Feature Identification > Feature Structure".to_string(),
                field: "feature structure".to_string(),
                value: "Feature 4".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_distribution_row() {
        let input = MINIMAL.replace("| Full | 0 |\n", "| Full | 0 |\n| Full | 3 |\n");
        assert_eq!(
            parse_agreement(&input).unwrap_err(),
            ParseError::InvalidValue {
                section: "Component Summary > Completeness Distribution".to_string(),
                field: "duplicate row".to_string(),
                value: "Full".to_string(),
            }
        );
    }

    #[test]
    fn reordered_columns_are_rejected() {
        let input = MINIMAL.replace("| Rating | Count |", "| Count | Rating |");
        assert_eq!(
            parse_agreement(&input).unwrap_err(),
            ParseError::InvalidValue {
                section: "Component Summary > Completeness Distribution".to_string(),
                field: "column Rating".to_string(),
                value: "Count".to_string(),
            }
        );
    }
}
