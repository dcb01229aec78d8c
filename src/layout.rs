//! Fixed layout of the canonical document: section titles, field keys,
//! table columns and scalar encodings.

use crate::model::FeatureId;

pub const DOCUMENT_TITLE: &str = "AGREEMENT";

// Top-level sections, in emission order
pub const HEADER: &str = "Header";
pub const FEATURE_IDENTIFICATION: &str = "Feature Identification";
pub const FEATURE_EVALUATIONS: &str = "Feature Evaluations";
pub const COMPONENT_SUMMARY: &str = "Component Summary";

// Feature Identification
pub const METHODOLOGY: &str = "Methodology";
pub const FEATURES: &str = "Features";
pub const FEATURE_STRUCTURE: &str = "Feature Structure";
pub const CODE_BLOCKS: &str = "Code Blocks";
pub const STATE_MANAGEMENT: &str = "State Management";
pub const EVENT_HANDLERS: &str = "Event Handlers";
pub const EXTERNAL_DEPENDENCIES: &str = "External Dependencies";

// Dimensions
pub const COMPLETENESS: &str = "Completeness";
pub const CODE_QUALITY: &str = "Code Quality";
pub const DOCUMENTATION: &str = "Documentation";
pub const RELIABILITY: &str = "Reliability";
pub const PERFORMANCE: &str = "Performance";
pub const INTEGRATION: &str = "Integration";
pub const MAINTENANCE: &str = "Maintenance";
pub const STRESS_COLLAPSE: &str = "Stress Collapse";

// Dimension sub-sections
pub const CAPABILITIES: &str = "Capabilities";
pub const INCOMPLETE: &str = "Incomplete";
pub const STRENGTHS: &str = "Strengths";
pub const ISSUES: &str = "Issues";
pub const ERROR_HANDLING: &str = "Error Handling";
pub const BOTTLENECKS: &str = "Bottlenecks";
pub const DEPENDENCIES: &str = "Dependencies";
pub const EVIDENCE: &str = "Evidence";

// Component Summary
pub const COMPLETENESS_DISTRIBUTION: &str = "Completeness Distribution";
pub const RECOMMENDED_ACTIONS: &str = "Recommended Actions";

/// `**Key:**` field names.
pub mod field {
    pub const COMPONENT: &str = "Component";
    pub const CLASSIFICATION: &str = "Classification";
    pub const EVALUATION_DATE: &str = "Evaluation Date";
    pub const SOURCE_PATH: &str = "Source Path";
    pub const LINES_OF_CODE: &str = "Lines of Code";
    pub const TOTAL_FEATURES: &str = "Total Features";

    pub const RATING: &str = "Rating";
    pub const ASSESSMENT: &str = "Assessment";
    pub const PERCENTAGE: &str = "Percentage";
    pub const COVERAGE: &str = "Coverage";
    pub const INLINE_COMMENTS: &str = "Inline Comments";
    pub const DOC_COMMENTS: &str = "Doc Comments";
    pub const EXAMPLES: &str = "Examples";
    pub const INPUT_VALIDATION: &str = "Input Validation";
    pub const RETRY_LOGIC: &str = "Retry Logic";
    pub const COMPLEXITY: &str = "Complexity";
    pub const FEATURE_ISOLATION: &str = "Feature Isolation";
    pub const MODIFICATION_EASE: &str = "Modification Ease";
    pub const EXTENSION_POINTS: &str = "Extension Points";
    pub const CONFIGURABLE: &str = "Configurable";
    pub const TESTS: &str = "Tests";

    pub const ROBUST: &str = "Robust";
    pub const REASON: &str = "Reason";
    pub const TRIGGER: &str = "Trigger";
    pub const THRESHOLD: &str = "Threshold";
    pub const EXPECTED_BEHAVIOR: &str = "Expected Behavior";

    pub const FILE: &str = "File";
    pub const LINES: &str = "Lines";

    pub const OVERALL_READINESS: &str = "Overall Readiness";
}

pub const FEATURE_COLUMNS: &[&str] = &[
    "ID",
    "Name",
    "Description",
    "Lines of Code",
    "File",
    "Start Line",
    "End Line",
];
pub const CODE_BLOCK_COLUMNS: &[&str] = &["Name", "Purpose", "File", "Start Line", "End Line"];
pub const STATE_COLUMNS: &[&str] = &["Name", "Kind", "Description"];
pub const EVENT_HANDLER_COLUMNS: &[&str] = &["Event", "Handler", "Description"];
pub const DEPENDENCY_COLUMNS: &[&str] = &["Package", "Purpose", "Import Path"];
pub const DISTRIBUTION_COLUMNS: &[&str] = &["Rating", "Count"];

const FEATURE_PREFIX: &str = "Feature ";
const CONDITION_PREFIX: &str = "Condition ";

/// `Feature 3`
pub fn feature_title(id: FeatureId) -> String {
    format!("{}{}", FEATURE_PREFIX, id)
}

/// `Feature 3: Name`, or `Feature 3` when the name is unknown.
pub fn evaluation_title(id: FeatureId, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{}{}: {}", FEATURE_PREFIX, id, name),
        None => feature_title(id),
    }
}

/// Feature id from a `Feature <id>` or `Feature <id>: <name>` heading.
pub fn parse_feature_title(title: &str) -> Option<FeatureId> {
    let rest = title.strip_prefix(FEATURE_PREFIX)?;
    let digits = match rest.split_once(':') {
        Some((digits, _)) => digits,
        None => rest,
    };
    digits.parse().ok().map(FeatureId)
}

/// `Condition 1`, numbered from one.
pub fn condition_title(index: usize) -> String {
    format!("{}{}", CONDITION_PREFIX, index + 1)
}

pub fn is_condition_title(title: &str) -> bool {
    title
        .strip_prefix(CONDITION_PREFIX)
        .map_or(false, |n| n.parse::<usize>().is_ok())
}

pub fn render_flag(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

pub fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "Yes" => Some(true),
        "No" => Some(false),
        _ => None,
    }
}

pub fn render_percent(value: u8) -> String {
    format!("{}%", value)
}

pub fn parse_percent(text: &str) -> Option<u8> {
    text.strip_suffix('%')?.parse().ok()
}

/// `start-end`
pub fn render_range(start: u32, end: u32) -> String {
    format!("{}-{}", start, end)
}

pub fn parse_range(text: &str) -> Option<(u32, u32)> {
    let (start, end) = text.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}
