//! Data model for an evaluation agreement — format-agnostic.
//!
//! Features and their evaluations are correlated by [`FeatureId`] and array
//! position; evaluations never embed a copy of the feature they rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed set of values with one canonical label each.
///
/// The label table is the single source of truth for both the serializer
/// and the parser; lookup is an exact string match.
pub trait Label: Sized + Copy + 'static {
    /// Human-readable name of the value set, used in error messages.
    const KIND: &'static str;
    /// Every member, in canonical order.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == text)
    }
}

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Label for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

label_enum! {
    /// Whether the evaluated unit is a standalone component or a bundle of features.
    Classification, "classification" {
        Component => "Component",
        FeaturePackage => "Feature Package",
    }
}

label_enum! {
    CompletenessRating, "completeness rating" {
        NotImplemented => "Not Implemented",
        Partial => "Partial",
        Full => "Full",
        EnterpriseLevel => "Enterprise-Level",
    }
}

label_enum! {
    CodeQualityRating, "code quality rating" {
        Poor => "Poor",
        Basic => "Basic",
        Good => "Good",
        Excellent => "Excellent",
    }
}

label_enum! {
    DocumentationRating, "documentation rating" {
        Undocumented => "None",
        Basic => "Basic",
        Good => "Good",
        Excellent => "Excellent",
    }
}

label_enum! {
    ReliabilityRating, "reliability rating" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        EnterpriseLevel => "Enterprise-Level",
    }
}

label_enum! {
    PerformanceRating, "performance rating" {
        Poor => "Poor",
        Acceptable => "Acceptable",
        Good => "Good",
        Excellent => "Excellent",
    }
}

label_enum! {
    /// Asymptotic cost of the feature's hot path.
    Complexity, "complexity" {
        Constant => "O(1)",
        Logarithmic => "O(log n)",
        Linear => "O(n)",
        Linearithmic => "O(n log n)",
        Quadratic => "O(n^2)",
        Exponential => "O(2^n)",
    }
}

label_enum! {
    IntegrationRating, "integration rating" {
        Incompatible => "Incompatible",
        RequiresAdaptation => "Requires Adaptation",
        Compatible => "Compatible",
        Seamless => "Seamless",
    }
}

label_enum! {
    FeatureIsolation, "feature isolation" {
        Isolated => "Isolated",
        LooselyCoupled => "Loosely Coupled",
        TightlyCoupled => "Tightly Coupled",
    }
}

label_enum! {
    MaintenanceRating, "maintenance rating" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

label_enum! {
    ModificationEase, "modification ease" {
        Easy => "Easy",
        Moderate => "Moderate",
        Difficult => "Difficult",
    }
}

label_enum! {
    /// Overall verdict for the whole component.
    Readiness, "readiness" {
        NotReady => "Not Ready",
        NeedsWork => "Needs Work",
        ProductionReady => "Production Ready",
        EnterpriseReady => "Enterprise Ready",
    }
}

/// Complete agreement for one evaluated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementDocument {
    pub header: Header,
    pub feature_identification: FeatureIdentification,
    /// One entry per feature in `feature_identification.features_table`,
    /// in the same order.
    pub feature_evaluations: Vec<FeatureEvaluation>,
    pub component_summary: ComponentSummary,
}

impl AgreementDocument {
    /// Look up a feature by id.
    pub fn feature(&self, id: FeatureId) -> Option<&AtomicFeature> {
        self.feature_identification
            .features_table
            .iter()
            .find(|f| f.id == id)
    }

    /// Pair each evaluation with the feature it rates.
    ///
    /// Evaluations whose id has no entry in the features table are paired
    /// with `None`.
    pub fn evaluations(&self) -> impl Iterator<Item = (Option<&AtomicFeature>, &FeatureEvaluation)> {
        self.feature_evaluations
            .iter()
            .enumerate()
            .map(move |(index, eval)| {
                // Positional match first, id lookup as fallback
                let positional = self
                    .feature_identification
                    .features_table
                    .get(index)
                    .filter(|f| f.id == eval.feature_id);
                (positional.or_else(|| self.feature(eval.feature_id)), eval)
            })
    }
}

/// Identity of the evaluated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub component_name: String,
    pub classification: Classification,
    /// Free-form date string as supplied by the evaluation run.
    pub evaluation_date: String,
    pub source_path: String,
    pub lines_of_code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureIdentification {
    /// How features were identified, one note per entry.
    pub methodology: Vec<String>,
    pub features_table: Vec<AtomicFeature>,
    pub total_features: u32,
    pub external_dependencies: Vec<ExternalDependency>,
}

/// Positive feature id, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u32);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Smallest independently describable unit of functionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicFeature {
    pub id: FeatureId,
    pub name: String,
    pub description: String,
    pub lines_of_code: u32,
    pub primary_location: SourceLocation,
    pub code_blocks: Vec<CodeBlock>,
    pub state_management: Vec<StateItem>,
    pub event_handlers: Vec<EventHandler>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub name: String,
    pub purpose: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateItem {
    pub name: String,
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandler {
    pub event: String,
    pub handler: String,
    pub description: String,
}

/// Source citation grounding a rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEvidence {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub language: String,
    pub snippet: String,
}

/// Third-party code a feature relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependency {
    pub package: String,
    pub purpose: String,
    pub import_path: String,
}

/// All eight dimension evaluations for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEvaluation {
    pub feature_id: FeatureId,
    pub completeness: CompletenessEvaluation,
    pub code_quality: CodeQualityEvaluation,
    pub documentation: DocumentationEvaluation,
    pub reliability: ReliabilityEvaluation,
    pub performance: PerformanceEvaluation,
    pub integration: IntegrationEvaluation,
    pub maintenance: MaintenanceEvaluation,
    pub stress_collapse: StressCollapseEvaluation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessEvaluation {
    pub rating: CompletenessRating,
    pub percentage: u8,
    pub implemented: Vec<String>,
    pub missing: Vec<String>,
    pub incomplete: Vec<String>,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeQualityEvaluation {
    pub rating: CodeQualityRating,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationEvaluation {
    pub rating: DocumentationRating,
    pub coverage_percentage: u8,
    pub has_inline_comments: bool,
    pub has_doc_comments: bool,
    pub has_examples: bool,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliabilityEvaluation {
    pub rating: ReliabilityRating,
    /// Error-handling patterns found in the code
    pub error_handling_present: Vec<String>,
    /// Error-handling patterns the feature should have but lacks
    pub error_handling_missing: Vec<String>,
    pub has_input_validation: bool,
    pub has_retry_logic: bool,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceEvaluation {
    pub rating: PerformanceRating,
    pub complexity: Complexity,
    pub bottlenecks: Vec<String>,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationEvaluation {
    pub rating: IntegrationRating,
    pub feature_isolation: FeatureIsolation,
    pub dependencies: Vec<String>,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceEvaluation {
    pub rating: MaintenanceRating,
    pub modification_ease: ModificationEase,
    pub has_extension_points: bool,
    pub is_configurable: bool,
    pub has_tests: bool,
    pub assessment: String,
    pub evidence: Option<CodeEvidence>,
}

/// How a feature behaves under load or hostile input.
///
/// A robust feature has no collapse conditions; a fragile one has at least
/// one. The two cases cannot be mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StressCollapseEvaluation {
    Robust { reason: String },
    Collapses { conditions: CollapseConditions },
}

impl StressCollapseEvaluation {
    pub fn is_robust(&self) -> bool {
        matches!(self, Self::Robust { .. })
    }

    /// Collapse conditions; empty for a robust feature.
    pub fn conditions(&self) -> &[CollapseCondition] {
        match self {
            Self::Robust { .. } => &[],
            Self::Collapses { conditions } => conditions.as_slice(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseCondition {
    /// What drives the feature towards failure
    pub trigger: String,
    pub threshold: String,
    pub expected_behavior: String,
    /// Reasoning steps, in order
    pub reasoning: Vec<String>,
}

/// Non-empty list of collapse conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CollapseCondition>", into = "Vec<CollapseCondition>")]
pub struct CollapseConditions(Vec<CollapseCondition>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a collapsing feature needs at least one collapse condition")]
pub struct EmptyConditions;

impl CollapseConditions {
    pub fn new(conditions: Vec<CollapseCondition>) -> Result<Self, EmptyConditions> {
        if conditions.is_empty() {
            return Err(EmptyConditions);
        }
        Ok(Self(conditions))
    }

    pub fn as_slice(&self) -> &[CollapseCondition] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<CollapseCondition>> for CollapseConditions {
    type Error = EmptyConditions;

    fn try_from(conditions: Vec<CollapseCondition>) -> Result<Self, Self::Error> {
        Self::new(conditions)
    }
}

impl From<CollapseConditions> for Vec<CollapseCondition> {
    fn from(conditions: CollapseConditions) -> Self {
        conditions.0
    }
}

/// Aggregate statistics for the whole component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub completeness_counts: CompletenessCounts,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub overall_readiness: Readiness,
}

/// Number of features per completeness rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessCounts {
    pub not_implemented: u32,
    pub partial: u32,
    pub full: u32,
    pub enterprise_level: u32,
}

impl CompletenessCounts {
    pub fn from_evaluations(evaluations: &[FeatureEvaluation]) -> Self {
        let mut counts = Self::default();
        for eval in evaluations {
            *counts.get_mut(eval.completeness.rating) += 1;
        }
        counts
    }

    pub fn get(&self, rating: CompletenessRating) -> u32 {
        match rating {
            CompletenessRating::NotImplemented => self.not_implemented,
            CompletenessRating::Partial => self.partial,
            CompletenessRating::Full => self.full,
            CompletenessRating::EnterpriseLevel => self.enterprise_level,
        }
    }

    pub fn get_mut(&mut self, rating: CompletenessRating) -> &mut u32 {
        match rating {
            CompletenessRating::NotImplemented => &mut self.not_implemented,
            CompletenessRating::Partial => &mut self.partial,
            CompletenessRating::Full => &mut self.full,
            CompletenessRating::EnterpriseLevel => &mut self.enterprise_level,
        }
    }

    pub fn total(&self) -> u64 {
        CompletenessRating::ALL
            .iter()
            .map(|r| u64::from(self.get(*r)))
            .sum()
    }
}
