//! Shared fixtures for unit tests.
//!
//! `sample_document()` is the in-memory form of
//! `tests/fixtures/AGREEMENT.md`.

use crate::model::*;

pub const SAMPLE_MARKDOWN: &str = include_str!("../tests/fixtures/AGREEMENT.md");

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn location(file_path: &str, start_line: u32, end_line: u32) -> SourceLocation {
    SourceLocation {
        file_path: file_path.to_string(),
        start_line,
        end_line,
    }
}

pub fn sample_document() -> AgreementDocument {
    let features = vec![
        AtomicFeature {
            id: FeatureId(1),
            name: "Line splitter".to_string(),
            description: "Splits input into lines | keeps byte offsets".to_string(),
            lines_of_code: 64,
            primary_location: location("src/tokenizer/lines.rs", 10, 74),
            code_blocks: vec![CodeBlock {
                name: "split_lines".to_string(),
                purpose: "entry point".to_string(),
                location: location("src/tokenizer/lines.rs", 10, 40),
            }],
            state_management: vec![StateItem {
                name: "offset".to_string(),
                kind: "usize".to_string(),
                description: "byte position of the current line".to_string(),
            }],
            event_handlers: vec![],
        },
        AtomicFeature {
            id: FeatureId(2),
            name: "Heading detector".to_string(),
            description: "Recognizes ATX headings".to_string(),
            lines_of_code: 30,
            primary_location: location("src/tokenizer/heading.rs", 1, 31),
            code_blocks: vec![],
            state_management: vec![],
            event_handlers: vec![EventHandler {
                event: "line".to_string(),
                handler: "on_line".to_string(),
                description: "classifies one line".to_string(),
            }],
        },
    ];

    let splitter = FeatureEvaluation {
        feature_id: FeatureId(1),
        completeness: CompletenessEvaluation {
            rating: CompletenessRating::Full,
            percentage: 95,
            implemented: strings(&["LF endings", "CRLF endings"]),
            missing: strings(&["lone CR endings"]),
            incomplete: vec![],
            assessment: "Handles the common line endings.".to_string(),
            evidence: Some(CodeEvidence {
                file_path: "src/tokenizer/lines.rs".to_string(),
                start_line: 10,
                end_line: 14,
                language: "rust".to_string(),
                snippet: "pub fn split_lines(input: &str) -> Vec<Line> {\n    // # not a heading\n    input.split('\\n').map(Line::new).collect()\n}".to_string(),
            }),
        },
        code_quality: CodeQualityEvaluation {
            rating: CodeQualityRating::Good,
            strengths: strings(&["small functions"]),
            issues: strings(&["*unsafe* indexing in one place"]),
            assessment: "Readable | idiomatic".to_string(),
            evidence: None,
        },
        documentation: DocumentationEvaluation {
            rating: DocumentationRating::Basic,
            coverage_percentage: 40,
            has_inline_comments: true,
            has_doc_comments: false,
            has_examples: false,
            assessment: "Only inline comments.".to_string(),
            evidence: None,
        },
        reliability: ReliabilityEvaluation {
            rating: ReliabilityRating::High,
            error_handling_present: strings(&["bounds checks"]),
            error_handling_missing: strings(&["error on invalid UTF-8"]),
            has_input_validation: true,
            has_retry_logic: false,
            assessment: "Fails closed.".to_string(),
            evidence: None,
        },
        performance: PerformanceEvaluation {
            rating: PerformanceRating::Excellent,
            complexity: Complexity::Linear,
            bottlenecks: vec![],
            assessment: "Single pass.".to_string(),
            evidence: None,
        },
        integration: IntegrationEvaluation {
            rating: IntegrationRating::Compatible,
            feature_isolation: FeatureIsolation::LooselyCoupled,
            dependencies: strings(&["regex"]),
            assessment: "Plain function API.".to_string(),
            evidence: None,
        },
        maintenance: MaintenanceEvaluation {
            rating: MaintenanceRating::High,
            modification_ease: ModificationEase::Easy,
            has_extension_points: false,
            is_configurable: false,
            has_tests: true,
            assessment: "- small surface".to_string(),
            evidence: None,
        },
        stress_collapse: StressCollapseEvaluation::Robust {
            reason: "Input size bounded by caller".to_string(),
        },
    };

    let detector = FeatureEvaluation {
        feature_id: FeatureId(2),
        completeness: CompletenessEvaluation {
            rating: CompletenessRating::Partial,
            percentage: 60,
            implemented: strings(&["ATX headings"]),
            missing: strings(&["setext headings"]),
            incomplete: strings(&["closing hashes"]),
            assessment: "Setext form is not recognized.".to_string(),
            evidence: None,
        },
        code_quality: CodeQualityEvaluation {
            rating: CodeQualityRating::Basic,
            strengths: vec![],
            issues: strings(&["regex rebuilt per call"]),
            assessment: "Works but allocates.".to_string(),
            evidence: None,
        },
        documentation: DocumentationEvaluation {
            rating: DocumentationRating::Undocumented,
            coverage_percentage: 0,
            has_inline_comments: false,
            has_doc_comments: false,
            has_examples: false,
            assessment: String::new(),
            evidence: None,
        },
        reliability: ReliabilityEvaluation {
            rating: ReliabilityRating::Medium,
            error_handling_present: vec![],
            error_handling_missing: strings(&["no length limit"]),
            has_input_validation: false,
            has_retry_logic: false,
            assessment: "Trusts its input.".to_string(),
            evidence: None,
        },
        performance: PerformanceEvaluation {
            rating: PerformanceRating::Acceptable,
            complexity: Complexity::Quadratic,
            bottlenecks: strings(&["regex compilation in loop"]),
            assessment: "Recompiles the pattern per line.".to_string(),
            evidence: Some(CodeEvidence {
                file_path: "src/tokenizer/heading.rs".to_string(),
                start_line: 5,
                end_line: 7,
                language: "rust".to_string(),
                snippet: "let re = Regex::new(\"^#{1,6} \").unwrap();".to_string(),
            }),
        },
        integration: IntegrationEvaluation {
            rating: IntegrationRating::RequiresAdaptation,
            feature_isolation: FeatureIsolation::TightlyCoupled,
            dependencies: vec![],
            assessment: "Reads line splitter internals.".to_string(),
            evidence: None,
        },
        maintenance: MaintenanceEvaluation {
            rating: MaintenanceRating::Medium,
            modification_ease: ModificationEase::Moderate,
            has_extension_points: false,
            is_configurable: true,
            has_tests: false,
            assessment: "Config flag for max level.".to_string(),
            evidence: None,
        },
        stress_collapse: StressCollapseEvaluation::Collapses {
            conditions: CollapseConditions::new(vec![CollapseCondition {
                trigger: "very long heading lines".to_string(),
                threshold: "> 1 MB per line".to_string(),
                expected_behavior: "quadratic slowdown".to_string(),
                reasoning: strings(&["pattern recompiled per line", "no early exit"]),
            }])
            .expect("one condition"),
        },
    };

    let evaluations = vec![splitter, detector];
    AgreementDocument {
        header: Header {
            component_name: "markdown-tokenizer".to_string(),
            classification: Classification::Component,
            evaluation_date: "2025-03-14".to_string(),
            source_path: "src/tokenizer".to_string(),
            lines_of_code: 420,
        },
        feature_identification: FeatureIdentification {
            methodology: strings(&[
                "Traced public entry points from `lib.rs`",
                "Grouped helpers by the state they mutate",
            ]),
            features_table: features,
            total_features: 2,
            external_dependencies: vec![ExternalDependency {
                package: "regex".to_string(),
                purpose: "pattern matching".to_string(),
                import_path: "regex::Regex".to_string(),
            }],
        },
        component_summary: ComponentSummary {
            completeness_counts: CompletenessCounts::from_evaluations(&evaluations),
            strengths: strings(&["clear module split"]),
            issues: strings(&["setext headings missing"]),
            recommended_actions: strings(&["Support setext headings", "Cache compiled patterns"]),
            overall_readiness: Readiness::NeedsWork,
        },
        feature_evaluations: evaluations,
    }
}
