//! Structured parse failures.
//!
//! Every variant names the section path it was raised in (for example
//! `Feature Evaluations > Feature 2 > Reliability`) and carries the raw
//! offending text where there is one.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing section: {section}")]
    MissingSection { section: String },

    #[error("{section}: missing field `{field}`")]
    MissingField { section: String, field: String },

    #[error("{section}: table row has {found} columns, expected {expected}: {row}")]
    TableColumnMismatch {
        section: String,
        expected: usize,
        found: usize,
        row: String,
    },

    #[error("{section}: unknown {kind} `{value}`")]
    UnknownEnumValue {
        section: String,
        kind: &'static str,
        value: String,
    },

    #[error("{section}: malformed checklist item: {line}")]
    MalformedChecklistItem { section: String, line: String },

    #[error("{section}: invalid {field} `{value}`")]
    InvalidValue {
        section: String,
        field: String,
        value: String,
    },
}

impl ParseError {
    /// Section path the error was raised in.
    pub fn section(&self) -> &str {
        match self {
            Self::MissingSection { section }
            | Self::MissingField { section, .. }
            | Self::TableColumnMismatch { section, .. }
            | Self::UnknownEnumValue { section, .. }
            | Self::MalformedChecklistItem { section, .. }
            | Self::InvalidValue { section, .. } => section,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
