//! agreement-md — canonical Markdown codec for code-evaluation agreements.
//!
//! An [`AgreementDocument`] records per-feature ratings across eight
//! evaluation dimensions. [`serialize_agreement`] renders it as the
//! canonical `AGREEMENT.md` text and [`parse_agreement`] reads that text
//! back, so that `parse_agreement(&serialize_agreement(&doc)) == Ok(doc)`.
//!
//! Both directions are pure functions over in-memory values and are safe
//! to call from any number of threads. [`validate`] is a separate,
//! optional consistency pass.

pub mod error;
pub mod grammar;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;
pub mod validate;

#[cfg(test)]
mod testing;

pub use error::ParseError;
pub use model::*;
pub use parser::parse_agreement;
pub use render::markdown::serialize_agreement;
pub use validate::{validate, ValidationIssue};
