//! JSON renderer — structured output for tooling integration.
//!
//! Serializes the AgreementDocument model directly, with enum values
//! written as their canonical labels.

use crate::model::AgreementDocument;
use crate::render::Renderer;
use anyhow::{Context, Result};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, doc: &AgreementDocument) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(doc).context("failed to serialize agreement as JSON")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
