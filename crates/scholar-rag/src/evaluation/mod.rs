//! Evaluation harness: retrieval strategies, prompt templates, and
//! end-to-end system quality

pub mod prompts;
pub mod retrieval;
pub mod system;

pub use prompts::{PromptEvalReport, PromptEvaluator};
pub use retrieval::{RetrievalEvalReport, RetrievalEvaluator};
pub use system::{SystemEvalReport, SystemEvaluator};

use std::path::Path;

use crate::error::Result;

/// Write an evaluation report as pretty-printed JSON
pub fn save_report<T: serde::Serialize>(report: &T, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path.as_ref(), json)?;
    tracing::info!("Results saved to: {}", path.as_ref().display());
    Ok(())
}
