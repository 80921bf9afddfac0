//! Resume optimizer — pluggable, trait-based backend behind `POST /api/optimize`.
//!
//! `AppState` holds an `Arc<dyn ResumeOptimizer>`. Production wires in
//! `LlmResumeOptimizer`; handler tests substitute a deterministic fake.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::optimize::prompts::{OPTIMIZE_PROMPT_TEMPLATE, OPTIMIZE_SYSTEM};

#[async_trait]
pub trait ResumeOptimizer: Send + Sync {
    /// Returns the optimized resume text for the extracted resume and JD.
    async fn optimize(&self, resume_text: &str, jd_text: &str) -> Result<String, AppError>;
}

/// Single-shot LLM optimizer.
pub struct LlmResumeOptimizer(pub LlmClient);

#[async_trait]
impl ResumeOptimizer for LlmResumeOptimizer {
    async fn optimize(&self, resume_text: &str, jd_text: &str) -> Result<String, AppError> {
        let prompt = build_prompt(resume_text, jd_text);
        self.0
            .complete(&prompt, OPTIMIZE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Resume optimization failed: {e}")))
    }
}

/// Fills the optimization template. The JD is substituted first so that a
/// literal `{jd_text}` inside the resume text is left untouched.
pub fn build_prompt(resume_text: &str, jd_text: &str) -> String {
    OPTIMIZE_PROMPT_TEMPLATE
        .replace("{jd_text}", jd_text)
        .replacen("{resume_text}", resume_text, 1)
}
