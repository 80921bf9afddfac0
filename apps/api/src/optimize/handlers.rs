//! Axum route handler for the Optimize API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::extract::{extract_or_describe, UploadedDocument};
use crate::state::AppState;

/// Multipart part carrying the resume.
pub const RESUME_FIELD: &str = "resume";
/// Multipart part carrying the job description.
pub const JD_FIELD: &str = "jd";

#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub optimized_resume: String,
}

/// POST /api/optimize
///
/// Accepts `resume` and `jd` file parts, extracts text from both and returns
/// the optimizer's rewrite of the resume.
pub async fn handle_optimize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OptimizeResponse>, AppError> {
    let mut resume: Option<UploadedDocument> = None;
    let mut jd: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) => resume = Some(read_document(field, RESUME_FIELD).await?),
            Some(JD_FIELD) => jd = Some(read_document(field, JD_FIELD).await?),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let resume = resume.ok_or_else(|| missing_field(RESUME_FIELD))?;
    let jd = jd.ok_or_else(|| missing_field(JD_FIELD))?;

    info!(
        resume = %resume.file_name,
        resume_bytes = resume.content.len(),
        jd = %jd.file_name,
        jd_bytes = jd.content.len(),
        "Optimizing resume"
    );

    let (resume_text, jd_text) =
        tokio::join!(extract_or_describe(&resume), extract_or_describe(&jd));

    let optimized_resume = state.optimizer.optimize(&resume_text, &jd_text).await?;

    Ok(Json(OptimizeResponse { optimized_resume }))
}

async fn read_document(field: Field<'_>, fallback_name: &str) -> Result<UploadedDocument, AppError> {
    let file_name = field
        .file_name()
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name)
        .to_string();
    let content = field.bytes().await?;
    Ok(UploadedDocument::new(file_name, content))
}

fn missing_field(name: &str) -> AppError {
    AppError::Validation(format!("Missing multipart file field '{name}'"))
}
