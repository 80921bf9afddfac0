//! The single network call the form makes: `POST /api/optimize`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::ClientError;
use crate::upload::SelectedFile;

/// Endpoint path, relative to the server base URL.
pub const OPTIMIZE_PATH: &str = "/api/optimize";
/// Multipart part carrying the resume.
pub const RESUME_PART: &str = "resume";
/// Multipart part carrying the job description.
pub const JD_PART: &str = "jd";

/// Sends both files and returns the optimized resume text.
/// Carried by the controller as `Arc<dyn OptimizeTransport>`.
#[async_trait]
pub trait OptimizeTransport: Send + Sync {
    async fn optimize(
        &self,
        resume: &SelectedFile,
        job_description: &SelectedFile,
    ) -> Result<String, ClientError>;
}

#[derive(Debug, Deserialize)]
struct OptimizeResponse {
    optimized_resume: String,
}

/// reqwest-backed transport. No timeout is configured: the request runs until
/// the server or the connection settles it.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), OPTIMIZE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn file_part(file: &SelectedFile) -> Result<Part, ClientError> {
    Ok(Part::bytes(file.content.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(file.mime_type())?)
}

#[async_trait]
impl OptimizeTransport for HttpTransport {
    async fn optimize(
        &self,
        resume: &SelectedFile,
        job_description: &SelectedFile,
    ) -> Result<String, ClientError> {
        let form = Form::new()
            .part(RESUME_PART, file_part(resume)?)
            .part(JD_PART, file_part(job_description)?);

        debug!(endpoint = %self.endpoint, "Submitting optimization request");

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        trace!("Response status: {}", status);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OptimizeResponse = serde_json::from_str(&body)?;
        Ok(parsed.optimized_resume)
    }
}
