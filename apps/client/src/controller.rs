//! Form controller — owns the four form slots and the submit flow.
//!
//! State sits behind a `std::sync::Mutex` that is never held across the
//! network await, so the controller can be shared (`Arc`) between the UI
//! loop and whatever drives `submit()`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::transport::OptimizeTransport;
use crate::upload::SelectedFile;
use crate::view::FormView;

/// Shown (blocking) when submit is pressed with a slot still empty.
pub const MISSING_FILES_ALERT: &str = "Please upload both the resume and job description files.";
/// Stored as the result when the request fails for any reason.
pub const SUBMIT_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Blocking user-facing notice, e.g. a modal dialog or a stderr line.
pub trait Alert: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub resume: Option<SelectedFile>,
    pub job_description: Option<SelectedFile>,
    /// Last optimized text or the error message; empty until the first response.
    pub result: String,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A slot was empty; the alert fired and nothing was sent.
    MissingFiles,
    Optimized,
    Failed,
}

pub struct FormController {
    transport: Arc<dyn OptimizeTransport>,
    alert: Arc<dyn Alert>,
    state: Mutex<FormState>,
}

impl FormController {
    pub fn new(transport: Arc<dyn OptimizeTransport>, alert: Arc<dyn Alert>) -> Self {
        Self {
            transport,
            alert,
            state: Mutex::new(FormState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select_resume(&self, file: SelectedFile) {
        debug!(file = %file.file_name, "Resume selected");
        self.lock().resume = Some(file);
    }

    pub fn select_job_description(&self, file: SelectedFile) {
        debug!(file = %file.file_name, "Job description selected");
        self.lock().job_description = Some(file);
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn result(&self) -> String {
        self.lock().result.clone()
    }

    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    pub fn view(&self) -> FormView {
        FormView::from_state(&self.lock())
    }

    /// Validates the slots, sends one request and stores its outcome.
    ///
    /// Never returns an error: failures end up in `result` as
    /// [`SUBMIT_ERROR_MESSAGE`] and are logged. Overlapping submits each send
    /// their own request; whichever settles last owns `result`.
    pub async fn submit(&self) -> SubmitOutcome {
        let files = {
            let mut state = self.lock();
            match (state.resume.clone(), state.job_description.clone()) {
                (Some(resume), Some(jd)) => {
                    if state.loading {
                        debug!("Submitting while another request is still in flight");
                    }
                    state.loading = true;
                    Some((resume, jd))
                }
                _ => None,
            }
        };

        let Some((resume, jd)) = files else {
            self.alert.alert(MISSING_FILES_ALERT);
            return SubmitOutcome::MissingFiles;
        };

        let _loading = LoadingGuard(self);

        match self.transport.optimize(&resume, &jd).await {
            Ok(text) => {
                info!(chars = text.len(), "Optimization succeeded");
                self.lock().result = text;
                SubmitOutcome::Optimized
            }
            Err(e) => {
                error!("Optimization request failed: {e}");
                self.lock().result = SUBMIT_ERROR_MESSAGE.to_string();
                SubmitOutcome::Failed
            }
        }
    }
}

/// Clears the loading flag when the request settles, including when the
/// submit future is dropped mid-flight. With overlapping submits the first
/// one to settle clears it while the other is still in flight.
struct LoadingGuard<'a>(&'a FormController);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().loading = false;
    }
}
