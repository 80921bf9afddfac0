use std::sync::Arc;

use crate::config::Config;
use crate::optimize::optimizer::ResumeOptimizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable optimizer. Production uses `LlmResumeOptimizer`; tests swap in fakes.
    pub optimizer: Arc<dyn ResumeOptimizer>,
}
