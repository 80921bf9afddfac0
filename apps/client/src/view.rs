use std::fmt;

use crate::controller::FormState;

pub const SUBMIT_LABEL: &str = "Optimize Resume";
pub const SUBMIT_LABEL_LOADING: &str = "Optimizing...";
pub const RESULT_HEADING: &str = "Optimized Resume";

/// What the form shows for a given state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub submit_label: &'static str,
    /// `None` hides the result pane entirely.
    pub result_pane: Option<String>,
}

impl FormView {
    pub fn from_state(state: &FormState) -> Self {
        Self {
            submit_label: if state.loading {
                SUBMIT_LABEL_LOADING
            } else {
                SUBMIT_LABEL
            },
            result_pane: (!state.result.is_empty()).then(|| state.result.clone()),
        }
    }
}

impl fmt::Display for FormView {
    /// Terminal rendering: the button, then the result pane with its text untouched.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} ]", self.submit_label)?;
        if let Some(result) = &self.result_pane {
            write!(f, "\n\n{RESULT_HEADING}\n{}\n{result}", "-".repeat(RESULT_HEADING.len()))?;
        }
        Ok(())
    }
}
