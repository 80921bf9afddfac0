//! Client side of the resume optimizer: a two-file form that posts to
//! `/api/optimize` and shows the returned text.

pub mod controller;
pub mod error;
pub mod transport;
pub mod upload;
pub mod view;

pub use controller::{Alert, FormController, FormState, SubmitOutcome};
pub use error::ClientError;
pub use transport::{HttpTransport, OptimizeTransport};
pub use upload::SelectedFile;
pub use view::FormView;
