pub mod config;
pub mod logging;

pub mod controller;
pub mod engine;
pub mod error;
pub mod format;
pub mod progress;
pub mod registry;

pub use controller::{JobController, JobStatusView};
pub use error::{Error, Result};
pub use registry::{JobId, JobRegistry, JobState};
