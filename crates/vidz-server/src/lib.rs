//! VidZ HTTP service: JSON endpoints over the job controller, plus artifact
//! delivery and an optional static front-end.

pub mod error;
pub mod routes;
pub mod server;
mod sweeper;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, serve, AppState};
