//! CLI command handlers, one file per command.

mod completions;
mod download;
mod info;
mod serve;

pub use completions::run_completions;
pub use download::run_download;
pub use info::run_info;
pub use serve::run_serve;

#[cfg(test)]
pub(crate) use download::{progress_bar, progress_line, render_update};
