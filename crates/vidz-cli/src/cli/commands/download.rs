//! `vidz download` – download one URL in the foreground with a progress bar.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use vidz_core::config::VidzConfig;
use vidz_core::engine::Quality;
use vidz_core::{JobController, JobRegistry, JobState, JobStatusView};

use super::info::print_metadata;

const PROGRESS_INTERVAL_MS: u64 = 250;
const BAR_WIDTH: usize = 40;

pub async fn run_download(
    cfg: &VidzConfig,
    url: &str,
    quality: Quality,
    audio_only: bool,
) -> Result<()> {
    let controller = JobController::from_config(cfg, Arc::new(JobRegistry::new()));

    println!("Fetching video info...");
    let meta = controller
        .info(url)
        .await
        .context("could not fetch video info")?;
    print_metadata(&meta);

    let what = if audio_only {
        format!("audio only ({})", cfg.audio_codec)
    } else {
        quality.to_string()
    };
    println!();
    println!("Downloading ({}) to {}", what, cfg.output_dir.display());

    let id = controller.submit(url, quality, audio_only)?;
    let mut interval = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
    let mut previous = None;
    let status = loop {
        interval.tick().await;
        let status = controller.poll(&id)?;
        if status.is_terminal() {
            break status;
        }
        if let Some(text) = render_update(&status, previous) {
            let mut out = std::io::stdout().lock();
            write!(out, "{}", text)?;
            out.flush()?;
        }
        previous = Some(status.state);
    };

    match status.state {
        JobState::Completed => {
            println!("\r{}", progress_line(&status));
            let path = controller.retrieve_artifact(&id).await?;
            println!("Download complete!");
            println!("Saved to: {}", path.display());
            Ok(())
        }
        _ => {
            println!();
            let message = status
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            bail!("download failed: {}", message)
        }
    }
}

/// Terminal output for one poll: the redrawn bar while transferring, and a
/// `Processing...` line once when post-processing starts.
pub(crate) fn render_update(status: &JobStatusView, previous: Option<JobState>) -> Option<String> {
    match status.state {
        JobState::Transferring => Some(format!("\r{}", progress_line(status))),
        JobState::Finalizing if previous != Some(JobState::Finalizing) => {
            Some(format!("\r{}\nProcessing...\n", progress_line(status)))
        }
        _ => None,
    }
}

/// `[████░░░░]` bar, `width` cells wide.
pub(crate) fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((width as f64 * percentage.clamp(0.0, 100.0) / 100.0) as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// One status line, e.g. `[██░░] 42.0% | 1.2 MB/2.9 MB | 512.0 KB/s | ETA: 3s`.
pub(crate) fn progress_line(status: &JobStatusView) -> String {
    format!(
        "{} {:5.1}% | {}/{} | {} | ETA: {}",
        progress_bar(status.percentage, BAR_WIDTH),
        status.percentage,
        status.downloaded,
        status.total,
        status.speed.as_deref().unwrap_or("N/A"),
        status.eta.as_deref().unwrap_or("N/A"),
    )
}
