//! `vidz info` – show metadata for a URL.

use anyhow::{Context, Result};
use std::sync::Arc;
use vidz_core::config::VidzConfig;
use vidz_core::engine::MediaMetadata;
use vidz_core::format::{format_count, format_duration};
use vidz_core::{JobController, JobRegistry};

/// Qualities listed by `vidz info`.
const LISTED_QUALITIES: usize = 5;

pub async fn run_info(cfg: &VidzConfig, url: &str) -> Result<()> {
    let controller = JobController::from_config(cfg, Arc::new(JobRegistry::new()));
    println!("Fetching video info...");
    let meta = controller
        .info(url)
        .await
        .context("could not fetch video info")?;
    print_metadata(&meta);
    println!();
    println!("Available qualities:");
    for rendition in meta.renditions.iter().take(LISTED_QUALITIES) {
        println!("  - {}", rendition.quality);
    }
    Ok(())
}

/// Title block shared with `vidz download`.
pub(super) fn print_metadata(meta: &MediaMetadata) {
    println!();
    println!("Title:    {}", meta.title);
    println!("Channel:  {}", meta.uploader);
    println!("Duration: {}", format_duration(meta.duration));
    if meta.view_count > 0 {
        println!("Views:    {}", format_count(meta.view_count));
    }
}
