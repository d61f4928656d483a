//! `vidz serve` – run the HTTP service.

use anyhow::Result;
use vidz_core::config::VidzConfig;

pub async fn run_serve(cfg: &VidzConfig) -> Result<()> {
    println!("VidZ web server on http://{}", cfg.bind_address);
    vidz_server::serve(cfg).await
}
