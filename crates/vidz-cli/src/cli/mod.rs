//! CLI for the VidZ video downloader.

mod commands;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use vidz_core::config;
use vidz_core::engine::Quality;

use commands::{run_completions, run_download, run_info, run_serve};

/// Top-level CLI for the VidZ video downloader.
#[derive(Debug, Parser)]
#[command(name = "vidz")]
#[command(about = "VidZ: download videos and audio from video sites", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show title, channel, duration and available qualities without downloading.
    Info {
        /// Page URL of the video.
        url: String,
    },

    /// Download a video (or its audio track) with a live progress bar.
    Download {
        /// Page URL of the video.
        url: String,

        /// Output directory (default: `output_dir` from the config file).
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Video quality.
        #[arg(short, long, default_value = "best", value_parser = PossibleValuesParser::new(Quality::VIDEO_TIERS))]
        quality: String,

        /// Download audio only, re-encoded with the configured codec.
        #[arg(short, long)]
        audio_only: bool,
    },

    /// Run the HTTP service.
    Serve {
        /// Address to listen on (default: `bind_address` from the config file).
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Info { url } => run_info(&cfg, &url).await?,
            CliCommand::Download {
                url,
                output,
                quality,
                audio_only,
            } => {
                if let Some(dir) = output {
                    cfg.output_dir = dir;
                }
                run_download(&cfg, &url, Quality::parse(&quality), audio_only).await?;
            }
            CliCommand::Serve { bind } => {
                if let Some(addr) = bind {
                    cfg.bind_address = addr;
                }
                run_serve(&cfg).await?;
            }
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
