use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/vidz/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidzConfig {
    /// Directory finished downloads are written to (created on demand).
    pub output_dir: PathBuf,
    /// Address the HTTP service binds to.
    pub bind_address: String,
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: String,
    /// Codec for audio-only downloads (re-encoded after transfer).
    pub audio_codec: String,
    /// Target quality passed to the audio re-encode, e.g. "192K".
    pub audio_quality: String,
    /// Skip TLS certificate validation in the engine.
    #[serde(default)]
    pub no_check_certificate: bool,
    /// Resolve metadata before each transfer so the title shows while downloading.
    #[serde(default)]
    pub prefetch_metadata: bool,
    /// Seconds a finished or failed job stays pollable before eviction.
    pub job_ttl_secs: u64,
    /// How often the HTTP service sweeps expired jobs.
    pub sweep_interval_secs: u64,
    /// Optional directory of static web assets served at `/`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for VidzConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            bind_address: "0.0.0.0:5000".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            audio_codec: "mp3".to_string(),
            audio_quality: "192K".to_string(),
            no_check_certificate: true,
            prefetch_metadata: false,
            job_ttl_secs: 3600,
            sweep_interval_secs: 60,
            static_dir: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidz")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VidzConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VidzConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VidzConfig = toml::from_str(&data)?;
    Ok(cfg)
}
