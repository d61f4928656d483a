//! Extraction engine adapter.
//!
//! The engine is an external collaborator that turns a page URL into stream
//! metadata and performs the actual transfer (plus optional audio re-encode).
//! This module defines the seam: the [`Engine`] trait, the raw events it emits
//! while fetching, and the format-selector mapping from quality tiers.

mod selector;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod ytdlp;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::error::Result;

pub use selector::{format_selector, Quality};
pub use ytdlp::YtDlp;

/// Raw byte-progress sample as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    /// Engine's guess when the exact size is unknown (fragmented streams).
    pub total_bytes_estimate: Option<u64>,
    pub speed: Option<f64>,
    pub eta: Option<u64>,
    pub filename: Option<PathBuf>,
}

/// Event emitted by [`Engine::fetch`]. This is the only channel through which
/// transfer progress is observable.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Downloading(RawProgress),
    /// Byte transfer of one stream finished; post-processing may still follow.
    Finished { filename: PathBuf },
}

/// One distinct vertical resolution offered by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendition {
    pub quality: String,
    pub height: u32,
    pub ext: String,
}

/// Result of [`Engine::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaMetadata {
    pub title: String,
    pub uploader: String,
    /// Seconds; 0 when unknown.
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub view_count: u64,
    pub url: String,
    /// Sorted by height, highest first.
    #[serde(rename = "formats")]
    pub renditions: Vec<Rendition>,
}

/// Completed transfer: where the file landed and what the engine called it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRef {
    pub path: PathBuf,
    pub title: String,
}

/// Post-transfer audio re-encode settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: String,
    pub quality: String,
}

/// Per-process fetch settings shared by every job.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub output_dir: PathBuf,
    pub audio_codec: String,
    pub audio_quality: String,
}

impl FetchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            audio_codec: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }

    pub fn with_audio(mut self, codec: impl Into<String>, quality: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self.audio_quality = quality.into();
        self
    }
}

/// Everything the engine needs to perform one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    /// Engine-native format selector, see [`format_selector`].
    pub selector: String,
    pub output_dir: PathBuf,
    /// Set when only the audio track is wanted.
    pub audio: Option<AudioExtraction>,
}

impl FetchRequest {
    pub fn new(url: &str, quality: Quality, audio_only: bool, options: &FetchOptions) -> Self {
        Self {
            url: url.to_string(),
            selector: format_selector(quality, audio_only),
            output_dir: options.output_dir.clone(),
            audio: audio_only.then(|| AudioExtraction {
                codec: options.audio_codec.clone(),
                quality: options.audio_quality.clone(),
            }),
        }
    }

    /// Engine-native output template; naming collisions are left to the engine.
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join("%(title)s.%(ext)s")
    }
}

/// The two capabilities borrowed from the external extraction engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Name of the engine (for logging).
    fn name(&self) -> &'static str;

    /// Look up metadata without downloading. Fails with `Error::Resolution`.
    async fn resolve(&self, url: &str) -> Result<MediaMetadata>;

    /// Transfer the media, emitting progress on `events`. Fails with `Error::Transfer`.
    /// The sender is dropped when the transfer ends, which closes the channel.
    async fn fetch(
        &self,
        request: &FetchRequest,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<ArtifactRef>;
}

/// File name component of an artifact path, lossily decoded.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
