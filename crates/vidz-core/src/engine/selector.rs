//! Quality tiers and their yt-dlp format selectors.

use serde::Serialize;
use std::fmt;

/// Requested quality tier. Unrecognized input falls back to [`Quality::Best`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "audio")]
    Audio,
}

impl Quality {
    /// Tiers a caller may pick for a video download.
    pub const VIDEO_TIERS: [&'static str; 5] = ["best", "1080p", "720p", "480p", "360p"];

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "1080p" => Quality::P1080,
            "720p" => Quality::P720,
            "480p" => Quality::P480,
            "360p" => Quality::P360,
            "audio" => Quality::Audio,
            _ => Quality::Best,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::Audio => "audio",
        }
    }

    /// Upper bound on vertical resolution, if the tier has one.
    pub fn max_height(self) -> Option<u32> {
        match self {
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::Best | Quality::Audio => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a tier to yt-dlp's selector syntax. Audio-only always wins over the tier.
pub fn format_selector(quality: Quality, audio_only: bool) -> String {
    let quality = if audio_only { Quality::Audio } else { quality };
    match (quality, quality.max_height()) {
        (Quality::Audio, _) => "bestaudio[ext=m4a]/bestaudio".to_string(),
        (_, Some(h)) => format!(
            "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}][ext=mp4]/best"
        ),
        (_, None) => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
    }
}
