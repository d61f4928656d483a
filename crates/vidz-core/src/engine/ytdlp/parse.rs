//! Parsing of yt-dlp output: `--dump-json` metadata and our tagged stdout lines.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::engine::{EngineEvent, MediaMetadata, RawProgress, Rendition};

/// Prefix of the JSON progress line produced by our `--progress-template`.
pub(super) const PROGRESS_TAG: &str = "VIDZ_PROGRESS ";
/// Prefix of the final-path line produced by `--print after_move:`.
pub(super) const FILE_TAG: &str = "VIDZ_FILE ";
/// Prefix of the title line produced by `--print after_move:`.
pub(super) const TITLE_TAG: &str = "VIDZ_TITLE ";

/// One classified line of engine output.
#[derive(Debug, PartialEq)]
pub(super) enum Line {
    Event(EngineEvent),
    File(PathBuf),
    Title(String),
    Other,
}

#[derive(Debug, Deserialize)]
struct ProgressJson {
    status: String,
    #[serde(default)]
    downloaded_bytes: Option<f64>,
    #[serde(default)]
    total_bytes: Option<f64>,
    #[serde(default)]
    total_bytes_estimate: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    eta: Option<f64>,
    #[serde(default)]
    filename: Option<String>,
}

pub(super) fn classify_line(line: &str) -> Line {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(json) = line.strip_prefix(PROGRESS_TAG) {
        return match serde_json::from_str::<ProgressJson>(json) {
            Ok(p) => progress_event(p).map_or(Line::Other, Line::Event),
            Err(e) => {
                tracing::debug!("unparseable progress line: {}", e);
                Line::Other
            }
        };
    }
    if let Some(path) = line.strip_prefix(FILE_TAG) {
        return Line::File(PathBuf::from(path.trim()));
    }
    if let Some(title) = line.strip_prefix(TITLE_TAG) {
        return Line::Title(title.trim().to_string());
    }
    Line::Other
}

fn as_count(v: Option<f64>) -> Option<u64> {
    v.filter(|x| x.is_finite() && *x >= 0.0).map(|x| x as u64)
}

fn progress_event(p: ProgressJson) -> Option<EngineEvent> {
    let filename = p.filename.map(PathBuf::from);
    match p.status.as_str() {
        "downloading" => Some(EngineEvent::Downloading(RawProgress {
            downloaded_bytes: as_count(p.downloaded_bytes).unwrap_or(0),
            total_bytes: as_count(p.total_bytes).filter(|t| *t > 0),
            total_bytes_estimate: as_count(p.total_bytes_estimate).filter(|t| *t > 0),
            speed: p.speed.filter(|s| s.is_finite() && *s >= 0.0),
            eta: as_count(p.eta),
            filename,
        })),
        "finished" => Some(EngineEvent::Finished {
            filename: filename.unwrap_or_default(),
        }),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    ext: Option<String>,
}

/// Build [`MediaMetadata`] from `--dump-json` output. `url` is the requested URL,
/// used when the engine does not report a canonical page URL.
pub(super) fn parse_metadata(json: &[u8], url: &str) -> Result<MediaMetadata, serde_json::Error> {
    let info: InfoJson = serde_json::from_slice(json)?;

    let mut seen = HashSet::new();
    let mut renditions: Vec<Rendition> = info
        .formats
        .iter()
        .filter_map(|f| {
            let height = f.height.filter(|h| *h > 0)?;
            seen.insert(height).then(|| Rendition {
                quality: format!("{height}p"),
                height,
                ext: f.ext.clone().unwrap_or_else(|| "mp4".to_string()),
            })
        })
        .collect();
    renditions.sort_by(|a, b| b.height.cmp(&a.height));

    Ok(MediaMetadata {
        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
        uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
        duration: as_count(info.duration).unwrap_or(0),
        thumbnail: info.thumbnail,
        view_count: info.view_count.unwrap_or(0),
        url: info.webpage_url.unwrap_or_else(|| url.to_string()),
        renditions,
    })
}

/// Pick the most useful message from the engine's stderr: the last `ERROR:` line,
/// else the last non-empty line.
pub(super) fn engine_error_message(stderr_lines: &[String]) -> Option<String> {
    stderr_lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr_lines.iter().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
}
