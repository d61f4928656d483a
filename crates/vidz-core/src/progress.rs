//! Progress projection: raw engine samples -> normalized, pollable snapshots.
//!
//! Numeric fields are canonical; human-readable strings are rendered only in
//! the status view.

use serde::Serialize;

use crate::engine::RawProgress;

/// Point-in-time transfer status. A job keeps only the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub downloaded_bytes: u64,
    /// 0 means the size is unknown (indeterminate progress).
    pub total_bytes: u64,
    /// In [0.0, 100.0].
    pub percentage: f64,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_secs: Option<u64>,
}

impl ProgressSnapshot {
    /// Project one raw sample. Speed and ETA are passed through, never estimated.
    pub fn project(raw: &RawProgress) -> Self {
        let total_bytes = raw
            .total_bytes
            .or(raw.total_bytes_estimate)
            .unwrap_or(0);
        Self {
            downloaded_bytes: raw.downloaded_bytes,
            total_bytes,
            percentage: percentage(raw.downloaded_bytes, total_bytes),
            speed_bytes_per_sec: raw.speed,
            eta_secs: raw.eta,
        }
    }

    /// Same snapshot with the percentage raised to at least `floor`.
    pub(crate) fn not_below(mut self, floor: f64) -> Self {
        if self.percentage < floor {
            self.percentage = floor;
        }
        self
    }

    /// Final snapshot of a completed job.
    pub(crate) fn completed(mut self) -> Self {
        self.percentage = 100.0;
        self.eta_secs = None;
        self
    }
}

/// `downloaded / total * 100`, clamped to [0, 100]; 0 when the total is unknown.
pub fn percentage(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
