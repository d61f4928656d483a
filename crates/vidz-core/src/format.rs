//! Human-readable renderings of byte counts, rates, and durations.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with one decimal, e.g. `1536` -> `"1.5 KB"`.
pub fn format_size(bytes: u64) -> String {
    scale(bytes as f64)
}

/// Format a transfer rate, e.g. `2048.0` -> `"2.0 KB/s"`.
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", scale(bytes_per_sec.max(0.0)))
}

fn scale(mut value: f64) -> String {
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

/// Format a media duration as `m:ss` or `h:mm:ss`; zero means the engine did not report one.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Remaining-time label shown next to the progress bar.
pub fn format_eta(seconds: u64) -> String {
    format!("{seconds}s")
}

/// Group digits in thousands, e.g. `1234567` -> `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
