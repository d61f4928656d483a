//! [`Engine`] backed by the `yt-dlp` executable.
//!
//! `resolve` runs `yt-dlp --dump-json`. `fetch` runs a download with a JSON
//! progress template and `--print after_move:` tags, reading stdout and stderr
//! line by line and forwarding progress as [`EngineEvent`]s. `--print` puts
//! yt-dlp in quiet mode, which sends progress to stderr, so both streams are
//! classified.

mod parse;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::VidzConfig;
use crate::engine::{file_name, ArtifactRef, Engine, EngineEvent, FetchRequest, MediaMetadata};
use crate::error::{Error, Result};

use self::parse::{classify_line, engine_error_message, parse_metadata, Line};

/// Stderr lines kept for the failure message.
const STDERR_TAIL: usize = 20;

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    no_check_certificate: bool,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            no_check_certificate: false,
        }
    }

    pub fn from_config(cfg: &VidzConfig) -> Self {
        Self::new(cfg.ytdlp_path.clone()).with_no_check_certificate(cfg.no_check_certificate)
    }

    pub fn with_no_check_certificate(mut self, yes: bool) -> Self {
        self.no_check_certificate = yes;
        self
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
        if self.no_check_certificate {
            args.push("--no-check-certificate".to_string());
        }
        args
    }

    /// Full argument list for a download; separated from `fetch` for testing.
    fn fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!("download:{}%(progress)j", parse::PROGRESS_TAG),
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", parse::FILE_TAG),
            "--print".to_string(),
            format!("after_move:{}%(title)s", parse::TITLE_TAG),
            "-f".to_string(),
            request.selector.clone(),
            "-o".to_string(),
            request.output_template().to_string_lossy().into_owned(),
        ]);
        if let Some(audio) = &request.audio {
            args.extend([
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                audio.codec.clone(),
                "--audio-quality".to_string(),
                audio.quality.clone(),
            ]);
        }
        args.push("--".to_string());
        args.push(request.url.clone());
        args
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Engine for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str) -> Result<MediaMetadata> {
        let mut args = self.common_args();
        args.push("--dump-json".to_string());
        args.push("--".to_string());
        args.push(url.to_string());
        tracing::debug!(program = %self.program, url, "resolving metadata");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Resolution(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let lines: Vec<String> = String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string)
                .collect();
            let msg = engine_error_message(&lines)
                .unwrap_or_else(|| format!("{} exited with {}", self.program, output.status));
            return Err(Error::Resolution(msg));
        }

        parse_metadata(&output.stdout, url)
            .map_err(|e| Error::Resolution(format!("invalid metadata from {}: {}", self.program, e)))
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<ArtifactRef> {
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| {
                Error::Transfer(format!(
                    "cannot create output directory {}: {}",
                    request.output_dir.display(),
                    e
                ))
            })?;
        let args = self.fetch_args(request);
        tracing::debug!(program = %self.program, url = %request.url, selector = %request.selector, "starting transfer");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Transfer(format!("failed to start {}: {}", self.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Transfer("engine stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Transfer("engine stderr not captured".to_string()))?;
        // Raw bytes: titles and ffmpeg messages are not guaranteed to be UTF-8.
        let mut out_reader = BufReader::new(stdout);
        let mut err_reader = BufReader::new(stderr);
        let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());

        let mut final_path: Option<PathBuf> = None;
        let mut title: Option<String> = None;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
        let (mut out_open, mut err_open) = (true, true);

        while out_open || err_open {
            // read_until keeps partial bytes in the buffer when the other branch wins.
            let (read, from_stderr) = tokio::select! {
                n = out_reader.read_until(b'\n', &mut out_buf), if out_open => (n, false),
                n = err_reader.read_until(b'\n', &mut err_buf), if err_open => (n, true),
            };
            let n = read.map_err(|e| {
                Error::Transfer(format!("reading output of {}: {}", self.program, e))
            })?;
            let buf = if from_stderr { &mut err_buf } else { &mut out_buf };
            if n == 0 {
                if from_stderr {
                    err_open = false;
                } else {
                    out_open = false;
                }
                if buf.is_empty() {
                    continue;
                }
            }
            let line = String::from_utf8_lossy(buf)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            buf.clear();

            match classify_line(&line) {
                Line::Event(event) => {
                    // A closed receiver only means nobody is watching any more.
                    let _ = events.send(event).await;
                }
                Line::File(path) => final_path = Some(path),
                Line::Title(t) => title = Some(t),
                Line::Other if from_stderr => {
                    if stderr_tail.len() == STDERR_TAIL {
                        stderr_tail.pop_front();
                    }
                    stderr_tail.push_back(line);
                }
                Line::Other => tracing::trace!("{}", line),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Transfer(format!("waiting for {}: {}", self.program, e)))?;
        if !status.success() {
            let msg = engine_error_message(stderr_tail.make_contiguous())
                .unwrap_or_else(|| format!("{} exited with {}", self.program, status));
            return Err(Error::Transfer(msg));
        }

        let path = final_path
            .ok_or_else(|| Error::Transfer("engine did not report an output file".to_string()))?;
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name(&path))
        });
        Ok(ArtifactRef { path, title })
    }
}
