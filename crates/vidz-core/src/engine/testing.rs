//! Scripted [`Engine`] that replays a fixed event sequence, used to exercise
//! the controller without spawning yt-dlp or touching the network.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

use crate::engine::{ArtifactRef, Engine, EngineEvent, FetchRequest, MediaMetadata, RawProgress};
use crate::error::{Error, Result};

/// Hold point inside a script; the engine blocks on it until [`Gate::open`].
#[derive(Debug, Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn new() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub fn open(&self) {
        self.0.add_permits(1);
    }

    async fn pass(&self) {
        if let Ok(permit) = self.0.acquire().await {
            permit.forget();
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Step {
    Emit(EngineEvent),
    Wait(Gate),
}

#[derive(Debug, Clone)]
enum Outcome {
    Succeed {
        file_name: String,
        title: String,
        write_file: bool,
    },
    Fail(String),
    Panic(String),
}

#[derive(Debug)]
pub struct ScriptedEngine {
    steps: Vec<Step>,
    outcome: Outcome,
    metadata: std::result::Result<MediaMetadata, String>,
    fetch_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    last_request: Mutex<Option<FetchRequest>>,
}

impl ScriptedEngine {
    /// Succeeds immediately with `clip.mp4`, without writing a file.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            outcome: Outcome::Succeed {
                file_name: "clip.mp4".to_string(),
                title: "Clip".to_string(),
                write_file: false,
            },
            metadata: Ok(sample_metadata("Clip")),
            fetch_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn emit(mut self, event: EngineEvent) -> Self {
        self.steps.push(Step::Emit(event));
        self
    }

    pub fn wait(mut self, gate: &Gate) -> Self {
        self.steps.push(Step::Wait(gate.clone()));
        self
    }

    /// Finish with an artifact named `file_name` in the request's output dir.
    pub fn succeed(mut self, file_name: &str, title: &str) -> Self {
        self.outcome = Outcome::Succeed {
            file_name: file_name.to_string(),
            title: title.to_string(),
            write_file: false,
        };
        self
    }

    /// Like [`succeed`](Self::succeed), but also writes the file to disk.
    pub fn succeed_with_file(mut self, file_name: &str, title: &str) -> Self {
        self.outcome = Outcome::Succeed {
            file_name: file_name.to_string(),
            title: title.to_string(),
            write_file: true,
        };
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.outcome = Outcome::Fail(message.to_string());
        self
    }

    pub fn panic(mut self, message: &str) -> Self {
        self.outcome = Outcome::Panic(message.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = Ok(metadata);
        self
    }

    pub fn resolve_fails(mut self, message: &str) -> Self {
        self.metadata = Err(message.to_string());
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn resolve(&self, _url: &str) -> Result<MediaMetadata> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.clone().map_err(Error::Resolution)
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<ArtifactRef> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(request.clone());

        for step in &self.steps {
            match step {
                Step::Emit(event) => {
                    let _ = events.send(event.clone()).await;
                }
                Step::Wait(gate) => gate.pass().await,
            }
        }

        match &self.outcome {
            Outcome::Succeed {
                file_name,
                title,
                write_file,
            } => {
                let path = request.output_dir.join(file_name);
                if *write_file {
                    tokio::fs::create_dir_all(&request.output_dir).await?;
                    tokio::fs::write(&path, b"scripted media").await?;
                }
                Ok(ArtifactRef {
                    path,
                    title: title.clone(),
                })
            }
            Outcome::Fail(msg) => Err(Error::Transfer(msg.clone())),
            Outcome::Panic(msg) => panic!("{}", msg),
        }
    }
}

/// `downloading` event with exact byte counts and no speed/eta.
pub fn downloading(downloaded_bytes: u64, total_bytes: u64) -> EngineEvent {
    EngineEvent::Downloading(RawProgress {
        downloaded_bytes,
        total_bytes: Some(total_bytes),
        ..RawProgress::default()
    })
}

pub fn finished(filename: &str) -> EngineEvent {
    EngineEvent::Finished {
        filename: PathBuf::from(filename),
    }
}

pub fn sample_metadata(title: &str) -> MediaMetadata {
    MediaMetadata {
        title: title.to_string(),
        uploader: "Uploader".to_string(),
        duration: 65,
        thumbnail: None,
        view_count: 1000,
        url: "https://example.com/v1".to_string(),
        renditions: vec![
            crate::engine::Rendition {
                quality: "720p".to_string(),
                height: 720,
                ext: "mp4".to_string(),
            },
            crate::engine::Rendition {
                quality: "360p".to_string(),
                height: 360,
                ext: "mp4".to_string(),
            },
        ],
    }
}
