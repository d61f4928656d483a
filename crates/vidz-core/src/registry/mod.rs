//! In-memory job registry.
//!
//! The only mutable state shared between job tasks and pollers. Each
//! operation takes the lock once, so an update is atomic per job; jobs never
//! coordinate with each other. State is memory-only: ids do not survive a
//! restart.

pub mod types;


use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

pub use types::*;

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and store a new job in `Starting` with zero progress.
    pub fn create(&self, request: JobRequest) -> JobId {
        let id = JobId::new_v4();
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Job::new(id, request));
        id
    }

    /// Snapshot of a job, or None if unknown (or evicted).
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Atomic read-modify-write of one job. Returns false, without calling
    /// `f`, when the id is absent.
    pub fn update<F>(&self, id: &JobId, f: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.get_mut(id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal jobs that finished at least `ttl` ago. Jobs still running
    /// are never evicted. Returns how many were removed.
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        self.evict_finished_before(Instant::now(), ttl)
    }

    fn evict_finished_before(&self, now: Instant, ttl: Duration) -> usize {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at() {
            Some(t) => now.saturating_duration_since(t) < ttl,
            None => true,
        });
        before - jobs.len()
    }
}
