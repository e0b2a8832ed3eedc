//! Job store with persistent document storage.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PersistError, StoreError};
use crate::jobs::job::{JobLogEntry, JobPatch, JobStatus, NewLogEntry, PostJob};
use crate::jobs::transition;
use crate::storage::DocumentStore;

const JOBS_DOC: &str = "posts.json";
const JOBS_VERSION: u32 = 1;

/// Persisted shape of the job collection and per-job log sequences.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobsDocument {
    #[serde(default)]
    jobs: Vec<PostJob>,
    #[serde(default)]
    logs: HashMap<String, Vec<JobLogEntry>>,
}

/// The system of record for jobs and their log histories.
///
/// All mutations serialize behind one `RwLock`; consumers receive snapshots,
/// never live handles. Every mutation writes the whole document through to
/// disk when persistence is configured; persist failures are logged and
/// swallowed so UI flows never break on a disk hiccup.
pub struct JobStore {
    state: RwLock<JobsDocument>,
    docs: Option<DocumentStore>,
}

impl JobStore {
    /// Creates an in-memory store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(JobsDocument::default()),
            docs: None,
        }
    }

    /// Creates a store backed by `docs`, restoring the persisted jobs
    /// document when present.
    pub fn with_persistence(docs: DocumentStore) -> Result<Self, PersistError> {
        let state = docs
            .load::<JobsDocument>(JOBS_DOC, JOBS_VERSION)?
            .unwrap_or_default();
        Ok(Self {
            state: RwLock::new(state),
            docs: Some(docs),
        })
    }

    /// Inserts or merges a job by id.
    ///
    /// When the patch carries the id of an existing job, provided fields are
    /// merged into it and omitted fields are preserved. Otherwise a new
    /// record is inserted at the head of the collection with defaults filled.
    /// Returns the resulting full record.
    pub fn upsert(&self, patch: JobPatch) -> PostJob {
        let mut state = self.write_state();

        if let Some(id) = patch.id.clone() {
            if let Some(pos) = state.jobs.iter().position(|j| j.id == id) {
                patch.apply_to(&mut state.jobs[pos]);
                let job = state.jobs[pos].clone();
                self.persist(&state);
                return job;
            }
        }

        let job = patch.into_job();
        state.jobs.insert(0, job.clone());
        self.persist(&state);
        job
    }

    /// Moves a job to `status`, replacing its error message and incrementing
    /// `attempts` iff the new status is `failed`.
    ///
    /// A missing id is a silent miss (`Ok(None)`) since concurrent UI actions
    /// may race with store resets. A move outside the transition table is
    /// refused with [`StoreError::IllegalTransition`].
    pub fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<Option<PostJob>, StoreError> {
        let mut state = self.write_state();

        let Some(job) = state.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };

        if !transition::is_legal(job.status, status) {
            return Err(StoreError::IllegalTransition {
                id: id.to_string(),
                from: job.status,
                to: status,
            });
        }

        job.status = status;
        job.error_message = error_message.map(str::to_string);
        if status == JobStatus::Failed {
            job.attempts += 1;
        }

        let job = job.clone();
        self.persist(&state);
        Ok(Some(job))
    }

    /// Assigns a fresh identity to `entry` and appends it to the job's log
    /// sequence, creating the sequence when absent.
    pub fn append_log(&self, job_id: &str, entry: NewLogEntry) -> JobLogEntry {
        let log = JobLogEntry {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            timestamp: entry.timestamp,
            level: entry.level,
            message: entry.message,
        };

        let mut state = self.write_state();
        state
            .logs
            .entry(job_id.to_string())
            .or_default()
            .push(log.clone());
        self.persist(&state);
        log
    }

    /// Returns the job's log entries in append order, or an empty sequence.
    pub fn logs(&self, job_id: &str) -> Vec<JobLogEntry> {
        self.read_state()
            .logs
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a snapshot of all jobs, newest first.
    pub fn jobs(&self) -> Vec<PostJob> {
        self.read_state().jobs.clone()
    }

    /// Returns a snapshot of a single job.
    pub fn get(&self, id: &str) -> Option<PostJob> {
        self.read_state().jobs.iter().find(|j| j.id == id).cloned()
    }

    /// Clears all jobs and logs. Used for session reset and demo reseeding.
    pub fn reset(&self) {
        let mut state = self.write_state();
        *state = JobsDocument::default();
        self.persist(&state);
    }

    /// Seeds a few representative jobs for demo sessions. No-op when the
    /// store already holds jobs.
    pub fn seed_demo(&self) {
        if !self.jobs().is_empty() {
            return;
        }
        let base = Utc::now();

        self.upsert(JobPatch {
            title: Some("Launch recap".to_string()),
            status: Some(JobStatus::Published),
            created_at: Some(base - Duration::minutes(180)),
            attempts: Some(1),
            tags: Some(vec!["launch".to_string(), "product".to_string()]),
            content: Some("We just launched our auto-poster!".to_string()),
            ..Default::default()
        });
        self.upsert(JobPatch {
            title: Some("Weekly update".to_string()),
            status: Some(JobStatus::Scheduled),
            created_at: Some(base - Duration::minutes(60)),
            scheduled_for: Some(base + Duration::minutes(120)),
            tags: Some(vec!["update".to_string()]),
            content: Some("Drafting next week's update.".to_string()),
            ..Default::default()
        });
        self.upsert(JobPatch {
            title: Some("AI tips".to_string()),
            status: Some(JobStatus::Failed),
            created_at: Some(base - Duration::minutes(240)),
            scheduled_for: Some(base - Duration::minutes(180)),
            attempts: Some(2),
            tags: Some(vec!["ai".to_string(), "tips".to_string()]),
            content: Some("Sharing AI best practices.".to_string()),
            error_message: Some("LinkedIn API returned 401".to_string()),
            ..Default::default()
        });

        log::info!("Seeded {} demo jobs", self.jobs().len());
    }

    fn read_state(&self) -> RwLockReadGuard<'_, JobsDocument> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, JobsDocument> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn persist(&self, state: &JobsDocument) {
        if let Some(docs) = &self.docs {
            if let Err(e) = docs.save(JOBS_DOC, JOBS_VERSION, state) {
                log::error!("Failed to persist jobs: {}", e);
            }
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
