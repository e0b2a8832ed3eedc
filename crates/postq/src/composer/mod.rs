//! Orchestration of the draft, schedule, generate, and publish flows.
//!
//! The store is optimistic and client-authoritative, so consistency between
//! local status and the actual remote outcome depends on every network call
//! being followed by a status update. This module owns that discipline:
//! callers go through it instead of pairing store and client by hand.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::{ApiClient, ApiError, GeneratePostContentRequest, PublishPostRequest};
use crate::error::StoreError;
use crate::jobs::{JobPatch, JobStatus, JobStore, LogLevel, NewLogEntry, PostJob};

/// Errors surfaced by the publish/schedule flows. In every case the job's
/// durable record already reflects the failure when the error is returned.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Publish requested with no content; detected before any network call.
    #[error("post '{job_id}' has no content to publish")]
    MissingContent { job_id: String },

    /// The publish call was rejected after retries.
    #[error("publish failed for post '{job_id}': {source}")]
    PublishFailed {
        job_id: String,
        #[source]
        source: ApiError,
    },

    /// Schedule requested without a scheduled time.
    #[error("schedule requested without a scheduled time")]
    MissingSchedule,
}

/// User-provided fields for a new post.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub channel: Option<String>,
    pub tags: Vec<String>,
    pub content: String,
    pub prompt: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl PostInput {
    /// Builds the creation patch for a job entering the store with `status`.
    /// The scheduled time is kept only for scheduled jobs.
    fn into_patch(self, status: JobStatus) -> JobPatch {
        let scheduled_for = if status == JobStatus::Scheduled {
            self.scheduled_for
        } else {
            None
        };
        JobPatch {
            title: Some(self.title),
            channel: self.channel,
            tags: Some(self.tags),
            content: Some(self.content),
            prompt: self.prompt,
            scheduled_for,
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Coordinates the job store and API client for the post lifecycle.
pub struct Composer {
    store: Arc<JobStore>,
    api: ApiClient,
}

impl Composer {
    pub fn new(store: Arc<JobStore>, api: ApiClient) -> Self {
        Self { store, api }
    }

    /// Generates post content from a prompt description and skill tags.
    pub async fn generate(&self, description: &str, skills: &[String]) -> Result<String, ApiError> {
        self.api
            .generate_post_content(&GeneratePostContentRequest {
                description: description.to_string(),
                skills: skills.to_vec(),
            })
            .await
    }

    /// Saves a draft. No network call.
    pub fn save_draft(&self, input: PostInput) -> PostJob {
        self.store.upsert(input.into_patch(JobStatus::Draft))
    }

    /// Creates a scheduled job. No network call; publishing happens later
    /// from the scheduled state.
    pub fn schedule(&self, input: PostInput) -> Result<PostJob, ComposerError> {
        if input.scheduled_for.is_none() {
            return Err(ComposerError::MissingSchedule);
        }
        Ok(self.store.upsert(input.into_patch(JobStatus::Scheduled)))
    }

    /// Creates a publishing job and drives it to `published` or `failed`.
    ///
    /// Empty content fails the job locally without touching the network.
    /// Otherwise the outcome of the publish call is always written back to
    /// the store before this returns.
    pub async fn publish(&self, input: PostInput) -> Result<PostJob, ComposerError> {
        let job = self.store.upsert(input.into_patch(JobStatus::Publishing));

        if job.content.trim().is_empty() {
            self.fail(&job.id, "No content provided");
            return Err(ComposerError::MissingContent { job_id: job.id });
        }

        match self
            .api
            .publish_post(&PublishPostRequest {
                text: job.content.clone(),
            })
            .await
        {
            Ok(response) => {
                if let Some(remote_id) = &response.id {
                    log::info!("Post '{}' published as remote id {}", job.id, remote_id);
                }
                let published = self.update(&job.id, JobStatus::Published, None);
                Ok(published.unwrap_or(job))
            }
            Err(e) => {
                self.fail(&job.id, &e.to_string());
                Err(ComposerError::PublishFailed {
                    job_id: job.id,
                    source: e,
                })
            }
        }
    }

    /// Moves a failed job back to the queue and annotates its log. Returns
    /// `None` for a missing id.
    pub fn retry(&self, job_id: &str) -> Result<Option<PostJob>, StoreError> {
        let updated = self.store.update_status(job_id, JobStatus::Queued, None)?;
        if updated.is_some() {
            self.store.append_log(
                job_id,
                NewLogEntry::now(LogLevel::Info, "Job manually retried from console"),
            );
        }
        Ok(updated)
    }

    fn update(&self, id: &str, status: JobStatus, error_message: Option<&str>) -> Option<PostJob> {
        match self.store.update_status(id, status, error_message) {
            Ok(job) => job,
            Err(e) => {
                log::error!("Failed to update status for job '{}': {}", id, e);
                None
            }
        }
    }

    fn fail(&self, id: &str, message: &str) {
        self.update(id, JobStatus::Failed, Some(message));
    }
}
