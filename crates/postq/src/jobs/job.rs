//! Post job and job log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sole supported publishing channel.
pub const DEFAULT_CHANNEL: &str = "linkedin";
/// Placeholder title for jobs created without one.
pub const DEFAULT_TITLE: &str = "Untitled Post";

/// Lifecycle status of a post job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    Queued,
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Draft => write!(f, "draft"),
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Scheduled => write!(f, "scheduled"),
            JobStatus::Publishing => write!(f, "publishing"),
            JobStatus::Published => write!(f, "published"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Severity of a job log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A single social-post work item, tracked client-side independently of
/// whether the remote service has acted on it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostJob {
    /// Opaque unique id, generated client-side at creation. Immutable.
    pub id: String,
    pub title: String,
    /// Target publishing destination.
    pub channel: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: String,
    /// Originating prompt, when the content was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Present only for jobs that are (or were) scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: JobStatus,
    /// Count of transitions into `failed`, exactly.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Partial job used for merge-by-id upserts. Omitted fields are preserved on
/// merge; on insert they fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub id: Option<String>,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub tags: Option<Vec<String>>,
    pub content: Option<String>,
    pub prompt: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: Option<JobStatus>,
    pub attempts: Option<u32>,
    pub error_message: Option<String>,
}

impl JobPatch {
    /// Materializes a new job from this patch, filling defaults for omitted
    /// fields.
    pub(crate) fn into_job(self) -> PostJob {
        PostJob {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            channel: self.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            tags: self.tags.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            prompt: self.prompt,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            scheduled_for: self.scheduled_for,
            status: self.status.unwrap_or(JobStatus::Draft),
            attempts: self.attempts.unwrap_or(0),
            error_message: self.error_message,
        }
    }

    /// Merges the provided fields into `job`. Identity and creation
    /// timestamp are set once and never rewritten.
    pub(crate) fn apply_to(self, job: &mut PostJob) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(channel) = self.channel {
            job.channel = channel;
        }
        if let Some(tags) = self.tags {
            job.tags = tags;
        }
        if let Some(content) = self.content {
            job.content = content;
        }
        if let Some(prompt) = self.prompt {
            job.prompt = Some(prompt);
        }
        if let Some(scheduled_for) = self.scheduled_for {
            job.scheduled_for = Some(scheduled_for);
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(attempts) = self.attempts {
            job.attempts = attempts;
        }
        if let Some(error_message) = self.error_message {
            job.error_message = Some(error_message);
        }
    }
}

/// An append-only log event attached to exactly one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLogEntry {
    pub id: String,
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// A log entry before the store assigns its identity.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl NewLogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Wire shape of a remote log event delivered over the stream: a job log
/// entry without local identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamEvent {
    pub job_id: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
