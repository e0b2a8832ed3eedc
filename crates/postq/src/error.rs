use std::path::PathBuf;
use thiserror::Error;

use crate::jobs::JobStatus;

#[derive(Error, Debug)]
pub enum PostqError {
    #[error("API error: {0}")]
    Api(#[from] crate::api::ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Composer error: {0}")]
    Composer(#[from] crate::composer::ComposerError),
}

/// Errors raised by job store mutations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested status change is outside the legal transition table.
    #[error("illegal status transition for job '{id}': {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Errors raised by the persisted-document layer.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write document '{path}': {source}")]
    WriteDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document '{path}': {source}")]
    ParseDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize document '{name}': {source}")]
    SerializeDocument {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PostqError>;
