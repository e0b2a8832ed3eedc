pub mod api;
pub mod bridge;
pub mod composer;
pub mod config;
pub mod error;
pub mod jobs;
pub mod storage;

pub use api::{
    ApiClient, ApiError, ErrorResponse, GeneratePostContentRequest, LogStream, PublishPostRequest,
    PublishPostResponse,
};
pub use bridge::LogStreamBridge;
pub use composer::{Composer, ComposerError, PostInput};
pub use config::{Settings, SettingsPatch, SettingsStore};
pub use error::{PersistError, PostqError, Result, StoreError};
pub use jobs::{
    JobLogEntry, JobPatch, JobStatus, JobStore, LogLevel, LogStreamEvent, NewLogEntry, PostJob,
};
pub use storage::DocumentStore;
