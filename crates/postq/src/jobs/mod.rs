pub mod job;
pub mod store;
pub mod transition;

pub use job::{
    JobLogEntry, JobPatch, JobStatus, LogLevel, LogStreamEvent, NewLogEntry, PostJob,
    DEFAULT_CHANNEL, DEFAULT_TITLE,
};
pub use store::JobStore;
