//! HTTP client for the remote publishing service.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod stream;

pub use client::{
    ApiClient, GeneratePostContentRequest, PublishPostRequest, PublishPostResponse,
};
pub use error::{ApiError, ErrorResponse};
pub use stream::LogStream;
