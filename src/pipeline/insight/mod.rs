pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod requester;
pub mod types;

pub use mock::*;
pub use ollama::*;
pub use openai::*;
pub use prompt::*;
pub use requester::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Reasoning service error: {0}")]
    ServiceError(String),

    #[error("Reasoning service returned error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Reasoning service timed out after {0}s")]
    Timeout(u64),

    #[error("Reasoning service returned an empty response")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

impl InsightError {
    /// Classify a transport failure the same way for every backend.
    pub(crate) fn from_transport(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_connect() {
            Self::ServiceError(format!("cannot connect to {base_url}"))
        } else {
            Self::ServiceError(err.to_string())
        }
    }
}
