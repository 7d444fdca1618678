//! Error types for the REST client and the local patch engine.

use thiserror::Error;

/// Failure of a call to the build/channel API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (fetch rejected, connection refused).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("sign in with Twitch first")]
    Unauthenticated,
}

impl ApiError {
    /// A `test` guard or precondition was rejected by the server: the record
    /// changed since it was read.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Status { status: 409 | 412, .. })
    }
}

/// A convenience Result alias that defaults to [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure applying a JSON-Patch list to a local value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("test failed at {path}")]
    TestFailed { path: String },

    #[error("no value at {path}")]
    MissingPath { path: String },

    #[error("invalid JSON pointer: {0}")]
    InvalidPointer(String),
}
