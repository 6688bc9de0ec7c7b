//! Client error types
//!
//! Every fatal failure a session or API call can surface is a variant here.
//! Recoverable conditions (a malformed stream record, a failed post-stream
//! save) are handled internally and never reach this enum.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Pulse client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// A send was attempted with an empty (or whitespace-only) message.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Task creation returned a non-success status; no stream was opened.
    #[error("task creation failed with status {status}")]
    TaskCreation { status: u16 },

    /// The event subscription for an existing task could not be opened.
    #[error("stream open failed with status {status}")]
    StreamOpen { status: u16 },

    /// A unary API call returned a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// Network-level failure (connect, send, or mid-stream read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The stream produced no bytes within the configured idle limit.
    #[error("stream idle for {elapsed:?}, giving up")]
    IdleTimeout { elapsed: Duration },

    /// The session was cancelled by the caller.
    #[error("session aborted")]
    Aborted,

    /// The backend reported an error inside a legacy sentinel stream.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl ClientError {
    /// True for user-initiated termination, as opposed to a backend or
    /// transport failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self, ClientError::Aborted)
    }
}
