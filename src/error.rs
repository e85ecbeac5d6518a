//! Error taxonomy for the completion pipeline
//!
//! Nothing in this crate treats a failure as fatal to a session. Transport
//! failures degrade to an empty suggestion batch, stale responses are silent
//! discards, and malformed raw items are skipped individually. The worst
//! user-visible outcome is an empty or momentarily stale candidate list.

use thiserror::Error;

/// Errors a suggestion source may surface through its transport.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request to the source failed in transit (connection dropped,
    /// backend crashed, serialization error on the wire). Recovered by
    /// treating the response as empty; a later edit event re-triggers the
    /// source naturally, so no retry is scheduled here.
    #[error("suggestion transport failed: {message}")]
    Transport { message: String },
}

impl SourceError {
    /// Convenience constructor for transport failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for SourceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}
