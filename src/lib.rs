//! Incremental multi-source completion aggregation for interactive editors.
//!
//! The engine collects asynchronous suggestion batches from attached sources,
//! merges and fuzzy-ranks them, and serves one stable candidate list to the
//! editor popup while the user types. Correctness under rapid mutation rests
//! on anchor-context versioning: responses that arrive after the editing
//! context has moved on are discarded, never merged.

pub mod cache;
pub mod candidate;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod ranking;
mod scheduler;
pub mod scoring;
pub mod session;
pub mod source;

pub use cache::{SourceState, SourceStats};
pub use candidate::{Candidate, CandidateKey, MenuRow};
pub use config::EngineConfig;
pub use context::{AnchorContext, LineWindow};
pub use error::SourceError;
pub use session::CompletionMux;
pub use source::{
    CursorPosition, DocumentId, EditorSurface, RequestContext, SourceId, SourceReply,
    SuggestionSource,
};
