//! Collaborator traits at the edges of the pipeline
//!
//! The engine treats the editor and the suggestion sources as opaque
//! collaborators behind traits. A source is an async RPC that returns a list
//! of raw LSP completion items; the editor is a synchronous surface for
//! reading buffer state and driving the popup menu. Neither side sees the
//! engine's internals.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lsp_types::{CompletionItem, TextEdit};

use crate::candidate::Candidate;
use crate::context::{AnchorContext, LineWindow};
use crate::error::SourceError;

/// Opaque handle for an open document, assigned by the host editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Cheap cloneable name of a suggestion source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Everything a source gets to see about one completion request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Document the request is for.
    pub document: DocumentId,

    /// Anchor context captured at trigger time. The response will be checked
    /// against the live context before ingestion, so a source need not worry
    /// about racing the user.
    pub context: AnchorContext,

    /// Full text of the cursor line at trigger time.
    pub line_text: String,
}

/// A batch of raw suggestions returned by a source.
#[derive(Debug, Clone, Default)]
pub struct SourceReply {
    /// Raw completion items. Malformed items (no usable insert text) are
    /// skipped individually during ingestion.
    pub items: Vec<CompletionItem>,

    /// Whether the source considers the list incomplete (more items would be
    /// returned for a longer prefix).
    pub is_incomplete: bool,
}

impl From<Vec<CompletionItem>> for SourceReply {
    fn from(items: Vec<CompletionItem>) -> Self {
        Self {
            items,
            is_incomplete: false,
        }
    }
}

/// An external provider of completion suggestions for a document.
///
/// Implementations wrap whatever protocol actually talks to the
/// language-intelligence backend. The engine only relies on the
/// cancellable-by-staleness contract: a reply that arrives after the editing
/// context has moved on is discarded unconditionally, which is logically
/// equivalent to cancellation.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Stable identifier for this source, used for per-source state and logs.
    fn id(&self) -> SourceId;

    /// Request suggestions for the given context.
    async fn request(&self, ctx: &RequestContext) -> Result<SourceReply, SourceError>;
}

/// Cursor position in the live buffer, in character columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

/// Synchronous surface onto the host editor.
///
/// All queries reflect the *current* buffer state at call time; the engine
/// compares contexts across calls to detect movement. Rendering calls are
/// fire-and-forget.
pub trait EditorSurface: Send + Sync {
    /// Current cursor position.
    fn cursor(&self) -> CursorPosition;

    /// Text of the given line, without the trailing newline, or `None` if the
    /// line does not exist.
    fn line_text(&self, line: u32) -> Option<String>;

    /// A window of lines around `center` for the proximity scan.
    fn line_window(&self, center: u32, radius: u32) -> LineWindow;

    /// Display the ranked candidate list anchored at the given column.
    fn show_menu(&self, anchor_column: u32, candidates: &[Candidate]);

    /// Hide the candidate list.
    fn hide_menu(&self);

    /// Whether the popup menu is currently visible.
    fn menu_visible(&self) -> bool;

    /// Whether the user has explicitly selected an item in the menu. While an
    /// item is selected the engine must not replace the list underneath them.
    fn menu_item_selected(&self) -> bool;

    /// Apply additional text edits carried by an accepted candidate.
    fn apply_edits(&self, edits: &[TextEdit]);
}
