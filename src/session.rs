//! Session coordination across documents and sources
//!
//! `CompletionMux` owns an explicit registry of per-document sessions keyed
//! by document handle, created on first source attach and destroyed when the
//! document closes. On every edit or cursor event it reads the live anchor
//! context, detects per-source context changes, renders the merged cache
//! immediately for instant feedback, and then lets each source's scheduler
//! decide whether to issue a fresh request. Responses feed back through the
//! scheduler asynchronously and trigger a re-merge if the context is still
//! current.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::cache::{SourceState, SourceStats};
use crate::candidate::{Candidate, CandidateKey};
use crate::config::EngineConfig;
use crate::context::{self, AnchorContext};
use crate::ranking;
use crate::scoring::ScorePass;
use crate::source::{DocumentId, EditorSurface, SourceId, SuggestionSource};

/// One attached source plus its per-document state.
pub(crate) struct SourceHandle {
    pub(crate) source: Arc<dyn SuggestionSource>,
    pub(crate) state: Mutex<SourceState>,
}

/// Per-document session: the ordered set of attached sources.
pub struct DocumentSession {
    pub(crate) id: DocumentId,
    pub(crate) sources: RwLock<Vec<Arc<SourceHandle>>>,
}

impl DocumentSession {
    fn new(id: DocumentId) -> Self {
        Self {
            id,
            sources: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn handles(&self) -> Vec<Arc<SourceHandle>> {
        self.sources.read().clone()
    }
}

/// The completion engine: session registry, merge/rank pipeline and
/// per-source request scheduling, bound to one editor surface.
///
/// Cheap to clone; clones share all state, which lets response handlers run
/// as spawned tasks.
#[derive(Clone)]
pub struct CompletionMux {
    pub(crate) editor: Arc<dyn EditorSurface>,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) sessions: Arc<DashMap<DocumentId, Arc<DocumentSession>>>,
}

impl CompletionMux {
    pub fn new(editor: Arc<dyn EditorSurface>, config: EngineConfig) -> Self {
        Self {
            editor,
            config: Arc::new(config),
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Attach a suggestion source to a document, creating the session on
    /// first attach. Attaching an already-attached source id is a no-op.
    pub fn attach_source(&self, document: DocumentId, source: Arc<dyn SuggestionSource>) {
        let session = self
            .sessions
            .entry(document)
            .or_insert_with(|| Arc::new(DocumentSession::new(document)))
            .clone();

        let mut sources = session.sources.write();
        if sources.iter().any(|h| h.source.id() == source.id()) {
            return;
        }
        info!(%document, source = %source.id(), "attaching completion source");
        sources.push(Arc::new(SourceHandle {
            source,
            state: Mutex::new(SourceState::new()),
        }));
    }

    /// Handle a text-changed event for a document.
    pub async fn text_changed(&self, document: DocumentId) {
        self.handle_event(document).await;
    }

    /// Handle a cursor-moved (or cursor-idle) event for a document.
    pub async fn cursor_moved(&self, document: DocumentId) {
        self.handle_event(document).await;
    }

    /// Handle acceptance of a candidate: apply the deferred side effects
    /// carried in its payload, then start a fresh completion context.
    pub fn completion_accepted(&self, document: DocumentId, accepted: &Candidate) {
        let Some(session) = self.session(document) else {
            return;
        };

        let edits = accepted.additional_edits();
        if !edits.is_empty() {
            debug!(%document, count = edits.len(), "applying additional edits for accepted candidate");
            self.editor.apply_edits(edits);
        }

        for handle in session.handles() {
            handle.state.lock().invalidate();
        }
        self.editor.hide_menu();
    }

    /// Tear down all session state for a closed document. Pending debounce
    /// timers are aborted; in-flight responses for it are discarded on
    /// arrival.
    pub fn document_closed(&self, document: DocumentId) {
        if self.sessions.remove(&document).is_some() {
            info!(%document, "closing completion session");
        }
    }

    /// Per-source statistics for a document, in attach order.
    pub fn source_stats(&self, document: DocumentId) -> Vec<(SourceId, SourceStats)> {
        self.session(document)
            .map(|session| {
                session
                    .handles()
                    .iter()
                    .map(|h| (h.source.id(), h.state.lock().stats.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn session(&self, document: DocumentId) -> Option<Arc<DocumentSession>> {
        self.sessions.get(&document).map(|e| e.value().clone())
    }

    /// Read the live anchor context from the editor.
    pub(crate) fn live_context(&self) -> Option<AnchorContext> {
        let cursor = self.editor.cursor();
        let line_text = self.editor.line_text(cursor.line)?;
        Some(AnchorContext::capture(&line_text, cursor.line, cursor.column))
    }

    async fn handle_event(&self, document: DocumentId) {
        let Some(session) = self.session(document) else {
            return;
        };
        let Some(live) = self.live_context() else {
            self.editor.hide_menu();
            return;
        };

        let handles = session.handles();
        if handles.is_empty() {
            return;
        }

        let line_text = self.editor.line_text(live.line).unwrap_or_default();
        let reset = context::reset_trigger(
            &line_text,
            live.cursor_column(),
            &self.config.trigger_characters,
        );

        let mut needs_update = false;
        for handle in &handles {
            let mut state = handle.state.lock();
            if reset.is_some() {
                // Member access starts a fresh completion context; whatever
                // the source returned for the previous word is dead weight.
                state.invalidate();
            }
            if !state.matches_context(&live) {
                needs_update = true;
                if !state.anchored_at(&live) {
                    // Anchor moved to a new word or line: the cache must be
                    // rebuilt from the next response.
                    state.context_changed = true;
                }
                state.note_context(&live);
            }
        }

        if needs_update || !self.editor.menu_visible() {
            self.render(&session, &live).await;
        }

        for handle in &handles {
            self.trigger_source(&session, handle, live.clone());
        }
    }

    /// Merge all sources' caches, rank against the current prefix, and drive
    /// the popup. Oversized merges yield for one scheduler tick first so the
    /// keystroke echo is never blocked by sort cost.
    pub(crate) async fn render(&self, session: &Arc<DocumentSession>, live: &AnchorContext) {
        if !self.sessions.contains_key(&session.id) {
            return;
        }

        let mut merged: Vec<Candidate> = Vec::new();
        let mut slots: FxHashMap<CandidateKey, usize> = FxHashMap::default();
        for handle in session.handles() {
            let snapshot = handle.state.lock().snapshot();
            for candidate in snapshot {
                match slots.get(&candidate.key()) {
                    Some(&slot) => {
                        // Key collision across sources: keep the candidate
                        // with the higher last-assigned score.
                        if candidate.score > merged[slot].score {
                            merged[slot] = candidate;
                        }
                    }
                    None => {
                        slots.insert(candidate.key(), merged.len());
                        merged.push(candidate);
                    }
                }
            }
        }

        if merged.len() > self.config.defer_threshold {
            tokio::task::yield_now().await;
            // The context may have moved during the tick; rendering for a
            // dead anchor would flash stale results.
            match self.live_context() {
                Some(now) if now.same_anchor(live) => {}
                _ => return,
            }
        }

        let window = self
            .editor
            .line_window(live.line, self.config.proximity_radius);
        let mut pass = ScorePass::new(
            &live.prefix,
            live.line,
            &window,
            self.config.proximity_radius,
            self.config.keyword_suffix,
        );
        let ranked = ranking::rank(merged, &live.prefix, &mut pass, &self.config);

        if ranked.is_empty() {
            self.editor.hide_menu();
        } else if !self.editor.menu_item_selected() {
            self.editor.show_menu(live.anchor_column, &ranked);
        }
    }
}
