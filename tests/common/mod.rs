//! Scripted collaborator doubles for end-to-end engine tests.
//!
//! `ScriptedEditor` holds a mutable buffer/cursor/menu state the test drives
//! directly; `ScriptedSource` replays queued replies, optionally gated so a
//! test can hold a request "in flight" and release it at a chosen moment.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lsp_types::{CompletionItem, TextEdit};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use completion_mux::{
    Candidate, CursorPosition, EditorSurface, LineWindow, RequestContext, SourceError, SourceId,
    SourceReply, SuggestionSource,
};

pub struct ScriptedEditor {
    state: Mutex<EditorState>,
}

struct EditorState {
    lines: Vec<String>,
    cursor: CursorPosition,
    menu: Option<(u32, Vec<Candidate>)>,
    item_selected: bool,
    applied_edits: Vec<TextEdit>,
    show_calls: u32,
}

impl ScriptedEditor {
    pub fn new(text: &str, line: u32, column: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EditorState {
                lines: text.lines().map(str::to_string).collect(),
                cursor: CursorPosition { line, column },
                menu: None,
                item_selected: false,
                applied_edits: Vec::new(),
                show_calls: 0,
            }),
        })
    }

    /// Replace a line and move the cursor, as one edit event would.
    pub fn edit(&self, line: u32, text: &str, column: u32) {
        let mut state = self.state.lock();
        while state.lines.len() <= line as usize {
            state.lines.push(String::new());
        }
        state.lines[line as usize] = text.to_string();
        state.cursor = CursorPosition { line, column };
    }

    pub fn select_item(&self, selected: bool) {
        self.state.lock().item_selected = selected;
    }

    /// Insert texts of the currently displayed menu, if visible.
    pub fn menu_words(&self) -> Option<Vec<String>> {
        self.state
            .lock()
            .menu
            .as_ref()
            .map(|(_, items)| items.iter().map(|c| c.insert_text.clone()).collect())
    }

    pub fn menu_anchor(&self) -> Option<u32> {
        self.state.lock().menu.as_ref().map(|(anchor, _)| *anchor)
    }

    pub fn menu_candidates(&self) -> Vec<Candidate> {
        self.state
            .lock()
            .menu
            .as_ref()
            .map(|(_, items)| items.clone())
            .unwrap_or_default()
    }

    pub fn applied_edits(&self) -> Vec<TextEdit> {
        self.state.lock().applied_edits.clone()
    }

    pub fn show_calls(&self) -> u32 {
        self.state.lock().show_calls
    }
}

impl EditorSurface for ScriptedEditor {
    fn cursor(&self) -> CursorPosition {
        self.state.lock().cursor
    }

    fn line_text(&self, line: u32) -> Option<String> {
        self.state.lock().lines.get(line as usize).cloned()
    }

    fn line_window(&self, center: u32, radius: u32) -> LineWindow {
        let state = self.state.lock();
        let start = center.saturating_sub(radius) as usize;
        let end = ((center + radius + 1) as usize).min(state.lines.len());
        if start >= end {
            return LineWindow::default();
        }
        LineWindow::new(start as u32, state.lines[start..end].to_vec())
    }

    fn show_menu(&self, anchor_column: u32, candidates: &[Candidate]) {
        let mut state = self.state.lock();
        state.show_calls += 1;
        state.menu = Some((anchor_column, candidates.to_vec()));
    }

    fn hide_menu(&self) {
        self.state.lock().menu = None;
    }

    fn menu_visible(&self) -> bool {
        self.state.lock().menu.is_some()
    }

    fn menu_item_selected(&self) -> bool {
        self.state.lock().item_selected
    }

    fn apply_edits(&self, edits: &[TextEdit]) {
        self.state.lock().applied_edits.extend(edits.iter().cloned());
    }
}

pub struct ScriptedSource {
    id: SourceId,
    gate: Option<Arc<Semaphore>>,
    replies: Mutex<VecDeque<Result<SourceReply, SourceError>>>,
    default_items: Vec<CompletionItem>,
    requests: Mutex<Vec<RequestContext>>,
}

impl ScriptedSource {
    pub fn new(name: &str, default_items: Vec<CompletionItem>) -> Arc<Self> {
        Arc::new(Self {
            id: SourceId::new(name),
            gate: None,
            replies: Mutex::new(VecDeque::new()),
            default_items,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A source whose requests block until a permit is added to the returned
    /// gate, so the test controls exactly when each response arrives.
    pub fn gated(name: &str, default_items: Vec<CompletionItem>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(Self {
            id: SourceId::new(name),
            gate: Some(gate.clone()),
            replies: Mutex::new(VecDeque::new()),
            default_items,
            requests: Mutex::new(Vec::new()),
        });
        (source, gate)
    }

    pub fn push_reply(&self, reply: Result<SourceReply, SourceError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RequestContext> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSource {
    fn id(&self) -> SourceId {
        self.id.clone()
    }

    async fn request(&self, ctx: &RequestContext) -> Result<SourceReply, SourceError> {
        self.requests.lock().push(ctx.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        Ok(SourceReply::from(self.default_items.clone()))
    }
}

/// Shorthand for a raw completion item with just a label.
pub fn item(label: &str) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        ..Default::default()
    }
}

/// Raw completion item with a label and a detail line.
pub fn item_with_detail(label: &str, detail: &str) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        detail: Some(detail.to_string()),
        ..Default::default()
    }
}

/// Let spawned tasks, debounce timers and responses settle under paused time.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
