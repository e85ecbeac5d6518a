//! Candidate records, dedup keys and display formatting
//!
//! A `Candidate` is the resolved, immutable-after-creation form of one raw
//! suggestion. The raw LSP item rides along untouched so that post-insertion
//! side effects (additional text edits) can be resolved on acceptance; the
//! core never inspects it beyond the fields resolved here at ingestion time.

use lsp_types::{CompletionItem, CompletionItemKind, CompletionTextEdit, TextEdit};
use serde::Serialize;
use tracing::trace;

use crate::config::EngineConfig;
use crate::source::SourceId;

/// Identity key for dedup and in-place replacement.
///
/// Two raw suggestions with the same key are the same candidate: a later
/// arrival replaces the cached one in its slot rather than appending, which
/// preserves the candidate's visual position during retyping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub insert_text: String,
    pub detail: Option<String>,
    pub display_label: String,
}

/// One resolved completion suggestion.
///
/// Immutable after creation except for `score`, which is recomputed on every
/// ranking pass and finally overwritten with the candidate's 1-based ordinal
/// in the presented list.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Text inserted into the buffer on acceptance.
    pub insert_text: String,

    /// Label shown in the popup, truncated or padded to the configured
    /// display width.
    pub display_label: String,

    /// Short tag describing the item kind (function, variable, ...).
    pub kind_tag: String,

    /// Optional one-line detail from the source.
    pub detail: Option<String>,

    /// Source that produced this candidate.
    pub source_id: SourceId,

    /// Ranking score. Only meaningful within one ranking pass.
    pub score: f64,

    /// The raw item as received from the source.
    pub raw: CompletionItem,
}

impl Candidate {
    /// Resolve a raw suggestion into a candidate.
    ///
    /// Returns `None` for malformed items whose resolved insert text is
    /// empty; such items are skipped individually without aborting the batch.
    pub fn from_raw(raw: CompletionItem, source_id: SourceId, config: &EngineConfig) -> Option<Self> {
        let insert_text = match resolve_insert_text(&raw) {
            Some(text) => text.to_string(),
            None => {
                trace!(label = %raw.label, "skipping raw suggestion without usable text");
                return None;
            }
        };

        let candidate = Self {
            display_label: format_display_label(&raw.label, config.display_width),
            kind_tag: (config.kind_label)(raw.kind),
            detail: raw.detail.clone(),
            source_id,
            score: 0.0,
            insert_text,
            raw,
        };

        Some((config.refine_candidate)(candidate))
    }

    /// Dedup key for this candidate.
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            insert_text: self.insert_text.clone(),
            detail: self.detail.clone(),
            display_label: self.display_label.clone(),
        }
    }

    /// Additional text edits to apply when this candidate is accepted.
    pub fn additional_edits(&self) -> &[TextEdit] {
        self.raw
            .additional_text_edits
            .as_deref()
            .unwrap_or_default()
    }

    /// Serializable popup-row view of this candidate for host frontends.
    pub fn menu_row(&self) -> MenuRow<'_> {
        MenuRow {
            word: &self.insert_text,
            abbr: &self.display_label,
            kind: &self.kind_tag,
            menu: self.detail.as_deref(),
        }
    }
}

/// Popup-row projection sent across the host UI seam.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRow<'a> {
    /// Text inserted on acceptance.
    pub word: &'a str,

    /// Fixed-width display label.
    pub abbr: &'a str,

    /// Kind tag.
    pub kind: &'a str,

    /// Detail line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<&'a str>,
}

/// Insert-text resolution precedence: `textEdit.newText`, then `insertText`,
/// then the label itself. Returns `None` if the winner is empty.
pub fn resolve_insert_text(raw: &CompletionItem) -> Option<&str> {
    let text = match &raw.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => edit.new_text.as_str(),
        Some(CompletionTextEdit::InsertAndReplace(edit)) => edit.new_text.as_str(),
        None => raw
            .insert_text
            .as_deref()
            .unwrap_or(raw.label.as_str()),
    };
    (!text.is_empty()).then_some(text)
}

/// Truncate or pad a label to a fixed character width.
///
/// Width 0 disables formatting and returns the label unchanged.
pub fn format_display_label(label: &str, width: usize) -> String {
    if width == 0 {
        return label.to_string();
    }
    let mut out: String = label.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

/// Default mapping from an LSP completion kind to a short popup tag.
pub fn default_kind_label(kind: Option<CompletionItemKind>) -> String {
    let tag = match kind {
        Some(CompletionItemKind::TEXT) => "text",
        Some(CompletionItemKind::METHOD) => "method",
        Some(CompletionItemKind::FUNCTION) => "fn",
        Some(CompletionItemKind::CONSTRUCTOR) => "new",
        Some(CompletionItemKind::FIELD) => "field",
        Some(CompletionItemKind::VARIABLE) => "var",
        Some(CompletionItemKind::CLASS) => "class",
        Some(CompletionItemKind::INTERFACE) => "iface",
        Some(CompletionItemKind::MODULE) => "mod",
        Some(CompletionItemKind::PROPERTY) => "prop",
        Some(CompletionItemKind::UNIT) => "unit",
        Some(CompletionItemKind::VALUE) => "value",
        Some(CompletionItemKind::ENUM) => "enum",
        Some(CompletionItemKind::KEYWORD) => "keyword",
        Some(CompletionItemKind::SNIPPET) => "snippet",
        Some(CompletionItemKind::COLOR) => "color",
        Some(CompletionItemKind::FILE) => "file",
        Some(CompletionItemKind::REFERENCE) => "ref",
        Some(CompletionItemKind::FOLDER) => "dir",
        Some(CompletionItemKind::ENUM_MEMBER) => "member",
        Some(CompletionItemKind::CONSTANT) => "const",
        Some(CompletionItemKind::STRUCT) => "struct",
        Some(CompletionItemKind::EVENT) => "event",
        Some(CompletionItemKind::OPERATOR) => "op",
        Some(CompletionItemKind::TYPE_PARAMETER) => "typaram",
        _ => "",
    };
    tag.to_string()
}
