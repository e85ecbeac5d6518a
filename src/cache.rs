//! Per-(document, source) candidate cache and request-tracking state
//!
//! Each attached source owns one `SourceState` per document. The cache keeps
//! candidates in insertion order and collapses same-key arrivals into the
//! existing slot, which preserves a candidate's visual position while the
//! user retypes. Invalidation is context-driven: a moved anchor, a changed
//! line, or a member-access trigger clears the cache outright, so the cache
//! never needs a size limit in practice.
//!
//! A `SourceState` is only ever mutated inside its own source's event
//! callbacks (trigger, timer fire, response arrival) and read by the
//! coordinator during merge, so a short-held mutex is all the protection it
//! needs.

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::candidate::{Candidate, CandidateKey};
use crate::context::AnchorContext;

/// Counters for one (document, source) pair, for monitoring and tests.
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    /// Raw items accepted into the cache (replacements + appends).
    pub ingested: u64,

    /// Same-key arrivals that replaced an existing slot in place.
    pub replaced: u64,

    /// New keys appended to the cache.
    pub appended: u64,

    /// Cache invalidations (context changes, resets, acceptance).
    pub invalidations: u64,

    /// Requests actually issued to the source.
    pub issued: u64,

    /// Triggers coalesced into an already-in-flight request.
    pub coalesced: u64,

    /// Debounce timers started (including replacements).
    pub debounced: u64,

    /// Responses discarded because their context went stale in flight.
    pub stale_discards: u64,

    /// Transport failures recovered as empty replies.
    pub transport_failures: u64,
}

/// State for one (document, source) pair.
pub struct SourceState {
    cache: Vec<Candidate>,
    index: FxHashMap<CandidateKey, usize>,

    /// Prefix recorded at the last trigger for this source.
    pub last_prefix: Option<String>,

    /// Anchor column recorded at the last trigger.
    pub last_anchor_column: Option<u32>,

    /// Line recorded at the last trigger.
    pub last_line: Option<u32>,

    /// Set when the completion context moved; the next ingest clears the
    /// cache first and rebuilds cleanly.
    pub context_changed: bool,

    /// At most one request may be in flight per (document, source).
    pub request_in_flight: bool,

    /// A trigger arrived while a request was in flight; exactly one follow-up
    /// request is issued when the in-flight one resolves.
    pub request_pending: bool,

    /// The single pending debounce timer for this state, if any. Replacing it
    /// aborts the previous one.
    pub(crate) debounce: Option<JoinHandle<()>>,

    /// Monitoring counters.
    pub stats: SourceStats,
}

impl SourceState {
    pub fn new() -> Self {
        Self {
            cache: Vec::new(),
            index: FxHashMap::default(),
            last_prefix: None,
            last_anchor_column: None,
            last_line: None,
            context_changed: false,
            request_in_flight: false,
            request_pending: false,
            debounce: None,
            stats: SourceStats::default(),
        }
    }

    /// Ingest a resolved batch from this state's source.
    ///
    /// If the context changed since the cache was built, the cache is cleared
    /// first. Same-key candidates replace their existing slot in place; new
    /// keys append.
    pub fn ingest(&mut self, batch: Vec<Candidate>) {
        if self.context_changed {
            self.clear();
            self.context_changed = false;
            self.stats.invalidations += 1;
        }

        for candidate in batch {
            let key = candidate.key();
            match self.index.get(&key) {
                Some(&slot) => {
                    self.cache[slot] = candidate;
                    self.stats.replaced += 1;
                }
                None => {
                    self.index.insert(key, self.cache.len());
                    self.cache.push(candidate);
                    self.stats.appended += 1;
                }
            }
            self.stats.ingested += 1;
        }
    }

    /// Cached candidates in insertion order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.cache
    }

    /// Owned copy of the cache for the merge pass.
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.cache.clone()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop all cached candidates immediately (context reset, acceptance).
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            debug!(dropped = self.cache.len(), "invalidating candidate cache");
            self.stats.invalidations += 1;
        }
        self.clear();
        self.context_changed = false;
    }

    /// Record the context of the latest trigger.
    pub fn note_context(&mut self, ctx: &AnchorContext) {
        self.last_prefix = Some(ctx.prefix.clone());
        self.last_anchor_column = Some(ctx.anchor_column);
        self.last_line = Some(ctx.line);
    }

    /// Whether the stored last context matches `ctx` exactly (prefix, anchor
    /// column and line).
    pub fn matches_context(&self, ctx: &AnchorContext) -> bool {
        self.last_prefix.as_deref() == Some(ctx.prefix.as_str())
            && self.last_anchor_column == Some(ctx.anchor_column)
            && self.last_line == Some(ctx.line)
    }

    /// Whether the stored last context shares `ctx`'s anchor column and line.
    pub fn anchored_at(&self, ctx: &AnchorContext) -> bool {
        self.last_anchor_column == Some(ctx.anchor_column) && self.last_line == Some(ctx.line)
    }

    /// Replace the pending debounce timer, aborting any previous one.
    pub(crate) fn replace_debounce(&mut self, handle: JoinHandle<()>) {
        self.cancel_debounce();
        self.debounce = Some(handle);
    }

    /// Abort the pending debounce timer, if any.
    pub(crate) fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    fn clear(&mut self) {
        self.cache.clear();
        self.index.clear();
    }
}

impl Default for SourceState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SourceState {
    fn drop(&mut self) {
        self.cancel_debounce();
    }
}
