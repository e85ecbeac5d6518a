//! Engine configuration and extension hooks
//!
//! All knobs have defaults tuned for interactive typing; hosts override only
//! what they need. The three extension hooks (candidate refinement, score
//! adjustment, ranked-list post-processing) and the kind-label formatter
//! default to identity behavior.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lsp_types::CompletionItemKind;

use crate::candidate::{self, Candidate};

/// Formats a completion kind into a short popup tag.
pub type KindLabelFn = Arc<dyn Fn(Option<CompletionItemKind>) -> String + Send + Sync>;

/// Post-processes a formatted candidate during ingestion.
pub type RefineCandidateFn = Arc<dyn Fn(Candidate) -> Candidate + Send + Sync>;

/// Adjusts a computed fuzzy score given the candidate it belongs to.
pub type AdjustScoreFn = Arc<dyn Fn(&Candidate, f64) -> f64 + Send + Sync>;

/// Post-processes the final ranked list before display.
pub type RefineRankedFn = Arc<dyn Fn(Vec<Candidate>) -> Vec<Candidate> + Send + Sync>;

/// Configuration for the completion engine.
#[derive(Clone)]
pub struct EngineConfig {
    /// Quiet period before a debounced request is issued. Prefixes of length
    /// one or less bypass the debounce entirely.
    pub debounce_delay: Duration,

    /// Fixed character width for popup display labels. 0 disables formatting.
    pub display_width: usize,

    /// Characters that reset the completion context when typed directly
    /// before the cursor (member access and friends).
    pub trigger_characters: Vec<char>,

    /// Optional suffix character marking keyword/named-parameter style
    /// candidates, awarded a fixed scoring bonus. `None` disables the rule.
    pub keyword_suffix: Option<char>,

    /// When the likely (prefix-matching) partition has at most this many
    /// members, the unlikely partition is fuzzy-ranked instead and presented
    /// first, so sparse contexts still get useful ordering.
    pub likely_fallback_threshold: usize,

    /// Merged candidate sets larger than this defer the ranking/display pass
    /// by one scheduler tick to keep keystroke echo unblocked.
    pub defer_threshold: usize,

    /// Truncate the presented list to this many entries. 0 means unlimited.
    pub max_results: usize,

    /// Radius (in lines) of the window scanned for the cursor-proximity
    /// bonus. Also sets the decay horizon: a hit `d` lines away scores
    /// `base^(radius - d)`.
    pub proximity_radius: u32,

    /// Kind tag formatter.
    pub kind_label: KindLabelFn,

    /// Candidate refinement hook, applied after formatting at ingestion.
    pub refine_candidate: RefineCandidateFn,

    /// Score adjustment hook, applied to every fuzzy score in a ranking pass.
    pub adjust_score: AdjustScoreFn,

    /// Ranked-list post-processing hook, applied after ordinal assignment.
    pub refine_ranked: RefineRankedFn,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(2),
            display_width: 40,
            trigger_characters: vec!['.'],
            keyword_suffix: Some('='),
            likely_fallback_threshold: 2,
            defer_threshold: 1000,
            max_results: 0,
            proximity_radius: 20,
            kind_label: Arc::new(candidate::default_kind_label),
            refine_candidate: Arc::new(|candidate| candidate),
            adjust_score: Arc::new(|_, score| score),
            refine_ranked: Arc::new(|ranked| ranked),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("debounce_delay", &self.debounce_delay)
            .field("display_width", &self.display_width)
            .field("trigger_characters", &self.trigger_characters)
            .field("keyword_suffix", &self.keyword_suffix)
            .field("likely_fallback_threshold", &self.likely_fallback_threshold)
            .field("defer_threshold", &self.defer_threshold)
            .field("max_results", &self.max_results)
            .field("proximity_radius", &self.proximity_radius)
            .finish_non_exhaustive()
    }
}
