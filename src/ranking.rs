//! Ordering and partitioning of merged candidate sets
//!
//! Candidates are split into *likely* matches (case-insensitive prefix match
//! on the insert text) and *unlikely* ones. Whichever partition is chosen as
//! primary gets fuzzy-ranked; the other trails in arrival order. When the
//! likely set is too small to be meaningful, the unlikely set is ranked
//! instead, so sparse or ambiguous contexts still get fuzzy-ordered results
//! rather than an arbitrary one-or-two-item "exact" set dominating.
//!
//! After ordering, every candidate's score is overwritten with its 1-based
//! ordinal in the final list. Downstream consumers sort purely by this
//! ordinal, so presentation order is deterministic regardless of the numeric
//! fuzzy scale used internally.

use std::cmp::Ordering;

use crate::candidate::Candidate;
use crate::config::EngineConfig;
use crate::scoring::ScorePass;

/// Rank a merged candidate set against the current prefix.
///
/// Consumes the arrival-ordered set and returns the final presentation list
/// with ordinal scores assigned.
pub fn rank(
    candidates: Vec<Candidate>,
    prefix: &str,
    pass: &mut ScorePass<'_>,
    config: &EngineConfig,
) -> Vec<Candidate> {
    let prefix_lower = prefix.to_lowercase();

    let (mut likely, mut unlikely): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(|c| c.insert_text.to_lowercase().starts_with(&prefix_lower));

    let mut ordered = if likely.len() > config.likely_fallback_threshold {
        sort_by_score(&mut likely, pass, config);
        likely.extend(unlikely);
        likely
    } else {
        // Sparse likely set: fuzzy-rank the unlikely set and present it
        // first, with the few likely matches trailing in arrival order.
        sort_by_score(&mut unlikely, pass, config);
        unlikely.extend(likely);
        unlikely
    };

    for (i, candidate) in ordered.iter_mut().enumerate() {
        candidate.score = (i + 1) as f64;
    }

    let mut ordered = (config.refine_ranked)(ordered);
    if config.max_results > 0 && ordered.len() > config.max_results {
        ordered.truncate(config.max_results);
    }
    ordered
}

/// Score and sort one partition: fuzzy score descending, ties broken by
/// shorter insert text, then lexicographically.
fn sort_by_score(candidates: &mut [Candidate], pass: &mut ScorePass<'_>, config: &EngineConfig) {
    for candidate in candidates.iter_mut() {
        let fuzzy = pass.score(&candidate.insert_text);
        candidate.score = (config.adjust_score)(candidate, fuzzy);
    }

    candidates.sort_by(|a, b| {
        match b.score.partial_cmp(&a.score) {
            Some(Ordering::Equal) | None => a
                .insert_text
                .chars()
                .count()
                .cmp(&b.insert_text.chars().count())
                .then_with(|| a.insert_text.cmp(&b.insert_text)),
            Some(ord) => ord,
        }
    });
}
