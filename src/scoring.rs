//! Fuzzy scoring of candidate text against a typed prefix
//!
//! The score is a pure, deterministic, additive accumulation over:
//! 1. Abbreviation matching against the candidate's structural parts
//!    (underscore segments, further split on camelCase boundaries)
//! 2. Greedy character coverage with a positional-alignment premium
//! 3. Case-sensitive and case-insensitive prefix-start bonuses
//! 4. A penalty for very short candidates (noise matches)
//! 5. A consecutive positional run bonus
//! 6. An exponentially decaying cursor-proximity bonus for candidates that
//!    appear literally near the cursor line
//! 7. An optional keyword-suffix hint bonus (pluggable, off by default in the
//!    engine itself)
//!
//! The proximity bonus is additive, not multiplicative: scaling the whole
//! score distorts tie-breaks for near-zero base scores and destabilizes the
//! final sort.
//!
//! Scores are only meaningful within one ranking pass; `ScorePass` memoizes
//! by candidate text so the same identifier arriving from several sources is
//! scored once.

use rustc_hash::FxHashMap;

use crate::context::LineWindow;

/// Flat bonus added on top of the prefix length for a full abbreviation match.
const ABBREVIATION_BONUS: f64 = 20.0;

/// Flat bonus added on top of the prefix length for a partial abbreviation.
const PARTIAL_ABBREVIATION_BONUS: f64 = 10.0;

/// Points for a prefix character consumed at the same index as the candidate
/// character it matched.
const POSITIONAL_MATCH: f64 = 2.0;

/// Points for a prefix character consumed out of position.
const FUZZY_MATCH: f64 = 1.0;

/// Bonus when the candidate starts with the prefix, case-sensitively.
const CASE_PREFIX_BONUS: f64 = 10.0;

/// Bonus when the candidate starts with the prefix ignoring case.
const ICASE_PREFIX_BONUS: f64 = 5.0;

/// Candidates shorter than this are penalized as likely noise.
const MIN_CANDIDATE_LEN: usize = 4;

/// Penalty applied to candidates below `MIN_CANDIDATE_LEN`.
const SHORT_CANDIDATE_PENALTY: f64 = 5.0;

/// Decay base: a hit `d` lines away scores `PROXIMITY_BASE^(radius - d)`.
const PROXIMITY_BASE: f64 = 1.15;

/// Bonus for candidates ending in the configured keyword-suffix character.
const KEYWORD_SUFFIX_BONUS: f64 = 6.0;

/// Outcome of walking the prefix across a candidate's structural parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abbreviation {
    /// Every prefix character was consumed by leading characters of
    /// consecutive parts (e.g. `tlf` against `this_long_function`).
    Full,
    /// Some but not all prefix characters were consumed before matching
    /// failed partway.
    Partial,
    /// No prefix character matched a part's leading characters.
    None,
}

/// Split candidate text into structural parts: first on underscores, then on
/// uppercase boundaries within each segment.
pub fn decompose(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for segment in text.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut current = String::new();
        for c in segment.chars() {
            if c.is_uppercase() && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            parts.push(current);
        }
    }
    parts
}

/// Walk the prefix across the parts in order, consuming as many leading
/// characters of the remaining prefix as match each part's leading
/// characters.
pub fn abbreviation(parts: &[String], prefix: &str) -> Abbreviation {
    let prefix_chars: Vec<char> = prefix.chars().collect();
    if prefix_chars.is_empty() || parts.is_empty() {
        return Abbreviation::None;
    }

    let mut consumed = 0;
    for part in parts {
        for c in part.chars() {
            if consumed < prefix_chars.len() && chars_eq_fold(c, prefix_chars[consumed]) {
                consumed += 1;
            } else {
                break;
            }
        }
        if consumed == prefix_chars.len() {
            return Abbreviation::Full;
        }
    }

    if consumed > 0 {
        Abbreviation::Partial
    } else {
        Abbreviation::None
    }
}

/// Compute the relevance score of `text` against `prefix` at the given cursor
/// position. Deterministic and side-effect free.
pub fn score_candidate(
    text: &str,
    prefix: &str,
    cursor_line: u32,
    window: &LineWindow,
    proximity_radius: u32,
    keyword_suffix: Option<char>,
) -> f64 {
    let mut score = 0.0;
    let text_chars: Vec<char> = text.chars().collect();
    let prefix_chars: Vec<char> = prefix.chars().collect();

    // Abbreviation bonus over structural parts (only meaningful when the
    // candidate actually decomposes).
    let parts = decompose(text);
    if parts.len() > 1 {
        match abbreviation(&parts, prefix) {
            Abbreviation::Full => score += prefix_chars.len() as f64 + ABBREVIATION_BONUS,
            Abbreviation::Partial => {
                score += prefix_chars.len() as f64 + PARTIAL_ABBREVIATION_BONUS
            }
            Abbreviation::None => {}
        }
    }

    // Greedy character coverage: each prefix character is usable once, with a
    // premium for positional alignment.
    let mut used = vec![false; prefix_chars.len()];
    for (i, &c) in text_chars.iter().enumerate() {
        let found = prefix_chars
            .iter()
            .enumerate()
            .position(|(j, &p)| !used[j] && chars_eq_fold(c, p));
        if let Some(j) = found {
            used[j] = true;
            score += if j == i { POSITIONAL_MATCH } else { FUZZY_MATCH };
        }
    }

    // Prefix-start bonuses. A case-sensitive start implies the
    // case-insensitive one, so both stack.
    if !prefix.is_empty() {
        if text.starts_with(prefix) {
            score += CASE_PREFIX_BONUS + ICASE_PREFIX_BONUS;
        } else if starts_with_fold(&text_chars, &prefix_chars) {
            score += ICASE_PREFIX_BONUS;
        }
    }

    // Deprioritize very short candidates.
    if text_chars.len() < MIN_CANDIDATE_LEN {
        score -= SHORT_CANDIDATE_PENALTY;
    }

    // One point per character of the longest positional run starting at
    // index 1.
    let mut i = 1;
    while i < text_chars.len() && i < prefix_chars.len() && chars_eq_fold(text_chars[i], prefix_chars[i])
    {
        score += 1.0;
        i += 1;
    }

    // Cursor-proximity: literal occurrences within `proximity_radius` lines
    // of the cursor earn an exponentially decaying bonus.
    if let Some(distance) = window.min_distance_to(text, cursor_line) {
        if distance <= proximity_radius {
            score += PROXIMITY_BASE.powi((proximity_radius - distance) as i32);
        }
    }

    // Keyword/named-parameter hint.
    if let Some(suffix) = keyword_suffix {
        if text.ends_with(suffix) {
            score += KEYWORD_SUFFIX_BONUS;
        }
    }

    score
}

/// One ranking pass's scoring state: fixed context plus a memo table keyed by
/// candidate text, so identical texts from different sources are scored once.
pub struct ScorePass<'a> {
    prefix: &'a str,
    cursor_line: u32,
    window: &'a LineWindow,
    proximity_radius: u32,
    keyword_suffix: Option<char>,
    memo: FxHashMap<String, f64>,
}

impl<'a> ScorePass<'a> {
    pub fn new(
        prefix: &'a str,
        cursor_line: u32,
        window: &'a LineWindow,
        proximity_radius: u32,
        keyword_suffix: Option<char>,
    ) -> Self {
        Self {
            prefix,
            cursor_line,
            window,
            proximity_radius,
            keyword_suffix,
            memo: FxHashMap::default(),
        }
    }

    /// Score a candidate text, memoized for the duration of this pass.
    pub fn score(&mut self, text: &str) -> f64 {
        if let Some(&cached) = self.memo.get(text) {
            return cached;
        }
        let score = score_candidate(
            text,
            self.prefix,
            self.cursor_line,
            self.window,
            self.proximity_radius,
            self.keyword_suffix,
        );
        self.memo.insert(text.to_string(), score);
        score
    }
}

fn chars_eq_fold(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn starts_with_fold(text: &[char], prefix: &[char]) -> bool {
    prefix.len() <= text.len()
        && text
            .iter()
            .zip(prefix.iter())
            .all(|(&t, &p)| chars_eq_fold(t, p))
}
