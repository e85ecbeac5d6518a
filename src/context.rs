//! Anchor context extraction and staleness detection
//!
//! The anchor context is the typed-prefix state at a point in time: the word
//! prefix under the cursor, the column where that word begins, and the line
//! number. Every request snapshot carries one, and every response is checked
//! against the live context before it is allowed to touch a cache. This
//! comparison, not locking, is what keeps the pipeline correct when responses
//! arrive out of order.

use ropey::Rope;

/// The typed-prefix state at a point in time.
///
/// A response captured under one context is *stale* if the live context at
/// arrival time differs in line or anchor column. The prefix is allowed to
/// have grown in the meantime, since filtering happens post-hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorContext {
    /// Characters of the current word typed so far, up to the cursor.
    pub prefix: String,

    /// Column (in characters) where the current word begins.
    pub anchor_column: u32,

    /// Line the cursor is on.
    pub line: u32,
}

impl AnchorContext {
    /// Capture the anchor context from a line of text and a cursor column.
    ///
    /// Walks backward from the cursor over identifier characters to find the
    /// start of the current word. Columns are character offsets, not bytes.
    pub fn capture(line_text: &str, line: u32, cursor_column: u32) -> Self {
        let chars: Vec<char> = line_text.chars().collect();
        let cursor = (cursor_column as usize).min(chars.len());

        let mut start = cursor;
        while start > 0 && is_identifier_char(chars[start - 1]) {
            start -= 1;
        }

        Self {
            prefix: chars[start..cursor].iter().collect(),
            anchor_column: start as u32,
            line,
        }
    }

    /// Capture from a rope buffer, as handed across the editor seam.
    ///
    /// Returns `None` if the line does not exist in the buffer.
    pub fn capture_from_rope(text: &Rope, line: u32, cursor_column: u32) -> Option<Self> {
        let line_text: String = text.get_line(line as usize)?.chars().collect();
        let trimmed = line_text.trim_end_matches(['\n', '\r']);
        Some(Self::capture(trimmed, line, cursor_column))
    }

    /// The cursor column implied by this context (anchor + prefix length).
    pub fn cursor_column(&self) -> u32 {
        self.anchor_column + self.prefix.chars().count() as u32
    }

    /// Whether two contexts share the same anchor column and line.
    ///
    /// This is the staleness test: a grown prefix does not make a response
    /// stale, but a moved anchor or a changed line does.
    pub fn same_anchor(&self, other: &Self) -> bool {
        self.anchor_column == other.anchor_column && self.line == other.line
    }
}

/// Check whether a character belongs to an identifier word.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Return the context-reset trigger character immediately before the cursor,
/// if any.
///
/// A member-access trigger (e.g. `.`) directly before the cursor signals a
/// fresh completion context: cached candidates from the previous word are no
/// longer valid and must be cleared.
pub fn reset_trigger(line_text: &str, cursor_column: u32, triggers: &[char]) -> Option<char> {
    if cursor_column == 0 {
        return None;
    }
    let before = line_text.chars().nth(cursor_column as usize - 1)?;
    triggers.contains(&before).then_some(before)
}

/// A window of buffer lines around the cursor, used by the scoring engine's
/// cursor-proximity bonus.
#[derive(Debug, Clone, Default)]
pub struct LineWindow {
    /// Absolute line number of the first entry in `lines`.
    pub start_line: u32,

    /// Consecutive line texts starting at `start_line`.
    pub lines: Vec<String>,
}

impl LineWindow {
    pub fn new(start_line: u32, lines: Vec<String>) -> Self {
        Self { start_line, lines }
    }

    /// Slice a window of `radius` lines either side of `center` out of a rope.
    pub fn from_rope(text: &Rope, center: u32, radius: u32) -> Self {
        let total = text.len_lines() as u32;
        let start = center.saturating_sub(radius);
        let end = (center + radius + 1).min(total);

        let lines = (start..end)
            .filter_map(|i| text.get_line(i as usize))
            .map(|l| l.chars().collect::<String>())
            .collect();

        Self {
            start_line: start,
            lines,
        }
    }

    /// Minimum line distance from `cursor_line` to a line containing `needle`
    /// as a literal substring, or `None` if no line in the window does.
    pub fn min_distance_to(&self, needle: &str, cursor_line: u32) -> Option<u32> {
        if needle.is_empty() {
            return None;
        }
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.contains(needle))
            .map(|(i, _)| {
                let abs = self.start_line + i as u32;
                abs.abs_diff(cursor_line)
            })
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_mid_word() {
        let ctx = AnchorContext::capture("let foo_bar = baz", 3, 11);
        assert_eq!(ctx.prefix, "foo_bar");
        assert_eq!(ctx.anchor_column, 4);
        assert_eq!(ctx.line, 3);
        assert_eq!(ctx.cursor_column(), 11);
    }

    #[test]
    fn test_capture_at_line_start() {
        let ctx = AnchorContext::capture("foo", 0, 2);
        assert_eq!(ctx.prefix, "fo");
        assert_eq!(ctx.anchor_column, 0);
    }

    #[test]
    fn test_capture_after_member_access() {
        let ctx = AnchorContext::capture("obj.fie", 0, 7);
        assert_eq!(ctx.prefix, "fie");
        assert_eq!(ctx.anchor_column, 4);
    }

    #[test]
    fn test_capture_empty_prefix_after_dot() {
        let ctx = AnchorContext::capture("obj.", 0, 4);
        assert_eq!(ctx.prefix, "");
        assert_eq!(ctx.anchor_column, 4);
    }

    #[test]
    fn test_capture_cursor_past_line_end() {
        let ctx = AnchorContext::capture("ab", 0, 99);
        assert_eq!(ctx.prefix, "ab");
        assert_eq!(ctx.anchor_column, 0);
    }

    #[test]
    fn test_capture_from_rope_strips_newline() {
        let rope = Rope::from_str("first\nsec.ond\n");
        let ctx = AnchorContext::capture_from_rope(&rope, 1, 7).unwrap();
        assert_eq!(ctx.prefix, "ond");
        assert_eq!(ctx.anchor_column, 4);
    }

    #[test]
    fn test_same_anchor_ignores_grown_prefix() {
        let captured = AnchorContext::capture("foo.ba", 2, 6);
        let live = AnchorContext::capture("foo.bar", 2, 7);
        assert!(captured.same_anchor(&live));
    }

    #[test]
    fn test_same_anchor_rejects_moved_anchor() {
        let captured = AnchorContext::capture("foo bar", 2, 3);
        let live = AnchorContext::capture("foo bar", 2, 7);
        assert!(!captured.same_anchor(&live));
    }

    #[test]
    fn test_reset_trigger_detects_dot() {
        assert_eq!(reset_trigger("obj.", 4, &['.']), Some('.'));
        assert_eq!(reset_trigger("obj.fie", 7, &['.']), None);
        assert_eq!(reset_trigger("", 0, &['.']), None);
    }

    #[test]
    fn test_line_window_min_distance() {
        let window = LineWindow::new(
            10,
            vec![
                "alpha".to_string(),
                "beta".to_string(),
                "alpha again".to_string(),
            ],
        );
        // "alpha" appears on lines 10 and 12; cursor on line 12.
        assert_eq!(window.min_distance_to("alpha", 12), Some(0));
        assert_eq!(window.min_distance_to("beta", 12), Some(1));
        assert_eq!(window.min_distance_to("gamma", 12), None);
        assert_eq!(window.min_distance_to("", 12), None);
    }

    #[test]
    fn test_line_window_from_rope_clamps_at_edges() {
        let rope = Rope::from_str("a\nb\nc\nd\n");
        let window = LineWindow::from_rope(&rope, 0, 2);
        assert_eq!(window.start_line, 0);
        assert!(window.lines.len() >= 3);
    }
}
