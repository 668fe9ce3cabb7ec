//! Character spans and word-boundary expansion.
//!
//! All offsets in this crate are **char** offsets into the article text,
//! half-open: `[start, end)`. Benchmarks and prediction files disagree on
//! whether a mention like `"Obama's"` covers the apostrophe, so matching is
//! done under a word-boundary-tolerant rule: a predicted span matches a
//! ground-truth span if either the exact spans or their word-boundary
//! expansions coincide.
//!
//! # Example
//!
//! ```
//! use linkeval::span::{Span, expand_to_word_boundaries};
//!
//! let text: Vec<char> = "The Eiffel Tower".chars().collect();
//! // "iffel" expands to the enclosing word "Eiffel"
//! let expanded = expand_to_word_boundaries(Span::new(5, 10), &text);
//! assert_eq!(expanded, Span::new(4, 10));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open character interval `[start, end)` into the article text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (char index, inclusive).
    pub start: usize,
    /// End offset (char index, exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in chars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if two spans share at least one character.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if `other` is a strict subspan (contained but not equal).
    #[must_use]
    pub fn strictly_contains(&self, other: &Span) -> bool {
        self.contains(other) && *self != *other
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Characters that glue a span to its surrounding word.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '"' || c == '_'
}

/// Widen a span to the nearest word boundaries of `text`.
///
/// The left edge moves backward while the preceding character is alphanumeric
/// or one of `'`, `"`, `_`; the right edge moves forward under the same rule.
/// A leading `"` gained during expansion with no matching `"` before the
/// original right edge is given back, so a preceding quotation mark is never
/// swallowed into the mention.
///
/// Idempotent, and never shrinks: `expanded.start <= span.start` and
/// `expanded.end >= span.end`.
#[must_use]
pub fn expand_to_word_boundaries(span: Span, text: &[char]) -> Span {
    let mut start = span.start.min(text.len());
    let mut end = span.end.min(text.len());

    while start > 0 && is_word_char(text[start - 1]) {
        start -= 1;
    }
    while end < text.len() && is_word_char(text[end]) {
        end += 1;
    }

    // An opening quote picked up on the left during expansion is only kept
    // if it is closed inside the original span. A quote the caller's span
    // already covered is left alone.
    if start < span.start && start < end && text[start] == '"' {
        let closed = text[start + 1..span.end.min(text.len())]
            .iter()
            .any(|&c| c == '"');
        if !closed {
            start += 1;
        }
    }

    Span::new(start, end)
}

/// Extract the surface text of a span.
#[must_use]
pub fn span_text(span: Span, text: &[char]) -> String {
    text[span.start.min(text.len())..span.end.min(text.len())]
        .iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5);
        let b = Span::new(4, 8);
        let c = Span::new(5, 8);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(&Span::new(1, 4)));
        assert!(a.strictly_contains(&Span::new(1, 4)));
        assert!(!a.strictly_contains(&a));
    }

    #[test]
    fn test_expand_mid_word() {
        let text = chars("The Eiffel Tower");
        assert_eq!(
            expand_to_word_boundaries(Span::new(5, 10), &text),
            Span::new(4, 10)
        );
    }

    #[test]
    fn test_expand_already_bounded() {
        let text = chars("The Eiffel Tower");
        let span = Span::new(4, 10);
        assert_eq!(expand_to_word_boundaries(span, &text), span);
    }

    #[test]
    fn test_expand_idempotent() {
        let text = chars("Angela Merkel's cabinet");
        let once = expand_to_word_boundaries(Span::new(7, 13), &text);
        let twice = expand_to_word_boundaries(once, &text);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_expand_apostrophe() {
        let text = chars("Angela Merkel's cabinet");
        // "Merkel" expands over the possessive
        assert_eq!(
            expand_to_word_boundaries(Span::new(7, 13), &text),
            Span::new(7, 15)
        );
    }

    #[test]
    fn test_expand_unmatched_quote_given_back() {
        let text = chars("He said \"Bonn is nice");
        // Left expansion would swallow the opening quote of a quotation that
        // never closes inside the mention; it must be given back.
        let span = Span::new(9, 13); // "Bonn"
        assert_eq!(expand_to_word_boundaries(span, &text), span);
    }

    #[test]
    fn test_expand_quote_inside_span_not_given_back() {
        let text = chars("\"Bonn is nice");
        // The unmatched quote was already covered by the input span, not
        // gained during expansion; the result must never shrink below it.
        let span = Span::new(0, 5); // "Bonn
        let expanded = expand_to_word_boundaries(span, &text);
        assert_eq!(expanded, span);
        assert!(expanded.start <= span.start);
    }

    #[test]
    fn test_expand_quoted_mention_keeps_quotes() {
        let text = chars("the \"Foo\" act");
        // Both quotes are inside the expansion and the quote closes before
        // the original right edge, so the pair is kept.
        let span = Span::new(5, 9); // Foo"
        let expanded = expand_to_word_boundaries(span, &text);
        assert_eq!(expanded, Span::new(4, 9));
    }

    #[test]
    fn test_span_text() {
        let text = chars("Hello World");
        assert_eq!(span_text(Span::new(6, 11), &text), "World");
    }
}
