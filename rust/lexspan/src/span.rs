//! Span values: a document-local interval of token positions plus its payload.

use crate::payload::PayloadEntry;

/// Identifier of a document within one index segment.
pub type DocId = u32;

/// Token position within a document.
pub type Position = u32;

/// Sentinel document id reported by exhausted cursors.
pub const NO_MORE_DOCS: DocId = DocId::MAX;

/// One match: the half-open token interval `[start, end)` in `doc`, together with
/// the payload entries collected along the way.
///
/// `start < end` holds for every span read from a position source. Zero-width
/// spans (`start == end`) only appear as internal markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub doc: DocId,
    pub start: Position,
    pub end: Position,
    pub payload: Vec<PayloadEntry>,
}

impl Span {
    pub fn new(doc: DocId, start: Position, end: Position) -> Span {
        Span {
            doc,
            start,
            end,
            payload: Vec::new(),
        }
    }

    /// The placeholder held by cursors that have not produced a match yet, or
    /// never will again.
    pub fn exhausted() -> Span {
        Span::new(NO_MORE_DOCS, 0, 0)
    }

    pub fn with_payload(mut self, payload: Vec<PayloadEntry>) -> Span {
        self.payload = payload;
        self
    }

    /// Number of token positions covered by the span.
    #[inline]
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_zero_width(&self) -> bool {
        self.start >= self.end
    }

    /// The `(document, start, end)` triple that defines match ordering.
    #[inline]
    pub fn key(&self) -> (DocId, Position, Position) {
        (self.doc, self.start, self.end)
    }

    /// Returns `true` if `other` lies entirely inside this span (same document).
    pub fn contains(&self, other: &Span) -> bool {
        self.doc == other.doc && self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two spans share at least one token position.
    pub fn intersects(&self, other: &Span) -> bool {
        self.doc == other.doc && self.start < other.end && other.start < self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_relations() {
        let sentence = Span::new(3, 0, 5);
        let word = Span::new(3, 1, 2);
        let outside = Span::new(3, 6, 7);
        assert!(sentence.contains(&word));
        assert!(!sentence.contains(&outside));
        assert!(sentence.intersects(&word));
        assert!(!sentence.intersects(&outside));
        assert!(!sentence.contains(&Span::new(4, 1, 2)));
        assert_eq!(sentence.width(), 5);
        assert!(Span::new(0, 4, 4).is_zero_width());
    }

    #[test]
    fn test_key_ordering() {
        let mut spans = [Span::new(1, 2, 4), Span::new(0, 5, 6), Span::new(1, 2, 3)];
        spans.sort_by_key(Span::key);
        let keys: Vec<_> = spans.iter().map(Span::key).collect();
        assert_eq!(keys, vec![(0, 5, 6), (1, 2, 3), (1, 2, 4)]);
    }
}
