//! Strict adjacency: `A` immediately followed by `B`.

use lexspan_common::Result;

use super::{
    Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor, collect_aligned, union_payload,
};
use crate::span::{DocId, Span};

pub type NextSpans = Buffered<NextMatcher>;

/// Emits `[A.start, B.end)` for every pair with `A.end == B.start`.
pub struct NextMatcher {
    first: Operand,
    second: Operand,
    firsts: Vec<Span>,
    seconds: Vec<Span>,
}

impl NextMatcher {
    pub fn new(first: SpanCursor, second: SpanCursor, collect_payloads: bool) -> NextMatcher {
        NextMatcher {
            first: Operand::new(first, collect_payloads),
            second: Operand::new(second, collect_payloads),
            firsts: Vec::new(),
            seconds: Vec::new(),
        }
    }
}

impl DocumentMatcher for NextMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        let Some(doc) = collect_aligned(
            &mut self.first,
            &mut self.second,
            target,
            &mut self.firsts,
            &mut self.seconds,
        )?
        else {
            return Ok(false);
        };
        queue.reset(doc);
        // `seconds` is sorted by start, so the successors of `a` form one run.
        for a in &self.firsts {
            let from = self.seconds.partition_point(|b| b.start < a.end);
            for b in self.seconds[from..].iter().take_while(|b| b.start == a.end) {
                queue.push(a.start, b.end, union_payload(&a.payload, &b.payload));
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.first.cost().min(self.second.cost())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        class::ClassNumber,
        payload::PayloadEntry,
        source::MemoryIndex,
        spans::{
            Spans,
            testing::{FIELD, index, keys, spans, term},
        },
    };

    fn next(index: &MemoryIndex, a: &str, b: &str) -> SpanCursor {
        SpanCursor::Next(Box::new(Buffered::new(NextMatcher::new(
            term(index, a),
            term(index, b),
            true,
        ))))
    }

    #[test]
    fn test_adjacent_pairs() {
        let index = index(&["a b a b"]);
        assert_eq!(keys(next(&index, "a", "b")), vec![(0, 0, 2), (0, 2, 4)]);
    }

    #[test]
    fn test_gap_is_not_adjacent() {
        let index = index(&["a x b", "a b"]);
        assert_eq!(keys(next(&index, "a", "b")), vec![(1, 0, 2)]);
    }

    #[test]
    fn test_multi_token_operands() {
        let mut builder = MemoryIndex::builder();
        builder
            .add(FIELD, "np", 0, 0, 2, None)
            .add(FIELD, "np", 0, 0, 3, None)
            .add(FIELD, "vp", 0, 2, 5, None)
            .add(FIELD, "vp", 0, 3, 4, None);
        let index = builder.build();
        assert_eq!(keys(next(&index, "np", "vp")), vec![(0, 0, 4), (0, 0, 5)]);
    }

    #[test]
    fn test_payload_union() {
        let one = ClassNumber::DEFAULT;
        let mut builder = MemoryIndex::builder();
        builder
            .add(FIELD, "a", 0, 0, 1, Some(PayloadEntry::class(0, 1, one)))
            .add(FIELD, "b", 0, 1, 2, Some(PayloadEntry::class(0, 1, one)))
            .add(FIELD, "c", 0, 1, 2, Some(PayloadEntry::token_offsets(4, 7)));
        let index = builder.build();
        let matches = spans(next(&index, "a", "b"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].payload, vec![PayloadEntry::class(0, 1, one)]);
        let matches = spans(next(&index, "a", "c"));
        assert_eq!(matches[0].payload.len(), 2);
    }

    #[test]
    fn test_skip_to_and_missing_operand() {
        let index = index(&["a b", "b a", "a b", "a b"]);
        let mut cursor = next(&index, "a", "b");
        assert!(cursor.skip_to(1).unwrap());
        assert_eq!(cursor.doc(), 2);
        assert!(cursor.skip_to(3).unwrap());
        assert_eq!(cursor.doc(), 3);
        assert!(!cursor.next().unwrap());
        assert!(!cursor.next().unwrap());

        assert!(keys(next(&index, "a", "zzz")).is_empty());
    }
}
