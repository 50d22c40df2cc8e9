//! Co-extensive spans: `A` and `B` covering exactly the same interval.

use lexspan_common::Result;

use super::{
    Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor, collect_aligned, union_payload,
};
use crate::span::{DocId, Span};

pub type SegmentSpans = Buffered<SegmentMatcher>;

pub struct SegmentMatcher {
    first: Operand,
    second: Operand,
    firsts: Vec<Span>,
    seconds: Vec<Span>,
}

impl SegmentMatcher {
    pub fn new(first: SpanCursor, second: SpanCursor, collect_payloads: bool) -> SegmentMatcher {
        SegmentMatcher {
            first: Operand::new(first, collect_payloads),
            second: Operand::new(second, collect_payloads),
            firsts: Vec::new(),
            seconds: Vec::new(),
        }
    }
}

impl DocumentMatcher for SegmentMatcher {
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

        // Both sides are sorted by (start, end): a single merge pass.
        let mut seconds = self.seconds.iter().peekable();
        for a in &self.firsts {
            while seconds.next_if(|b| (b.start, b.end) < (a.start, a.end)).is_some() {}
            if let Some(b) = seconds.peek().filter(|b| (b.start, b.end) == (a.start, a.end)) {
                queue.push(a.start, a.end, union_payload(&a.payload, &b.payload));
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
        source::MemoryIndex,
        spans::testing::{FIELD, index, keys, term},
    };

    fn segment(index: &MemoryIndex, a: &str, b: &str) -> SpanCursor {
        SpanCursor::Segment(Box::new(Buffered::new(SegmentMatcher::new(
            term(index, a),
            term(index, b),
            true,
        ))))
    }

    #[test]
    fn test_same_position_annotations() {
        let index = index(&["der|ART Hund|NN bellt|VVFIN", "die|ART"]);
        assert_eq!(keys(segment(&index, "Hund", "NN")), vec![(0, 1, 2)]);
        assert_eq!(keys(segment(&index, "ART", "der")), vec![(0, 0, 1)]);
        assert!(keys(segment(&index, "Hund", "ART")).is_empty());
    }

    #[test]
    fn test_element_boundaries_must_agree() {
        let mut builder = MemoryIndex::builder();
        builder
            .add(FIELD, "<>:np", 0, 0, 2, None)
            .add(FIELD, "<>:np", 0, 3, 6, None)
            .add(FIELD, "<>:s", 0, 0, 3, None)
            .add(FIELD, "<>:s", 0, 3, 6, None);
        let index = builder.build();
        assert_eq!(keys(segment(&index, "<>:np", "<>:s")), vec![(0, 3, 6)]);
    }
}
