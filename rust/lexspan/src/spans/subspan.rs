//! Slicing a span by offset and length.

use lexspan_common::Result;

use super::{Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor};
use crate::span::{DocId, Position, Span};

pub type SubspanSpans = Buffered<SubspanMatcher>;

/// Emits `[start + offset, start + offset + length)` of each child span.
///
/// A negative `offset` counts back from the end of the span and a `length` of
/// zero extends the slice to the end of the span. Slices reaching outside the
/// child span yield no match.
pub struct SubspanMatcher {
    child: Operand,
    offset: i32,
    length: u32,
    spans: Vec<Span>,
}

impl SubspanMatcher {
    pub fn new(
        child: SpanCursor,
        offset: i32,
        length: u32,
        collect_payloads: bool,
    ) -> SubspanMatcher {
        SubspanMatcher {
            child: Operand::new(child, collect_payloads),
            offset,
            length,
            spans: Vec::new(),
        }
    }

    fn slice(&self, span: &Span) -> Option<(Position, Position)> {
        let start = if self.offset >= 0 {
            span.start.checked_add(self.offset.unsigned_abs())?
        } else {
            span.end.checked_sub(self.offset.unsigned_abs())?
        };
        if start < span.start || start >= span.end {
            return None;
        }
        let end = match self.length {
            0 => span.end,
            length => start.checked_add(length)?,
        };
        (end <= span.end).then_some((start, end))
    }
}

impl DocumentMatcher for SubspanMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if !self.child.skip_to(target)? {
            return Ok(false);
        }
        let doc = self.child.doc();
        self.spans.clear();
        self.child.collect_document(doc, &mut self.spans)?;
        queue.reset(doc);
        for span in &self.spans {
            if let Some((start, end)) = self.slice(span) {
                queue.push(start, end, span.payload.clone());
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.child.cost()
    }
}
