//! Several distance windows over the same pair of operands.

use lexspan_common::Result;

use super::{
    Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor, collect_aligned, distance::Window,
    union_payload,
};
use crate::span::{DocId, Span};

pub type MultipleDistanceSpans = Buffered<MultipleDistanceMatcher>;

/// Emits the hull of every `(A, B)` pair for which all windows hold at once.
/// An exclusion window holds when the pair lies outside it.
pub struct MultipleDistanceMatcher {
    first: Operand,
    second: Operand,
    windows: Vec<Window>,
    firsts: Vec<Span>,
    seconds: Vec<Span>,
}

impl MultipleDistanceMatcher {
    pub(crate) fn new(
        first: SpanCursor,
        second: SpanCursor,
        windows: Vec<Window>,
        collect_payloads: bool,
    ) -> MultipleDistanceMatcher {
        debug_assert!(windows.iter().any(|w| !w.is_exclusion()));
        MultipleDistanceMatcher {
            first: Operand::new(first, collect_payloads),
            second: Operand::new(second, collect_payloads),
            windows,
            firsts: Vec::new(),
            seconds: Vec::new(),
        }
    }

    fn accepts(&self, a: &Span, b: &Span) -> bool {
        self.windows
            .iter()
            .all(|window| window.within_window(a, b) != window.is_exclusion())
    }
}

impl DocumentMatcher for MultipleDistanceMatcher {
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
        for window in &mut self.windows {
            window.load(doc)?;
        }
        queue.reset(doc);
        for a in &self.firsts {
            for b in &self.seconds {
                if self.accepts(a, b) {
                    queue.push(
                        a.start.min(b.start),
                        a.end.max(b.end),
                        union_payload(&a.payload, &b.payload),
                    );
                }
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.first.cost().min(self.second.cost())
    }
}
