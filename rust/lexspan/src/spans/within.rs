//! Containment and overlap between a wrap span and embedded spans.
//!
//! The embedded side is read into a lookahead buffer owned by the matcher. One
//! embedded span can satisfy the relation for several wraps, so a span only
//! leaves the buffer once no later wrap can use it: wraps arrive sorted by
//! start, and the relation decides from the embedded span alone whether a wrap
//! starting at or after the current one may still match it.

use std::collections::VecDeque;

use lexspan_common::Result;

use super::{Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor, align};
use crate::{
    payload::merge_unique,
    query::WithinRelation,
    span::{DocId, Span},
};

pub type WithinSpans = Buffered<WithinMatcher>;

/// Emits each wrap span that stands in `relation` to at least one embedded span.
pub struct WithinMatcher {
    wrap: Operand,
    embedded: Operand,
    relation: WithinRelation,
    buffer: VecDeque<Span>,
}

impl WithinMatcher {
    pub fn new(
        wrap: SpanCursor,
        embedded: SpanCursor,
        relation: WithinRelation,
        collect_payloads: bool,
    ) -> WithinMatcher {
        WithinMatcher {
            wrap: Operand::new(wrap, collect_payloads),
            embedded: Operand::new(embedded, collect_payloads),
            relation,
            buffer: VecDeque::new(),
        }
    }

    pub fn relation(&self) -> WithinRelation {
        self.relation
    }

    /// Tests the current wrap against the buffered and upcoming embedded spans
    /// of `doc`.
    fn match_wrap(&mut self, doc: DocId, queue: &mut MatchQueue) -> Result<()> {
        let (ws, we) = (self.wrap.start(), self.wrap.end());

        while self
            .buffer
            .front()
            .is_some_and(|e| !self.relation.may_match_from(ws, e.start, e.end))
        {
            self.buffer.pop_front();
        }
        // Embedded spans starting after the wrap end cannot relate to it, but a
        // later wrap may still need them.
        while self.embedded.more() && self.embedded.doc() == doc && self.embedded.start() <= we {
            let candidate = self.embedded.snapshot();
            if self.relation.may_match_from(ws, candidate.start, candidate.end) {
                self.buffer.push_back(candidate);
            }
            self.embedded.advance()?;
        }

        let mut payload = Vec::new();
        let mut matched = false;
        for e in self.buffer.iter().take_while(|e| e.start <= we) {
            if self.relation.holds(ws, we, e.start, e.end) {
                if !matched {
                    matched = true;
                    payload.extend_from_slice(self.wrap.payload());
                }
                merge_unique(&mut payload, &e.payload);
            }
        }
        if matched {
            queue.push(ws, we, payload);
        }
        Ok(())
    }
}

impl DocumentMatcher for WithinMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        self.wrap.skip_to(target)?;
        self.embedded.skip_to(target)?;
        let Some(doc) = align(&mut self.wrap, &mut self.embedded)? else {
            return Ok(false);
        };
        self.buffer.clear();
        queue.reset(doc);
        while self.wrap.more() && self.wrap.doc() == doc {
            self.match_wrap(doc, queue)?;
            self.wrap.advance()?;
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.wrap.cost().min(self.embedded.cost())
    }
}
