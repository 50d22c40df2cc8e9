//! Union of several cursors over the same field.

use lexspan_common::Result;

use super::{Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor};
use crate::span::{DocId, NO_MORE_DOCS, Span};

pub type OrSpans = Buffered<OrMatcher>;

/// Emits every match of every child. Children producing the same interval
/// yield a single match carrying the payloads of all of them.
pub struct OrMatcher {
    children: Vec<Operand>,
    spans: Vec<Span>,
}

impl OrMatcher {
    pub fn new(children: Vec<SpanCursor>, collect_payloads: bool) -> OrMatcher {
        OrMatcher {
            children: children
                .into_iter()
                .map(|cursor| Operand::new(cursor, collect_payloads))
                .collect(),
            spans: Vec::new(),
        }
    }
}

impl DocumentMatcher for OrMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        let mut doc = NO_MORE_DOCS;
        for child in &mut self.children {
            child.skip_to(target)?;
            doc = doc.min(child.doc());
        }
        if doc == NO_MORE_DOCS {
            return Ok(false);
        }
        queue.reset(doc);
        for child in self.children.iter_mut().filter(|child| child.doc() == doc) {
            self.spans.clear();
            child.collect_document(doc, &mut self.spans)?;
            for span in self.spans.drain(..) {
                queue.push(span.start, span.end, span.payload);
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.children.iter().map(Operand::cost).max().unwrap_or(0)
    }
}
