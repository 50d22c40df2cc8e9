//! Growing a span by a range of token positions to the left or right.

use std::sync::Arc;

use lexspan_common::Result;

use super::{Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor};
use crate::{
    class::ClassNumber,
    payload::PayloadEntry,
    query::ExpansionDirection,
    source::PositionSource,
    span::{DocId, Position, Span},
};

pub type ExpansionSpans = Buffered<ExpansionMatcher>;

/// Emits one match per admissible expansion length `k` in `min..=max`.
///
/// A length is admissible if the added region stays inside the document and no
/// exclusion span intersects it. Longer regions contain shorter ones, so the
/// first inadmissible length ends the enumeration for that span.
pub struct ExpansionMatcher {
    base: Operand,
    exclusion: Option<Operand>,
    min: u32,
    max: u32,
    direction: ExpansionDirection,
    class: Option<ClassNumber>,
    source: Arc<dyn PositionSource>,
    field: String,
    bases: Vec<Span>,
    exclusions: Vec<Span>,
}

impl ExpansionMatcher {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        base: SpanCursor,
        exclusion: Option<SpanCursor>,
        min: u32,
        max: u32,
        direction: ExpansionDirection,
        class: Option<ClassNumber>,
        source: Arc<dyn PositionSource>,
        field: String,
        collect_payloads: bool,
    ) -> ExpansionMatcher {
        ExpansionMatcher {
            base: Operand::new(base, collect_payloads),
            exclusion: exclusion.map(|cursor| Operand::new(cursor, false)),
            min,
            max,
            direction,
            class: class.filter(|_| collect_payloads),
            source,
            field,
            bases: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// The region added by expanding `span` by `k`, or `None` if it leaves
    /// the document.
    fn region(
        &self,
        span: &Span,
        k: u32,
        length: Option<Position>,
    ) -> Option<(Position, Position)> {
        match self.direction {
            ExpansionDirection::Left => span.start.checked_sub(k).map(|start| (start, span.start)),
            ExpansionDirection::Right => {
                let end = span.end.checked_add(k)?;
                match length {
                    Some(length) if end > length => None,
                    _ => Some((span.end, end)),
                }
            }
        }
    }

    fn excluded(&self, (start, end): (Position, Position)) -> bool {
        start < end && self.exclusions.iter().any(|e| e.start < end && start < e.end)
    }

    fn expand(&self, span: &Span, length: Option<Position>, queue: &mut MatchQueue) {
        for k in self.min..=self.max {
            let Some(region) = self.region(span, k, length) else {
                break;
            };
            if self.excluded(region) {
                break;
            }
            let mut payload = span.payload.clone();
            if let Some(class) = self.class.filter(|_| k > 0) {
                payload.push(PayloadEntry::class(region.0, region.1, class));
            }
            queue.push(span.start.min(region.0), span.end.max(region.1), payload);
        }
    }
}

impl DocumentMatcher for ExpansionMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if !self.base.skip_to(target)? {
            return Ok(false);
        }
        let doc = self.base.doc();
        self.bases.clear();
        self.base.collect_document(doc, &mut self.bases)?;
        self.exclusions.clear();
        if let Some(exclusion) = &mut self.exclusion {
            exclusion.collect_document(doc, &mut self.exclusions)?;
        }
        let length = match self.direction {
            ExpansionDirection::Right => self.source.document_length(&self.field, doc)?,
            ExpansionDirection::Left => None,
        };

        queue.reset(doc);
        for span in &self.bases {
            self.expand(span, length, queue);
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.base.cost()
    }
}
