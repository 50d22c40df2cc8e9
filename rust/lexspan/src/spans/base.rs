//! Building blocks shared by the operator cursors.
//!
//! - [`Operand`] wraps a child cursor and keeps it one step ahead: after priming,
//!   the operand always sits on its next unconsumed match (or is exhausted).
//! - [`align`] moves two operands to their next common document.
//! - [`MatchQueue`] collects the matches an operator derived for one document,
//!   orders them and merges duplicate intervals.
//! - [`Buffered`] turns a document-at-a-time [`DocumentMatcher`] into a cursor.

use std::collections::{BTreeMap, btree_map::Entry};

use lexspan_common::Result;

use super::{CursorState, SpanCursor, Spans};
use crate::{
    payload::{PayloadEntry, merge_unique},
    span::{DocId, NO_MORE_DOCS, Position, Span},
};

pub(crate) struct Operand {
    cursor: SpanCursor,
    primed: bool,
    more: bool,
    collect_payloads: bool,
}

impl Operand {
    pub fn new(cursor: SpanCursor, collect_payloads: bool) -> Operand {
        Operand {
            cursor,
            primed: false,
            more: false,
            collect_payloads,
        }
    }

    /// Positions the operand on its first match. Later calls are no-ops.
    pub fn prime(&mut self) -> Result<bool> {
        if !self.primed {
            self.primed = true;
            self.more = self.cursor.next()?;
        }
        Ok(self.more)
    }

    #[inline]
    pub fn more(&self) -> bool {
        self.more
    }

    #[inline]
    pub fn doc(&self) -> DocId {
        if self.more {
            self.cursor.doc()
        } else {
            NO_MORE_DOCS
        }
    }

    #[inline]
    pub fn start(&self) -> Position {
        self.cursor.start()
    }

    #[inline]
    pub fn end(&self) -> Position {
        self.cursor.end()
    }

    #[inline]
    pub fn payload(&self) -> &[PayloadEntry] {
        if self.collect_payloads {
            self.cursor.payload()
        } else {
            &[]
        }
    }

    /// Consumes the current match.
    pub fn advance(&mut self) -> Result<bool> {
        if !self.primed {
            return self.prime();
        }
        if self.more {
            self.more = self.cursor.next()?;
        }
        Ok(self.more)
    }

    /// Moves to the first match in a document `>= target`. Unlike
    /// [`Spans::skip_to`], this does not move if the operand is already there.
    pub fn skip_to(&mut self, target: DocId) -> Result<bool> {
        self.prime()?;
        if self.more && self.cursor.doc() < target {
            self.more = self.cursor.skip_to(target)?;
        }
        Ok(self.more)
    }

    /// Owned copy of the current match.
    pub fn snapshot(&self) -> Span {
        Span {
            doc: self.cursor.doc(),
            start: self.cursor.start(),
            end: self.cursor.end(),
            payload: self.payload().to_vec(),
        }
    }

    /// Appends every match of `doc` to `out` and leaves the operand on the first
    /// match after `doc`. Matches of earlier documents are skipped.
    pub fn collect_document(&mut self, doc: DocId, out: &mut Vec<Span>) -> Result<()> {
        self.skip_to(doc)?;
        while self.more && self.cursor.doc() == doc {
            out.push(self.snapshot());
            self.advance()?;
        }
        Ok(())
    }

    pub fn cost(&self) -> u64 {
        self.cursor.cost()
    }
}

/// Advances whichever operand lags until both sit in the same document.
/// Returns `None` as soon as either side is exhausted.
pub(crate) fn align(first: &mut Operand, second: &mut Operand) -> Result<Option<DocId>> {
    first.prime()?;
    second.prime()?;
    loop {
        if !first.more() || !second.more() {
            return Ok(None);
        }
        let (a, b) = (first.doc(), second.doc());
        match a.cmp(&b) {
            std::cmp::Ordering::Less => {
                first.skip_to(b)?;
            }
            std::cmp::Ordering::Greater => {
                second.skip_to(a)?;
            }
            std::cmp::Ordering::Equal => {
                log::trace!("operands aligned on document {a}");
                return Ok(Some(a));
            }
        }
    }
}

/// Moves both operands to their next common document at or after `target` and
/// buffers that document's matches of each side.
pub(crate) fn collect_aligned(
    first: &mut Operand,
    second: &mut Operand,
    target: DocId,
    firsts: &mut Vec<Span>,
    seconds: &mut Vec<Span>,
) -> Result<Option<DocId>> {
    first.skip_to(target)?;
    second.skip_to(target)?;
    let Some(doc) = align(first, second)? else {
        return Ok(None);
    };
    firsts.clear();
    seconds.clear();
    first.collect_document(doc, firsts)?;
    second.collect_document(doc, seconds)?;
    Ok(Some(doc))
}

/// Union of two payloads, without duplicate entries.
pub(crate) fn union_payload(first: &[PayloadEntry], second: &[PayloadEntry]) -> Vec<PayloadEntry> {
    let mut payload = Vec::with_capacity(first.len() + second.len());
    merge_unique(&mut payload, first);
    merge_unique(&mut payload, second);
    payload
}

/// Matches derived for a single document, ordered by `(start, end)`.
///
/// Pushing an interval that is already queued merges the payloads, so every
/// interval is emitted once.
#[derive(Debug, Default)]
pub struct MatchQueue {
    doc: DocId,
    matches: BTreeMap<(Position, Position), Vec<PayloadEntry>>,
}

impl MatchQueue {
    pub fn new() -> MatchQueue {
        MatchQueue::default()
    }

    /// Discards queued matches and starts collecting for `doc`.
    pub fn reset(&mut self, doc: DocId) {
        self.doc = doc;
        self.matches.clear();
    }

    pub fn clear(&mut self) {
        self.matches.clear();
    }

    #[inline]
    pub fn doc(&self) -> DocId {
        self.doc
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn push(&mut self, start: Position, end: Position, payload: Vec<PayloadEntry>) {
        match self.matches.entry((start, end)) {
            Entry::Vacant(entry) => {
                entry.insert(payload);
            }
            Entry::Occupied(mut entry) => merge_unique(entry.get_mut(), &payload),
        }
    }

    /// Moves the smallest queued match into `span`.
    pub fn pop_into(&mut self, span: &mut Span) -> bool {
        match self.matches.pop_first() {
            Some(((start, end), payload)) => {
                span.doc = self.doc;
                span.start = start;
                span.end = end;
                span.payload = payload;
                true
            }
            None => false,
        }
    }
}

/// Operators that derive all matches of a document at once.
pub trait DocumentMatcher {
    /// Finds the next document at or after `target` where the operator's
    /// children can produce matches and pushes that document's matches into
    /// `queue` (after resetting it). Returns `false` once no such document
    /// remains. A `true` return may leave the queue empty.
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool>;

    fn cost(&self) -> u64;
}

/// Adapts a [`DocumentMatcher`] to the [`Spans`] contract.
pub struct Buffered<M> {
    matcher: M,
    queue: MatchQueue,
    current: Span,
    state: CursorState,
}

impl<M: DocumentMatcher> Buffered<M> {
    pub fn new(matcher: M) -> Buffered<M> {
        Buffered {
            matcher,
            queue: MatchQueue::new(),
            current: Span::exhausted(),
            state: CursorState::Uninitialized,
        }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    fn advance_to(&mut self, target: DocId) -> Result<bool> {
        if self.state.is_exhausted() {
            return Ok(false);
        }
        loop {
            if self.queue.pop_into(&mut self.current) {
                return Ok(self.state.advance(true));
            }
            if !self.matcher.fill(target, &mut self.queue)? {
                self.current = Span::exhausted();
                return Ok(self.state.advance(false));
            }
        }
    }
}

impl<M: DocumentMatcher> Spans for Buffered<M> {
    fn doc(&self) -> DocId {
        self.current.doc
    }

    fn start(&self) -> Position {
        self.current.start
    }

    fn end(&self) -> Position {
        self.current.end
    }

    fn next(&mut self) -> Result<bool> {
        self.advance_to(0)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.state.is_positioned() && self.current.doc >= target {
            return self.advance_to(0);
        }
        self.queue.clear();
        self.advance_to(target)
    }

    fn payload(&self) -> &[PayloadEntry] {
        &self.current.payload
    }

    fn cost(&self) -> u64 {
        self.matcher.cost()
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{class::ClassNumber, source::MemoryIndex, source::PositionSource, spans::TermSpans};

    fn operand(index: &MemoryIndex, term: &str) -> Operand {
        let postings = index.postings("tokens", term).unwrap().unwrap();
        Operand::new(SpanCursor::Term(TermSpans::new(postings, true)), true)
    }

    #[test]
    fn test_match_queue_orders_and_merges() {
        let one = ClassNumber::DEFAULT;
        let mut queue = MatchQueue::new();
        queue.reset(4);
        queue.push(2, 5, vec![PayloadEntry::class(2, 3, one)]);
        queue.push(0, 9, vec![]);
        queue.push(2, 3, vec![]);
        queue.push(2, 5, vec![PayloadEntry::class(4, 5, one), PayloadEntry::class(2, 3, one)]);
        assert_eq!(queue.len(), 3);

        let mut span = Span::exhausted();
        let mut keys = Vec::new();
        while queue.pop_into(&mut span) {
            keys.push(span.key());
            if span.start == 2 && span.end == 5 {
                assert_eq!(span.payload.len(), 2);
            }
        }
        assert_eq!(keys, vec![(4, 0, 9), (4, 2, 3), (4, 2, 5)]);
    }

    #[test]
    fn test_align_and_collect() {
        let mut builder = MemoryIndex::builder();
        builder
            .add_token("tokens", "a", 1, 0)
            .add_token("tokens", "a", 4, 0)
            .add_token("tokens", "a", 4, 3)
            .add_token("tokens", "a", 9, 0)
            .add_token("tokens", "b", 2, 0)
            .add_token("tokens", "b", 4, 1)
            .add_token("tokens", "b", 9, 5);
        let index = builder.build();

        let mut a = operand(&index, "a");
        let mut b = operand(&index, "b");
        assert_eq!(align(&mut a, &mut b).unwrap(), Some(4));

        let mut spans = Vec::new();
        a.collect_document(4, &mut spans).unwrap();
        assert_eq!(spans.iter().map(Span::key).collect::<Vec<_>>(), vec![(4, 0, 1), (4, 3, 4)]);
        assert_eq!(a.doc(), 9);

        b.advance().unwrap();
        assert_eq!(align(&mut a, &mut b).unwrap(), Some(9));
        a.advance().unwrap();
        assert_eq!(align(&mut a, &mut b).unwrap(), None);
    }
}
