//! Reading class entries back: focus and class filters.

use lexspan_common::Result;

use super::{Buffered, CursorState, DocumentMatcher, MatchQueue, Operand, SpanCursor, Spans};
use crate::{
    class::{ClassNumber, ClassSet},
    payload::{PayloadEntry, class_hull},
    query::ClassRelation,
    span::{DocId, Position, Span},
};

pub type FocusSpans = Buffered<FocusMatcher>;

/// Re-projects each child match onto the hull of its entries of the selected
/// classes. Matches without such entries are dropped.
pub struct FocusMatcher {
    child: Operand,
    classes: ClassSet,
    remove_temporary: bool,
    collect_payloads: bool,
    spans: Vec<Span>,
}

impl FocusMatcher {
    /// `child` must have been opened with payload collection enabled.
    pub fn new(
        child: SpanCursor,
        classes: ClassSet,
        remove_temporary: bool,
        collect_payloads: bool,
    ) -> FocusMatcher {
        FocusMatcher {
            child: Operand::new(child, true),
            classes,
            remove_temporary,
            collect_payloads,
            spans: Vec::new(),
        }
    }

    fn output_payload(&self, payload: &[PayloadEntry]) -> Vec<PayloadEntry> {
        if !self.collect_payloads {
            return Vec::new();
        }
        payload
            .iter()
            .filter(|entry| {
                !self.remove_temporary || !entry.as_class().is_some_and(|c| c.class.is_temporary())
            })
            .cloned()
            .collect()
    }
}

impl DocumentMatcher for FocusMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if !self.child.skip_to(target)? {
            return Ok(false);
        }
        let doc = self.child.doc();
        self.spans.clear();
        self.child.collect_document(doc, &mut self.spans)?;
        queue.reset(doc);
        for span in &self.spans {
            match class_hull(&span.payload, |class| self.classes.contains(class)) {
                Some((start, end)) => queue.push(start, end, self.output_payload(&span.payload)),
                None => log::trace!(
                    "no class of {:?} in match {:?}, skipped",
                    self.classes,
                    span.key()
                ),
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.child.cost()
    }
}

/// Keeps the child matches whose hulls of `first` and `second` stand in
/// `relation`. Matches lacking either class are dropped.
pub struct ClassFilterSpans {
    child: SpanCursor,
    relation: ClassRelation,
    first: ClassNumber,
    second: ClassNumber,
    collect_payloads: bool,
    state: CursorState,
}

impl ClassFilterSpans {
    /// `child` must have been opened with payload collection enabled.
    pub fn new(
        child: SpanCursor,
        relation: ClassRelation,
        first: ClassNumber,
        second: ClassNumber,
        collect_payloads: bool,
    ) -> ClassFilterSpans {
        ClassFilterSpans {
            child,
            relation,
            first,
            second,
            collect_payloads,
            state: CursorState::Uninitialized,
        }
    }

    fn accepts(&self) -> bool {
        let payload = self.child.payload();
        let first = class_hull(payload, |class| class == self.first);
        let second = class_hull(payload, |class| class == self.second);
        match first.zip(second) {
            Some((first, second)) => self.relation.holds(first, second),
            None => false,
        }
    }

    /// Moves on from a fresh child match until one passes the filter.
    fn settle(&mut self, mut found: bool) -> Result<bool> {
        while found && !self.accepts() {
            found = self.child.next()?;
        }
        Ok(self.state.advance(found))
    }
}

impl Spans for ClassFilterSpans {
    fn doc(&self) -> DocId {
        self.child.doc()
    }

    fn start(&self) -> Position {
        self.child.start()
    }

    fn end(&self) -> Position {
        self.child.end()
    }

    fn next(&mut self) -> Result<bool> {
        if self.state.is_exhausted() {
            return Ok(false);
        }
        let found = self.child.next()?;
        self.settle(found)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.state.is_exhausted() {
            return Ok(false);
        }
        let found = self.child.skip_to(target)?;
        self.settle(found)
    }

    fn payload(&self) -> &[PayloadEntry] {
        if self.collect_payloads {
            self.child.payload()
        } else {
            &[]
        }
    }

    fn cost(&self) -> u64 {
        self.child.cost()
    }

    fn state(&self) -> CursorState {
        self.state
    }
}
