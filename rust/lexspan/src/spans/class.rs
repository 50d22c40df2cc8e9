//! Class marking: the capture-group half of class/focus.

use lexspan_common::Result;

use super::{CursorState, SpanCursor, Spans};
use crate::{
    class::ClassNumber,
    payload::{ClassPayload, PayloadEntry, merge_unique},
    query::ClassTarget,
    span::{DocId, Position},
};

/// Tags every match of its child with a class number without moving its
/// boundaries.
///
/// [`ClassTarget::Span`] adds a class entry covering the match,
/// [`ClassTarget::Payload`] re-numbers the class entries the child already
/// carries. Nothing is tagged when payloads are not collected.
pub struct ClassSpans {
    child: SpanCursor,
    class: ClassNumber,
    target: ClassTarget,
    collect_payloads: bool,
    payload: Vec<PayloadEntry>,
    state: CursorState,
}

impl ClassSpans {
    pub fn new(
        child: SpanCursor,
        class: ClassNumber,
        target: ClassTarget,
        collect_payloads: bool,
    ) -> ClassSpans {
        ClassSpans {
            child,
            class,
            target,
            collect_payloads,
            payload: Vec::new(),
            state: CursorState::Uninitialized,
        }
    }

    pub fn class(&self) -> ClassNumber {
        self.class
    }

    fn tag(&mut self, found: bool) -> bool {
        self.payload.clear();
        let found = self.state.advance(found);
        if !found || !self.collect_payloads {
            return found;
        }
        match self.target {
            ClassTarget::Span => {
                self.payload.extend_from_slice(self.child.payload());
                let entry = PayloadEntry::class(self.child.start(), self.child.end(), self.class);
                merge_unique(&mut self.payload, std::slice::from_ref(&entry));
            }
            ClassTarget::Payload => {
                for entry in self.child.payload() {
                    let entry = match entry.as_class() {
                        Some(tagged) => ClassPayload {
                            class: self.class,
                            ..tagged
                        }
                        .encode(),
                        None => entry.clone(),
                    };
                    merge_unique(&mut self.payload, std::slice::from_ref(&entry));
                }
            }
        }
        found
    }
}

impl Spans for ClassSpans {
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
        Ok(self.tag(found))
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.state.is_exhausted() {
            return Ok(false);
        }
        let found = self.child.skip_to(target)?;
        Ok(self.tag(found))
    }

    fn payload(&self) -> &[PayloadEntry] {
        &self.payload
    }

    fn cost(&self) -> u64 {
        self.child.cost()
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        source::MemoryIndex,
        spans::testing::{FIELD, index, spans, term},
    };

    #[test]
    fn test_tags_span_boundaries() {
        let index = index(&["a b a"]);
        let two = ClassNumber::new(2).unwrap();
        let cursor = SpanCursor::Class(Box::new(ClassSpans::new(
            term(&index, "a"),
            two,
            ClassTarget::Span,
            true,
        )));
        let matches = spans(cursor);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].payload, vec![PayloadEntry::class(2, 3, two)]);
    }

    #[test]
    fn test_renumbers_existing_classes() {
        let (one, five) = (ClassNumber::DEFAULT, ClassNumber::new(5).unwrap());
        let mut builder = MemoryIndex::builder();
        builder.add(FIELD, "a", 0, 0, 3, Some(PayloadEntry::class(1, 2, one)));
        builder.add(FIELD, "a", 0, 4, 5, Some(PayloadEntry::token_offsets(9, 12)));
        let index = builder.build();
        let cursor = SpanCursor::Class(Box::new(ClassSpans::new(
            term(&index, "a"),
            five,
            ClassTarget::Payload,
            true,
        )));
        let matches = spans(cursor);
        assert_eq!(matches[0].payload, vec![PayloadEntry::class(1, 2, five)]);
        assert_eq!(matches[1].payload, vec![PayloadEntry::token_offsets(9, 12)]);
    }

    #[test]
    fn test_no_tagging_without_payloads() {
        let index = index(&["a"]);
        let mut cursor =
            ClassSpans::new(term(&index, "a"), ClassNumber::DEFAULT, ClassTarget::Span, false);
        assert_eq!(cursor.state(), CursorState::Uninitialized);
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.state(), CursorState::Primed);
        assert!(cursor.payload().is_empty());
        assert!(!cursor.next().unwrap());
        assert!(cursor.state().is_exhausted());
    }
}
