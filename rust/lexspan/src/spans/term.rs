//! Leaf cursor reading the occurrences of one term from the position source.

use lexspan_common::Result;

use super::{CursorState, Spans};
use crate::{
    payload::PayloadEntry,
    source::Postings,
    span::{DocId, NO_MORE_DOCS, Position, Span},
};

pub struct TermSpans {
    postings: Box<dyn Postings>,
    /// Occurrences of the current document not read yet.
    remaining: u32,
    /// Set until the first occurrence of the current document has been read.
    fresh_document: bool,
    current: Span,
    collect_payloads: bool,
    state: CursorState,
}

impl TermSpans {
    pub fn new(postings: Box<dyn Postings>, collect_payloads: bool) -> TermSpans {
        TermSpans {
            postings,
            remaining: 0,
            fresh_document: true,
            current: Span::exhausted(),
            collect_payloads,
            state: CursorState::Uninitialized,
        }
    }

    fn begin_document(&mut self, doc: DocId) {
        self.current.doc = doc;
        self.remaining = self.postings.freq();
        self.fresh_document = true;
    }

    fn read_occurrence(&mut self) -> Result<bool> {
        let occurrence = self.postings.next_occurrence()?;
        self.remaining -= 1;
        debug_assert!(
            self.fresh_document
                || (occurrence.start, occurrence.end) > (self.current.start, self.current.end),
            "postings out of order in document {}",
            self.current.doc
        );
        self.fresh_document = false;
        self.current.start = occurrence.start;
        self.current.end = occurrence.end;
        self.current.payload.clear();
        if self.collect_payloads {
            self.current.payload.extend(occurrence.payload);
        }
        Ok(self.state.advance(true))
    }

    fn exhaust(&mut self) -> bool {
        self.current = Span::exhausted();
        self.remaining = 0;
        self.state.advance(false)
    }

    /// Reads the next occurrence, moving through documents without any.
    fn advance(&mut self) -> Result<bool> {
        loop {
            if self.remaining > 0 {
                return self.read_occurrence();
            }
            let doc = self.postings.next_doc()?;
            if doc == NO_MORE_DOCS {
                return Ok(self.exhaust());
            }
            self.begin_document(doc);
        }
    }
}

impl Spans for TermSpans {
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
        if self.state.is_exhausted() {
            return Ok(false);
        }
        self.advance()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.state.is_exhausted() {
            return Ok(false);
        }
        if self.state.is_positioned() && self.current.doc >= target {
            return self.advance();
        }
        let doc = self.postings.advance(target)?;
        if doc == NO_MORE_DOCS {
            return Ok(self.exhaust());
        }
        self.begin_document(doc);
        self.advance()
    }

    fn payload(&self) -> &[PayloadEntry] {
        &self.current.payload
    }

    fn cost(&self) -> u64 {
        self.postings.cost()
    }

    fn state(&self) -> CursorState {
        self.state
    }
}
