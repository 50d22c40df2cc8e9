//! Position sources that fail on demand.

use std::sync::Arc;

use lexspan::{DocId, Error, Occurrence, Position, PositionSource, Postings, Result};

/// Wraps a source so that every postings cursor fails with an I/O error once it
/// has moved through `healthy_docs` documents.
pub struct FailingSource {
    inner: Arc<dyn PositionSource>,
    healthy_docs: usize,
}

impl FailingSource {
    pub fn new(inner: Arc<dyn PositionSource>, healthy_docs: usize) -> FailingSource {
        FailingSource {
            inner,
            healthy_docs,
        }
    }
}

impl PositionSource for FailingSource {
    fn postings(&self, field: &str, term: &str) -> Result<Option<Box<dyn Postings>>> {
        Ok(self.inner.postings(field, term)?.map(|inner| {
            Box::new(FailingPostings {
                inner,
                remaining: self.healthy_docs,
            }) as Box<dyn Postings>
        }))
    }

    fn document_length(&self, field: &str, doc: DocId) -> Result<Option<Position>> {
        self.inner.document_length(field, doc)
    }
}

struct FailingPostings {
    inner: Box<dyn Postings>,
    remaining: usize,
}

impl FailingPostings {
    fn step(&mut self) -> Result<()> {
        if self.remaining == 0 {
            return Err(Error::io(
                "postings",
                std::io::Error::other("injected read failure"),
            ));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl Postings for FailingPostings {
    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.step()?;
        self.inner.next_doc()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.step()?;
        self.inner.advance(target)
    }

    fn freq(&self) -> u32 {
        self.inner.freq()
    }

    fn next_occurrence(&mut self) -> Result<Occurrence> {
        self.inner.next_occurrence()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}
