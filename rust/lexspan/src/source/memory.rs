//! An in-memory [`PositionSource`] for small collections, tests and tooling.

use std::{collections::BTreeMap, sync::Arc};

use ahash::AHashMap;
use lexspan_common::{Result, error::Error};

use super::{Occurrence, PositionSource, Postings, TermDictionary, TermPattern};
use crate::{
    payload::PayloadEntry,
    span::{DocId, NO_MORE_DOCS, Position},
};

/// Occurrences of one term in one document, sorted by `(start, end)`.
#[derive(Debug)]
struct DocPostings {
    doc: DocId,
    occurrences: Vec<Occurrence>,
}

#[derive(Debug, Default)]
struct FieldData {
    /// Kept ordered so that term listings are deterministic.
    terms: BTreeMap<String, Arc<Vec<DocPostings>>>,
    lengths: AHashMap<DocId, Position>,
}

/// Immutable in-memory index of one segment.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    fields: AHashMap<String, FieldData>,
}

impl MemoryIndex {
    pub fn builder() -> MemoryIndexBuilder {
        MemoryIndexBuilder::default()
    }

    /// Returns `true` if the index holds any term for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All terms of `field` in ascending order.
    pub fn terms(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|data| data.terms.keys().map(String::as_str))
    }
}

impl PositionSource for MemoryIndex {
    fn postings(&self, field: &str, term: &str) -> Result<Option<Box<dyn Postings>>> {
        let postings = self
            .fields
            .get(field)
            .and_then(|data| data.terms.get(term))
            .map(|docs| Box::new(MemoryPostings::new(Arc::clone(docs))) as Box<dyn Postings>);
        Ok(postings)
    }

    fn document_length(&self, field: &str, doc: DocId) -> Result<Option<Position>> {
        Ok(self
            .fields
            .get(field)
            .and_then(|data| data.lengths.get(&doc).copied()))
    }
}

impl TermDictionary for MemoryIndex {
    fn terms_matching(&self, field: &str, pattern: &TermPattern) -> Result<Vec<String>> {
        let re = pattern.compile()?;
        Ok(self
            .terms(field)
            .filter(|term| re.is_match(term))
            .map(str::to_string)
            .collect())
    }
}

/// Collects occurrences and freezes them into a [`MemoryIndex`].
#[derive(Debug, Default)]
pub struct MemoryIndexBuilder {
    occurrences: AHashMap<(String, String), BTreeMap<DocId, Vec<Occurrence>>>,
    lengths: AHashMap<String, AHashMap<DocId, Position>>,
}

impl MemoryIndexBuilder {
    pub fn new() -> MemoryIndexBuilder {
        MemoryIndexBuilder::default()
    }

    /// Records an occurrence of `term` covering `[start, end)` in `doc`.
    pub fn add(
        &mut self,
        field: &str,
        term: &str,
        doc: DocId,
        start: Position,
        end: Position,
        payload: Option<PayloadEntry>,
    ) -> &mut Self {
        debug_assert!(start <= end, "occurrence {start}..{end} is inverted");
        self.occurrences
            .entry((field.to_string(), term.to_string()))
            .or_default()
            .entry(doc)
            .or_default()
            .push(Occurrence {
                start,
                end,
                payload,
            });
        let length = self
            .lengths
            .entry(field.to_string())
            .or_default()
            .entry(doc)
            .or_default();
        *length = (*length).max(end);
        self
    }

    /// Records a single-token occurrence at `position`.
    pub fn add_token(
        &mut self,
        field: &str,
        term: &str,
        doc: DocId,
        position: Position,
    ) -> &mut Self {
        self.add(field, term, doc, position, position + 1, None)
    }

    /// Overrides the document length derived from the recorded occurrences.
    pub fn set_document_length(&mut self, field: &str, doc: DocId, length: Position) -> &mut Self {
        self.lengths
            .entry(field.to_string())
            .or_default()
            .insert(doc, length);
        self
    }

    /// Sorts every posting list and drops repeated intervals. When the same
    /// interval was recorded twice for a term, the first payload wins.
    pub fn build(self) -> MemoryIndex {
        let mut fields: AHashMap<String, FieldData> = AHashMap::new();
        for ((field, term), docs) in self.occurrences {
            let postings = docs
                .into_iter()
                .map(|(doc, mut occurrences)| {
                    occurrences.sort_by_key(|o| (o.start, o.end));
                    occurrences.dedup_by_key(|o| (o.start, o.end));
                    DocPostings { doc, occurrences }
                })
                .collect::<Vec<_>>();
            fields
                .entry(field)
                .or_default()
                .terms
                .insert(term, Arc::new(postings));
        }
        for (field, lengths) in self.lengths {
            fields.entry(field).or_default().lengths = lengths;
        }
        MemoryIndex { fields }
    }
}

/// Postings cursor over an in-memory posting list.
struct MemoryPostings {
    docs: Arc<Vec<DocPostings>>,
    /// Index of the current document; `None` before the first move.
    doc_idx: Option<usize>,
    /// Next occurrence to hand out within the current document.
    occ_idx: usize,
}

impl MemoryPostings {
    fn new(docs: Arc<Vec<DocPostings>>) -> MemoryPostings {
        MemoryPostings {
            docs,
            doc_idx: None,
            occ_idx: 0,
        }
    }

    fn current(&self) -> Option<&DocPostings> {
        self.doc_idx.and_then(|idx| self.docs.get(idx))
    }

    fn move_to(&mut self, idx: usize) -> DocId {
        self.doc_idx = Some(idx.min(self.docs.len()));
        self.occ_idx = 0;
        self.doc()
    }
}

impl Postings for MemoryPostings {
    fn doc(&self) -> DocId {
        self.current().map_or(NO_MORE_DOCS, |d| d.doc)
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let idx = self.doc_idx.map_or(0, |idx| idx + 1);
        Ok(self.move_to(idx))
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let from = self.doc_idx.map_or(0, |idx| idx + 1).min(self.docs.len());
        let idx = from + self.docs[from..].partition_point(|d| d.doc < target);
        Ok(self.move_to(idx))
    }

    fn freq(&self) -> u32 {
        self.current().map_or(0, |d| d.occurrences.len() as u32)
    }

    fn next_occurrence(&mut self) -> Result<Occurrence> {
        let occurrence = self
            .current()
            .and_then(|d| d.occurrences.get(self.occ_idx))
            .cloned()
            .ok_or_else(|| Error::invalid_operation("read past the last occurrence"))?;
        self.occ_idx += 1;
        Ok(occurrence)
    }

    fn cost(&self) -> u64 {
        let visited = self.doc_idx.map_or(0, |idx| idx + 1);
        self.docs.len().saturating_sub(visited) as u64
    }
}
