//! Small annotated corpora.
//!
//! A document is written as whitespace-separated tokens; `|` separates several
//! annotations of the same position (`der|ART Hund|NN`). Every annotation
//! becomes a one-token term carrying a `TokenOffsets` payload with the
//! character offsets of its token. Elements such as sentences are added as
//! multi-token terms.

use std::sync::Arc;

use lexspan::{DocId, MemoryIndex, PayloadEntry, Position, PositionSource};

use crate::Key;

/// A built corpus: the index plus the raw annotations, for reference matchers.
pub struct Corpus {
    field: String,
    docs: Vec<Vec<Vec<String>>>,
    elements: Vec<(String, Key)>,
    index: Arc<MemoryIndex>,
}

impl Corpus {
    pub fn builder(field: &str) -> CorpusBuilder {
        CorpusBuilder {
            field: field.to_string(),
            docs: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn index(&self) -> &Arc<MemoryIndex> {
        &self.index
    }

    pub fn source(&self) -> Arc<dyn PositionSource> {
        self.index.clone()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn doc_len(&self, doc: DocId) -> Position {
        self.docs[doc as usize].len() as Position
    }

    /// Occurrences of `term` (token annotation or element), sorted.
    pub fn occurrences(&self, term: &str) -> Vec<Key> {
        let mut keys = Vec::new();
        for (doc, tokens) in self.docs.iter().enumerate() {
            for (pos, annotations) in tokens.iter().enumerate() {
                if annotations.iter().any(|a| a == term) {
                    keys.push((doc as DocId, pos as Position, pos as Position + 1));
                }
            }
        }
        keys.extend(
            self.elements
                .iter()
                .filter(|(name, _)| name == term)
                .map(|&(_, key)| key),
        );
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

pub struct CorpusBuilder {
    field: String,
    docs: Vec<Vec<Vec<String>>>,
    elements: Vec<(String, Key)>,
}

impl CorpusBuilder {
    /// Appends a document.
    pub fn doc(&mut self, text: &str) -> &mut Self {
        let tokens = text
            .split_whitespace()
            .map(|token| token.split('|').map(str::to_string).collect())
            .collect();
        self.docs.push(tokens);
        self
    }

    /// Adds an element `[start, end)` to the last document added.
    pub fn element(&mut self, name: &str, start: Position, end: Position) -> &mut Self {
        let doc = self.docs.len().saturating_sub(1) as DocId;
        self.elements.push((name.to_string(), (doc, start, end)));
        self
    }

    pub fn build(&mut self) -> Corpus {
        let mut builder = MemoryIndex::builder();
        for (doc, tokens) in self.docs.iter().enumerate() {
            let mut offset = 0;
            for (pos, annotations) in tokens.iter().enumerate() {
                let width = annotations[0].chars().count() as u32;
                let payload = PayloadEntry::token_offsets(offset, offset + width);
                for annotation in annotations {
                    builder.add(
                        &self.field,
                        annotation,
                        doc as DocId,
                        pos as Position,
                        pos as Position + 1,
                        Some(payload.clone()),
                    );
                }
                offset += width + 1;
            }
            builder.set_document_length(&self.field, doc as DocId, tokens.len() as Position);
        }
        for (name, (doc, start, end)) in &self.elements {
            builder.add(&self.field, name, *doc, *start, *end, None);
        }
        Corpus {
            field: self.field.clone(),
            docs: std::mem::take(&mut self.docs),
            elements: std::mem::take(&mut self.elements),
            index: Arc::new(builder.build()),
        }
    }
}
