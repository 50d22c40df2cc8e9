//! The position source: the index-side collaborator the span algebra reads from.
//!
//! A [`PositionSource`] hands out one [`Postings`] cursor per (field, term). The
//! postings enumerate documents in ascending order and, within a document, the
//! term's occurrences sorted by `(start, end)`. Element annotations (sentences,
//! paragraphs, ...) are ordinary terms whose occurrences span several tokens.
//!
//! Sources are shared across segments and threads; postings are owned by exactly
//! one cursor and only ever advance.

use lexspan_common::{Result, error::Error};
use regex::Regex;
use serde::Serialize;

use crate::{
    payload::PayloadEntry,
    span::{DocId, Position},
};

pub mod memory;

pub use memory::{MemoryIndex, MemoryIndexBuilder};

/// A single occurrence of a term inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub start: Position,
    pub end: Position,
    pub payload: Option<PayloadEntry>,
}

impl Occurrence {
    pub fn new(start: Position, end: Position) -> Occurrence {
        Occurrence {
            start,
            end,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: PayloadEntry) -> Occurrence {
        self.payload = Some(payload);
        self
    }
}

/// Forward-only cursor over the postings of one term.
///
/// Before the first call to [`next_doc`](Self::next_doc) or [`advance`](Self::advance)
/// the cursor is unpositioned and [`doc`](Self::doc) returns [`NO_MORE_DOCS`](crate::NO_MORE_DOCS).
pub trait Postings: Send {
    /// The current document, or `NO_MORE_DOCS` when unpositioned or exhausted.
    fn doc(&self) -> DocId;

    /// Moves to the next document that contains the term.
    fn next_doc(&mut self) -> Result<DocId>;

    /// Moves to the first document `>= target`, always past the current one.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Number of occurrences in the current document. May be zero.
    fn freq(&self) -> u32;

    /// Reads the next occurrence of the current document. Must be called at
    /// most [`freq`](Self::freq) times per document.
    fn next_occurrence(&mut self) -> Result<Occurrence>;

    /// Number of documents this cursor may still visit.
    fn cost(&self) -> u64;
}

/// Per-segment access to term positions.
pub trait PositionSource: Send + Sync {
    /// Opens the postings of `term` in `field`, or `None` if the term does not occur.
    fn postings(&self, field: &str, term: &str) -> Result<Option<Box<dyn Postings>>>;

    /// The number of token positions in `doc`, if the source records it.
    ///
    /// Right expansion is clamped to this length. A source returning `None`
    /// lets expanded spans run past the last token of the document, up to the
    /// expansion maximum.
    fn document_length(&self, _field: &str, _doc: DocId) -> Result<Option<Position>> {
        Ok(None)
    }
}

/// Term listing used to rewrite wildcard and regular expression terms.
pub trait TermDictionary {
    /// All terms of `field` accepted by `pattern`, in ascending order.
    fn terms_matching(&self, field: &str, pattern: &TermPattern) -> Result<Vec<String>>;
}

/// A term pattern that has to be expanded against a term dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "camelCase")]
pub enum TermPattern {
    /// `*` matches any run of characters, `?` exactly one.
    Wildcard(String),
    /// A regular expression matched against the whole term.
    Regex(String),
}

impl TermPattern {
    /// Compiles the pattern to an anchored regular expression.
    pub fn compile(&self) -> Result<Regex> {
        let (source, text) = match self {
            TermPattern::Wildcard(pattern) => (wildcard_to_regex(pattern), pattern),
            TermPattern::Regex(pattern) => (format!("^(?:{pattern})$"), pattern),
        };
        Regex::new(&source).map_err(|e| Error::invalid_pattern(text.clone(), Box::new(e)))
    }
}

impl std::fmt::Display for TermPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermPattern::Wildcard(pattern) => write!(f, "{pattern}"),
            TermPattern::Regex(pattern) => write!(f, "/{pattern}/"),
        }
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => source.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_compilation() {
        let re = TermPattern::Wildcard("ha?s*".into()).compile().unwrap();
        assert!(re.is_match("haus"));
        assert!(re.is_match("hausboot"));
        assert!(!re.is_match("hs"));
        assert!(!re.is_match("shaus"));

        let re = TermPattern::Wildcard("a.b".into()).compile().unwrap();
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn test_regex_is_anchored() {
        let re = TermPattern::Regex("l(a|e)uft".into()).compile().unwrap();
        assert!(re.is_match("lauft"));
        assert!(!re.is_match("verlauft"));
    }

    #[test]
    fn test_invalid_regex_is_a_construction_error() {
        let err = TermPattern::Regex("(unclosed".into()).compile().unwrap_err();
        assert!(err.is_construction_error());
    }
}
