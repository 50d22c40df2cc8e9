//! Span query algebra for searching positionally annotated text.
//!
//! A query is a tree of span operators ([`SpanQuery`]): adjacency, co-extension,
//! containment and overlap, distance, expansion, repetition, slicing, and class
//! marking and focusing for capture groups. For each index segment the tree is
//! opened into a tree of forward-only cursors ([`SpanCursor`]) that pull term
//! occurrences from a [`PositionSource`] and emit matches in strictly increasing
//! `(document, start, end)` order, each with the payload entries collected on
//! the way.
//!
//! ```
//! use std::sync::Arc;
//!
//! use lexspan::{MemoryIndex, PositionSource, SpanOptions, SpanQuery};
//!
//! let mut builder = MemoryIndex::builder();
//! for (pos, term) in ["a", "b", "a", "b"].into_iter().enumerate() {
//!     builder.add_token("tokens", term, 0, pos as u32);
//! }
//! let index: Arc<dyn PositionSource> = Arc::new(builder.build());
//!
//! let query = SpanQuery::next(
//!     SpanQuery::term("tokens", "a"),
//!     SpanQuery::term("tokens", "b"),
//! )?;
//! let matches = query
//!     .spans(&index, &SpanOptions::default())?
//!     .into_matches()
//!     .map(|span| span.map(|span| (span.start, span.end)))
//!     .collect::<lexspan::Result<Vec<_>>>()?;
//! assert_eq!(matches, vec![(0, 2), (2, 4)]);
//! # Ok::<(), lexspan::Error>(())
//! ```

pub mod class;
pub mod payload;
pub mod query;
pub mod source;
pub mod span;
pub mod spans;

#[cfg(test)]
mod tests;

pub use lexspan_common::{Result, error::Error, error::ErrorKind};

pub use class::{ClassNumber, ClassSet};
pub use payload::{ClassPayload, PayloadEntry, PayloadKind};
pub use query::{
    ClassRelation, ClassTarget, DistanceConstraint, DistanceUnit, ExpansionDirection,
    MAX_EXPANSION, SpanOptions, SpanQuery, WithinRelation,
};
pub use source::{
    MemoryIndex, MemoryIndexBuilder, Occurrence, PositionSource, Postings, TermDictionary,
    TermPattern,
};
pub use span::{DocId, NO_MORE_DOCS, Position, Span};
pub use spans::{CursorState, SpanCursor, Spans};
