//! Test utilities for the lexspan workspace.
//!
//! This crate provides:
//! - corpus builders that turn short annotated texts into an in-memory index
//! - seeded random corpora for randomized tests
//! - brute-force reference matchers to compare cursor output against
//! - position sources that fail on demand, for error propagation tests

pub mod collect;
pub mod corpus;
pub mod data_gen;
pub mod faults;
pub mod reference;

pub use collect::{collect, collect_keys};
pub use corpus::{Corpus, CorpusBuilder};

/// `(document, start, end)` of a match.
pub type Key = (lexspan::DocId, lexspan::Position, lexspan::Position);
