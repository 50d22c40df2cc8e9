mod query_tests;

use std::sync::Arc;

use crate::{
    DocId, MemoryIndex, MemoryIndexBuilder, Position, PositionSource, Result, Span, SpanOptions,
    SpanQuery, spans::testing,
};

pub(crate) const FIELD: &str = testing::FIELD;

pub(crate) fn source(docs: &[&str]) -> Arc<dyn PositionSource> {
    Arc::new(testing::index(docs))
}

pub(crate) fn t(term: &str) -> SpanQuery {
    SpanQuery::term(FIELD, term)
}

pub(crate) fn run_with(
    source: &Arc<dyn PositionSource>,
    query: &SpanQuery,
    options: &SpanOptions,
) -> Vec<Span> {
    query
        .spans(source, options)
        .unwrap()
        .into_matches()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

pub(crate) fn run(source: &Arc<dyn PositionSource>, query: &SpanQuery) -> Vec<Span> {
    run_with(source, query, &SpanOptions::default())
}

pub(crate) fn keys(
    source: &Arc<dyn PositionSource>,
    query: &SpanQuery,
) -> Vec<(DocId, Position, Position)> {
    run(source, query).iter().map(Span::key).collect()
}

pub(crate) fn memory(build: impl FnOnce(&mut MemoryIndexBuilder)) -> Arc<dyn PositionSource> {
    let mut builder = MemoryIndex::builder();
    build(&mut builder);
    Arc::new(builder.build())
}
