//! Running a query to completion.

use std::sync::Arc;

use lexspan::{PositionSource, Span, SpanOptions, SpanQuery, Spans};

use crate::Key;

/// Opens `query` over `source` and drains every match.
pub fn collect(
    query: &SpanQuery,
    source: &Arc<dyn PositionSource>,
    options: &SpanOptions,
) -> anyhow::Result<Vec<Span>> {
    let mut cursor = query.spans(source, options)?;
    let mut matches = Vec::new();
    while cursor.next()? {
        matches.push(cursor.span());
    }
    Ok(matches)
}

/// Like [`collect`], keeping only `(document, start, end)`.
pub fn collect_keys(
    query: &SpanQuery,
    source: &Arc<dyn PositionSource>,
) -> anyhow::Result<Vec<Key>> {
    Ok(collect(query, source, &SpanOptions::default())?
        .iter()
        .map(Span::key)
        .collect())
}
