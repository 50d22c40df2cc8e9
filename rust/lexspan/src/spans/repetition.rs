//! Contiguous repetitions of one pattern.

use std::collections::BTreeMap;

use lexspan_common::Result;

use super::{Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor};
use crate::{
    payload::{PayloadEntry, merge_unique},
    span::{DocId, Position, Span},
};

pub type RepetitionSpans = Buffered<RepetitionMatcher>;

/// Emits `[first.start, last.end)` for every chain of `min..=max` base spans
/// laid end to end.
///
/// Chains are grown one layer at a time per start position. A layer maps the
/// chain end to the payload of all chains reaching it, so a position reached by
/// several chains of the same length is only extended once.
pub struct RepetitionMatcher {
    base: Operand,
    min: u32,
    max: u32,
    bases: Vec<Span>,
}

impl RepetitionMatcher {
    pub fn new(base: SpanCursor, min: u32, max: u32, collect_payloads: bool) -> RepetitionMatcher {
        debug_assert!(1 <= min && min <= max);
        RepetitionMatcher {
            base: Operand::new(base, collect_payloads),
            min,
            max,
            bases: Vec::new(),
        }
    }

    /// Base spans starting at `start`. Zero-width spans never extend a chain.
    fn starting_at(&self, start: Position) -> impl Iterator<Item = &Span> {
        let from = self.bases.partition_point(|s| s.start < start);
        self.bases[from..]
            .iter()
            .take_while(move |s| s.start == start)
            .filter(|s| s.end > s.start)
    }

    fn chains_from(&self, start: Position, queue: &mut MatchQueue) {
        let mut layer: BTreeMap<Position, Vec<PayloadEntry>> = BTreeMap::new();
        for span in self.starting_at(start) {
            merge_unique(layer.entry(span.end).or_default(), &span.payload);
        }
        let mut count = 1;
        while !layer.is_empty() {
            if count >= self.min {
                for (&end, payload) in &layer {
                    queue.push(start, end, payload.clone());
                }
            }
            if count == self.max {
                break;
            }
            let mut grown: BTreeMap<Position, Vec<PayloadEntry>> = BTreeMap::new();
            for (&end, payload) in &layer {
                for span in self.starting_at(end) {
                    let entry = grown.entry(span.end).or_default();
                    merge_unique(entry, payload);
                    merge_unique(entry, &span.payload);
                }
            }
            layer = grown;
            count += 1;
        }
    }
}

impl DocumentMatcher for RepetitionMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if !self.base.skip_to(target)? {
            return Ok(false);
        }
        let doc = self.base.doc();
        self.bases.clear();
        self.base.collect_document(doc, &mut self.bases)?;

        queue.reset(doc);
        let mut starts = self.bases.iter().map(|s| s.start).collect::<Vec<_>>();
        starts.dedup();
        for start in starts {
            self.chains_from(start, queue);
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.base.cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        source::MemoryIndex,
        spans::testing::{FIELD, index, keys, term},
    };

    fn repetition(index: &MemoryIndex, min: u32, max: u32) -> SpanCursor {
        SpanCursor::Repetition(Box::new(Buffered::new(RepetitionMatcher::new(
            term(index, "a"),
            min,
            max,
            true,
        ))))
    }

    #[test]
    fn test_one_or_two_of_four() {
        let index = index(&["a a a a"]);
        assert_eq!(
            keys(repetition(&index, 1, 2)),
            vec![
                (0, 0, 1),
                (0, 0, 2),
                (0, 1, 2),
                (0, 1, 3),
                (0, 2, 3),
                (0, 2, 4),
                (0, 3, 4)
            ]
        );
    }

    #[test]
    fn test_gap_breaks_chain() {
        let index = index(&["a a x a"]);
        assert_eq!(keys(repetition(&index, 2, 3)), vec![(0, 0, 2)]);
    }

    #[test]
    fn test_chains_of_variable_width_spans() {
        let mut builder = MemoryIndex::builder();
        builder
            .add(FIELD, "a", 0, 0, 1, None)
            .add(FIELD, "a", 0, 0, 2, None)
            .add(FIELD, "a", 0, 1, 3, None)
            .add(FIELD, "a", 0, 2, 3, None);
        let index = builder.build();
        // 0-1-3 and 0-2-3 both reach 3: reported once
        assert_eq!(keys(repetition(&index, 2, 2)), vec![(0, 0, 3)]);
    }
}
