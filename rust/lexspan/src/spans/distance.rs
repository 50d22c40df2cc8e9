//! Distance between two operands, counted in tokens or in elements.
//!
//! Token distance is the number of positions between the end of the earlier
//! span and the start of the later one. Element distance is the difference of
//! the indexes of the first elements (in `(start, end)` order) containing each
//! span; spans outside any element have no element distance. Overlapping pairs
//! have no distance in either unit.
//!
//! With `exclusion` set, the operator inverts: it emits the `A` spans for which
//! no `B` span of the document lies in the window.

use lexspan_common::Result;

use super::{
    Buffered, DocumentMatcher, MatchQueue, Operand, SpanCursor, collect_aligned, union_payload,
};
use crate::{
    query::DistanceConstraint,
    span::{DocId, Span},
};

pub type DistanceSpans = Buffered<DistanceMatcher>;

/// The element spans of the current document.
struct Elements {
    operand: Operand,
    spans: Vec<Span>,
}

impl Elements {
    fn load(&mut self, doc: DocId) -> Result<()> {
        self.spans.clear();
        self.operand.collect_document(doc, &mut self.spans)
    }

    /// Index of the first element containing `span`.
    fn locate(&self, span: &Span) -> Option<usize> {
        let upper = self.spans.partition_point(|e| e.start <= span.start);
        self.spans[..upper].iter().position(|e| span.end <= e.end)
    }
}

enum Measure {
    Token,
    Element(Box<Elements>),
}

/// A [`DistanceConstraint`] bound to the cursor of its element query.
pub(crate) struct Window {
    measure: Measure,
    min: u32,
    max: u32,
    ordered: bool,
    exclusion: bool,
}

impl Window {
    /// Binds `constraint`; `element` must be the opened element query when the
    /// constraint counts elements.
    pub fn new(constraint: &DistanceConstraint, element: Option<SpanCursor>) -> Window {
        let measure = match element {
            Some(cursor) => Measure::Element(Box::new(Elements {
                operand: Operand::new(cursor, false),
                spans: Vec::new(),
            })),
            None => Measure::Token,
        };
        Window {
            measure,
            min: constraint.min(),
            max: constraint.max(),
            ordered: constraint.is_ordered(),
            exclusion: constraint.is_exclusion(),
        }
    }

    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    /// Reads whatever per-document state the measure needs for `doc`.
    pub fn load(&mut self, doc: DocId) -> Result<()> {
        match &mut self.measure {
            Measure::Token => Ok(()),
            Measure::Element(elements) => elements.load(doc),
        }
    }

    /// Whether `span` can be measured at all in the loaded document.
    pub fn measurable(&self, span: &Span) -> bool {
        match &self.measure {
            Measure::Token => true,
            Measure::Element(elements) => elements.locate(span).is_some(),
        }
    }

    /// Distance between `a` and `b` and whether `a` comes first.
    fn distance(&self, a: &Span, b: &Span) -> Option<(u32, bool)> {
        let a_first = if a.end <= b.start {
            true
        } else if b.end <= a.start {
            false
        } else {
            return None;
        };
        match &self.measure {
            Measure::Token if a_first => Some((b.start - a.end, true)),
            Measure::Token => Some((a.start - b.end, false)),
            Measure::Element(elements) => {
                let (ia, ib) = (elements.locate(a)?, elements.locate(b)?);
                let gap = u32::try_from(ia.abs_diff(ib)).unwrap_or(u32::MAX);
                (ia <= ib || !a_first).then_some((gap, a_first))
            }
        }
    }

    /// The distance predicate itself, ignoring `exclusion`.
    pub fn within_window(&self, a: &Span, b: &Span) -> bool {
        self.distance(a, b).is_some_and(|(gap, a_first)| {
            (a_first || !self.ordered) && self.min <= gap && gap <= self.max
        })
    }
}

/// Emits the hull of every `(A, B)` pair in the window, or, for exclusion
/// windows, every `A` without such a `B`.
pub struct DistanceMatcher {
    first: Operand,
    second: Operand,
    window: Window,
    firsts: Vec<Span>,
    seconds: Vec<Span>,
}

impl DistanceMatcher {
    pub(crate) fn new(
        first: SpanCursor,
        second: SpanCursor,
        window: Window,
        collect_payloads: bool,
    ) -> DistanceMatcher {
        DistanceMatcher {
            first: Operand::new(first, collect_payloads),
            second: Operand::new(second, collect_payloads),
            window,
            firsts: Vec::new(),
            seconds: Vec::new(),
        }
    }

    fn fill_pairs(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        let Some(doc) = collect_aligned(
            &mut self.first,
            &mut self.second,
            target,
            &mut self.firsts,
            &mut self.seconds,
        )?
        else {
            return Ok(false);
        };
        self.window.load(doc)?;
        queue.reset(doc);
        for a in &self.firsts {
            for b in &self.seconds {
                if self.window.within_window(a, b) {
                    queue.push(
                        a.start.min(b.start),
                        a.end.max(b.end),
                        union_payload(&a.payload, &b.payload),
                    );
                }
            }
        }
        Ok(true)
    }

    /// Exclusion reads every document of `A`, whether `B` occurs there or not.
    /// Each `A` span is tested against all `B` spans of its document.
    fn fill_excluded(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if !self.first.skip_to(target)? {
            return Ok(false);
        }
        let doc = self.first.doc();
        self.firsts.clear();
        self.seconds.clear();
        self.first.collect_document(doc, &mut self.firsts)?;
        self.second.collect_document(doc, &mut self.seconds)?;
        self.window.load(doc)?;
        queue.reset(doc);
        for a in &self.firsts {
            let window = &self.window;
            if window.measurable(a) && !self.seconds.iter().any(|b| window.within_window(a, b)) {
                queue.push(a.start, a.end, a.payload.clone());
            }
        }
        Ok(true)
    }
}

impl DocumentMatcher for DistanceMatcher {
    fn fill(&mut self, target: DocId, queue: &mut MatchQueue) -> Result<bool> {
        if self.window.is_exclusion() {
            self.fill_excluded(target, queue)
        } else {
            self.fill_pairs(target, queue)
        }
    }

    fn cost(&self) -> u64 {
        if self.window.is_exclusion() {
            self.first.cost()
        } else {
            self.first.cost().min(self.second.cost())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::{DistanceUnit, SpanQuery},
        source::MemoryIndex,
        spans::testing::{FIELD, index, keys, term},
    };

    fn distance(
        index: &MemoryIndex,
        a: &str,
        b: &str,
        constraint: DistanceConstraint,
    ) -> SpanCursor {
        let element = match constraint.unit() {
            DistanceUnit::Token => None,
            DistanceUnit::Element(query) => match query.as_ref() {
                SpanQuery::Term(t) => Some(term(index, t.term())),
                _ => unreachable!(),
            },
        };
        let window = Window::new(&constraint, element);
        SpanCursor::Distance(Box::new(Buffered::new(DistanceMatcher::new(
            term(index, a),
            term(index, b),
            window,
            true,
        ))))
    }

    #[test]
    fn test_token_window() {
        let index = index(&["a x x b", "a x b", "a x x x x x b"]);
        let constraint = DistanceConstraint::tokens(2, 3).unwrap();
        assert_eq!(keys(distance(&index, "a", "b", constraint)), vec![(0, 0, 4)]);
    }

    #[test]
    fn test_ordered_and_unordered() {
        let index = index(&["b x a"]);
        let ordered = DistanceConstraint::tokens(0, 2).unwrap();
        assert!(keys(distance(&index, "a", "b", ordered.clone())).is_empty());
        assert_eq!(keys(distance(&index, "a", "b", ordered.unordered())), vec![(0, 0, 3)]);
    }

    #[test]
    fn test_overlapping_pair_has_no_distance() {
        let index = index(&["a|b"]);
        let constraint = DistanceConstraint::tokens(0, 5).unwrap().unordered();
        assert!(keys(distance(&index, "a", "b", constraint)).is_empty());
    }

    #[test]
    fn test_exclusion_emits_a_without_b() {
        let index = index(&["a b x x a", "a", "x b"]);
        let constraint = DistanceConstraint::tokens(0, 1).unwrap().excluded();
        assert_eq!(
            keys(distance(&index, "a", "b", constraint)),
            vec![(0, 4, 5), (1, 0, 1)]
        );
    }

    #[test]
    fn test_element_distance() {
        // sentences [0, 3) [3, 5) [5, 8)
        let mut builder = MemoryIndex::builder();
        for (start, end) in [(0, 3), (3, 5), (5, 8)] {
            builder.add(FIELD, "<>:s", 0, start, end, None);
        }
        builder
            .add_token(FIELD, "a", 0, 1)
            .add_token(FIELD, "b", 0, 2)
            .add_token(FIELD, "b", 0, 4)
            .add_token(FIELD, "b", 0, 7)
            .add_token(FIELD, "b", 0, 9);
        let index = builder.build();
        let sentence = || SpanQuery::term(FIELD, "<>:s");

        let same = DistanceConstraint::elements(sentence(), 0, 0).unwrap();
        assert_eq!(keys(distance(&index, "a", "b", same)), vec![(0, 1, 3)]);

        let next = DistanceConstraint::elements(sentence(), 1, 2).unwrap();
        assert_eq!(keys(distance(&index, "a", "b", next)), vec![(0, 1, 5), (0, 1, 8)]);

        let excluded = DistanceConstraint::elements(sentence(), 1, 1).unwrap().excluded();
        assert!(keys(distance(&index, "a", "b", excluded)).is_empty());
    }
}
