//! Span cursors: the forward-only match iterators behind every query operator.
//!
//! Every operator is one variant of the closed [`SpanCursor`] enum. A parent cursor
//! exclusively owns its children and pulls from them; nothing is shared between
//! two cursor trees, so one tree can be opened per index segment and the trees
//! driven on different threads.
//!
//! All cursors honor the same contract:
//! - matches are produced in strictly increasing `(doc, start, end)` order;
//! - the first [`next`](Spans::next) primes the cursor;
//! - [`payload`](Spans::payload) borrows the payload of the current match and is
//!   only meaningful until the cursor advances again;
//! - exhaustion is sticky.

use lexspan_common::{Result, try_or_ret_some_err};

use crate::{
    payload::PayloadEntry,
    span::{DocId, NO_MORE_DOCS, Position, Span},
};

mod base;
mod class;
mod distance;
mod expansion;
mod focus;
mod multi_distance;
mod next;
mod or;
mod repetition;
mod segment;
mod subspan;
mod term;
mod within;

pub use class::ClassSpans;
pub use distance::{DistanceMatcher, DistanceSpans};
pub use expansion::{ExpansionMatcher, ExpansionSpans};
pub use focus::{ClassFilterSpans, FocusMatcher, FocusSpans};
pub use multi_distance::{MultipleDistanceMatcher, MultipleDistanceSpans};
pub use next::{NextMatcher, NextSpans};
pub use or::{OrMatcher, OrSpans};
pub use repetition::{RepetitionMatcher, RepetitionSpans};
pub use segment::{SegmentMatcher, SegmentSpans};
pub use subspan::{SubspanMatcher, SubspanSpans};
pub use term::TermSpans;
pub use within::{WithinMatcher, WithinSpans};

pub use base::{Buffered, DocumentMatcher, MatchQueue};
pub(crate) use base::{Operand, align, collect_aligned, union_payload};
pub(crate) use distance::Window;

/// Lifecycle of a cursor.
///
/// `Uninitialized -> Primed` on the first successful advance, `Primed -> Iterating`
/// on the second, and any failed advance moves to the terminal `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Uninitialized,
    Primed,
    Iterating,
    Exhausted,
}

impl CursorState {
    /// Records the outcome of an advance and passes `found` through.
    #[inline]
    pub(crate) fn advance(&mut self, found: bool) -> bool {
        *self = match (*self, found) {
            (_, false) | (CursorState::Exhausted, _) => CursorState::Exhausted,
            (CursorState::Uninitialized, true) => CursorState::Primed,
            (_, true) => CursorState::Iterating,
        };
        found && *self != CursorState::Exhausted
    }

    #[inline]
    pub fn is_exhausted(self) -> bool {
        self == CursorState::Exhausted
    }

    /// `true` once the cursor sits on a match.
    #[inline]
    pub fn is_positioned(self) -> bool {
        matches!(self, CursorState::Primed | CursorState::Iterating)
    }
}

/// The span cursor contract.
pub trait Spans {
    /// Document of the current match; `NO_MORE_DOCS` once exhausted.
    fn doc(&self) -> DocId;

    /// Start position of the current match.
    fn start(&self) -> Position;

    /// End position (exclusive) of the current match.
    fn end(&self) -> Position;

    /// Advances to the next match. Returns `false` once there are none left.
    fn next(&mut self) -> Result<bool>;

    /// Advances beyond the current match to the first match whose document is
    /// `>= target`.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Payload of the current match.
    fn payload(&self) -> &[PayloadEntry];

    /// Cheap estimate of the remaining work, used to order joins.
    fn cost(&self) -> u64;

    fn state(&self) -> CursorState;

    /// Copies the current match into an owned [`Span`].
    fn span(&self) -> Span {
        Span {
            doc: self.doc(),
            start: self.start(),
            end: self.end(),
            payload: self.payload().to_vec(),
        }
    }
}

/// A cursor that never matches. Opened for terms absent from the segment.
#[derive(Debug)]
pub struct EmptySpans {
    state: CursorState,
}

impl EmptySpans {
    pub fn new() -> EmptySpans {
        EmptySpans {
            state: CursorState::Uninitialized,
        }
    }
}

impl Default for EmptySpans {
    fn default() -> Self {
        EmptySpans::new()
    }
}

impl Spans for EmptySpans {
    fn doc(&self) -> DocId {
        NO_MORE_DOCS
    }

    fn start(&self) -> Position {
        0
    }

    fn end(&self) -> Position {
        0
    }

    fn next(&mut self) -> Result<bool> {
        Ok(self.state.advance(false))
    }

    fn skip_to(&mut self, _target: DocId) -> Result<bool> {
        Ok(self.state.advance(false))
    }

    fn payload(&self) -> &[PayloadEntry] {
        &[]
    }

    fn cost(&self) -> u64 {
        0
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

/// The closed set of operator cursors.
pub enum SpanCursor {
    Empty(EmptySpans),
    Term(TermSpans),
    Next(Box<NextSpans>),
    Segment(Box<SegmentSpans>),
    Within(Box<WithinSpans>),
    Distance(Box<DistanceSpans>),
    MultipleDistance(Box<MultipleDistanceSpans>),
    Expansion(Box<ExpansionSpans>),
    Repetition(Box<RepetitionSpans>),
    Subspan(Box<SubspanSpans>),
    Class(Box<ClassSpans>),
    Focus(Box<FocusSpans>),
    ClassFilter(Box<ClassFilterSpans>),
    Or(Box<OrSpans>),
}

macro_rules! dispatch {
    ($self:expr, $cursor:ident => $body:expr) => {
        match $self {
            SpanCursor::Empty($cursor) => $body,
            SpanCursor::Term($cursor) => $body,
            SpanCursor::Next($cursor) => $body,
            SpanCursor::Segment($cursor) => $body,
            SpanCursor::Within($cursor) => $body,
            SpanCursor::Distance($cursor) => $body,
            SpanCursor::MultipleDistance($cursor) => $body,
            SpanCursor::Expansion($cursor) => $body,
            SpanCursor::Repetition($cursor) => $body,
            SpanCursor::Subspan($cursor) => $body,
            SpanCursor::Class($cursor) => $body,
            SpanCursor::Focus($cursor) => $body,
            SpanCursor::ClassFilter($cursor) => $body,
            SpanCursor::Or($cursor) => $body,
        }
    };
}

impl SpanCursor {
    pub fn empty() -> SpanCursor {
        SpanCursor::Empty(EmptySpans::new())
    }

    /// Operator name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            SpanCursor::Empty(_) => "empty",
            SpanCursor::Term(_) => "term",
            SpanCursor::Next(_) => "next",
            SpanCursor::Segment(_) => "segment",
            SpanCursor::Within(_) => "within",
            SpanCursor::Distance(_) => "distance",
            SpanCursor::MultipleDistance(_) => "multipleDistance",
            SpanCursor::Expansion(_) => "expansion",
            SpanCursor::Repetition(_) => "repetition",
            SpanCursor::Subspan(_) => "subspan",
            SpanCursor::Class(_) => "class",
            SpanCursor::Focus(_) => "focus",
            SpanCursor::ClassFilter(_) => "classFilter",
            SpanCursor::Or(_) => "or",
        }
    }

    /// Turns the cursor into an iterator of owned spans.
    pub fn into_matches(self) -> Matches {
        Matches { cursor: self }
    }
}

impl Spans for SpanCursor {
    #[inline]
    fn doc(&self) -> DocId {
        dispatch!(self, c => c.doc())
    }

    #[inline]
    fn start(&self) -> Position {
        dispatch!(self, c => c.start())
    }

    #[inline]
    fn end(&self) -> Position {
        dispatch!(self, c => c.end())
    }

    #[inline]
    fn next(&mut self) -> Result<bool> {
        dispatch!(self, c => c.next())
    }

    #[inline]
    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        dispatch!(self, c => c.skip_to(target))
    }

    #[inline]
    fn payload(&self) -> &[PayloadEntry] {
        dispatch!(self, c => c.payload())
    }

    #[inline]
    fn cost(&self) -> u64 {
        dispatch!(self, c => c.cost())
    }

    #[inline]
    fn state(&self) -> CursorState {
        dispatch!(self, c => c.state())
    }
}

impl std::fmt::Debug for SpanCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanCursor")
            .field("operator", &self.name())
            .field("state", &self.state())
            .field("doc", &self.doc())
            .finish()
    }
}

/// Iterator adapter yielding owned copies of every match.
pub struct Matches {
    cursor: SpanCursor,
}

impl Iterator for Matches {
    type Item = Result<Span>;

    fn next(&mut self) -> Option<Result<Span>> {
        if try_or_ret_some_err!(Spans::next(&mut self.cursor)) {
            Some(Ok(self.cursor.span()))
        } else {
            None
        }
    }
}
