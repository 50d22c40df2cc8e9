//! The span query tree.
//!
//! A [`SpanQuery`] is an immutable description of an operator tree. Constructors
//! validate their arguments (operand fields, numeric ranges, class numbers), so
//! a tree that exists is well formed. Cursors are opened from a tree once per
//! index segment with [`SpanQuery::spans`]; the tree itself holds no traversal
//! state and can be shared freely.
//!
//! Term patterns (wildcards, regular expressions) have to be replaced by the
//! terms they match before cursors can be opened, see [`SpanQuery::rewrite`].

use std::{fmt, sync::Arc};

use itertools::Itertools;
use lexspan_common::{Result, error::Error, verify_arg, verify_range};
use serde::Serialize;

use crate::{
    class::{ClassNumber, ClassSet},
    source::{PositionSource, TermDictionary, TermPattern},
    spans::{
        Buffered, ClassFilterSpans, ClassSpans, DistanceMatcher, ExpansionMatcher, FocusMatcher,
        MultipleDistanceMatcher, NextMatcher, OrMatcher, RepetitionMatcher, SegmentMatcher,
        SpanCursor, SubspanMatcher, TermSpans, Window, WithinMatcher,
    },
};

mod options;
mod params;

pub use options::SpanOptions;
pub use params::{
    ClassRelation, ClassTarget, DistanceConstraint, DistanceUnit, ExpansionDirection,
    WithinRelation,
};

/// Upper bound on the number of positions an expansion may add.
pub const MAX_EXPANSION: u32 = 1 << 16;

/// A node of the span query tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operator", rename_all = "camelCase")]
pub enum SpanQuery {
    Term(TermQuery),
    Pattern(PatternQuery),
    Or(OrQuery),
    Next(PairQuery),
    Segment(PairQuery),
    Within(WithinQuery),
    Distance(DistanceQuery),
    MultipleDistance(MultipleDistanceQuery),
    Expansion(ExpansionQuery),
    Repetition(RepetitionQuery),
    Subspan(SubspanQuery),
    Class(ClassQuery),
    Focus(FocusQuery),
    ClassFilter(ClassFilterQuery),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermQuery {
    field: String,
    term: String,
}

impl TermQuery {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternQuery {
    field: String,
    pattern: TermPattern,
}

impl PatternQuery {
    pub fn pattern(&self) -> &TermPattern {
        &self.pattern
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrQuery {
    field: String,
    clauses: Vec<SpanQuery>,
}

impl OrQuery {
    pub fn clauses(&self) -> &[SpanQuery] {
        &self.clauses
    }
}

/// Two operands over the same field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairQuery {
    first: Box<SpanQuery>,
    second: Box<SpanQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithinQuery {
    wrap: Box<SpanQuery>,
    embedded: Box<SpanQuery>,
    relation: WithinRelation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceQuery {
    first: Box<SpanQuery>,
    second: Box<SpanQuery>,
    constraint: DistanceConstraint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipleDistanceQuery {
    first: Box<SpanQuery>,
    second: Box<SpanQuery>,
    constraints: Vec<DistanceConstraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionQuery {
    base: Box<SpanQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclusion: Option<Box<SpanQuery>>,
    min: u32,
    max: u32,
    direction: ExpansionDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<ClassNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepetitionQuery {
    base: Box<SpanQuery>,
    min: u32,
    max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubspanQuery {
    base: Box<SpanQuery>,
    offset: i32,
    length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassQuery {
    base: Box<SpanQuery>,
    class: ClassNumber,
    target: ClassTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusQuery {
    base: Box<SpanQuery>,
    classes: ClassSet,
    remove_temporary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassFilterQuery {
    base: Box<SpanQuery>,
    relation: ClassRelation,
    first: ClassNumber,
    second: ClassNumber,
}

/// Fails with `FieldMismatch` unless both operands search the same field.
fn same_field(first: &SpanQuery, second: &SpanQuery) -> Result<()> {
    if first.field() == second.field() {
        Ok(())
    } else {
        Err(Error::field_mismatch(first.field(), second.field()))
    }
}

impl SpanQuery {
    pub fn term(field: impl Into<String>, term: impl Into<String>) -> SpanQuery {
        SpanQuery::Term(TermQuery {
            field: field.into(),
            term: term.into(),
        })
    }

    /// A wildcard term: `*` matches any run of characters, `?` a single one.
    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Result<SpanQuery> {
        SpanQuery::pattern(field.into(), TermPattern::Wildcard(pattern.into()))
    }

    /// A term matched in full by a regular expression.
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Result<SpanQuery> {
        SpanQuery::pattern(field.into(), TermPattern::Regex(pattern.into()))
    }

    fn pattern(field: String, pattern: TermPattern) -> Result<SpanQuery> {
        pattern.compile()?;
        Ok(SpanQuery::Pattern(PatternQuery { field, pattern }))
    }

    /// Union of `clauses`, which must be non-empty and share one field.
    pub fn or(clauses: Vec<SpanQuery>) -> Result<SpanQuery> {
        verify_arg!(clauses, !clauses.is_empty());
        let field = clauses[0].field().to_string();
        for clause in &clauses[1..] {
            same_field(&clauses[0], clause)?;
        }
        Ok(SpanQuery::Or(OrQuery { field, clauses }))
    }

    /// `first` immediately followed by `second`.
    pub fn next(first: SpanQuery, second: SpanQuery) -> Result<SpanQuery> {
        same_field(&first, &second)?;
        Ok(SpanQuery::Next(PairQuery {
            first: Box::new(first),
            second: Box::new(second),
        }))
    }

    /// `first` and `second` covering the same interval.
    pub fn segment(first: SpanQuery, second: SpanQuery) -> Result<SpanQuery> {
        same_field(&first, &second)?;
        Ok(SpanQuery::Segment(PairQuery {
            first: Box::new(first),
            second: Box::new(second),
        }))
    }

    pub fn within(
        wrap: SpanQuery,
        embedded: SpanQuery,
        relation: WithinRelation,
    ) -> Result<SpanQuery> {
        same_field(&wrap, &embedded)?;
        Ok(SpanQuery::Within(WithinQuery {
            wrap: Box::new(wrap),
            embedded: Box::new(embedded),
            relation,
        }))
    }

    pub fn distance(
        first: SpanQuery,
        second: SpanQuery,
        constraint: DistanceConstraint,
    ) -> Result<SpanQuery> {
        same_field(&first, &second)?;
        if let Some(element) = constraint.element() {
            same_field(&first, element)?;
        }
        Ok(SpanQuery::Distance(DistanceQuery {
            first: Box::new(first),
            second: Box::new(second),
            constraint,
        }))
    }

    /// Pairs satisfying every constraint at once. At least one constraint must
    /// not be an exclusion.
    pub fn multiple_distance(
        first: SpanQuery,
        second: SpanQuery,
        constraints: Vec<DistanceConstraint>,
    ) -> Result<SpanQuery> {
        verify_arg!(constraints, constraints.iter().any(|c| !c.is_exclusion()));
        same_field(&first, &second)?;
        for element in constraints.iter().filter_map(DistanceConstraint::element) {
            same_field(&first, element)?;
        }
        Ok(SpanQuery::MultipleDistance(MultipleDistanceQuery {
            first: Box::new(first),
            second: Box::new(second),
            constraints,
        }))
    }

    /// Grows `base` by `min..=max` positions. When `class` is given, the added
    /// region is recorded in the payload under that class.
    ///
    /// `max` may not exceed [`MAX_EXPANSION`].
    pub fn expansion(
        base: SpanQuery,
        exclusion: Option<SpanQuery>,
        min: u32,
        max: u32,
        direction: ExpansionDirection,
        class: Option<ClassNumber>,
    ) -> Result<SpanQuery> {
        verify_range!(expansion, min, max);
        verify_arg!(max, max <= MAX_EXPANSION);
        if let Some(exclusion) = &exclusion {
            same_field(&base, exclusion)?;
        }
        Ok(SpanQuery::Expansion(ExpansionQuery {
            base: Box::new(base),
            exclusion: exclusion.map(Box::new),
            min,
            max,
            direction,
            class,
        }))
    }

    pub fn repetition(base: SpanQuery, min: u32, max: u32) -> Result<SpanQuery> {
        verify_arg!(min, min >= 1);
        verify_range!(repetition, min, max);
        Ok(SpanQuery::Repetition(RepetitionQuery {
            base: Box::new(base),
            min,
            max,
        }))
    }

    /// Slices `base`: a negative `offset` counts from the end, a zero `length`
    /// runs to the end.
    pub fn subspan(base: SpanQuery, offset: i32, length: u32) -> SpanQuery {
        SpanQuery::Subspan(SubspanQuery {
            base: Box::new(base),
            offset,
            length,
        })
    }

    /// Marks every match of `base` with `class`.
    pub fn class(base: SpanQuery, class: ClassNumber) -> SpanQuery {
        SpanQuery::Class(ClassQuery {
            base: Box::new(base),
            class,
            target: ClassTarget::Span,
        })
    }

    /// Re-numbers the class entries carried by the matches of `base`.
    pub fn reclass(base: SpanQuery, class: ClassNumber) -> SpanQuery {
        SpanQuery::Class(ClassQuery {
            base: Box::new(base),
            class,
            target: ClassTarget::Payload,
        })
    }

    /// Narrows each match of `base` to the hull of its `classes` entries.
    pub fn focus(base: SpanQuery, classes: ClassSet, remove_temporary: bool) -> Result<SpanQuery> {
        verify_arg!(classes, !classes.is_empty());
        Ok(SpanQuery::Focus(FocusQuery {
            base: Box::new(base),
            classes,
            remove_temporary,
        }))
    }

    pub fn class_filter(
        base: SpanQuery,
        relation: ClassRelation,
        first: ClassNumber,
        second: ClassNumber,
    ) -> SpanQuery {
        SpanQuery::ClassFilter(ClassFilterQuery {
            base: Box::new(base),
            relation,
            first,
            second,
        })
    }

    /// The field searched by this query.
    pub fn field(&self) -> &str {
        match self {
            SpanQuery::Term(q) => &q.field,
            SpanQuery::Pattern(q) => &q.field,
            SpanQuery::Or(q) => &q.field,
            SpanQuery::Next(q) | SpanQuery::Segment(q) => q.first.field(),
            SpanQuery::Within(q) => q.wrap.field(),
            SpanQuery::Distance(q) => q.first.field(),
            SpanQuery::MultipleDistance(q) => q.first.field(),
            SpanQuery::Expansion(q) => q.base.field(),
            SpanQuery::Repetition(q) => q.base.field(),
            SpanQuery::Subspan(q) => q.base.field(),
            SpanQuery::Class(q) => q.base.field(),
            SpanQuery::Focus(q) => q.base.field(),
            SpanQuery::ClassFilter(q) => q.base.field(),
        }
    }

    /// Returns `true` if a term pattern remains anywhere in the tree.
    pub fn needs_rewrite(&self) -> bool {
        match self {
            SpanQuery::Term(_) => false,
            SpanQuery::Pattern(_) => true,
            SpanQuery::Or(q) => q.clauses.iter().any(SpanQuery::needs_rewrite),
            SpanQuery::Next(q) | SpanQuery::Segment(q) => {
                q.first.needs_rewrite() || q.second.needs_rewrite()
            }
            SpanQuery::Within(q) => q.wrap.needs_rewrite() || q.embedded.needs_rewrite(),
            SpanQuery::Distance(q) => {
                q.first.needs_rewrite()
                    || q.second.needs_rewrite()
                    || q.constraint.element().is_some_and(SpanQuery::needs_rewrite)
            }
            SpanQuery::MultipleDistance(q) => {
                q.first.needs_rewrite()
                    || q.second.needs_rewrite()
                    || q.constraints
                        .iter()
                        .filter_map(DistanceConstraint::element)
                        .any(SpanQuery::needs_rewrite)
            }
            SpanQuery::Expansion(q) => {
                q.base.needs_rewrite()
                    || q.exclusion.as_deref().is_some_and(SpanQuery::needs_rewrite)
            }
            SpanQuery::Repetition(q) => q.base.needs_rewrite(),
            SpanQuery::Subspan(q) => q.base.needs_rewrite(),
            SpanQuery::Class(q) => q.base.needs_rewrite(),
            SpanQuery::Focus(q) => q.base.needs_rewrite(),
            SpanQuery::ClassFilter(q) => q.base.needs_rewrite(),
        }
    }

    /// Replaces every term pattern with the union of the terms it matches in
    /// `dictionary`. The rest of the tree is copied unchanged.
    pub fn rewrite(&self, dictionary: &dyn TermDictionary) -> Result<SpanQuery> {
        let boxed = |query: &SpanQuery| query.rewrite(dictionary).map(Box::new);
        let rewrite_constraint = |constraint: &DistanceConstraint| -> Result<DistanceConstraint> {
            match constraint.unit() {
                DistanceUnit::Token => Ok(constraint.clone()),
                DistanceUnit::Element(element) => DistanceConstraint::new(
                    DistanceUnit::Element(boxed(element)?),
                    constraint.min(),
                    constraint.max(),
                    constraint.is_ordered(),
                    constraint.is_exclusion(),
                ),
            }
        };

        Ok(match self {
            SpanQuery::Term(_) => self.clone(),
            SpanQuery::Pattern(q) => {
                let terms = dictionary.terms_matching(&q.field, &q.pattern)?;
                log::trace!("pattern {} rewritten to {} terms", q.pattern, terms.len());
                SpanQuery::Or(OrQuery {
                    field: q.field.clone(),
                    clauses: terms
                        .into_iter()
                        .map(|term| SpanQuery::term(q.field.clone(), term))
                        .collect(),
                })
            }
            SpanQuery::Or(q) => SpanQuery::Or(OrQuery {
                field: q.field.clone(),
                clauses: q
                    .clauses
                    .iter()
                    .map(|clause| clause.rewrite(dictionary))
                    .collect::<Result<_>>()?,
            }),
            SpanQuery::Next(q) => SpanQuery::Next(PairQuery {
                first: boxed(&q.first)?,
                second: boxed(&q.second)?,
            }),
            SpanQuery::Segment(q) => SpanQuery::Segment(PairQuery {
                first: boxed(&q.first)?,
                second: boxed(&q.second)?,
            }),
            SpanQuery::Within(q) => SpanQuery::Within(WithinQuery {
                wrap: boxed(&q.wrap)?,
                embedded: boxed(&q.embedded)?,
                relation: q.relation,
            }),
            SpanQuery::Distance(q) => SpanQuery::Distance(DistanceQuery {
                first: boxed(&q.first)?,
                second: boxed(&q.second)?,
                constraint: rewrite_constraint(&q.constraint)?,
            }),
            SpanQuery::MultipleDistance(q) => SpanQuery::MultipleDistance(MultipleDistanceQuery {
                first: boxed(&q.first)?,
                second: boxed(&q.second)?,
                constraints: q
                    .constraints
                    .iter()
                    .map(rewrite_constraint)
                    .collect::<Result<_>>()?,
            }),
            SpanQuery::Expansion(q) => SpanQuery::Expansion(ExpansionQuery {
                base: boxed(&q.base)?,
                exclusion: q.exclusion.as_deref().map(boxed).transpose()?,
                ..*q
            }),
            SpanQuery::Repetition(q) => SpanQuery::Repetition(RepetitionQuery {
                base: boxed(&q.base)?,
                ..*q
            }),
            SpanQuery::Subspan(q) => SpanQuery::Subspan(SubspanQuery {
                base: boxed(&q.base)?,
                ..*q
            }),
            SpanQuery::Class(q) => SpanQuery::Class(ClassQuery {
                base: boxed(&q.base)?,
                ..*q
            }),
            SpanQuery::Focus(q) => SpanQuery::Focus(FocusQuery {
                base: boxed(&q.base)?,
                ..*q
            }),
            SpanQuery::ClassFilter(q) => SpanQuery::ClassFilter(ClassFilterQuery {
                base: boxed(&q.base)?,
                ..*q
            }),
        })
    }

    /// Opens the cursor tree of this query over one segment.
    pub fn spans(
        &self,
        source: &Arc<dyn PositionSource>,
        options: &SpanOptions,
    ) -> Result<SpanCursor> {
        log::debug!("opening span cursors for {self} (field '{}')", self.field());
        self.open(source, options.collect_payloads)
    }

    fn open(&self, source: &Arc<dyn PositionSource>, collect: bool) -> Result<SpanCursor> {
        let cursor = match self {
            SpanQuery::Term(q) => match source.postings(&q.field, &q.term)? {
                Some(postings) => SpanCursor::Term(TermSpans::new(postings, collect)),
                None => {
                    log::trace!("term {}:{} not found", q.field, q.term);
                    SpanCursor::empty()
                }
            },
            SpanQuery::Pattern(q) => {
                return Err(Error::invalid_operation(format!(
                    "open cursor on unrewritten pattern {}",
                    q.pattern
                )));
            }
            SpanQuery::Or(q) if q.clauses.is_empty() => SpanCursor::empty(),
            SpanQuery::Or(q) => {
                let children = q
                    .clauses
                    .iter()
                    .map(|clause| clause.open(source, collect))
                    .collect::<Result<Vec<_>>>()?;
                SpanCursor::Or(Box::new(Buffered::new(OrMatcher::new(children, collect))))
            }
            SpanQuery::Next(q) => SpanCursor::Next(Box::new(Buffered::new(NextMatcher::new(
                q.first.open(source, collect)?,
                q.second.open(source, collect)?,
                collect,
            )))),
            SpanQuery::Segment(q) => {
                SpanCursor::Segment(Box::new(Buffered::new(SegmentMatcher::new(
                    q.first.open(source, collect)?,
                    q.second.open(source, collect)?,
                    collect,
                ))))
            }
            SpanQuery::Within(q) => SpanCursor::Within(Box::new(Buffered::new(WithinMatcher::new(
                q.wrap.open(source, collect)?,
                q.embedded.open(source, collect)?,
                q.relation,
                collect,
            )))),
            SpanQuery::Distance(q) => {
                let window = open_window(&q.constraint, source)?;
                SpanCursor::Distance(Box::new(Buffered::new(DistanceMatcher::new(
                    q.first.open(source, collect)?,
                    q.second.open(source, collect)?,
                    window,
                    collect,
                ))))
            }
            SpanQuery::MultipleDistance(q) => {
                let windows = q
                    .constraints
                    .iter()
                    .map(|constraint| open_window(constraint, source))
                    .collect::<Result<Vec<_>>>()?;
                SpanCursor::MultipleDistance(Box::new(Buffered::new(MultipleDistanceMatcher::new(
                    q.first.open(source, collect)?,
                    q.second.open(source, collect)?,
                    windows,
                    collect,
                ))))
            }
            SpanQuery::Expansion(q) => {
                let exclusion = match &q.exclusion {
                    Some(exclusion) => Some(exclusion.open(source, false)?),
                    None => None,
                };
                SpanCursor::Expansion(Box::new(Buffered::new(ExpansionMatcher::new(
                    q.base.open(source, collect)?,
                    exclusion,
                    q.min,
                    q.max,
                    q.direction,
                    q.class,
                    source.clone(),
                    q.base.field().to_string(),
                    collect,
                ))))
            }
            SpanQuery::Repetition(q) => {
                SpanCursor::Repetition(Box::new(Buffered::new(RepetitionMatcher::new(
                    q.base.open(source, collect)?,
                    q.min,
                    q.max,
                    collect,
                ))))
            }
            SpanQuery::Subspan(q) => {
                SpanCursor::Subspan(Box::new(Buffered::new(SubspanMatcher::new(
                    q.base.open(source, collect)?,
                    q.offset,
                    q.length,
                    collect,
                ))))
            }
            SpanQuery::Class(q) => SpanCursor::Class(Box::new(ClassSpans::new(
                q.base.open(source, collect)?,
                q.class,
                q.target,
                collect,
            ))),
            SpanQuery::Focus(q) => SpanCursor::Focus(Box::new(Buffered::new(FocusMatcher::new(
                q.base.open(source, true)?,
                q.classes,
                q.remove_temporary,
                collect,
            )))),
            SpanQuery::ClassFilter(q) => SpanCursor::ClassFilter(Box::new(ClassFilterSpans::new(
                q.base.open(source, true)?,
                q.relation,
                q.first,
                q.second,
                collect,
            ))),
        };
        Ok(cursor)
    }
}

fn open_window(
    constraint: &DistanceConstraint,
    source: &Arc<dyn PositionSource>,
) -> Result<Window> {
    let element = match constraint.element() {
        Some(element) => Some(element.open(source, false)?),
        None => None,
    };
    Ok(Window::new(constraint, element))
}

impl fmt::Display for SpanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanQuery::Term(q) => write!(f, "{}:{}", q.field, q.term),
            SpanQuery::Pattern(q) => write!(f, "{}:{}", q.field, q.pattern),
            SpanQuery::Or(q) => write!(f, "spanOr([{}])", q.clauses.iter().join(", ")),
            SpanQuery::Next(q) => write!(f, "spanNext({}, {})", q.first, q.second),
            SpanQuery::Segment(q) => write!(f, "spanSegment({}, {})", q.first, q.second),
            SpanQuery::Within(q) => {
                write!(f, "spanWithin({}, {}, {})", q.wrap, q.embedded, q.relation)
            }
            SpanQuery::Distance(q) => {
                write!(f, "spanDistance({}, {}, [{}])", q.first, q.second, q.constraint)
            }
            SpanQuery::MultipleDistance(q) => write!(
                f,
                "spanMultipleDistance({}, {}, [{}])",
                q.first,
                q.second,
                q.constraints.iter().join(", ")
            ),
            SpanQuery::Expansion(q) => {
                write!(f, "spanExpansion({}, ", q.base)?;
                match &q.exclusion {
                    Some(exclusion) => write!(f, "!{exclusion}")?,
                    None => f.write_str("[]")?,
                }
                write!(f, "{{{}, {}}}, {}", q.min, q.max, q.direction)?;
                if let Some(class) = q.class {
                    write!(f, ", class:{class}")?;
                }
                f.write_str(")")
            }
            SpanQuery::Repetition(q) => {
                write!(f, "spanRepetition({}{{{},{}}})", q.base, q.min, q.max)
            }
            SpanQuery::Subspan(q) => write!(f, "subspan({}, {}, {})", q.base, q.offset, q.length),
            SpanQuery::Class(q) => match q.target {
                ClassTarget::Span => write!(f, "{{{}: {}}}", q.class, q.base),
                ClassTarget::Payload => write!(f, "reclass({}: {})", q.class, q.base),
            },
            SpanQuery::Focus(q) => match q.classes.len() {
                1 => write!(f, "focus({}: {})", q.classes.iter().join(""), q.base),
                _ => write!(f, "focus([{}]: {})", q.classes.iter().join(","), q.base),
            },
            SpanQuery::ClassFilter(q) => write!(
                f,
                "spanClassFilter({}, {}, {}, {})",
                q.base, q.relation, q.first, q.second
            ),
        }
    }
}
