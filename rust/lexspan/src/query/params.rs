//! Parameters of the span operators: relation flags, distance constraints and
//! expansion settings.

use std::{fmt, str::FromStr};

use lexspan_common::{Result, error::Error, verify_range};
use serde::Serialize;

use super::SpanQuery;
use crate::span::Position;

/// Interval relation tested by `within` between a wrap span `w` and an embedded
/// span `e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WithinRelation {
    /// `w` and `e` share at least one position.
    Overlap,
    /// `w` and `e` intersect, but neither contains the other.
    RealOverlap,
    /// `e` lies inside `w`.
    Within,
    /// `e` lies inside `w` and differs from it.
    RealWithin,
    /// `e` lies inside `w` and both start together.
    StartsWith,
    /// `e` lies inside `w` and both end together.
    EndsWith,
    /// `e` and `w` cover the same interval.
    Match,
}

impl WithinRelation {
    pub const ALL: [WithinRelation; 7] = [
        WithinRelation::Overlap,
        WithinRelation::RealOverlap,
        WithinRelation::Within,
        WithinRelation::RealWithin,
        WithinRelation::StartsWith,
        WithinRelation::EndsWith,
        WithinRelation::Match,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WithinRelation::Overlap => "overlap",
            WithinRelation::RealOverlap => "realOverlap",
            WithinRelation::Within => "within",
            WithinRelation::RealWithin => "realWithin",
            WithinRelation::StartsWith => "startsWith",
            WithinRelation::EndsWith => "endsWith",
            WithinRelation::Match => "match",
        }
    }

    /// Tests the relation between wrap `[ws, we)` and embedded `[es, ee)`.
    pub fn holds(self, ws: Position, we: Position, es: Position, ee: Position) -> bool {
        let contained = ws <= es && ee <= we;
        match self {
            WithinRelation::Overlap => es < we && ws < ee,
            WithinRelation::RealOverlap => {
                es < we && ws < ee && !contained && !(es <= ws && we <= ee)
            }
            WithinRelation::Within => contained,
            WithinRelation::RealWithin => contained && (ws, we) != (es, ee),
            WithinRelation::StartsWith => ws == es && ee <= we,
            WithinRelation::EndsWith => we == ee && ws <= es,
            WithinRelation::Match => ws == es && we == ee,
        }
    }

    /// Returns `false` if embedded `[es, ee)` can match neither the wrap
    /// starting at `ws` nor any later wrap.
    pub(crate) fn may_match_from(self, ws: Position, es: Position, ee: Position) -> bool {
        match self {
            WithinRelation::Overlap | WithinRelation::RealOverlap => ee > ws,
            _ => es >= ws,
        }
    }
}

impl fmt::Display for WithinRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WithinRelation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WithinRelation::ALL
            .into_iter()
            .find(|relation| relation.name() == s)
            .ok_or_else(|| Error::unknown_condition("within relation", s))
    }
}

/// Relation between the hulls of two classes, tested by `classFilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassRelation {
    /// The hulls share no position.
    Disjoint,
    /// The hulls share at least one position.
    Intersects,
    /// The first hull contains the second.
    Includes,
    /// The hulls cover the same interval.
    Equals,
    /// The hulls cover different intervals.
    Differs,
}

impl ClassRelation {
    pub const ALL: [ClassRelation; 5] = [
        ClassRelation::Disjoint,
        ClassRelation::Intersects,
        ClassRelation::Includes,
        ClassRelation::Equals,
        ClassRelation::Differs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClassRelation::Disjoint => "disjoint",
            ClassRelation::Intersects => "intersects",
            ClassRelation::Includes => "includes",
            ClassRelation::Equals => "equals",
            ClassRelation::Differs => "differs",
        }
    }

    pub fn holds(self, first: (Position, Position), second: (Position, Position)) -> bool {
        let intersects = first.0 < second.1 && second.0 < first.1;
        match self {
            ClassRelation::Disjoint => !intersects,
            ClassRelation::Intersects => intersects,
            ClassRelation::Includes => first.0 <= second.0 && second.1 <= first.1,
            ClassRelation::Equals => first == second,
            ClassRelation::Differs => first != second,
        }
    }
}

impl fmt::Display for ClassRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassRelation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ClassRelation::ALL
            .into_iter()
            .find(|relation| relation.name() == s)
            .ok_or_else(|| Error::unknown_condition("class relation", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpansionDirection {
    Left,
    Right,
}

impl fmt::Display for ExpansionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpansionDirection::Left => "left",
            ExpansionDirection::Right => "right",
        })
    }
}

impl FromStr for ExpansionDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(ExpansionDirection::Left),
            "right" => Ok(ExpansionDirection::Right),
            _ => Err(Error::unknown_condition("expansion direction", s)),
        }
    }
}

/// What a class operator marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassTarget {
    /// Adds a class entry covering the matched span.
    Span,
    /// Re-numbers every class entry already present in the payload.
    Payload,
}

/// Unit in which a distance is counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "unit", content = "element", rename_all = "camelCase")]
pub enum DistanceUnit {
    /// Intervening token positions.
    Token,
    /// Occurrences of the element spans produced by the query (e.g. sentences).
    Element(Box<SpanQuery>),
}

/// A distance window between two operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceConstraint {
    unit: DistanceUnit,
    min: u32,
    max: u32,
    ordered: bool,
    exclusion: bool,
}

impl DistanceConstraint {
    /// Creates a constraint, rejecting `max < min`.
    pub fn new(
        unit: DistanceUnit,
        min: u32,
        max: u32,
        ordered: bool,
        exclusion: bool,
    ) -> Result<DistanceConstraint> {
        verify_range!(distance, min, max);
        Ok(DistanceConstraint {
            unit,
            min,
            max,
            ordered,
            exclusion,
        })
    }

    /// An ordered, non-excluding token window.
    pub fn tokens(min: u32, max: u32) -> Result<DistanceConstraint> {
        DistanceConstraint::new(DistanceUnit::Token, min, max, true, false)
    }

    /// An ordered, non-excluding element window.
    pub fn elements(element: SpanQuery, min: u32, max: u32) -> Result<DistanceConstraint> {
        DistanceConstraint::new(DistanceUnit::Element(Box::new(element)), min, max, true, false)
    }

    pub fn unordered(mut self) -> DistanceConstraint {
        self.ordered = false;
        self
    }

    pub fn excluded(mut self) -> DistanceConstraint {
        self.exclusion = true;
        self
    }

    pub fn unit(&self) -> &DistanceUnit {
        &self.unit
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    pub(crate) fn element(&self) -> Option<&SpanQuery> {
        match &self.unit {
            DistanceUnit::Token => None,
            DistanceUnit::Element(query) => Some(query),
        }
    }
}

impl fmt::Display for DistanceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            DistanceUnit::Token => write!(f, "(w[{}:{}]", self.min, self.max)?,
            DistanceUnit::Element(element) => write!(f, "({element}[{}:{}]", self.min, self.max)?,
        }
        write!(
            f,
            ", {}, {})",
            if self.ordered { "ordered" } else { "notOrdered" },
            if self.exclusion { "excluded" } else { "notExcluded" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_relation_table() {
        use WithinRelation::*;
        // wrap [0, 5)
        let cases: &[((Position, Position), &[WithinRelation])] = &[
            ((1, 2), &[Overlap, Within, RealWithin]),
            ((0, 3), &[Overlap, Within, RealWithin, StartsWith]),
            ((2, 5), &[Overlap, Within, RealWithin, EndsWith]),
            ((0, 5), &[Overlap, Within, StartsWith, EndsWith, Match]),
            ((3, 7), &[Overlap, RealOverlap]),
            ((0, 7), &[Overlap]),
            ((5, 6), &[]),
            ((6, 7), &[]),
        ];
        for &((es, ee), expected) in cases {
            for relation in WithinRelation::ALL {
                assert_eq!(
                    relation.holds(0, 5, es, ee),
                    expected.contains(&relation),
                    "{relation} for [{es}, {ee})"
                );
            }
        }
    }

    #[test]
    fn test_embedded_before_wrap_overlaps() {
        assert!(WithinRelation::Overlap.holds(2, 6, 0, 3));
        assert!(WithinRelation::RealOverlap.holds(2, 6, 0, 3));
        assert!(!WithinRelation::Within.holds(2, 6, 0, 3));
        assert!(WithinRelation::Overlap.may_match_from(2, 0, 3));
        assert!(!WithinRelation::Within.may_match_from(2, 0, 3));
    }

    #[test]
    fn test_relation_names_round_trip() {
        for relation in WithinRelation::ALL {
            assert_eq!(relation.name().parse::<WithinRelation>().unwrap(), relation);
        }
        for relation in ClassRelation::ALL {
            assert_eq!(relation.name().parse::<ClassRelation>().unwrap(), relation);
        }
        let err = "around".parse::<WithinRelation>().unwrap_err();
        assert!(err.is_construction_error());
        assert!("sideways".parse::<ExpansionDirection>().is_err());
        assert_eq!("left".parse::<ExpansionDirection>().unwrap(), ExpansionDirection::Left);
    }

    #[test]
    fn test_class_relations() {
        assert!(ClassRelation::Disjoint.holds((0, 2), (2, 4)));
        assert!(ClassRelation::Intersects.holds((0, 3), (2, 4)));
        assert!(ClassRelation::Includes.holds((0, 4), (1, 3)));
        assert!(!ClassRelation::Includes.holds((1, 3), (0, 4)));
        assert!(ClassRelation::Equals.holds((1, 3), (1, 3)));
        assert!(ClassRelation::Differs.holds((1, 3), (1, 4)));
    }

    #[test]
    fn test_distance_constraint_validation() {
        let err = DistanceConstraint::tokens(3, 2).unwrap_err();
        assert!(err.is_construction_error());
        let constraint = DistanceConstraint::tokens(2, 3).unwrap().unordered().excluded();
        assert!(!constraint.is_ordered());
        assert!(constraint.is_exclusion());
        assert_eq!(constraint.to_string(), "(w[2:3], notOrdered, excluded)");
    }
}
