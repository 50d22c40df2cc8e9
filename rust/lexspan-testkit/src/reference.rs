//! Brute-force reference matchers.
//!
//! Each function evaluates one operator directly on sorted occurrence lists and
//! returns the sorted, duplicate-free `(document, start, end)` keys the cursor
//! is expected to produce.

use itertools::Itertools;
use lexspan::{DocId, Position, WithinRelation};

use crate::Key;

fn finish(mut keys: Vec<Key>) -> Vec<Key> {
    keys.sort_unstable();
    keys.dedup();
    keys
}

fn pairs<'a>(a: &'a [Key], b: &'a [Key]) -> impl Iterator<Item = (&'a Key, &'a Key)> {
    a.iter().cartesian_product(b).filter(|(x, y)| x.0 == y.0)
}

pub fn next(a: &[Key], b: &[Key]) -> Vec<Key> {
    finish(
        pairs(a, b)
            .filter(|(x, y)| x.2 == y.1)
            .map(|(x, y)| (x.0, x.1, y.2))
            .collect(),
    )
}

pub fn segment(a: &[Key], b: &[Key]) -> Vec<Key> {
    finish(a.iter().filter(|x| b.contains(x)).copied().collect())
}

pub fn within(wrap: &[Key], embedded: &[Key], relation: WithinRelation) -> Vec<Key> {
    finish(
        pairs(wrap, embedded)
            .filter(|(w, e)| relation.holds(w.1, w.2, e.1, e.2))
            .map(|(w, _)| *w)
            .collect(),
    )
}

/// Token gap between `x` and `y` and whether `x` comes first.
fn token_gap(x: &Key, y: &Key) -> Option<(Position, bool)> {
    if x.2 <= y.1 {
        Some((y.1 - x.2, true))
    } else if y.2 <= x.1 {
        Some((x.1 - y.2, false))
    } else {
        None
    }
}

fn in_window(x: &Key, y: &Key, min: u32, max: u32, ordered: bool) -> bool {
    token_gap(x, y).is_some_and(|(gap, x_first)| (x_first || !ordered) && min <= gap && gap <= max)
}

pub fn token_distance(a: &[Key], b: &[Key], min: u32, max: u32, ordered: bool) -> Vec<Key> {
    finish(
        pairs(a, b)
            .filter(|(x, y)| in_window(x, y, min, max, ordered))
            .map(|(x, y)| (x.0, x.1.min(y.1), x.2.max(y.2)))
            .collect(),
    )
}

pub fn excluded_token_distance(
    a: &[Key],
    b: &[Key],
    min: u32,
    max: u32,
    ordered: bool,
) -> Vec<Key> {
    finish(
        a.iter()
            .filter(|x| {
                !b.iter()
                    .any(|y| y.0 == x.0 && in_window(x, y, min, max, ordered))
            })
            .copied()
            .collect(),
    )
}

/// Index of the first element of `x`'s document, in `(start, end)` order,
/// containing `x`.
fn element_index(elements: &[Key], x: &Key) -> Option<usize> {
    elements
        .iter()
        .filter(|e| e.0 == x.0)
        .position(|e| e.1 <= x.1 && x.2 <= e.2)
}

fn in_element_window(
    elements: &[Key],
    x: &Key,
    y: &Key,
    min: u32,
    max: u32,
    ordered: bool,
) -> bool {
    let Some((_, x_first)) = token_gap(x, y) else {
        return false;
    };
    let (Some(ix), Some(iy)) = (element_index(elements, x), element_index(elements, y)) else {
        return false;
    };
    if x_first && ix > iy {
        return false;
    }
    let gap = ix.abs_diff(iy) as u32;
    (x_first || !ordered) && min <= gap && gap <= max
}

/// Distance counted in the elements of `elements` (sorted occurrences).
pub fn element_distance(
    a: &[Key],
    b: &[Key],
    elements: &[Key],
    min: u32,
    max: u32,
    ordered: bool,
) -> Vec<Key> {
    finish(
        pairs(a, b)
            .filter(|(x, y)| in_element_window(elements, x, y, min, max, ordered))
            .map(|(x, y)| (x.0, x.1.min(y.1), x.2.max(y.2)))
            .collect(),
    )
}

/// `A` spans inside some element with no `B` in the element window.
pub fn excluded_element_distance(
    a: &[Key],
    b: &[Key],
    elements: &[Key],
    min: u32,
    max: u32,
    ordered: bool,
) -> Vec<Key> {
    finish(
        a.iter()
            .filter(|x| element_index(elements, x).is_some())
            .filter(|x| {
                !b.iter().any(|y| {
                    y.0 == x.0 && in_element_window(elements, x, y, min, max, ordered)
                })
            })
            .copied()
            .collect(),
    )
}

/// A token window of a multiple distance query.
#[derive(Debug, Clone, Copy)]
pub struct TokenWindow {
    pub min: u32,
    pub max: u32,
    pub ordered: bool,
    pub exclusion: bool,
}

/// Pairs satisfying every window; an exclusion window holds outside its range.
pub fn multiple_token_distance(a: &[Key], b: &[Key], windows: &[TokenWindow]) -> Vec<Key> {
    finish(
        pairs(a, b)
            .filter(|(x, y)| {
                windows.iter().all(|w| {
                    in_window(x, y, w.min, w.max, w.ordered) != w.exclusion
                })
            })
            .map(|(x, y)| (x.0, x.1.min(y.1), x.2.max(y.2)))
            .collect(),
    )
}

/// Slices of `base`: a negative `offset` counts from the end, `length == 0`
/// runs to the end, and slices leaving the span are dropped.
pub fn subspan(base: &[Key], offset: i32, length: u32) -> Vec<Key> {
    finish(
        base.iter()
            .filter_map(|&(doc, start, end)| {
                let (start, end) = (i64::from(start), i64::from(end));
                let anchor = if offset >= 0 { start } else { end };
                let from = anchor + i64::from(offset);
                if from < start || from >= end {
                    return None;
                }
                let to = if length == 0 { end } else { from + i64::from(length) };
                (to <= end).then_some((doc, from as Position, to as Position))
            })
            .collect(),
    )
}

pub fn repetition(base: &[Key], min: u32, max: u32) -> Vec<Key> {
    let mut keys = Vec::new();
    for first in base.iter().filter(|k| k.1 < k.2) {
        let mut chain_ends = vec![first.2];
        for count in 1..=max {
            if count >= min {
                keys.extend(chain_ends.iter().map(|&end| (first.0, first.1, end)));
            }
            chain_ends = chain_ends
                .iter()
                .flat_map(|&end| {
                    base.iter()
                        .filter(move |k| k.0 == first.0 && k.1 == end && k.1 < k.2)
                        .map(|k| k.2)
                })
                .sorted()
                .dedup()
                .collect();
            if chain_ends.is_empty() {
                break;
            }
        }
    }
    finish(keys)
}

/// Right expansion without exclusion, clamped by the document length.
pub fn expand_right(
    base: &[Key],
    min: u32,
    max: u32,
    doc_len: impl Fn(DocId) -> Position,
) -> Vec<Key> {
    finish(
        base.iter()
            .flat_map(|&(doc, start, end)| {
                let limit = doc_len(doc);
                (min..=max)
                    .map(move |k| end + k)
                    .take_while(move |&e| e <= limit)
                    .map(move |e| (doc, start, e))
            })
            .collect(),
    )
}

fn meets_exclusion(exclusions: &[Key], doc: DocId, from: Position, to: Position) -> bool {
    from < to
        && exclusions
            .iter()
            .any(|e| e.0 == doc && e.1 < to && from < e.2)
}

/// Right expansion where the added region may not meet any exclusion span.
/// The first length whose region does ends the enumeration.
pub fn expand_right_excluding(
    base: &[Key],
    exclusions: &[Key],
    min: u32,
    max: u32,
    doc_len: impl Fn(DocId) -> Position,
) -> Vec<Key> {
    let mut keys = Vec::new();
    for &(doc, start, end) in base {
        for k in min..=max {
            let to = end + k;
            if to > doc_len(doc) || meets_exclusion(exclusions, doc, end, to) {
                break;
            }
            keys.push((doc, start, to));
        }
    }
    finish(keys)
}

/// Left counterpart of [`expand_right_excluding`].
pub fn expand_left_excluding(base: &[Key], exclusions: &[Key], min: u32, max: u32) -> Vec<Key> {
    let mut keys = Vec::new();
    for &(doc, start, end) in base {
        for k in min..=max {
            let Some(from) = start.checked_sub(k) else {
                break;
            };
            if meets_exclusion(exclusions, doc, from, start) {
                break;
            }
            keys.push((doc, from, end));
        }
    }
    finish(keys)
}

/// Left expansion without exclusion.
pub fn expand_left(base: &[Key], min: u32, max: u32) -> Vec<Key> {
    finish(
        base.iter()
            .flat_map(|&(doc, start, end)| {
                (min..=max.min(start)).map(move |k| (doc, start - k, end))
            })
            .collect(),
    )
}

/// Union of several occurrence lists.
pub fn or(lists: &[&[Key]]) -> Vec<Key> {
    finish(lists.iter().flat_map(|list| list.iter().copied()).collect())
}
