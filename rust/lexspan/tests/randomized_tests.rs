use lexspan::{
    DistanceConstraint, ExpansionDirection, SpanOptions, SpanQuery, Spans, WithinRelation,
};
use lexspan_testkit::{
    Corpus, Key, collect_keys,
    data_gen::{RandomCorpusConfig, random_corpus},
    reference::{self, TokenWindow},
};

const FIELD: &str = "tokens";
const SEEDS: [u64; 4] = [7, 1_337, 297_135_646, 86_420_013];

fn corpora() -> impl Iterator<Item = Corpus> {
    SEEDS
        .into_iter()
        .map(|seed| random_corpus(seed, FIELD, &RandomCorpusConfig::default()))
}

fn t(term: &str) -> SpanQuery {
    SpanQuery::term(FIELD, term)
}

fn check(corpus: &Corpus, query: &SpanQuery, expected: Vec<Key>) {
    let actual = collect_keys(query, &corpus.source()).unwrap();
    assert_eq!(actual, expected, "{query}");
}

#[test]
fn test_next_and_segment() {
    for corpus in corpora() {
        for (x, y) in [("a", "b"), ("b", "b"), ("<>:np", "c"), ("d", "<>:s")] {
            let (a, b) = (corpus.occurrences(x), corpus.occurrences(y));
            check(&corpus, &SpanQuery::next(t(x), t(y)).unwrap(), reference::next(&a, &b));
            check(&corpus, &SpanQuery::segment(t(x), t(y)).unwrap(), reference::segment(&a, &b));
        }
    }
}

#[test]
fn test_within_relations() {
    for corpus in corpora() {
        let pairs = [("<>:s", "a"), ("<>:s", "<>:np"), ("<>:np", "<>:s"), ("<>:np", "b")];
        for (wrap, embedded) in pairs {
            let (w, e) = (corpus.occurrences(wrap), corpus.occurrences(embedded));
            for relation in WithinRelation::ALL {
                let query = SpanQuery::within(t(wrap), t(embedded), relation).unwrap();
                check(&corpus, &query, reference::within(&w, &e, relation));
            }
        }
    }
}

#[test]
fn test_token_distance() {
    for corpus in corpora() {
        let (a, b) = (corpus.occurrences("a"), corpus.occurrences("b"));
        for (min, max) in [(0, 0), (0, 3), (2, 3), (4, 9)] {
            for ordered in [true, false] {
                let constraint = DistanceConstraint::tokens(min, max).unwrap();
                let constraint = if ordered { constraint } else { constraint.unordered() };

                let query = SpanQuery::distance(t("a"), t("b"), constraint.clone()).unwrap();
                check(&corpus, &query, reference::token_distance(&a, &b, min, max, ordered));

                let query = SpanQuery::distance(t("a"), t("b"), constraint.excluded()).unwrap();
                let expected = reference::excluded_token_distance(&a, &b, min, max, ordered);
                check(&corpus, &query, expected);
            }
        }
    }
}

#[test]
fn test_element_distance() {
    for corpus in corpora() {
        let (a, c) = (corpus.occurrences("a"), corpus.occurrences("c"));
        let sentences = corpus.occurrences("<>:s");
        for (min, max) in [(0, 0), (0, 1), (1, 3)] {
            for ordered in [true, false] {
                let constraint = DistanceConstraint::elements(t("<>:s"), min, max).unwrap();
                let constraint = if ordered { constraint } else { constraint.unordered() };

                let query = SpanQuery::distance(t("a"), t("c"), constraint.clone()).unwrap();
                let expected = reference::element_distance(&a, &c, &sentences, min, max, ordered);
                check(&corpus, &query, expected);

                let query = SpanQuery::distance(t("a"), t("c"), constraint.excluded()).unwrap();
                let expected =
                    reference::excluded_element_distance(&a, &c, &sentences, min, max, ordered);
                check(&corpus, &query, expected);
            }
        }
    }
}

#[test]
fn test_multiple_token_distance() {
    let window = |min, max, ordered, exclusion| TokenWindow {
        min,
        max,
        ordered,
        exclusion,
    };
    let cases = [
        vec![window(0, 4, false, false), window(1, 2, true, false)],
        vec![window(0, 5, false, false), window(0, 1, false, true)],
        vec![window(1, 6, true, false), window(2, 3, true, true)],
    ];
    for corpus in corpora() {
        let (b, d) = (corpus.occurrences("b"), corpus.occurrences("d"));
        for windows in &cases {
            let constraints = windows
                .iter()
                .map(|w| {
                    let constraint = DistanceConstraint::tokens(w.min, w.max).unwrap();
                    let constraint = if w.ordered { constraint } else { constraint.unordered() };
                    if w.exclusion { constraint.excluded() } else { constraint }
                })
                .collect();
            let query = SpanQuery::multiple_distance(t("b"), t("d"), constraints).unwrap();
            check(&corpus, &query, reference::multiple_token_distance(&b, &d, windows));
        }
    }
}

#[test]
fn test_subspan() {
    for corpus in corpora() {
        for term in ["<>:s", "<>:np"] {
            let base = corpus.occurrences(term);
            for (offset, length) in [(0, 1), (1, 0), (1, 2), (-1, 0), (-2, 1), (-3, 3), (4, 1)] {
                let query = SpanQuery::subspan(t(term), offset, length);
                check(&corpus, &query, reference::subspan(&base, offset, length));
            }
        }
    }
}

#[test]
fn test_repetition() {
    for corpus in corpora() {
        for term in ["a", "<>:np"] {
            let base = corpus.occurrences(term);
            for (min, max) in [(1, 1), (1, 3), (2, 4)] {
                let query = SpanQuery::repetition(t(term), min, max).unwrap();
                check(&corpus, &query, reference::repetition(&base, min, max));
            }
        }
    }
}

#[test]
fn test_expansion() {
    for corpus in corpora() {
        let base = corpus.occurrences("c");
        for (min, max) in [(0, 0), (0, 2), (1, 4)] {
            let direction = ExpansionDirection::Right;
            let right = SpanQuery::expansion(t("c"), None, min, max, direction, None).unwrap();
            let expected = reference::expand_right(&base, min, max, |doc| corpus.doc_len(doc));
            check(&corpus, &right, expected);

            let left = SpanQuery::expansion(t("c"), None, min, max, ExpansionDirection::Left, None)
                .unwrap();
            check(&corpus, &left, reference::expand_left(&base, min, max));
        }
    }
}

#[test]
fn test_expansion_with_exclusion() {
    for corpus in corpora() {
        let (base, excluded) = (corpus.occurrences("c"), corpus.occurrences("d"));
        for (min, max) in [(0, 2), (1, 4), (2, 3)] {
            let direction = ExpansionDirection::Right;
            let right =
                SpanQuery::expansion(t("c"), Some(t("d")), min, max, direction, None).unwrap();
            let expected = reference::expand_right_excluding(&base, &excluded, min, max, |doc| {
                corpus.doc_len(doc)
            });
            check(&corpus, &right, expected);

            let direction = ExpansionDirection::Left;
            let left =
                SpanQuery::expansion(t("c"), Some(t("d")), min, max, direction, None).unwrap();
            let expected = reference::expand_left_excluding(&base, &excluded, min, max);
            check(&corpus, &left, expected);
        }
    }
}

#[test]
fn test_or() {
    for corpus in corpora() {
        let lists = ["a", "<>:np", "zzz"].map(|term| corpus.occurrences(term));
        let query = SpanQuery::or(vec![t("a"), t("<>:np"), t("zzz")]).unwrap();
        let expected = reference::or(&[&lists[0], &lists[1], &lists[2]]);
        check(&corpus, &query, expected);
    }
}

/// Random `skip_to` targets interleaved with `next` must land on the same
/// matches as plain iteration.
#[test]
fn test_random_skips() {
    let mut rng = fastrand::Rng::with_seed(4_242);
    for corpus in corpora() {
        let queries = [
            SpanQuery::next(t("a"), t("b")).unwrap(),
            SpanQuery::within(t("<>:s"), t("c"), WithinRelation::Within).unwrap(),
            SpanQuery::repetition(t("b"), 1, 2).unwrap(),
            SpanQuery::distance(t("a"), t("d"), DistanceConstraint::tokens(0, 2).unwrap()).unwrap(),
        ];
        for query in &queries {
            let all = collect_keys(query, &corpus.source()).unwrap();
            let mut cursor = query.spans(&corpus.source(), &SpanOptions::default()).unwrap();
            let mut position = None::<usize>;
            loop {
                let (found, expected) = if rng.bool() {
                    let next = position.map_or(0, |p| p + 1);
                    (cursor.next().unwrap(), next)
                } else {
                    let current = position.map_or(0, |p| all[p].0);
                    let target = current + rng.u32(0..3);
                    let from = position.map_or(0, |p| p + 1);
                    let skipped = all[from.min(all.len())..]
                        .iter()
                        .position(|k| k.0 >= target)
                        .map_or(all.len(), |i| from + i);
                    (cursor.skip_to(target).unwrap(), skipped)
                };
                if expected >= all.len() {
                    assert!(!found, "{query}");
                    break;
                }
                assert!(found, "{query}");
                assert_eq!(cursor.span().key(), all[expected], "{query}");
                position = Some(expected);
            }
        }
    }
}
