use lexspan_common::error::ErrorKind;

use super::{FIELD, keys, source, t};
use crate::{
    ClassNumber, ClassRelation, ClassSet, DistanceConstraint, ExpansionDirection, SpanQuery,
    TermPattern, WithinRelation,
};

fn class(n: i64) -> ClassNumber {
    ClassNumber::new(n).unwrap()
}

#[test]
fn test_field_mismatch_is_rejected() {
    let err = SpanQuery::next(t("a"), SpanQuery::term("lemma", "b")).unwrap_err();
    assert!(err.is_construction_error());
    match err.kind() {
        ErrorKind::FieldMismatch { expected, actual } => {
            assert_eq!(expected, FIELD);
            assert_eq!(actual, "lemma");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let nested = SpanQuery::within(t("<>:s"), t("a"), WithinRelation::Within).unwrap();
    assert!(SpanQuery::segment(nested, SpanQuery::term("pos", "NN")).is_err());

    let element = DistanceConstraint::elements(SpanQuery::term("struct", "<>:s"), 0, 1).unwrap();
    assert!(SpanQuery::distance(t("a"), t("b"), element).is_err());
    assert!(SpanQuery::or(vec![t("a"), SpanQuery::term("lemma", "a")]).is_err());
    assert!(
        SpanQuery::expansion(
            t("a"),
            Some(SpanQuery::term("lemma", "b")),
            0,
            1,
            ExpansionDirection::Right,
            None
        )
        .is_err()
    );
}

#[test]
fn test_invalid_ranges_are_rejected() {
    let err = SpanQuery::repetition(t("a"), 3, 2).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidRange { min: 3, max: 2, .. }
    ));
    assert!(SpanQuery::repetition(t("a"), 0, 2).is_err());
    assert!(SpanQuery::expansion(t("a"), None, 2, 1, ExpansionDirection::Left, None).is_err());
    assert!(DistanceConstraint::tokens(5, 1).is_err());
}

#[test]
fn test_invalid_arguments_are_rejected() {
    assert!(SpanQuery::or(Vec::new()).is_err());
    assert!(SpanQuery::focus(t("a"), ClassSet::new(), true).is_err());
    let excluded_only = vec![DistanceConstraint::tokens(0, 1).unwrap().excluded()];
    assert!(SpanQuery::multiple_distance(t("a"), t("b"), excluded_only).is_err());
    assert!(SpanQuery::multiple_distance(t("a"), t("b"), Vec::new()).is_err());
    assert!(ClassNumber::new(0).is_err());
    assert!(ClassNumber::new(256).is_err());

    let right = ExpansionDirection::Right;
    let err = SpanQuery::expansion(t("a"), None, 0, crate::MAX_EXPANSION + 1, right, None)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    assert!(SpanQuery::expansion(t("a"), None, 0, crate::MAX_EXPANSION, right, None).is_ok());

    let err = SpanQuery::regex(FIELD, "(unclosed").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidPattern { .. }));
}

#[test]
fn test_display_is_stable() {
    let query = SpanQuery::within(
        t("<>:s"),
        SpanQuery::next(t("der"), SpanQuery::class(t("Hund"), class(2))).unwrap(),
        WithinRelation::StartsWith,
    )
    .unwrap();
    assert_eq!(
        query.to_string(),
        "spanWithin(tokens:<>:s, spanNext(tokens:der, {2: tokens:Hund}), startsWith)"
    );

    let query = SpanQuery::distance(
        t("a"),
        t("b"),
        DistanceConstraint::tokens(2, 3).unwrap(),
    )
    .unwrap();
    assert_eq!(
        query.to_string(),
        "spanDistance(tokens:a, tokens:b, [(w[2:3], ordered, notExcluded)])"
    );

    let right = ExpansionDirection::Right;
    let query = SpanQuery::expansion(t("a"), Some(t("b")), 1, 2, right, Some(class(3))).unwrap();
    assert_eq!(query.to_string(), "spanExpansion(tokens:a, !tokens:b{1, 2}, right, class:3)");

    let classes = [class(1), class(2)].into_iter().collect();
    let repetition = SpanQuery::repetition(t("a"), 1, 2).unwrap();
    let query = SpanQuery::focus(repetition, classes, true).unwrap();
    assert_eq!(query.to_string(), "focus([1,2]: spanRepetition(tokens:a{1,2}))");

    let query = SpanQuery::class_filter(
        SpanQuery::subspan(SpanQuery::reclass(t("a"), class(4)), -1, 1),
        ClassRelation::Includes,
        class(1),
        class(2),
    );
    assert_eq!(
        query.to_string(),
        "spanClassFilter(subspan(reclass(4: tokens:a), -1, 1), includes, 1, 2)"
    );
    assert_eq!(query.to_string(), query.clone().to_string());
}

#[test]
fn test_json_mirror() {
    let query = SpanQuery::next(t("a"), SpanQuery::class(t("b"), class(1))).unwrap();
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["operator"], "next");
    assert_eq!(json["first"]["operator"], "term");
    assert_eq!(json["first"]["term"], "a");
    assert_eq!(json["second"]["operator"], "class");
    assert_eq!(json["second"]["class"], 1);
    assert_eq!(json["second"]["target"], "span");

    let query = SpanQuery::distance(
        t("a"),
        t("b"),
        DistanceConstraint::elements(t("<>:s"), 0, 1).unwrap().unordered(),
    )
    .unwrap();
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["constraint"]["unit"]["unit"], "element");
    assert_eq!(json["constraint"]["ordered"], false);

    let query = SpanQuery::wildcard(FIELD, "ha*").unwrap();
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["pattern"]["kind"], "wildcard");
    assert_eq!(json["pattern"]["pattern"], "ha*");
}

#[test]
fn test_rewrite_patterns() {
    let index = crate::spans::testing::index(&["haus hase hund", "hase"]);
    let query = SpanQuery::next(SpanQuery::wildcard(FIELD, "ha*").unwrap(), t("hund")).unwrap();
    assert!(query.needs_rewrite());

    let rewritten = query.rewrite(&index).unwrap();
    assert!(!rewritten.needs_rewrite());
    assert_eq!(
        rewritten.to_string(),
        "spanNext(spanOr([tokens:hase, tokens:haus]), tokens:hund)"
    );

    let source: std::sync::Arc<dyn crate::PositionSource> = std::sync::Arc::new(index);
    assert_eq!(keys(&source, &rewritten), vec![(0, 1, 3)]);
}

#[test]
fn test_unrewritten_pattern_cannot_be_opened() {
    let source = source(&["a"]);
    let query = SpanQuery::regex(FIELD, "a|b").unwrap();
    let err = query.spans(&source, &Default::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert!(!err.is_construction_error());
}

#[test]
fn test_rewrite_without_matches_is_empty() {
    let index = crate::spans::testing::index(&["a b"]);
    let query = SpanQuery::regex(FIELD, "z+").unwrap().rewrite(&index).unwrap();
    assert_eq!(query.to_string(), "spanOr([])");
    let source: std::sync::Arc<dyn crate::PositionSource> = std::sync::Arc::new(index);
    assert!(keys(&source, &query).is_empty());
    assert_eq!(
        TermPattern::Regex("z+".into()).to_string(),
        "/z+/"
    );
}
