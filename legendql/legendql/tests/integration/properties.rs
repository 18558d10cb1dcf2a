//! Laws that hold for every frame, checked over a set of sample pipelines.
use legendql::ast::SelectItem;
use legendql::{
    FrameToPureConfig, FrameToSqlConfig, JoinKind, NewColumn, Primitive, PrimitiveType, SortInfo,
    TdsFrame, Window, WindowColumn,
};
use rstest::rstest;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use super::{compact_sql, t, table};

/// filter, extend, group_by, sort and limit, one after the other.
fn chain() -> TdsFrame {
    t().filter(|r| r.get("c3")?.gt(0.5))
        .unwrap()
        .extend([NewColumn::new("doubled", |r| r.get("c1")?.mul(2))])
        .unwrap()
        .group_by(
            ["c2"],
            [NewColumn::aggregated("total", |r| r.get("doubled"), |c| c.sum())],
        )
        .unwrap()
        .sort([SortInfo::desc("total")])
        .unwrap()
        .limit(5)
        .unwrap()
}

fn samples() -> Vec<TdsFrame> {
    let other = table(
        "u",
        &[("k", PrimitiveType::Integer), ("v", PrimitiveType::String)],
    );
    vec![
        t(),
        t().select(["c3", "c1"]).unwrap(),
        t().filter(|r| r.get("c1")?.gt(1)).unwrap(),
        t().distinct().unwrap(),
        t().distinct_by(["c2"]).unwrap(),
        t().extend([NewColumn::new("x", |r| r.get("c1")?.add(1))])
            .unwrap(),
        t().extend([NewColumn::aggregated("m", |r| r.get("c3"), |c| c.max())])
            .unwrap(),
        t().project([NewColumn::new("y", |r| r.get("c2")?.upper())])
            .unwrap(),
        t().rename([("c1", "id")]).unwrap(),
        t().group_by(
            ["c2"],
            [NewColumn::aggregated("n", |r| r.get("c1"), |c| Ok(c.count()))],
        )
        .unwrap(),
        t().sort([SortInfo::desc("c3")]).unwrap().drop(3).unwrap(),
        t().limit(2).unwrap().filter(|r| r.get("c1")?.lt(5)).unwrap(),
        t().join(&other, |l, r| l.get("c1")?.eq(r.get("k")?), JoinKind::LeftOuter)
            .unwrap(),
        t().concatenate(&t()).unwrap(),
        t().window_extend(
            Window::new().order_by(["c1"]),
            [WindowColumn::new("rn", |p, _, r| Ok(p.row_number(r)))],
        )
        .unwrap(),
        chain(),
    ]
}

fn tokens(sql: &str) -> Vec<Token> {
    Tokenizer::new(&PostgreSqlDialect {}, sql)
        .tokenize()
        .unwrap()
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect()
}

fn without_whitespace(s: &str) -> String {
    s.split_whitespace().collect()
}

#[test]
fn test_columns_match_select_list() {
    let config = FrameToSqlConfig::default();
    for frame in samples() {
        let query = frame.to_sql_query_object(&config).unwrap();
        let aliases: Vec<_> = query
            .select
            .select_items
            .iter()
            .map(|item| match item {
                SelectItem::SingleColumn(c) => c.alias.clone().unwrap(),
                SelectItem::AllColumns { .. } => panic!("unexpected wildcard"),
            })
            .collect();
        let expected: Vec<_> = frame
            .column_names()
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect();
        assert_eq!(aliases, expected);
    }
}

#[test]
fn test_layout_does_not_change_tokens() {
    for frame in samples() {
        let pretty = frame.to_sql_query(&FrameToSqlConfig::default()).unwrap();
        let compact = compact_sql(&frame);
        similar_asserts::assert_eq!(tokens(&pretty), tokens(&compact));

        let pretty = frame.to_pure_query(&FrameToPureConfig::default());
        let compact = frame.to_pure_query(&FrameToPureConfig::default().no_pretty());
        similar_asserts::assert_eq!(without_whitespace(&pretty), without_whitespace(&compact));
    }
}

#[test]
fn test_chain_layout_does_not_change_tokens() {
    let frame = chain();

    let pretty = frame.to_sql_query(&FrameToSqlConfig::default()).unwrap();
    let compact = compact_sql(&frame);
    assert_ne!(pretty, compact);
    similar_asserts::assert_eq!(tokens(&pretty), tokens(&compact));

    let pretty = frame.to_pure_query(&FrameToPureConfig::default());
    let compact = frame.to_pure_query(&FrameToPureConfig::default().no_pretty());
    assert_ne!(pretty, compact);
    similar_asserts::assert_eq!(without_whitespace(&pretty), without_whitespace(&compact));
}

#[test]
fn test_select_all_columns_is_identity() {
    for frame in samples() {
        let selected = frame.select(frame.column_names()).unwrap();
        similar_asserts::assert_eq!(compact_sql(&selected), compact_sql(&frame));
        assert_eq!(selected.columns(), frame.columns());
    }
}

#[test]
fn test_identity_renames_and_filters() {
    for frame in samples() {
        let renamed = frame
            .rename([(frame.column_names()[0], frame.column_names()[0])])
            .unwrap();
        assert_eq!(renamed.columns(), frame.columns());

        let filtered = frame.filter(|_| Ok(Primitive::from(true))).unwrap();
        assert_eq!(compact_sql(&filtered), compact_sql(&frame));
    }
}

#[test]
fn test_concatenate_with_itself() {
    for frame in samples() {
        let doubled = frame.concatenate(&frame).unwrap();
        assert_eq!(doubled.columns(), frame.columns());
        assert!(compact_sql(&doubled).contains(") UNION ALL ("));
    }
}

#[test]
fn test_distinct_is_idempotent() {
    let sql = compact_sql(&t().distinct().unwrap().distinct().unwrap());
    assert_eq!(sql.matches("DISTINCT").count(), 1);
    assert_eq!(sql, compact_sql(&t().distinct().unwrap()));
}

#[rstest]
#[case(0, 1, "LIMIT 1 OFFSET 0")]
#[case(10, 25, "LIMIT 15 OFFSET 10")]
fn test_slice_bounds(#[case] start: i64, #[case] end: i64, #[case] expected: &str) {
    let sql = compact_sql(&t().slice(start, end).unwrap());
    assert!(sql.ends_with(expected), "{sql}");
}

#[test]
fn test_group_by_without_grouping_columns() {
    let sql = compact_sql(
        &t().group_by(
            Vec::<String>::new(),
            [NewColumn::aggregated("total", |r| r.get("c3"), |c| c.sum())],
        )
        .unwrap(),
    );
    assert!(!sql.contains("GROUP BY"));
    assert!(sql.contains(r#"SUM("root"."c3") AS "total""#));
}

#[test]
fn test_like_wildcards_are_escaped() {
    let sql = compact_sql(&t().filter(|r| r.get("c2")?.starts_with("a_b%")).unwrap());
    assert!(sql.contains(r"LIKE 'a\_b\%%'"), "{sql}");
}
