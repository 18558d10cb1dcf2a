//! Simple tests for "this pipeline renders to this SQL" go here.
use insta::assert_snapshot;
use legendql::{
    FrameBound, FrameToSqlConfig, JoinKind, NewColumn, PrimitiveType, SortInfo, TdsFrame, Window,
    WindowColumn, WindowFrame,
};
use rstest::rstest;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::{compact_sql, t, table};

/// Every frame in the list renders to SQL that a Postgres parser accepts, in
/// both layouts.
fn assert_parses(frame: &TdsFrame) {
    for config in [
        FrameToSqlConfig::default(),
        FrameToSqlConfig::default().no_pretty(),
    ] {
        let sql = frame.to_sql_query(&config).unwrap();
        if let Err(e) = Parser::parse_sql(&PostgreSqlDialect {}, &sql) {
            panic!("generated SQL does not parse: {e}\n{sql}");
        }
    }
}

fn t2() -> TdsFrame {
    table(
        "t2",
        &[
            ("c4", PrimitiveType::Integer),
            ("c5", PrimitiveType::String),
        ],
    )
}

#[test]
fn test_select_then_filter() {
    let frame = t()
        .select(["c1"])
        .unwrap()
        .filter(|r| r.get("c1")?.gt(1))
        .unwrap();

    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1" FROM db.schema.t AS "root" WHERE ("root"."c1" > 1)"#);
    assert_parses(&frame);
}

#[test]
fn test_group_by_count() {
    let frame = t()
        .group_by(
            ["c1"],
            [NewColumn::aggregated("cnt", |r| r.get("c2"), |c| Ok(c.count()))],
        )
        .unwrap();

    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", COUNT("root"."c2") AS "cnt" FROM db.schema.t AS "root" GROUP BY "root"."c1""#);
    assert_parses(&frame);
}

#[test]
fn test_inner_join() {
    let frame = t()
        .select(["c1"])
        .unwrap()
        .join(&t2(), |l, r| l.get("c1")?.eq(r.get("c4")?), JoinKind::Inner)
        .unwrap();

    assert_eq!(frame.column_names(), vec!["c1", "c4", "c5"]);
    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c4" AS "c4", "root"."c5" AS "c5" FROM (SELECT "left"."c1" AS "c1", "right"."c4" AS "c4", "right"."c5" AS "c5" FROM (SELECT "root"."c1" AS "c1" FROM db.schema.t AS "root") AS "left" INNER JOIN (SELECT "root"."c4" AS "c4", "root"."c5" AS "c5" FROM db.schema.t2 AS "root") AS "right" ON ("left"."c1" = "right"."c4")) AS "root""#);
    assert_parses(&frame);
}

#[test]
fn test_extend_with_float() {
    let frame = t()
        .extend([NewColumn::new("x", |r| r.get("c1")?.add(1.0))])
        .unwrap();

    assert_eq!(frame.columns()[3].primitive_type(), PrimitiveType::Float);
    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3", ("root"."c1" + 1.0) AS "x" FROM db.schema.t AS "root""#);
    assert_parses(&frame);
}

#[test]
fn test_sort_then_slice() {
    let frame = t()
        .sort([SortInfo::desc("c1")])
        .unwrap()
        .slice(0, 10)
        .unwrap();

    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM db.schema.t AS "root" ORDER BY "root"."c1" DESC LIMIT 10 OFFSET 0"#);
    assert_parses(&frame);

    let frame = t()
        .limit(100)
        .unwrap()
        .sort([SortInfo::desc("c1")])
        .unwrap()
        .slice(0, 10)
        .unwrap();
    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM db.schema.t AS "root" LIMIT 100) AS "root" ORDER BY "root"."c1" DESC LIMIT 10 OFFSET 0"#);
}

#[test]
fn test_concatenate() {
    let frame = t().concatenate(&t().filter(|r| r.get("c1")?.lt(0)).unwrap()).unwrap();

    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM ((SELECT "left"."c1" AS "c1", "left"."c2" AS "c2", "left"."c3" AS "c3" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM db.schema.t AS "root") AS "left") UNION ALL (SELECT "right"."c1" AS "c1", "right"."c2" AS "c2", "right"."c3" AS "c3" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM db.schema.t AS "root" WHERE ("root"."c1" < 0)) AS "right")) AS "root""#);
    assert_parses(&frame);
}

#[test]
fn test_long_pipeline() {
    let frame = t()
        .filter(|r| r.get("c2")?.starts_with("a_b%"))
        .unwrap()
        .extend([NewColumn::new("double", |r| r.get("c3")?.mul(2))])
        .unwrap()
        .group_by(
            ["c2"],
            [
                NewColumn::aggregated("total", |r| r.get("double"), |c| c.sum()),
                NewColumn::aggregated("n", |r| r.get("c1"), |c| Ok(c.distinct_count())),
            ],
        )
        .unwrap()
        .filter(|r| r.get("n")?.gt(2))
        .unwrap()
        .rename([("total", "sum_of_double")])
        .unwrap()
        .sort(["c2"])
        .unwrap()
        .limit(5)
        .unwrap();

    assert_eq!(frame.column_names(), vec!["c2", "sum_of_double", "n"]);
    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c2" AS "c2", "root"."total" AS "sum_of_double", "root"."n" AS "n" FROM (SELECT "root"."c2" AS "c2", SUM(("root"."c3" * 2)) AS "total", COUNT(DISTINCT "root"."c1") AS "n" FROM db.schema.t AS "root" WHERE ("root"."c2" LIKE 'a\_b\%%') GROUP BY "root"."c2") AS "root" WHERE ("root"."n" > 2) ORDER BY "root"."c2" LIMIT 5"#);
    assert_parses(&frame);
}

#[test]
fn test_window_extend_then_filter_wraps() {
    let window = Window::new()
        .partition_by(["c2"])
        .order_by([SortInfo::desc("c3")])
        .frame(WindowFrame::rows(FrameBound::Unbounded, FrameBound::offset(0)));
    let frame = t()
        .window_extend(
            window,
            [
                WindowColumn::new("rk", |p, w, r| Ok(p.rank(w, r))),
                WindowColumn::aggregated("running", |_, _, r| r.get("c3"), |c| c.sum()),
            ],
        )
        .unwrap()
        .filter(|r| r.get("rk")?.le(3))
        .unwrap();

    assert_snapshot!(compact_sql(&frame), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3", "root"."rk" AS "rk", "root"."running" AS "running" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3", rank() OVER (PARTITION BY "root"."c2" ORDER BY "root"."c3" DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "rk", SUM("root"."c3") OVER (PARTITION BY "root"."c2" ORDER BY "root"."c3" DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "running" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", "root"."c3" AS "c3" FROM db.schema.t AS "root") AS "root") AS "root" WHERE ("root"."rk" <= 3)"#);
    assert_parses(&frame);
}

#[rstest]
#[case::postgres("Postgres", r#"SELECT "root"."c1" AS "c1" FROM db.schema.t AS "root" LIMIT 3"#)]
#[case::generic("Generic", r#"SELECT "root"."c1" AS "c1" FROM db.schema.t AS "root" LIMIT 3"#)]
#[case::mssql("MsSql", r#"SELECT TOP 3 "root"."c1" AS "c1" FROM db.schema.t AS "root""#)]
fn test_database_types(#[case] database_type: &str, #[case] expected: &str) {
    let frame = t().select(["c1"]).unwrap().limit(3).unwrap();
    let config = FrameToSqlConfig::default()
        .no_pretty()
        .with_database_type(database_type);
    assert_eq!(frame.to_sql_query(&config).unwrap(), expected);
}

#[test]
fn test_mssql_distinct_then_limit() {
    let frame = t().select(["c1"]).unwrap().distinct().unwrap().limit(3).unwrap();
    let config = FrameToSqlConfig::default()
        .no_pretty()
        .with_database_type("MsSql");

    assert_snapshot!(frame.to_sql_query(&config).unwrap(), @r#"SELECT DISTINCT TOP 3 "root"."c1" AS "c1" FROM db.schema.t AS "root""#);
}

#[test]
fn test_pretty_filter() {
    let frame = t()
        .select(["c1", "c2"])
        .unwrap()
        .filter(|r| r.get("c1")?.gt(1)?.and(r.get("c2")?.ne("x")?))
        .unwrap();

    assert_snapshot!(frame.to_sql_query(&FrameToSqlConfig::default()).unwrap(), @r#"
    SELECT
        "root"."c1" AS "c1",
        "root"."c2" AS "c2"
    FROM
        db.schema.t AS "root"
    WHERE
        (("root"."c1" > 1) AND ("root"."c2" <> 'x'))
    "#);
}

#[test]
fn test_sql_query_object() {
    let frame = t().select(["c2"]).unwrap();
    let query = frame
        .to_sql_query_object(&FrameToSqlConfig::default())
        .unwrap();

    assert_eq!(query.select.select_items.len(), 1);
    assert!(query.where_.is_none());
    assert_eq!(query.from.len(), 1);
}
