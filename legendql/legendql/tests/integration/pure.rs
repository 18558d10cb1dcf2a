//! PURE renderings of whole pipelines.
use insta::assert_snapshot;
use legendql::{
    FrameToPureConfig, JoinKind, NewColumn, PrimitiveType, SortInfo, Window, WindowColumn,
};

use super::{compact_pure, t, table};

#[test]
fn test_select_then_filter() {
    let frame = t()
        .select(["c1"])
        .unwrap()
        .filter(|r| r.get("c1")?.gt(1))
        .unwrap();

    assert_snapshot!(compact_pure(&frame), @"#Table(db.schema.t)#->select(~[c1])->filter({r | $r.c1 > 1})");
    assert_snapshot!(frame.to_pure_query(&FrameToPureConfig::default()), @r"
    #Table(db.schema.t)#
      ->select(~[c1])
      ->filter({r | $r.c1 > 1})
    ");
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

    assert_snapshot!(compact_pure(&frame), @"#Table(db.schema.t)#->filter({r | $r.c2->startsWith('a_b%')})->extend(~double:{r | toOne($r.c3) * 2})->groupBy(~[c2], ~[total:{r | $r.double}:{c | $c->sum()}, n:{r | $r.c1}:{c | $c->distinct()->count()}])->filter({r | $r.n > 2})->rename(~total, ~sum_of_double)->sort([ascending(~c2)])->limit(5)");
    assert_snapshot!(frame.to_pure_query(&FrameToPureConfig::default()), @r"
    #Table(db.schema.t)#
      ->filter({r | $r.c2->startsWith('a_b%')})
      ->extend(~double:{r | toOne($r.c3) * 2})
      ->groupBy(
        ~[c2],
        ~[total:{r | $r.double}:{c | $c->sum()}, n:{r | $r.c1}:{c | $c->distinct()->count()}]
      )
      ->filter({r | $r.n > 2})
      ->rename(~total, ~sum_of_double)
      ->sort([ascending(~c2)])
      ->limit(5)
    ");
}

#[test]
fn test_join_and_concatenate() {
    let other = table(
        "u",
        &[("k", PrimitiveType::Integer), ("v", PrimitiveType::String)],
    );
    let frame = t()
        .join(&other, |l, r| l.get("c1")?.eq(r.get("k")?), JoinKind::RightOuter)
        .unwrap()
        .select(["c1", "v"])
        .unwrap();
    let frame = frame.concatenate(&frame).unwrap();

    assert_snapshot!(compact_pure(&frame), @"#Table(db.schema.t)#->join(#Table(db.schema.u)#, JoinKind.RIGHT, {l, r | $l.c1 == $r.k})->select(~[c1, v])->concatenate(#Table(db.schema.t)#->join(#Table(db.schema.u)#, JoinKind.RIGHT, {l, r | $l.c1 == $r.k})->select(~[c1, v]))");
}

#[test]
fn test_window_extend() {
    let window = Window::new()
        .partition_by(["c2"])
        .order_by([SortInfo::asc("c1")]);
    let frame = t()
        .window_extend(
            window,
            [
                WindowColumn::new("next", |p, _, r| p.lead(r).get("c3")),
                WindowColumn::new("tile", |p, _, r| p.ntile(r, 4)),
            ],
        )
        .unwrap();

    assert_snapshot!(compact_pure(&frame), @"#Table(db.schema.t)#->extend(over(~[c2], [ascending(~c1)]), ~[next:{p,w,r | $p->lead($r).c3}, tile:{p,w,r | $p->ntile($r, 4)}])");
}

#[test]
fn test_column_names_are_escaped() {
    let frame = table(
        "t",
        &[("first name", PrimitiveType::String), ("age", PrimitiveType::Integer)],
    )
    .select(["first name"])
    .unwrap();

    assert_snapshot!(compact_pure(&frame), @"#Table(db.schema.t)#->select(~['first name'])");
}

#[test]
fn test_to_one_wraps_nullable_operands_once() {
    let frame = t()
        .extend([
            NewColumn::new("next", |r| r.get("c1")?.add(1)),
            NewColumn::new("both", |r| r.get("c1")?.add(r.get("c3")?)),
        ])
        .unwrap()
        .filter(|r| r.get("c1")?.ge(r.get("c3")?))
        .unwrap();

    let pure = compact_pure(&frame);
    assert_snapshot!(pure, @"#Table(db.schema.t)#->extend(~[next:{r | toOne($r.c1) + 1}, both:{r | toOne($r.c1) + toOne($r.c3)}])->filter({r | $r.c1 >= $r.c3})");
    assert_eq!(pure.matches("toOne(").count(), 3);
}
