use itertools::Itertools;

use legendql_sql::ast::{self, Expression, QuerySpecification, SelectItem};
use legendql_sql::helpers::{create_sub_query, Clause};
use legendql_sql::DialectExtension;

use super::{
    check_columns_exist, check_new_column_names, column_item, pure_columns, pure_step,
    sub_query_on, AppliedFunction, EvaluatedColumn, NewColumn, WindowColumn,
};
use crate::language::expr::SqlScope;
use crate::language::Window;
use crate::tds::TdsFrame;
use crate::{FrameToPureConfig, Result};

#[derive(Debug)]
pub(crate) struct ExtendFunction {
    base: TdsFrame,
    columns: Vec<EvaluatedColumn>,
}

impl ExtendFunction {
    pub fn apply(base: &TdsFrame, columns: Vec<NewColumn>) -> Result<TdsFrame> {
        let names = columns.iter().map(|c| c.name().to_string()).collect_vec();
        check_new_column_names(base, &names)?;

        let row = base.row("r");
        let columns = columns
            .into_iter()
            .map(|c| c.evaluate(&row, "extend"))
            .collect::<Result<Vec<_>>>()?;

        let result_columns = base
            .columns()
            .iter()
            .cloned()
            .chain(columns.iter().map(EvaluatedColumn::tds_column))
            .collect();
        Ok(TdsFrame::applied(
            base,
            result_columns,
            ExtendFunction {
                base: base.clone(),
                columns,
            },
        ))
    }
}

impl AppliedFunction for ExtendFunction {
    fn name(&self) -> &'static str {
        "extend"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = sub_query_on(base, extension, &[Clause::GroupBy])?;

        let items = {
            let scope = SqlScope::new(extension).bind("r", &query);
            self.columns
                .iter()
                .map(|column| {
                    let expression = match &column.aggregate {
                        // aggregates over the whole frame
                        Some(aggregate) => Expression::Window {
                            nested: Box::new(aggregate.expr.to_sql(&scope)?),
                            window: ast::Window::default(),
                        },
                        None => column.map.expr.to_sql(&scope)?,
                    };
                    Ok(column_item(extension, &column.name, expression))
                })
                .collect::<Result<Vec<SelectItem>>>()?
        };
        query.select.select_items.extend(items);
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        pure_extend(&self.base, config, &self.columns, "r", None)
    }
}

/// `->extend(...)` calls for `columns`.
///
/// Columns of one kind (all plain or all aggregated) go in a single call,
/// otherwise each column gets its own call.
fn pure_extend(
    base: &TdsFrame,
    config: &FrameToPureConfig,
    columns: &[EvaluatedColumn],
    params: &str,
    window: Option<&str>,
) -> String {
    let window = window.map(|w| format!("{w}, ")).unwrap_or_default();
    let items = columns
        .iter()
        .map(|c| c.to_pure(params, config))
        .collect_vec();

    if columns.iter().map(|c| c.aggregate.is_some()).all_equal() {
        let step = format!("->extend({window}{})", pure_columns(&items, config));
        pure_step(base, config, &step)
    } else {
        let steps = items
            .iter()
            .map(|item| format!("->extend({window}~{item})"))
            .join(&config.separator(1, false));
        pure_step(base, config, &steps)
    }
}

#[derive(Debug)]
pub(crate) struct WindowExtendFunction {
    base: TdsFrame,
    window: Window,
    columns: Vec<EvaluatedColumn>,
}

impl WindowExtendFunction {
    pub fn apply(base: &TdsFrame, window: Window, columns: Vec<WindowColumn>) -> Result<TdsFrame> {
        let names = columns.iter().map(|c| c.name().to_string()).collect_vec();
        check_new_column_names(base, &names)?;

        let window_columns = window.referenced_columns().map(str::to_string).collect_vec();
        check_columns_exist(base, &window_columns, "window")?;

        let row = base.row("r");
        let columns = columns
            .into_iter()
            .map(|c| c.evaluate(&row))
            .collect::<Result<Vec<_>>>()?;

        let result_columns = base
            .columns()
            .iter()
            .cloned()
            .chain(columns.iter().map(EvaluatedColumn::tds_column))
            .collect();
        Ok(TdsFrame::applied(
            base,
            result_columns,
            WindowExtendFunction {
                base: base.clone(),
                window,
                columns,
            },
        ))
    }
}

impl AppliedFunction for WindowExtendFunction {
    fn name(&self) -> &'static str {
        "window_extend"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = create_sub_query(&base, extension, "root", None)?;

        let items = {
            let scope = SqlScope::new(extension).bind("r", &query);
            let window = self.window.to_sql(&scope, "r")?;
            self.columns
                .iter()
                .map(|column| {
                    let nested = column.value().expr.to_sql(&scope)?;
                    let expression = Expression::Window {
                        nested: Box::new(nested),
                        window: window.clone(),
                    };
                    Ok(column_item(extension, &column.name, expression))
                })
                .collect::<Result<Vec<SelectItem>>>()?
        };
        query.select.select_items.extend(items);
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let window = self.window.to_pure(config);
        pure_extend(&self.base, config, &self.columns, "p,w,r", Some(&window))
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use crate::tds::{NewColumn, WindowColumn};
    use crate::{
        ErrorKind, FrameBound, FrameToPureConfig, FrameToSqlConfig, PrimitiveType, SortInfo,
        TdsColumn, TdsFrame, Window, WindowFrame,
    };

    fn frame() -> TdsFrame {
        TdsFrame::table(
            ["db", "schema", "t"],
            vec![
                TdsColumn::new("c1", PrimitiveType::Integer),
                TdsColumn::new("c2", PrimitiveType::String),
            ],
        )
        .unwrap()
    }

    fn sql(frame: &TdsFrame) -> String {
        frame
            .to_sql_query(&FrameToSqlConfig::default().no_pretty())
            .unwrap()
    }

    #[test]
    fn test_extend() {
        let extended = frame()
            .extend([NewColumn::new("x", |r| r.get("c1")?.add(1.0))])
            .unwrap();

        assert_eq!(
            extended.columns().last(),
            Some(&TdsColumn::new("x", PrimitiveType::Float))
        );
        assert_snapshot!(sql(&extended), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", ("root"."c1" + 1.0) AS "x" FROM db.schema.t AS "root""#);
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default()),
            @r"
        #Table(db.schema.t)#
          ->extend(~x:{r | toOne($r.c1) + 1.0})
        "
        );
    }

    #[test]
    fn test_extend_many_columns() {
        let extended = frame()
            .extend([
                NewColumn::new("x", |r| r.get("c1")?.mul(2)),
                NewColumn::new("y y", |r| r.get("c2")?.upper()),
            ])
            .unwrap();

        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default()),
            @r"
        #Table(db.schema.t)#
          ->extend(~[
            x:{r | toOne($r.c1) * 2},
            'y y':{r | toOne($r.c2)->toUpper()}
          ])
        "
        );
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default().no_pretty()),
            @"#Table(db.schema.t)#->extend(~[x:{r | toOne($r.c1) * 2}, 'y y':{r | toOne($r.c2)->toUpper()}])"
        );
    }

    #[test]
    fn test_extend_aggregate_over_whole_frame() {
        let extended = frame()
            .extend([
                NewColumn::new("x", |r| r.get("c1")?.add(1)),
                NewColumn::aggregated("total", |r| r.get("c1"), |c| c.sum()),
            ])
            .unwrap();

        assert_snapshot!(sql(&extended), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", ("root"."c1" + 1) AS "x", SUM("root"."c1") OVER () AS "total" FROM db.schema.t AS "root""#);
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default()),
            @r"
        #Table(db.schema.t)#
          ->extend(~x:{r | toOne($r.c1) + 1})
          ->extend(~total:{r | $r.c1}:{c | $c->sum()})
        "
        );
    }

    #[test]
    fn test_extend_after_group_by_wraps() {
        let extended = frame()
            .group_by(
                ["c2"],
                [NewColumn::aggregated("cnt", |r| r.get("c1"), |c| Ok(c.count()))],
            )
            .unwrap()
            .extend([NewColumn::new("double", |r| r.get("cnt")?.mul(2))])
            .unwrap();

        assert_snapshot!(sql(&extended), @r#"SELECT "root"."c2" AS "c2", "root"."cnt" AS "cnt", ("root"."cnt" * 2) AS "double" FROM (SELECT "root"."c2" AS "c2", COUNT("root"."c1") AS "cnt" FROM db.schema.t AS "root" GROUP BY "root"."c2") AS "root""#);
    }

    #[test]
    fn test_extend_errors() {
        let err = frame()
            .extend([
                NewColumn::new("x", |_| Ok(1.into())),
                NewColumn::new("x", |_| Ok(2.into())),
            ])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateColumn);
        assert_snapshot!(err, @"Extend column names list has duplicates: ['x', 'x']");

        let err = frame()
            .extend([NewColumn::new("c1", |_| Ok(1.into()))])
            .unwrap_err();
        assert_snapshot!(err, @"Extend column name - 'c1' already exists in base frame");

        let err = frame()
            .extend([NewColumn::new("x", |r| r.get("c2")?.add(1))])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(
            err.hints,
            vec!["error occurred while evaluating the 'extend' lambda of column 'x'".to_string()]
        );
    }

    #[test]
    fn test_window_extend() {
        let window = Window::new()
            .partition_by(["c2"])
            .order_by([SortInfo::desc("c1")]);
        let extended = frame()
            .window_extend(
                window,
                [WindowColumn::new("rn", |p, _, r| Ok(p.row_number(r)))],
            )
            .unwrap();

        assert_eq!(
            extended.columns().last(),
            Some(&TdsColumn::new("rn", PrimitiveType::Integer))
        );
        assert_snapshot!(sql(&extended), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", row_number() OVER (PARTITION BY "root"."c2" ORDER BY "root"."c1" DESC) AS "rn" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root") AS "root""#);
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default().no_pretty()),
            @"#Table(db.schema.t)#->extend(over(~[c2], [descending(~c1)]), ~rn:{p,w,r | $p->rowNumber($r)})"
        );
    }

    #[test]
    fn test_window_extend_with_frame_and_aggregate() {
        let window = Window::new()
            .order_by(["c1"])
            .frame(WindowFrame::rows(FrameBound::Unbounded, FrameBound::offset(0)));
        let extended = frame()
            .window_extend(
                window,
                [
                    WindowColumn::aggregated("running", |_, _, r| r.get("c1"), |c| c.sum()),
                    WindowColumn::new("prev", |p, _, r| p.lag(r).get("c1")),
                ],
            )
            .unwrap();

        assert_snapshot!(sql(&extended), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2", SUM("root"."c1") OVER (ORDER BY "root"."c1" ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "running", lag("root"."c1") OVER (ORDER BY "root"."c1" ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "prev" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root") AS "root""#);
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default()),
            @r"
        #Table(db.schema.t)#
          ->extend(over([], [ascending(~c1)], rows(unbounded(), 0)), ~running:{p,w,r | $r.c1}:{c | $c->sum()})
          ->extend(over([], [ascending(~c1)], rows(unbounded(), 0)), ~prev:{p,w,r | $p->lag($r).c1})
        "
        );
    }

    #[test]
    fn test_window_extend_ranking_functions() {
        let extended = frame()
            .window_extend(
                Window::new().order_by(["c1"]),
                [
                    WindowColumn::new("tile", |p, _, r| p.ntile(r, 4)),
                    WindowColumn::new("rk", |p, w, r| Ok(p.rank(w, r))),
                ],
            )
            .unwrap();

        let sql = sql(&extended);
        assert!(sql.contains(r#"ntile(4) OVER (ORDER BY "root"."c1") AS "tile""#), "{sql}");
        assert!(sql.contains(r#"rank() OVER (ORDER BY "root"."c1") AS "rk""#), "{sql}");
        assert_snapshot!(
            extended.to_pure_query(&FrameToPureConfig::default().no_pretty()),
            @"#Table(db.schema.t)#->extend(over([], [ascending(~c1)]), ~[tile:{p,w,r | $p->ntile($r, 4)}, rk:{p,w,r | $p->rank($w, $r)}])"
        );
    }

    #[test]
    fn test_window_extend_ntile_needs_buckets() {
        for buckets in [0, -3] {
            let err = frame()
                .window_extend(
                    Window::new().order_by(["c1"]),
                    [WindowColumn::new("tile", move |p, _, r| p.ntile(r, buckets))],
                )
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(
                err.reason,
                format!("Number of buckets argument of ntile function must be positive. Buckets: {buckets}")
            );
        }
    }

    #[test]
    fn test_window_extend_unknown_partition_column() {
        let err = frame()
            .window_extend(
                Window::new().partition_by(["c9"]),
                [WindowColumn::new("rn", |p, _, r| Ok(p.row_number(r)))],
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownColumn);
        assert_snapshot!(err, @"Column - 'c9' in window columns list doesn't exist in the current frame. Current frame columns: ['c1', 'c2']");
    }
}
