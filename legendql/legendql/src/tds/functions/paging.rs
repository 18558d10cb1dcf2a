//! Ordering and pagination.
use itertools::Itertools;

use legendql_sql::ast::{Expression, QuerySpecification};
use legendql_sql::helpers::Clause;
use legendql_sql::DialectExtension;

use super::{check_columns_exist, pure_step, sub_query_on, AppliedFunction};
use crate::language::expr::SqlScope;
use crate::language::SortInfo;
use crate::tds::TdsFrame;
use crate::{Error, FrameToPureConfig, Result};

#[derive(Debug)]
pub(crate) struct SortFunction {
    base: TdsFrame,
    keys: Vec<SortInfo>,
}

impl SortFunction {
    pub fn apply(base: &TdsFrame, keys: Vec<SortInfo>) -> Result<TdsFrame> {
        if keys.is_empty() {
            return Err(Error::validation(
                "At-least one sort column must be provided when using sort function",
            ));
        }
        let columns = keys.iter().map(|k| k.column.clone()).collect_vec();
        check_columns_exist(base, &columns, "sort")?;

        let function = SortFunction {
            base: base.clone(),
            keys,
        };
        Ok(TdsFrame::applied(base, base.columns().to_vec(), function))
    }
}

impl AppliedFunction for SortFunction {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        // ORDER BY must not reorder rows a pagination already picked
        let mut query = sub_query_on(base, extension, &[Clause::Offset, Clause::Limit])?;

        let order_by = {
            let scope = SqlScope::new(extension).bind("r", &query);
            self.keys
                .iter()
                .map(|key| key.to_sql(&scope, "r"))
                .collect::<Result<Vec<_>>>()?
        };
        query.order_by = order_by;
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let keys = self.keys.iter().map(SortInfo::to_pure).join(", ");
        pure_step(&self.base, config, &format!("->sort([{keys}])"))
    }
}

#[derive(Debug)]
pub(crate) struct SliceFunction {
    base: TdsFrame,
    start: i64,
    end: i64,
}

impl SliceFunction {
    pub fn apply(base: &TdsFrame, start: i64, end: i64) -> Result<TdsFrame> {
        if start < 0 {
            return Err(Error::validation(format!(
                "Start row argument of slice function cannot be negative. Start row: {start}"
            )));
        }
        if end <= start {
            return Err(Error::validation(format!(
                "End row argument of slice function cannot be less than or equal to start row argument. Start row: {start}, End row: {end}"
            )));
        }

        let function = SliceFunction {
            base: base.clone(),
            start,
            end,
        };
        Ok(TdsFrame::applied(base, base.columns().to_vec(), function))
    }
}

impl AppliedFunction for SliceFunction {
    fn name(&self) -> &'static str {
        "slice"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = sub_query_on(base, extension, &[Clause::Offset, Clause::Limit])?;
        query.offset = Some(Expression::integer(self.start));
        query.limit = Some(Expression::integer(self.end - self.start));
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        pure_step(
            &self.base,
            config,
            &format!("->slice({}, {})", self.start, self.end),
        )
    }
}

fn check_row_count(count: i64, function: &str) -> Result<()> {
    if count < 0 {
        return Err(Error::validation(format!(
            "Row count argument of {function} function cannot be negative. Row count: {count}"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub(crate) struct LimitFunction {
    base: TdsFrame,
    count: i64,
}

impl LimitFunction {
    pub fn apply(base: &TdsFrame, count: i64) -> Result<TdsFrame> {
        check_row_count(count, "limit")?;
        let function = LimitFunction {
            base: base.clone(),
            count,
        };
        Ok(TdsFrame::applied(base, base.columns().to_vec(), function))
    }
}

impl AppliedFunction for LimitFunction {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = sub_query_on(base, extension, &[Clause::Limit])?;
        query.limit = Some(Expression::integer(self.count));
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        pure_step(&self.base, config, &format!("->limit({})", self.count))
    }
}

#[derive(Debug)]
pub(crate) struct DropFunction {
    base: TdsFrame,
    count: i64,
}

impl DropFunction {
    pub fn apply(base: &TdsFrame, count: i64) -> Result<TdsFrame> {
        check_row_count(count, "drop")?;
        let function = DropFunction {
            base: base.clone(),
            count,
        };
        Ok(TdsFrame::applied(base, base.columns().to_vec(), function))
    }
}

impl AppliedFunction for DropFunction {
    fn name(&self) -> &'static str {
        "drop"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = sub_query_on(base, extension, &[Clause::Offset, Clause::Limit])?;
        query.offset = Some(Expression::integer(self.count));
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        pure_step(&self.base, config, &format!("->drop({})", self.count))
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;
    use rstest::rstest;

    use crate::{
        ErrorKind, FrameToPureConfig, FrameToSqlConfig, PrimitiveType, SortInfo, TdsColumn,
        TdsFrame,
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

    fn pure(frame: &TdsFrame) -> String {
        frame.to_pure_query(&FrameToPureConfig::default().no_pretty())
    }

    #[test]
    fn test_sort_then_slice() {
        let paged = frame()
            .sort([SortInfo::desc("c1")])
            .unwrap()
            .slice(0, 10)
            .unwrap();

        assert_snapshot!(sql(&paged), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root" ORDER BY "root"."c1" DESC LIMIT 10 OFFSET 0"#);
        assert_snapshot!(pure(&paged), @"#Table(db.schema.t)#->sort([descending(~c1)])->slice(0, 10)");
    }

    #[test]
    fn test_sort_after_limit_wraps() {
        let sorted = frame()
            .limit(5)
            .unwrap()
            .sort(["c2", "c1"])
            .unwrap();

        assert_snapshot!(sql(&sorted), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root" LIMIT 5) AS "root" ORDER BY "root"."c2", "root"."c1""#);
        assert_snapshot!(pure(&sorted), @"#Table(db.schema.t)#->limit(5)->sort([ascending(~c2), ascending(~c1)])");
    }

    #[test]
    fn test_limit_and_drop() {
        let paged = frame().drop(20).unwrap().head(10).unwrap();
        assert_snapshot!(sql(&paged), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root" LIMIT 10 OFFSET 20"#);
        assert_snapshot!(pure(&paged), @"#Table(db.schema.t)#->drop(20)->limit(10)");

        let paged = frame().limit(10).unwrap().drop(2).unwrap();
        assert_snapshot!(sql(&paged), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root" LIMIT 10) AS "root" OFFSET 2"#);

        let paged = frame().limit(10).unwrap().limit(3).unwrap();
        assert_snapshot!(sql(&paged), @r#"SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM (SELECT "root"."c1" AS "c1", "root"."c2" AS "c2" FROM db.schema.t AS "root" LIMIT 10) AS "root" LIMIT 3"#);
    }

    #[rstest]
    #[case(-1, 5, "Start row argument of slice function cannot be negative. Start row: -1")]
    #[case(3, 3, "End row argument of slice function cannot be less than or equal to start row argument. Start row: 3, End row: 3")]
    #[case(4, 2, "End row argument of slice function cannot be less than or equal to start row argument. Start row: 4, End row: 2")]
    fn test_slice_errors(#[case] start: i64, #[case] end: i64, #[case] message: &str) {
        let err = frame().slice(start, end).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.reason, message);
    }

    #[test]
    fn test_paging_errors() {
        let err = frame().limit(-1).unwrap_err();
        assert_snapshot!(err, @"Row count argument of limit function cannot be negative. Row count: -1");

        let err = frame().drop(-2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = frame().sort(["c3"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownColumn);

        let err = frame().sort(Vec::<SortInfo>::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
