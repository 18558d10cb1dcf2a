use legendql_sql::ast::{Expression, QuerySpecification};
use legendql_sql::helpers::{has_any_clause, Clause};
use legendql_sql::DialectExtension;

use super::{check_boolean, projects_window, pure_step, sub_query_if, AppliedFunction};
use crate::language::expr::{Expr, LiteralValue, SqlScope};
use crate::language::pure;
use crate::tds::TdsFrame;
use crate::{FrameToPureConfig, Primitive, Result, TdsRow, WithErrorInfo};

#[derive(Debug)]
pub(crate) struct FilterFunction {
    base: TdsFrame,
    condition: Primitive,
}

impl FilterFunction {
    pub fn apply<F>(base: &TdsFrame, condition: F) -> Result<TdsFrame>
    where
        F: FnOnce(&TdsRow) -> Result<Primitive>,
    {
        let condition = condition(&base.row("r"))
            .push_hint("error occurred while evaluating the filter function")?;
        check_boolean(&condition, "Filter")?;

        let function = FilterFunction {
            base: base.clone(),
            condition,
        };
        Ok(TdsFrame::applied(base, base.columns().to_vec(), function))
    }

    fn is_always_true(&self) -> bool {
        matches!(self.condition.expr, Expr::Literal(LiteralValue::Boolean(true)))
    }
}

impl AppliedFunction for FilterFunction {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        if self.is_always_true() {
            return Ok(base);
        }

        // WHERE is evaluated before aggregation, pagination and window functions
        let wrap = has_any_clause(&base, &[Clause::GroupBy, Clause::Offset, Clause::Limit])
            || projects_window(&base);
        let mut query = sub_query_if(base, extension, wrap)?;

        let condition = {
            let scope = SqlScope::new(extension).bind("r", &query);
            self.condition.expr.to_sql(&scope)?
        };
        query.where_ = Some(match query.where_.take() {
            Some(existing) => Expression::and(existing, condition),
            None => condition,
        });
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let condition = self.condition.to_pure_expression(config);
        pure_step(
            &self.base,
            config,
            &format!("->filter({})", pure::lambda("r", &condition)),
        )
    }
}
