//! Feature map for SQL dialects.
//!
//! Rendering targets ANSI-ish SQL by default. Every node of the metamodel is
//! rendered through a `process_*` method of [DialectExtension], whose default
//! body calls the shared renderer in `gen_query` / `gen_expr`. A dialect
//! overrides only the methods where its syntax differs (pagination for MS SQL,
//! interval quoting for Postgres, ...).
use core::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::ast::*;
use crate::format::SqlToStringConfig;
use crate::gen_expr;
use crate::gen_query;
use crate::Result;

/// SQL dialect.
///
/// The string form of each variant is the database type tag under which its
/// generator is registered.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Serialize,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum Dialect {
    #[default]
    Postgres,
    Generic,
    MsSql,
}

impl Dialect {
    pub fn extension(&self) -> Box<dyn DialectExtension> {
        match self {
            Dialect::Postgres => Box::new(PostgresDialect),
            Dialect::Generic => Box::new(GenericDialect),
            Dialect::MsSql => Box::new(MsSqlDialect),
        }
    }
}

#[derive(Debug)]
pub struct GenericDialect;
#[derive(Debug)]
pub struct PostgresDialect;
#[derive(Debug)]
pub struct MsSqlDialect;

const DEFAULT_RESERVED_KEYWORDS: &[&str] = &["kerberos", "date", "first"];

pub trait DialectExtension: Debug + Send + Sync {
    fn quote_char(&self) -> char {
        '"'
    }

    /// Identifiers in this list are quoted even when the caller did not ask
    /// for it.
    fn reserved_keywords(&self) -> &[&str] {
        DEFAULT_RESERVED_KEYWORDS
    }

    /// Unconditionally quote an identifier, doubling embedded quote chars.
    fn quote_identifier(&self, identifier: &str) -> String {
        let q = self.quote_char();
        let escaped = identifier.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Whether intervals are written `INTERVAL '1 DAY'` rather than
    /// `INTERVAL 1 DAY`.
    fn requires_quotes_intervals(&self) -> bool {
        false
    }

    fn process_identifier(
        &self,
        identifier: &str,
        _config: &SqlToStringConfig,
        should_quote: bool,
    ) -> String {
        if should_quote || self.reserved_keywords().contains(&identifier) {
            self.quote_identifier(identifier)
        } else {
            identifier.to_string()
        }
    }

    fn process_qualified_name(&self, name: &QualifiedName, config: &SqlToStringConfig) -> String {
        gen_expr::translate_qualified_name(self, name, config)
    }

    // relations

    fn process_query_specification(
        &self,
        query: &QuerySpecification,
        config: &SqlToStringConfig,
        nested: bool,
    ) -> Result<String> {
        gen_query::translate_query_specification(self, query, config, nested)
    }

    fn process_query(&self, query: &Query, config: &SqlToStringConfig, nested: bool) -> Result<String> {
        gen_query::translate_query(self, query, config, nested)
    }

    fn process_relation(
        &self,
        relation: &Relation,
        config: &SqlToStringConfig,
        nested: bool,
    ) -> Result<String> {
        gen_query::translate_relation(self, relation, config, nested)
    }

    fn process_join(&self, join: &Join, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_join(self, join, config)
    }

    fn process_join_criteria(&self, criteria: &JoinCriteria, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_join_criteria(self, criteria, config)
    }

    fn process_union(&self, union: &Union, config: &SqlToStringConfig, nested: bool) -> Result<String> {
        gen_query::translate_union(self, union, config, nested)
    }

    /// The select list, without `DISTINCT`.
    fn process_select(&self, select: &Select, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_select(self, select, config)
    }

    fn process_select_item(&self, item: &SelectItem, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_select_item(self, item, config)
    }

    /// Rendered after `SELECT DISTINCT`, before the select list.
    fn process_top(&self, _query: &QuerySpecification, _config: &SqlToStringConfig) -> Result<String> {
        Ok(String::new())
    }

    fn process_limit(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_limit(self, query, config)
    }

    fn process_group_by(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_group_by(self, query, config)
    }

    fn process_order_by(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_order_by(self, &query.order_by, config)
    }

    fn process_sort_item(&self, item: &SortItem, config: &SqlToStringConfig) -> Result<String> {
        gen_query::translate_sort_item(self, item, config)
    }

    // expressions

    fn process_expression(&self, expr: &Expression, config: &SqlToStringConfig) -> Result<String> {
        gen_expr::translate_expr(self, expr, config)
    }

    fn process_literal(&self, literal: &Literal, config: &SqlToStringConfig) -> Result<String> {
        gen_expr::translate_literal(self, literal, config)
    }

    fn process_function_call(&self, call: &FunctionCall, config: &SqlToStringConfig) -> Result<String> {
        gen_expr::translate_function_call(self, call, config)
    }

    fn process_window(&self, window: &Window, config: &SqlToStringConfig) -> Result<String> {
        gen_expr::translate_window(self, window, config)
    }

    fn process_extension(&self, expr: &ExtensionExpression, config: &SqlToStringConfig) -> Result<String> {
        gen_expr::translate_extension(self, expr, config)
    }

    fn process_date_adjust(
        &self,
        value: &Expression,
        interval: &IntervalLiteral,
        config: &SqlToStringConfig,
    ) -> Result<String> {
        let value = self.process_expression(value, config)?;
        let interval = self.process_literal(&Literal::Interval(interval.clone()), config)?;
        Ok(format!("({value} + {interval})"))
    }
}

impl DialectExtension for GenericDialect {}

const POSTGRES_RESERVED_KEYWORDS: &[&str] = &[
    "kerberos", "date", "first", "user", "order", "group", "select", "table", "from", "where",
];

impl DialectExtension for PostgresDialect {
    fn reserved_keywords(&self) -> &[&str] {
        POSTGRES_RESERVED_KEYWORDS
    }

    fn requires_quotes_intervals(&self) -> bool {
        true
    }
}

impl DialectExtension for MsSqlDialect {
    // https://learn.microsoft.com/en-us/sql/t-sql/queries/top-transact-sql
    fn process_top(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        match (&query.limit, &query.offset) {
            (Some(limit), None) => Ok(format!(" TOP {}", self.process_expression(limit, config)?)),
            _ => Ok(String::new()),
        }
    }

    // OFFSET .. FETCH is only valid after an ORDER BY
    fn process_order_by(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        if query.order_by.is_empty() && query.offset.is_some() {
            return Ok(format!("{}ORDER BY (SELECT NULL)", config.format.separator(0)));
        }
        gen_query::translate_order_by(self, &query.order_by, config)
    }

    fn process_limit(&self, query: &QuerySpecification, config: &SqlToStringConfig) -> Result<String> {
        let Some(offset) = &query.offset else {
            return Ok(String::new());
        };
        let sep0 = config.format.separator(0);
        let mut res = format!("{sep0}OFFSET {} ROWS", self.process_expression(offset, config)?);
        if let Some(limit) = &query.limit {
            let limit = self.process_expression(limit, config)?;
            res += &format!("{sep0}FETCH NEXT {limit} ROWS ONLY");
        }
        Ok(res)
    }

    // https://learn.microsoft.com/en-us/sql/t-sql/functions/dateadd-transact-sql
    fn process_date_adjust(
        &self,
        value: &Expression,
        interval: &IntervalLiteral,
        config: &SqlToStringConfig,
    ) -> Result<String> {
        let value = self.process_expression(value, config)?;
        Ok(format!("DATEADD({}, {}, {value})", interval.unit, interval.amount))
    }

    fn process_extension(&self, expr: &ExtensionExpression, config: &SqlToStringConfig) -> Result<String> {
        match expr {
            ExtensionExpression::StringLength(value) => {
                Ok(format!("LEN({})", self.process_expression(value, config)?))
            }
            ExtensionExpression::StringPos { value, other } => Ok(format!(
                "CHARINDEX({}, {})",
                self.process_expression(other, config)?,
                self.process_expression(value, config)?
            )),
            ExtensionExpression::DatePart { field, value } => Ok(format!(
                "DATEPART({}, {})",
                field.unit(),
                self.process_expression(value, config)?
            )),
            _ => gen_expr::translate_extension(self, expr, config),
        }
    }
}
