//! Typed expression tree built inside frame closures.
//!
//! Column references carry a symbolic frame name instead of a table. When a
//! frame is rendered to SQL, a [SqlScope] binds each frame name to the query
//! whose select list resolves the column; PURE rendering uses the frame name
//! as the lambda parameter (`$r.col`).
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use legendql_sql::ast::{ColumnType, Expression, FunctionCall, Literal, QuerySpecification};
use legendql_sql::DialectExtension;

use super::operators::Operator;
use super::pure;
use crate::config::FrameToPureConfig;
use crate::{Error, Result};

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    StrictDate(NaiveDate),
    DateTime(NaiveDateTime),
}

impl LiteralValue {
    pub(crate) fn to_sql(&self) -> Expression {
        match self {
            LiteralValue::Boolean(b) => Expression::boolean(*b),
            LiteralValue::Integer(i) => Expression::integer(*i),
            LiteralValue::Float(f) => Expression::Literal(Literal::Double(*f)),
            LiteralValue::String(s) => Expression::string(s.clone()),
            LiteralValue::StrictDate(d) => Expression::Cast {
                expression: Box::new(Expression::string(d.format(ISO_DATE).to_string())),
                column_type: ColumnType::new("DATE"),
            },
            LiteralValue::DateTime(dt) => Expression::Cast {
                expression: Box::new(Expression::string(dt.format(ISO_DATE_TIME).to_string())),
                column_type: ColumnType::new("TIMESTAMP"),
            },
        }
    }

    pub(crate) fn to_pure(&self) -> String {
        match self {
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Integer(i) => i.to_string(),
            LiteralValue::Float(f) => format!("{f:?}"),
            LiteralValue::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            LiteralValue::StrictDate(d) => format!("%{}", d.format(ISO_DATE)),
            LiteralValue::DateTime(dt) => format!("%{}", dt.format(ISO_DATE_TIME)),
        }
    }
}

/// Offset accessors available on a window's partial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowAccessor {
    Lead,
    Lag,
    First,
    Last,
    Nth(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnRef {
    pub frame: &'static str,
    pub name: String,
    pub accessor: Option<RowAccessor>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Operation {
    pub operator: Operator,
    pub operands: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Column(ColumnRef),
    Literal(LiteralValue),
    Operation(Box<Operation>),
    /// The collection handed to an aggregation closure. Renders as `$c` in
    /// PURE and as the mapped expression in SQL.
    Collection(Box<Expr>),
}

impl Expr {
    pub fn operation(operator: Operator, operands: Vec<Expr>) -> Self {
        Expr::Operation(Box::new(Operation { operator, operands }))
    }

    /// Whether PURE knows the value has multiplicity one.
    pub fn is_non_nullable(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Column(_) | Expr::Collection(_) => false,
            Expr::Operation(op) => op.operator.is_non_nullable(),
        }
    }

    pub fn to_sql(&self, scope: &SqlScope) -> Result<Expression> {
        match self {
            Expr::Column(column) => {
                let value = scope.resolve(column.frame, &column.name)?;
                Ok(match column.accessor {
                    None => value,
                    Some(accessor) => {
                        let (name, mut arguments) = match accessor {
                            RowAccessor::Lead => ("lead", vec![value]),
                            RowAccessor::Lag => ("lag", vec![value]),
                            RowAccessor::First => ("first_value", vec![value]),
                            RowAccessor::Last => ("last_value", vec![value]),
                            RowAccessor::Nth(_) => ("nth_value", vec![value]),
                        };
                        if let RowAccessor::Nth(n) = accessor {
                            arguments.push(Expression::integer(n));
                        }
                        Expression::FunctionCall(FunctionCall::new(name, arguments))
                    }
                })
            }
            Expr::Literal(literal) => Ok(literal.to_sql()),
            Expr::Operation(op) => {
                let operands = op
                    .operands
                    .iter()
                    .map(|o| o.to_sql(scope))
                    .collect::<Result<Vec<_>>>()?;
                op.operator.to_sql(operands)
            }
            Expr::Collection(mapped) => mapped.to_sql(scope),
        }
    }

    pub fn to_pure(&self, config: &FrameToPureConfig) -> String {
        match self {
            Expr::Column(column) => {
                let frame = column.frame;
                let name = pure::escape_column_name(&column.name);
                match column.accessor {
                    None => format!("${frame}.{name}"),
                    Some(RowAccessor::Lead) => format!("$p->lead(${frame}).{name}"),
                    Some(RowAccessor::Lag) => format!("$p->lag(${frame}).{name}"),
                    Some(RowAccessor::First) => format!("$p->first($w, ${frame}).{name}"),
                    Some(RowAccessor::Last) => format!("$p->last($w, ${frame}).{name}"),
                    Some(RowAccessor::Nth(n)) => format!("$p->nth($w, ${frame}, {n}).{name}"),
                }
            }
            Expr::Literal(literal) => literal.to_pure(),
            Expr::Operation(op) => {
                let operands = op
                    .operands
                    .iter()
                    .enumerate()
                    .map(|(i, operand)| {
                        let rendered = operand.to_pure(config);
                        if op.operator.needs_non_nullable(i) && !operand.is_non_nullable() {
                            pure::to_one(&rendered)
                        } else {
                            rendered
                        }
                    })
                    .collect::<Vec<_>>();
                op.operator.to_pure(&operands)
            }
            Expr::Collection(_) => "$c".to_string(),
        }
    }

    /// Name of the column this expression reads, if it is a plain reference.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Expr::Column(ColumnRef {
                name,
                accessor: None,
                ..
            }) => Some(name),
            _ => None,
        }
    }
}

/// Frame name to query bindings used while rendering closures to SQL.
pub(crate) struct SqlScope<'a> {
    pub extension: &'a dyn DialectExtension,
    frames: Vec<(&'static str, &'a QuerySpecification)>,
}

impl<'a> SqlScope<'a> {
    pub fn new(extension: &'a dyn DialectExtension) -> Self {
        SqlScope {
            extension,
            frames: Vec::new(),
        }
    }

    pub fn bind(mut self, frame: &'static str, query: &'a QuerySpecification) -> Self {
        self.frames.push((frame, query));
        self
    }

    /// The expression projected for `column` by the query bound to `frame`.
    pub fn resolve(&self, frame: &str, column: &str) -> Result<Expression> {
        let (_, query) = self
            .frames
            .iter()
            .rev()
            .find(|(name, _)| *name == frame)
            .ok_or_else(|| Error::new_assert(format!("frame `{frame}` is not bound")))?;

        let alias = self.extension.quote_identifier(column);
        query
            .find_column(&alias)
            .cloned()
            .ok_or_else(|| Error::new_assert(format!("Cannot find column: {column}")))
    }
}
