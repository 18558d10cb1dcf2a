//! Operators of the expression tree and their SQL and PURE renderings.
use itertools::Itertools;

use legendql_sql::ast::{
    AggregateFunction, ArithmeticOperator, ColumnType, ComparisonOperator, CurrentTimeKind,
    DatePartField, DateTruncPart, DurationUnit, Expression, ExtensionExpression, FunctionCall,
    IntervalLiteral, Literal, LogicalOperator, MathFunction, TrimKind, WhenClause,
};

use super::pure::{functional_call, strip_outer_parens};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LikeKind {
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseTarget {
    Integer,
    Float,
    Boolean,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RankFunction {
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Ntile(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Math(MathFunction),
    Power,
    Remainder,
    ArcTan2,
    /// One operand, or two when a scale is given.
    Round,
    Compare(ComparisonOperator),
    And,
    Or,
    Not,
    IsEmpty,
    IsNotEmpty,
    /// The value, followed by the list items.
    InList,
    /// Condition, then branch, else branch.
    IfElse,
    Length,
    Like(LikeKind),
    Upper,
    Lower,
    Trim(TrimKind),
    IndexOf,
    Concat,
    Parse(ParseTarget),
    CurrentUser,
    DateTrunc(DateTruncPart),
    DatePart(DatePartField),
    DateOnly,
    Today,
    Now,
    Adjust { amount: i64, unit: DurationUnit },
    Aggregate(AggregateFunction),
    JoinStrings,
    Rank(RankFunction),
}

impl Operator {
    /// Whether the result always has multiplicity one in PURE.
    pub fn is_non_nullable(&self) -> bool {
        !matches!(
            self,
            Operator::Like(_)
                | Operator::IfElse
                | Operator::Aggregate(_)
                | Operator::JoinStrings
                | Operator::Rank(_)
        )
    }

    /// Whether the operand at `index` must be `toOne`d when nullable.
    pub fn needs_non_nullable(&self, index: usize) -> bool {
        match self {
            Operator::Compare(_)
            | Operator::IsEmpty
            | Operator::IsNotEmpty
            | Operator::Like(_)
            | Operator::Aggregate(_)
            | Operator::JoinStrings => false,
            Operator::InList | Operator::IfElse => index == 0,
            _ => true,
        }
    }

    pub fn to_sql(&self, operands: Vec<Expression>) -> Result<Expression> {
        if let Operator::InList = self {
            let mut operands = operands.into_iter();
            let value = operands
                .next()
                .ok_or_else(|| Error::new_assert("in list without a value"))?;
            return Ok(Expression::InPredicate {
                value: Box::new(value),
                list: Box::new(Expression::InList(operands.collect())),
            });
        }

        let mut operands = operands.into_iter();
        let mut next = || {
            operands
                .next()
                .map(Box::new)
                .ok_or_else(|| Error::new_assert(format!("missing operand of {self:?}")))
        };
        let ext = |e: ExtensionExpression| Expression::Extension(e);
        let arith = |operator: ArithmeticOperator, left, right| Expression::Arithmetic {
            operator,
            left,
            right,
        };
        let cast = |expression, name: &str| Expression::Cast {
            expression,
            column_type: ColumnType::new(name),
        };

        Ok(match self {
            Operator::Add => arith(ArithmeticOperator::Add, next()?, next()?),
            Operator::Subtract => arith(ArithmeticOperator::Subtract, next()?, next()?),
            Operator::Multiply => arith(ArithmeticOperator::Multiply, next()?, next()?),
            Operator::Divide => arith(ArithmeticOperator::Divide, next()?, next()?),
            Operator::Modulo => arith(ArithmeticOperator::Modulus, next()?, next()?),
            Operator::Negate => Expression::Negative(next()?),
            Operator::Math(function) => ext(ExtensionExpression::Math {
                function: *function,
                value: next()?,
            }),
            Operator::Power => ext(ExtensionExpression::Power {
                first: next()?,
                second: next()?,
            }),
            Operator::Remainder => ext(ExtensionExpression::Remainder {
                first: next()?,
                second: next()?,
            }),
            Operator::ArcTan2 => ext(ExtensionExpression::ArcTan2 {
                first: next()?,
                second: next()?,
            }),
            Operator::Round => ext(ExtensionExpression::Round {
                value: next()?,
                scale: next().ok(),
            }),
            Operator::Compare(operator) => Expression::Comparison {
                operator: *operator,
                left: next()?,
                right: next()?,
            },
            Operator::And => Expression::LogicalBinary {
                operator: LogicalOperator::And,
                left: next()?,
                right: next()?,
            },
            Operator::Or => Expression::LogicalBinary {
                operator: LogicalOperator::Or,
                left: next()?,
                right: next()?,
            },
            Operator::Not => Expression::Not(next()?),
            Operator::IsEmpty => Expression::IsNull(next()?),
            Operator::IsNotEmpty => Expression::IsNotNull(next()?),
            Operator::InList => return Err(Error::new_assert("in list is rendered above")),
            Operator::IfElse => Expression::SearchedCase {
                when_clauses: vec![WhenClause {
                    operand: *next()?,
                    result: *next()?,
                }],
                default: Some(next()?),
            },
            Operator::Length => ext(ExtensionExpression::StringLength(next()?)),
            Operator::Like(kind) => {
                let value = next()?;
                let pattern = match *next()? {
                    Expression::Literal(Literal::String { value, .. }) => like_pattern(*kind, &value),
                    other => {
                        return Err(Error::new_assert(format!(
                            "like pattern must be a string literal, got {other:?}"
                        )))
                    }
                };
                ext(ExtensionExpression::StringLike {
                    value,
                    pattern: Box::new(Expression::string(pattern)),
                })
            }
            Operator::Upper => ext(ExtensionExpression::StringUpper(next()?)),
            Operator::Lower => ext(ExtensionExpression::StringLower(next()?)),
            Operator::Trim(kind) => ext(ExtensionExpression::StringTrim {
                value: next()?,
                kind: *kind,
            }),
            Operator::IndexOf => ext(ExtensionExpression::StringPos {
                value: next()?,
                other: next()?,
            }),
            Operator::Concat => ext(ExtensionExpression::StringConcat {
                first: next()?,
                second: next()?,
            }),
            Operator::Parse(ParseTarget::Integer) => cast(next()?, "INTEGER"),
            Operator::Parse(ParseTarget::Float) => cast(next()?, "DOUBLE PRECISION"),
            Operator::Parse(ParseTarget::Boolean) => cast(next()?, "BOOLEAN"),
            Operator::Parse(ParseTarget::DateTime) => cast(next()?, "TIMESTAMP WITH TIME ZONE"),
            Operator::CurrentUser => Expression::Constant("CURRENT_USER".to_string()),
            Operator::DateTrunc(part) => ext(ExtensionExpression::DateTrunc {
                part: *part,
                value: next()?,
            }),
            Operator::DatePart(field) => ext(ExtensionExpression::DatePart {
                field: *field,
                value: next()?,
            }),
            Operator::DateOnly => cast(next()?, "DATE"),
            Operator::Today => Expression::CurrentTime {
                kind: CurrentTimeKind::Date,
                precision: None,
            },
            Operator::Now => Expression::CurrentTime {
                kind: CurrentTimeKind::Timestamp,
                precision: None,
            },
            Operator::Adjust { amount, unit } => ext(ExtensionExpression::DateAdjust {
                value: next()?,
                interval: IntervalLiteral {
                    amount: *amount,
                    unit: *unit,
                },
            }),
            Operator::Aggregate(function) => ext(ExtensionExpression::Aggregate {
                function: *function,
                value: next()?,
            }),
            Operator::JoinStrings => ext(ExtensionExpression::JoinStrings {
                value: next()?,
                separator: next()?,
            }),
            Operator::Rank(function) => {
                let (name, arguments) = match function {
                    RankFunction::RowNumber => ("row_number", vec![]),
                    RankFunction::Rank => ("rank", vec![]),
                    RankFunction::DenseRank => ("dense_rank", vec![]),
                    RankFunction::PercentRank => ("percent_rank", vec![]),
                    RankFunction::CumeDist => ("cume_dist", vec![]),
                    RankFunction::Ntile(n) => ("ntile", vec![Expression::integer(*n)]),
                };
                Expression::FunctionCall(FunctionCall::new(name, arguments))
            }
        })
    }

    /// Renders the operation over operands that are already rendered (and
    /// already `toOne`d where needed).
    pub fn to_pure(&self, operands: &[String]) -> String {
        let call = |func: &str| functional_call(func, operands, false);

        match self {
            Operator::Add | Operator::Concat => infix("+", operands),
            Operator::Subtract => infix("-", operands),
            Operator::Multiply => infix("*", operands),
            Operator::Divide => infix("/", operands),
            Operator::Modulo => call("mod"),
            Operator::Negate => call("minus"),
            Operator::Math(function) => call(math_name(*function)),
            Operator::Power => call("pow"),
            Operator::Remainder => call("rem"),
            Operator::ArcTan2 => call("atan2"),
            Operator::Round => match operands {
                [value, scale] => format!(
                    "cast({}, @Float)->round({})",
                    strip_outer_parens(value),
                    strip_outer_parens(scale)
                ),
                _ => call("round"),
            },
            Operator::Compare(operator) => infix(comparison_symbol(*operator), operands),
            Operator::And => infix("&&", operands),
            Operator::Or => infix("||", operands),
            Operator::Not => call("not"),
            Operator::IsEmpty => call("isEmpty"),
            Operator::IsNotEmpty => call("isNotEmpty"),
            Operator::InList => match operands.split_first() {
                Some((value, items)) => format!("{value}->in([{}])", items.join(", ")),
                None => call("in"),
            },
            Operator::IfElse => {
                let params = operands
                    .iter()
                    .enumerate()
                    .map(|(i, o)| {
                        if i == 0 {
                            o.clone()
                        } else {
                            format!("|{}", strip_outer_parens(o))
                        }
                    })
                    .collect_vec();
                functional_call("if", &params, true)
            }
            Operator::Length => call("length"),
            Operator::Like(LikeKind::StartsWith) => call("startsWith"),
            Operator::Like(LikeKind::EndsWith) => call("endsWith"),
            Operator::Like(LikeKind::Contains) => call("contains"),
            Operator::Upper => call("toUpper"),
            Operator::Lower => call("toLower"),
            Operator::Trim(TrimKind::Left) => call("ltrim"),
            Operator::Trim(TrimKind::Right) => call("rtrim"),
            Operator::Trim(TrimKind::Both) => call("trim"),
            Operator::IndexOf => call("indexOf"),
            Operator::Parse(ParseTarget::Integer) => call("parseInteger"),
            Operator::Parse(ParseTarget::Float) => call("parseFloat"),
            Operator::Parse(ParseTarget::Boolean) => call("parseBoolean"),
            Operator::Parse(ParseTarget::DateTime) => call("parseDate"),
            Operator::CurrentUser => call("currentUserId"),
            Operator::DateTrunc(part) => call(date_trunc_name(*part)),
            Operator::DatePart(field) => call(date_part_name(*field)),
            Operator::DateOnly => call("datePart"),
            Operator::Today => call("today"),
            Operator::Now => call("now"),
            Operator::Adjust { amount, unit } => {
                let mut params = operands.to_vec();
                params.push(amount.to_string());
                params.push(duration_unit_name(*unit));
                functional_call("adjust", &params, false)
            }
            Operator::Aggregate(AggregateFunction::DistinctCount) => {
                let value = operands.first().map(String::as_str).unwrap_or("$c");
                format!("{value}->distinct()->count()")
            }
            Operator::Aggregate(function) => call(aggregate_name(*function)),
            Operator::JoinStrings => call("joinStrings"),
            Operator::Rank(function) => match function {
                RankFunction::RowNumber => "$p->rowNumber($r)".to_string(),
                RankFunction::Rank => "$p->rank($w, $r)".to_string(),
                RankFunction::DenseRank => "$p->denseRank($w, $r)".to_string(),
                RankFunction::PercentRank => "$p->percentRank($w, $r)".to_string(),
                RankFunction::CumeDist => "$p->cumulativeDistribution($w, $r)".to_string(),
                RankFunction::Ntile(n) => format!("$p->ntile($r, {n})"),
            },
        }
    }
}

fn infix(symbol: &str, operands: &[String]) -> String {
    format!("({})", operands.join(&format!(" {symbol} ")))
}

/// Escapes LIKE wildcards in `value` and anchors it.
fn like_pattern(kind: LikeKind, value: &str) -> String {
    let escaped = value.replace('_', "\\_").replace('%', "\\%");
    match kind {
        LikeKind::StartsWith => format!("{escaped}%"),
        LikeKind::EndsWith => format!("%{escaped}"),
        LikeKind::Contains => format!("%{escaped}%"),
    }
}

fn comparison_symbol(operator: ComparisonOperator) -> &'static str {
    match operator {
        ComparisonOperator::Equal => "==",
        ComparisonOperator::NotEqual => "!=",
        ComparisonOperator::LessThan => "<",
        ComparisonOperator::LessThanOrEqual => "<=",
        ComparisonOperator::GreaterThan => ">",
        ComparisonOperator::GreaterThanOrEqual => ">=",
    }
}

fn math_name(function: MathFunction) -> &'static str {
    match function {
        MathFunction::Abs => "abs",
        MathFunction::Ceil => "ceiling",
        MathFunction::Floor => "floor",
        MathFunction::Sqrt => "sqrt",
        MathFunction::Cbrt => "cbrt",
        MathFunction::Exp => "exp",
        MathFunction::Log => "log",
        MathFunction::Sin => "sin",
        MathFunction::Asin => "asin",
        MathFunction::Cos => "cos",
        MathFunction::Acos => "acos",
        MathFunction::Tan => "tan",
        MathFunction::Atan => "atan",
        MathFunction::Cot => "cot",
    }
}

fn date_trunc_name(part: DateTruncPart) -> &'static str {
    match part {
        DateTruncPart::FirstDayOfYear => "firstDayOfYear",
        DateTruncPart::FirstDayOfQuarter => "firstDayOfQuarter",
        DateTruncPart::FirstDayOfMonth => "firstDayOfMonth",
        DateTruncPart::FirstDayOfWeek => "firstDayOfWeek",
        DateTruncPart::FirstHourOfDay => "firstHourOfDay",
        DateTruncPart::FirstMinuteOfHour => "firstMinuteOfHour",
        DateTruncPart::FirstSecondOfMinute => "firstSecondOfMinute",
        DateTruncPart::FirstMillisecondOfSecond => "firstMillisecondOfSecond",
    }
}

fn date_part_name(field: DatePartField) -> &'static str {
    match field {
        DatePartField::Year => "year",
        DatePartField::Quarter => "quarter",
        DatePartField::Month => "month",
        DatePartField::WeekOfYear => "weekOfYear",
        DatePartField::DayOfYear => "dayOfYear",
        DatePartField::DayOfMonth => "dayOfMonth",
        DatePartField::DayOfWeek => "dayOfWeekNumber",
        DatePartField::Hour => "hour",
        DatePartField::Minute => "minute",
        DatePartField::Second => "second",
        DatePartField::Epoch => "toEpochValue",
    }
}

fn aggregate_name(function: AggregateFunction) -> &'static str {
    match function {
        AggregateFunction::Count | AggregateFunction::DistinctCount => "count",
        AggregateFunction::Average => "average",
        AggregateFunction::Max => "max",
        AggregateFunction::Min => "min",
        AggregateFunction::Sum => "sum",
        AggregateFunction::StdDevSample => "stdDevSample",
        AggregateFunction::StdDevPopulation => "stdDevPopulation",
        AggregateFunction::VarianceSample => "varianceSample",
        AggregateFunction::VariancePopulation => "variancePopulation",
    }
}

/// `DurationUnit.DAYS` and friends.
pub(crate) fn duration_unit_name(unit: DurationUnit) -> String {
    format!("DurationUnit.{unit}S")
}
