//! Rendering of expressions, literals and windows.
use itertools::Itertools;

use crate::ast::*;
use crate::dialect::DialectExtension;
use crate::format::SqlToStringConfig;
use crate::{Error, Result};

pub(crate) fn translate_expr<D: DialectExtension + ?Sized>(
    d: &D,
    expr: &Expression,
    config: &SqlToStringConfig,
) -> Result<String> {
    Ok(match expr {
        Expression::Literal(literal) => d.process_literal(literal, config)?,
        Expression::QualifiedNameReference(name) => d.process_qualified_name(name, config),
        Expression::Comparison {
            operator,
            left,
            right,
        } => {
            let left = d.process_expression(left, config)?;
            let right = d.process_expression(right, config)?;
            format!("({left} {operator} {right})")
        }
        Expression::LogicalBinary {
            operator,
            left,
            right,
        } => {
            let left = d.process_expression(left, config)?;
            let right = d.process_expression(right, config)?;
            format!("({left} {operator} {right})")
        }
        Expression::Not(value) => {
            let inner = d.process_expression(value, config)?;
            match value.as_ref() {
                Expression::Comparison { .. } | Expression::LogicalBinary { .. } => {
                    format!("NOT{inner}")
                }
                _ => format!("NOT({inner})"),
            }
        }
        Expression::Arithmetic {
            operator,
            left,
            right,
        } => {
            let left = d.process_expression(left, config)?;
            let right = d.process_expression(right, config)?;
            match operator {
                ArithmeticOperator::Add => format!("({left} + {right})"),
                ArithmeticOperator::Subtract => format!("({left} - {right})"),
                ArithmeticOperator::Multiply => format!("({left} * {right})"),
                // force float semantics on integer operands
                ArithmeticOperator::Divide => format!("((1.0 * {left}) / {right})"),
                ArithmeticOperator::Modulus => format!("MOD({left}, {right})"),
            }
        }
        Expression::Negative(value) => {
            let inner = d.process_expression(value, config)?;
            if value.is_literal() {
                format!("-{inner}")
            } else {
                format!("(0 - {inner})")
            }
        }
        Expression::Cast {
            expression,
            column_type,
        } => {
            let value = d.process_expression(expression, config)?;
            format!("CAST({value} AS {})", translate_column_type(column_type))
        }
        Expression::InList(values) => {
            let values = values
                .iter()
                .map(|v| d.process_expression(v, config))
                .collect::<Result<Vec<_>>>()?;
            format!("({})", values.join(", "))
        }
        Expression::InPredicate { value, list } => {
            let value = d.process_expression(value, config)?;
            let list = d.process_expression(list, config)?;
            format!("{value} IN {list}")
        }
        Expression::IsNull(value) => format!("({} IS NULL)", d.process_expression(value, config)?),
        Expression::IsNotNull(value) => {
            format!("({} IS NOT NULL)", d.process_expression(value, config)?)
        }
        Expression::CurrentTime { kind, precision } => {
            let precision = precision.map(|p| format!("({p})")).unwrap_or_default();
            match kind {
                CurrentTimeKind::Date => "CURRENT_DATE".to_string(),
                CurrentTimeKind::Time => format!("CURRENT_TIME{precision}"),
                CurrentTimeKind::Timestamp => format!("CURRENT_TIMESTAMP{precision}"),
            }
        }
        Expression::Extract { field, expression } => {
            format!("EXTRACT({field} FROM {})", d.process_expression(expression, config)?)
        }
        Expression::FunctionCall(call) => d.process_function_call(call, config)?,
        Expression::NamedArgument { name, expression } => {
            format!("{name} => {}", d.process_expression(expression, config)?)
        }
        Expression::SearchedCase {
            when_clauses,
            default,
        } => translate_searched_case(d, when_clauses, default.as_deref(), config)?,
        Expression::Window { nested, window } => {
            let nested = d.process_expression(nested, config)?;
            format!("{nested} {}", d.process_window(window, config)?)
        }
        Expression::Subquery(query) => d.process_query(query, config, true)?,
        Expression::Constant(token) => token.clone(),
        Expression::Extension(ext) => d.process_extension(ext, config)?,
    })
}

fn translate_searched_case<D: DialectExtension + ?Sized>(
    d: &D,
    when_clauses: &[WhenClause],
    default: Option<&Expression>,
    config: &SqlToStringConfig,
) -> Result<String> {
    let sep0 = config.sep(0);
    let sep1 = config.sep(1);

    let when_config = config.push_indent();
    let whens = when_clauses
        .iter()
        .map(|clause| {
            let operand = d.process_expression(&clause.operand, &when_config.push_indent())?;
            let result = d.process_expression(&clause.result, &when_config.push_indent())?;
            Ok(format!(
                "WHEN{}{operand}{}THEN{}{result}",
                when_config.sep(1),
                when_config.sep(0),
                when_config.sep(1)
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let else_clause = match default {
        Some(default) => {
            let value = d.process_expression(default, &config.push_indent().push_indent())?;
            format!("{sep1}ELSE{}{value}", config.sep(2))
        }
        None => String::new(),
    };

    Ok(format!("CASE{sep1}{}{else_clause}{sep0}END", whens.join(&sep1)))
}

fn translate_column_type(column_type: &ColumnType) -> String {
    if column_type.parameters.is_empty() {
        column_type.name.clone()
    } else {
        format!("{}({})", column_type.name, column_type.parameters.iter().join(", "))
    }
}

pub(crate) fn translate_literal<D: DialectExtension + ?Sized>(
    d: &D,
    literal: &Literal,
    _config: &SqlToStringConfig,
) -> Result<String> {
    Ok(match literal {
        Literal::Boolean(b) => b.to_string(),
        Literal::Integer(i) => i.to_string(),
        // Debug keeps the fractional part: `1.0` rather than `1`
        Literal::Double(f) => format!("{f:?}"),
        Literal::String {
            value,
            quoted: true,
        } => value.clone(),
        Literal::String {
            value,
            quoted: false,
        } => format!("'{}'", value.replace('\'', "''")),
        Literal::Null => "null".to_string(),
        Literal::Interval(IntervalLiteral { amount, unit }) => {
            if d.requires_quotes_intervals() {
                format!("INTERVAL '{amount} {unit}'")
            } else {
                format!("INTERVAL {amount} {unit}")
            }
        }
    })
}

pub(crate) fn translate_qualified_name<D: DialectExtension + ?Sized>(
    d: &D,
    name: &QualifiedName,
    config: &SqlToStringConfig,
) -> String {
    name.parts
        .iter()
        .map(|p| d.process_identifier(p, config, false))
        .join(".")
}

pub(crate) fn translate_function_call<D: DialectExtension + ?Sized>(
    d: &D,
    call: &FunctionCall,
    config: &SqlToStringConfig,
) -> Result<String> {
    let name = d.process_qualified_name(&call.name, config);
    let args = call
        .arguments
        .iter()
        .map(|a| d.process_expression(a, config))
        .collect::<Result<Vec<_>>>()?;

    let distinct = if call.distinct { "DISTINCT " } else { "" };
    let args = args.join(", ");

    let filter = match &call.filter {
        Some(filter) => format!(" FILTER (WHERE {})", d.process_expression(filter, config)?),
        None => String::new(),
    };
    let window = match &call.window {
        Some(window) => format!(" {}", d.process_window(window, config)?),
        None => String::new(),
    };

    Ok(format!("{name}({distinct}{args}){filter}{window}"))
}

pub(crate) fn translate_window<D: DialectExtension + ?Sized>(
    d: &D,
    window: &Window,
    config: &SqlToStringConfig,
) -> Result<String> {
    if let Some(window_ref) = &window.window_ref {
        return Ok(window_ref.clone());
    }

    let mut parts = Vec::new();
    if !window.partitions.is_empty() {
        let partitions = window
            .partitions
            .iter()
            .map(|p| d.process_expression(p, config))
            .collect::<Result<Vec<_>>>()?;
        parts.push(format!("PARTITION BY {}", partitions.join(", ")));
    }
    if !window.order_by.is_empty() {
        let order_by = window
            .order_by
            .iter()
            .map(|o| d.process_sort_item(o, config))
            .collect::<Result<Vec<_>>>()?;
        parts.push(format!("ORDER BY {}", order_by.join(", ")));
    }
    if let Some(frame) = &window.frame {
        parts.push(translate_window_frame(d, frame, config)?);
    }

    Ok(format!("OVER ({})", parts.join(" ")))
}

fn translate_window_frame<D: DialectExtension + ?Sized>(
    d: &D,
    frame: &WindowFrame,
    config: &SqlToStringConfig,
) -> Result<String> {
    let start = translate_frame_bound(d, &frame.start, config)?;
    Ok(match &frame.end {
        Some(end) => format!(
            "{} BETWEEN {start} AND {}",
            frame.mode,
            translate_frame_bound(d, end, config)?
        ),
        None => format!("{} {start}", frame.mode),
    })
}

fn translate_frame_bound<D: DialectExtension + ?Sized>(
    d: &D,
    bound: &FrameBound,
    config: &SqlToStringConfig,
) -> Result<String> {
    let offset = || -> Result<String> {
        let value = bound
            .value
            .as_deref()
            .ok_or_else(|| Error::new_assert("frame bound offset without a value"))?;
        match (value, bound.duration_unit) {
            (Expression::Literal(Literal::Integer(amount)), Some(unit)) => d.process_literal(
                &Literal::Interval(IntervalLiteral {
                    amount: *amount,
                    unit,
                }),
                config,
            ),
            _ => d.process_expression(value, config),
        }
    };

    Ok(match bound.kind {
        FrameBoundType::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
        FrameBoundType::Preceding => format!("{} PRECEDING", offset()?),
        FrameBoundType::CurrentRow => "CURRENT ROW".to_string(),
        FrameBoundType::Following => format!("{} FOLLOWING", offset()?),
        FrameBoundType::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
    })
}

pub(crate) fn translate_extension<D: DialectExtension + ?Sized>(
    d: &D,
    expr: &ExtensionExpression,
    config: &SqlToStringConfig,
) -> Result<String> {
    let e = |x: &Expression| d.process_expression(x, config);

    Ok(match expr {
        ExtensionExpression::StringLength(value) => format!("CHAR_LENGTH({})", e(value)?),
        ExtensionExpression::StringLike { value, pattern } => {
            format!("({} LIKE {})", e(value)?, e(pattern)?)
        }
        ExtensionExpression::StringUpper(value) => format!("UPPER({})", e(value)?),
        ExtensionExpression::StringLower(value) => format!("LOWER({})", e(value)?),
        ExtensionExpression::StringTrim { value, kind } => {
            let func = match kind {
                TrimKind::Left => "LTRIM",
                TrimKind::Right => "RTRIM",
                TrimKind::Both => "BTRIM",
            };
            format!("{func}({})", e(value)?)
        }
        ExtensionExpression::StringPos { value, other } => {
            format!("STRPOS({}, {})", e(value)?, e(other)?)
        }
        ExtensionExpression::StringConcat { first, second } => {
            format!("CONCAT({}, {})", e(first)?, e(second)?)
        }
        ExtensionExpression::Math { function, value } => format!("{function}({})", e(value)?),
        ExtensionExpression::Power { first, second } => {
            format!("POWER({}, {})", e(first)?, e(second)?)
        }
        ExtensionExpression::Remainder { first, second } => {
            format!("MOD({}, {})", e(first)?, e(second)?)
        }
        ExtensionExpression::ArcTan2 { first, second } => {
            format!("ATAN2({}, {})", e(first)?, e(second)?)
        }
        ExtensionExpression::Round { value, scale } => match scale.as_deref() {
            None | Some(Expression::Literal(Literal::Integer(0))) => format!("ROUND({})", e(value)?),
            Some(scale @ Expression::Literal(Literal::Integer(_))) => {
                format!("ROUND({}, {})", e(value)?, e(scale)?)
            }
            Some(other) => {
                return Err(Error::type_mismatch(format!(
                    "Unexpected round argument type - {other:?}"
                )))
            }
        },
        ExtensionExpression::Aggregate {
            function: AggregateFunction::DistinctCount,
            value,
        } => format!("COUNT(DISTINCT {})", e(value)?),
        ExtensionExpression::Aggregate { function, value } => format!("{function}({})", e(value)?),
        ExtensionExpression::JoinStrings { value, separator } => {
            format!("STRING_AGG({}, {})", e(value)?, e(separator)?)
        }
        ExtensionExpression::DateTrunc { part, value } => {
            format!("DATE_TRUNC('{}', {})", part.unit(), e(value)?)
        }
        ExtensionExpression::DatePart { field, value } => {
            format!("DATE_PART('{}', {})", field.unit(), e(value)?)
        }
        ExtensionExpression::DateAdjust { value, interval } => {
            d.process_date_adjust(value, interval, config)?
        }
    })
}

/// Drops one pair of parentheses when they enclose the whole expression.
pub(crate) fn strip_outer_parens(expr: &str) -> &str {
    if has_matching_outer_parens(expr) {
        &expr[1..expr.len() - 1]
    } else {
        expr
    }
}

fn has_matching_outer_parens(expr: &str) -> bool {
    if !(expr.starts_with('(') && expr.ends_with(')')) || expr.len() < 2 {
        return false;
    }
    // parentheses inside string literals and quoted identifiers don't count;
    // a doubled quote toggles twice, so escapes need no special case
    let mut depth = 0usize;
    let mut quote = None;
    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != expr.len() - 1 {
                    return false;
                }
            }
            (None, _) => {}
        }
    }
    depth == 0 && quote.is_none()
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;
    use rstest::rstest;

    use super::*;
    use crate::dialect::{GenericDialect, PostgresDialect};
    use crate::format::SqlFormat;

    fn col(name: &str) -> Box<Expression> {
        Box::new(Expression::column(["t", name]))
    }

    fn render(expr: &Expression) -> String {
        PostgresDialect
            .process_expression(expr, &SqlToStringConfig::new(SqlFormat::compact()))
            .unwrap()
    }

    #[rstest]
    #[case(Literal::Double(1.0), "1.0")]
    #[case(Literal::Double(2.5), "2.5")]
    #[case(Literal::Integer(-3), "-3")]
    #[case(Literal::Boolean(true), "true")]
    #[case(Literal::Null, "null")]
    #[case(Literal::String { value: "it's".into(), quoted: false }, "'it''s'")]
    fn test_literals(#[case] literal: Literal, #[case] expected: &str) {
        assert_eq!(render(&Expression::Literal(literal)), expected);
    }

    #[test]
    fn test_arithmetic_and_logic() {
        let div = Expression::Arithmetic {
            operator: ArithmeticOperator::Divide,
            left: col("a"),
            right: col("b"),
        };
        assert_eq!(render(&div), "((1.0 * t.a) / t.b)");

        let modulus = Expression::Arithmetic {
            operator: ArithmeticOperator::Modulus,
            left: col("a"),
            right: Box::new(Expression::integer(2)),
        };
        assert_eq!(render(&modulus), "MOD(t.a, 2)");

        assert_eq!(
            render(&Expression::Negative(Box::new(Expression::integer(4)))),
            "-4"
        );
        assert_eq!(render(&Expression::Negative(col("a"))), "(0 - t.a)");

        let cmp = Expression::Comparison {
            operator: ComparisonOperator::NotEqual,
            left: col("a"),
            right: col("b"),
        };
        assert_eq!(render(&Expression::Not(Box::new(cmp))), "NOT(t.a <> t.b)");
        assert_eq!(render(&Expression::Not(col("flag"))), "NOT(t.flag)");
    }

    #[test]
    fn test_searched_case() {
        let case = Expression::SearchedCase {
            when_clauses: vec![WhenClause {
                operand: Expression::IsNull(col("a")),
                result: Expression::integer(0),
            }],
            default: Some(col("a")),
        };
        assert_eq!(render(&case), "CASE WHEN (t.a IS NULL) THEN 0 ELSE t.a END");

        let pretty = PostgresDialect
            .process_expression(&case, &SqlToStringConfig::default())
            .unwrap();
        assert_snapshot!(pretty, @r"
        CASE
            WHEN
                (t.a IS NULL)
            THEN
                0
            ELSE
                t.a
        END
        ");

        let no_default = Expression::SearchedCase {
            when_clauses: vec![WhenClause {
                operand: Expression::boolean(true),
                result: Expression::integer(1),
            }],
            default: None,
        };
        assert!(!render(&no_default).contains("ELSE"));
    }

    #[test]
    fn test_window_function() {
        let call = FunctionCall {
            window: Some(Box::new(Window {
                window_ref: None,
                partitions: vec![Expression::column(["t", "g"])],
                order_by: vec![SortItem {
                    sort_key: Expression::column(["t", "o"]),
                    ordering: SortOrdering::Descending,
                    null_ordering: NullOrdering::Undefined,
                }],
                frame: Some(WindowFrame {
                    mode: WindowFrameMode::Rows,
                    start: FrameBound {
                        kind: FrameBoundType::UnboundedPreceding,
                        value: None,
                        duration_unit: None,
                    },
                    end: Some(FrameBound {
                        kind: FrameBoundType::CurrentRow,
                        value: None,
                        duration_unit: None,
                    }),
                }),
            })),
            ..FunctionCall::new("row_number", vec![])
        };
        assert_eq!(
            render(&Expression::FunctionCall(call)),
            "row_number() OVER (PARTITION BY t.g ORDER BY t.o DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
        );
    }

    #[test]
    fn test_extensions() {
        let ext = |e: ExtensionExpression| render(&Expression::Extension(e));

        assert_eq!(
            ext(ExtensionExpression::StringTrim {
                value: col("s"),
                kind: TrimKind::Both
            }),
            "BTRIM(t.s)"
        );
        assert_eq!(
            ext(ExtensionExpression::Aggregate {
                function: AggregateFunction::DistinctCount,
                value: col("a")
            }),
            "COUNT(DISTINCT t.a)"
        );
        assert_eq!(
            ext(ExtensionExpression::Math {
                function: MathFunction::Log,
                value: col("a")
            }),
            "LN(t.a)"
        );
        assert_eq!(
            ext(ExtensionExpression::DateTrunc {
                part: DateTruncPart::FirstHourOfDay,
                value: col("d")
            }),
            "DATE_TRUNC('day', t.d)"
        );
        assert_eq!(
            ext(ExtensionExpression::Round {
                value: col("a"),
                scale: Some(Box::new(Expression::integer(0)))
            }),
            "ROUND(t.a)"
        );
        assert_eq!(
            ext(ExtensionExpression::Round {
                value: col("a"),
                scale: Some(Box::new(Expression::integer(2)))
            }),
            "ROUND(t.a, 2)"
        );

        let bad_round = ExtensionExpression::Round {
            value: col("a"),
            scale: Some(col("b")),
        };
        let err = GenericDialect
            .process_extension(&bad_round, &SqlToStringConfig::default())
            .unwrap_err();
        assert!(err.is(crate::ErrorKind::TypeMismatch));
    }

    #[rstest]
    #[case("(a = b)", "a = b")]
    #[case("(a) AND (b)", "(a) AND (b)")]
    #[case("((a))", "(a)")]
    #[case("a", "a")]
    #[case("(a = ')(')", "a = ')('")]
    #[case("(a = 'it''s (')", "a = 'it''s ('")]
    #[case("(\"c)\" = 1)", "\"c)\" = 1")]
    #[case("('a') || ('b')", "('a') || ('b')")]
    fn test_strip_outer_parens(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_outer_parens(input), expected);
    }
}
