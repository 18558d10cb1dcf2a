//! Functions that combine two frames.
use std::str::FromStr;

use itertools::Itertools;

use legendql_sql::ast::{
    AliasedRelation, Expression, Join, JoinCriteria, JoinType, Query, QuerySpecification,
    Relation, Select, SelectItem, SingleColumn, TableSubquery, Union,
};
use legendql_sql::helpers::{create_sub_query, extract_columns_for_subquery};
use legendql_sql::DialectExtension;

use super::{check_boolean, name_list, pure_step, AppliedFunction};
use crate::language::expr::SqlScope;
use crate::language::{pure, Primitive, TdsRow};
use crate::tds::TdsFrame;
use crate::{Error, FrameToPureConfig, Result, WithErrorInfo};

/// Which unmatched rows a join keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    Inner,
    #[default]
    LeftOuter,
    RightOuter,
}

impl JoinKind {
    fn to_sql(self) -> JoinType {
        match self {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::LeftOuter => JoinType::Left,
            JoinKind::RightOuter => JoinType::Right,
        }
    }

    fn to_pure(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::LeftOuter => "LEFT",
            JoinKind::RightOuter => "RIGHT",
        }
    }
}

impl FromStr for JoinKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left_outer" | "leftouter" => Ok(JoinKind::LeftOuter),
            "right_outer" | "rightouter" => Ok(JoinKind::RightOuter),
            _ => Err(Error::validation(format!(
                "Unknown join type - {s}. Supported types are - INNER, LEFT_OUTER, RIGHT_OUTER"
            ))),
        }
    }
}

/// Evaluates a two-row closure over a left `l` and a right `r` row and
/// checks it yields a boolean.
fn evaluate_condition<F>(base: &TdsFrame, other: &TdsFrame, condition: F, what: &str) -> Result<Primitive>
where
    F: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
{
    let value = condition(&base.row("l"), &other.row("r"))
        .push_hint(format!("error occurred while evaluating the {what} function"))?;
    check_boolean(&value, &capitalize(what))?;
    Ok(value)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn check_disjoint_columns(base: &TdsFrame, other: &TdsFrame) -> Result<()> {
    let left = base.column_names();
    let right = other.column_names();
    if left.iter().any(|name| right.contains(name)) {
        return Err(Error::duplicate_column(format!(
            "Found duplicate columns in joined frames. Use rename function to ensure there are no duplicate columns in joined frames. Columns - Left Frame: {}, Right Frame: {}",
            name_list(&left),
            name_list(&right)
        )));
    }
    Ok(())
}

fn joined_columns(base: &TdsFrame, other: &TdsFrame) -> Vec<crate::TdsColumn> {
    base.columns().iter().chain(other.columns()).cloned().collect()
}

/// `{l, r | <condition>}`, rendered one level deeper than `config`.
fn pure_condition(condition: &Primitive, config: &FrameToPureConfig) -> String {
    pure::lambda("l, r", &condition.to_pure_expression(&config.push_indent(2)))
}

#[derive(Debug)]
pub(crate) struct JoinFunction {
    base: TdsFrame,
    other: TdsFrame,
    condition: Primitive,
    kind: JoinKind,
}

impl JoinFunction {
    pub fn apply<F>(base: &TdsFrame, other: &TdsFrame, condition: F, kind: JoinKind) -> Result<TdsFrame>
    where
        F: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
    {
        let condition = evaluate_condition(base, other, condition, "join condition")?;
        check_disjoint_columns(base, other)?;

        let function = JoinFunction {
            base: base.clone(),
            other: other.clone(),
            condition,
            kind,
        };
        Ok(TdsFrame::applied(base, joined_columns(base, other), function))
    }
}

impl AppliedFunction for JoinFunction {
    fn name(&self) -> &'static str {
        "join"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn tds_frame_parameters(&self) -> Vec<&TdsFrame> {
        vec![&self.other]
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let left = create_sub_query(&self.base.sql_query(extension)?, extension, "left", None)?;
        let right = create_sub_query(&self.other.sql_query(extension)?, extension, "right", None)?;

        let condition = {
            let scope = SqlScope::new(extension)
                .bind("l", &left)
                .bind("r", &right);
            self.condition.expr.to_sql(&scope)?
        };

        let select_items = left
            .select
            .select_items
            .iter()
            .chain(&right.select.select_items)
            .cloned()
            .collect();
        let (Some(left_relation), Some(right_relation)) =
            (left.from.into_iter().next(), right.from.into_iter().next())
        else {
            return Err(Error::new_assert("join sides must read from a sub-query"));
        };

        let join = QuerySpecification {
            select: Select {
                distinct: false,
                select_items,
            },
            from: vec![Relation::Join(Join {
                kind: self.kind.to_sql(),
                left: Box::new(left_relation),
                right: Box::new(right_relation),
                criteria: Some(JoinCriteria::On(condition)),
            })],
            ..Default::default()
        };
        create_sub_query(&join, extension, "root", None)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let step = format!(
            "->join({}{},{}JoinKind.{},{}{}{})",
            config.separator(2, false),
            self.other.pure_query(&config.push_indent(2)),
            config.separator(2, true),
            self.kind.to_pure(),
            config.separator(2, true),
            pure_condition(&self.condition, config),
            config.separator(1, false)
        );
        pure_step(&self.base, config, &step)
    }
}

#[derive(Debug)]
pub(crate) struct AsOfJoinFunction {
    base: TdsFrame,
    other: TdsFrame,
    matcher: Primitive,
    condition: Option<Primitive>,
}

impl AsOfJoinFunction {
    pub fn apply<M, F>(
        base: &TdsFrame,
        other: &TdsFrame,
        matcher: M,
        condition: Option<F>,
    ) -> Result<TdsFrame>
    where
        M: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
        F: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
    {
        let matcher = evaluate_condition(base, other, matcher, "asOfJoin match")?;
        let condition = condition
            .map(|c| evaluate_condition(base, other, c, "asOfJoin join condition"))
            .transpose()?;
        check_disjoint_columns(base, other)?;

        let function = AsOfJoinFunction {
            base: base.clone(),
            other: other.clone(),
            matcher,
            condition,
        };
        Ok(TdsFrame::applied(base, joined_columns(base, other), function))
    }
}

impl AppliedFunction for AsOfJoinFunction {
    fn name(&self) -> &'static str {
        "as_of_join"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn tds_frame_parameters(&self) -> Vec<&TdsFrame> {
        vec![&self.other]
    }

    fn to_sql(&self, _extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        Err(Error::unsupported("AsOfJoin SQL translation not supported yet"))
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let condition = match &self.condition {
            Some(condition) => format!(
                ",{}{}",
                config.separator(2, true),
                pure_condition(condition, config)
            ),
            None => String::new(),
        };
        let step = format!(
            "->asOfJoin({}{},{}{}{condition}{})",
            config.separator(2, false),
            self.other.pure_query(&config.push_indent(2)),
            config.separator(2, true),
            pure_condition(&self.matcher, config),
            config.separator(1, false)
        );
        pure_step(&self.base, config, &step)
    }
}

#[derive(Debug)]
pub(crate) struct ConcatenateFunction {
    base: TdsFrame,
    other: TdsFrame,
}

impl ConcatenateFunction {
    pub fn apply(base: &TdsFrame, other: &TdsFrame) -> Result<TdsFrame> {
        let (left, right) = (base.columns(), other.columns());
        if left.len() != right.len() {
            let describe = |columns: &[crate::TdsColumn]| {
                format!("(Count: {}) - [{}]", columns.len(), columns.iter().join(", "))
            };
            return Err(Error::validation(format!(
                "Cannot concatenate two Tds Frames with different column counts. \nFrame 1 cols - {} \nFrame 2 cols - {} \n",
                describe(left),
                describe(right)
            )));
        }
        for (index, (l, r)) in left.iter().zip(right).enumerate() {
            if l.name() != r.name() || l.primitive_type() != r.primitive_type() {
                return Err(Error::validation(format!(
                    "Column name/type mismatch when concatenating Tds Frames at index {index}. Frame 1 column - {l}, Frame 2 column - {r}"
                )));
            }
        }

        let function = ConcatenateFunction {
            base: base.clone(),
            other: other.clone(),
        };
        Ok(TdsFrame::applied(base, left.to_vec(), function))
    }
}

impl AppliedFunction for ConcatenateFunction {
    fn name(&self) -> &'static str {
        "concatenate"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn tds_frame_parameters(&self) -> Vec<&TdsFrame> {
        vec![&self.other]
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let left = create_sub_query(&self.base.sql_query(extension)?, extension, "left", None)?;
        let right = create_sub_query(&self.other.sql_query(extension)?, extension, "right", None)?;
        let columns = extract_columns_for_subquery(&left)?;

        let alias = extension.quote_identifier("root");
        let select_items = columns
            .iter()
            .map(|c| {
                SelectItem::SingleColumn(SingleColumn::new(
                    c.clone(),
                    Expression::column([alias.clone(), c.clone()]),
                ))
            })
            .collect();
        let union = Relation::Union(Union {
            left: Box::new(Relation::QuerySpecification(left)),
            right: Box::new(Relation::QuerySpecification(right)),
            distinct: false,
        });

        Ok(QuerySpecification {
            select: Select {
                distinct: false,
                select_items,
            },
            from: vec![Relation::AliasedRelation(AliasedRelation {
                relation: Box::new(Relation::TableSubquery(TableSubquery {
                    query: Box::new(Query::new(union)),
                })),
                alias,
                column_names: columns,
            })],
            ..Default::default()
        })
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let step = format!(
            "->concatenate({}{}{})",
            config.separator(2, false),
            self.other.pure_query(&config.push_indent(2)),
            config.separator(1, false)
        );
        pure_step(&self.base, config, &step)
    }
}
