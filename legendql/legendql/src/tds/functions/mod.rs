//! Frame transformations.
//!
//! Each transformation validates its arguments when it is applied and knows
//! how to translate itself to SQL (on top of the translation of its base
//! frames) and to PURE.
//!
//! SQL translation follows one rule: a transformation adds its clauses to the
//! base query unless one of the base's clauses would change their meaning, in
//! which case the base is first wrapped as a sub-query aliased `root`.

mod extend;
mod filter;
mod group_by;
mod join;
mod paging;
mod project;
mod select;
mod source;

use std::fmt::Debug;

use itertools::Itertools;

use legendql_sql::ast::{Expression, QuerySpecification, SelectItem, SingleColumn};
use legendql_sql::helpers::{create_sub_query, has_any_clause, Clause};
use legendql_sql::DialectExtension;

use super::{TdsColumn, TdsFrame};
use crate::language::pure;
use crate::language::{Collection, PartialFrame, Primitive, TdsRow, WindowReference};
use crate::{Error, FrameToPureConfig, Result, WithErrorInfo};

pub(crate) use extend::{ExtendFunction, WindowExtendFunction};
pub(crate) use filter::FilterFunction;
pub(crate) use group_by::GroupByFunction;
pub(crate) use join::{AsOfJoinFunction, ConcatenateFunction, JoinFunction};
pub use join::JoinKind;
pub(crate) use paging::{DropFunction, LimitFunction, SliceFunction, SortFunction};
pub(crate) use project::ProjectFunction;
pub(crate) use select::{DistinctFunction, RenameFunction, SelectFunction};
pub(crate) use source::TableSourceFunction;

/// A node of the frame chain.
pub(crate) trait AppliedFunction: Debug + Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// The frame this function was applied to; `None` for sources.
    fn base_frame(&self) -> Option<&TdsFrame>;

    /// Frames read besides the base, such as the right side of a join.
    fn tds_frame_parameters(&self) -> Vec<&TdsFrame> {
        Vec::new()
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification>;

    fn to_pure(&self, config: &FrameToPureConfig) -> String;
}

type RowFn<'f> = Box<dyn FnOnce(&TdsRow) -> Result<Primitive> + 'f>;
type AggregateFn<'f> = Box<dyn FnOnce(&Collection) -> Result<Primitive> + 'f>;
type WindowFn<'f> =
    Box<dyn FnOnce(&PartialFrame, &WindowReference, &TdsRow) -> Result<Primitive> + 'f>;

/// A column computed by `extend`, `project` or `group_by`.
///
/// The map closure computes a value per row. An aggregated column also
/// reduces those values with an aggregation closure; `extend` then computes
/// the aggregate over the whole frame, `group_by` per group.
pub struct NewColumn<'f> {
    name: String,
    map: RowFn<'f>,
    aggregate: Option<AggregateFn<'f>>,
}

impl<'f> NewColumn<'f> {
    pub fn new<S, F>(name: S, map: F) -> Self
    where
        S: Into<String>,
        F: FnOnce(&TdsRow) -> Result<Primitive> + 'f,
    {
        NewColumn {
            name: name.into(),
            map: Box::new(map),
            aggregate: None,
        }
    }

    pub fn aggregated<S, F, A>(name: S, map: F, aggregate: A) -> Self
    where
        S: Into<String>,
        F: FnOnce(&TdsRow) -> Result<Primitive> + 'f,
        A: FnOnce(&Collection) -> Result<Primitive> + 'f,
    {
        NewColumn {
            name: name.into(),
            map: Box::new(map),
            aggregate: Some(Box::new(aggregate)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_aggregated(&self) -> bool {
        self.aggregate.is_some()
    }

    fn evaluate(self, row: &TdsRow, function: &str) -> Result<EvaluatedColumn> {
        let name = self.name;
        let map = (self.map)(row).push_hint(format!(
            "error occurred while evaluating the '{function}' lambda of column '{name}'"
        ))?;
        let aggregate = self
            .aggregate
            .map(|aggregate| evaluate_aggregate(aggregate, &map, function, &name))
            .transpose()?;
        Ok(EvaluatedColumn {
            name,
            map,
            aggregate,
        })
    }
}

/// A column computed by `window_extend`.
pub struct WindowColumn<'f> {
    name: String,
    map: WindowFn<'f>,
    aggregate: Option<AggregateFn<'f>>,
}

impl<'f> WindowColumn<'f> {
    pub fn new<S, F>(name: S, map: F) -> Self
    where
        S: Into<String>,
        F: FnOnce(&PartialFrame, &WindowReference, &TdsRow) -> Result<Primitive> + 'f,
    {
        WindowColumn {
            name: name.into(),
            map: Box::new(map),
            aggregate: None,
        }
    }

    pub fn aggregated<S, F, A>(name: S, map: F, aggregate: A) -> Self
    where
        S: Into<String>,
        F: FnOnce(&PartialFrame, &WindowReference, &TdsRow) -> Result<Primitive> + 'f,
        A: FnOnce(&Collection) -> Result<Primitive> + 'f,
    {
        WindowColumn {
            name: name.into(),
            map: Box::new(map),
            aggregate: Some(Box::new(aggregate)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(self, row: &TdsRow) -> Result<EvaluatedColumn> {
        let name = self.name;
        let map = (self.map)(&PartialFrame::new(), &WindowReference::new(), row).push_hint(
            format!("error occurred while evaluating the 'window_extend' lambda of column '{name}'"),
        )?;
        let aggregate = self
            .aggregate
            .map(|aggregate| evaluate_aggregate(aggregate, &map, "window_extend", &name))
            .transpose()?;
        Ok(EvaluatedColumn {
            name,
            map,
            aggregate,
        })
    }
}

fn evaluate_aggregate(
    aggregate: AggregateFn,
    map: &Primitive,
    function: &str,
    name: &str,
) -> Result<Primitive> {
    aggregate(&Collection::new(map.clone())).push_hint(format!(
        "error occurred while evaluating the '{function}' aggregation lambda of column '{name}'"
    ))
}

/// A new column whose closures have been evaluated.
#[derive(Debug, Clone)]
pub(crate) struct EvaluatedColumn {
    name: String,
    map: Primitive,
    aggregate: Option<Primitive>,
}

impl EvaluatedColumn {
    /// The value the column holds: the aggregate when there is one.
    fn value(&self) -> &Primitive {
        self.aggregate.as_ref().unwrap_or(&self.map)
    }

    fn tds_column(&self) -> TdsColumn {
        TdsColumn::new(self.name.clone(), self.value().primitive_type())
    }

    /// `name:{params | map}` or `name:{params | map}:{c | aggregate}`.
    fn to_pure(&self, params: &str, config: &FrameToPureConfig) -> String {
        let name = pure::escape_column_name(&self.name);
        let map = pure::lambda(params, &self.map.to_pure_expression(config));
        match &self.aggregate {
            None => format!("{name}:{map}"),
            Some(aggregate) => {
                let aggregate = pure::lambda("c", &aggregate.to_pure_expression(config));
                format!("{name}:{map}:{aggregate}")
            }
        }
    }
}

// validation helpers

/// `['a', 'b']`
fn name_list<S: AsRef<str>>(names: &[S]) -> String {
    format!("[{}]", names.iter().map(|n| format!("'{}'", n.as_ref())).join(", "))
}

fn find_column<'a>(columns: &'a [TdsColumn], name: &str) -> Option<&'a TdsColumn> {
    columns.iter().find(|c| c.name() == name)
}

/// Checks that every name in `names` is a column of `frame`.
fn check_columns_exist(frame: &TdsFrame, names: &[String], context: &str) -> Result<()> {
    for name in names {
        if find_column(frame.columns(), name).is_none() {
            return Err(Error::unknown_column(format!(
                "Column - '{name}' in {context} columns list doesn't exist in the current frame. Current frame columns: {}",
                name_list(&frame.column_names())
            )));
        }
    }
    Ok(())
}

fn has_duplicates<S: AsRef<str>>(names: &[S]) -> bool {
    !names.iter().map(AsRef::<str>::as_ref).all_unique()
}

/// New column names must be unique and must not shadow base columns.
fn check_new_column_names<S: AsRef<str>>(base: &TdsFrame, names: &[S]) -> Result<()> {
    if has_duplicates(names) {
        return Err(Error::duplicate_column(format!(
            "Extend column names list has duplicates: {}",
            name_list(names)
        )));
    }
    for name in names.iter().map(AsRef::<str>::as_ref) {
        if find_column(base.columns(), name).is_some() {
            return Err(Error::duplicate_column(format!(
                "Extend column name - '{name}' already exists in base frame"
            )));
        }
    }
    Ok(())
}

fn check_boolean(value: &Primitive, function: &str) -> Result<()> {
    if value.primitive_type() != crate::PrimitiveType::Boolean {
        return Err(Error::type_mismatch(format!(
            "{function} function incompatible. Returns non boolean - {}",
            value.primitive_type()
        )));
    }
    Ok(())
}

// sql helpers

/// `base`, wrapped as a `root` sub-query when `wrap` holds.
fn sub_query_if(
    base: QuerySpecification,
    extension: &dyn DialectExtension,
    wrap: bool,
) -> Result<QuerySpecification> {
    if wrap {
        create_sub_query(&base, extension, "root", None)
    } else {
        Ok(base)
    }
}

/// `base`, wrapped as a `root` sub-query when it has any of `clauses`.
fn sub_query_on(
    base: QuerySpecification,
    extension: &dyn DialectExtension,
    clauses: &[Clause],
) -> Result<QuerySpecification> {
    let wrap = has_any_clause(&base, clauses);
    sub_query_if(base, extension, wrap)
}

/// Whether any projected column is a window function call.
fn projects_window(query: &QuerySpecification) -> bool {
    query.select.select_items.iter().any(|item| {
        matches!(
            item,
            SelectItem::SingleColumn(SingleColumn {
                expression: Expression::Window { .. },
                ..
            })
        )
    })
}

fn column_item(extension: &dyn DialectExtension, name: &str, expression: Expression) -> SelectItem {
    SelectItem::SingleColumn(SingleColumn::new(
        extension.quote_identifier(name),
        expression,
    ))
}

/// Keeps the select items aliased by `names`, in the order of `names`.
fn retain_columns(
    query: &mut QuerySpecification,
    extension: &dyn DialectExtension,
    names: &[String],
) -> Result<()> {
    let mut items = std::mem::take(&mut query.select.select_items);
    let mut retained = Vec::with_capacity(names.len());
    for name in names {
        let alias = extension.quote_identifier(name);
        let position = items
            .iter()
            .position(|item| matches!(item, SelectItem::SingleColumn(c) if c.alias.as_deref() == Some(alias.as_str())))
            .ok_or_else(|| Error::new_assert(format!("Cannot find column: {name}")))?;
        retained.push(items.swap_remove(position));
    }
    query.select.select_items = retained;
    Ok(())
}

// pure helpers

/// `<base>` followed by `step` on its own line.
fn pure_step(base: &TdsFrame, config: &FrameToPureConfig, step: &str) -> String {
    format!("{}{}{step}", base.pure_query(config), config.separator(1, false))
}

/// `~[a, b]`, with one item per line in pretty mode.
fn pure_column_list(items: &[String], config: &FrameToPureConfig) -> String {
    format!(
        "~[{}{}{}]",
        config.separator(2, false),
        items.join(&format!(",{}", config.separator(2, true))),
        config.separator(1, false)
    )
}

/// `~a` for one column, otherwise the [pure_column_list].
fn pure_columns(items: &[String], config: &FrameToPureConfig) -> String {
    match items {
        [single] => format!("~{single}"),
        _ => pure_column_list(items, config),
    }
}
