//! Sort keys, window specifications and the closure parameters of
//! `window_extend`.
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use legendql_sql::ast::{self, DurationUnit, Expression, FrameBoundType, NullOrdering};
use legendql_sql::ast::{SortItem, SortOrdering, WindowFrameMode};

use super::expr::{Expr, RowAccessor, SqlScope};
use super::operators::{duration_unit_name, Operator, RankFunction};
use super::pure::escape_column_name;
use super::row::TdsRow;
use super::{Primitive, PrimitiveType};
use crate::config::FrameToPureConfig;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A column to sort by, with its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortInfo {
    pub column: String,
    pub direction: SortDirection,
}

impl SortInfo {
    pub fn new<S: Into<String>>(column: S, direction: SortDirection) -> Self {
        SortInfo {
            column: column.into(),
            direction,
        }
    }

    pub fn asc<S: Into<String>>(column: S) -> Self {
        SortInfo::new(column, SortDirection::Ascending)
    }

    pub fn desc<S: Into<String>>(column: S) -> Self {
        SortInfo::new(column, SortDirection::Descending)
    }

    pub(crate) fn to_sql(&self, scope: &SqlScope, frame: &str) -> Result<SortItem> {
        Ok(SortItem {
            sort_key: scope.resolve(frame, &self.column)?,
            ordering: match self.direction {
                SortDirection::Ascending => SortOrdering::Ascending,
                SortDirection::Descending => SortOrdering::Descending,
            },
            null_ordering: NullOrdering::Undefined,
        })
    }

    pub(crate) fn to_pure(&self) -> String {
        let func = match self.direction {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        };
        format!("{func}(~{})", escape_column_name(&self.column))
    }
}

impl From<&str> for SortInfo {
    fn from(column: &str) -> Self {
        SortInfo::asc(column)
    }
}

impl From<String> for SortInfo {
    fn from(column: String) -> Self {
        SortInfo::asc(column)
    }
}

/// One end of a window frame.
///
/// Offsets count rows (or range units): negative values precede the current
/// row, zero is the current row and positive values follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameBound {
    Unbounded,
    Offset {
        value: i64,
        unit: Option<DurationUnit>,
    },
}

impl FrameBound {
    pub fn offset(value: i64) -> Self {
        FrameBound::Offset { value, unit: None }
    }

    pub fn duration(value: i64, unit: DurationUnit) -> Self {
        FrameBound::Offset {
            value,
            unit: Some(unit),
        }
    }

    fn to_sql(self, is_start: bool) -> ast::FrameBound {
        let (kind, value, duration_unit) = match self {
            FrameBound::Unbounded if is_start => (FrameBoundType::UnboundedPreceding, None, None),
            FrameBound::Unbounded => (FrameBoundType::UnboundedFollowing, None, None),
            FrameBound::Offset { value: 0, unit } => (FrameBoundType::CurrentRow, None, unit),
            FrameBound::Offset { value, unit } => {
                let kind = if value < 0 {
                    FrameBoundType::Preceding
                } else {
                    FrameBoundType::Following
                };
                (kind, Some(Box::new(Expression::integer(value.abs()))), unit)
            }
        };
        ast::FrameBound {
            kind,
            value,
            duration_unit,
        }
    }

    fn to_pure(self) -> String {
        match self {
            FrameBound::Unbounded => "unbounded()".to_string(),
            FrameBound::Offset { value, unit: None } => value.to_string(),
            FrameBound::Offset {
                value,
                unit: Some(unit),
            } => format!("{value}, {}", duration_unit_name(unit)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub mode: WindowFrameMode,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl WindowFrame {
    pub fn rows(start: FrameBound, end: FrameBound) -> Self {
        WindowFrame {
            mode: WindowFrameMode::Rows,
            start,
            end,
        }
    }

    pub fn range(start: FrameBound, end: FrameBound) -> Self {
        WindowFrame {
            mode: WindowFrameMode::Range,
            start,
            end,
        }
    }

    fn to_sql(self) -> ast::WindowFrame {
        ast::WindowFrame {
            mode: self.mode,
            start: self.start.to_sql(true),
            end: Some(self.end.to_sql(false)),
        }
    }

    fn to_pure(self) -> String {
        let func = match self.mode {
            WindowFrameMode::Rows => "rows",
            WindowFrameMode::Range => "_range",
        };
        format!("{func}({}, {})", self.start.to_pure(), self.end.to_pure())
    }
}

/// Partitioning, ordering and framing of a window function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub partition_by: Vec<String>,
    pub order_by: Vec<SortInfo>,
    pub frame: Option<WindowFrame>,
}

impl Window {
    pub fn new() -> Self {
        Window::default()
    }

    pub fn partition_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SortInfo>,
    {
        self.order_by = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Every column the window reads.
    pub(crate) fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.partition_by
            .iter()
            .map(String::as_str)
            .chain(self.order_by.iter().map(|s| s.column.as_str()))
    }

    pub(crate) fn to_sql(&self, scope: &SqlScope, frame: &str) -> Result<ast::Window> {
        Ok(ast::Window {
            window_ref: None,
            partitions: self
                .partition_by
                .iter()
                .map(|c| scope.resolve(frame, c))
                .collect::<Result<_>>()?,
            order_by: self
                .order_by
                .iter()
                .map(|s| s.to_sql(scope, frame))
                .collect::<Result<_>>()?,
            frame: self.frame.map(WindowFrame::to_sql),
        })
    }

    pub(crate) fn to_pure(&self, _config: &FrameToPureConfig) -> String {
        let partitions = if self.partition_by.is_empty() {
            "[]".to_string()
        } else {
            format!(
                "~[{}]",
                self.partition_by.iter().map(|c| escape_column_name(c)).join(", ")
            )
        };
        let order_by = format!("[{}]", self.order_by.iter().map(SortInfo::to_pure).join(", "));
        match self.frame {
            Some(frame) => format!("over({partitions}, {order_by}, {})", frame.to_pure()),
            None => format!("over({partitions}, {order_by})"),
        }
    }
}

/// The `w` parameter of a `window_extend` closure.
#[derive(Debug, Clone, Copy)]
pub struct WindowReference {
    _private: (),
}

impl WindowReference {
    pub(crate) fn new() -> Self {
        WindowReference { _private: () }
    }
}

/// The `p` parameter of a `window_extend` closure: ranking functions and
/// offset access to other rows of the partition.
///
/// Ranking helpers return the bare function call; `window_extend` attaches
/// its window to every column it computes.
#[derive(Debug, Clone, Copy)]
pub struct PartialFrame {
    _private: (),
}

impl PartialFrame {
    pub(crate) fn new() -> Self {
        PartialFrame { _private: () }
    }

    fn rank_fn(&self, function: RankFunction, ty: PrimitiveType) -> Primitive {
        Primitive::new(ty, Expr::operation(Operator::Rank(function), vec![]))
    }

    pub fn row_number(&self, _row: &TdsRow) -> Primitive {
        self.rank_fn(RankFunction::RowNumber, PrimitiveType::Integer)
    }

    pub fn rank(&self, _window: &WindowReference, _row: &TdsRow) -> Primitive {
        self.rank_fn(RankFunction::Rank, PrimitiveType::Integer)
    }

    pub fn dense_rank(&self, _window: &WindowReference, _row: &TdsRow) -> Primitive {
        self.rank_fn(RankFunction::DenseRank, PrimitiveType::Integer)
    }

    pub fn percent_rank(&self, _window: &WindowReference, _row: &TdsRow) -> Primitive {
        self.rank_fn(RankFunction::PercentRank, PrimitiveType::Float)
    }

    pub fn cume_dist(&self, _window: &WindowReference, _row: &TdsRow) -> Primitive {
        self.rank_fn(RankFunction::CumeDist, PrimitiveType::Float)
    }

    /// Splits the partition into `buckets` groups and numbers them from 1.
    pub fn ntile(&self, _row: &TdsRow, buckets: i64) -> Result<Primitive> {
        if buckets < 1 {
            return Err(Error::validation(format!(
                "Number of buckets argument of ntile function must be positive. Buckets: {buckets}"
            )));
        }
        Ok(self.rank_fn(RankFunction::Ntile(buckets), PrimitiveType::Integer))
    }

    pub fn lead<'a>(&self, row: &TdsRow<'a>) -> TdsRow<'a> {
        row.with_accessor(RowAccessor::Lead)
    }

    pub fn lag<'a>(&self, row: &TdsRow<'a>) -> TdsRow<'a> {
        row.with_accessor(RowAccessor::Lag)
    }

    pub fn first<'a>(&self, _window: &WindowReference, row: &TdsRow<'a>) -> TdsRow<'a> {
        row.with_accessor(RowAccessor::First)
    }

    pub fn last<'a>(&self, _window: &WindowReference, row: &TdsRow<'a>) -> TdsRow<'a> {
        row.with_accessor(RowAccessor::Last)
    }

    pub fn nth<'a>(&self, _window: &WindowReference, row: &TdsRow<'a>, n: i64) -> TdsRow<'a> {
        row.with_accessor(RowAccessor::Nth(n))
    }
}
