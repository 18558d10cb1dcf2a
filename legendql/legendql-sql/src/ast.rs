//! Relational SQL metamodel.
//!
//! Every node owns its children by value. Column aliases and relation
//! aliases are stored already quoted for the dialect that produced them, so
//! name resolution downstream is a plain string comparison.

use enum_as_inner::EnumAsInner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualifiedName {
    pub parts: Vec<String>,
}

impl QualifiedName {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QualifiedName {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum Relation {
    Table(Table),
    AliasedRelation(AliasedRelation),
    TableSubquery(TableSubquery),
    Join(Join),
    TableFunction(TableFunction),
    Union(Union),
    QuerySpecification(QuerySpecification),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AliasedRelation {
    pub relation: Box<Relation>,
    pub alias: String,
    pub column_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableSubquery {
    pub query: Box<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
pub enum JoinType {
    #[strum(to_string = "CROSS JOIN")]
    Cross,
    #[strum(to_string = "INNER JOIN")]
    Inner,
    #[strum(to_string = "LEFT OUTER JOIN")]
    Left,
    #[strum(to_string = "RIGHT OUTER JOIN")]
    Right,
    #[strum(to_string = "FULL OUTER JOIN")]
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum JoinCriteria {
    On(Expression),
    Using(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Join {
    pub kind: JoinType,
    pub left: Box<Relation>,
    pub right: Box<Relation>,
    pub criteria: Option<JoinCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableFunction {
    pub function_call: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Union {
    pub left: Box<Relation>,
    pub right: Box<Relation>,
    pub distinct: bool,
}

/// A query body with optional top-level ordering and pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Query {
    pub body: Box<Relation>,
    pub order_by: Vec<SortItem>,
    pub limit: Option<Expression>,
    pub offset: Option<Expression>,
}

impl Query {
    pub fn new(body: Relation) -> Self {
        Query {
            body: Box::new(body),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuerySpecification {
    pub select: Select,
    pub from: Vec<Relation>,
    pub where_: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
    pub order_by: Vec<SortItem>,
    pub limit: Option<Expression>,
    pub offset: Option<Expression>,
}

impl QuerySpecification {
    /// Finds the expression projected under `alias` (an already quoted
    /// identifier).
    pub fn find_column(&self, alias: &str) -> Option<&Expression> {
        self.select.select_items.iter().find_map(|item| match item {
            SelectItem::SingleColumn(SingleColumn {
                alias: Some(a),
                expression,
            }) if a == alias => Some(expression),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Select {
    pub distinct: bool,
    pub select_items: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum SelectItem {
    AllColumns { prefix: Option<String> },
    SingleColumn(SingleColumn),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SingleColumn {
    pub alias: Option<String>,
    pub expression: Expression,
}

impl SingleColumn {
    pub fn new<S: Into<String>>(alias: S, expression: Expression) -> Self {
        SingleColumn {
            alias: Some(alias.into()),
            expression,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SortOrdering {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum NullOrdering {
    #[default]
    Undefined,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SortItem {
    pub sort_key: Expression,
    pub ordering: SortOrdering,
    pub null_ordering: NullOrdering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum Expression {
    Literal(Literal),
    QualifiedNameReference(QualifiedName),
    Comparison {
        operator: ComparisonOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    LogicalBinary {
        operator: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not(Box<Expression>),
    Arithmetic {
        operator: ArithmeticOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Negative(Box<Expression>),
    Cast {
        expression: Box<Expression>,
        column_type: ColumnType,
    },
    InList(Vec<Expression>),
    InPredicate {
        value: Box<Expression>,
        list: Box<Expression>,
    },
    IsNull(Box<Expression>),
    IsNotNull(Box<Expression>),
    CurrentTime {
        kind: CurrentTimeKind,
        precision: Option<u32>,
    },
    Extract {
        field: ExtractField,
        expression: Box<Expression>,
    },
    FunctionCall(FunctionCall),
    NamedArgument {
        name: String,
        expression: Box<Expression>,
    },
    SearchedCase {
        when_clauses: Vec<WhenClause>,
        default: Option<Box<Expression>>,
    },
    Window {
        nested: Box<Expression>,
        window: Window,
    },
    Subquery(Box<Query>),
    /// A raw token emitted verbatim, such as `CURRENT_USER`.
    Constant(String),
    Extension(ExtensionExpression),
}

impl Expression {
    pub fn integer(value: i64) -> Self {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn string<S: Into<String>>(value: S) -> Self {
        Expression::Literal(Literal::String {
            value: value.into(),
            quoted: false,
        })
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Literal::Boolean(value))
    }

    pub fn column<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expression::QualifiedNameReference(QualifiedName::new(parts))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::LogicalBinary {
            operator: LogicalOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String { value: String, quoted: bool },
    Null,
    Interval(IntervalLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntervalLiteral {
    pub amount: i64,
    pub unit: DurationUnit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DurationUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
pub enum ComparisonOperator {
    #[strum(to_string = "=")]
    Equal,
    #[strum(to_string = "<>")]
    NotEqual,
    #[strum(to_string = "<")]
    LessThan,
    #[strum(to_string = "<=")]
    LessThanOrEqual,
    #[strum(to_string = ">")]
    GreaterThan,
    #[strum(to_string = ">=")]
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    pub name: String,
    pub parameters: Vec<i64>,
}

impl ColumnType {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ColumnType {
            name: name.into(),
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CurrentTimeKind {
    Date,
    Time,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractField {
    Century,
    Year,
    Quarter,
    Month,
    Week,
    Day,
    DayOfMonth,
    DayOfWeek,
    Dow,
    DayOfYear,
    Doy,
    Hour,
    Minute,
    Second,
    Epoch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionCall {
    pub name: QualifiedName,
    pub distinct: bool,
    pub arguments: Vec<Expression>,
    pub filter: Option<Box<Expression>>,
    pub window: Option<Box<Window>>,
}

impl FunctionCall {
    pub fn new<S: Into<String>>(name: S, arguments: Vec<Expression>) -> Self {
        FunctionCall {
            name: QualifiedName::new([name.into()]),
            distinct: false,
            arguments,
            filter: None,
            window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WhenClause {
    pub operand: Expression,
    pub result: Expression,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Window {
    pub window_ref: Option<String>,
    pub partitions: Vec<Expression>,
    pub order_by: Vec<SortItem>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum WindowFrameMode {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WindowFrame {
    pub mode: WindowFrameMode,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FrameBoundType {
    UnboundedPreceding,
    Preceding,
    CurrentRow,
    Following,
    UnboundedFollowing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameBound {
    pub kind: FrameBoundType,
    pub value: Option<Box<Expression>>,
    pub duration_unit: Option<DurationUnit>,
}

/// Closed list of domain-specific expressions that dialects may render
/// differently from a plain function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum ExtensionExpression {
    StringLength(Box<Expression>),
    StringLike {
        value: Box<Expression>,
        pattern: Box<Expression>,
    },
    StringUpper(Box<Expression>),
    StringLower(Box<Expression>),
    StringTrim {
        value: Box<Expression>,
        kind: TrimKind,
    },
    StringPos {
        value: Box<Expression>,
        other: Box<Expression>,
    },
    StringConcat {
        first: Box<Expression>,
        second: Box<Expression>,
    },
    Math {
        function: MathFunction,
        value: Box<Expression>,
    },
    Power {
        first: Box<Expression>,
        second: Box<Expression>,
    },
    Remainder {
        first: Box<Expression>,
        second: Box<Expression>,
    },
    Round {
        value: Box<Expression>,
        scale: Option<Box<Expression>>,
    },
    ArcTan2 {
        first: Box<Expression>,
        second: Box<Expression>,
    },
    Aggregate {
        function: AggregateFunction,
        value: Box<Expression>,
    },
    JoinStrings {
        value: Box<Expression>,
        separator: Box<Expression>,
    },
    DateTrunc {
        part: DateTruncPart,
        value: Box<Expression>,
    },
    DatePart {
        field: DatePartField,
        value: Box<Expression>,
    },
    /// Shift a date by a fixed interval.
    DateAdjust {
        value: Box<Expression>,
        interval: IntervalLiteral,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TrimKind {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum MathFunction {
    Abs,
    Ceil,
    Floor,
    Sqrt,
    Cbrt,
    Exp,
    #[strum(to_string = "LN")]
    Log,
    Sin,
    Asin,
    Cos,
    Acos,
    Tan,
    Atan,
    Cot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
pub enum AggregateFunction {
    #[strum(to_string = "COUNT")]
    Count,
    #[strum(to_string = "COUNT")]
    DistinctCount,
    #[strum(to_string = "AVG")]
    Average,
    #[strum(to_string = "MAX")]
    Max,
    #[strum(to_string = "MIN")]
    Min,
    #[strum(to_string = "SUM")]
    Sum,
    #[strum(to_string = "STDDEV_SAMP")]
    StdDevSample,
    #[strum(to_string = "STDDEV_POP")]
    StdDevPopulation,
    #[strum(to_string = "VAR_SAMP")]
    VarianceSample,
    #[strum(to_string = "VAR_POP")]
    VariancePopulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DateTruncPart {
    FirstDayOfYear,
    FirstDayOfQuarter,
    FirstDayOfMonth,
    FirstDayOfWeek,
    FirstHourOfDay,
    FirstMinuteOfHour,
    FirstSecondOfMinute,
    FirstMillisecondOfSecond,
}

impl DateTruncPart {
    /// The `DATE_TRUNC` unit that yields this boundary.
    pub fn unit(&self) -> &'static str {
        match self {
            DateTruncPart::FirstDayOfYear => "year",
            DateTruncPart::FirstDayOfQuarter => "quarter",
            DateTruncPart::FirstDayOfMonth => "month",
            DateTruncPart::FirstDayOfWeek => "week",
            DateTruncPart::FirstHourOfDay => "day",
            DateTruncPart::FirstMinuteOfHour => "hour",
            DateTruncPart::FirstSecondOfMinute => "minute",
            DateTruncPart::FirstMillisecondOfSecond => "second",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DatePartField {
    Year,
    Quarter,
    Month,
    WeekOfYear,
    DayOfYear,
    DayOfMonth,
    DayOfWeek,
    Hour,
    Minute,
    Second,
    Epoch,
}

impl DatePartField {
    pub fn unit(&self) -> &'static str {
        match self {
            DatePartField::Year => "year",
            DatePartField::Quarter => "quarter",
            DatePartField::Month => "month",
            DatePartField::WeekOfYear => "week",
            DatePartField::DayOfYear => "doy",
            DatePartField::DayOfMonth => "day",
            DatePartField::DayOfWeek => "dow",
            DatePartField::Hour => "hour",
            DatePartField::Minute => "minute",
            DatePartField::Second => "second",
            DatePartField::Epoch => "epoch",
        }
    }
}
