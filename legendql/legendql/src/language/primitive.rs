use chrono::{NaiveDate, NaiveDateTime};

use legendql_sql::ast::{
    ComparisonOperator, DatePartField, DateTruncPart, DurationUnit, MathFunction, TrimKind,
};

use super::expr::{Expr, LiteralValue};
use super::operators::{LikeKind, Operator, ParseTarget};
use super::window::{SortDirection, SortInfo};
use super::PrimitiveType;
use crate::{Error, Result};

/// A typed expression, as handed out by [crate::TdsRow] and built up by the
/// methods below.
///
/// Every method checks operand types and returns a **TypeMismatch** error
/// instead of building an ill-typed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    ty: PrimitiveType,
    pub(crate) expr: Expr,
}

impl Primitive {
    pub(crate) fn new(ty: PrimitiveType, expr: Expr) -> Self {
        Primitive { ty, expr }
    }

    fn operation(ty: PrimitiveType, operator: Operator, operands: Vec<&Primitive>) -> Self {
        let operands = operands.into_iter().map(|p| p.expr.clone()).collect();
        Primitive::new(ty, Expr::operation(operator, operands))
    }

    pub fn literal(value: LiteralValue) -> Self {
        let ty = match &value {
            LiteralValue::Boolean(_) => PrimitiveType::Boolean,
            LiteralValue::Integer(_) => PrimitiveType::Integer,
            LiteralValue::Float(_) => PrimitiveType::Float,
            LiteralValue::String(_) => PrimitiveType::String,
            LiteralValue::StrictDate(_) => PrimitiveType::StrictDate,
            LiteralValue::DateTime(_) => PrimitiveType::DateTime,
        };
        Primitive::new(ty, Expr::Literal(value))
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.ty
    }

    /// The column this primitive reads, when it is a bare column reference.
    pub fn column_name(&self) -> Option<&str> {
        self.expr.column_name()
    }

    /// Whether PURE knows this value has multiplicity one.
    pub fn is_non_nullable(&self) -> bool {
        self.expr.is_non_nullable()
    }

    pub fn to_pure_expression(&self, config: &crate::FrameToPureConfig) -> String {
        self.expr.to_pure(config)
    }

    fn expect(&self, ok: bool, operation: &str, expected: &str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(Error::type_mismatch(format!(
                "{operation} expects {expected} operand, got {}",
                self.ty
            )))
        }
    }

    fn expect_numeric(&self, operation: &str) -> Result<()> {
        self.expect(self.ty.is_numeric(), operation, "a numeric")
    }

    fn expect_string(&self, operation: &str) -> Result<()> {
        self.expect(self.ty == PrimitiveType::String, operation, "a String")
    }

    fn expect_boolean(&self, operation: &str) -> Result<()> {
        self.expect(self.ty == PrimitiveType::Boolean, operation, "a Boolean")
    }

    fn expect_date(&self, operation: &str) -> Result<()> {
        self.expect(self.ty.is_date(), operation, "a date")
    }

    fn binary_numeric(
        &self,
        other: impl Into<Primitive>,
        operation: &str,
        operator: Operator,
    ) -> Result<Primitive> {
        let other = other.into();
        self.expect_numeric(operation)?;
        other.expect_numeric(operation)?;
        let ty = self.ty.arithmetic_result(other.ty);
        Ok(Primitive::operation(ty, operator, vec![self, &other]))
    }

    // arithmetic

    /// Numeric addition, or concatenation of two strings.
    pub fn add(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        if self.ty == PrimitiveType::String && other.ty == PrimitiveType::String {
            return Ok(Primitive::operation(
                PrimitiveType::String,
                Operator::Concat,
                vec![self, &other],
            ));
        }
        self.binary_numeric(other, "'+'", Operator::Add)
    }

    pub fn sub(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.binary_numeric(other, "'-'", Operator::Subtract)
    }

    pub fn mul(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.binary_numeric(other, "'*'", Operator::Multiply)
    }

    /// Division always has float semantics, so the result is a `Number`.
    pub fn div(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_numeric("'/'")?;
        other.expect_numeric("'/'")?;
        Ok(Primitive::operation(
            PrimitiveType::Number,
            Operator::Divide,
            vec![self, &other],
        ))
    }

    pub fn modulo(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        let integer = |p: &Primitive| p.expect(p.ty == PrimitiveType::Integer, "'%'", "an Integer");
        integer(self)?;
        integer(&other)?;
        Ok(Primitive::operation(
            PrimitiveType::Integer,
            Operator::Modulo,
            vec![self, &other],
        ))
    }

    pub fn neg(&self) -> Result<Primitive> {
        self.expect_numeric("negation")?;
        Ok(Primitive::operation(self.ty, Operator::Negate, vec![self]))
    }

    // math

    fn math(&self, function: MathFunction, ty: PrimitiveType) -> Result<Primitive> {
        self.expect_numeric(&format!("{function}"))?;
        Ok(Primitive::operation(ty, Operator::Math(function), vec![self]))
    }

    pub fn abs(&self) -> Result<Primitive> {
        self.math(MathFunction::Abs, self.ty)
    }

    pub fn ceil(&self) -> Result<Primitive> {
        self.math(MathFunction::Ceil, PrimitiveType::Integer)
    }

    pub fn floor(&self) -> Result<Primitive> {
        self.math(MathFunction::Floor, PrimitiveType::Integer)
    }

    pub fn sqrt(&self) -> Result<Primitive> {
        self.math(MathFunction::Sqrt, PrimitiveType::Float)
    }

    pub fn cbrt(&self) -> Result<Primitive> {
        self.math(MathFunction::Cbrt, PrimitiveType::Float)
    }

    pub fn exp(&self) -> Result<Primitive> {
        self.math(MathFunction::Exp, PrimitiveType::Float)
    }

    /// Natural logarithm.
    pub fn log(&self) -> Result<Primitive> {
        self.math(MathFunction::Log, PrimitiveType::Float)
    }

    pub fn sin(&self) -> Result<Primitive> {
        self.math(MathFunction::Sin, PrimitiveType::Float)
    }

    pub fn asin(&self) -> Result<Primitive> {
        self.math(MathFunction::Asin, PrimitiveType::Float)
    }

    pub fn cos(&self) -> Result<Primitive> {
        self.math(MathFunction::Cos, PrimitiveType::Float)
    }

    pub fn acos(&self) -> Result<Primitive> {
        self.math(MathFunction::Acos, PrimitiveType::Float)
    }

    pub fn tan(&self) -> Result<Primitive> {
        self.math(MathFunction::Tan, PrimitiveType::Float)
    }

    pub fn atan(&self) -> Result<Primitive> {
        self.math(MathFunction::Atan, PrimitiveType::Float)
    }

    pub fn cot(&self) -> Result<Primitive> {
        self.math(MathFunction::Cot, PrimitiveType::Float)
    }

    pub fn atan2(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_numeric("atan2")?;
        other.expect_numeric("atan2")?;
        Ok(Primitive::operation(
            PrimitiveType::Float,
            Operator::ArcTan2,
            vec![self, &other],
        ))
    }

    pub fn pow(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_numeric("pow")?;
        other.expect_numeric("pow")?;
        Ok(Primitive::operation(
            PrimitiveType::Number,
            Operator::Power,
            vec![self, &other],
        ))
    }

    pub fn rem(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_numeric("rem")?;
        other.expect_numeric("rem")?;
        Ok(Primitive::operation(
            self.ty.arithmetic_result(other.ty),
            Operator::Remainder,
            vec![self, &other],
        ))
    }

    /// Rounds to an integer, or to `scale` decimal places as a float.
    pub fn round(&self, scale: Option<i64>) -> Result<Primitive> {
        self.expect_numeric("round")?;
        Ok(match scale {
            None => Primitive::operation(PrimitiveType::Integer, Operator::Round, vec![self]),
            Some(scale) => Primitive::operation(
                PrimitiveType::Float,
                Operator::Round,
                vec![self, &Primitive::from(scale)],
            ),
        })
    }

    // comparison

    fn compare(&self, other: impl Into<Primitive>, operator: ComparisonOperator) -> Result<Primitive> {
        let other = other.into();
        if !self.ty.is_comparable_with(other.ty) {
            return Err(Error::type_mismatch(format!(
                "Cannot compare {} with {} using '{operator}'",
                self.ty, other.ty
            )));
        }
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::Compare(operator),
            vec![self, &other],
        ))
    }

    pub fn eq(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::Equal)
    }

    pub fn ne(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::NotEqual)
    }

    pub fn lt(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::LessThan)
    }

    pub fn le(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::LessThanOrEqual)
    }

    pub fn gt(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::GreaterThan)
    }

    pub fn ge(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        self.compare(other, ComparisonOperator::GreaterThanOrEqual)
    }

    // logic

    pub fn and(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_boolean("'&&'")?;
        other.expect_boolean("'&&'")?;
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::And,
            vec![self, &other],
        ))
    }

    pub fn or(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_boolean("'||'")?;
        other.expect_boolean("'||'")?;
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::Or,
            vec![self, &other],
        ))
    }

    pub fn not(&self) -> Result<Primitive> {
        self.expect_boolean("not")?;
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::Not,
            vec![self],
        ))
    }

    pub fn is_empty(&self) -> Primitive {
        Primitive::operation(PrimitiveType::Boolean, Operator::IsEmpty, vec![self])
    }

    pub fn is_not_empty(&self) -> Primitive {
        Primitive::operation(PrimitiveType::Boolean, Operator::IsNotEmpty, vec![self])
    }

    pub fn in_list<I, T>(&self, items: I) -> Result<Primitive>
    where
        I: IntoIterator<Item = T>,
        T: Into<Primitive>,
    {
        let items: Vec<Primitive> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(Error::validation("in_list needs at least one value"));
        }
        if let Some(item) = items.iter().find(|i| !self.ty.is_comparable_with(i.ty)) {
            return Err(Error::type_mismatch(format!(
                "in_list of {} cannot contain a {} value",
                self.ty, item.ty
            )));
        }
        let operands = std::iter::once(self).chain(items.iter()).collect();
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::InList,
            operands,
        ))
    }

    /// `CASE WHEN self THEN then ELSE otherwise END`
    pub fn if_else(
        &self,
        then: impl Into<Primitive>,
        otherwise: impl Into<Primitive>,
    ) -> Result<Primitive> {
        let (then, otherwise) = (then.into(), otherwise.into());
        self.expect_boolean("if_else")?;
        let ty = then.ty.common_with(otherwise.ty).ok_or_else(|| {
            Error::type_mismatch(format!(
                "if_else branches have incompatible types {} and {}",
                then.ty, otherwise.ty
            ))
        })?;
        Ok(Primitive::operation(
            ty,
            Operator::IfElse,
            vec![self, &then, &otherwise],
        ))
    }

    // strings

    fn string_op(&self, name: &str, operator: Operator, ty: PrimitiveType) -> Result<Primitive> {
        self.expect_string(name)?;
        Ok(Primitive::operation(ty, operator, vec![self]))
    }

    pub fn length(&self) -> Result<Primitive> {
        self.string_op("length", Operator::Length, PrimitiveType::Integer)
    }

    fn like(&self, kind: LikeKind, name: &str, value: &str) -> Result<Primitive> {
        self.expect_string(name)?;
        Ok(Primitive::operation(
            PrimitiveType::Boolean,
            Operator::Like(kind),
            vec![self, &Primitive::from(value)],
        ))
    }

    pub fn starts_with(&self, prefix: &str) -> Result<Primitive> {
        self.like(LikeKind::StartsWith, "starts_with", prefix)
    }

    pub fn ends_with(&self, suffix: &str) -> Result<Primitive> {
        self.like(LikeKind::EndsWith, "ends_with", suffix)
    }

    pub fn contains(&self, infix: &str) -> Result<Primitive> {
        self.like(LikeKind::Contains, "contains", infix)
    }

    pub fn upper(&self) -> Result<Primitive> {
        self.string_op("upper", Operator::Upper, PrimitiveType::String)
    }

    pub fn lower(&self) -> Result<Primitive> {
        self.string_op("lower", Operator::Lower, PrimitiveType::String)
    }

    pub fn ltrim(&self) -> Result<Primitive> {
        self.string_op("ltrim", Operator::Trim(TrimKind::Left), PrimitiveType::String)
    }

    pub fn rtrim(&self) -> Result<Primitive> {
        self.string_op("rtrim", Operator::Trim(TrimKind::Right), PrimitiveType::String)
    }

    pub fn trim(&self) -> Result<Primitive> {
        self.string_op("trim", Operator::Trim(TrimKind::Both), PrimitiveType::String)
    }

    pub fn index_of(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_string("index_of")?;
        other.expect_string("index_of")?;
        Ok(Primitive::operation(
            PrimitiveType::Integer,
            Operator::IndexOf,
            vec![self, &other],
        ))
    }

    pub fn concat(&self, other: impl Into<Primitive>) -> Result<Primitive> {
        let other = other.into();
        self.expect_string("concat")?;
        other.expect_string("concat")?;
        self.add(other)
    }

    pub fn parse_int(&self) -> Result<Primitive> {
        let op = Operator::Parse(ParseTarget::Integer);
        self.string_op("parse_int", op, PrimitiveType::Integer)
    }

    pub fn parse_float(&self) -> Result<Primitive> {
        let op = Operator::Parse(ParseTarget::Float);
        self.string_op("parse_float", op, PrimitiveType::Float)
    }

    pub fn parse_boolean(&self) -> Result<Primitive> {
        let op = Operator::Parse(ParseTarget::Boolean);
        self.string_op("parse_boolean", op, PrimitiveType::Boolean)
    }

    pub fn parse_datetime(&self) -> Result<Primitive> {
        let op = Operator::Parse(ParseTarget::DateTime);
        self.string_op("parse_datetime", op, PrimitiveType::DateTime)
    }

    /// The user the query runs as.
    pub fn current_user() -> Primitive {
        Primitive::new(
            PrimitiveType::String,
            Expr::operation(Operator::CurrentUser, vec![]),
        )
    }

    // dates

    fn date_trunc(&self, part: DateTruncPart, ty: PrimitiveType) -> Result<Primitive> {
        self.expect_date(&format!("{part:?}"))?;
        Ok(Primitive::operation(ty, Operator::DateTrunc(part), vec![self]))
    }

    fn date_part_of(&self, field: DatePartField) -> Result<Primitive> {
        self.expect_date(&format!("{field:?}"))?;
        Ok(Primitive::operation(
            PrimitiveType::Integer,
            Operator::DatePart(field),
            vec![self],
        ))
    }

    pub fn first_day_of_year(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstDayOfYear, PrimitiveType::Date)
    }

    pub fn first_day_of_quarter(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstDayOfQuarter, PrimitiveType::Date)
    }

    pub fn first_day_of_month(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstDayOfMonth, PrimitiveType::Date)
    }

    pub fn first_day_of_week(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstDayOfWeek, PrimitiveType::Date)
    }

    pub fn first_hour_of_day(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstHourOfDay, PrimitiveType::DateTime)
    }

    pub fn first_minute_of_hour(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstMinuteOfHour, PrimitiveType::DateTime)
    }

    pub fn first_second_of_minute(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstSecondOfMinute, PrimitiveType::DateTime)
    }

    pub fn first_millisecond_of_second(&self) -> Result<Primitive> {
        self.date_trunc(DateTruncPart::FirstMillisecondOfSecond, PrimitiveType::DateTime)
    }

    pub fn year(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Year)
    }

    pub fn quarter(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Quarter)
    }

    pub fn month(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Month)
    }

    pub fn week_of_year(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::WeekOfYear)
    }

    pub fn day_of_year(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::DayOfYear)
    }

    pub fn day_of_month(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::DayOfMonth)
    }

    pub fn day_of_week(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::DayOfWeek)
    }

    pub fn hour(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Hour)
    }

    pub fn minute(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Minute)
    }

    pub fn second(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Second)
    }

    /// Seconds since the unix epoch.
    pub fn epoch_value(&self) -> Result<Primitive> {
        self.date_part_of(DatePartField::Epoch)
    }

    /// Drops the time of day.
    pub fn date_part(&self) -> Result<Primitive> {
        self.expect_date("date_part")?;
        Ok(Primitive::operation(
            PrimitiveType::StrictDate,
            Operator::DateOnly,
            vec![self],
        ))
    }

    pub fn today() -> Primitive {
        Primitive::new(
            PrimitiveType::StrictDate,
            Expr::operation(Operator::Today, vec![]),
        )
    }

    pub fn now() -> Primitive {
        Primitive::new(
            PrimitiveType::DateTime,
            Expr::operation(Operator::Now, vec![]),
        )
    }

    /// Shifts a date by `amount` units.
    pub fn adjust(&self, amount: i64, unit: DurationUnit) -> Result<Primitive> {
        self.expect_date("adjust")?;
        let whole_days = matches!(
            unit,
            DurationUnit::Year | DurationUnit::Month | DurationUnit::Week | DurationUnit::Day
        );
        let ty = match self.ty {
            PrimitiveType::StrictDate if whole_days => PrimitiveType::StrictDate,
            PrimitiveType::DateTime => PrimitiveType::DateTime,
            _ if !whole_days => PrimitiveType::DateTime,
            _ => PrimitiveType::Date,
        };
        Ok(Primitive::operation(
            ty,
            Operator::Adjust { amount, unit },
            vec![self],
        ))
    }

    // sorting

    fn sort_info(&self, direction: SortDirection) -> Result<SortInfo> {
        let column = self.column_name().ok_or_else(|| {
            Error::type_mismatch("Sort direction can only be applied to a column reference")
        })?;
        Ok(SortInfo::new(column, direction))
    }

    pub fn ascending(&self) -> Result<SortInfo> {
        self.sort_info(SortDirection::Ascending)
    }

    pub fn descending(&self) -> Result<SortInfo> {
        self.sort_info(SortDirection::Descending)
    }
}

impl From<LiteralValue> for Primitive {
    fn from(value: LiteralValue) -> Self {
        Primitive::literal(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::literal(LiteralValue::Boolean(value))
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::literal(LiteralValue::Integer(value.into()))
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::literal(LiteralValue::Integer(value))
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::literal(LiteralValue::Float(value))
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::literal(LiteralValue::String(value.to_string()))
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::literal(LiteralValue::String(value))
    }
}

impl From<NaiveDate> for Primitive {
    fn from(value: NaiveDate) -> Self {
        Primitive::literal(LiteralValue::StrictDate(value))
    }
}

impl From<NaiveDateTime> for Primitive {
    fn from(value: NaiveDateTime) -> Self {
        Primitive::literal(LiteralValue::DateTime(value))
    }
}

impl From<&Primitive> for Primitive {
    fn from(value: &Primitive) -> Self {
        value.clone()
    }
}
