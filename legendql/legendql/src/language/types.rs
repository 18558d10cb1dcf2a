//! Primitive type lattice.
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Type of a column or of a primitive expression.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum PrimitiveType {
    Boolean,
    String,
    Number,
    Integer,
    Float,
    Decimal,
    Date,
    DateTime,
    StrictDate,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveType::Number
                | PrimitiveType::Integer
                | PrimitiveType::Float
                | PrimitiveType::Decimal
        )
    }

    pub fn is_date(self) -> bool {
        matches!(
            self,
            PrimitiveType::Date | PrimitiveType::DateTime | PrimitiveType::StrictDate
        )
    }

    /// Whether values of the two types can be compared with each other.
    pub fn is_comparable_with(self, other: PrimitiveType) -> bool {
        (self.is_numeric() && other.is_numeric())
            || (self.is_date() && other.is_date())
            || self == other
    }

    /// Result type of `+`, `-` and `*` over two numeric operands.
    pub(crate) fn arithmetic_result(self, other: PrimitiveType) -> PrimitiveType {
        match (self, other) {
            (PrimitiveType::Integer, PrimitiveType::Integer) => PrimitiveType::Integer,
            (PrimitiveType::Float, _) | (_, PrimitiveType::Float) => PrimitiveType::Float,
            (PrimitiveType::Decimal, PrimitiveType::Decimal)
            | (PrimitiveType::Decimal, PrimitiveType::Integer)
            | (PrimitiveType::Integer, PrimitiveType::Decimal) => PrimitiveType::Decimal,
            _ => PrimitiveType::Number,
        }
    }

    /// Nearest common type, used by `if_else` branches and `in_list` items.
    pub(crate) fn common_with(self, other: PrimitiveType) -> Option<PrimitiveType> {
        if self == other {
            Some(self)
        } else if self.is_numeric() && other.is_numeric() {
            Some(PrimitiveType::Number)
        } else if self.is_date() && other.is_date() {
            Some(PrimitiveType::Date)
        } else {
            None
        }
    }
}

/// Storage refinement of a [PrimitiveType].
///
/// A column typed with a precise type keeps behaving as its base type in
/// expressions; the refinement only travels with the column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PrecisePrimitiveType {
    TinyInt,
    UTinyInt,
    SmallInt,
    USmallInt,
    Int,
    UInt,
    BigInt,
    UBigInt,
    Varchar(Option<u32>),
    Timestamp,
    Float4,
    Double,
    Numeric { precision: u32, scale: u32 },
}

impl PrecisePrimitiveType {
    pub fn numeric(precision: u32, scale: u32) -> Result<Self> {
        if precision < scale {
            return Err(Error::validation(format!(
                "Numeric precision ({precision}) cannot be less than its scale ({scale})"
            )));
        }
        Ok(PrecisePrimitiveType::Numeric { precision, scale })
    }

    /// The primitive type this refinement narrows.
    pub fn base_type(&self) -> PrimitiveType {
        match self {
            PrecisePrimitiveType::TinyInt
            | PrecisePrimitiveType::UTinyInt
            | PrecisePrimitiveType::SmallInt
            | PrecisePrimitiveType::USmallInt
            | PrecisePrimitiveType::Int
            | PrecisePrimitiveType::UInt
            | PrecisePrimitiveType::BigInt
            | PrecisePrimitiveType::UBigInt => PrimitiveType::Integer,
            PrecisePrimitiveType::Varchar(_) => PrimitiveType::String,
            PrecisePrimitiveType::Timestamp => PrimitiveType::DateTime,
            PrecisePrimitiveType::Float4 | PrecisePrimitiveType::Double => PrimitiveType::Float,
            PrecisePrimitiveType::Numeric { .. } => PrimitiveType::Decimal,
        }
    }

    /// Parses the type names used by schema documents, such as `Varchar(200)`
    /// or `Numeric(10, 2)`.
    pub fn parse(name: &str) -> Result<Self> {
        let (head, args) = match name.split_once('(') {
            Some((head, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| Error::validation(format!("Unknown precise type - {name}")))?
                    .split(',')
                    .map(|a| a.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| Error::validation(format!("Unknown precise type - {name}")))?;
                (head.trim(), args)
            }
            None => (name.trim(), Vec::new()),
        };

        Ok(match (head, args.as_slice()) {
            ("TinyInt", []) => PrecisePrimitiveType::TinyInt,
            ("UTinyInt", []) => PrecisePrimitiveType::UTinyInt,
            ("SmallInt", []) => PrecisePrimitiveType::SmallInt,
            ("USmallInt", []) => PrecisePrimitiveType::USmallInt,
            ("Int", []) => PrecisePrimitiveType::Int,
            ("UInt", []) => PrecisePrimitiveType::UInt,
            ("BigInt", []) => PrecisePrimitiveType::BigInt,
            ("UBigInt", []) => PrecisePrimitiveType::UBigInt,
            ("Varchar", []) => PrecisePrimitiveType::Varchar(None),
            ("Varchar", [len]) => PrecisePrimitiveType::Varchar(Some(*len)),
            ("Timestamp", []) => PrecisePrimitiveType::Timestamp,
            ("Float4", []) => PrecisePrimitiveType::Float4,
            ("Double", []) => PrecisePrimitiveType::Double,
            ("Numeric", [precision, scale]) => PrecisePrimitiveType::numeric(*precision, *scale)?,
            _ => return Err(Error::validation(format!("Unknown precise type - {name}"))),
        })
    }
}

impl fmt::Display for PrecisePrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisePrimitiveType::Varchar(Some(len)) => write!(f, "Varchar({len})"),
            PrecisePrimitiveType::Varchar(None) => f.write_str("Varchar"),
            PrecisePrimitiveType::Numeric { precision, scale } => {
                write!(f, "Numeric({precision}, {scale})")
            }
            other => write!(f, "{other:?}"),
        }
    }
}
