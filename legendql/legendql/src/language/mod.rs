//! Expression language used inside frame closures.
//!
//! Closures receive a [TdsRow] (or, for aggregations, a [Collection]) and
//! return a [Primitive]. Primitives are type-checked when they are built and
//! render themselves to both SQL expressions and PURE text.

mod collection;
pub(crate) mod expr;
pub(crate) mod operators;
mod primitive;
pub(crate) mod pure;
mod row;
mod types;
mod window;

pub use legendql_sql::ast::{DurationUnit, WindowFrameMode};

pub use collection::Collection;
pub use expr::LiteralValue;
pub use primitive::Primitive;
pub use row::TdsRow;
pub use types::{PrecisePrimitiveType, PrimitiveType};
pub use window::{
    FrameBound, PartialFrame, SortDirection, SortInfo, Window, WindowFrame, WindowReference,
};
