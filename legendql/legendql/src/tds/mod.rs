//! TDS frames: immutable chains of tabular transformations.

mod column;
mod frame;
mod functions;

pub use column::{tds_columns_from_json, EnumType, TdsColumn};
pub use frame::{ExecutionService, TdsFrame};
pub use functions::{JoinKind, NewColumn, WindowColumn};
