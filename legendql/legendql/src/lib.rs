//! # legendql
//!
//! Typed, immutable TDS frame pipelines that render to SQL and to PURE.
//!
//! A pipeline starts at a source frame ([TdsFrame::table]) and grows by
//! applying transformations (`filter`, `extend`, `group_by`, `join`, ...).
//! Each transformation evaluates its closures once, against a [TdsRow] that
//! hands out typed [Primitive] expressions, and checks the result at
//! construction. Rendering is deferred until one of the emitters is called:
//!
//! ```ascii
//!   TdsFrame ──to_sql_query_object──► QuerySpecification ──generator──► SQL
//!      │
//!      └──────────────to_pure_query──────────────────────────────────► PURE
//! ```
//!
//! ```
//! # fn main() -> legendql::Result<()> {
//! use legendql::{FrameToSqlConfig, PrimitiveType, TdsColumn, TdsFrame};
//!
//! let frame = TdsFrame::table(
//!     ["db", "schema", "t"],
//!     vec![TdsColumn::new("c1", PrimitiveType::Integer)],
//! )?
//! .filter(|r| r.get("c1")?.gt(1))?;
//!
//! let sql = frame.to_sql_query(&FrameToSqlConfig::default().no_pretty())?;
//! assert_eq!(
//!     sql,
//!     r#"SELECT "root"."c1" AS "c1" FROM db.schema.t AS "root" WHERE ("root"."c1" > 1)"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! SQL rendering is parameterized by a database type, looked up in the
//! registry of [legendql_sql::generator]. Built-in tags are `Postgres`
//! (default), `Generic` and `MsSql`.
//!
//! ## Feature flags
//!
//! * `serde_yaml`: Enables reading and writing [FrameToSqlConfig] and
//!   [FrameToPureConfig] as YAML.

#![forbid(unsafe_code)]
#![allow(clippy::result_large_err)]

pub use legendql_sql::ast;
pub use legendql_sql::dialect;
pub use legendql_sql::generator;
pub use legendql_sql::{Dialect, DialectExtension, Error, ErrorKind, WithErrorInfo};

mod config;
pub mod language;
pub mod tds;

pub use config::{FrameToPureConfig, FrameToSqlConfig};
pub use language::{
    Collection, DurationUnit, FrameBound, LiteralValue, PartialFrame, PrecisePrimitiveType, Primitive,
    PrimitiveType, SortDirection, SortInfo, TdsRow, Window, WindowFrame, WindowFrameMode,
    WindowReference,
};
pub use tds::{
    tds_columns_from_json, EnumType, ExecutionService, JoinKind, NewColumn, TdsColumn, TdsFrame,
    WindowColumn,
};

pub type Result<T, E = Error> = core::result::Result<T, E>;
