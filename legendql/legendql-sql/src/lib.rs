//! Relational SQL layer of LegendQL.
//!
//! Holds the SQL metamodel ([ast]), the pretty-print format ([format]), the
//! dialect extensions that render the metamodel to text ([dialect]) and the
//! process-wide registry of SQL string generators ([generator]).
//!
//! Frames in the `legendql` crate build [ast::QuerySpecification] values and
//! hand them to a generator found by database type:
//!
//! ```ignore
//! let generator = legendql_sql::generator::find("Postgres")?;
//! let sql = generator.generate_sql_string(&query, &SqlToStringConfig::default())?;
//! ```

pub mod ast;
pub mod dialect;
mod error;
pub mod format;
mod gen_expr;
mod gen_query;
pub mod generator;
pub mod helpers;

pub use dialect::{Dialect, DialectExtension};
pub use error::{Error, ErrorKind, WithErrorInfo};
pub use format::{SqlFormat, SqlToStringConfig};
pub use generator::SqlToStringGenerator;

pub type Result<T, E = Error> = core::result::Result<T, E>;
