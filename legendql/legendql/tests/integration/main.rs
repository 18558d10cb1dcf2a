//! End-to-end tests: frame pipelines built through the public API, checked
//! against their SQL and PURE renderings.
mod errors;
mod properties;
mod pure;
mod sql;

use legendql::{FrameToPureConfig, FrameToSqlConfig, PrimitiveType, TdsColumn, TdsFrame};

pub(crate) fn table(name: &str, columns: &[(&str, PrimitiveType)]) -> TdsFrame {
    TdsFrame::table(
        ["db", "schema", name],
        columns
            .iter()
            .map(|(name, ty)| TdsColumn::new(*name, *ty))
            .collect(),
    )
    .unwrap()
}

/// `t(c1: Integer, c2: String, c3: Float)`
pub(crate) fn t() -> TdsFrame {
    table(
        "t",
        &[
            ("c1", PrimitiveType::Integer),
            ("c2", PrimitiveType::String),
            ("c3", PrimitiveType::Float),
        ],
    )
}

pub(crate) fn compact_sql(frame: &TdsFrame) -> String {
    frame
        .to_sql_query(&FrameToSqlConfig::default().no_pretty())
        .unwrap()
}

pub(crate) fn compact_pure(frame: &TdsFrame) -> String {
    frame.to_pure_query(&FrameToPureConfig::default().no_pretty())
}
