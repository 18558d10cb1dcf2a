use itertools::Itertools;

use super::expr::{ColumnRef, Expr, RowAccessor};
use super::{Primitive, PrimitiveType};
use crate::tds::TdsColumn;
use crate::{Error, Result};

/// A row of a frame, as seen by a transformation closure.
///
/// Column access is checked against the frame's columns; the returned
/// [Primitive] is typed with the column's type.
#[derive(Debug, Clone)]
pub struct TdsRow<'a> {
    frame: &'static str,
    columns: &'a [TdsColumn],
    accessor: Option<RowAccessor>,
}

impl<'a> TdsRow<'a> {
    pub(crate) fn new(frame: &'static str, columns: &'a [TdsColumn]) -> Self {
        TdsRow {
            frame,
            columns,
            accessor: None,
        }
    }

    pub(crate) fn with_accessor(&self, accessor: RowAccessor) -> Self {
        TdsRow {
            accessor: Some(accessor),
            ..self.clone()
        }
    }

    pub fn columns(&self) -> &'a [TdsColumn] {
        self.columns
    }

    pub fn get(&self, column: &str) -> Result<Primitive> {
        let found = self
            .columns
            .iter()
            .find(|c| c.name() == column)
            .ok_or_else(|| {
                Error::unknown_column(format!(
                    "Column - '{column}' doesn't exist in the current frame. Current frame columns: [{}]",
                    self.columns.iter().map(|c| format!("'{}'", c.name())).join(", ")
                ))
            })?;

        Ok(Primitive::new(
            found.primitive_type(),
            Expr::Column(ColumnRef {
                frame: self.frame,
                name: column.to_string(),
                accessor: self.accessor,
            }),
        ))
    }

    fn get_typed(&self, column: &str, expected: PrimitiveType) -> Result<Primitive> {
        let value = self.get(column)?;
        let actual = value.primitive_type();
        let compatible = actual == expected
            || (expected == PrimitiveType::Number && actual.is_numeric())
            || (expected == PrimitiveType::Date && actual.is_date());
        if !compatible {
            return Err(Error::type_mismatch(format!(
                "Column - '{column}' is of type {actual}, not {expected}"
            )));
        }
        Ok(value)
    }

    pub fn get_boolean(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Boolean)
    }

    pub fn get_string(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::String)
    }

    pub fn get_number(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Number)
    }

    pub fn get_integer(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Integer)
    }

    pub fn get_float(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Float)
    }

    pub fn get_decimal(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Decimal)
    }

    pub fn get_date(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::Date)
    }

    pub fn get_datetime(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::DateTime)
    }

    pub fn get_strictdate(&self, column: &str) -> Result<Primitive> {
        self.get_typed(column, PrimitiveType::StrictDate)
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use super::*;
    use crate::{ErrorKind, FrameToPureConfig};

    fn columns() -> Vec<TdsColumn> {
        vec![
            TdsColumn::new("a", PrimitiveType::Integer),
            TdsColumn::new("b", PrimitiveType::StrictDate),
        ]
    }

    #[test]
    fn test_unknown_column() {
        let columns = columns();
        let row = TdsRow::new("r", &columns);
        let err = row.get("c").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownColumn);
        assert_snapshot!(err, @"Column - 'c' doesn't exist in the current frame. Current frame columns: ['a', 'b']");
    }

    #[test]
    fn test_typed_getters() {
        let columns = columns();
        let row = TdsRow::new("r", &columns);

        assert!(row.get_integer("a").is_ok());
        assert!(row.get_number("a").is_ok());
        assert!(row.get_date("b").is_ok());
        assert!(row.get_strictdate("b").is_ok());
        let err = row.get_string("a").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_snapshot!(err, @"Column - 'a' is of type Integer, not String");
    }

    #[test]
    fn test_accessor_rows() {
        let columns = columns();
        let row = TdsRow::new("r", &columns).with_accessor(RowAccessor::Lag);
        assert_eq!(
            row.get("a")
                .unwrap()
                .to_pure_expression(&FrameToPureConfig::default()),
            "$p->lag($r).a"
        );
    }
}
