use legendql_sql::ast::{
    AliasedRelation, Expression, QualifiedName, QuerySpecification, Relation, Select, Table,
};
use legendql_sql::DialectExtension;

use super::{column_item, has_duplicates, name_list, AppliedFunction};
use crate::tds::{TdsColumn, TdsFrame};
use crate::{Error, FrameToPureConfig, Result};

/// A database table, read in full.
#[derive(Debug)]
pub(crate) struct TableSourceFunction {
    parts: Vec<String>,
    columns: Vec<String>,
}

impl TableSourceFunction {
    pub fn new(parts: Vec<String>, columns: &[TdsColumn]) -> Result<Self> {
        if parts.is_empty() || parts.iter().any(String::is_empty) {
            return Err(Error::validation(format!(
                "Table name parts cannot be empty. Parts: {}",
                name_list(&parts)
            )));
        }
        if columns.is_empty() {
            return Err(Error::validation(format!(
                "Table {} must have at least one column",
                parts.join(".")
            )));
        }

        let names: Vec<_> = columns.iter().map(TdsColumn::name).collect();
        if has_duplicates(&names) {
            return Err(Error::duplicate_column(format!(
                "Found duplicate column names in table {}: {}",
                parts.join("."),
                name_list(&names)
            )));
        }

        Ok(TableSourceFunction {
            parts,
            columns: names.into_iter().map(str::to_string).collect(),
        })
    }
}

impl AppliedFunction for TableSourceFunction {
    fn name(&self) -> &'static str {
        "table"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        None
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let root = extension.quote_identifier("root");
        let select_items = self
            .columns
            .iter()
            .map(|name| {
                let quoted = extension.quote_identifier(name);
                column_item(extension, name, Expression::column([root.clone(), quoted]))
            })
            .collect();

        Ok(QuerySpecification {
            select: Select {
                distinct: false,
                select_items,
            },
            from: vec![Relation::AliasedRelation(AliasedRelation {
                relation: Box::new(Relation::Table(Table {
                    name: QualifiedName::new(self.parts.iter().cloned()),
                })),
                alias: root,
                column_names: Vec::new(),
            })],
            ..Default::default()
        })
    }

    fn to_pure(&self, _config: &FrameToPureConfig) -> String {
        format!("#Table({})#", self.parts.join("."))
    }
}
