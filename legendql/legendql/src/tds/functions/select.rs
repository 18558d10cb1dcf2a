use itertools::Itertools;

use legendql_sql::ast::{QuerySpecification, SelectItem};
use legendql_sql::helpers::{create_sub_query, has_any_clause, Clause};
use legendql_sql::DialectExtension;

use super::{
    check_columns_exist, find_column, has_duplicates, name_list, pure_step, retain_columns,
    sub_query_on, AppliedFunction,
};
use crate::language::pure::escape_column_name;
use crate::tds::{TdsColumn, TdsFrame};
use crate::{Error, FrameToPureConfig, Result};

#[derive(Debug)]
pub(crate) struct SelectFunction {
    base: TdsFrame,
    columns: Vec<String>,
}

impl SelectFunction {
    pub fn apply(base: &TdsFrame, columns: Vec<String>) -> Result<TdsFrame> {
        let selected = selected_columns(base, &columns, "select")?;
        Ok(TdsFrame::applied(
            base,
            selected,
            SelectFunction {
                base: base.clone(),
                columns,
            },
        ))
    }
}

/// Validates a projection of `base` on `names` and returns the projected
/// columns.
fn selected_columns(base: &TdsFrame, names: &[String], context: &str) -> Result<Vec<TdsColumn>> {
    if names.is_empty() {
        return Err(Error::validation(format!(
            "At-least one column must be provided when using {context} function"
        )));
    }
    check_columns_exist(base, names, context)?;
    if has_duplicates(names) {
        return Err(Error::duplicate_column(format!(
            "Column names list of {context} function has duplicates: {}",
            name_list(names)
        )));
    }
    Ok(names
        .iter()
        .filter_map(|name| find_column(base.columns(), name).cloned())
        .collect())
}

/// `base` projected on `names`, in the order of `names`.
fn select_sql(
    mut base: QuerySpecification,
    extension: &dyn DialectExtension,
    names: &[String],
) -> Result<QuerySpecification> {
    let retain = names
        .iter()
        .map(|name| extension.quote_identifier(name))
        .collect_vec();
    if selects_exactly(&base, &retain) {
        return Ok(base);
    }

    let clauses = [
        Clause::GroupBy,
        Clause::OrderBy,
        Clause::Having,
        Clause::Distinct,
    ];
    if has_any_clause(&base, &clauses) {
        return create_sub_query(&base, extension, "root", Some(&retain));
    }
    retain_columns(&mut base, extension, names)?;
    Ok(base)
}

/// Whether `query` already projects exactly `aliases`, in that order.
fn selects_exactly(query: &QuerySpecification, aliases: &[String]) -> bool {
    query.select.select_items.len() == aliases.len()
        && query
            .select
            .select_items
            .iter()
            .zip(aliases)
            .all(|(item, alias)| {
                matches!(item, SelectItem::SingleColumn(c) if c.alias.as_deref() == Some(alias.as_str()))
            })
}

fn pure_names(names: &[String]) -> String {
    format!("~[{}]", names.iter().map(|n| escape_column_name(n)).join(", "))
}

impl AppliedFunction for SelectFunction {
    fn name(&self) -> &'static str {
        "select"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        select_sql(self.base.sql_query(extension)?, extension, &self.columns)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        pure_step(
            &self.base,
            config,
            &format!("->select({})", pure_names(&self.columns)),
        )
    }
}

#[derive(Debug)]
pub(crate) struct DistinctFunction {
    base: TdsFrame,
    columns: Option<Vec<String>>,
}

impl DistinctFunction {
    pub fn apply(base: &TdsFrame, columns: Option<Vec<String>>) -> Result<TdsFrame> {
        let result_columns = match &columns {
            Some(names) => selected_columns(base, names, "distinct")?,
            None => base.columns().to_vec(),
        };
        Ok(TdsFrame::applied(
            base,
            result_columns,
            DistinctFunction {
                base: base.clone(),
                columns,
            },
        ))
    }
}

impl AppliedFunction for DistinctFunction {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let mut base = self.base.sql_query(extension)?;
        if let Some(names) = &self.columns {
            base = select_sql(base, extension, names)?;
        }
        let mut query = sub_query_on(base, extension, &[Clause::Offset, Clause::Limit])?;
        query.select.distinct = true;
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let args = self.columns.as_deref().map(pure_names).unwrap_or_default();
        pure_step(&self.base, config, &format!("->distinct({args})"))
    }
}

#[derive(Debug)]
pub(crate) struct RenameFunction {
    base: TdsFrame,
    pairs: Vec<(String, String)>,
}

impl RenameFunction {
    pub fn apply(base: &TdsFrame, pairs: Vec<(String, String)>) -> Result<TdsFrame> {
        let (old_names, new_names): (Vec<_>, Vec<_>) = pairs.iter().cloned().unzip();

        check_columns_exist(base, &old_names, "rename")?;
        if has_duplicates(&old_names) {
            return Err(Error::duplicate_column(format!(
                "column_names list shouldn't have duplicates when renaming columns.\ncolumn_names list - (Count: {}) - {}\n",
                old_names.len(),
                name_list(&old_names)
            )));
        }
        if has_duplicates(&new_names) {
            return Err(Error::duplicate_column(format!(
                "renamed_column_names_list list shouldn't have duplicates when renaming columns.\nrenamed_column_names_list - (Count: {}) - {}\n",
                new_names.len(),
                name_list(&new_names)
            )));
        }
        for name in &new_names {
            let untouched = find_column(base.columns(), name).is_some() && !old_names.contains(name);
            if untouched {
                return Err(Error::duplicate_column(format!(
                    "Column - '{name}' in renamed columns list already exists in the current frame. Current frame columns: {}",
                    name_list(&base.column_names())
                )));
            }
        }

        let columns = base
            .columns()
            .iter()
            .map(|column| match old_names.iter().position(|o| o == column.name()) {
                Some(i) => column.renamed(new_names[i].clone()),
                None => column.clone(),
            })
            .collect();
        Ok(TdsFrame::applied(
            base,
            columns,
            RenameFunction {
                base: base.clone(),
                pairs,
            },
        ))
    }
}

impl AppliedFunction for RenameFunction {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let mut query = self.base.sql_query(extension)?;
        let renames = self
            .pairs
            .iter()
            .map(|(old, new)| {
                (
                    extension.quote_identifier(old),
                    extension.quote_identifier(new),
                )
            })
            .collect_vec();

        for item in &mut query.select.select_items {
            let SelectItem::SingleColumn(column) = item else {
                return Err(Error::new_assert(
                    "Rename columns operation not supported for queries with columns other than SingleColumn",
                ));
            };
            let renamed = renames
                .iter()
                .find(|(old, _)| column.alias.as_deref() == Some(old.as_str()));
            if let Some((_, new)) = renamed {
                column.alias = Some(new.clone());
            }
        }
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        if self.pairs.is_empty() {
            return self.base.pure_query(config);
        }
        let steps = self
            .pairs
            .iter()
            .map(|(old, new)| {
                format!(
                    "->rename(~{}, ~{})",
                    escape_column_name(old),
                    escape_column_name(new)
                )
            })
            .join(&config.separator(1, false));
        pure_step(&self.base, config, &steps)
    }
}
