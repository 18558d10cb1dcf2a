use itertools::Itertools;

use legendql_sql::ast::{QuerySpecification, SelectItem};
use legendql_sql::helpers::{has_any_clause, Clause};
use legendql_sql::DialectExtension;

use super::{
    check_columns_exist, column_item, find_column, has_duplicates, name_list, projects_window,
    pure_step, retain_columns, sub_query_if, AppliedFunction, EvaluatedColumn, NewColumn,
};
use crate::language::expr::SqlScope;
use crate::language::pure::escape_column_name;
use crate::tds::TdsFrame;
use crate::{Error, FrameToPureConfig, Result};

#[derive(Debug)]
pub(crate) struct GroupByFunction {
    base: TdsFrame,
    grouping: Vec<String>,
    aggregates: Vec<EvaluatedColumn>,
}

impl GroupByFunction {
    pub fn apply(
        base: &TdsFrame,
        grouping: Vec<String>,
        aggregates: Vec<NewColumn>,
    ) -> Result<TdsFrame> {
        check_columns_exist(base, &grouping, "group_by")?;

        let aggregate_names = aggregates.iter().map(|a| a.name().to_string()).collect_vec();
        let all_names = grouping.iter().chain(&aggregate_names).collect_vec();
        if all_names.is_empty() {
            return Err(Error::validation(
                "At-least one grouping column or aggregate specification must be provided when using group_by function",
            ));
        }
        if has_duplicates(&all_names) {
            return Err(Error::duplicate_column(format!(
                "Found duplicate column names in grouping columns and aggregation columns. Grouping columns - {}, Aggregation columns - {}",
                name_list(&grouping),
                name_list(&aggregate_names)
            )));
        }
        if let Some(plain) = aggregates.iter().find(|a| !a.is_aggregated()) {
            return Err(Error::validation(format!(
                "Aggregate column - '{}' of group_by function must have an aggregation function",
                plain.name()
            )));
        }

        let row = base.row("r");
        let aggregates = aggregates
            .into_iter()
            .map(|a| a.evaluate(&row, "group_by"))
            .collect::<Result<Vec<_>>>()?;

        let columns = grouping
            .iter()
            .filter_map(|name| find_column(base.columns(), name).cloned())
            .chain(aggregates.iter().map(EvaluatedColumn::tds_column))
            .collect();
        Ok(TdsFrame::applied(
            base,
            columns,
            GroupByFunction {
                base: base.clone(),
                grouping,
                aggregates,
            },
        ))
    }
}

impl AppliedFunction for GroupByFunction {
    fn name(&self) -> &'static str {
        "group_by"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let clauses = [
            Clause::GroupBy,
            Clause::Distinct,
            Clause::Offset,
            Clause::Limit,
        ];
        let wrap = has_any_clause(&base, &clauses) || projects_window(&base);
        let mut query = sub_query_if(base, extension, wrap)?;

        let (aggregates, group_by) = {
            let scope = SqlScope::new(extension).bind("r", &query);
            let aggregates = self
                .aggregates
                .iter()
                .map(|a| Ok(column_item(extension, &a.name, a.value().expr.to_sql(&scope)?)))
                .collect::<Result<Vec<SelectItem>>>()?;
            let group_by = self
                .grouping
                .iter()
                .map(|name| scope.resolve("r", name))
                .collect::<Result<Vec<_>>>()?;
            (aggregates, group_by)
        };

        retain_columns(&mut query, extension, &self.grouping)?;
        query.select.select_items.extend(aggregates);
        query.group_by = group_by;
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let grouping = self.grouping.iter().map(|g| escape_column_name(g)).join(", ");
        let aggregates = self
            .aggregates
            .iter()
            .map(|a| a.to_pure("r", config))
            .join(", ");
        let step = format!(
            "->groupBy({}~[{grouping}],{}~[{aggregates}]{})",
            config.separator(2, false),
            config.separator(2, true),
            config.separator(1, false)
        );
        pure_step(&self.base, config, &step)
    }
}
