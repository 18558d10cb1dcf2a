use itertools::Itertools;

use legendql_sql::ast::{QuerySpecification, SelectItem};
use legendql_sql::helpers::create_sub_query;
use legendql_sql::DialectExtension;

use super::{
    column_item, has_duplicates, name_list, pure_column_list, pure_step, AppliedFunction,
    EvaluatedColumn, NewColumn,
};
use crate::language::expr::SqlScope;
use crate::tds::TdsFrame;
use crate::{Error, FrameToPureConfig, Result};

#[derive(Debug)]
pub(crate) struct ProjectFunction {
    base: TdsFrame,
    columns: Vec<EvaluatedColumn>,
}

impl ProjectFunction {
    pub fn apply(base: &TdsFrame, columns: Vec<NewColumn>) -> Result<TdsFrame> {
        if columns.is_empty() {
            return Err(Error::validation(
                "At-least one column must be provided when using project function",
            ));
        }
        let names = columns.iter().map(|c| c.name().to_string()).collect_vec();
        if has_duplicates(&names) {
            return Err(Error::duplicate_column(format!(
                "Project column names list has duplicates: {}",
                name_list(&names)
            )));
        }
        if let Some(aggregated) = columns.iter().find(|c| c.is_aggregated()) {
            return Err(Error::validation(format!(
                "Project column - '{}' cannot be aggregated. Use group_by or extend for aggregations",
                aggregated.name()
            )));
        }

        let row = base.row("r");
        let columns = columns
            .into_iter()
            .map(|c| c.evaluate(&row, "project"))
            .collect::<Result<Vec<_>>>()?;

        let result_columns = columns.iter().map(EvaluatedColumn::tds_column).collect();
        Ok(TdsFrame::applied(
            base,
            result_columns,
            ProjectFunction {
                base: base.clone(),
                columns,
            },
        ))
    }
}

impl AppliedFunction for ProjectFunction {
    fn name(&self) -> &'static str {
        "project"
    }

    fn base_frame(&self) -> Option<&TdsFrame> {
        Some(&self.base)
    }

    fn to_sql(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        let base = self.base.sql_query(extension)?;
        let mut query = create_sub_query(&base, extension, "root", None)?;

        let items = {
            let scope = SqlScope::new(extension).bind("r", &query);
            self.columns
                .iter()
                .map(|c| Ok(column_item(extension, &c.name, c.map.expr.to_sql(&scope)?)))
                .collect::<Result<Vec<SelectItem>>>()?
        };
        query.select.select_items = items;
        Ok(query)
    }

    fn to_pure(&self, config: &FrameToPureConfig) -> String {
        let items = self
            .columns
            .iter()
            .map(|c| c.to_pure("r", config))
            .collect_vec();
        pure_step(
            &self.base,
            config,
            &format!("->project({})", pure_column_list(&items, config)),
        )
    }
}
