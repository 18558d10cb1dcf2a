//! Sub-query construction shared by frame translations.
use crate::ast::*;
use crate::dialect::DialectExtension;
use crate::{Error, Result};

/// Wraps `base` as `SELECT "alias"."c" AS "c", ... FROM (base) AS "alias"`.
///
/// With `columns_to_retain`, only those (quoted) columns are projected, in
/// the order given there.
pub fn create_sub_query(
    base: &QuerySpecification,
    extension: &dyn DialectExtension,
    alias: &str,
    columns_to_retain: Option<&[String]>,
) -> Result<QuerySpecification> {
    let table_alias = extension.quote_identifier(alias);
    let columns = extract_columns_for_subquery(base)?;

    let outer_columns: Vec<&String> = match columns_to_retain {
        Some(retain) if !retain.is_empty() => retain.iter().filter(|c| columns.contains(*c)).collect(),
        _ => columns.iter().collect(),
    };

    let select_items = outer_columns
        .into_iter()
        .map(|c| {
            SelectItem::SingleColumn(SingleColumn::new(
                c.clone(),
                Expression::column([table_alias.clone(), c.clone()]),
            ))
        })
        .collect();

    log::debug!("wrapping query as sub-query {table_alias}");
    Ok(QuerySpecification {
        select: Select {
            distinct: false,
            select_items,
        },
        from: vec![Relation::AliasedRelation(AliasedRelation {
            relation: Box::new(Relation::TableSubquery(TableSubquery {
                query: Box::new(Query::new(Relation::QuerySpecification(base.clone()))),
            })),
            alias: table_alias,
            column_names: columns,
        })],
        ..Default::default()
    })
}

/// Quoted aliases of the projected columns of `query`.
///
/// Only queries whose select list is made of aliased single columns can be
/// wrapped.
pub fn extract_columns_for_subquery(query: &QuerySpecification) -> Result<Vec<String>> {
    query
        .select
        .select_items
        .iter()
        .map(|item| match item {
            SelectItem::SingleColumn(SingleColumn {
                alias: Some(alias), ..
            }) => Ok(alias.clone()),
            SelectItem::SingleColumn(_) => Err(Error::new_assert(
                "Subquery creation not supported for queries with SingleColumns with missing alias",
            )),
            SelectItem::AllColumns { .. } => Err(Error::new_assert(
                "Subquery creation not supported for queries with columns other than SingleColumn",
            )),
        })
        .collect()
}

/// Whether `query` has any clause in `clauses` set.
pub fn has_any_clause(query: &QuerySpecification, clauses: &[Clause]) -> bool {
    clauses.iter().any(|clause| match clause {
        Clause::GroupBy => !query.group_by.is_empty(),
        Clause::OrderBy => !query.order_by.is_empty(),
        Clause::Having => query.having.is_some(),
        Clause::Distinct => query.select.distinct,
        Clause::Limit => query.limit.is_some(),
        Clause::Offset => query.offset.is_some(),
    })
}

/// Clauses whose presence in a base query forces wrapping before another
/// transformation is layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Clause {
    GroupBy,
    OrderBy,
    Having,
    Distinct,
    Limit,
    Offset,
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use super::*;
    use crate::dialect::GenericDialect;
    use crate::format::{SqlFormat, SqlToStringConfig};
    use crate::ErrorKind;

    fn base() -> QuerySpecification {
        QuerySpecification {
            select: Select {
                distinct: false,
                select_items: ["\"a\"", "\"b\""]
                    .iter()
                    .map(|c| {
                        SelectItem::SingleColumn(SingleColumn::new(
                            *c,
                            Expression::column(["\"root\"", *c]),
                        ))
                    })
                    .collect(),
            },
            from: vec![Relation::AliasedRelation(AliasedRelation {
                relation: Box::new(Relation::Table(Table {
                    name: QualifiedName::new(["t"]),
                })),
                alias: "\"root\"".to_string(),
                column_names: Vec::new(),
            })],
            limit: Some(Expression::integer(1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_sub_query_retains_order() {
        let retain = vec!["\"b\"".to_string(), "\"a\"".to_string()];
        let wrapped = create_sub_query(&base(), &GenericDialect, "root", Some(retain.as_slice())).unwrap();

        assert!(!has_any_clause(&wrapped, &[Clause::Limit, Clause::GroupBy]));
        let sql = GenericDialect
            .process_query_specification(
                &wrapped,
                &SqlToStringConfig::new(SqlFormat::compact()),
                false,
            )
            .unwrap();
        assert_snapshot!(sql, @r#"SELECT "root"."b" AS "b", "root"."a" AS "a" FROM (SELECT "root"."a" AS "a", "root"."b" AS "b" FROM t AS "root" LIMIT 1) AS "root""#);
    }

    #[test]
    fn test_extract_columns_rejects_star() {
        let mut query = base();
        query.select.select_items.push(SelectItem::AllColumns { prefix: None });
        let err = extract_columns_for_subquery(&query).unwrap_err();
        assert!(err.is(ErrorKind::Internal));
    }
}
