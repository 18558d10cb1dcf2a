//! Rendering of relations and query specifications.
//!
//! Every function takes the dialect as a generic so that the default methods
//! of [DialectExtension] can hand `self` over; recursion always goes back
//! through the dialect so overrides apply at every depth.
use itertools::Itertools;

use crate::ast::*;
use crate::dialect::DialectExtension;
use crate::format::SqlToStringConfig;
use crate::gen_expr::strip_outer_parens;
use crate::Result;

pub(crate) fn translate_query_specification<D: DialectExtension + ?Sized>(
    d: &D,
    query: &QuerySpecification,
    config: &SqlToStringConfig,
    nested: bool,
) -> Result<String> {
    let sep0 = config.sep(0);
    let sep1 = config.sep(1);

    if nested {
        let inner = d.process_query_specification(query, &config.push_indent(), false)?;
        return Ok(format!("({}{inner}{})", config.paren_sep(1), config.paren_sep(0)));
    }

    let distinct = if query.select.distinct { " DISTINCT" } else { "" };
    let top = d.process_top(query, config)?;
    let group_by = d.process_group_by(query, config)?;
    let order_by = d.process_order_by(query, config)?;
    let limit = d.process_limit(query, config)?;
    let columns = d.process_select(&query.select, config)?;

    let from = if query.from.is_empty() {
        String::new()
    } else {
        let relations = query
            .from
            .iter()
            .map(|r| d.process_relation(r, &config.push_indent(), false))
            .collect::<Result<Vec<_>>>()?;
        format!("{sep0}FROM{sep1}{}", relations.join(&format!(",{sep1}")))
    };

    let where_ = match &query.where_ {
        Some(expr) => format!(
            "{sep0}WHERE{sep1}{}",
            d.process_expression(expr, &config.push_indent())?
        ),
        None => String::new(),
    };

    let having = match &query.having {
        Some(expr) => format!(
            "{sep0}HAVING{sep1}{}",
            d.process_expression(expr, &config.push_indent())?
        ),
        None => String::new(),
    };

    Ok(format!(
        "SELECT{distinct}{top}{columns}{from}{where_}{group_by}{having}{order_by}{limit}"
    ))
}

pub(crate) fn translate_select<D: DialectExtension + ?Sized>(
    d: &D,
    select: &Select,
    config: &SqlToStringConfig,
) -> Result<String> {
    let sep1 = config.sep(1);
    let items = select
        .select_items
        .iter()
        .map(|item| d.process_select_item(item, &config.push_indent()))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!("{sep1}{}", items.join(&format!(",{sep1}"))))
}

pub(crate) fn translate_select_item<D: DialectExtension + ?Sized>(
    d: &D,
    item: &SelectItem,
    config: &SqlToStringConfig,
) -> Result<String> {
    Ok(match item {
        SelectItem::AllColumns { prefix: Some(prefix) } => {
            format!("{}.*", d.process_identifier(prefix, config, false))
        }
        SelectItem::AllColumns { prefix: None } => "*".to_string(),
        SelectItem::SingleColumn(SingleColumn { alias, expression }) => {
            let expr = d.process_expression(expression, config)?;
            match alias {
                Some(alias) => format!("{expr} AS {}", d.process_identifier(alias, config, false)),
                None => expr,
            }
        }
    })
}

pub(crate) fn translate_limit<D: DialectExtension + ?Sized>(
    d: &D,
    query: &QuerySpecification,
    config: &SqlToStringConfig,
) -> Result<String> {
    translate_pagination(d, query.limit.as_ref(), query.offset.as_ref(), config)
}

fn translate_pagination<D: DialectExtension + ?Sized>(
    d: &D,
    limit: Option<&Expression>,
    offset: Option<&Expression>,
    config: &SqlToStringConfig,
) -> Result<String> {
    let sep0 = config.sep(0);
    let mut res = String::new();
    if let Some(limit) = limit {
        res += &format!("{sep0}LIMIT {}", d.process_expression(limit, config)?);
    }
    if let Some(offset) = offset {
        res += &format!("{sep0}OFFSET {}", d.process_expression(offset, config)?);
    }
    Ok(res)
}

pub(crate) fn translate_group_by<D: DialectExtension + ?Sized>(
    d: &D,
    query: &QuerySpecification,
    config: &SqlToStringConfig,
) -> Result<String> {
    if query.group_by.is_empty() {
        return Ok(String::new());
    }
    let sep0 = config.sep(0);
    let sep1 = config.sep(1);
    let args = query
        .group_by
        .iter()
        .map(|g| d.process_expression(g, &config.push_indent()))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{sep0}GROUP BY{sep1}{}", args.join(&format!(",{sep1}"))))
}

pub(crate) fn translate_order_by<D: DialectExtension + ?Sized>(
    d: &D,
    order_by: &[SortItem],
    config: &SqlToStringConfig,
) -> Result<String> {
    if order_by.is_empty() {
        return Ok(String::new());
    }
    let sep0 = config.sep(0);
    let sep1 = config.sep(1);
    let args = order_by
        .iter()
        .map(|o| d.process_sort_item(o, config))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{sep0}ORDER BY{sep1}{}", args.join(&format!(",{sep1}"))))
}

pub(crate) fn translate_sort_item<D: DialectExtension + ?Sized>(
    d: &D,
    item: &SortItem,
    config: &SqlToStringConfig,
) -> Result<String> {
    let key = d.process_expression(&item.sort_key, &config.push_indent())?;
    let ordering = match item.ordering {
        SortOrdering::Ascending => "",
        SortOrdering::Descending => " DESC",
    };
    let nulls = match item.null_ordering {
        NullOrdering::Undefined => "",
        NullOrdering::First => " NULLS FIRST",
        NullOrdering::Last => " NULLS LAST",
    };
    Ok(format!("{key}{ordering}{nulls}"))
}

pub(crate) fn translate_relation<D: DialectExtension + ?Sized>(
    d: &D,
    relation: &Relation,
    config: &SqlToStringConfig,
    nested: bool,
) -> Result<String> {
    match relation {
        Relation::Table(table) => Ok(d.process_qualified_name(&table.name, config)),
        Relation::AliasedRelation(aliased) => {
            let relation = d.process_relation(&aliased.relation, config, nested)?;
            let alias = d.process_identifier(&aliased.alias, config, false);
            Ok(format!("{relation} AS {alias}"))
        }
        Relation::QuerySpecification(query) => d.process_query_specification(query, config, nested),
        Relation::TableSubquery(subquery) => d.process_query(&subquery.query, config, true),
        Relation::Join(join) => d.process_join(join, config),
        Relation::TableFunction(func) => d.process_function_call(&func.function_call, config),
        Relation::Union(union) => d.process_union(union, config, nested),
    }
}

pub(crate) fn translate_query<D: DialectExtension + ?Sized>(
    d: &D,
    query: &Query,
    config: &SqlToStringConfig,
    nested: bool,
) -> Result<String> {
    let plain_body = matches!(
        *query.body,
        Relation::QuerySpecification(_) | Relation::Union(_)
    );
    if plain_body && query.order_by.is_empty() && query.limit.is_none() && query.offset.is_none() {
        return d.process_relation(&query.body, config, nested);
    }

    let sep1 = config.sep(1);
    let sep2 = config.sep(2);
    let inner = config.push_indent();
    let relation = d.process_relation(&query.body, &inner.push_indent(), true)?;
    let order_by = translate_order_by(d, &query.order_by, &inner)?;
    let pagination = translate_pagination(d, query.limit.as_ref(), query.offset.as_ref(), &inner)?;

    Ok(format!(
        "({}SELECT{sep2}*{sep1}FROM{sep2}{relation}{order_by}{pagination}{})",
        config.paren_sep(1),
        config.paren_sep(0)
    ))
}

pub(crate) fn translate_join<D: DialectExtension + ?Sized>(
    d: &D,
    join: &Join,
    config: &SqlToStringConfig,
) -> Result<String> {
    let left = d.process_relation(&join.left, config, false)?;
    let right = d.process_relation(&join.right, &config.push_indent(), false)?;

    let sep0 = config.sep(0);
    let sep1 = config.sep(1);
    let condition = match &join.criteria {
        Some(criteria) => format!("{sep1}{}", d.process_join_criteria(criteria, config)?),
        None => String::new(),
    };
    Ok(format!("{left}{sep0}{}{sep1}{right}{condition}", join.kind))
}

pub(crate) fn translate_join_criteria<D: DialectExtension + ?Sized>(
    d: &D,
    criteria: &JoinCriteria,
    config: &SqlToStringConfig,
) -> Result<String> {
    Ok(match criteria {
        JoinCriteria::On(expr) => {
            let expr = d.process_expression(expr, config)?;
            format!("ON ({})", strip_outer_parens(&expr))
        }
        JoinCriteria::Using(columns) => {
            let columns = columns
                .iter()
                .map(|c| d.process_identifier(c, config, false))
                .join(", ");
            format!("USING ({columns})")
        }
    })
}

pub(crate) fn translate_union<D: DialectExtension + ?Sized>(
    d: &D,
    union: &Union,
    config: &SqlToStringConfig,
    nested: bool,
) -> Result<String> {
    if nested {
        let inner = d.process_union(union, &config.push_indent(), false)?;
        return Ok(format!("({}{inner}{})", config.paren_sep(1), config.paren_sep(0)));
    }

    let sep0 = config.sep(0);
    let left = d.process_relation(&union.left, config, true)?;
    let right = d.process_relation(&union.right, config, true)?;
    let keyword = if union.distinct { "UNION" } else { "UNION ALL" };
    Ok(format!("{left}{sep0}{keyword}{sep0}{right}"))
}
