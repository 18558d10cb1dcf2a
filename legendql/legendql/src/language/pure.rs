//! Text helpers shared by every PURE renderer.
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

/// `func(a, b)` when `force_prefix` is set or there are no params, otherwise
/// `a->func(b)`. Redundant outer parentheses of the trailing params are
/// dropped; the receiver keeps them so that `(a + b)->abs()` stays correct.
pub(crate) fn functional_call(func: &str, params: &[String], force_prefix: bool) -> String {
    let mut stripped = params.iter().map(|p| strip_outer_parens(p));
    match params.first() {
        Some(receiver) if !force_prefix => {
            format!("{receiver}->{func}({})", stripped.skip(1).join(", "))
        }
        _ => format!("{func}({})", stripped.join(", ")),
    }
}

/// `{params | body}`
pub(crate) fn lambda(params: &str, body: &str) -> String {
    format!("{{{params} | {}}}", strip_outer_parens(body))
}

/// Column names that are not identifiers are single-quoted.
pub(crate) fn escape_column_name(name: &str) -> String {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*$").unwrap());

    if ident.is_match(name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "\\'"))
    }
}

/// Wraps a nullable operand so PURE sees multiplicity one.
pub(crate) fn to_one(expr: &str) -> String {
    format!("toOne({})", strip_outer_parens(expr))
}

pub(crate) fn strip_outer_parens(expr: &str) -> &str {
    if has_matching_outer_parens(expr) {
        &expr[1..expr.len() - 1]
    } else {
        expr
    }
}

/// Whether the first char is a `(` closed by the last char.
pub(crate) fn has_matching_outer_parens(expr: &str) -> bool {
    if expr.len() < 2 || !expr.starts_with('(') || !expr.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != expr.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
