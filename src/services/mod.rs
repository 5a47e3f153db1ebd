pub mod admin;
pub mod article;
pub mod auth;
pub mod comment;
pub mod like;
pub mod question;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

/// Case-insensitive substring match of `term` against a text column.
/// `%`, `_` and `\` in the term match literally.
pub(crate) fn contains_term(col: impl IntoColumnRef, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col)))
        .like(LikeExpr::new(contains_pattern(term)).escape('\\'))
}

fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
