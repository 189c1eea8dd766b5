//! Positional placeholder rewriting.
//!
//! Queries are written once with `?` placeholders. PostgreSQL wants `$1`,
//! `$2`, ... instead, so statements are rewritten right before execution.
//! Translating an already-translated statement is not supported.

use std::borrow::Cow;

use super::Dialect;

/// Rewrite `sql` for `dialect`. SQLite statements are returned untouched.
///
/// Every `?` is replaced, in order of appearance. Statements must not
/// contain a literal `?` inside string constants.
pub fn translate(sql: &str, dialect: Dialect) -> Cow<'_, str> {
    if dialect == Dialect::Sqlite || !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
