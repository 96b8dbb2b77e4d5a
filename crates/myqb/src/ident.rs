//! MySQL identifier quoting for table sources.
//!
//! Only table, database and sub-query names are quoted by the builder. Column
//! names, join targets and expressions are passed through verbatim since they
//! routinely carry SQL (`COUNT(c.id)`, `u.id`, ...).

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(name, &mut out);
    out
}

pub(crate) fn write_ident(name: &str, out: &mut String) {
    out.push('`');
    for ch in name.chars() {
        if ch == '`' {
            out.push_str("``");
        } else {
            out.push(ch);
        }
    }
    out.push('`');
}

/// Render `` `database`.`table` alias `` (database and alias optional).
pub(crate) fn table_ref(database: Option<&str>, table: &str, alias: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(database) = database {
        write_ident(database, &mut out);
        out.push('.');
    }
    write_ident(table, &mut out);
    if let Some(alias) = alias {
        out.push(' ');
        out.push_str(alias);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_simple() {
        assert_eq!(quote_ident("users"), "`users`");
    }

    #[test]
    fn test_ident_escapes_backtick() {
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_table_ref_with_database_and_alias() {
        assert_eq!(table_ref(Some("test"), "users", Some("u")), "`test`.`users` u");
        assert_eq!(table_ref(None, "users", None), "`users`");
    }
}
