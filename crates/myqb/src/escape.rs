//! Literal escaping for queries compiled without bound parameters.

use crate::value::{Value, mysql_datetime};

/// Render a value as a MySQL literal.
///
/// Booleans render lowercase (`true`/`false`) here, while bindings created
/// from booleans inline uppercase `TRUE`/`FALSE`. Both are valid MySQL.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::DateTime(dt) => quote_string(&mysql_datetime(dt)),
        Value::Text(s) => quote_string(s),
    }
}

/// Single-quote a string, backslash-escaping NUL, `\n`, `\r`, `\b`, `\t`,
/// `\`, `'`, `"` and Ctrl-Z.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\u{1a}' => out.push_str("\\Z"),
            '\\' | '\'' | '"' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_escape_scalars() {
        assert_eq!(escape_value(&Value::Null), "NULL");
        assert_eq!(escape_value(&Value::Bool(true)), "true");
        assert_eq!(escape_value(&Value::Bool(false)), "false");
        assert_eq!(escape_value(&Value::Int(-42)), "-42");
        assert_eq!(escape_value(&Value::Float(1.5)), "1.5");
        assert_eq!(escape_value(&Value::Float(3.0)), "3");
    }

    #[test]
    fn test_escape_date_uses_utc() {
        let dt = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(escape_value(&Value::DateTime(dt)), "'2014-01-01 00:00:00'");
    }

    #[test]
    fn test_escape_control_characters() {
        let s = "a\0b\nc\rd\u{8}e\tf\u{1a}g";
        assert_eq!(quote_string(s), r"'a\0b\nc\rd\be\tf\Zg'");
    }

    #[test]
    fn test_escape_quotes_and_backslash() {
        assert_eq!(quote_string(r#"x' "y" \z"#), r#"'x\' \"y\" \\z'"#);
    }

    #[test]
    fn test_escape_injection_attempt() {
        assert_eq!(
            quote_string("x' AND email IS NULL; --"),
            r"'x\' AND email IS NULL; --'"
        );
    }
}
