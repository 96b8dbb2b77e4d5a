//! Named data bindings.
//!
//! Values supplied to the builder are stored under `{{token}}` keys and the
//! tokens are embedded in the rendered SQL. At compile time every token is
//! swapped for a `?` mark (collecting the value) or an escaped literal.
//!
//! Generated tokens come from one process-wide counter rendered in base 16.
//! The counter is never reset, so tokens minted by different queries cannot
//! collide and bindings can be merged from sub-queries by plain map extension.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generated binding and sub-query names.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Return `prefix` followed by the next counter value in hex.
pub(crate) fn unique_id(prefix: &str) -> String {
    let id = ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{prefix}{id:x}")
}

/// Matches `{{name}}` placeholders in rendered SQL.
pub(crate) fn token_pattern() -> &'static regex::Regex {
    static TOKEN_RE: OnceLock<regex::Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        regex::Regex::new(r"\{\{\w*\}\}").expect("invalid built-in binding token regex")
    })
}

/// Wrap a key as `{{key}}` unless it already is.
pub(crate) fn normalize_key(key: &str) -> String {
    if key.starts_with("{{") {
        key.to_string()
    } else {
        format!("{{{{{key}}}}}")
    }
}

/// Token → value store owned by one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` (normalized to `{{key}}`).
    ///
    /// Dates are stored as their `YYYY-MM-DD HH:MM:SS` UTC text.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(normalize_key(key), value.normalized());
    }

    /// Look up a binding by its full `{{token}}` form or by bare name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key.starts_with("{{") {
            self.values.get(key)
        } else {
            self.values.get(&normalize_key(key))
        }
    }

    /// Store `value` and return the SQL text standing in for it.
    ///
    /// `TRUE`, `FALSE` and `NULL` are returned inline and never stored. Other
    /// values get a freshly minted token, wrapped as `MODIFIER({{token}})`
    /// when a modifier is given.
    pub fn bind(&mut self, value: Value, modifier: Option<&str>) -> String {
        match value {
            Value::Bool(true) => return "TRUE".to_string(),
            Value::Bool(false) => return "FALSE".to_string(),
            Value::Null => return "NULL".to_string(),
            _ => {}
        }

        let key = format!("{{{{{}}}}}", unique_id("binding"));
        self.values.insert(key.clone(), value.normalized());

        match modifier {
            Some(modifier) => format!("{modifier}({key})"),
            None => key,
        }
    }

    /// Copy every binding referenced by a token in `sql`.
    ///
    /// Tokens with no stored value are skipped: a sub-query may reference a
    /// binding that only its parent holds.
    pub fn collect_referenced(&self, sql: &str) -> Bindings {
        let values = token_pattern()
            .find_iter(sql)
            .filter_map(|m| {
                self.values
                    .get(m.as_str())
                    .map(|v| (m.as_str().to_string(), v.clone()))
            })
            .collect();
        Bindings { values }
    }

    /// Merge another store into this one, overwriting equal keys.
    pub fn extend(&mut self, other: Bindings) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_tokens_are_unique_and_wrapped() {
        let mut b = Bindings::new();
        let t1 = b.bind(Value::Int(1), None);
        let t2 = b.bind(Value::Int(1), None);
        assert_ne!(t1, t2);
        assert!(t1.starts_with("{{binding") && t1.ends_with("}}"));
        assert_eq!(b.get(&t1), Some(&Value::Int(1)));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_counter_is_hex() {
        let id = unique_id("x");
        let digits = id.trim_start_matches('x');
        assert!(u64::from_str_radix(digits, 16).is_ok());
    }

    #[test]
    fn test_literals_are_not_stored() {
        let mut b = Bindings::new();
        assert_eq!(b.bind(Value::Bool(true), None), "TRUE");
        assert_eq!(b.bind(Value::Bool(false), Some("UPPER")), "FALSE");
        assert_eq!(b.bind(Value::Null, None), "NULL");
        assert!(b.is_empty());
    }

    #[test]
    fn test_modifier_wraps_token() {
        let mut b = Bindings::new();
        let sql = b.bind(Value::from("bob"), Some("UPPER"));
        assert!(sql.starts_with("UPPER({{binding"));
        assert!(sql.ends_with("}})"));
    }

    #[test]
    fn test_dates_are_stored_as_text() {
        let mut b = Bindings::new();
        let dt = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        let token = b.bind(Value::DateTime(dt), None);
        assert_eq!(
            b.get(&token),
            Some(&Value::Text("2012-01-01 00:00:00".to_string()))
        );
    }

    #[test]
    fn test_insert_normalizes_key() {
        let mut b = Bindings::new();
        b.insert("orderType", Value::from("express"));
        b.insert("{{other}}", Value::Int(2));
        assert_eq!(b.get("{{orderType}}"), Some(&Value::from("express")));
        assert_eq!(b.get("orderType"), Some(&Value::from("express")));
        assert_eq!(b.get("{{other}}"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_collect_referenced_skips_unknown() {
        let mut b = Bindings::new();
        let token = b.bind(Value::Int(5), None);
        b.bind(Value::Int(6), None);
        let collected = b.collect_referenced(&format!("a = {token} AND b = {{{{missing}}}}"));
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.get(&token), Some(&Value::Int(5)));
    }
}
