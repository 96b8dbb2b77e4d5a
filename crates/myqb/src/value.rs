//! Values accepted by the builder and the shapes they may be passed in.
//!
//! - [`Value`] is a single scalar (the only thing that can end up in a binding).
//! - [`Operand`] is the right-hand side of a predicate or assignment.
//! - [`Fields`] is an insertion-ordered `key => operand` map, used for
//!   object-style `where`, `set`, join `ON` and row definitions.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const MYSQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp as a MySQL `DATETIME` literal body, using UTC fields.
pub(crate) fn mysql_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(MYSQL_DATETIME_FORMAT).to_string()
}

/// A scalar SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Text(_) => "string",
            Value::DateTime(_) => "date",
        }
    }

    /// Dates become their `YYYY-MM-DD HH:MM:SS` text; everything else is unchanged.
    pub(crate) fn normalized(self) -> Value {
        match self {
            Value::DateTime(dt) => Value::Text(mysql_datetime(&dt)),
            other => other,
        }
    }

    /// Convert a JSON scalar. Arrays and objects return `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float)),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident as $target:ty: $($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

impl_value_from!(Int as i64: i8, i16, i32, i64, u8, u16, u32);
impl_value_from!(Float as f64: f32, f64);
impl_value_from!(Text as String: &str, String, &String);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::DateTime(v.with_timezone(&Utc))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// The value side of a condition, assignment or row cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A plain scalar, bound as a parameter (booleans and NULL are inlined).
    Value(Value),
    /// A list of operands (`IN (...)` in conditions).
    List(Vec<Operand>),
    /// An explicitly tagged value, optionally wrapped in a SQL function.
    Data {
        data: Value,
        modifier: Option<String>,
    },
    /// Literal SQL emitted without a binding, e.g. `NOW()`.
    Raw(String),
    /// A nested map with no recognized meaning. Rejected wherever a value is needed.
    Object(Fields),
}

impl Operand {
    /// A tagged value without modifier.
    pub fn data(value: impl Into<Value>) -> Self {
        Operand::Data {
            data: value.into(),
            modifier: None,
        }
    }

    /// A tagged value wrapped in `modifier(...)`.
    pub fn data_with(value: impl Into<Value>, modifier: impl Into<String>) -> Self {
        Operand::Data {
            data: value.into(),
            modifier: Some(modifier.into()),
        }
    }

    /// Literal SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Operand::Raw(sql.into())
    }

    pub(crate) fn is_negation_marker(&self) -> bool {
        matches!(self, Operand::Value(Value::Bool(true)))
    }
}

macro_rules! impl_operand_from_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(v.into())
                }
            }
        )+
    };
}

impl_operand_from_scalar!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String, &String
);

impl<Tz: TimeZone> From<DateTime<Tz>> for Operand {
    fn from(v: DateTime<Tz>) -> Self {
        Operand::Value(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(v.into())
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Fields> for Operand {
    fn from(fields: Fields) -> Self {
        Operand::Object(fields)
    }
}

impl From<serde_json::Value> for Operand {
    fn from(value: serde_json::Value) -> Self {
        if let Some(scalar) = Value::from_json(&value) {
            return Operand::Value(scalar);
        }
        match value {
            serde_json::Value::Array(items) => {
                Operand::List(items.into_iter().map(Operand::from).collect())
            }
            serde_json::Value::Object(map) => operand_from_json_object(map),
            _ => Operand::Value(Value::Null),
        }
    }
}

/// `{"raw": ".."}` and `{"data": .., "modifier": ..}` are tagged shapes; any
/// other object stays an [`Operand::Object`].
fn operand_from_json_object(map: serde_json::Map<String, serde_json::Value>) -> Operand {
    if map.len() == 1 {
        if let Some(serde_json::Value::String(raw)) = map.get("raw") {
            return Operand::Raw(raw.clone());
        }
    }

    if let Some(data) = map.get("data").and_then(Value::from_json) {
        match map.get("modifier") {
            None | Some(serde_json::Value::Null) => {
                return Operand::Data {
                    data,
                    modifier: None,
                };
            }
            Some(serde_json::Value::String(modifier)) => {
                return Operand::Data {
                    data,
                    modifier: Some(modifier.clone()),
                };
            }
            Some(_) => {}
        }
    }

    Operand::Object(Fields::from(map))
}

/// An insertion-ordered map of field names to operands.
///
/// A key named `not` holding `true` is a negation marker: it flips the
/// operator for every key that follows it in the same map.
///
/// # Example
/// ```ignore
/// let f = Fields::new().field("id", 1).not().field("name", "bob");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields(Vec<(String, Operand)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add or replace a field (replacement keeps the original position).
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.insert(key, value);
        self
    }

    /// Append the `not: true` negation marker.
    pub fn not(self) -> Self {
        self.field("not", true)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Operand>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Operand> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Fields {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    #[test]
    fn test_datetime_is_rendered_from_utc_fields() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = tz.with_ymd_and_hms(2013, 1, 1, 3, 30, 0).unwrap();
        let value = Value::from(local).normalized();
        assert_eq!(value, Value::Text("2012-12-31 22:30:00".to_string()));
    }

    #[test]
    fn test_option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn test_json_object_keeps_key_order() {
        let fields = Fields::from(
            json!({ "id": 1, "not": true, "name": "bob" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["id", "not", "name"]);
    }

    #[test]
    fn test_json_tagged_objects() {
        assert_eq!(Operand::from(json!({ "raw": "NOW()" })), Operand::raw("NOW()"));
        assert_eq!(
            Operand::from(json!({ "data": 2, "modifier": "DATE" })),
            Operand::data_with(2, "DATE")
        );
        assert!(matches!(
            Operand::from(json!({ "blah": 1 })),
            Operand::Object(_)
        ));
    }

    #[test]
    fn test_field_replaces_in_place() {
        let fields = Fields::new().field("a", 1).field("b", 2).field("a", 3);
        let collected: Vec<_> = fields.iter().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(
            collected,
            vec![("a", Operand::from(3)), ("b", Operand::from(2))]
        );
    }
}
