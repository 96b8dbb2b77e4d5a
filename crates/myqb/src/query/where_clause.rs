//! WHERE clause processing.

use super::Query;
use crate::error::{QbError, QbResult};
use crate::value::{Fields, Operand, Value};

/// Input accepted by [`Query::where_clause`] and friends.
///
/// - `Raw`: a SQL fragment (`"id = 1"`), or a field name when a value is given.
/// - `List`: alternatives joined with `OR`, or with `AND` when the first
///   element is the literal `"AND"`. With a value, a list of field names.
/// - `Object`: `field => value` pairs joined with `AND`.
/// - `Query`: another query whose WHERE list is merged as a compound group.
/// - `Value`: any other scalar. Always rejected.
#[derive(Debug, Clone)]
pub enum Where {
    Raw(String),
    List(Vec<Where>),
    Object(Fields),
    Query(Box<Query>),
    Value(Value),
}

impl Where {
    fn kind(&self) -> &'static str {
        match self {
            Where::Raw(_) => "string",
            Where::List(_) => "array",
            Where::Object(_) => "object",
            Where::Query(_) => "query",
            Where::Value(value) => value.kind(),
        }
    }
}

impl From<&str> for Where {
    fn from(sql: &str) -> Self {
        Where::Raw(sql.to_string())
    }
}

impl From<String> for Where {
    fn from(sql: String) -> Self {
        Where::Raw(sql)
    }
}

impl From<&String> for Where {
    fn from(sql: &String) -> Self {
        Where::Raw(sql.clone())
    }
}

impl From<Fields> for Where {
    fn from(fields: Fields) -> Self {
        Where::Object(fields)
    }
}

impl From<Query> for Where {
    fn from(query: Query) -> Self {
        Where::Query(Box::new(query))
    }
}

impl From<&Query> for Where {
    fn from(query: &Query) -> Self {
        Where::Query(Box::new(query.clone()))
    }
}

impl From<Value> for Where {
    fn from(value: Value) -> Self {
        Where::Value(value)
    }
}

impl<T: Into<Where>> From<Vec<T>> for Where {
    fn from(items: Vec<T>) -> Self {
        Where::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Where>, const N: usize> From<[T; N]> for Where {
    fn from(items: [T; N]) -> Self {
        Where::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Where {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(sql) => Where::Raw(sql),
            serde_json::Value::Array(items) => {
                Where::List(items.into_iter().map(Where::from).collect())
            }
            serde_json::Value::Object(map) => Where::Object(Fields::from(map)),
            scalar => Where::Value(Value::from_json(&scalar).unwrap_or(Value::Null)),
        }
    }
}

fn unprocessable(kind: &str) -> QbError {
    QbError::shape(format!(
        "Where clause could not be processed. Found {kind} instead."
    ))
}

/// Operator applied to keys following a `not: true` marker.
fn negate(operator: &str) -> String {
    if operator == "=" {
        "!=".to_string()
    } else if operator.eq_ignore_ascii_case("LIKE") {
        "NOT LIKE".to_string()
    } else {
        operator.to_string()
    }
}

/// Collapse processed fragments into one clause.
///
/// One fragment is returned bare, several are parenthesized and joined with
/// `OR` (or `AND` when led by the `"AND"` sentinel), none yields `None`.
pub(crate) fn reduce_where_list(mut parts: Vec<String>) -> Option<String> {
    if parts.first().is_some_and(|part| part == "AND") {
        parts.remove(0);
        return join_group(parts, " AND ");
    }
    join_group(parts, " OR ")
}

fn join_group(mut parts: Vec<String>, boolean: &str) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!("({})", parts.join(boolean))),
    }
}

impl Query {
    /// Add a WHERE clause from a raw fragment, list, object or compound query.
    ///
    /// ```ignore
    /// q.where_clause("id = 1")?;
    /// q.where_clause(["AND", "a = 1", "b = 2"])?;
    /// q.where_clause(Fields::new().field("id", 1).not().field("name", "bob"))?;
    /// ```
    pub fn where_clause(&mut self, clause: impl Into<Where>) -> QbResult<&mut Self> {
        self.where_with(Some(clause.into()), None, None, None)
    }

    /// `field = value`. A list of fields is OR-ed; a list of values becomes `IN (...)`.
    pub fn where_eq(
        &mut self,
        field: impl Into<Where>,
        value: impl Into<Operand>,
    ) -> QbResult<&mut Self> {
        self.where_with(Some(field.into()), Some(value.into()), None, None)
    }

    /// `field <operator> value`.
    pub fn where_op(
        &mut self,
        field: impl Into<Where>,
        value: impl Into<Operand>,
        operator: &str,
    ) -> QbResult<&mut Self> {
        self.where_with(Some(field.into()), Some(value.into()), Some(operator), None)
    }

    /// Full WHERE dispatch.
    ///
    /// - `clause == None` clears every WHERE clause.
    /// - With a `value`, `clause` names the field(s) to compare.
    /// - Without one, `clause` is a fragment, list, object or compound query,
    ///   and `operator`/`modifier` apply to object keys.
    pub fn where_with(
        &mut self,
        clause: Option<Where>,
        value: Option<Operand>,
        operator: Option<&str>,
        modifier: Option<&str>,
    ) -> QbResult<&mut Self> {
        let Some(clause) = clause else {
            self.attributes.where_clauses.clear();
            return Ok(self);
        };

        let parts = match (clause, value) {
            (field @ (Where::Raw(_) | Where::List(_)), Some(value)) => {
                let mut fields = Vec::new();
                collect_fields(field, &mut fields)?;
                let mut parts = Vec::new();
                for field in &fields {
                    parts.extend(self.process_where_condition(field, &value, operator, modifier)?);
                }
                parts
            }
            (Where::Raw(sql), None) => vec![sql],
            (Where::List(items), None) => self.process_where_list(items, operator, modifier)?,
            (Where::Object(fields), None) => self
                .process_where_object(&fields, operator, modifier)?
                .into_iter()
                .collect(),
            (Where::Query(query), None) => self.merge_compound_where(&query),
            (clause, _) => return Err(unprocessable(clause.kind())),
        };

        if let Some(clause) = reduce_where_list(parts) {
            self.attributes.where_clauses.push(clause);
        }
        Ok(self)
    }

    /// Remove every WHERE clause.
    pub fn clear_where(&mut self) -> &mut Self {
        self.attributes.where_clauses.clear();
        self
    }

    /// `field BETWEEN from AND to`.
    pub fn where_between(
        &mut self,
        field: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> QbResult<&mut Self> {
        self.where_between_with(field, from, to, None)
    }

    /// `field BETWEEN MOD(from) AND MOD(to)`.
    pub fn where_between_with(
        &mut self,
        field: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
        modifier: Option<&str>,
    ) -> QbResult<&mut Self> {
        let from = self.create_binding(from, modifier);
        let to = self.create_binding(to, modifier);
        self.where_clause(format!("{field} BETWEEN {from} AND {to}"))
    }

    /// `field LIKE value`.
    pub fn where_like(&mut self, field: impl Into<Where>, value: impl Into<Operand>) -> QbResult<&mut Self> {
        self.where_op(field, value, "LIKE")
    }

    /// Every key of `fields` compared with `LIKE`.
    pub fn where_like_object(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.where_with(Some(Where::Object(fields.into())), None, Some("LIKE"), None)
    }

    /// `field != value` (`NOT IN` for a list).
    pub fn where_not(&mut self, field: impl Into<Where>, value: impl Into<Operand>) -> QbResult<&mut Self> {
        self.where_op(field, value, "!=")
    }

    /// Every key of `fields` compared with `!=`.
    pub fn where_not_object(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.where_with(Some(Where::Object(fields.into())), None, Some("!="), None)
    }

    /// `field NOT LIKE value`.
    pub fn where_not_like(&mut self, field: impl Into<Where>, value: impl Into<Operand>) -> QbResult<&mut Self> {
        self.where_op(field, value, "NOT LIKE")
    }

    /// Every key of `fields` compared with `NOT LIKE`.
    pub fn where_not_like_object(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.where_with(Some(Where::Object(fields.into())), None, Some("NOT LIKE"), None)
    }

    /// Open-ended range: `BETWEEN` when both ends are given, `>=` or `<=`
    /// when only one is, nothing when both are NULL.
    pub fn where_in_range(
        &mut self,
        field: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> QbResult<&mut Self> {
        match (from.into(), to.into()) {
            (Value::Null, Value::Null) => Ok(self),
            (from, Value::Null) => self.where_op(field, from, ">="),
            (Value::Null, to) => self.where_op(field, to, "<="),
            (from, to) => self.where_between(field, from, to),
        }
    }

    fn process_where_list(
        &mut self,
        items: Vec<Where>,
        operator: Option<&str>,
        modifier: Option<&str>,
    ) -> QbResult<Vec<String>> {
        let mut parts = Vec::new();
        for item in items {
            match item {
                Where::Raw(sql) => parts.push(sql),
                Where::List(nested) => {
                    parts.extend(self.process_where_list(nested, operator, modifier)?)
                }
                Where::Object(fields) => {
                    parts.extend(self.process_where_object(&fields, operator, modifier)?)
                }
                Where::Query(query) => {
                    let merged = self.merge_compound_where(&query);
                    parts.extend(reduce_where_list(merged));
                }
                Where::Value(value) => return Err(unprocessable(value.kind())),
            }
        }
        Ok(parts)
    }

    /// One comparison per field, value list expanded into `IN`/`NOT IN` or
    /// into one comparison per value for other operators.
    pub(crate) fn process_where_condition(
        &mut self,
        field: &str,
        value: &Operand,
        operator: Option<&str>,
        modifier: Option<&str>,
    ) -> QbResult<Vec<String>> {
        let operator = operator.unwrap_or("=");

        let Operand::List(values) = value else {
            let binding = self.bind_operand(value, modifier)?;
            return Ok(vec![format!("{field} {operator} {binding}")]);
        };

        let keyword = match operator {
            "=" => "IN",
            "!=" => "NOT IN",
            _ => {
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.extend(self.process_where_condition(field, value, Some(operator), modifier)?);
                }
                return Ok(parts);
            }
        };

        let bindings = values
            .iter()
            .map(|v| self.bind_operand(v, modifier))
            .collect::<QbResult<Vec<_>>>()?;
        Ok(vec![format!("{field} {keyword} ({})", bindings.join(","))])
    }

    /// Object keys in insertion order, AND-joined. A `not: true` key negates
    /// the operator for the keys after it.
    pub(crate) fn process_where_object(
        &mut self,
        fields: &Fields,
        operator: Option<&str>,
        modifier: Option<&str>,
    ) -> QbResult<Option<String>> {
        let mut operator = operator.unwrap_or("=").to_string();
        let mut parts = Vec::new();

        for (field, value) in fields.iter() {
            if field == "not" && value.is_negation_marker() {
                operator = negate(&operator);
                continue;
            }
            parts.extend(self.process_where_condition(field, value, Some(&operator), modifier)?);
        }

        Ok(join_group(parts, " AND "))
    }
}

fn collect_fields(clause: Where, out: &mut Vec<String>) -> QbResult<()> {
    match clause {
        Where::Raw(field) => out.push(field),
        Where::List(items) => {
            for item in items {
                collect_fields(item, out)?;
            }
        }
        other => return Err(unprocessable(other.kind())),
    }
    Ok(())
}
