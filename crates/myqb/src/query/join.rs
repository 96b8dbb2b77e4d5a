//! JOIN clauses.

use super::Query;
use crate::error::{QbError, QbResult};
use crate::value::{Fields, Operand, Value};
use regex::Regex;
use std::sync::OnceLock;

/// Leading `[INNER|LEFT|...] JOIN` keyword run of a raw join string.
fn join_prefix() -> &'static Regex {
    static JOIN_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    JOIN_PREFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:(?:NATURAL|INNER|CROSS|LEFT|RIGHT|FULL|OUTER)\s+)*JOIN\s+")
            .expect("invalid built-in join prefix regex")
    })
}

/// What a structured join points at.
#[derive(Debug, Clone)]
pub enum JoinTarget {
    Table(String),
    Subquery(Box<Query>),
}

impl From<&str> for JoinTarget {
    fn from(table: &str) -> Self {
        JoinTarget::Table(table.to_string())
    }
}

impl From<String> for JoinTarget {
    fn from(table: String) -> Self {
        JoinTarget::Table(table)
    }
}

impl From<Query> for JoinTarget {
    fn from(query: Query) -> Self {
        JoinTarget::Subquery(Box::new(query))
    }
}

impl From<&Query> for JoinTarget {
    fn from(query: &Query) -> Self {
        JoinTarget::Subquery(Box::new(query.clone()))
    }
}

/// `ON` conditions of a structured join.
///
/// - `Raw`: emitted as-is.
/// - `List`: each entry processed and joined with the join's `on_boolean`.
/// - `Fields`: `left => right` pairs. A string right side is a column
///   reference (`p.userid => u.id`), a list becomes `IN ( ... )`, other
///   values are bound. `not: true` negates the keys after it.
#[derive(Debug, Clone)]
pub enum JoinOn {
    Raw(String),
    List(Vec<JoinOn>),
    Fields(Fields),
}

impl From<&str> for JoinOn {
    fn from(sql: &str) -> Self {
        JoinOn::Raw(sql.to_string())
    }
}

impl From<String> for JoinOn {
    fn from(sql: String) -> Self {
        JoinOn::Raw(sql)
    }
}

impl From<Fields> for JoinOn {
    fn from(fields: Fields) -> Self {
        JoinOn::Fields(fields)
    }
}

impl<T: Into<JoinOn>> From<Vec<T>> for JoinOn {
    fn from(items: Vec<T>) -> Self {
        JoinOn::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<JoinOn>, const N: usize> From<[T; N]> for JoinOn {
    fn from(items: [T; N]) -> Self {
        JoinOn::List(items.into_iter().map(Into::into).collect())
    }
}

/// Options for a structured join.
///
/// ```ignore
/// q.join_with("passwords", JoinOptions::new().alias("p").on("p.userid = u.id"))?;
/// // JOIN passwords p ON (p.userid = u.id)
/// ```
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    pub table: Option<JoinTarget>,
    pub alias: Option<String>,
    pub on: Option<JoinOn>,
    /// Boolean joining the `ON` conditions (default `AND`).
    pub on_boolean: Option<String>,
    /// `USING (...)` columns. Takes precedence over `on`.
    pub using: Vec<String>,
    /// Join kind keyword (`INNER`, `LEFT`, ...).
    pub kind: Option<String>,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<JoinTarget>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, on: impl Into<JoinOn>) -> Self {
        self.on = Some(on.into());
        self
    }

    pub fn on_boolean(mut self, boolean: impl Into<String>) -> Self {
        self.on_boolean = Some(boolean.into());
        self
    }

    pub fn using<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.using = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Input accepted by [`Query::join`].
#[derive(Debug, Clone)]
pub enum Join {
    /// A join string. `JOIN ` is prepended when it has no join keyword.
    Raw(String),
    /// A structured join; `table` is required.
    Options(JoinOptions),
    /// A sub-query. Only valid together with options.
    Subquery(Box<Query>),
}

impl From<&str> for Join {
    fn from(sql: &str) -> Self {
        Join::Raw(sql.to_string())
    }
}

impl From<String> for Join {
    fn from(sql: String) -> Self {
        Join::Raw(sql)
    }
}

impl From<JoinOptions> for Join {
    fn from(options: JoinOptions) -> Self {
        Join::Options(options)
    }
}

impl From<Query> for Join {
    fn from(query: Query) -> Self {
        Join::Subquery(Box::new(query))
    }
}

impl From<&Query> for Join {
    fn from(query: &Query) -> Self {
        Join::Subquery(Box::new(query.clone()))
    }
}

impl Query {
    /// Add a join.
    pub fn join(&mut self, join: impl Into<Join>) -> QbResult<&mut Self> {
        self.push_join(join.into(), None)
    }

    /// Add a structured join against `target` (a table name or sub-query).
    pub fn join_with(
        &mut self,
        target: impl Into<JoinTarget>,
        options: JoinOptions,
    ) -> QbResult<&mut Self> {
        self.push_join(Join::Options(options.table(target)), None)
    }

    pub fn inner_join(&mut self, join: impl Into<Join>) -> QbResult<&mut Self> {
        self.push_join(join.into(), Some("INNER"))
    }

    pub fn inner_join_with(
        &mut self,
        target: impl Into<JoinTarget>,
        options: JoinOptions,
    ) -> QbResult<&mut Self> {
        self.push_join(Join::Options(options.table(target)), Some("INNER"))
    }

    pub fn left_join(&mut self, join: impl Into<Join>) -> QbResult<&mut Self> {
        self.push_join(join.into(), Some("LEFT"))
    }

    pub fn left_join_with(
        &mut self,
        target: impl Into<JoinTarget>,
        options: JoinOptions,
    ) -> QbResult<&mut Self> {
        self.push_join(Join::Options(options.table(target)), Some("LEFT"))
    }

    pub fn right_join(&mut self, join: impl Into<Join>) -> QbResult<&mut Self> {
        self.push_join(join.into(), Some("RIGHT"))
    }

    pub fn right_join_with(
        &mut self,
        target: impl Into<JoinTarget>,
        options: JoinOptions,
    ) -> QbResult<&mut Self> {
        self.push_join(Join::Options(options.table(target)), Some("RIGHT"))
    }

    fn push_join(&mut self, join: Join, kind: Option<&str>) -> QbResult<&mut Self> {
        let rendered = match join {
            Join::Raw(sql) => {
                if sql.trim().is_empty() {
                    return Err(QbError::precondition(
                        "You must define a table to join against.",
                    ));
                }
                let prefix = join_prefix();
                match kind {
                    None if prefix.is_match(&sql) => sql,
                    None => format!("JOIN {sql}"),
                    Some(kind) => {
                        let stripped = prefix.replace(&sql, "");
                        format!("{kind} JOIN {stripped}")
                    }
                }
            }
            Join::Subquery(_) => {
                return Err(QbError::precondition(
                    "You must define join options when joining against a subquery.",
                ));
            }
            Join::Options(mut options) => {
                if let Some(kind) = kind {
                    options.kind = Some(kind.to_string());
                }
                self.render_join(options)?
            }
        };

        self.attributes.joins.push(rendered);
        Ok(self)
    }

    fn render_join(&mut self, options: JoinOptions) -> QbResult<String> {
        let mut stack: Vec<String> = Vec::new();
        if let Some(kind) = options.kind {
            stack.push(kind);
        }
        stack.push("JOIN".to_string());

        match options.table {
            Some(JoinTarget::Table(table)) if !table.is_empty() => {
                stack.push(table);
                stack.extend(options.alias);
            }
            Some(JoinTarget::Subquery(mut query)) => {
                if let Some(alias) = options.alias.as_deref() {
                    query.as_name(alias);
                }
                stack.push(self.merge_subquery(&query)?);
            }
            _ => return Err(QbError::shape("You must define a table to join against")),
        }

        if !options.using.is_empty() {
            stack.push(format!("USING ({})", options.using.join(", ")));
        } else if let Some(on) = &options.on {
            let boolean = options.on_boolean.as_deref().unwrap_or("AND");
            stack.push(format!("ON ({})", self.process_join_ons(on, boolean)?));
        }

        Ok(stack.join(" "))
    }

    /// Render `ON` conditions, joining top-level entries with `on_boolean`.
    pub(crate) fn process_join_ons(&mut self, on: &JoinOn, on_boolean: &str) -> QbResult<String> {
        let parts = match on {
            JoinOn::Raw(sql) => return Ok(sql.clone()),
            JoinOn::List(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.process_join_ons(item, "AND")?);
                }
                parts
            }
            JoinOn::Fields(fields) => self.process_join_fields(fields)?,
        };

        let separator = format!(" {on_boolean} ");
        Ok(parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(&separator))
    }

    fn process_join_fields(&mut self, fields: &Fields) -> QbResult<Vec<String>> {
        let mut not = false;
        let mut parts = Vec::with_capacity(fields.len());

        for (field, value) in fields.iter() {
            if field == "not" && value.is_negation_marker() {
                not = true;
                continue;
            }

            let (eq, within) = if not { ("!=", "NOT IN") } else { ("=", "IN") };
            let part = match value {
                Operand::List(values) => {
                    let bindings = values
                        .iter()
                        .map(|v| self.bind_operand(v, None))
                        .collect::<QbResult<Vec<_>>>()?;
                    format!("{field} {within} ( {} )", bindings.join(", "))
                }
                Operand::Value(Value::Text(column)) => format!("{field} {eq} {column}"),
                Operand::Raw(sql) => format!("{field} {eq} {sql}"),
                Operand::Value(_) | Operand::Data { .. } => {
                    format!("{field} {eq} {}", self.bind_operand(value, None)?)
                }
                Operand::Object(_) => {
                    return Err(QbError::shape(format!(
                        "Encountered unexpected value while parsing a JOIN ON condition for {field}"
                    )));
                }
            };
            parts.push(part);
        }

        Ok(parts)
    }
}
