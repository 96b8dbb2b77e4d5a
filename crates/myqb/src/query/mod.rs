//! The query object and its fluent mutators.
//!
//! A [`Query`] accumulates clause state in [`Attributes`] and renders it on
//! [`Query::compile`]. Mutators take `&mut self` and return `&mut Self` (or
//! `QbResult<&mut Self>` when the input can be rejected) for chaining:
//!
//! ```ignore
//! let mut q = Query::new();
//! q.select().from_as("users", "u").where_eq("id", 1)?.limit(10);
//! let compiled = q.compile()?;
//! assert_eq!(compiled.query, "SELECT * FROM `users` u WHERE id = ? LIMIT 10");
//! ```

mod builders;
mod compile;
mod join;
mod subquery;
mod where_clause;

pub use compile::Compiled;
pub use join::{Join, JoinOn, JoinOptions, JoinTarget};
pub use where_clause::Where;

use crate::binding::Bindings;
use crate::config::{QueryConfig, default_bound_parameters};
use crate::error::{QbError, QbResult};
use crate::value::{Fields, Operand, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
}

/// Leading keyword(s) of an insert statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    #[default]
    Insert,
    Replace,
    InsertIgnore,
}

impl InsertMode {
    pub fn keyword(self) -> &'static str {
        match self {
            InsertMode::Insert => "INSERT",
            InsertMode::Replace => "REPLACE",
            InsertMode::InsertIgnore => "INSERT IGNORE",
        }
    }
}

/// Boolean used to join top-level where fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WhereBoolean {
    And,
    Or,
}

impl WhereBoolean {
    pub fn as_sql(self) -> &'static str {
        match self {
            WhereBoolean::And => "AND",
            WhereBoolean::Or => "OR",
        }
    }
}

/// The full state of a query in progress.
///
/// Every field is owned data, so `clone()` is a deep copy and
/// [`Query::export`] never aliases the live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub action: Option<Action>,
    pub insert_mode: InsertMode,
    pub database: Option<String>,
    pub table_name: Option<String>,
    pub alias: Option<String>,
    /// Pre-rendered `(SELECT ...) as \`name\`` source; replaces the table name.
    pub from_subquery: Option<String>,
    /// Name used when this query is rendered as a sub-query.
    pub as_name: Option<String>,
    pub columns: Vec<String>,
    #[serde(rename = "where")]
    pub where_clauses: Vec<String>,
    /// `None` until chosen explicitly; renders as `AND` at the top level.
    pub where_boolean: Option<WhereBoolean>,
    pub set: Vec<String>,
    pub set_keys: HashMap<String, usize>,
    pub joins: Vec<String>,
    pub order_by: Vec<String>,
    pub group_by: Vec<String>,
    pub distinct: bool,
    pub limit: Option<String>,
    /// Rows for a multi-row insert.
    pub rows: Vec<Fields>,
    pub data_bindings: Bindings,
    pub use_bound_parameters: bool,
    pub debug: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            action: None,
            insert_mode: InsertMode::Insert,
            database: None,
            table_name: None,
            alias: None,
            from_subquery: None,
            as_name: None,
            columns: vec!["*".to_string()],
            where_clauses: Vec::new(),
            where_boolean: None,
            set: Vec::new(),
            set_keys: HashMap::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            distinct: false,
            limit: None,
            rows: Vec::new(),
            data_bindings: Bindings::new(),
            use_bound_parameters: default_bound_parameters(),
            debug: false,
        }
    }
}

impl Attributes {
    pub(crate) fn has_default_columns(&self) -> bool {
        self.columns.len() == 1 && self.columns[0] == "*"
    }
}

/// A projected column.
#[derive(Debug, Clone)]
pub enum Column {
    /// Column name or expression, emitted verbatim.
    Name(String),
    /// A literal value, emitted as a binding.
    Value(Value),
    /// A tagged value, optionally wrapped in a SQL function.
    Data {
        data: Value,
        modifier: Option<String>,
    },
    /// A single-column sub-query.
    Subquery(Box<Query>),
}

impl Column {
    pub fn data(value: impl Into<Value>) -> Self {
        Column::Data {
            data: value.into(),
            modifier: None,
        }
    }

    pub fn data_with(value: impl Into<Value>, modifier: impl Into<String>) -> Self {
        Column::Data {
            data: value.into(),
            modifier: Some(modifier.into()),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Name(name)
    }
}

impl From<&String> for Column {
    fn from(name: &String) -> Self {
        Column::Name(name.clone())
    }
}

impl From<Value> for Column {
    fn from(value: Value) -> Self {
        Column::Value(value)
    }
}

macro_rules! impl_column_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Column {
                fn from(v: $ty) -> Self {
                    Column::Value(v.into())
                }
            }
        )+
    };
}

impl_column_from_value!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Column {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Column::Value(v.into())
    }
}

impl From<Query> for Column {
    fn from(query: Query) -> Self {
        Column::Subquery(Box::new(query))
    }
}

impl From<&Query> for Column {
    fn from(query: &Query) -> Self {
        Column::Subquery(Box::new(query.clone()))
    }
}

/// A query in progress.
///
/// `Clone` is a full, independent copy: mutating the clone never affects the
/// original and vice versa.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Query {
    attributes: Attributes,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// Create an empty query using the process-wide defaults.
    pub fn new() -> Self {
        Self::with_config(QueryConfig::new())
    }

    /// Create an empty query with explicit configuration.
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            attributes: Attributes {
                use_bound_parameters: config.use_bound_parameters,
                debug: config.debug,
                ..Attributes::default()
            },
        }
    }

    /// Create a query seeded with previously exported (or hand-built) state.
    pub fn from_attributes(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Read-only view of the current state.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Deep copy of the current state.
    pub fn export(&self) -> Attributes {
        self.attributes.clone()
    }

    /// Toggle the debug flag (logs compiled SQL through `tracing`).
    pub fn debug(&mut self, enable: bool) -> &mut Self {
        self.attributes.debug = enable;
        self
    }

    // ==================== Data bindings ====================

    /// Store `value` under the binding `key`, for use as `{{key}}` inside
    /// raw SQL fragments.
    pub fn insert_binding(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.data_bindings.insert(key, value.into());
        self
    }

    /// Store `value` and return the placeholder text for it.
    ///
    /// Booleans and NULL come back as `TRUE`/`FALSE`/`NULL` without a binding.
    pub fn create_binding(&mut self, value: impl Into<Value>, modifier: Option<&str>) -> String {
        self.attributes.data_bindings.bind(value.into(), modifier)
    }

    /// Bind an operand that must resolve to a single value.
    pub(crate) fn bind_operand(
        &mut self,
        operand: &Operand,
        modifier: Option<&str>,
    ) -> QbResult<String> {
        match operand {
            Operand::Value(value) => Ok(self.create_binding(value.clone(), modifier)),
            Operand::Data {
                data,
                modifier: own,
            } => {
                let modifier = own.as_deref().or(modifier);
                Ok(self.create_binding(data.clone(), modifier))
            }
            Operand::List(_) | Operand::Raw(_) | Operand::Object(_) => {
                Err(QbError::unparsable_value())
            }
        }
    }

    // ==================== Actions ====================

    /// Make this a SELECT query.
    pub fn select(&mut self) -> &mut Self {
        self.attributes.action = Some(Action::Select);
        self
    }

    /// Make this a SELECT query and replace the column list.
    pub fn select_columns<I, C>(&mut self, columns: I) -> QbResult<&mut Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.select();
        self.columns(columns)
    }

    fn insert_as(&mut self, mode: InsertMode) -> &mut Self {
        self.attributes.action = Some(Action::Insert);
        self.attributes.insert_mode = mode;
        self
    }

    /// Make this an INSERT query.
    pub fn insert(&mut self) -> &mut Self {
        self.insert_as(InsertMode::Insert)
    }

    /// Make this an INSERT query and assign `fields`.
    pub fn insert_fields(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.insert().set_fields(fields)
    }

    /// Make this a REPLACE query.
    pub fn replace(&mut self) -> &mut Self {
        self.insert_as(InsertMode::Replace)
    }

    /// Make this a REPLACE query and assign `fields`.
    pub fn replace_fields(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.replace().set_fields(fields)
    }

    /// Make this an INSERT IGNORE query.
    pub fn insert_ignore(&mut self) -> &mut Self {
        self.insert_as(InsertMode::InsertIgnore)
    }

    /// Make this an INSERT IGNORE query and assign `fields`.
    pub fn insert_ignore_fields(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.insert_ignore().set_fields(fields)
    }

    /// Make this an UPDATE query.
    pub fn update(&mut self) -> &mut Self {
        self.attributes.action = Some(Action::Update);
        self
    }

    /// Make this an UPDATE query against `table`.
    pub fn update_table(&mut self, table: &str) -> &mut Self {
        self.update().table(table)
    }

    /// Make this an UPDATE query against `table` with an alias.
    pub fn update_table_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.update().table_as(table, alias)
    }

    /// Make this a DELETE query.
    pub fn delete(&mut self) -> &mut Self {
        self.attributes.action = Some(Action::Delete);
        self
    }

    /// Make this a DELETE query against `table`.
    pub fn delete_from(&mut self, table: &str) -> &mut Self {
        self.delete().from(table)
    }

    /// Make this a DELETE query against `table` with an alias.
    pub fn delete_from_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.delete().from_as(table, alias)
    }

    /// Multi-table DELETE.
    ///
    /// With an alias, the first table becomes the aliased source and the
    /// target list is the alias followed by the remaining names:
    /// `delete_from_tables(&["users", "p"], Some("u"))` renders
    /// `DELETE u, p FROM \`users\` u ...`. Without an alias every name is a
    /// target and the source must be set with [`Query::from`].
    pub fn delete_from_tables(&mut self, tables: &[&str], alias: Option<&str>) -> QbResult<&mut Self> {
        self.delete();
        match (tables.split_first(), alias) {
            (None, _) => Err(QbError::precondition(
                "You must define at least one table to delete from.",
            )),
            (Some((first, rest)), Some(alias)) => {
                self.from_as(first, alias);
                let targets = std::iter::once(alias).chain(rest.iter().copied());
                self.columns(targets)
            }
            (Some(_), None) => self.columns(tables.iter().copied()),
        }
    }

    // ==================== Sources ====================

    /// Set the table the query runs against.
    pub fn table(&mut self, table: &str) -> &mut Self {
        self.attributes.table_name = Some(table.to_string());
        self
    }

    /// Set the table and its alias.
    pub fn table_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.table(table);
        self.attributes.alias = Some(alias.to_string());
        self
    }

    /// Alias for [`Query::table`].
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.table(table)
    }

    /// Alias for [`Query::table_as`].
    pub fn from_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.table_as(table, alias)
    }

    /// Alias for [`Query::table`], reading as `INSERT INTO`.
    pub fn into_table(&mut self, table: &str) -> &mut Self {
        self.table(table)
    }

    /// Alias for [`Query::table_as`].
    pub fn into_table_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.table_as(table, alias)
    }

    /// Set the database the table lives in.
    pub fn database(&mut self, database: &str) -> &mut Self {
        self.attributes.database = Some(database.to_string());
        self
    }

    /// Set database and table.
    pub fn from_database(&mut self, database: &str, table: &str) -> &mut Self {
        self.database(database).table(table)
    }

    /// Set database, table and alias.
    pub fn from_database_as(&mut self, database: &str, table: &str, alias: &str) -> &mut Self {
        self.database(database).table_as(table, alias)
    }

    /// Alias for [`Query::from_database`].
    pub fn into_database(&mut self, database: &str, table: &str) -> &mut Self {
        self.from_database(database, table)
    }

    /// Alias for [`Query::from_database_as`].
    pub fn into_database_as(&mut self, database: &str, table: &str, alias: &str) -> &mut Self {
        self.from_database_as(database, table, alias)
    }

    /// Name used when this query is embedded as a sub-query.
    pub fn as_name(&mut self, name: &str) -> &mut Self {
        self.attributes.as_name = Some(name.to_string());
        self
    }

    // ==================== Columns ====================

    /// Replace the column list.
    ///
    /// An empty iterator restores the default `*`.
    pub fn columns<I, C>(&mut self, columns: I) -> QbResult<&mut Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.attributes.columns.clear();
        for column in columns {
            self.push_column(column.into(), false)?;
        }
        if self.attributes.columns.is_empty() {
            self.attributes.columns.push("*".to_string());
        }
        Ok(self)
    }

    /// Append a column. A default `*` list is replaced by the first real column.
    pub fn add_column(&mut self, column: impl Into<Column>) -> QbResult<&mut Self> {
        self.push_column(column.into(), false)?;
        Ok(self)
    }

    /// Append a column unless an identical name is already present.
    ///
    /// Value and sub-query columns are always appended.
    pub fn add_column_unique(&mut self, column: impl Into<Column>) -> QbResult<&mut Self> {
        self.push_column(column.into(), true)?;
        Ok(self)
    }

    fn push_column(&mut self, column: Column, avoid_duplicates: bool) -> QbResult<()> {
        if self.attributes.has_default_columns() {
            self.attributes.columns.clear();
        }

        let (rendered, avoid_duplicates) = match column {
            Column::Name(name) => (name, avoid_duplicates),
            Column::Value(Value::Text(name)) => (name, avoid_duplicates),
            Column::Value(value @ (Value::Int(_) | Value::Float(_) | Value::DateTime(_))) => {
                (self.create_binding(value, None), false)
            }
            Column::Value(value) => {
                return Err(QbError::shape(format!(
                    "Unknown column type: {}",
                    value.kind()
                )));
            }
            Column::Data { data, modifier } => {
                (self.create_binding(data, modifier.as_deref()), false)
            }
            Column::Subquery(query) => {
                let columns = &query.attributes.columns;
                if columns.len() != 1 || columns[0] == "*" {
                    return Err(QbError::precondition(
                        "Column level subqueries can only return a single column.",
                    ));
                }
                (self.merge_subquery(&query)?, false)
            }
        };

        if !avoid_duplicates || !self.attributes.columns.contains(&rendered) {
            self.attributes.columns.push(rendered);
        }
        Ok(())
    }

    // ==================== SET ====================

    /// Append a verbatim assignment such as `lastlogin = NOW()`.
    pub fn set_raw(&mut self, statement: &str) -> &mut Self {
        self.attributes.set.push(statement.to_string());
        self
    }

    /// Assign `value` to `column`. A later assignment to the same column
    /// replaces the earlier one in place.
    pub fn set(&mut self, column: &str, value: impl Into<Operand>) -> QbResult<&mut Self> {
        self.set_with(column, value, None)
    }

    /// Assign `value` to `column`, wrapping the binding in `modifier(...)`.
    pub fn set_with(
        &mut self,
        column: &str,
        value: impl Into<Operand>,
        modifier: Option<&str>,
    ) -> QbResult<&mut Self> {
        let rendered = match value.into() {
            Operand::Raw(sql) => sql,
            operand @ (Operand::Value(_) | Operand::Data { .. }) => {
                self.bind_operand(&operand, modifier)?
            }
            Operand::List(_) | Operand::Object(_) => {
                return Err(QbError::shape("Unknown data type in set clause"));
            }
        };

        let clause = format!("{column} = {rendered}");
        let slot = self
            .attributes
            .set_keys
            .get(column)
            .copied()
            .and_then(|index| self.attributes.set.get_mut(index));
        match slot {
            Some(slot) => *slot = clause,
            None => {
                self.attributes
                    .set_keys
                    .insert(column.to_string(), self.attributes.set.len());
                self.attributes.set.push(clause);
            }
        }
        Ok(self)
    }

    /// Assign every field of `fields`, in order.
    pub fn set_fields(&mut self, fields: impl Into<Fields>) -> QbResult<&mut Self> {
        self.set_fields_with(fields, None)
    }

    /// Assign every field of `fields`, wrapping each binding in `modifier(...)`.
    pub fn set_fields_with(
        &mut self,
        fields: impl Into<Fields>,
        modifier: Option<&str>,
    ) -> QbResult<&mut Self> {
        let fields: Fields = fields.into();
        for (column, value) in fields.iter() {
            self.set_with(column, value.clone(), modifier)?;
        }
        Ok(self)
    }

    // ==================== Multi-row insert ====================

    /// Add a row for a multi-row insert.
    ///
    /// Keys not yet in the column list are appended to it.
    pub fn add_row(&mut self, row: impl Into<Fields>) -> QbResult<&mut Self> {
        let row: Fields = row.into();
        for (key, value) in row.iter() {
            if matches!(value, Operand::List(_) | Operand::Object(_)) {
                return Err(QbError::shape(format!(
                    "Unknown data type in row for column {key}"
                )));
            }
        }

        if self.attributes.has_default_columns() {
            self.attributes.columns.clear();
        }
        for key in row.keys() {
            if !self.attributes.columns.iter().any(|c| c == key) {
                self.attributes.columns.push(key.to_string());
            }
        }
        self.attributes.rows.push(row);
        Ok(self)
    }

    /// Add a row given positionally, matching the already-defined columns.
    pub fn add_row_values<I, V>(&mut self, values: I) -> QbResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        if self.attributes.has_default_columns() || self.attributes.columns.is_empty() {
            return Err(QbError::precondition(
                "Columns must be defined before adding rows as value lists.",
            ));
        }
        let row: Fields = self
            .attributes
            .columns
            .iter()
            .cloned()
            .zip(values.into_iter().map(Into::<Operand>::into))
            .collect();
        self.add_row(row)
    }

    // ==================== Ordering / grouping / paging ====================

    /// Replace the ORDER BY list.
    pub fn order_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.order_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the GROUP BY list.
    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Toggle `SELECT DISTINCT`.
    pub fn distinct(&mut self, enable: bool) -> &mut Self {
        self.attributes.distinct = enable;
        self
    }

    /// `LIMIT max`. A zero `max` removes the limit.
    pub fn limit(&mut self, max: u64) -> &mut Self {
        self.limit_offset(max, 0)
    }

    /// `LIMIT offset, max`. A zero `max` removes the limit; a zero offset is omitted.
    pub fn limit_offset(&mut self, max: u64, offset: u64) -> &mut Self {
        self.attributes.limit = match (max, offset) {
            (0, _) => None,
            (max, 0) => Some(format!("LIMIT {max}")),
            (max, offset) => Some(format!("LIMIT {offset}, {max}")),
        };
        self
    }

    // ==================== Flags ====================

    /// Choose how top-level where fragments are joined: `and`/`AND`/`yes`
    /// or `or`/`OR`/`no`. Anything else leaves the setting unchanged.
    pub fn comparison_method(&mut self, condition: &str) -> &mut Self {
        match condition.trim() {
            "and" | "AND" | "yes" => self.attributes.where_boolean = Some(WhereBoolean::And),
            "or" | "OR" | "no" => self.attributes.where_boolean = Some(WhereBoolean::Or),
            _ => {}
        }
        self
    }

    /// Boolean form of [`Query::comparison_method`]: `true` is AND, `false` is OR.
    pub fn match_all(&mut self, all: bool) -> &mut Self {
        self.attributes.where_boolean = Some(if all {
            WhereBoolean::And
        } else {
            WhereBoolean::Or
        });
        self
    }

    /// Inline escaped literals instead of `?` marks when `disable` is true.
    pub fn disable_bound_parameters(&mut self, disable: bool) -> &mut Self {
        self.attributes.use_bound_parameters = !disable;
        self
    }

    /// Use `?` marks and a data array when `enable` is true.
    pub fn use_bound_parameters(&mut self, enable: bool) -> &mut Self {
        self.disable_bound_parameters(!enable)
    }
}
