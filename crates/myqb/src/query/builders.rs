//! Statement builders: render the accumulated state into SQL text.

use super::{Action, Compiled, Query};
use crate::error::{QbError, QbResult};
use crate::ident::table_ref;
use crate::value::{Operand, Value, mysql_datetime};

/// Output of a statement builder.
pub(crate) enum Built {
    /// SQL still holding `{{token}}` placeholders.
    Template(String),
    /// Final SQL and data, bypassing placeholder resolution.
    Compiled(Compiled),
}

impl Query {
    pub(crate) fn build(&self, action: Action) -> QbResult<Built> {
        match action {
            Action::Select => Ok(Built::Template(self.build_select())),
            Action::Update => self.build_update().map(Built::Template),
            Action::Insert if !self.attributes.rows.is_empty() => {
                Ok(Built::Compiled(self.build_insert_rows()))
            }
            Action::Insert => self.build_insert().map(Built::Template),
            Action::Delete => self.build_delete().map(Built::Template),
        }
    }

    /// The sub-query source if one was set, else `` `db`.`table` alias ``.
    pub(crate) fn table_name(&self) -> String {
        if let Some(subquery) = &self.attributes.from_subquery {
            return subquery.clone();
        }
        table_ref(
            self.attributes.database.as_deref(),
            self.attributes.table_name.as_deref().unwrap_or_default(),
            self.attributes.alias.as_deref(),
        )
    }

    /// A non-empty table name or a sub-query source is set.
    pub(crate) fn has_source(&self) -> bool {
        self.attributes
            .table_name
            .as_deref()
            .is_some_and(|table| !table.is_empty())
            || self.attributes.from_subquery.is_some()
    }

    fn where_sql(&self) -> String {
        let boolean = self.attributes.where_boolean.map_or("AND", |b| b.as_sql());
        self.attributes.where_clauses.join(&format!(" {boolean} "))
    }

    /// Explicit column list, or `None` for the default `*`.
    fn target_columns(&self) -> Option<String> {
        let columns = self.attributes.columns.join(", ");
        (!columns.is_empty() && columns != "*").then_some(columns)
    }

    pub(crate) fn build_select(&self) -> String {
        let columns = self.attributes.columns.join(", ");
        let mut q = vec!["SELECT".to_string()];
        if self.attributes.distinct {
            q.push(format!("DISTINCT {columns}"));
        } else {
            q.push(columns);
        }
        q.push("FROM".to_string());
        q.push(self.table_name());
        q.extend(self.attributes.joins.iter().cloned());

        if !self.attributes.where_clauses.is_empty() {
            q.push("WHERE".to_string());
            q.push(self.where_sql());
        }
        if !self.attributes.group_by.is_empty() {
            q.push("GROUP BY".to_string());
            q.push(self.attributes.group_by.join(", "));
        }
        if !self.attributes.order_by.is_empty() {
            q.push("ORDER BY".to_string());
            q.push(self.attributes.order_by.join(", "));
        }
        if let Some(limit) = &self.attributes.limit {
            q.push(limit.clone());
        }

        q.join(" ")
    }

    fn build_update(&self) -> QbResult<String> {
        if self.attributes.set.is_empty() {
            return Err(QbError::precondition(
                "No values to update have been defined",
            ));
        }
        if self.attributes.where_clauses.is_empty() {
            return Err(QbError::precondition(
                "No where clauses have been defined for the update query.",
            ));
        }

        let mut q = vec!["UPDATE".to_string(), self.table_name()];
        q.extend(self.attributes.joins.iter().cloned());
        q.push("SET".to_string());
        q.push(self.attributes.set.join(", "));
        q.push("WHERE".to_string());
        q.push(self.where_sql());

        Ok(q.join(" "))
    }

    fn build_insert(&self) -> QbResult<String> {
        if self.attributes.set.is_empty() {
            return Err(QbError::precondition(
                "No values to insert have been defined",
            ));
        }

        Ok(format!(
            "{} INTO {} SET {}",
            self.attributes.insert_mode.keyword(),
            self.table_name(),
            self.attributes.set.join(", ")
        ))
    }

    /// `INSERT INTO t ( a, b ) VALUES (?, ?), (?, ?)` with row values
    /// serialized directly, row-major.
    fn build_insert_rows(&self) -> Compiled {
        let columns = &self.attributes.columns;
        let mut data = Vec::new();

        let rows: Vec<String> = self
            .attributes
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| match row.get(column) {
                        None | Some(Operand::Value(Value::Null)) => "NULL".to_string(),
                        Some(Operand::Raw(sql)) => sql.clone(),
                        Some(Operand::Value(value) | Operand::Data { data: value, .. }) => {
                            row_cell(value, &mut data)
                        }
                        Some(Operand::List(_) | Operand::Object(_)) => "NULL".to_string(),
                    })
                    .collect();
                format!("({})", cells.join(", "))
            })
            .collect();

        let mut q = vec![
            format!("{} INTO", self.attributes.insert_mode.keyword()),
            self.table_name(),
            "(".to_string(),
        ];
        q.extend(self.target_columns());
        q.push(") VALUES".to_string());
        q.push(rows.join(", "));

        Compiled {
            query: q.join(" "),
            data,
        }
    }

    fn build_delete(&self) -> QbResult<String> {
        if self.attributes.where_clauses.is_empty() {
            return Err(QbError::precondition(
                "No where clauses have been defined for the delete query.",
            ));
        }

        let mut q = vec!["DELETE".to_string()];
        q.extend(self.target_columns());
        q.push("FROM".to_string());
        q.push(self.table_name());
        q.extend(self.attributes.joins.iter().cloned());
        q.push("WHERE".to_string());
        q.push(self.where_sql());

        Ok(q.join(" "))
    }
}

fn row_cell(value: &Value, data: &mut Vec<Value>) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::DateTime(dt) => format!("'{}'", mysql_datetime(dt)),
        other => {
            data.push(other.clone());
            "?".to_string()
        }
    }
}
