//! Compilation: builder output to final SQL plus ordered data.

use super::Query;
use super::builders::Built;
use crate::binding::token_pattern;
use crate::error::{QbError, QbResult};
use crate::escape::escape_value;
use crate::exec::Executor;
use crate::value::Value;
use serde::Serialize;
use tracing::{debug, warn};

/// A compiled statement: SQL with `?` marks and the values for them, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    pub query: String,
    pub data: Vec<Value>,
}

impl Compiled {
    /// Number of bound values.
    pub fn param_count(&self) -> usize {
        self.data.len()
    }
}

impl Query {
    /// Render the query.
    ///
    /// Requires an action and a table (or sub-query source). Every
    /// `{{token}}` in the builder output is replaced left to right with `?`
    /// (pushing its value) or, when bound parameters are disabled, with the
    /// escaped literal. The query state is not modified.
    pub fn compile(&self) -> QbResult<Compiled> {
        let action = self.attributes.action.ok_or_else(|| {
            QbError::precondition(
                "Query operation undefined, must identify if performing a select/update/insert/delete query.",
            )
        })?;
        if !self.has_source() {
            return Err(QbError::precondition("No table name has been defined"));
        }

        let compiled = match self.build(action)? {
            Built::Template(sql) => self.resolve_placeholders(&sql)?,
            Built::Compiled(compiled) => compiled,
        };

        if self.attributes.debug {
            debug!(
                target: "myqb.sql",
                action = ?action,
                param_count = compiled.param_count(),
                sql = %compiled.query,
                "compiled query"
            );
        }

        Ok(compiled)
    }

    /// Compile with every value inlined as an escaped literal.
    pub fn to_literal_sql(&self) -> QbResult<String> {
        let mut literal = self.clone();
        literal.disable_bound_parameters(true);
        literal.compile().map(|compiled| compiled.query)
    }

    fn resolve_placeholders(&self, sql: &str) -> QbResult<Compiled> {
        let bound = self.attributes.use_bound_parameters;
        let mut query = String::with_capacity(sql.len());
        let mut data = Vec::new();
        let mut last = 0;

        for token in token_pattern().find_iter(sql) {
            let value = self
                .attributes
                .data_bindings
                .get(token.as_str())
                .ok_or_else(|| QbError::MissingBinding(token.as_str().to_string()))?;

            query.push_str(&sql[last..token.start()]);
            if bound {
                query.push('?');
                data.push(value.clone());
            } else {
                query.push_str(&escape_value(value));
            }
            last = token.end();
        }
        query.push_str(&sql[last..]);

        Ok(Compiled { query, data })
    }

    /// Compile and hand the statement to `executor`, exactly once.
    pub fn exec<E: Executor>(&self, executor: &mut E) -> QbResult<E::Output> {
        let compiled = self.compile()?;

        debug!(
            target: "myqb.sql",
            action = ?self.attributes.action,
            param_count = compiled.param_count(),
            "executing query"
        );

        executor
            .execute(&compiled.query, &compiled.data)
            .map_err(|err| {
                warn!(target: "myqb.sql", error = %err, sql = %compiled.query, "query execution failed");
                QbError::Execution(Box::new(err))
            })
    }
}
