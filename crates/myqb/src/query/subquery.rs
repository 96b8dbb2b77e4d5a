//! Sub-queries and compound WHERE groups.

use super::{Query, WhereBoolean};
use crate::binding::{Bindings, unique_id};
use crate::error::{QbError, QbResult};
use crate::ident::quote_ident;
use tracing::trace;

impl Query {
    /// Use `query` as the row source: `FROM (SELECT ...) as \`name\``.
    pub fn from_subquery(&mut self, query: &Query) -> QbResult<&mut Self> {
        let rendered = self.merge_subquery(query)?;
        self.attributes.from_subquery = Some(rendered);
        Ok(self)
    }

    /// As [`Query::from_subquery`], naming the sub-query `alias` instead of
    /// its own `as_name`.
    pub fn from_subquery_as(&mut self, query: &Query, alias: &str) -> QbResult<&mut Self> {
        let mut named = query.clone();
        named.as_name(alias);
        self.from_subquery(&named)
    }

    /// Render this query as a SELECT sub-query with the bindings it references.
    ///
    /// Unnamed sub-queries get a generated `subquery<n>` name.
    pub(crate) fn build_subquery(&self) -> QbResult<(String, Bindings)> {
        if !self.has_source() {
            return Err(QbError::precondition(
                "No table name has been defined for a sub-query.",
            ));
        }

        let sql = self.build_select();
        let data = self.attributes.data_bindings.collect_referenced(&sql);
        let name = match &self.attributes.as_name {
            Some(name) => name.clone(),
            None => unique_id("subquery"),
        };

        Ok((format!("({sql}) as {}", quote_ident(&name)), data))
    }

    /// This query's WHERE list, led by the `AND` sentinel when AND-joining
    /// was chosen explicitly, with the bindings it references.
    pub(crate) fn build_compound_where(&self) -> (Vec<String>, Bindings) {
        let mut wheres = Vec::with_capacity(self.attributes.where_clauses.len() + 1);
        if self.attributes.where_boolean == Some(WhereBoolean::And) {
            wheres.push("AND".to_string());
        }
        wheres.extend(self.attributes.where_clauses.iter().cloned());

        let data = self.attributes.data_bindings.collect_referenced(&wheres.join(" "));
        (wheres, data)
    }

    pub(crate) fn merge_subquery(&mut self, query: &Query) -> QbResult<String> {
        let (sql, data) = query.build_subquery()?;
        trace!(target: "myqb.sql", bindings = data.len(), "merging sub-query bindings");
        self.attributes.data_bindings.extend(data);
        Ok(sql)
    }

    pub(crate) fn merge_compound_where(&mut self, query: &Query) -> Vec<String> {
        let (wheres, data) = query.build_compound_where();
        trace!(target: "myqb.sql", bindings = data.len(), "merging compound where bindings");
        self.attributes.data_bindings.extend(data);
        wheres
    }
}
