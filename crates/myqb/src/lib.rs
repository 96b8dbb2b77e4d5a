//! # myqb
//!
//! A fluent MySQL statement builder.
//!
//! ## Features
//!
//! - **Parameterized by default**: every value becomes a `?` mark with its data
//!   collected in emission order
//! - **Polymorphic clauses**: raw fragments, field/value pairs, value lists,
//!   objects with `not` negation and compound sub-groups
//! - **Sub-queries**: as row sources, joins or single-value columns
//! - **Safe defaults**: UPDATE and DELETE require WHERE, INSERT and UPDATE require SET
//! - **Literal mode**: escaped inline values for debugging
//! - **Execution hand-off**: any [`Executor`] (including a closure) receives
//!   the compiled SQL and values
//!
//! ## Example
//!
//! ```ignore
//! use myqb::{Fields, select};
//!
//! let mut q = select();
//! q.from_as("users", "u")
//!     .where_clause(Fields::new().field("id", 1).not().field("name", "bob"))?
//!     .limit(10);
//!
//! let compiled = q.compile()?;
//! assert_eq!(
//!     compiled.query,
//!     "SELECT * FROM `users` u WHERE (id = ? AND name != ?) LIMIT 10"
//! );
//! ```
//!
//! Compiled SQL is logged through `tracing` on the `myqb.sql` target when a
//! query's debug flag is set.

pub mod binding;
pub mod config;
pub mod error;
pub mod escape;
pub mod exec;
pub mod ident;
pub mod query;
pub mod value;

pub use binding::Bindings;
pub use config::{QueryConfig, default_bound_parameters, set_default_bound_parameters};
pub use error::{QbError, QbResult};
pub use escape::{escape_value, quote_string};
pub use exec::Executor;
pub use ident::quote_ident;
pub use query::{
    Action, Attributes, Column, Compiled, InsertMode, Join, JoinOn, JoinOptions, JoinTarget,
    Query, Where, WhereBoolean,
};
pub use value::{Fields, Operand, Value};

/// Start a SELECT query.
pub fn select() -> Query {
    let mut q = Query::new();
    q.select();
    q
}

/// Start an INSERT query.
pub fn insert() -> Query {
    let mut q = Query::new();
    q.insert();
    q
}

/// Start a REPLACE query.
pub fn replace() -> Query {
    let mut q = Query::new();
    q.replace();
    q
}

/// Start an UPDATE query against `table`.
pub fn update(table: &str) -> Query {
    let mut q = Query::new();
    q.update_table(table);
    q
}

/// Start a DELETE query against `table`.
pub fn delete_from(table: &str) -> Query {
    let mut q = Query::new();
    q.delete_from(table);
    q
}
