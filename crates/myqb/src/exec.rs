//! Hand-off to an external execution layer.

use crate::value::Value;

/// Something that can run a compiled statement.
///
/// myqb never opens connections itself; [`Query::exec`](crate::Query::exec)
/// compiles and calls `execute` once with the SQL and its ordered values.
pub trait Executor {
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&mut self, sql: &str, values: &[Value]) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Executor for F
where
    F: FnMut(&str, &[Value]) -> Result<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn execute(&mut self, sql: &str, values: &[Value]) -> Result<T, E> {
        self(sql, values)
    }
}
