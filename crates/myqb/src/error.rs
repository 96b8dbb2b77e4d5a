//! Error types for myqb

use thiserror::Error;

/// Result type alias for myqb operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for building, compiling and executing statements
#[derive(Debug, Error)]
pub enum QbError {
    /// The query state is structurally incomplete (no action, no table,
    /// UPDATE/DELETE without WHERE, ...).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A value or clause was passed in a shape the builder cannot use.
    #[error("Type error: {0}")]
    Shape(String),

    /// A `{{token}}` was referenced in the rendered SQL but never stored.
    #[error("The data binding {0} could not be found.")]
    MissingBinding(String),

    /// The execution collaborator reported a failure.
    #[error("Execution error: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl QbError {
    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a shape (type) error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Check if this is a precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a shape error
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// Check if this is a missing binding error
    pub fn is_missing_binding(&self) -> bool {
        matches!(self, Self::MissingBinding(_))
    }

    pub(crate) fn unparsable_value() -> Self {
        Self::shape("Received unparsable object as field value.")
    }
}
