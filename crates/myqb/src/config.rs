use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide default for whether new queries use bound parameters.
static DEFAULT_BOUND_PARAMETERS: AtomicBool = AtomicBool::new(true);

/// Set whether queries created after this call use bound parameters.
///
/// Disabling bound parameters makes `compile()` inline escaped literals
/// instead of `?` marks. This is not recommended.
pub fn set_default_bound_parameters(enabled: bool) {
    DEFAULT_BOUND_PARAMETERS.store(enabled, Ordering::Relaxed);
}

/// Current process-wide default (initially `true`).
pub fn default_bound_parameters() -> bool {
    DEFAULT_BOUND_PARAMETERS.load(Ordering::Relaxed)
}

/// Per-query configuration applied at construction time.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Compile to `?` marks plus a data array (`true`) or to inline literals.
    pub use_bound_parameters: bool,
    /// Emit a `tracing` debug event with the SQL after each compile.
    pub debug: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            use_bound_parameters: default_bound_parameters(),
            debug: false,
        }
    }
}

impl QueryConfig {
    /// Create a configuration from the process-wide defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use bound parameters.
    pub fn bound_parameters(mut self, enabled: bool) -> Self {
        self.use_bound_parameters = enabled;
        self
    }

    /// Inline escaped literals instead of bound parameters.
    pub fn literal_values(mut self) -> Self {
        self.use_bound_parameters = false;
        self
    }

    /// Enable debug logging of compiled SQL.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }
}
