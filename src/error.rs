//! Structured error types for gridview.
//!
//! One enum covers the whole taxonomy: fatal configuration errors,
//! precondition violations (programmer errors surfaced as values),
//! structural errors that abort an operation, and registry lookups
//! whose failure makes subsequent width math meaningless.

/// All errors that can occur in grid construction and interaction.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Invalid grid configuration. Fatal at construction; no partial
    /// initialization is retained.
    #[error("configuration: {0}")]
    Config(String),

    /// An operation was invoked while its preconditions were unmet
    /// (e.g. an editing call on a non-editable grid, or a selection
    /// call with no selection model installed).
    #[error("precondition: {0}")]
    Precondition(String),

    /// A column move would land the column outside its header group's
    /// contiguous index range. The move is rejected and layout reverts.
    #[error("column {column_id:?} cannot leave its header group {group:?}")]
    CrossGroupMove {
        /// Id of the column being moved.
        column_id: String,
        /// Name of the group the column belongs to.
        group: String,
    },

    /// No position rule is registered for a column id. Width math
    /// cannot proceed without it.
    #[error("no position rule registered for column {0:?}")]
    MissingColumnRule(String),

    /// The edit lock is held by another controller and refused to
    /// commit or cancel.
    #[error("edit lock is held by another controller")]
    LockHeld,

    /// Catch-all for host-supplied capability failures.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
