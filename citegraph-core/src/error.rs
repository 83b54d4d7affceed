//! Error types for the citation graph.
//!
//! Every fallible operation returns [`GraphResult`]. The error kinds form a
//! closed set; none of them carries global state.

use std::borrow::Cow;

use thiserror::Error;

/// Failure to grow a collection or to construct a publication value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("allocation failed: {reason}")]
pub struct AllocError {
    reason: Cow<'static, str>,
}

impl AllocError {
    /// Create an allocation error with the given reason.
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Human-readable reason for the failure.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<std::collections::TryReserveError> for AllocError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<indexmap::TryReserveError> for AllocError {
    fn from(err: indexmap::TryReserveError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<smallvec::CollectionAllocErr> for AllocError {
    fn from(err: smallvec::CollectionAllocErr) -> Self {
        match err {
            smallvec::CollectionAllocErr::CapacityOverflow => Self::new("capacity overflow"),
            smallvec::CollectionAllocErr::AllocErr { .. } => Self::new("allocator returned an error"),
        }
    }
}

/// Main error type for citation graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A create call targeted an identifier that is already live.
    #[error("Publication already created.")]
    AlreadyExists,

    /// A referenced identifier is not live.
    #[error("Publication not found.")]
    NotFound,

    /// The operation is never allowed, e.g. removing the root.
    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Bookkeeping growth or publication construction failed.
    #[error(transparent)]
    AllocationFailure(#[from] AllocError),
}

/// Result type alias for citation graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(GraphError::AlreadyExists.to_string(), "Publication already created.");
        assert_eq!(GraphError::NotFound.to_string(), "Publication not found.");
        assert_eq!(
            GraphError::InvalidOperation("tried to remove root").to_string(),
            "Invalid operation: tried to remove root"
        );
    }

    #[test]
    fn alloc_error_converts_into_graph_error() {
        let err: GraphError = AllocError::new("out of slots").into();
        assert_eq!(err.to_string(), "allocation failed: out of slots");
        assert!(matches!(err, GraphError::AllocationFailure(ref e) if e.reason() == "out of slots"));
    }

    #[test]
    fn try_reserve_error_converts() {
        let mut items: Vec<u64> = Vec::new();
        let err = items.try_reserve(usize::MAX).unwrap_err();
        let alloc: AllocError = err.into();
        assert!(!alloc.reason().is_empty());
    }
}
