//! The value-type contract.
//!
//! A graph stores one publication per node. The graph only needs two things
//! from the value: a copyable, hashable identifier that serves as the lookup
//! key, and a way to build a fresh value from that identifier.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::AllocError;

/// A value that can be placed in a [`CitationGraph`](crate::CitationGraph).
///
/// # Example
///
/// ```rust
/// use citegraph_core::{AllocError, Publication};
///
/// struct Paper {
///     doi: String,
///     title: String,
/// }
///
/// impl Publication for Paper {
///     type Id = String;
///
///     fn from_id(id: String) -> Result<Self, AllocError> {
///         Ok(Self { doi: id, title: String::new() })
///     }
///
///     fn id(&self) -> String {
///         self.doi.clone()
///     }
/// }
/// ```
pub trait Publication: Sized {
    /// Identifier type. Used as the key of the graph's lookup table.
    type Id: Clone + Eq + Hash + Debug;

    /// Build the value that a freshly created node will hold.
    ///
    /// An error aborts the enclosing graph operation without side effects.
    fn from_id(id: Self::Id) -> Result<Self, AllocError>;

    /// The identifier of this value. Must stay the same for as long as the
    /// value lives in a graph.
    fn id(&self) -> Self::Id;
}
