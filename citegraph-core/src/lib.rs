//! Citegraph Core
//!
//! This crate provides an in-memory citation graph: a directed acyclic graph
//! of publications where a child cites one or more parents.
//! It implements:
//!
//! - Reference-counted ownership (parents own children, children observe parents)
//! - Identifier lookup through a weak table
//! - Transactional create, cite and remove operations
//! - Cascading reclamation of nodes that lose their last owner
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Node bookkeeping and the [`CitationGraph`] front end
//! - `publication`: The [`Publication`] contract for stored values
//! - `error`: [`GraphError`] and friends
//!
//! # Example
//!
//! ```rust
//! use citegraph_core::{AllocError, CitationGraph, GraphError, Publication};
//!
//! struct Paper {
//!     id: &'static str,
//! }
//!
//! impl Publication for Paper {
//!     type Id = &'static str;
//!
//!     fn from_id(id: &'static str) -> Result<Self, AllocError> {
//!         Ok(Paper { id })
//!     }
//!
//!     fn id(&self) -> &'static str {
//!         self.id
//!     }
//! }
//!
//! let mut graph = CitationGraph::<Paper>::new("R0")?;
//! graph.create("A", &"R0")?;
//! graph.create("B", &"A")?;
//!
//! // Removing "A" also reclaims "B", which was only cited through it.
//! graph.remove(&"A")?;
//! assert!(!graph.exists(&"B"));
//! assert!(matches!(graph.remove(&"R0"), Err(GraphError::InvalidOperation(_))));
//! # Ok::<(), GraphError>(())
//! ```

pub mod error;
pub mod graph;
pub mod publication;

pub use error::{AllocError, GraphError, GraphResult};
pub use graph::CitationGraph;
pub use publication::Publication;
