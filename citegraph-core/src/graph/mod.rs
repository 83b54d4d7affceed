//! Citation Graph
//!
//! This module implements the ownership and mutation engine behind
//! [`CitationGraph`].
//!
//! # Overview
//!
//! The graph is a directed acyclic graph where:
//!
//! - Nodes hold one publication each
//! - Edges are citations: if C cites P, P is a parent of C and C a child of P
//!
//! # Design Decisions
//!
//! 1. Parents own their children through `Rc`, children observe their parents
//!    through `Weak`. The root is owned by the graph itself. A node is
//!    reclaimed the moment its last owning parent lets go, and the reclaim
//!    cascades to whatever it owned alone.
//!
//! 2. The identifier table holds `Weak` handles only, so it never extends a
//!    node's life. Stale entries are purged lazily.
//!
//! 3. Each edge stores its position on the opposite side, so removing an edge
//!    is a swap-remove plus one index fix-up.
//!
//! 4. Acyclicity is not checked. Adding a citation that closes a cycle leaks
//!    the nodes on that cycle once they become unreachable.

mod alloc;
mod citation;
mod node;

pub use citation::CitationGraph;
