//! Citation Graph
//!
//! The graph is the only entry point for mutation. It owns the root node,
//! resolves identifiers through a table of weak references, and delegates
//! structural changes to [`Node`].
//!
//! # Transactions
//!
//! Every mutator validates first and mutates second. The only failures left
//! once mutation starts are allocation failures, and each of those is rolled
//! back before the error is returned: a failed call leaves the graph exactly
//! as it found it.
//!
//! # Lookup table
//!
//! The table never keeps a node alive. When a node is destroyed by a cascade
//! its entry goes stale and is purged the next time it is looked at.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::alloc;
use super::node::{Node, NodeRef, WeakNodeRef};
use crate::error::{AllocError, GraphError, GraphResult};
use crate::publication::Publication;

/// Parent sets are usually a handful of nodes.
type ParentSet<P> = SmallVec<[NodeRef<P>; 4]>;

/// A directed acyclic graph of publications connected by citations.
///
/// A child cites one or more parents. Children are owned by their parents and
/// the root is owned by the graph, so removing a node reclaims everything
/// that was only reachable through it.
///
/// The graph is single-threaded (`!Send`, `!Sync`) and cannot be cloned.
///
/// # Example
///
/// ```rust
/// use citegraph_core::{AllocError, CitationGraph, Publication};
///
/// struct Paper(u32);
///
/// impl Publication for Paper {
///     type Id = u32;
///     fn from_id(id: u32) -> Result<Self, AllocError> { Ok(Paper(id)) }
///     fn id(&self) -> u32 { self.0 }
/// }
///
/// let mut graph = CitationGraph::<Paper>::new(0).unwrap();
/// graph.create(1, &0).unwrap();
/// graph.create(2, &0).unwrap();
/// graph.create_with_parents(3, &[1, 2]).unwrap();
///
/// graph.remove(&1).unwrap();
/// assert!(graph.exists(&3));
/// assert_eq!(graph.parents(&3).unwrap(), vec![2]);
/// ```
pub struct CitationGraph<P: Publication> {
    /// The root, owned directly so it lives as long as the graph.
    root: NodeRef<P>,

    /// Identifier to node. Entries may be stale.
    nodes: RefCell<IndexMap<P::Id, WeakNodeRef<P>>>,
}

impl<P: Publication> CitationGraph<P> {
    /// Create a graph containing only the root publication.
    pub fn new(root_id: P::Id) -> GraphResult<Self> {
        Self::with_capacity(root_id, 0)
    }

    /// Create a graph whose lookup table has room for `capacity` publications.
    pub fn with_capacity(root_id: P::Id, capacity: usize) -> GraphResult<Self> {
        let publication = P::from_id(root_id)?;
        let id = publication.id();

        let mut nodes: IndexMap<P::Id, WeakNodeRef<P>> = IndexMap::new();
        nodes.try_reserve(capacity.max(1)).map_err(AllocError::from)?;

        let root = Rc::new(RefCell::new(Node::new(publication)));
        nodes.insert(id, Rc::downgrade(&root));

        Ok(Self {
            root,
            nodes: RefCell::new(nodes),
        })
    }

    /// Identifier of the root publication.
    pub fn root_id(&self) -> P::Id {
        self.root.borrow().publication().id()
    }

    /// Whether `id` names a live publication.
    ///
    /// A stale lookup entry for `id` is purged.
    pub fn exists(&self, id: &P::Id) -> bool {
        self.resolve(id).is_some()
    }

    /// Number of live publications, root included.
    pub fn len(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|node| node.strong_count() > 0)
            .count()
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Run `f` against the publication stored under `id`.
    pub fn with_publication<R>(&self, id: &P::Id, f: impl FnOnce(&P) -> R) -> GraphResult<R> {
        let node = self.resolve(id).ok_or(GraphError::NotFound)?;
        let node = node.borrow();
        Ok(f(node.publication()))
    }

    /// Run `f` against a mutable reference to the publication stored under
    /// `id`. `f` must not change the publication's identifier.
    pub fn with_publication_mut<R>(
        &mut self,
        id: &P::Id,
        f: impl FnOnce(&mut P) -> R,
    ) -> GraphResult<R> {
        let node = self.resolve(id).ok_or(GraphError::NotFound)?;
        let mut node = node.borrow_mut();
        let result = f(node.publication_mut());
        debug_assert!(node.publication().id() == *id, "publication identifier changed");
        Ok(result)
    }

    /// Identifiers of the publications citing `id`.
    pub fn children(&self, id: &P::Id) -> GraphResult<Vec<P::Id>> {
        let node = self.resolve(id).ok_or(GraphError::NotFound)?;
        let node = node.borrow();

        let mut ids = Vec::new();
        ids.try_reserve_exact(node.child_count())
            .map_err(AllocError::from)?;
        ids.extend(node.children().map(|child| child.borrow().publication().id()));
        Ok(ids)
    }

    /// Identifiers of the publications cited by `id`.
    pub fn parents(&self, id: &P::Id) -> GraphResult<Vec<P::Id>> {
        let node = self.resolve(id).ok_or(GraphError::NotFound)?;
        let node = node.borrow();

        let mut ids = Vec::new();
        ids.try_reserve_exact(node.parent_count())
            .map_err(AllocError::from)?;
        ids.extend(node.parents().map(|parent| parent.borrow().publication().id()));
        Ok(ids)
    }

    /// Create publication `id` citing `parent_id`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::AlreadyExists`] if `id` is live.
    /// - [`GraphError::NotFound`] if `parent_id` is not live.
    /// - [`GraphError::AllocationFailure`] if construction or bookkeeping fails.
    pub fn create(&mut self, id: P::Id, parent_id: &P::Id) -> GraphResult<()> {
        self.create_with_parents(id, std::slice::from_ref(parent_id))
    }

    /// Create publication `id` citing every publication in `parent_ids`.
    ///
    /// Repeated parent identifiers collapse to a single citation.
    ///
    /// # Errors
    ///
    /// - [`GraphError::AlreadyExists`] if `id` is live.
    /// - [`GraphError::NotFound`] if `parent_ids` is empty or any parent is
    ///   not live.
    /// - [`GraphError::AllocationFailure`] if construction or bookkeeping fails.
    pub fn create_with_parents(&mut self, id: P::Id, parent_ids: &[P::Id]) -> GraphResult<()> {
        if self.exists(&id) {
            return Err(GraphError::AlreadyExists);
        }

        let parents = self.resolve_parents(parent_ids)?;
        let publication = P::from_id(id.clone())?;
        let child = Node::add_new_child(&parents, publication)?;

        if let Err(err) = self.register(id.clone(), &child) {
            debug!(?id, error = %err, "registration failed, unlinking new publication");
            Node::unlink_new_child(&parents, &child);
            return Err(err);
        }

        debug!(?id, parents = parents.len(), "created publication");
        Ok(())
    }

    /// Record that `child_id` cites `parent_id`.
    ///
    /// Adding a citation that already exists does nothing.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotFound`] if either publication is not live.
    /// - [`GraphError::InvalidOperation`] if both identifiers are the same.
    /// - [`GraphError::AllocationFailure`] if bookkeeping fails.
    pub fn add_citation(&mut self, child_id: &P::Id, parent_id: &P::Id) -> GraphResult<()> {
        let child = self.resolve(child_id).ok_or(GraphError::NotFound)?;
        let parent = self.resolve(parent_id).ok_or(GraphError::NotFound)?;

        if Rc::ptr_eq(&child, &parent) {
            return Err(GraphError::InvalidOperation("publication cannot cite itself"));
        }

        if child.borrow_mut().citation_exists(&parent) {
            trace!(?child_id, ?parent_id, "citation already present");
            return Ok(());
        }

        Node::link(&parent, &child)?;
        debug!(?child_id, ?parent_id, "added citation");
        Ok(())
    }

    /// Remove publication `id` from every publication it cites.
    ///
    /// Publications that were only cited through `id` are destroyed with it.
    /// Those still owned by another parent survive.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidOperation`] if `id` is the root.
    /// - [`GraphError::NotFound`] if `id` is not live.
    pub fn remove(&mut self, id: &P::Id) -> GraphResult<()> {
        if *id == self.root_id() {
            return Err(GraphError::InvalidOperation("tried to remove root"));
        }

        let node = self.resolve(id).ok_or(GraphError::NotFound)?;
        self.nodes.borrow_mut().swap_remove(id);

        let parents = node.borrow().parent_count();
        Node::detach_from_parents(&node);

        debug!(?id, parents, "removed publication");
        // Last owner: the cascade runs here.
        drop(node);
        Ok(())
    }

    /// Look up a live node, purging the entry if it went stale.
    fn resolve(&self, id: &P::Id) -> Option<NodeRef<P>> {
        let found = self.nodes.borrow().get(id).map(Weak::upgrade);
        match found {
            Some(Some(node)) => Some(node),
            Some(None) => {
                self.nodes.borrow_mut().swap_remove(id);
                trace!(?id, "purged stale lookup entry");
                None
            }
            None => None,
        }
    }

    /// Resolve parent identifiers, dropping duplicates and keeping order.
    fn resolve_parents(&self, parent_ids: &[P::Id]) -> GraphResult<ParentSet<P>> {
        if parent_ids.is_empty() {
            return Err(GraphError::NotFound);
        }

        let mut parents = ParentSet::new();
        parents
            .try_reserve(parent_ids.len())
            .map_err(AllocError::from)?;

        for parent_id in parent_ids {
            let parent = self.resolve(parent_id).ok_or(GraphError::NotFound)?;
            if !parents.iter().any(|seen| Rc::ptr_eq(seen, &parent)) {
                parents.push(parent);
            }
        }

        Ok(parents)
    }

    /// Insert a lookup entry for a freshly linked node.
    ///
    /// Overwrites a stale entry left behind by a destroyed node with the same
    /// identifier.
    fn register(&self, id: P::Id, node: &NodeRef<P>) -> GraphResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        alloc::try_reserve_entry(&mut nodes)?;
        nodes.insert(id, Rc::downgrade(node));
        Ok(())
    }
}

impl<P: Publication> fmt::Debug for CitationGraph<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitationGraph")
            .field("root", &self.root_id())
            .field("len", &self.len())
            .finish()
    }
}
