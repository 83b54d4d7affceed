//! Graph Nodes
//!
//! This module defines the node type that lives in the citation graph and the
//! bookkeeping that ties parents and children together.
//!
//! # Ownership
//!
//! Edges are stored twice, once on each end:
//!
//! - a parent holds a strong [`ChildLink`] to each child;
//! - a child holds a weak [`ParentLink`] to each parent.
//!
//! A node therefore lives exactly as long as some parent (or, for the root,
//! the graph) keeps a child link to it. Because parents are only observed
//! through weak references there is no ownership cycle for a DAG.
//!
//! # Positional indices
//!
//! Every link also records where its counterpart sits in the other node's
//! list. That makes removing an edge O(1): swap the entry with the last one,
//! shrink the list, and patch the counterpart of whichever entry moved.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::alloc;
use crate::error::AllocError;

/// Shared, owning handle to a node.
pub(crate) type NodeRef<P> = Rc<RefCell<Node<P>>>;

/// Non-owning handle to a node.
pub(crate) type WeakNodeRef<P> = Weak<RefCell<Node<P>>>;

/// Owning edge from a parent to one of its children.
pub(crate) struct ChildLink<P> {
    node: NodeRef<P>,
    /// Position of the owning parent inside `node.parents`.
    back_index: usize,
}

/// Observing edge from a child to one of its parents.
pub(crate) struct ParentLink<P> {
    node: WeakNodeRef<P>,
    /// Position of the observing child inside the parent's `children`.
    back_index: usize,
}

/// A node in the citation graph.
pub(crate) struct Node<P> {
    /// The stored value.
    publication: P,

    /// Nodes citing this one.
    children: Vec<ChildLink<P>>,

    /// Nodes this one cites.
    parents: Vec<ParentLink<P>>,
}

impl<P> Node<P> {
    /// Create a node with no edges.
    pub(crate) fn new(publication: P) -> Self {
        Self {
            publication,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub(crate) fn publication(&self) -> &P {
        &self.publication
    }

    pub(crate) fn publication_mut(&mut self) -> &mut P {
        &mut self.publication
    }

    /// Strong handles to all children, in internal order.
    pub(crate) fn children(&self) -> impl Iterator<Item = &NodeRef<P>> + '_ {
        self.children.iter().map(|link| &link.node)
    }

    /// Live parents, in internal order. Expired links are skipped.
    pub(crate) fn parents(&self) -> impl Iterator<Item = NodeRef<P>> + '_ {
        self.parents.iter().filter_map(|link| link.node.upgrade())
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Allocate a node holding `publication` and link it under every node in
    /// `parents`, in order.
    ///
    /// The first parent becomes the owner at creation; the rest are attached
    /// one by one. If attaching to any parent fails, every link made so far is
    /// undone before the error is returned, so no parent is left mutated.
    ///
    /// `parents` must not contain the same node twice.
    pub(crate) fn add_new_child(
        parents: &[NodeRef<P>],
        publication: P,
    ) -> Result<NodeRef<P>, AllocError> {
        let child = Rc::new(RefCell::new(Node::new(publication)));

        for (attached, parent) in parents.iter().enumerate() {
            if let Err(err) = Node::link(parent, &child) {
                Node::unlink_new_child(&parents[..attached], &child);
                return Err(err);
            }
        }

        Ok(child)
    }

    /// Undo the links created by [`Node::add_new_child`] for `parents`.
    ///
    /// The links must still be the most recent entries on both sides, which is
    /// the case as long as nothing else touched these nodes in between.
    pub(crate) fn unlink_new_child(parents: &[NodeRef<P>], child: &NodeRef<P>) {
        for parent in parents.iter().rev() {
            child.borrow_mut().reverse_changes_in_child();
            let undone = parent.borrow_mut().reverse_changes_in_parent();
            debug_assert!(undone.is_some_and(|link| Rc::ptr_eq(&link.node, child)));
        }
    }

    /// Insert the edge `parent -> child` on both sides.
    ///
    /// Either both sides are recorded with matching indices, or neither is.
    pub(crate) fn link(parent: &NodeRef<P>, child: &NodeRef<P>) -> Result<(), AllocError> {
        let slot_in_child = child.borrow().parents.len();
        let slot_in_parent = parent
            .borrow_mut()
            .add_existing_child(Rc::clone(child), slot_in_child)?;

        let recorded = child
            .borrow_mut()
            .add_parent(Rc::downgrade(parent), slot_in_parent);

        if let Err(err) = recorded {
            // Dropped after the borrow ends; the caller still owns `child`.
            let undone = parent.borrow_mut().reverse_changes_in_parent();
            drop(undone);
            return Err(err);
        }

        debug_assert_eq!(child.borrow().parents.len(), slot_in_child + 1);
        Ok(())
    }

    /// Record a strong reference to `child`, where this node will sit at
    /// `back_index` in the child's parent list. Returns the new link's
    /// position in this node's child list.
    pub(crate) fn add_existing_child(
        &mut self,
        child: NodeRef<P>,
        back_index: usize,
    ) -> Result<usize, AllocError> {
        alloc::try_push(
            &mut self.children,
            ChildLink {
                node: child,
                back_index,
            },
        )
    }

    /// Record a weak reference to `parent`, where this node sits at
    /// `back_index` in the parent's child list. Returns the new link's
    /// position in this node's parent list.
    pub(crate) fn add_parent(
        &mut self,
        parent: WeakNodeRef<P>,
        back_index: usize,
    ) -> Result<usize, AllocError> {
        alloc::try_push(
            &mut self.parents,
            ParentLink {
                node: parent,
                back_index,
            },
        )
    }

    /// Undo the most recent [`Node::add_existing_child`].
    ///
    /// The returned link still owns the child. Drop it once no borrow of this
    /// node is held.
    pub(crate) fn reverse_changes_in_parent(&mut self) -> Option<ChildLink<P>> {
        self.children.pop()
    }

    /// Undo the most recent [`Node::add_parent`].
    pub(crate) fn reverse_changes_in_child(&mut self) {
        self.parents.pop();
    }

    /// Whether this node already cites `candidate`.
    ///
    /// Expired parent links found along the way are removed.
    pub(crate) fn citation_exists(&mut self, candidate: &NodeRef<P>) -> bool {
        let mut position = 0;
        while position < self.parents.len() {
            match self.parents[position].node.upgrade() {
                // The swapped-in entry now occupies `position`; look at it next.
                None => drop(self.remove_parent(position)),
                Some(parent) if Rc::ptr_eq(&parent, candidate) => return true,
                Some(_) => position += 1,
            }
        }
        false
    }

    /// Swap-remove the child link at `position` and patch the index stored by
    /// the child whose link moved into `position`.
    ///
    /// The returned link still owns its child. Drop it once no borrow of this
    /// node is held.
    pub(crate) fn remove_child(&mut self, position: usize) -> ChildLink<P> {
        let removed = self.children.swap_remove(position);
        if let Some(moved) = self.children.get(position) {
            moved.node.borrow_mut().parents[moved.back_index].back_index = position;
        }
        removed
    }

    /// Swap-remove the parent link at `position` and patch the index stored by
    /// the parent whose link moved into `position`.
    pub(crate) fn remove_parent(&mut self, position: usize) -> ParentLink<P> {
        let removed = self.parents.swap_remove(position);
        if let Some(moved) = self.parents.get(position) {
            if let Some(parent) = moved.node.upgrade() {
                parent.borrow_mut().children[moved.back_index].back_index = position;
            }
        }
        removed
    }

    /// Remove `node` from the child list of every surviving parent.
    ///
    /// Afterwards `node` has no parents. If the caller's handle is the last
    /// strong reference, dropping it destroys the node.
    pub(crate) fn detach_from_parents(node: &NodeRef<P>) {
        let parents = std::mem::take(&mut node.borrow_mut().parents);
        for link in parents {
            if let Some(parent) = link.node.upgrade() {
                let released = parent.borrow_mut().remove_child(link.back_index);
                debug_assert!(Rc::ptr_eq(&released.node, node));
                drop(released);
            }
        }
    }

    /// Detach this node from every child's parent list and move the child
    /// handles into `released`.
    fn release_children(&mut self, released: &mut Vec<NodeRef<P>>) {
        released.reserve(self.children.len());
        for ChildLink { node, back_index } in self.children.drain(..) {
            drop(node.borrow_mut().remove_parent(back_index));
            released.push(node);
        }
    }
}

impl<P> Drop for Node<P> {
    /// Tear down the subgraph owned solely by this node.
    ///
    /// Runs as a worklist instead of recursing through nested drops, so a long
    /// chain of single-owner nodes cannot exhaust the stack. A node is detached
    /// from all of its children at the moment its last owner lets go, which
    /// keeps every index stored in a surviving node pointing at a live parent.
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }

        let mut released = Vec::new();
        self.release_children(&mut released);

        while let Some(child) = released.pop() {
            if let Ok(cell) = Rc::try_unwrap(child) {
                cell.into_inner().release_children(&mut released);
            }
        }
    }
}
