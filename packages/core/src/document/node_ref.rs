//! Structural queries on a node in the context of its document
//!
//! A `Node` only stores ids; resolving a parent or child needs the owning
//! `Document`. `NodeRef` pairs the two and derefs to the node, so category and
//! property queries read the same either way.

use crate::document::{Document, DocumentError};
use crate::models::Node;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    document: &'d Document,
    node: &'d Node,
}

impl<'d> NodeRef<'d> {
    pub(crate) fn new(document: &'d Document, node: &'d Node) -> Self {
        Self { document, node }
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn node(&self) -> &'d Node {
        self.node
    }

    /// Resolve the parent through the document
    ///
    /// `Ok(None)` when the node has no parent.
    ///
    /// # Errors
    ///
    /// `UnresolvedReference` if the parent id is not a live node.
    pub fn parent(&self) -> Result<Option<NodeRef<'d>>, DocumentError> {
        let Some(parent_id) = self.node.parent_id() else {
            return Ok(None);
        };
        self.document
            .get(parent_id)
            .map(|parent| Some(NodeRef::new(self.document, parent)))
            .ok_or_else(|| DocumentError::unresolved_reference(self.node.id(), parent_id))
    }

    /// Child at `index`; `None` for leaves, out-of-range indices and child ids
    /// that do not resolve
    pub fn child_at(&self, index: usize) -> Option<NodeRef<'d>> {
        let child_id = self.node.child_ids().get(index)?;
        match self.document.get(child_id) {
            Some(child) => Some(NodeRef::new(self.document, child)),
            None => {
                tracing::warn!(
                    "Node {} lists missing child '{}' at index {}",
                    self.node.id(),
                    child_id,
                    index
                );
                None
            }
        }
    }

    /// Position of `child_id` among the children; `None` when absent
    pub fn child_index(&self, child_id: &str) -> Option<usize> {
        self.node.child_ids().iter().position(|id| id == child_id)
    }

    /// Resolved children in order, skipping ids that do not resolve
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'d>> + 'd {
        let document = self.document;
        self.node
            .child_ids()
            .iter()
            .filter_map(move |id| document.get(id).map(|child| NodeRef::new(document, child)))
    }

    /// Follow parents up to the topmost node
    ///
    /// Returns this node when it has no parent.
    ///
    /// # Errors
    ///
    /// - `UnresolvedReference` if a parent id along the chain is missing
    /// - `CyclicStructure` if the chain revisits a node
    /// - `ParentChainTooDeep` past `DocumentConfig::max_parent_depth` hops
    pub fn root(&self) -> Result<NodeRef<'d>, DocumentError> {
        let limit = self.document.config().max_parent_depth;
        let mut visited: HashSet<&'d str> = HashSet::new();
        let mut chain = vec![self.node.id().to_string()];
        visited.insert(self.node.id());

        let mut current = *self;
        while let Some(parent) = current.parent()? {
            chain.push(parent.node.id().to_string());
            if !visited.insert(parent.node.id()) {
                return Err(DocumentError::cyclic_structure(self.node.id(), chain));
            }
            if chain.len() - 1 > limit {
                return Err(DocumentError::ParentChainTooDeep {
                    node_id: self.node.id().to_string(),
                    limit,
                });
            }
            current = parent;
        }
        Ok(current)
    }

    pub fn is_highlighted(&self) -> bool {
        self.document.is_highlighted(self.node.id())
    }
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.node.id())
            .field("type", &self.node.type_name())
            .finish()
    }
}
