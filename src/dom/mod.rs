//! Array-backed node pool backing the grid's render tree.
//!
//! The grid never touches a platform display API. It renders into this
//! pool: a slab of [`Node`] records addressed by stable [`NodeId`]
//! handles, with explicit attach/detach/reuse operations. A host
//! embedding mirrors the pool into whatever it draws with (browser
//! elements, terminal cells, a scene graph) and feeds input back in.
//!
//! Detaching a node keeps it alive for reuse; removing it returns the
//! slot to the free list. Mutation counters (`created`, `attached`,
//! `detached`) are exposed so callers can assert render passes are
//! incremental rather than rebuilding the world.

use std::collections::BTreeSet;

/// Stable handle to a node in the pool.
///
/// Slots are recycled, so a `NodeId` is only valid until the node it
/// names is removed. The grid's caches never hold ids past removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slot index, for hosts that mirror the pool into an array.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node represents in the grid's render tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A scrollable canvas holding row nodes (one per pane quadrant).
    Canvas,
    /// A header strip holding header-column nodes.
    Header,
    /// A single column header.
    HeaderColumn,
    /// A row container holding cell nodes.
    Row,
    /// A single cell.
    Cell,
}

/// One node in the render tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What this node represents.
    pub kind: NodeKind,
    /// CSS-style class set; ordered for deterministic host output.
    pub classes: BTreeSet<String>,
    /// Sanitized content of the node (cells/headers only).
    pub content: String,
    /// Optional tooltip text.
    pub tool_tip: Option<String>,
    /// Vertical position in canvas coordinates (rows).
    pub top: f32,
    /// Horizontal position and width in canvas coordinates (cells).
    pub left: f32,
    /// Pixel width (cells and header columns).
    pub width: f32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            classes: BTreeSet::new(),
            content: String::new(),
            tool_tip: None,
            top: 0.0,
            left: 0.0,
            width: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Ids of this node's attached children, in attach order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Id of the parent this node is attached to, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Counters for pool mutations, used to verify incremental rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Nodes created since pool construction.
    pub created: u64,
    /// Attach operations performed.
    pub attached: u64,
    /// Detach operations performed.
    pub detached: u64,
}

/// The node pool.
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    stats: PoolStats,
}

impl NodePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node of the given kind.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.stats.created += 1;
        let node = Node::new(kind);
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            NodeId(slot)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    /// Borrow a node. Returns `None` for a stale or freed id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Mutably borrow a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Whether the id names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// A node already attached elsewhere is detached first, so attach
    /// doubles as a move operation.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if self.get(child).and_then(|n| n.parent) == Some(parent) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        } else {
            return;
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.stats.attached += 1;
    }

    /// Detach a node from its parent, keeping it alive for reuse.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
        }
        self.stats.detached += 1;
    }

    /// Detach and free a node and its entire subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0).and_then(|slot| slot.take()) {
            Some(node) => node.children,
            None => return,
        };
        self.free.push(id.0);
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Replace a node's content string.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) {
        if let Some(n) = self.get_mut(id) {
            n.content = content.into();
        }
    }

    /// Add a class to a node.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(n) = self.get_mut(id) {
            n.classes.insert(class.to_string());
        }
    }

    /// Remove a class from a node.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(n) = self.get_mut(id) {
            n.classes.remove(class);
        }
    }

    /// Whether a node currently carries a class.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.classes.contains(class))
    }

    /// Number of attached children under `parent`.
    pub fn child_count(&self, parent: NodeId) -> usize {
        self.get(parent).map_or(0, |n| n.children.len())
    }

    /// Number of live nodes in the pool.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Whether the pool holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutation counters since construction.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_attach_detach() {
        let mut pool = NodePool::new();
        let canvas = pool.create(NodeKind::Canvas);
        let row = pool.create(NodeKind::Row);
        pool.attach(canvas, row);

        assert_eq!(pool.child_count(canvas), 1);
        assert_eq!(pool.get(row).and_then(Node::parent), Some(canvas));

        pool.detach(row);
        assert_eq!(pool.child_count(canvas), 0);
        assert!(pool.contains(row)); // detached, not freed
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut pool = NodePool::new();
        let canvas = pool.create(NodeKind::Canvas);
        let row = pool.create(NodeKind::Row);
        pool.attach(canvas, row);
        pool.attach(canvas, row);

        assert_eq!(pool.child_count(canvas), 1);
        assert_eq!(pool.stats().attached, 1);
    }

    #[test]
    fn test_attach_moves_between_parents() {
        let mut pool = NodePool::new();
        let a = pool.create(NodeKind::Canvas);
        let b = pool.create(NodeKind::Canvas);
        let row = pool.create(NodeKind::Row);
        pool.attach(a, row);
        pool.attach(b, row);

        assert_eq!(pool.child_count(a), 0);
        assert_eq!(pool.child_count(b), 1);
    }

    #[test]
    fn test_remove_frees_subtree_and_reuses_slots() {
        let mut pool = NodePool::new();
        let canvas = pool.create(NodeKind::Canvas);
        let row = pool.create(NodeKind::Row);
        let cell = pool.create(NodeKind::Cell);
        pool.attach(canvas, row);
        pool.attach(row, cell);

        pool.remove(row);
        assert!(!pool.contains(row));
        assert!(!pool.contains(cell));
        assert_eq!(pool.len(), 1);

        // Freed slots are recycled.
        let reused = pool.create(NodeKind::Row);
        assert!(pool.contains(reused));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_classes() {
        let mut pool = NodePool::new();
        let cell = pool.create(NodeKind::Cell);
        pool.add_class(cell, "active");
        assert!(pool.has_class(cell, "active"));
        pool.remove_class(cell, "active");
        assert!(!pool.has_class(cell, "active"));
    }
}
