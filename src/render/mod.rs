//! Rendering support: formatters, the row-cache entry type, deferred
//! task scheduling, and the async post-processing queue.

pub mod formatter;
pub mod post_process;
pub mod timer;

use std::collections::HashMap;

use crate::dom::NodeId;

/// Cache entry for one materialized row.
///
/// A row index appears in the cache at most once. Cells are appended
/// in two phases: the build phase pushes `(cell, node)` pairs onto
/// `pending_cells`, and `index_pending` folds them into `cell_nodes`
/// once the row's build completes. Eviction must fully detach the
/// nodes and drop every bookkeeping entry.
#[derive(Debug)]
pub struct RowCacheEntry {
    /// Row node in the left (or only) canvas.
    pub row_node: NodeId,
    /// Row node in the right canvas when columns are frozen.
    pub row_node_right: Option<NodeId>,
    /// Rendered cell index -> colspan.
    pub cell_colspans: HashMap<usize, usize>,
    /// Rendered cell index -> cell node.
    pub cell_nodes: HashMap<usize, NodeId>,
    /// Cells appended during the current build, not yet indexed.
    pub pending_cells: Vec<(usize, NodeId)>,
}

impl RowCacheEntry {
    pub fn new(row_node: NodeId, row_node_right: Option<NodeId>) -> Self {
        Self {
            row_node,
            row_node_right,
            cell_colspans: HashMap::new(),
            cell_nodes: HashMap::new(),
            pending_cells: Vec::new(),
        }
    }

    /// Fold pending cells into the index.
    pub fn index_pending(&mut self) {
        for (cell, node) in self.pending_cells.drain(..) {
            self.cell_nodes.insert(cell, node);
        }
    }

    /// Iterate both row nodes.
    pub fn row_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.row_node).chain(self.row_node_right)
    }
}
