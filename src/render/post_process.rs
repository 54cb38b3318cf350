//! Asynchronous per-cell post-processing bookkeeping.
//!
//! Columns may carry an `async_post_render` hook for customization too
//! expensive to run in the main render pass. After each render the
//! grid schedules a deferred walk over visible rows that runs the hook
//! once per cell until the cell is marked [`PostProcessStatus::Rendered`];
//! invalidating a row flips its cells back to `NeedsCleanup`, forcing a
//! re-run on the next idle tick. Evictions queue their detach +
//! cleanup-hook calls here, grouped by a generation id so a burst of
//! evictions produces one batched cleanup pass per tick, not N
//! synchronous ones.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;

use crate::dom::{NodeId, NodePool};
use crate::types::Column;

/// Per-cell post-processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessStatus {
    /// Needs cleanup and a re-run (`'C'`).
    NeedsCleanup,
    /// Hook has run for the current content (`'R'`).
    Rendered,
}

/// Deferred per-cell customization hook.
///
/// Arguments: pool, cell node, row, row item (if loaded), column, and
/// whether this is a re-run after invalidation.
pub type PostRenderHook = Rc<dyn Fn(&mut NodePool, NodeId, usize, Option<&Value>, &Column, bool)>;

/// Cleanup counterpart, run before the node is finally removed.
pub type PostRenderCleanupHook = Rc<dyn Fn(&mut NodePool, NodeId)>;

/// One queued cleanup action.
pub struct CleanupEntry {
    /// Eviction generation this entry belongs to.
    pub generation: u64,
    /// Node to clean and remove.
    pub node: NodeId,
    /// Cleanup hook, when the column defines one.
    pub hook: Option<PostRenderCleanupHook>,
}

/// Post-processing state: per-row/per-column status plus the FIFO
/// cleanup queue.
#[derive(Default)]
pub struct PostProcessState {
    status: HashMap<usize, HashMap<usize, PostProcessStatus>>,
    cleanup_queue: VecDeque<CleanupEntry>,
    generation: u64,
}

impl PostProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the hook should run for this cell.
    pub fn needs_run(&self, row: usize, cell: usize) -> bool {
        self.status
            .get(&row)
            .and_then(|cells| cells.get(&cell))
            .map_or(true, |s| *s == PostProcessStatus::NeedsCleanup)
    }

    /// Whether this run is a re-run after invalidation.
    pub fn is_re_render(&self, row: usize, cell: usize) -> bool {
        self.status
            .get(&row)
            .and_then(|cells| cells.get(&cell))
            .is_some_and(|s| *s == PostProcessStatus::NeedsCleanup)
    }

    /// Mark a cell's hook as having run.
    pub fn mark_rendered(&mut self, row: usize, cell: usize) {
        self.status
            .entry(row)
            .or_default()
            .insert(cell, PostProcessStatus::Rendered);
    }

    /// Force re-processing of one cell.
    pub fn invalidate_cell(&mut self, row: usize, cell: usize) {
        if let Some(status) = self.status.get_mut(&row).and_then(|cells| cells.get_mut(&cell)) {
            *status = PostProcessStatus::NeedsCleanup;
        }
    }

    /// Drop bookkeeping for one cell (its node was removed).
    pub fn forget_cell(&mut self, row: usize, cell: usize) {
        if let Some(cells) = self.status.get_mut(&row) {
            cells.remove(&cell);
        }
    }

    /// Force re-processing of every post-processed cell in a row.
    pub fn invalidate_row(&mut self, row: usize) {
        if let Some(cells) = self.status.get_mut(&row) {
            for status in cells.values_mut() {
                *status = PostProcessStatus::NeedsCleanup;
            }
        }
    }

    /// Drop all bookkeeping for a row (eviction).
    pub fn forget_row(&mut self, row: usize) {
        self.status.remove(&row);
    }

    /// Whether a row has any cell the hook already ran for.
    pub fn row_was_processed(&self, row: usize) -> bool {
        self.status.get(&row).is_some_and(|cells| !cells.is_empty())
    }

    /// Start a new eviction generation.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Queue a detach+cleanup action.
    pub fn queue_cleanup(&mut self, entry: CleanupEntry) {
        self.cleanup_queue.push_back(entry);
    }

    /// Whether cleanup work is pending.
    pub fn has_cleanup_work(&self) -> bool {
        !self.cleanup_queue.is_empty()
    }

    /// Pop every entry belonging to the oldest pending generation.
    pub fn drain_cleanup_batch(&mut self) -> Vec<CleanupEntry> {
        let Some(generation) = self.cleanup_queue.front().map(|e| e.generation) else {
            return Vec::new();
        };
        let mut batch = Vec::new();
        while let Some(front) = self.cleanup_queue.front() {
            if front.generation != generation {
                break;
            }
            if let Some(entry) = self.cleanup_queue.pop_front() {
                batch.push(entry);
            }
        }
        batch
    }

    /// Drop everything (destroy path).
    pub fn clear(&mut self) {
        self.status.clear();
        self.cleanup_queue.clear();
    }
}
