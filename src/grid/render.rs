//! The row/cell cache and incremental renderer.
//!
//! `render()` reconciles the node pool against the current rendered
//! range: eviction first (so stale and fresh nodes never coexist at a
//! row index), then horizontal cell reconciliation for surviving rows,
//! then creation of missing rows, then the frozen band. The pass is
//! idempotent: with unchanged state it performs no pool mutations.
//!
//! Cells are emitted only when their pixel span intersects the
//! horizontal rendered range (or the column is flagged always-render,
//! or sits in a frozen pane) — the invariant that bounds node count
//! independent of column count. Cache bookkeeping is only updated
//! after formatter callbacks return, so a panicking formatter cannot
//! strand half-registered entries.

use std::collections::HashSet;

use log::trace;
use serde_json::Value;

use crate::dom::{NodeId, NodeKind};
use crate::error::{GridError, Result};
use crate::events::RenderedArgs;
use crate::layout::ScrollDir;
use crate::render::formatter::{default_formatter, extract_field, FormatterContext, FormatterResult};
use crate::render::post_process::{CleanupEntry, PostRenderHook};
use crate::render::RowCacheEntry;
use crate::types::{CellCoord, Column, ViewRange};

use super::Grid;

/// Unpacked, sanitized formatter output for one cell.
struct CellOut {
    text: String,
    add_classes: Vec<String>,
    remove_classes: Vec<String>,
    tool_tip: Option<String>,
}

impl Grid {
    // ---- The render pass -----------------------------------------------

    /// Reconcile the pool against the current rendered range.
    pub fn render(&mut self) {
        if self.is_destroyed() {
            return;
        }
        let rendered = self.rendered_range();
        trace!("render rows {}..={}", rendered.top, rendered.bottom);

        // Eviction precedes creation.
        self.cleanup_rows(&rendered);
        if (self.last_rendered_scroll_left - self.scroll.scroll_left).abs() > f32::EPSILON {
            self.cleanup_and_render_cells(&rendered);
        }
        self.render_rows(&rendered);
        self.render_band(&rendered);

        self.last_rendered_scroll_left = self.scroll.scroll_left;
        self.rendered = Some(rendered);
        self.last_render_ms = self.clock_ms;

        if self.options.enable_async_post_render {
            self.post_render_task
                .schedule(self.clock_ms, self.options.async_post_render_delay_ms);
        }
        let args = RenderedArgs {
            top: rendered.top,
            bottom: rendered.bottom,
        };
        self.events.on_rendered.notify(&args);
    }

    /// Evict cached rows outside the rendered range. The active row
    /// and frozen-band rows are pinned.
    pub(crate) fn cleanup_rows(&mut self, range: &ViewRange) {
        let active_row = self.active.map(|a| a.row);
        let stale: Vec<usize> = self
            .row_cache
            .keys()
            .copied()
            .filter(|&row| {
                Some(row) != active_row && !self.in_band(row) && !range.contains_row(row)
            })
            .collect();
        for row in stale {
            self.remove_row_from_cache(row);
        }
    }

    /// Fully evict one row: detach nodes and drop every bookkeeping
    /// entry. With deferred cleanup enabled and post-processed cells
    /// present, the detach + cleanup-hook calls are queued as one
    /// eviction generation instead of running synchronously.
    pub(crate) fn remove_row_from_cache(&mut self, row: usize) {
        let Some(entry) = self.row_cache.remove(&row) else {
            return;
        };
        let deferred =
            self.options.enable_async_post_render_cleanup && self.post.row_was_processed(row);
        if deferred {
            let generation = self.post.next_generation();
            for (&cell, &node) in &entry.cell_nodes {
                let hook = self
                    .columns
                    .get(cell)
                    .and_then(|c| c.async_post_render_cleanup.clone());
                self.post.queue_cleanup(CleanupEntry {
                    generation,
                    node,
                    hook,
                });
            }
            for node in entry.row_nodes() {
                self.pool.detach(node);
                self.post.queue_cleanup(CleanupEntry {
                    generation,
                    node,
                    hook: None,
                });
            }
            self.cleanup_task.schedule(
                self.clock_ms,
                self.options.async_post_render_cleanup_delay_ms,
            );
        } else {
            for node in entry.row_nodes() {
                self.pool.remove(node);
            }
        }
        self.post.forget_row(row);
    }

    /// Create rows in the rendered range that are not yet cached.
    fn render_rows(&mut self, range: &ViewRange) {
        let len = self.data_length_including_add_row();
        for row in range.top..=range.bottom {
            if row >= len || self.in_band(row) || self.row_cache.contains_key(&row) {
                continue;
            }
            self.build_row(row, range);
        }
    }

    /// The frozen band is an always-rendered strip.
    fn render_band(&mut self, range: &ViewRange) {
        let Some((start, end)) = self.band_range() else {
            return;
        };
        for row in start..=end {
            if !self.row_cache.contains_key(&row) {
                self.build_row(row, range);
            }
        }
    }

    /// Materialize one row and its in-range cells.
    fn build_row(&mut self, row: usize, range: &ViewRange) {
        let in_band = self.in_band(row);
        let (canvas_l, canvas_r) = if in_band {
            (self.canvas_band_l, self.canvas_band_r)
        } else {
            (self.canvas_main_l, self.canvas_main_r)
        };
        let split = self
            .options
            .frozen_column
            .is_some_and(|f| f + 1 < self.columns.len());
        let top = self.row_top(row);
        let data_len = self.data.len();
        let loading = row < data_len && self.data.item_at(row).is_none();
        let meta_classes = self
            .row_metadata(row)
            .and_then(|m| m.css_classes)
            .unwrap_or_default();

        let mut make_row_node = |grid: &mut Self, canvas: NodeId| {
            let node = grid.pool.create(NodeKind::Row);
            if let Some(n) = grid.pool.get_mut(node) {
                n.top = top;
            }
            grid.pool
                .add_class(node, if row % 2 == 1 { "odd" } else { "even" });
            if loading {
                grid.pool.add_class(node, "loading");
            }
            if row == data_len {
                grid.pool.add_class(node, "add-new");
            }
            if grid.active.is_some_and(|a| a.row == row) {
                grid.pool.add_class(node, "active");
            }
            if grid.selected_rows.binary_search(&row).is_ok() {
                grid.pool.add_class(node, "selected");
            }
            for class in meta_classes.split_whitespace() {
                grid.pool.add_class(node, class);
            }
            grid.pool.attach(canvas, node);
            node
        };

        let row_node = make_row_node(self, canvas_l);
        let row_node_r = split.then(|| make_row_node(self, canvas_r));
        let mut entry = RowCacheEntry::new(row_node, row_node_r);

        let col_count = self.columns.len();
        let meta = self.row_metadata(row);
        let mut cell = 0;
        while cell < col_count {
            let span = meta
                .as_ref()
                .map_or(1, |m| m.colspan(cell, col_count))
                .min(col_count - cell);
            if self.should_render_cell(cell, span, range) {
                let target = if self.is_frozen_col(cell) {
                    row_node
                } else {
                    row_node_r.unwrap_or(row_node)
                };
                let node = self.create_cell_node(row, cell, span, target);
                entry.pending_cells.push((cell, node));
                entry.cell_colspans.insert(cell, span);
            }
            cell += span;
        }
        entry.index_pending();
        self.row_cache.insert(row, entry);
    }

    /// Whether the cell's pixel span belongs in the current pass.
    fn should_render_cell(&self, cell: usize, span: usize, range: &ViewRange) -> bool {
        if self.is_frozen_col(cell) {
            return true;
        }
        if self.columns.get(cell).is_some_and(|c| c.always_render) {
            return true;
        }
        self.cell_intersects(cell, span, range)
    }

    fn cell_intersects(&self, cell: usize, span: usize, range: &ViewRange) -> bool {
        let last = (cell + span - 1).min(self.columns.len().saturating_sub(1));
        self.layout.col_right[last] > range.left_px && self.layout.col_left[cell] < range.right_px
    }

    /// Create, style, and attach one cell node.
    fn create_cell_node(&mut self, row: usize, cell: usize, span: usize, target: NodeId) -> NodeId {
        // Run the formatter before any pool mutation.
        let out = self.cell_content(row, cell);
        let last = (cell + span - 1).min(self.columns.len().saturating_sub(1));
        let left = self.layout.col_left[cell];
        let width = self.layout.col_right[last] - left;

        let node = self.pool.create(NodeKind::Cell);
        if let Some(n) = self.pool.get_mut(node) {
            n.left = left;
            n.width = width;
            n.content = out.text;
            n.tool_tip = out.tool_tip;
        }
        if let Some(css) = self.columns[cell].css_class.clone() {
            self.pool.add_class(node, &css);
        }
        for class in &out.add_classes {
            self.pool.add_class(node, class);
        }
        for class in &out.remove_classes {
            self.pool.remove_class(node, class);
        }
        if self.active == Some(CellCoord::new(row, cell)) {
            self.pool.add_class(node, "active");
        }
        self.pool.attach(target, node);
        node
    }

    /// Resolve and run the formatter for a cell, sanitizing output.
    fn cell_content(&self, row: usize, cell: usize) -> CellOut {
        let meta = self.row_metadata(row);
        let item = self.data.item_at(row);
        let column = &self.columns[cell];
        let value = item.and_then(|it| self.extract_value(it, column));

        let formatter = column
            .formatter
            .clone()
            .or_else(|| {
                meta.as_ref()
                    .and_then(|m| m.cell(cell).and_then(|c| c.formatter.clone()))
            })
            .or_else(|| meta.as_ref().and_then(|m| m.formatter.clone()))
            .or_else(|| self.options.default_formatter.clone());

        let ctx = FormatterContext {
            row,
            cell,
            value: value.as_ref(),
            column,
            item,
        };
        let result = match &formatter {
            Some(f) => f(&ctx),
            None => default_formatter(&ctx),
        };
        let (text, add_classes, remove_classes, tool_tip) = match result {
            FormatterResult::Text(t) => (t, Vec::new(), Vec::new(), None),
            FormatterResult::Rich(r) => (r.text, r.add_classes, r.remove_classes, r.tool_tip),
        };
        CellOut {
            text: self.sanitize(text),
            add_classes,
            remove_classes,
            tool_tip,
        }
    }

    /// Extract a cell's value from a row item.
    pub fn extract_value(&self, item: &Value, column: &Column) -> Option<Value> {
        match &self.options.value_extractor {
            Some(extractor) => extractor(item, column),
            None => extract_field(item, column).cloned(),
        }
    }

    /// Convenience: extracted value for (row, column id).
    pub fn value_for_column(&self, row: usize, column_id: &str) -> Option<Value> {
        let cell = self.column_index(column_id)?;
        let item = self.data.item_at(row)?;
        self.extract_value(item, &self.columns[cell])
    }

    pub(crate) fn sanitize(&self, dirty: String) -> String {
        match &self.options.sanitizer {
            Some(sanitizer) => sanitizer(&dirty),
            None => dirty,
        }
    }

    // ---- Horizontal reconciliation -------------------------------------

    /// Drop cells that scrolled out of the horizontal range and create
    /// the ones that scrolled in, for every cached row.
    pub(crate) fn cleanup_and_render_cells(&mut self, range: &ViewRange) {
        let rows: Vec<usize> = self.row_cache.keys().copied().collect();
        for row in rows {
            let mut to_remove: Vec<(usize, NodeId)> = Vec::new();
            if let Some(entry) = self.row_cache.get(&row) {
                for (&cell, &node) in &entry.cell_nodes {
                    if self.is_frozen_col(cell)
                        || self.columns.get(cell).is_some_and(|c| c.always_render)
                        || self.active == Some(CellCoord::new(row, cell))
                    {
                        continue;
                    }
                    let span = entry.cell_colspans.get(&cell).copied().unwrap_or(1);
                    if !self.cell_intersects(cell, span, range) {
                        to_remove.push((cell, node));
                    }
                }
            }
            for (cell, node) in to_remove {
                self.pool.remove(node);
                if let Some(entry) = self.row_cache.get_mut(&row) {
                    entry.cell_nodes.remove(&cell);
                    entry.cell_colspans.remove(&cell);
                }
                self.post.forget_cell(row, cell);
            }
            self.render_missing_cells(row, range);
        }
    }

    fn render_missing_cells(&mut self, row: usize, range: &ViewRange) {
        let Some(entry) = self.row_cache.get(&row) else {
            return;
        };
        let row_node = entry.row_node;
        let row_node_r = entry.row_node_right;
        let existing: HashSet<usize> = entry.cell_nodes.keys().copied().collect();

        let col_count = self.columns.len();
        let meta = self.row_metadata(row);
        let mut missing: Vec<(usize, usize)> = Vec::new();
        let mut cell = 0;
        while cell < col_count {
            let span = meta
                .as_ref()
                .map_or(1, |m| m.colspan(cell, col_count))
                .min(col_count - cell);
            if !existing.contains(&cell) && self.should_render_cell(cell, span, range) {
                missing.push((cell, span));
            }
            cell += span;
        }
        for (cell, span) in missing {
            let target = if self.is_frozen_col(cell) {
                row_node
            } else {
                row_node_r.unwrap_or(row_node)
            };
            let node = self.create_cell_node(row, cell, span, target);
            if let Some(entry) = self.row_cache.get_mut(&row) {
                entry.cell_nodes.insert(cell, node);
                entry.cell_colspans.insert(cell, span);
            }
        }
    }

    // ---- Surgical updates ----------------------------------------------

    /// Re-run the formatter for one cached cell.
    pub fn update_cell(&mut self, row: usize, cell: usize) {
        let Some(node) = self.get_cell_node(row, cell) else {
            return;
        };
        if self.is_editing_at(row, cell) {
            return; // editor owns the cell's content
        }
        let out = self.cell_content(row, cell);
        if let Some(n) = self.pool.get_mut(node) {
            n.content = out.text;
            n.tool_tip = out.tool_tip;
        }
        for class in &out.add_classes {
            self.pool.add_class(node, class);
        }
        for class in &out.remove_classes {
            self.pool.remove_class(node, class);
        }
        self.post.invalidate_cell(row, cell);
        if self.options.enable_async_post_render {
            self.post_render_task
                .schedule(self.clock_ms, self.options.async_post_render_delay_ms);
        }
    }

    /// Re-run formatters for every cached cell of a row.
    pub fn update_row(&mut self, row: usize) {
        let cells: Vec<usize> = self
            .row_cache
            .get(&row)
            .map(|e| e.cell_nodes.keys().copied().collect())
            .unwrap_or_default();
        for cell in cells {
            self.update_cell(row, cell);
        }
        self.post.invalidate_row(row);
    }

    /// Row range of the last completed render pass.
    pub fn last_rendered_range(&self) -> Option<ViewRange> {
        self.rendered
    }

    /// Node handle for a cached cell.
    pub fn get_cell_node(&self, row: usize, cell: usize) -> Option<NodeId> {
        self.row_cache
            .get(&row)
            .and_then(|e| e.cell_nodes.get(&cell))
            .copied()
    }

    // ---- Invalidation --------------------------------------------------

    /// Evict one row so the next render rebuilds it.
    pub fn invalidate_row(&mut self, row: usize) {
        self.invalidate_rows(&[row]);
    }

    /// Evict a set of rows.
    pub fn invalidate_rows(&mut self, rows: &[usize]) {
        for &row in rows {
            if self.is_editing_at_row(row) {
                self.make_active_cell_normal();
            }
            self.remove_row_from_cache(row);
        }
    }

    /// Evict every cached row.
    pub fn invalidate_all_rows(&mut self) {
        if self.editor.is_some() {
            self.make_active_cell_normal();
        }
        let rows: Vec<usize> = self.row_cache.keys().copied().collect();
        for row in rows {
            self.remove_row_from_cache(row);
        }
    }

    /// Full refresh: row count, cache, and an immediate render.
    pub fn invalidate(&mut self) {
        self.update_row_count();
        self.invalidate_all_rows();
        self.render();
    }

    // ---- Header rendering ----------------------------------------------

    pub(crate) fn render_header(&mut self) {
        for node in self.header_nodes.drain(..) {
            self.pool.remove(node);
        }

        struct HeaderSpec {
            name: String,
            css: Option<String>,
            tool_tip: Option<String>,
            left: f32,
            width: f32,
            frozen: bool,
        }
        let specs: Vec<HeaderSpec> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| HeaderSpec {
                name: col.name.clone(),
                css: col.header_css_class.clone(),
                tool_tip: col.tool_tip.clone(),
                left: self.layout.col_left[i],
                width: col.width,
                frozen: self.options.frozen_column.is_some_and(|f| i <= f),
            })
            .collect();

        for spec in specs {
            let node = self.pool.create(NodeKind::HeaderColumn);
            let content = self.sanitize(spec.name);
            if let Some(n) = self.pool.get_mut(node) {
                n.content = content;
                n.tool_tip = spec.tool_tip;
                n.left = spec.left;
                n.width = spec.width;
            }
            if let Some(css) = spec.css {
                self.pool.add_class(node, &css);
            }
            let strip = if spec.frozen || self.options.frozen_column.is_none() {
                self.header_l
            } else {
                self.header_r
            };
            self.pool.attach(strip, node);
            self.header_nodes.push(node);
        }
        self.apply_sort_indicators();
    }

    /// Mirror column widths into header nodes without a full rebuild.
    pub(crate) fn apply_header_widths(&mut self) {
        let geom: Vec<(f32, f32)> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (self.layout.col_left[i], c.width))
            .collect();
        for (&node, (left, width)) in self.header_nodes.iter().zip(geom) {
            if let Some(n) = self.pool.get_mut(node) {
                n.left = left;
                n.width = width;
            }
        }
    }

    pub(crate) fn apply_sort_indicators(&mut self) {
        for &node in &self.header_nodes {
            self.pool.remove_class(node, "sorted-asc");
            self.pool.remove_class(node, "sorted-desc");
        }
        let marks: Vec<(usize, bool)> = self
            .sort_columns
            .iter()
            .filter_map(|s| Some((self.column_index(&s.column_id)?, s.ascending)))
            .collect();
        for (idx, ascending) in marks {
            if let Some(&node) = self.header_nodes.get(idx) {
                self.pool
                    .add_class(node, if ascending { "sorted-asc" } else { "sorted-desc" });
            }
        }
    }

    /// Surgically retitle a column header.
    pub fn update_column_header(
        &mut self,
        column_id: &str,
        name: &str,
        tool_tip: Option<&str>,
    ) -> Result<()> {
        let idx = self
            .column_index(column_id)
            .ok_or_else(|| GridError::Precondition(format!("unknown column {column_id:?}")))?;
        self.columns[idx].name = name.to_string();
        self.columns[idx].tool_tip = tool_tip.map(str::to_string);
        if let Some(&node) = self.header_nodes.get(idx) {
            let content = self.sanitize(name.to_string());
            if let Some(n) = self.pool.get_mut(node) {
                n.content = content;
                n.tool_tip = tool_tip.map(str::to_string);
            }
        }
        Ok(())
    }

    // ---- Async post-processing -----------------------------------------

    /// Run post-render hooks for one visible row, walking from the
    /// scroll-direction end; reschedules itself while work remains.
    pub(crate) fn run_post_render_step(&mut self) {
        if !self.options.enable_async_post_render {
            return;
        }
        let visible = self.visible_range();
        let mut rows: Vec<usize> = self
            .row_cache
            .keys()
            .copied()
            .filter(|&r| visible.contains_row(r) || self.in_band(r))
            .collect();
        rows.sort_unstable();
        if self.scroll_dir() == ScrollDir::Up {
            rows.reverse();
        }

        for row in rows {
            let Some(entry) = self.row_cache.get(&row) else {
                continue;
            };
            let work: Vec<(usize, NodeId, PostRenderHook)> = entry
                .cell_nodes
                .iter()
                .filter_map(|(&cell, &node)| {
                    let hook = self.columns.get(cell)?.async_post_render.clone()?;
                    self.post.needs_run(row, cell).then_some((cell, node, hook))
                })
                .collect();
            if work.is_empty() {
                continue;
            }
            for (cell, node, hook) in work {
                let re_render = self.post.is_re_render(row, cell);
                hook(
                    &mut self.pool,
                    node,
                    row,
                    self.data.item_at(row),
                    &self.columns[cell],
                    re_render,
                );
                // Bookkeeping only after the callback returns.
                self.post.mark_rendered(row, cell);
            }
            // One row per tick; reschedule for the rest.
            self.post_render_task
                .schedule(self.clock_ms, self.options.async_post_render_delay_ms);
            return;
        }
    }

    /// Process one eviction generation of the cleanup queue.
    pub(crate) fn run_cleanup_step(&mut self) {
        let batch = self.post.drain_cleanup_batch();
        for entry in batch {
            if let Some(hook) = entry.hook {
                hook(&mut self.pool, entry.node);
            }
            self.pool.remove(entry.node);
        }
        if self.post.has_cleanup_work() {
            self.cleanup_task.schedule(
                self.clock_ms,
                self.options.async_post_render_cleanup_delay_ms,
            );
        }
    }
}
