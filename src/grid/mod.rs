//! The grid component: composition root and lifecycle.
//!
//! `Grid` owns the node pool, the row cache, scroll state, the active
//! cell, the edit session, and the async queues, and wires them into
//! the render pipeline driven by scroll/resize/data-mutation calls.
//! The `impl Grid` blocks are split across this module's files by
//! concern: rendering, scrolling, navigation, editing, and column
//! interaction.

mod editing;
mod interaction;
mod navigation;
mod render;
mod scroll;

pub use interaction::ResizeDrag;
pub use navigation::NavDir;
pub use scroll::PanePositions;

use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::columns::ColumnGroup;
use crate::dom::{NodeId, NodeKind, NodePool};
use crate::edit::{next_controller_id, Editor, EditorLock};
use crate::error::{GridError, Result};
use crate::events::{GridEvents, SelectedRowsChangedArgs, SortArgs};
use crate::layout::{GridLayout, ScrollState};
use crate::options::GridOptions;
use crate::render::post_process::PostProcessState;
use crate::render::timer::DeferredTask;
use crate::render::RowCacheEntry;
use crate::types::{
    CellCoord, CellRange, Column, DataSource, RowMetadata, SelectionModel, SortColumn, ViewRange,
};

/// Capability interface for plugins.
///
/// Plugins are initialized on registration and destroyed in reverse
/// registration order when the grid is destroyed.
pub trait GridPlugin {
    /// Called once on registration.
    fn init(&mut self, grid: &mut Grid);
    /// Teardown hook.
    fn destroy(&mut self, _grid: &mut Grid) {}
    /// Optional name for lookup/unregistration.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// A virtualized data grid over a pluggable data source.
pub struct Grid {
    pub(crate) options: GridOptions,
    pub(crate) columns: Vec<Column>,
    pub(crate) column_groups: Vec<ColumnGroup>,
    pub(crate) data: Box<dyn DataSource>,
    pub(crate) pool: NodePool,
    pub(crate) layout: GridLayout,
    pub(crate) scroll: ScrollState,
    pub(crate) pane: PanePositions,
    pub(crate) container_w: f32,
    pub(crate) container_h: f32,

    // Canvas quadrants: main (scrolling rows) and the frozen-row band,
    // each split left/right at the frozen-column boundary.
    pub(crate) canvas_main_l: NodeId,
    pub(crate) canvas_main_r: NodeId,
    pub(crate) canvas_band_l: NodeId,
    pub(crate) canvas_band_r: NodeId,
    pub(crate) header_l: NodeId,
    pub(crate) header_r: NodeId,
    pub(crate) header_nodes: Vec<NodeId>,

    pub(crate) row_cache: HashMap<usize, RowCacheEntry>,
    pub(crate) rendered: Option<ViewRange>,
    pub(crate) last_rendered_scroll_left: f32,

    pub(crate) active: Option<CellCoord>,

    pub(crate) editor: Option<Box<dyn Editor>>,
    pub(crate) edit_snapshot: Option<Value>,
    pub(crate) lock: EditorLock,
    pub(crate) controller_id: u64,

    pub(crate) sort_columns: Vec<SortColumn>,
    pub(crate) selection_model: Option<Box<dyn SelectionModel>>,
    pub(crate) selected_rows: Vec<usize>,

    pub(crate) post: PostProcessState,
    pub(crate) post_render_task: DeferredTask,
    pub(crate) cleanup_task: DeferredTask,
    pub(crate) render_task: DeferredTask,
    pub(crate) clock_ms: f64,
    pub(crate) last_render_ms: f64,

    /// Event buses; subscribe directly.
    pub events: GridEvents,
    plugins: Vec<Box<dyn GridPlugin>>,
    destroyed: bool,
}

impl Grid {
    /// Build a grid over `data` with the given columns and options.
    ///
    /// Configuration errors (duplicate column ids, out-of-range frozen
    /// index, non-positive row height) are fatal: the error is
    /// returned and nothing is retained.
    pub fn new(
        columns: Vec<Column>,
        data: Box<dyn DataSource>,
        options: GridOptions,
        container_w: f32,
        container_h: f32,
    ) -> Result<Self> {
        Self::with_editor_lock(columns, data, options, container_w, container_h, EditorLock::new())
    }

    /// Like [`Grid::new`], sharing an external edit lock (several
    /// grids sharing one lock edit mutually exclusively).
    pub fn with_editor_lock(
        columns: Vec<Column>,
        data: Box<dyn DataSource>,
        options: GridOptions,
        container_w: f32,
        container_h: f32,
        lock: EditorLock,
    ) -> Result<Self> {
        validate_config(&columns, &options)?;

        let mut pool = NodePool::new();
        let canvas_main_l = pool.create(NodeKind::Canvas);
        let canvas_main_r = pool.create(NodeKind::Canvas);
        let canvas_band_l = pool.create(NodeKind::Canvas);
        let canvas_band_r = pool.create(NodeKind::Canvas);
        let header_l = pool.create(NodeKind::Header);
        let header_r = pool.create(NodeKind::Header);

        let layout = GridLayout::compute(&columns, &options, container_w, container_h, data.len());

        let mut grid = Self {
            options,
            columns,
            column_groups: Vec::new(),
            data,
            pool,
            layout,
            scroll: ScrollState::new(),
            pane: PanePositions::default(),
            container_w,
            container_h,
            canvas_main_l,
            canvas_main_r,
            canvas_band_l,
            canvas_band_r,
            header_l,
            header_r,
            header_nodes: Vec::new(),
            row_cache: HashMap::new(),
            rendered: None,
            last_rendered_scroll_left: 0.0,
            active: None,
            editor: None,
            edit_snapshot: None,
            lock,
            controller_id: next_controller_id(),
            sort_columns: Vec::new(),
            selection_model: None,
            selected_rows: Vec::new(),
            post: PostProcessState::new(),
            post_render_task: DeferredTask::new(),
            cleanup_task: DeferredTask::new(),
            render_task: DeferredTask::new(),
            clock_ms: 0.0,
            last_render_ms: f64::MIN,
            events: GridEvents::default(),
            plugins: Vec::new(),
            destroyed: false,
        };
        grid.render_header();
        Ok(grid)
    }

    // ---- Lifecycle -----------------------------------------------------

    /// Advance the grid's clock and run any due deferred work.
    ///
    /// Hosts call this from their event loop / timer callback. Order:
    /// throttled render first, then the post-render pass, then batched
    /// cleanup.
    pub fn tick(&mut self, now_ms: f64) {
        if self.destroyed {
            return;
        }
        self.clock_ms = now_ms;
        if self.render_task.fire_if_due(now_ms) {
            self.render();
        }
        if self.post_render_task.fire_if_due(now_ms) {
            self.run_post_render_step();
        }
        if self.cleanup_task.fire_if_due(now_ms) {
            self.run_cleanup_step();
        }
    }

    /// Tear the grid down: cancel pending timers, destroy plugins in
    /// reverse registration order, detach all cached DOM.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.events.on_before_destroy.notify(&());

        self.post_render_task.cancel();
        self.cleanup_task.cancel();
        self.render_task.cancel();

        if self.editor.is_some() {
            let _ = self.cancel_current_edit();
        }

        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in plugins.iter_mut().rev() {
            plugin.destroy(self);
        }

        if let Some(mut model) = self.selection_model.take() {
            model.destroy();
        }

        for node in [
            self.canvas_main_l,
            self.canvas_main_r,
            self.canvas_band_l,
            self.canvas_band_r,
            self.header_l,
            self.header_r,
        ] {
            self.pool.remove(node);
        }
        self.row_cache.clear();
        self.header_nodes.clear();
        self.post.clear();
        self.active = None;
        self.events.clear();
        self.destroyed = true;
        debug!("grid destroyed");
    }

    /// Whether `destroy` has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---- Accessors -----------------------------------------------------

    /// Current column definitions, in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Display index of a column id.
    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    /// Grid options.
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// The data source.
    pub fn data(&self) -> &dyn DataSource {
        self.data.as_ref()
    }

    /// Mutable data source access. Callers that mutate rows are
    /// responsible for the matching `invalidate_row`/`update_row`.
    pub fn data_mut(&mut self) -> &mut dyn DataSource {
        self.data.as_mut()
    }

    /// Number of data rows (excluding the synthetic add-row).
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Row count including the synthetic add-row when enabled.
    pub fn data_length_including_add_row(&self) -> usize {
        self.data.len() + usize::from(self.options.enable_add_row)
    }

    /// The node pool, for hosts mirroring it into a display.
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Computed layout geometry.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Scroll state.
    pub fn scroll_state(&self) -> &ScrollState {
        &self.scroll
    }

    /// The edit lock shared by this grid.
    pub fn editor_lock(&self) -> &EditorLock {
        &self.lock
    }

    /// Main scrolling canvas nodes (left pane, right pane).
    pub fn main_canvases(&self) -> (NodeId, NodeId) {
        (self.canvas_main_l, self.canvas_main_r)
    }

    /// Frozen-row band canvas nodes (left pane, right pane).
    pub fn band_canvases(&self) -> (NodeId, NodeId) {
        (self.canvas_band_l, self.canvas_band_r)
    }

    /// Header strip nodes (left, right).
    pub fn header_strips(&self) -> (NodeId, NodeId) {
        (self.header_l, self.header_r)
    }

    /// Number of cached row entries (the virtualization working set).
    pub fn cached_row_count(&self) -> usize {
        self.row_cache.len()
    }

    /// Cache entry for a row, if materialized.
    pub fn row_cache_entry(&self, row: usize) -> Option<&RowCacheEntry> {
        self.row_cache.get(&row)
    }

    // ---- Mutation entry points ----------------------------------------

    /// Replace the column set. Invalidate + re-render follows.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        validate_config(&columns, &self.options)?;
        self.columns = columns;
        self.invalidate_all_rows();
        self.relayout();
        self.render_header();
        Ok(())
    }

    /// Replace the options. Re-validates against the current columns.
    pub fn set_options(&mut self, options: GridOptions) -> Result<()> {
        validate_config(&self.columns, &options)?;
        self.options = options;
        self.invalidate_all_rows();
        self.relayout();
        self.render_header();
        Ok(())
    }

    /// Replace the data source.
    pub fn set_data(&mut self, data: Box<dyn DataSource>, scroll_to_top: bool) {
        self.invalidate_all_rows();
        self.data = data;
        self.update_row_count();
        if scroll_to_top {
            self.scroll_to(0.0);
        }
    }

    /// Re-read the data length after external growth/shrink: refresh
    /// the virtual height and drop state beyond the new end.
    pub fn update_row_count(&mut self) {
        let len = self.data_length_including_add_row();
        let stale: Vec<usize> = self
            .row_cache
            .keys()
            .copied()
            .filter(|&row| row >= len)
            .collect();
        for row in stale {
            self.remove_row_from_cache(row);
        }
        if let Some(active) = self.active {
            if active.row >= len {
                self.reset_active_cell();
            }
        }
        self.relayout();
    }

    /// Resize the container.
    pub fn resize(&mut self, container_w: f32, container_h: f32) {
        self.container_w = container_w;
        self.container_h = container_h;
        self.relayout();
    }

    pub(crate) fn relayout(&mut self) {
        self.layout = GridLayout::compute(
            &self.columns,
            &self.options,
            self.container_w,
            self.container_h,
            self.data.len(),
        );
    }

    // ---- Metadata helpers ---------------------------------------------

    pub(crate) fn row_metadata(&self, row: usize) -> Option<RowMetadata> {
        self.data.metadata_for(row)
    }

    /// Effective colspan at (row, cell).
    pub fn colspan(&self, row: usize, cell: usize) -> usize {
        self.row_metadata(row)
            .map_or(1, |m| m.colspan(cell, self.columns.len()))
    }

    // ---- Plugins -------------------------------------------------------

    /// Register and initialize a plugin.
    pub fn register_plugin(&mut self, mut plugin: Box<dyn GridPlugin>) {
        plugin.init(self);
        self.plugins.push(plugin);
    }

    /// Destroy and remove a plugin by name.
    pub fn unregister_plugin(&mut self, name: &str) -> bool {
        let Some(idx) = self
            .plugins
            .iter()
            .position(|p| p.name() == Some(name))
        else {
            return false;
        };
        let mut plugin = self.plugins.remove(idx);
        plugin.destroy(self);
        true
    }

    // ---- Sort ----------------------------------------------------------

    /// Replace the sort state with a single column.
    pub fn set_sort_column(&mut self, column_id: &str, ascending: bool) {
        self.set_sort_columns(vec![SortColumn::new(column_id, ascending)]);
    }

    /// Replace the multi-column sort state and update header markers.
    pub fn set_sort_columns(&mut self, sort_columns: Vec<SortColumn>) {
        self.sort_columns = sort_columns;
        self.apply_sort_indicators();
        let args = SortArgs {
            sort_columns: self.sort_columns.clone(),
        };
        self.events.on_sort.notify(&args);
    }

    /// Current sort state.
    pub fn sort_columns(&self) -> &[SortColumn] {
        &self.sort_columns
    }

    // ---- Selection -----------------------------------------------------

    /// Install a selection model, destroying any previous one.
    pub fn set_selection_model(&mut self, model: Box<dyn SelectionModel>) {
        if let Some(mut old) = self.selection_model.take() {
            old.destroy();
        }
        self.selection_model = Some(model);
    }

    /// Whether a selection model is installed.
    pub fn has_selection_model(&self) -> bool {
        self.selection_model.is_some()
    }

    /// Currently selected rows, ascending.
    pub fn selected_rows(&self) -> &[usize] {
        &self.selected_rows
    }

    /// Select the given rows through the selection model.
    ///
    /// Precondition: a selection model is installed.
    pub fn set_selected_rows(&mut self, rows: &[usize]) -> Result<()> {
        let last_cell = self.columns.len().saturating_sub(1);
        let model = self
            .selection_model
            .as_mut()
            .ok_or_else(|| GridError::Precondition("no selection model installed".into()))?;
        let ranges: Vec<CellRange> = rows
            .iter()
            .map(|&row| CellRange::new(row, 0, row, last_cell))
            .collect();
        model.set_selected_ranges(&ranges);
        self.reconcile_selection();
        Ok(())
    }

    /// Re-derive the selected-row set from the model's ranges and
    /// update highlighting. Called after every call into the model.
    pub(crate) fn reconcile_selection(&mut self) {
        let Some(model) = self.selection_model.as_ref() else {
            return;
        };
        let mut rows: Vec<usize> = Vec::new();
        for range in model.selected_ranges() {
            for row in range.rows() {
                if row < self.data.len() && self.can_row_be_selected(row) {
                    rows.push(row);
                }
            }
        }
        rows.sort_unstable();
        rows.dedup();
        if rows == self.selected_rows {
            return;
        }

        for &row in &self.selected_rows {
            if let Some(entry) = self.row_cache.get(&row) {
                for node in entry.row_nodes().collect::<Vec<_>>() {
                    self.pool.remove_class(node, "selected");
                }
            }
        }
        for &row in &rows {
            if let Some(entry) = self.row_cache.get(&row) {
                for node in entry.row_nodes().collect::<Vec<_>>() {
                    self.pool.add_class(node, "selected");
                }
            }
        }
        self.selected_rows = rows;
        let args = SelectedRowsChangedArgs {
            rows: self.selected_rows.clone(),
        };
        self.events.on_selected_rows_changed.notify(&args);
    }

    pub(crate) fn can_row_be_selected(&self, row: usize) -> bool {
        self.row_metadata(row)
            .and_then(|m| m.selectable)
            .unwrap_or(true)
    }
}

fn validate_config(columns: &[Column], options: &GridOptions) -> Result<()> {
    if columns.is_empty() {
        return Err(GridError::Config("at least one column is required".into()));
    }
    let mut seen = std::collections::HashSet::new();
    for col in columns {
        if col.id.is_empty() {
            return Err(GridError::Config("column with empty id".into()));
        }
        if !seen.insert(col.id.as_str()) {
            return Err(GridError::Config(format!("duplicate column id {:?}", col.id)));
        }
    }
    if let Some(f) = options.frozen_column {
        if f >= columns.len() {
            return Err(GridError::Config(format!(
                "frozen column index {f} out of range for {} columns",
                columns.len()
            )));
        }
    }
    if options.row_height <= 0.0 {
        return Err(GridError::Config("row height must be positive".into()));
    }
    Ok(())
}
