//! Scroll handling and multi-pane synchronization.
//!
//! Up to four scrollable quadrants (frozen rows × frozen columns) plus
//! the header/footer strips must stay mutually synchronized: any
//! scroll step writes every sibling pane's position within the same
//! call, so a host mirroring [`PanePositions`] can never observe
//! tearing between panes.

use log::{debug, trace};

use crate::events::{ScrollArgs, ViewportChangedArgs};
use crate::layout::ScrollDir;
use crate::types::{CellCoord, ViewRange};

use super::Grid;

/// Scroll positions of every pane, all written in the same step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanePositions {
    /// Main scrolling viewport (bottom-right quadrant).
    pub main_scroll_top: f32,
    pub main_scroll_left: f32,
    /// Frozen-column pane follows vertical scroll only.
    pub frozen_columns_scroll_top: f32,
    /// Frozen-row band (right canvas) follows horizontal scroll only.
    pub frozen_band_scroll_left: f32,
    /// Header and auxiliary strips follow horizontal scroll.
    pub header_scroll_left: f32,
    pub header_row_scroll_left: f32,
    pub footer_row_scroll_left: f32,
    pub top_panel_scroll_left: f32,
}

impl Grid {
    // ---- Band geometry -------------------------------------------------

    /// Global row span pinned in the frozen band, if any.
    pub(crate) fn band_range(&self) -> Option<(usize, usize)> {
        let f = self.options.frozen_row;
        if f == 0 {
            return None;
        }
        let len = self.data_length_including_add_row();
        if len == 0 {
            return None;
        }
        if self.options.frozen_bottom {
            if len < f {
                return None;
            }
            Some((len - f, len - 1))
        } else {
            Some((0, f.min(len) - 1))
        }
    }

    pub(crate) fn in_band(&self, row: usize) -> bool {
        self.band_range()
            .is_some_and(|(start, end)| row >= start && row <= end)
    }

    /// Global index of the first scrolling row (rows above it are in
    /// the top frozen band).
    pub(crate) fn band_row_offset(&self) -> usize {
        if self.options.frozen_row > 0 && !self.options.frozen_bottom {
            self.options.frozen_row
        } else {
            0
        }
    }

    pub(crate) fn scrolling_row_count(&self) -> usize {
        self.data_length_including_add_row()
            .saturating_sub(self.options.frozen_row)
    }

    /// Canvas-space top of a row within its canvas.
    pub(crate) fn row_top(&self, row: usize) -> f32 {
        let rh = self.options.row_height;
        if let Some((start, _)) = self.band_range() {
            if self.in_band(row) {
                return (row - start) as f32 * rh;
            }
        }
        let band_relative = row - self.band_row_offset();
        (band_relative as f32 * rh) - self.scroll.offset as f32
    }

    /// Width of the horizontally scrolling viewport area.
    pub(crate) fn scrolling_viewport_width(&self) -> f32 {
        if self.options.frozen_column.is_some() {
            (self.layout.viewport_width - self.layout.canvas_width_l).max(0.0)
        } else {
            self.layout.viewport_width
        }
    }

    /// Width of the horizontally scrolling canvas.
    pub(crate) fn scrolling_canvas_width(&self) -> f32 {
        if self.options.frozen_column.is_some() {
            self.layout.canvas_width_r
        } else {
            self.layout.canvas_width
        }
    }

    // ---- Ranges --------------------------------------------------------

    /// Row/pixel span currently inside the viewport (global rows).
    pub fn visible_range(&self) -> ViewRange {
        let mut range = self.scroll.visible_range(
            self.options.row_height,
            self.layout.viewport_height,
            self.scrolling_viewport_width(),
        );
        let off = self.band_row_offset();
        range.top += off;
        range.bottom += off;
        range
    }

    /// Visible range expanded by the directional buffer, clamped to
    /// the data (global rows).
    pub fn rendered_range(&self) -> ViewRange {
        let mut range = self.scroll.rendered_range(
            self.options.row_height,
            self.layout.viewport_height,
            self.scrolling_viewport_width(),
            self.scrolling_canvas_width(),
            self.scrolling_row_count(),
            self.options.min_row_buffer,
        );
        let off = self.band_row_offset();
        range.top += off;
        range.bottom += off;
        range
    }

    // ---- Scroll operations ---------------------------------------------

    /// Scroll the viewport to virtual content position `y`.
    ///
    /// Clamps, recomputes the virtual page/offset, cleans the row
    /// cache against the new range when the page jumped, then writes
    /// every pane's scroll position and re-renders.
    pub fn scroll_to(&mut self, y: f64) {
        if self.destroyed {
            return;
        }
        let effect =
            self.scroll
                .scroll_to(y, &self.layout.virtual_height, self.layout.viewport_height);
        if effect.offset_jumped {
            debug!("virtual page changed to {}", self.scroll.page);
            let range = self.rendered_range();
            self.cleanup_rows(&range);
            self.reposition_cached_rows();
        }
        if effect.vertical || effect.offset_jumped {
            self.sync_pane_scroll();
            let vis = self.visible_range();
            let args = ViewportChangedArgs {
                top: vis.top,
                bottom: vis.bottom,
            };
            self.events.on_viewport_changed.notify(&args);
            self.render();
            self.notify_scroll();
        }
    }

    /// Ingest a raw scroll event (canvas coordinates) from the host.
    ///
    /// Small steps render synchronously. Large ("difficult") jumps go
    /// through the throttled render path: at most one render per
    /// `render_throttle_ms`, pending requests coalescing into exactly
    /// one follow-up.
    pub fn handle_scroll(&mut self, scroll_top: f32, scroll_left: f32) {
        if self.destroyed {
            return;
        }
        let viewport_h = self.layout.viewport_height;
        let jump = (scroll_top - self.scroll.scroll_top).abs() >= viewport_h;
        let effect = self.scroll.apply_scroll_event(
            scroll_top,
            scroll_left,
            &self.layout.virtual_height,
            viewport_h,
        );
        if !effect.vertical && !effect.horizontal {
            return;
        }
        trace!(
            "scroll to top={scroll_top} left={scroll_left} (jump={jump}, page={})",
            self.scroll.page
        );

        if effect.offset_jumped {
            let range = self.rendered_range();
            self.cleanup_rows(&range);
            self.reposition_cached_rows();
        }
        self.sync_pane_scroll();

        let vis = self.visible_range();
        let args = ViewportChangedArgs {
            top: vis.top,
            bottom: vis.bottom,
        };
        self.events.on_viewport_changed.notify(&args);

        if jump && self.clock_ms - self.last_render_ms < self.options.render_throttle_ms {
            // Backpressure: coalesce into one deferred render.
            let due_in =
                (self.last_render_ms + self.options.render_throttle_ms - self.clock_ms).max(0.0);
            self.render_task.schedule(self.clock_ms, due_in);
        } else {
            self.render_task.cancel();
            self.render();
        }
        self.notify_scroll();
    }

    fn notify_scroll(&mut self) {
        let args = ScrollArgs {
            scroll_top: self.scroll.scroll_top,
            scroll_left: self.scroll.scroll_left,
        };
        self.events.on_scroll.notify(&args);
    }

    /// Write every pane's scroll position from the canonical state.
    pub(crate) fn sync_pane_scroll(&mut self) {
        let top = self.scroll.scroll_top;
        let left = self.scroll.scroll_left;
        self.pane = PanePositions {
            main_scroll_top: top,
            main_scroll_left: left,
            frozen_columns_scroll_top: top,
            frozen_band_scroll_left: left,
            header_scroll_left: left,
            header_row_scroll_left: left,
            footer_row_scroll_left: left,
            top_panel_scroll_left: left,
        };
    }

    /// Current pane scroll positions for host mirroring.
    pub fn pane_positions(&self) -> PanePositions {
        self.pane
    }

    /// After a page jump every cached row's canvas position is stale.
    pub(crate) fn reposition_cached_rows(&mut self) {
        let rows: Vec<usize> = self.row_cache.keys().copied().collect();
        for row in rows {
            let top = self.row_top(row);
            if let Some(entry) = self.row_cache.get(&row) {
                for node in entry.row_nodes().collect::<Vec<_>>() {
                    if let Some(n) = self.pool.get_mut(node) {
                        n.top = top;
                    }
                }
            }
        }
    }

    // ---- Scroll into view ----------------------------------------------

    /// Vertically scroll the minimum amount that makes `row` fully
    /// visible. Frozen-band rows are always visible.
    pub fn scroll_row_into_view(&mut self, row: usize) {
        if self.in_band(row) {
            return;
        }
        let rh = f64::from(self.options.row_height);
        let band_relative = row - self.band_row_offset();
        let row_top = band_relative as f64 * rh;
        let view_top = self.scroll.true_scroll_top();
        let view_h = f64::from(self.layout.viewport_height);

        if row_top < view_top {
            self.scroll_to(row_top);
        } else if row_top + rh > view_top + view_h {
            self.scroll_to(row_top + rh - view_h);
        }
    }

    /// Scroll so `row` sits at the top of the viewport.
    pub fn scroll_row_to_top(&mut self, row: usize) {
        let band_relative = row.saturating_sub(self.band_row_offset());
        self.scroll_to(band_relative as f64 * f64::from(self.options.row_height));
    }

    /// Scroll vertically and horizontally until the cell is in view.
    /// Frozen columns never scroll horizontally.
    pub fn scroll_cell_into_view(&mut self, row: usize, cell: usize) {
        self.scroll_row_into_view(row);
        if cell >= self.columns.len() || self.is_frozen_col(cell) {
            return;
        }
        let left = self.layout.col_left[cell];
        let right = self.layout.col_right[cell];
        let view_w = self.scrolling_viewport_width();
        let scroll_left = self.scroll.scroll_left;

        let new_left = if left < scroll_left {
            left
        } else if right > scroll_left + view_w {
            (right - view_w).max(0.0)
        } else {
            return;
        };
        self.scroll.scroll_left = new_left;
        self.sync_pane_scroll();
        let range = self.rendered_range();
        self.cleanup_and_render_cells(&range);
        self.last_rendered_scroll_left = new_left;
        self.notify_scroll();
    }

    /// Scroll one viewport page in the given direction (-1 up, +1
    /// down) and re-anchor the active row.
    pub fn scroll_page(&mut self, dir: i32) {
        let view_h = f64::from(self.layout.viewport_height);
        let target = self.scroll.true_scroll_top() + f64::from(dir) * view_h;
        self.scroll_to(target.max(0.0));

        if let Some(active) = self.active {
            let rows_per_page =
                (self.layout.viewport_height / self.options.row_height).floor() as i64;
            let last = self.data_length_including_add_row().saturating_sub(1) as i64;
            let row = (active.row as i64 + i64::from(dir) * rows_per_page).clamp(0, last) as usize;
            if row != active.row && self.can_cell_be_active(row, active.cell) {
                self.set_active_cell_internal(Some(CellCoord::new(row, active.cell)), false);
            }
        }
    }

    // ---- Hit testing ---------------------------------------------------

    /// Which cell sits at viewport-relative data coordinates `(x, y)`?
    ///
    /// `y` is measured from the top of the data area (below headers
    /// and panels), `x` from the grid's left edge.
    pub fn cell_at_point(&self, x: f32, y: f32) -> Option<CellCoord> {
        let rh = self.options.row_height;
        let band_h = self.layout.frozen_rows_height;

        let row = if self.options.frozen_row > 0 && !self.options.frozen_bottom && y < band_h {
            (y / rh).floor() as usize
        } else {
            let data_y = if self.options.frozen_bottom {
                y
            } else {
                y - band_h
            };
            let content_y = f64::from(data_y) + self.scroll.true_scroll_top();
            if content_y < 0.0 {
                return None;
            }
            (content_y / f64::from(rh)).floor() as usize + self.band_row_offset()
        };
        if row >= self.data_length_including_add_row() {
            return None;
        }

        let cell = if self.options.frozen_column.is_some() && x < self.layout.canvas_width_l {
            self.layout.column_at_x(x, self.options.frozen_column)?
        } else if self.options.frozen_column.is_some() {
            let pane_x = x - self.layout.canvas_width_l + self.scroll.scroll_left;
            self.layout
                .column_at_x(self.layout.canvas_width_l + pane_x, self.options.frozen_column)?
        } else {
            self.layout
                .column_at_x(x + self.scroll.scroll_left, None)?
        };
        Some(CellCoord::new(row, cell))
    }

    /// Whether scrolling can move at all vertically.
    pub fn has_vertical_scroll(&self) -> bool {
        self.layout
            .virtual_height
            .max_scroll(self.layout.viewport_height)
            > 0.0
    }

    pub(crate) fn is_frozen_col(&self, cell: usize) -> bool {
        self.options.frozen_column.is_some_and(|f| cell <= f)
    }

    pub(crate) fn scroll_dir(&self) -> ScrollDir {
        self.scroll.v_scroll_dir
    }
}
