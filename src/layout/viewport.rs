//! Scroll state and visible/rendered range computation.
//!
//! Scroll positions live in canvas coordinates; the paged
//! virtual-height scheme maps them onto true content positions via a
//! `(page, offset)` pair. The rendered range expands the visible range
//! by an asymmetric buffer: larger in the direction of scroll travel,
//! a fixed minimum opposite — memory traded for scroll smoothness.

use crate::layout::VirtualHeight;
use crate::types::ViewRange;

/// Direction of the last vertical scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDir {
    Up,
    #[default]
    None,
    Down,
}

/// Outcome of a scroll-state update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollEffect {
    /// Vertical position changed.
    pub vertical: bool,
    /// Horizontal position changed.
    pub horizontal: bool,
    /// The virtual page offset jumped; every cached row position is
    /// stale and the cache must be rebuilt against the new range.
    pub offset_jumped: bool,
}

/// Scroll position across the scrollable panes.
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// Vertical position within the (clamped) canvas.
    pub scroll_top: f32,
    /// Horizontal position within the scrolling canvas.
    pub scroll_left: f32,
    /// Current virtual page.
    pub page: usize,
    /// Pixel correction for the current page.
    pub offset: f64,
    /// Direction of the last vertical movement.
    pub v_scroll_dir: ScrollDir,
    prev_scroll_top: f32,
    prev_scroll_left: f32,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True content-space position of the top of the viewport.
    pub fn true_scroll_top(&self) -> f64 {
        f64::from(self.scroll_top) + self.offset
    }

    /// Scroll to a virtual content position `y` in `[0, max_scroll]`.
    ///
    /// Recomputes the page/offset pair; when the offset jumps the
    /// caller must clean the row cache against the new visible range
    /// before mirroring positions to pane DOM.
    pub fn scroll_to(&mut self, y: f64, vh: &VirtualHeight, viewport_h: f32) -> ScrollEffect {
        let y = y.clamp(0.0, vh.max_scroll(viewport_h));
        let old_offset = self.offset;

        self.page = ((y / vh.page_height) as usize).min(vh.page_count.saturating_sub(1));
        self.offset = (self.page as f64 * vh.jumpiness).round();
        let new_top = (y - self.offset) as f32;

        let mut effect = ScrollEffect {
            offset_jumped: (self.offset - old_offset).abs() > f64::EPSILON,
            ..ScrollEffect::default()
        };
        if (self.prev_scroll_top - new_top).abs() > f32::EPSILON || effect.offset_jumped {
            self.v_scroll_dir =
                if f64::from(self.prev_scroll_top) + old_offset < f64::from(new_top) + self.offset {
                    ScrollDir::Down
                } else {
                    ScrollDir::Up
                };
            self.scroll_top = new_top;
            self.prev_scroll_top = new_top;
            effect.vertical = true;
        }
        effect
    }

    /// Ingest a raw scroll event from a pane (canvas coordinates).
    ///
    /// Small movements keep the current page; movements of a viewport
    /// height or more re-derive the page from the absolute position.
    pub fn apply_scroll_event(
        &mut self,
        new_top: f32,
        new_left: f32,
        vh: &VirtualHeight,
        viewport_h: f32,
    ) -> ScrollEffect {
        let mut effect = ScrollEffect::default();

        if (new_left - self.prev_scroll_left).abs() > f32::EPSILON {
            self.scroll_left = new_left;
            self.prev_scroll_left = new_left;
            effect.horizontal = true;
        }

        let v_dist = (new_top - self.prev_scroll_top).abs();
        if v_dist > f32::EPSILON {
            self.v_scroll_dir = if self.prev_scroll_top < new_top {
                ScrollDir::Down
            } else {
                ScrollDir::Up
            };
            self.prev_scroll_top = new_top;
            self.scroll_top = new_top;
            effect.vertical = true;

            if v_dist >= viewport_h {
                // Jump: re-derive the page from the absolute position.
                let old_offset = self.offset;
                if (vh.real_height - f64::from(viewport_h)).abs() < f64::EPSILON {
                    self.page = 0;
                } else {
                    let ratio = (vh.total_height - f64::from(viewport_h))
                        / (vh.real_height - f64::from(viewport_h));
                    self.page = ((f64::from(new_top) * ratio / vh.page_height) as usize)
                        .min(vh.page_count.saturating_sub(1));
                }
                self.offset = (self.page as f64 * vh.jumpiness).round();
                effect.offset_jumped = (self.offset - old_offset).abs() > f64::EPSILON;
            }
        }
        effect
    }

    /// Row/pixel span currently inside the viewport.
    pub fn visible_range(&self, row_height: f32, viewport_h: f32, viewport_w: f32) -> ViewRange {
        let rh = f64::from(row_height);
        let top = ((self.true_scroll_top() / rh).floor() as usize).max(0);
        let bottom = (((self.true_scroll_top() + f64::from(viewport_h)) / rh).floor() as usize) + 1;
        ViewRange {
            top,
            bottom,
            left_px: self.scroll_left,
            right_px: self.scroll_left + viewport_w,
        }
    }

    /// Visible range expanded by the directional buffer and clamped to
    /// the data. `row_count` includes the synthetic add-row.
    #[allow(clippy::too_many_arguments)]
    pub fn rendered_range(
        &self,
        row_height: f32,
        viewport_h: f32,
        viewport_w: f32,
        canvas_width: f32,
        row_count: usize,
        min_row_buffer: usize,
    ) -> ViewRange {
        let visible = self.visible_range(row_height, viewport_h, viewport_w);
        let buffer = (f64::from(viewport_h) / f64::from(row_height)).round() as i64;
        let min_buffer = min_row_buffer as i64;

        let mut top = visible.top as i64;
        let mut bottom = visible.bottom as i64;
        match self.v_scroll_dir {
            ScrollDir::Up => {
                top -= buffer;
                bottom += min_buffer;
            }
            ScrollDir::Down => {
                top -= min_buffer;
                bottom += buffer;
            }
            ScrollDir::None => {
                top -= min_buffer;
                bottom += min_buffer;
            }
        }

        let last = row_count.saturating_sub(1) as i64;
        let top = top.clamp(0, last.max(0)) as usize;
        let bottom = bottom.clamp(0, last.max(0)) as usize;

        let left_px = (visible.left_px - viewport_w).max(0.0);
        let right_px = (visible.right_px + viewport_w).min(canvas_width);
        ViewRange {
            top,
            bottom,
            left_px,
            right_px,
        }
    }
}
