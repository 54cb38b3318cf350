//! Pre-computed geometry for the grid.
//!
//! The layout engine is the leaf dependency of rendering: it turns
//! column widths, the frozen-column index, panel toggles, and the
//! container size into per-column offsets (reset at the frozen
//! boundary), left/right canvas widths, panel heights, and the paged
//! virtual-height scheme that lets row counts exceed the host's
//! maximum canvas height.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{GridError, Result};
use crate::options::GridOptions;
use crate::types::Column;

/// Host capability: can the display honor a canvas of this height?
pub trait HeightProbe {
    fn supports(&self, height: f64) -> bool;
}

/// Probe with a fixed ceiling, the default for headless hosts.
#[derive(Debug, Clone, Copy)]
pub struct CappedProbe {
    pub ceiling: f64,
}

impl Default for CappedProbe {
    fn default() -> Self {
        Self {
            ceiling: 1_000_000_000.0,
        }
    }
}

impl HeightProbe for CappedProbe {
    fn supports(&self, height: f64) -> bool {
        height <= self.ceiling
    }
}

/// Find the tallest supported canvas height by doubling until the
/// probe stops honoring the request.
pub fn detect_max_supported_height(probe: &dyn HeightProbe) -> f64 {
    let mut supported = 1_000_000.0;
    let mut test = supported * 2.0;
    while supported < 1.0e12 && probe.supports(test) {
        supported = test;
        test *= 2.0;
    }
    supported
}

/// Process-wide memoized probe result for the default probe.
pub fn default_max_supported_height() -> f64 {
    static MAX_HEIGHT: OnceLock<f64> = OnceLock::new();
    *MAX_HEIGHT.get_or_init(|| detect_max_supported_height(&CappedProbe::default()))
}

/// The paged virtual-height scheme.
///
/// When total content height exceeds the supported ceiling, the canvas
/// is clamped to `real_height` and divided into `page_count` pages of
/// `page_height`; `jumpiness` is the per-page correction added so the
/// last page still reaches the bottom of the content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualHeight {
    /// True content height (`row_height * rows`).
    pub total_height: f64,
    /// Canvas height actually used (clamped to the ceiling).
    pub real_height: f64,
    /// Height of one virtual page.
    pub page_height: f64,
    /// Number of virtual pages.
    pub page_count: usize,
    /// Per-page scroll correction ("jumpiness").
    pub jumpiness: f64,
}

impl VirtualHeight {
    /// Compute the scheme for a row count and viewport height.
    pub fn compute(row_height: f32, row_count: usize, viewport_h: f32, max_height: f64) -> Self {
        let th = (f64::from(row_height) * row_count as f64).max(f64::from(viewport_h));
        if th < max_height {
            Self {
                total_height: th,
                real_height: th,
                page_height: th,
                page_count: 1,
                jumpiness: 0.0,
            }
        } else {
            let h = max_height;
            let ph = h / 100.0;
            let n = ((th / ph).floor() as usize).max(2);
            let cj = (th - h) / (n - 1) as f64;
            Self {
                total_height: th,
                real_height: h,
                page_height: ph,
                page_count: n,
                jumpiness: cj,
            }
        }
    }

    /// Largest valid virtual scroll position.
    pub fn max_scroll(&self, viewport_h: f32) -> f64 {
        (self.total_height - f64::from(viewport_h)).max(0.0)
    }
}

/// Position rule for one column (the stylesheet reframed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRule {
    /// Left edge within the column's canvas.
    pub left: f32,
    /// Right edge within the column's canvas.
    pub right: f32,
}

/// Computed grid geometry. Rebuilt on column width change, frozen
/// change, container resize, or panel toggle.
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Per-column left edge, reset to 0 at the frozen boundary.
    pub col_left: Vec<f32>,
    /// Per-column right edge.
    pub col_right: Vec<f32>,
    /// Width of the frozen-left canvas (whole canvas when nothing is
    /// frozen).
    pub canvas_width_l: f32,
    /// Width of the scrolling right canvas (0 when nothing is frozen).
    pub canvas_width_r: f32,
    /// Total canvas width.
    pub canvas_width: f32,
    /// Container width available to the viewports.
    pub viewport_width: f32,
    /// Height of the scrolling data viewport after panels and the
    /// frozen band are subtracted.
    pub viewport_height: f32,
    /// Height of the frozen-row band.
    pub frozen_rows_height: f32,
    /// Effective (visible) panel heights, 0 when hidden.
    pub header_height: f32,
    pub pre_header_height: f32,
    pub top_panel_height: f32,
    pub header_row_height: f32,
    pub footer_row_height: f32,
    /// Paged virtual height for the scrolling band.
    pub virtual_height: VirtualHeight,
    rules: HashMap<String, ColumnRule>,
}

impl GridLayout {
    /// Compute the full layout.
    pub fn compute(
        columns: &[Column],
        options: &GridOptions,
        container_w: f32,
        container_h: f32,
        row_count: usize,
    ) -> Self {
        let frozen = options.frozen_column;
        let mut col_left = Vec::with_capacity(columns.len());
        let mut col_right = Vec::with_capacity(columns.len());
        let mut rules = HashMap::with_capacity(columns.len());

        // Offsets reset at the frozen boundary: the frozen pane and the
        // scrolling pane are independently positioned canvases.
        let mut x = 0.0f32;
        for (i, col) in columns.iter().enumerate() {
            if frozen.is_some_and(|f| i == f + 1) {
                x = 0.0;
            }
            col_left.push(x);
            x += col.width;
            col_right.push(x);
            rules.insert(
                col.id.clone(),
                ColumnRule {
                    left: col_left[i],
                    right: col_right[i],
                },
            );
        }

        let total_width: f32 = columns.iter().map(|c| c.width).sum();
        let (canvas_width_l, canvas_width_r) = match frozen {
            Some(f) => {
                let left: f32 = columns.iter().take(f + 1).map(|c| c.width).sum();
                (left, total_width - left)
            }
            None => (total_width, 0.0),
        };

        let delta = options.panel_height_delta;
        let header_height = options.header_height + delta;
        let pre_header_height = if options.show_pre_header_panel {
            options.pre_header_panel_height + delta
        } else {
            0.0
        };
        let top_panel_height = if options.show_top_panel {
            options.top_panel_height + delta
        } else {
            0.0
        };
        let header_row_height = if options.show_header_row {
            options.header_row_height + delta
        } else {
            0.0
        };
        let footer_row_height = if options.show_footer_row {
            options.footer_row_height + delta
        } else {
            0.0
        };

        let frozen_rows_height = options.frozen_row as f32 * options.row_height;
        let chrome = header_height
            + pre_header_height
            + top_panel_height
            + header_row_height
            + footer_row_height;
        let viewport_height = (container_h - chrome - frozen_rows_height).max(0.0);

        let scrolling_rows = row_count.saturating_sub(options.frozen_row);
        let max_height = options
            .max_supported_height
            .unwrap_or_else(default_max_supported_height);
        let virtual_height =
            VirtualHeight::compute(options.row_height, scrolling_rows, viewport_height, max_height);

        Self {
            col_left,
            col_right,
            canvas_width_l,
            canvas_width_r,
            canvas_width: total_width,
            viewport_width: container_w,
            viewport_height,
            frozen_rows_height,
            header_height,
            pre_header_height,
            top_panel_height,
            header_row_height,
            footer_row_height,
            virtual_height,
            rules,
        }
    }

    /// Position rule for a column id.
    pub fn rule(&self, column_id: &str) -> Result<&ColumnRule> {
        self.rules
            .get(column_id)
            .ok_or_else(|| GridError::MissingColumnRule(column_id.to_string()))
    }

    /// Column index whose span contains canvas x, searching the pane
    /// the x-coordinate belongs to (left pane first).
    pub fn column_at_x(&self, x: f32, frozen_column: Option<usize>) -> Option<usize> {
        let boundary = frozen_column.map_or(0, |f| f + 1);
        if frozen_column.is_some() && x < self.canvas_width_l {
            for i in 0..boundary.min(self.col_left.len()) {
                if x >= self.col_left[i] && x < self.col_right[i] {
                    return Some(i);
                }
            }
            return None;
        }
        let x = if frozen_column.is_some() {
            x - self.canvas_width_l
        } else {
            x
        };
        for i in boundary..self.col_left.len() {
            if x >= self.col_left[i] && x < self.col_right[i] {
                return Some(i);
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn columns(widths: &[f32]) -> Vec<Column> {
        widths
            .iter()
            .enumerate()
            .map(|(i, &w)| Column::new(format!("c{i}"), format!("C{i}"), format!("f{i}")).with_width(w))
            .collect()
    }

    #[test]
    fn test_offsets_without_frozen() {
        let cols = columns(&[50.0, 100.0, 75.0]);
        let layout = GridLayout::compute(&cols, &GridOptions::default(), 500.0, 400.0, 10);
        assert_eq!(layout.col_left, vec![0.0, 50.0, 150.0]);
        assert_eq!(layout.col_right, vec![50.0, 150.0, 225.0]);
        assert!((layout.canvas_width_l - 225.0).abs() < 0.01);
        assert!((layout.canvas_width_r - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_offsets_reset_at_frozen_boundary() {
        let cols = columns(&[50.0, 100.0, 75.0, 25.0]);
        let opts = GridOptions {
            frozen_column: Some(1),
            ..GridOptions::default()
        };
        let layout = GridLayout::compute(&cols, &opts, 500.0, 400.0, 10);
        // Left pane: columns 0..=1 cumulative.
        assert_eq!(layout.col_left[0], 0.0);
        assert_eq!(layout.col_left[1], 50.0);
        // Right pane restarts at 0.
        assert_eq!(layout.col_left[2], 0.0);
        assert_eq!(layout.col_left[3], 75.0);
        assert!((layout.canvas_width_l - 150.0).abs() < 0.01);
        assert!((layout.canvas_width_r - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_panel_heights_togglable() {
        let cols = columns(&[50.0]);
        let opts = GridOptions {
            show_top_panel: true,
            show_footer_row: true,
            ..GridOptions::default()
        };
        let layout = GridLayout::compute(&cols, &opts, 500.0, 400.0, 10);
        // 400 - header 25 - top panel 25 - footer 21
        assert!((layout.viewport_height - 329.0).abs() < 0.01);

        let plain = GridLayout::compute(&cols, &GridOptions::default(), 500.0, 400.0, 10);
        assert!((plain.viewport_height - 375.0).abs() < 0.01);
    }

    #[test]
    fn test_virtual_height_single_page() {
        let vh = VirtualHeight::compute(25.0, 1000, 500.0, 1.0e9);
        assert_eq!(vh.page_count, 1);
        assert!((vh.total_height - 25_000.0).abs() < 0.01);
        assert!((vh.real_height - vh.total_height).abs() < 0.01);
        assert!((vh.jumpiness - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_virtual_height_paged_when_over_ceiling() {
        // 10M rows at 25px = 250M > 1M ceiling
        let vh = VirtualHeight::compute(25.0, 10_000_000, 500.0, 1_000_000.0);
        assert!(vh.page_count > 1);
        assert!((vh.real_height - 1_000_000.0).abs() < 0.01);
        assert!(vh.jumpiness > 0.0);
        // Last page plus corrections reaches the true bottom.
        let reach = vh.real_height + vh.jumpiness * (vh.page_count - 1) as f64;
        assert!((reach - vh.total_height).abs() < 1.0);
    }

    #[test]
    fn test_detect_max_height_doubles_until_refused() {
        let probe = CappedProbe { ceiling: 10_000_000.0 };
        let max = detect_max_supported_height(&probe);
        assert!((max - 8_000_000.0).abs() < 0.01);
    }

    #[test]
    fn test_rule_lookup_missing_is_error() {
        let cols = columns(&[50.0]);
        let layout = GridLayout::compute(&cols, &GridOptions::default(), 500.0, 400.0, 0);
        assert!(layout.rule("c0").is_ok());
        assert!(matches!(
            layout.rule("nope"),
            Err(GridError::MissingColumnRule(_))
        ));
    }

    #[test]
    fn test_column_at_x_frozen_panes() {
        let cols = columns(&[50.0, 50.0, 100.0]);
        let opts = GridOptions {
            frozen_column: Some(0),
            ..GridOptions::default()
        };
        let layout = GridLayout::compute(&cols, &opts, 500.0, 400.0, 10);
        assert_eq!(layout.column_at_x(10.0, opts.frozen_column), Some(0));
        // 60px falls 10px into the right pane (column 1).
        assert_eq!(layout.column_at_x(60.0, opts.frozen_column), Some(1));
        assert_eq!(layout.column_at_x(140.0, opts.frozen_column), Some(2));
    }
}
