//! Grid configuration.

use serde::{Deserialize, Serialize};

use crate::edit::EditCommandHandler;
use crate::render::formatter::{Formatter, Sanitizer, ValueExtractor};

/// How autosize reconciles guide widths against the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewportFitPolicy {
    /// Size columns to their guide widths as-is; viewport scrolls.
    #[default]
    None,
    /// Report a container width that fits the columns.
    GrowContainer,
    /// Proportionally scale non-locked columns to exactly fill the
    /// viewport; falls back to scrolling when even minimum widths
    /// exceed it.
    ScaleColumns,
}

/// Grid construction options.
///
/// Plain-data fields serialize for host persistence; capability hooks
/// (`sanitizer`, `value_extractor`, ...) are skipped.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Pixel height of every row.
    pub row_height: f32,
    /// Whether cells may be edited at all.
    pub editable: bool,
    /// Enter edit mode immediately when a cell becomes active.
    pub auto_edit: bool,
    /// Append a synthetic add-row after the last data row.
    pub enable_add_row: bool,
    /// Whether keyboard navigation is enabled.
    pub enable_cell_navigation: bool,
    /// Index of the last frozen-left column, if any.
    pub frozen_column: Option<usize>,
    /// Number of frozen rows (pinned band), 0 for none.
    pub frozen_row: usize,
    /// Pin the frozen band to the bottom instead of the top.
    pub frozen_bottom: bool,
    /// Minimum width the scrolling right pane keeps when frozen-left
    /// columns grow.
    pub frozen_right_viewport_min_width: f32,
    /// Minimum row buffer opposite the scroll direction.
    pub min_row_buffer: usize,
    /// Conserve total width during resize drags.
    pub force_fit_columns: bool,
    /// Container-level autosize policy.
    pub viewport_fit: ViewportFitPolicy,
    /// Header strip height.
    pub header_height: f32,
    /// Optional secondary header row (filters etc.).
    pub show_header_row: bool,
    pub header_row_height: f32,
    /// Optional top panel.
    pub show_top_panel: bool,
    pub top_panel_height: f32,
    /// Optional pre-header panel (grouped headers live here).
    pub show_pre_header_panel: bool,
    pub pre_header_panel_height: f32,
    /// Optional footer row.
    pub show_footer_row: bool,
    pub footer_row_height: f32,
    /// Border/padding delta added to each visible panel's height.
    pub panel_height_delta: f32,
    /// Run column `async_post_render` hooks after render passes.
    pub enable_async_post_render: bool,
    /// Defer eviction detach/cleanup to batched idle passes.
    pub enable_async_post_render_cleanup: bool,
    /// Delay before the async post-render pass runs.
    pub async_post_render_delay_ms: f64,
    /// Delay before the batched post-render cleanup pass runs.
    pub async_post_render_cleanup_delay_ms: f64,
    /// Minimum period between renders on large ("difficult") scroll
    /// jumps; pending requests coalesce into one follow-up.
    pub render_throttle_ms: f64,
    /// Override for the probed maximum supported canvas height.
    pub max_supported_height: Option<f64>,
    /// Injection boundary: applied to all formatter/editor output.
    #[serde(skip)]
    pub sanitizer: Option<Sanitizer>,
    /// Replaces the default field lookup.
    #[serde(skip)]
    pub value_extractor: Option<ValueExtractor>,
    /// Replaces the escaping passthrough default formatter.
    #[serde(skip)]
    pub default_formatter: Option<Formatter>,
    /// Receives every committed edit command (undo-stack seam).
    #[serde(skip)]
    pub edit_command_handler: Option<EditCommandHandler>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: 25.0,
            editable: false,
            auto_edit: false,
            enable_add_row: false,
            enable_cell_navigation: true,
            frozen_column: None,
            frozen_row: 0,
            frozen_bottom: false,
            frozen_right_viewport_min_width: 100.0,
            min_row_buffer: 3,
            force_fit_columns: false,
            viewport_fit: ViewportFitPolicy::None,
            enable_async_post_render: false,
            enable_async_post_render_cleanup: false,
            header_height: 25.0,
            show_header_row: false,
            header_row_height: 25.0,
            show_top_panel: false,
            top_panel_height: 25.0,
            show_pre_header_panel: false,
            pre_header_panel_height: 25.0,
            show_footer_row: false,
            footer_row_height: 21.0,
            panel_height_delta: 0.0,
            async_post_render_delay_ms: 50.0,
            async_post_render_cleanup_delay_ms: 40.0,
            render_throttle_ms: 50.0,
            max_supported_height: None,
            sanitizer: None,
            value_extractor: None,
            default_formatter: None,
            edit_command_handler: None,
        }
    }
}
