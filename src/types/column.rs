//! Column definitions and sort descriptors.

use serde::{Deserialize, Serialize};

use crate::edit::EditorFactory;
use crate::render::formatter::Formatter;
use crate::render::post_process::{PostRenderCleanupHook, PostRenderHook};

/// Default pixel width for a column.
pub const DEFAULT_COLUMN_WIDTH: f32 = 64.0;

/// Default minimum pixel width for a column.
pub const DEFAULT_MIN_COLUMN_WIDTH: f32 = 30.0;

/// Default maximum pixel width for a column.
pub const DEFAULT_MAX_COLUMN_WIDTH: f32 = 10_000.0;

/// A column definition.
///
/// Columns are ordered; order defines left-to-right pane placement and
/// is mutable via reorder. A column whose display index is at or below
/// the `frozen_column` option belongs to the frozen-left pane.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    /// Unique key. Duplicate ids are a configuration error.
    pub id: String,
    /// Display name shown in the header.
    pub name: String,
    /// Field looked up on the row item by the default value extractor.
    pub field: String,
    /// Current pixel width.
    pub width: f32,
    /// Lower bound for resize/autosize.
    pub min_width: f32,
    /// Upper bound for resize/autosize.
    pub max_width: f32,
    /// Whether drag-resize may change this column.
    pub resizable: bool,
    /// Whether header clicks may sort by this column.
    pub sortable: bool,
    /// Whether cells in this column can become the active cell.
    pub focusable: bool,
    /// Whether cells in this column participate in selection.
    pub selectable: bool,
    /// Render this column's cells even when outside the horizontal
    /// rendered range.
    pub always_render: bool,
    /// Editing this column on the synthetic add-row must not trigger
    /// an insert.
    pub cannot_trigger_insert: bool,
    /// Tooltip for the header.
    pub tool_tip: Option<String>,
    /// Extra class applied to the header node.
    pub header_css_class: Option<String>,
    /// Extra class applied to every cell node in this column.
    pub css_class: Option<String>,
    /// How autosize derives this column's guide width.
    pub autosize: AutosizePolicy,
    /// Per-column formatter; falls back to metadata then the default.
    #[serde(skip)]
    pub formatter: Option<Formatter>,
    /// Editor factory; a column without one is not editable.
    #[serde(skip)]
    pub editor: Option<EditorFactory>,
    /// Deferred per-cell customization run after the base render.
    #[serde(skip)]
    pub async_post_render: Option<PostRenderHook>,
    /// Cleanup counterpart to `async_post_render`, run on eviction.
    #[serde(skip)]
    pub async_post_render_cleanup: Option<PostRenderCleanupHook>,
}

impl Column {
    /// Create a column with the given id, display name, and data field.
    pub fn new(id: impl Into<String>, name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field: field.into(),
            ..Self::default()
        }
    }

    /// Builder-style width override.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Builder-style formatter override.
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Builder-style editor factory.
    pub fn with_editor(mut self, editor: EditorFactory) -> Self {
        self.editor = Some(editor);
        self
    }
}

impl Default for Column {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            field: String::new(),
            width: DEFAULT_COLUMN_WIDTH,
            min_width: DEFAULT_MIN_COLUMN_WIDTH,
            max_width: DEFAULT_MAX_COLUMN_WIDTH,
            resizable: true,
            sortable: false,
            focusable: true,
            selectable: true,
            always_render: false,
            cannot_trigger_insert: false,
            tool_tip: None,
            header_css_class: None,
            css_class: None,
            autosize: AutosizePolicy::default(),
            formatter: None,
            editor: None,
            async_post_render: None,
            async_post_render_cleanup: None,
        }
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("field", &self.field)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// How a column's autosize guide width is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum AutosizeMode {
    /// Keep the configured width; autosize passes the column by.
    #[default]
    Ignore,
    /// Guide width from the header text.
    HeaderText,
    /// Guide width from sampled cell content.
    Content,
    /// Guide width from an explicit list of representative values.
    ValueList(Vec<String>),
}

/// Per-column autosize policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosizePolicy {
    /// Width derivation mode.
    pub mode: AutosizeMode,
    /// Rows sampled in [`AutosizeMode::Content`]; 0 samples every row.
    pub sample_rows: usize,
    /// Pixels added on top of the measured guide width.
    pub padding_px: f32,
    /// Locked columns keep their guide width during proportional
    /// viewport filling.
    pub locked: bool,
}

impl Default for AutosizePolicy {
    fn default() -> Self {
        Self {
            mode: AutosizeMode::Ignore,
            sample_rows: 100,
            padding_px: 4.0,
            locked: false,
        }
    }
}

/// One entry of the multi-column sort state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortColumn {
    /// Id of the sorted column.
    pub column_id: String,
    /// Sort direction.
    pub ascending: bool,
}

impl SortColumn {
    pub fn new(column_id: impl Into<String>, ascending: bool) -> Self {
        Self {
            column_id: column_id.into(),
            ascending,
        }
    }
}
