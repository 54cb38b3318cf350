//! Typed notification buses with cancelable default behavior.
//!
//! Each grid lifecycle event has its own bus. Dispatch is synchronous
//! and fire-and-forget; a handler that returns
//! [`Handled::StopDefault`] short-circuits the remaining handlers and
//! tells the grid to suppress the built-in behavior the event guards
//! (e.g. click-to-activate).

use crate::types::{CellCoord, SortColumn};

/// Outcome of dispatching an event to a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Run the built-in default behavior.
    Continue,
    /// Suppress the built-in default behavior.
    StopDefault,
}

impl Handled {
    /// Whether default behavior should be suppressed.
    pub fn stopped(self) -> bool {
        self == Handled::StopDefault
    }
}

/// A single-event subscription list.
pub struct EventBus<P> {
    handlers: Vec<Box<dyn FnMut(&P) -> Handled>>,
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler. Handlers run in subscription order.
    pub fn subscribe(&mut self, handler: impl FnMut(&P) -> Handled + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Subscribe a handler that never cancels the default.
    pub fn observe(&mut self, mut handler: impl FnMut(&P) + 'static) {
        self.handlers.push(Box::new(move |p| {
            handler(p);
            Handled::Continue
        }));
    }

    /// Dispatch to all handlers; stops at the first `StopDefault`.
    pub fn notify(&mut self, payload: &P) -> Handled {
        for handler in &mut self.handlers {
            if handler(payload).stopped() {
                return Handled::StopDefault;
            }
        }
        Handled::Continue
    }

    /// Drop all handlers.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Number of subscribed handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are subscribed.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Scroll position after a scroll step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollArgs {
    pub scroll_top: f32,
    pub scroll_left: f32,
}

/// Rendered row span after a render pass completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedArgs {
    pub top: usize,
    pub bottom: usize,
}

/// Active cell transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveCellChangedArgs {
    pub active: Option<CellCoord>,
}

/// Fired before a cell enters edit mode; cancelable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforeEditCellArgs {
    pub row: usize,
    pub cell: usize,
    pub column_id: String,
}

/// A committed cell edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChangeArgs {
    pub row: usize,
    pub cell: usize,
    pub column_id: String,
}

/// Editor validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrorArgs {
    pub row: usize,
    pub cell: usize,
    pub column_id: String,
    pub message: String,
}

/// Columns whose widths changed in a resize/autosize pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnsResizedArgs {
    pub column_ids: Vec<String>,
}

/// Column order changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnsReorderedArgs {
    pub order: Vec<String>,
}

/// Sort state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortArgs {
    pub sort_columns: Vec<SortColumn>,
}

/// Selected row set changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRowsChangedArgs {
    pub rows: Vec<usize>,
}

/// Cell click; cancelable (suppresses click-to-activate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickArgs {
    pub row: usize,
    pub cell: usize,
}

/// Visible range or viewport geometry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportChangedArgs {
    pub top: usize,
    pub bottom: usize,
}

/// All grid event buses.
#[derive(Default)]
pub struct GridEvents {
    /// Fired before teardown begins.
    pub on_before_destroy: EventBus<()>,
    /// Fired after each completed render pass.
    pub on_rendered: EventBus<RenderedArgs>,
    /// Fired when the visible range changes.
    pub on_viewport_changed: EventBus<ViewportChangedArgs>,
    /// Fired on every scroll step.
    pub on_scroll: EventBus<ScrollArgs>,
    /// Fired after the active cell changes (including to `None`).
    pub on_active_cell_changed: EventBus<ActiveCellChangedArgs>,
    /// Cancelable: veto edit-mode entry.
    pub on_before_edit_cell: EventBus<BeforeEditCellArgs>,
    /// Fired after a successful commit mutates the data item.
    pub on_cell_change: EventBus<CellChangeArgs>,
    /// Fired when a commit is refused by validation.
    pub on_validation_error: EventBus<ValidationErrorArgs>,
    /// Fired before the live editor is destroyed.
    pub on_before_cell_editor_destroy: EventBus<CellCoord>,
    /// Fired after widths change.
    pub on_columns_resized: EventBus<ColumnsResizedArgs>,
    /// Fired after a successful reorder.
    pub on_columns_reordered: EventBus<ColumnsReorderedArgs>,
    /// Fired when sort state changes.
    pub on_sort: EventBus<SortArgs>,
    /// Fired when the derived selected-row set changes.
    pub on_selected_rows_changed: EventBus<SelectedRowsChangedArgs>,
    /// Cancelable: veto click-to-activate.
    pub on_click: EventBus<ClickArgs>,
    /// Fired when an add-row commit produced a new item.
    pub on_add_new_row: EventBus<serde_json::Value>,
}

impl GridEvents {
    /// Drop every subscription (destroy path).
    pub fn clear(&mut self) {
        self.on_before_destroy.clear();
        self.on_rendered.clear();
        self.on_viewport_changed.clear();
        self.on_scroll.clear();
        self.on_active_cell_changed.clear();
        self.on_before_edit_cell.clear();
        self.on_cell_change.clear();
        self.on_validation_error.clear();
        self.on_before_cell_editor_destroy.clear();
        self.on_columns_resized.clear();
        self.on_columns_reordered.clear();
        self.on_sort.clear();
        self.on_selected_rows_changed.clear();
        self.on_click.clear();
        self.on_add_new_row.clear();
    }
}
