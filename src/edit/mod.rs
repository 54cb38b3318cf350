//! Editor capability interfaces and the shared edit lock.
//!
//! Editors are external collaborators: the grid constructs one through
//! a column's [`EditorFactory`] when a cell enters edit mode, drives it
//! through the [`Editor`] trait, and destroys it on commit, cancel, or
//! navigation away. The [`EditorLock`] is the single shared-mutation
//! gate: at most one editor may be live across every grid sharing the
//! lock.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::{GridError, Result};
use crate::types::{CellRect, Column};

/// Keys an editor may capture instead of letting grid navigation
/// handle them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKey {
    Up,
    Down,
    Left,
    Right,
    Tab,
    ShiftTab,
    Enter,
    Escape,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Result of editor validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    /// A passing validation.
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A failing validation with a user-facing message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Construction context handed to an editor factory.
pub struct EditorContext {
    /// Row being edited.
    pub row: usize,
    /// Display column index being edited.
    pub cell: usize,
    /// The column definition.
    pub column: Column,
    /// The item at the row; `None` for the synthetic add-row.
    pub item: Option<Value>,
    /// Pixel rectangle of the cell, for viewport-aware editors.
    pub position: CellRect,
}

/// A live cell editor.
pub trait Editor {
    /// Load the current value from the data item.
    fn load_value(&mut self, item: &Value);

    /// Snapshot the editor's value for commit/undo.
    fn serialize_value(&self) -> Value;

    /// Write a serialized value back onto a data item.
    fn apply_value(&self, item: &mut Value, state: &Value);

    /// Whether the value differs from what was loaded.
    fn is_value_changed(&self) -> bool;

    /// Validate the current value.
    fn validate(&self) -> ValidationResult;

    /// Teardown. Called exactly once, before the lock is released.
    fn destroy(&mut self) {}

    /// Viewport-aware hooks; default no-ops.
    fn show(&mut self) {}
    fn hide(&mut self) {}
    fn position(&mut self, _rect: &CellRect) {}

    /// Keys the editor wants to intercept rather than let navigation
    /// handle.
    fn key_capture_list(&self) -> Vec<GridKey> {
        Vec::new()
    }

    /// Downcast access for hosts driving a concrete editor.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Constructs an editor for a cell.
pub type EditorFactory = Rc<dyn Fn(&EditorContext) -> Box<dyn Editor>>;

/// An undoable cell edit produced by a successful commit.
///
/// The grid applies the command itself and then hands it to the
/// configured [`EditCommandHandler`], so a host undo stack can replay
/// it through `Grid::apply_edit_command` / `Grid::undo_edit_command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCommand {
    pub row: usize,
    pub cell: usize,
    pub column_id: String,
    pub serialized_value: Value,
    pub prev_serialized_value: Value,
}

/// Receives every committed edit command.
pub type EditCommandHandler = Rc<dyn Fn(&EditCommand)>;

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique edit controller id.
pub(crate) fn next_controller_id() -> u64 {
    NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Mutual-exclusion gate for edit sessions.
///
/// Cloning shares the lock; hand one clone to several grids to make
/// editing exclusive across all of them.
#[derive(Clone, Default)]
pub struct EditorLock {
    holder: Rc<RefCell<Option<u64>>>,
}

impl EditorLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any controller currently holds the lock.
    pub fn is_active(&self) -> bool {
        self.holder.borrow().is_some()
    }

    /// Whether the given controller holds the lock.
    pub fn is_held_by(&self, controller: u64) -> bool {
        *self.holder.borrow() == Some(controller)
    }

    /// Acquire the lock. Re-activation by the holder is a no-op;
    /// activation while another controller holds it fails.
    pub fn activate(&self, controller: u64) -> Result<()> {
        let mut holder = self.holder.borrow_mut();
        match *holder {
            Some(current) if current != controller => Err(GridError::LockHeld),
            _ => {
                *holder = Some(controller);
                Ok(())
            }
        }
    }

    /// Release the lock. Fails if the caller does not hold it.
    pub fn deactivate(&self, controller: u64) -> Result<()> {
        let mut holder = self.holder.borrow_mut();
        if *holder == Some(controller) {
            *holder = None;
            Ok(())
        } else {
            Err(GridError::LockHeld)
        }
    }
}

/// Reference editor: a plain text box over the column's field.
///
/// Loads `item[field]`, serializes to a JSON string, and writes it
/// back on apply. Empty input validates unless `required` is set.
#[derive(Debug, Default)]
pub struct TextEditor {
    field: String,
    initial: String,
    text: String,
    required: bool,
}

impl TextEditor {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Factory for wiring into a [`Column`].
    pub fn factory() -> EditorFactory {
        Rc::new(|ctx| Box::new(TextEditor::for_field(ctx.column.field.clone())))
    }

    /// Factory for a required-value editor.
    pub fn required_factory() -> EditorFactory {
        Rc::new(|ctx| {
            let mut editor = TextEditor::for_field(ctx.column.field.clone());
            editor.required = true;
            Box::new(editor)
        })
    }

    /// Replace the edited text (the host's keystroke channel).
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Current edited text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Editor for TextEditor {
    fn load_value(&mut self, item: &Value) {
        self.initial = match item.get(self.field.as_str()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        self.text = self.initial.clone();
    }

    fn serialize_value(&self) -> Value {
        Value::String(self.text.clone())
    }

    fn apply_value(&self, item: &mut Value, state: &Value) {
        if let Some(object) = item.as_object_mut() {
            object.insert(self.field.clone(), state.clone());
        }
    }

    fn is_value_changed(&self) -> bool {
        self.text != self.initial
    }

    fn validate(&self) -> ValidationResult {
        if self.required && self.text.is_empty() {
            ValidationResult::fail("a value is required")
        } else {
            ValidationResult::ok()
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
