//! Edit session tests: the lock protocol, commit/cancel, validation
//! refusals blocking navigation, add-row commits, and undoable
//! commands.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{people, person_columns};
use gridview::{
    CellCoord, Column, EditCommand, Editor, EditorLock, Grid, GridError, GridKey, GridOptions,
    NavDir, TextEditor, ValidationResult, VecDataSource,
};
use serde_json::{json, Value};

// ============================================================================
// Test editor with externally scriptable behavior
// ============================================================================

#[derive(Default)]
struct ScriptState {
    text: String,
    initial: String,
    valid: bool,
    destroyed: bool,
}

struct ScriptedEditor {
    field: String,
    state: Rc<RefCell<ScriptState>>,
}

impl Editor for ScriptedEditor {
    fn load_value(&mut self, item: &Value) {
        let mut s = self.state.borrow_mut();
        s.initial = item
            .get(self.field.as_str())
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .unwrap_or_default();
        s.text = s.initial.clone();
    }

    fn serialize_value(&self) -> Value {
        Value::String(self.state.borrow().text.clone())
    }

    fn apply_value(&self, item: &mut Value, state: &Value) {
        if let Some(object) = item.as_object_mut() {
            object.insert(self.field.clone(), state.clone());
        }
    }

    fn is_value_changed(&self) -> bool {
        let s = self.state.borrow();
        s.text != s.initial
    }

    fn validate(&self) -> ValidationResult {
        if self.state.borrow().valid {
            ValidationResult::ok()
        } else {
            ValidationResult::fail("scripted failure")
        }
    }

    fn destroy(&mut self) {
        self.state.borrow_mut().destroyed = true;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Columns whose `name` column uses a scripted editor.
fn scripted_columns(state: &Rc<RefCell<ScriptState>>) -> Vec<Column> {
    let mut columns = person_columns();
    let handle = Rc::clone(state);
    columns[1].editor = Some(Rc::new(move |ctx| {
        Box::new(ScriptedEditor {
            field: ctx.column.field.clone(),
            state: Rc::clone(&handle),
        })
    }));
    columns
}

fn editable_grid(columns: Vec<Column>, rows: usize) -> Grid {
    let options = GridOptions {
        editable: true,
        ..GridOptions::default()
    };
    Grid::new(
        columns,
        Box::new(VecDataSource::new(people(rows))),
        options,
        800.0,
        600.0,
    )
    .unwrap()
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn test_begin_edit_requires_editable_grid() {
    let mut grid = common::person_grid(5, 800.0, 600.0);
    grid.render();
    grid.set_active_cell(0, 0);
    assert!(matches!(
        grid.begin_edit(),
        Err(GridError::Precondition(_))
    ));
}

#[test]
fn test_begin_edit_requires_active_cell() {
    let state = Rc::new(RefCell::new(ScriptState::default()));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    grid.render();
    assert!(matches!(
        grid.begin_edit(),
        Err(GridError::Precondition(_))
    ));
}

#[test]
fn test_editor_lifecycle_and_lock() {
    let state = Rc::new(RefCell::new(ScriptState::default()));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    grid.render();
    grid.set_active_cell(0, 1);

    assert_eq!(grid.begin_edit().unwrap(), true);
    assert!(grid.is_editing());
    assert!(grid.editor_lock().is_active());
    assert_eq!(state.borrow().initial, "name0");

    // Cancel releases the lock and destroys the editor.
    assert!(grid.cancel_current_edit());
    assert!(!grid.is_editing());
    assert!(!grid.editor_lock().is_active());
    assert!(state.borrow().destroyed);
}

#[test]
fn test_column_without_editor_is_not_editable() {
    let state = Rc::new(RefCell::new(ScriptState::default()));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    grid.render();
    grid.set_active_cell(0, 0); // "id" column has no editor
    assert_eq!(grid.begin_edit().unwrap(), false);
    assert!(!grid.is_editing());
}

#[test]
fn test_commit_without_change_is_no_op_success() {
    let state = Rc::new(RefCell::new(ScriptState::default()));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    grid.render();
    assert!(grid.commit_current_edit()); // no editor live

    grid.set_active_cell(0, 1);
    grid.begin_edit().unwrap();
    assert!(grid.commit_current_edit()); // value unchanged
    assert!(!grid.is_editing());
}

#[test]
fn test_commit_applies_value_and_fires_cell_change() {
    let state = Rc::new(RefCell::new(ScriptState {
        valid: true,
        ..ScriptState::default()
    }));
    let changed = Rc::new(Cell::new(false));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    let sink = Rc::clone(&changed);
    grid.events.on_cell_change.observe(move |_| sink.set(true));
    grid.render();

    grid.set_active_cell(2, 1);
    grid.begin_edit().unwrap();
    state.borrow_mut().text = "edited".into();

    assert!(grid.commit_current_edit());
    assert!(!grid.is_editing());
    assert!(changed.get());
    assert_eq!(grid.data().item_at(2).unwrap()["name"], json!("edited"));
    // The cell re-rendered with the new value.
    let node = grid.get_cell_node(2, 1).unwrap();
    assert_eq!(grid.pool().get(node).unwrap().content, "edited");
}

// ============================================================================
// Validation refusal
// ============================================================================

#[test]
fn test_invalid_commit_blocks_navigation() {
    let state = Rc::new(RefCell::new(ScriptState::default())); // valid: false
    let errors = Rc::new(Cell::new(0usize));
    let mut grid = editable_grid(scripted_columns(&state), 5);
    let sink = Rc::clone(&errors);
    grid.events
        .on_validation_error
        .observe(move |_| sink.set(sink.get() + 1));
    grid.render();

    grid.set_active_cell(0, 1);
    grid.begin_edit().unwrap();
    state.borrow_mut().text = "bad".into();

    // The "next cell" key must not move the active cell.
    assert!(!grid.navigate(NavDir::Next));
    assert_eq!(grid.active_cell(), Some(CellCoord::new(0, 1)));
    assert!(grid.is_editing());
    assert_eq!(errors.get(), 1);

    // The cell carries the invalid marker.
    let node = grid.get_cell_node(0, 1).unwrap();
    assert!(grid.pool().has_class(node, "invalid"));

    // Fixing the value lets navigation proceed.
    state.borrow_mut().valid = true;
    assert!(grid.navigate(NavDir::Next));
    assert_eq!(grid.active_cell(), Some(CellCoord::new(0, 2)));
    assert!(!grid.pool().has_class(node, "invalid"));
}

// ============================================================================
// Lock exclusivity
// ============================================================================

#[test]
fn test_second_editor_blocked_while_lock_held() {
    let lock = EditorLock::new();
    let state_a = Rc::new(RefCell::new(ScriptState::default()));
    let state_b = Rc::new(RefCell::new(ScriptState::default()));

    let options = GridOptions {
        editable: true,
        ..GridOptions::default()
    };
    let mut grid_a = Grid::with_editor_lock(
        scripted_columns(&state_a),
        Box::new(VecDataSource::new(people(3))),
        options.clone(),
        800.0,
        600.0,
        lock.clone(),
    )
    .unwrap();
    let mut grid_b = Grid::with_editor_lock(
        scripted_columns(&state_b),
        Box::new(VecDataSource::new(people(3))),
        options,
        800.0,
        600.0,
        lock.clone(),
    )
    .unwrap();
    grid_a.render();
    grid_b.render();

    // B picks its cell first, then A acquires the shared lock.
    grid_b.set_active_cell(0, 1);
    grid_a.set_active_cell(0, 1);
    grid_a.begin_edit().unwrap();

    // Grid B cannot start an edit while A holds the shared lock.
    assert!(matches!(grid_b.begin_edit(), Err(GridError::LockHeld)));
    // A's editor is intact.
    assert!(grid_a.is_editing());
    assert!(!grid_b.is_editing());

    grid_a.cancel_current_edit();
    assert_eq!(grid_b.begin_edit().unwrap(), true);
}

// ============================================================================
// Add-row
// ============================================================================

#[test]
fn test_add_row_commit_appends_item() {
    let added = Rc::new(RefCell::new(None::<Value>));
    let mut columns = person_columns();
    columns[1].editor = Some(TextEditor::factory());
    let options = GridOptions {
        editable: true,
        enable_add_row: true,
        ..GridOptions::default()
    };
    let mut grid = Grid::new(
        columns,
        Box::new(VecDataSource::new(people(2))),
        options,
        800.0,
        600.0,
    )
    .unwrap();
    let sink = Rc::clone(&added);
    grid.events
        .on_add_new_row
        .observe(move |item| *sink.borrow_mut() = Some(item.clone()));
    grid.render();

    // The add-row activates straight into edit mode.
    assert!(grid.set_active_cell(2, 1));
    assert!(grid.is_editing());

    let editor = grid.active_editor_mut().unwrap();
    editor
        .as_any_mut()
        .downcast_mut::<TextEditor>()
        .unwrap()
        .set_text("newcomer");

    assert!(grid.commit_current_edit());
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.data().item_at(2).unwrap()["name"], json!("newcomer"));
    assert_eq!(added.borrow().as_ref().unwrap()["name"], json!("newcomer"));
}

#[test]
fn test_cannot_trigger_insert_flag() {
    let mut columns = person_columns();
    columns[1].editor = Some(TextEditor::factory());
    columns[1].cannot_trigger_insert = true;
    let options = GridOptions {
        editable: true,
        enable_add_row: true,
        ..GridOptions::default()
    };
    let mut grid = Grid::new(
        columns,
        Box::new(VecDataSource::new(people(2))),
        options,
        800.0,
        600.0,
    )
    .unwrap();
    grid.render();

    assert!(!grid.is_cell_potentially_editable(2, 1));
    grid.set_active_cell(2, 1);
    assert!(!grid.is_editing());
}

// ============================================================================
// Undoable commands
// ============================================================================

#[test]
fn test_edit_command_handler_and_undo() {
    let commands: Rc<RefCell<Vec<EditCommand>>> = Rc::new(RefCell::new(Vec::new()));
    let mut columns = person_columns();
    columns[1].editor = Some(TextEditor::factory());
    let sink = Rc::clone(&commands);
    let options = GridOptions {
        editable: true,
        edit_command_handler: Some(Rc::new(move |cmd: &EditCommand| {
            sink.borrow_mut().push(cmd.clone());
        })),
        ..GridOptions::default()
    };
    let mut grid = Grid::new(
        columns,
        Box::new(VecDataSource::new(people(3))),
        options,
        800.0,
        600.0,
    )
    .unwrap();
    grid.render();

    grid.set_active_cell(1, 1);
    grid.begin_edit().unwrap();
    grid.active_editor_mut()
        .unwrap()
        .as_any_mut()
        .downcast_mut::<TextEditor>()
        .unwrap()
        .set_text("rewritten");
    assert!(grid.commit_current_edit());

    let command = commands.borrow().last().cloned().unwrap();
    assert_eq!(command.row, 1);
    assert_eq!(command.column_id, "name");
    assert_eq!(command.serialized_value, json!("rewritten"));
    assert_eq!(command.prev_serialized_value, json!("name1"));

    // Host-side undo replays the captured command.
    grid.undo_edit_command(&command).unwrap();
    assert_eq!(grid.data().item_at(1).unwrap()["name"], json!("name1"));
    grid.apply_edit_command(&command).unwrap();
    assert_eq!(grid.data().item_at(1).unwrap()["name"], json!("rewritten"));
}

// ============================================================================
// Keyboard plumbing
// ============================================================================

#[test]
fn test_escape_cancels_edit() {
    let state = Rc::new(RefCell::new(ScriptState::default()));
    let mut grid = editable_grid(scripted_columns(&state), 3);
    grid.render();
    grid.set_active_cell(0, 1);
    grid.begin_edit().unwrap();
    state.borrow_mut().text = "discard me".into();

    assert!(grid.handle_key(GridKey::Escape));
    assert!(!grid.is_editing());
    // Value was not applied.
    assert_eq!(grid.data().item_at(0).unwrap()["name"], json!("name0"));
}

#[test]
fn test_enter_begins_and_commits_edit() {
    let state = Rc::new(RefCell::new(ScriptState {
        valid: true,
        ..ScriptState::default()
    }));
    let mut grid = editable_grid(scripted_columns(&state), 3);
    grid.render();
    grid.set_active_cell(0, 1);

    assert!(grid.handle_key(GridKey::Enter));
    assert!(grid.is_editing());

    state.borrow_mut().text = "via enter".into();
    assert!(grid.handle_key(GridKey::Enter));
    assert!(!grid.is_editing());
    assert_eq!(grid.data().item_at(0).unwrap()["name"], json!("via enter"));
}
