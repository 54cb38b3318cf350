//! The edit session controller.
//!
//! At most one editor is live at a time; the shared [`EditorLock`] is
//! held for exactly the editor's lifetime. Commit builds an undoable
//! [`EditCommand`], applies it, and hands it to the host's command
//! handler; a refused commit (validation failure) marks the cell
//! invalid, notifies, and returns `false` — the caller must abort
//! whatever triggered the commit.

use log::warn;
use serde_json::Value;

use crate::edit::{EditCommand, Editor, EditorContext};
use crate::error::{GridError, Result};
use crate::events::{BeforeEditCellArgs, CellChangeArgs, ValidationErrorArgs};
use crate::types::CellRect;

use super::Grid;

impl Grid {
    /// Whether an editor is live.
    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub(crate) fn is_editing_at(&self, row: usize, cell: usize) -> bool {
        self.editor.is_some()
            && self
                .active
                .is_some_and(|a| a.row == row && a.cell == cell)
    }

    pub(crate) fn is_editing_at_row(&self, row: usize) -> bool {
        self.editor.is_some() && self.active.is_some_and(|a| a.row == row)
    }

    /// Mutable access to the live editor, for hosts driving input.
    pub fn active_editor_mut(&mut self) -> Option<&mut (dyn Editor + 'static)> {
        self.editor.as_deref_mut()
    }

    /// Whether the cell could enter edit mode: row data loaded, an
    /// editor resolvable, and (on the add-row) insert-triggering
    /// allowed for the column.
    pub fn is_cell_potentially_editable(&self, row: usize, cell: usize) -> bool {
        if cell >= self.columns.len() || row >= self.data_length_including_add_row() {
            return false;
        }
        // Present-but-unloaded rows cannot be edited.
        if row < self.data.len() && self.data.item_at(row).is_none() {
            return false;
        }
        if row == self.data.len() && self.columns[cell].cannot_trigger_insert {
            return false;
        }
        self.editor_factory_exists(row, cell)
    }

    fn editor_factory_exists(&self, row: usize, cell: usize) -> bool {
        self.row_metadata(row)
            .and_then(|m| m.cell(cell).and_then(|c| c.editor.clone()))
            .is_some()
            || self.columns[cell].editor.is_some()
    }

    fn make_editor(&self, row: usize, cell: usize) -> Option<Box<dyn Editor>> {
        let factory = self
            .row_metadata(row)
            .and_then(|m| m.cell(cell).and_then(|c| c.editor.clone()))
            .or_else(|| self.columns[cell].editor.clone())?;
        let ctx = EditorContext {
            row,
            cell,
            column: self.columns[cell].clone(),
            item: self.data.item_at(row).cloned(),
            position: self.cell_rect(row, cell),
        };
        Some(factory(&ctx))
    }

    fn cell_rect(&self, row: usize, cell: usize) -> CellRect {
        let last = cell.min(self.columns.len().saturating_sub(1));
        CellRect {
            top: self.row_top(row),
            left: self.layout.col_left[last],
            width: self.layout.col_right[last] - self.layout.col_left[last],
            height: self.options.row_height,
        }
    }

    /// Put the active cell into edit mode.
    ///
    /// Returns `Ok(true)` with a live editor, `Ok(false)` when a
    /// before-edit subscriber vetoed or the cell is not potentially
    /// editable. Errors: editing disabled or no active cell
    /// (precondition violations), or the edit lock is held elsewhere.
    pub fn begin_edit(&mut self) -> Result<bool> {
        if !self.options.editable {
            return Err(GridError::Precondition(
                "begin_edit called on a non-editable grid".into(),
            ));
        }
        let active = self.active.ok_or_else(|| {
            GridError::Precondition("begin_edit called with no active cell".into())
        })?;
        if self.editor.is_some() {
            return Ok(true);
        }
        if !self.is_cell_potentially_editable(active.row, active.cell) {
            return Ok(false);
        }

        let args = BeforeEditCellArgs {
            row: active.row,
            cell: active.cell,
            column_id: self.columns[active.cell].id.clone(),
        };
        if self.events.on_before_edit_cell.notify(&args).stopped() {
            return Ok(false);
        }

        self.lock.activate(self.controller_id)?;

        let Some(mut editor) = self.make_editor(active.row, active.cell) else {
            let _ = self.lock.deactivate(self.controller_id);
            return Ok(false);
        };
        if let Some(item) = self.data.item_at(active.row) {
            editor.load_value(item);
        }
        self.edit_snapshot = Some(editor.serialize_value());
        self.editor = Some(editor);

        if let Some(node) = self.get_cell_node(active.row, active.cell) {
            self.pool.add_class(node, "editing");
        }
        Ok(true)
    }

    /// Leave edit mode: destroy the editor, re-render the cell via its
    /// formatter, release the lock.
    pub fn make_active_cell_normal(&mut self) {
        let Some(mut editor) = self.editor.take() else {
            return;
        };
        if let Some(active) = self.active {
            self.events.on_before_cell_editor_destroy.notify(&active);
        }
        editor.destroy();
        self.edit_snapshot = None;
        let _ = self.lock.deactivate(self.controller_id);

        if let Some(active) = self.active {
            if let Some(node) = self.get_cell_node(active.row, active.cell) {
                self.pool.remove_class(node, "editing");
                self.pool.remove_class(node, "invalid");
            }
            if active.row < self.data.len() {
                self.update_cell(active.row, active.cell);
            }
        }
    }

    /// Commit the live edit.
    ///
    /// No-op success when no editor is live. On a changed, valid value
    /// the edit command is applied (or the add-row item created) and
    /// handed to the configured command handler. On validation failure
    /// the cell is marked invalid, a notification fires, focus returns
    /// to the editor, and `false` is returned — the caller must not
    /// proceed.
    pub fn commit_current_edit(&mut self) -> bool {
        let Some(active) = self.active else {
            return true;
        };
        let Some(editor) = self.editor.as_mut() else {
            return true;
        };
        if !editor.is_value_changed() {
            self.make_active_cell_normal();
            return true;
        }

        let validation = editor.validate();
        if !validation.valid {
            let message = validation.message.unwrap_or_else(|| "invalid value".into());
            warn!("edit validation failed at ({}, {}): {message}", active.row, active.cell);
            if let Some(node) = self.get_cell_node(active.row, active.cell) {
                self.pool.add_class(node, "invalid");
            }
            let args = ValidationErrorArgs {
                row: active.row,
                cell: active.cell,
                column_id: self.columns[active.cell].id.clone(),
                message,
            };
            self.events.on_validation_error.notify(&args);
            if let Some(editor) = self.editor.as_mut() {
                editor.show();
            }
            return false;
        }

        let serialized = editor.serialize_value();
        let prev = self.edit_snapshot.clone().unwrap_or(Value::Null);

        if active.row == self.data.len() {
            // Synthetic add-row: build a fresh item and append it.
            let mut item = Value::Object(serde_json::Map::new());
            editor.apply_value(&mut item, &serialized);
            self.make_active_cell_normal();
            self.data.push(item.clone());
            self.events.on_add_new_row.notify(&item);
            self.update_row_count();
            self.render();
            return true;
        }

        let command = EditCommand {
            row: active.row,
            cell: active.cell,
            column_id: self.columns[active.cell].id.clone(),
            serialized_value: serialized,
            prev_serialized_value: prev,
        };
        self.make_active_cell_normal();
        if let Err(err) = self.apply_edit_command(&command) {
            warn!("edit command failed: {err}");
            return false;
        }
        if let Some(handler) = self.options.edit_command_handler.clone() {
            handler(&command);
        }
        true
    }

    /// Always succeeds: destroy the editor without applying.
    pub fn cancel_current_edit(&mut self) -> bool {
        self.make_active_cell_normal();
        true
    }

    /// Commit; on refusal keep focus in the editor. Returns handled.
    pub(crate) fn commit_edit_and_refocus(&mut self) -> bool {
        if !self.commit_current_edit() {
            if let Some(editor) = self.editor.as_mut() {
                editor.show();
            }
        }
        true
    }

    /// Apply a (possibly replayed) edit command to the data item and
    /// re-render the row.
    pub fn apply_edit_command(&mut self, command: &EditCommand) -> Result<()> {
        self.write_command_value(command, &command.serialized_value)
    }

    /// Revert a previously applied edit command.
    pub fn undo_edit_command(&mut self, command: &EditCommand) -> Result<()> {
        self.write_command_value(command, &command.prev_serialized_value)
    }

    fn write_command_value(&mut self, command: &EditCommand, value: &Value) -> Result<()> {
        let cell = self.column_index(&command.column_id).ok_or_else(|| {
            GridError::Precondition(format!("unknown column {:?}", command.column_id))
        })?;
        let editor = self.make_editor(command.row, cell).ok_or_else(|| {
            GridError::Precondition(format!(
                "no editor resolvable for column {:?}",
                command.column_id
            ))
        })?;
        {
            let item = self
                .data
                .item_at_mut(command.row)
                .ok_or_else(|| GridError::Precondition(format!("row {} not loaded", command.row)))?;
            editor.apply_value(item, value);
        }
        self.update_row(command.row);
        let args = CellChangeArgs {
            row: command.row,
            cell,
            column_id: command.column_id.clone(),
        };
        self.events.on_cell_change.notify(&args);
        Ok(())
    }

    /// Gate shared by every destructive operation: commit or cancel
    /// any live edit through the lock; abort cleanly on refusal.
    pub(crate) fn ensure_edit_committed(&mut self) -> bool {
        if self.editor.is_some() {
            return self.commit_current_edit();
        }
        // Another controller mid-edit on a shared lock blocks us.
        if self.lock.is_active() && !self.lock.is_held_by(self.controller_id) {
            return false;
        }
        true
    }
}
