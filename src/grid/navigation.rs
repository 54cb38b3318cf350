//! Active-cell state machine and directional navigation.
//!
//! States: no active cell, active/normal, active/editing. Navigation
//! computes the next candidate honoring colspans and per-cell
//! focusability, scrolls it into view, and reports whether the active
//! cell actually changed — a `false` return means the state machine
//! re-asserted the current cell (callers must not assume navigation
//! always moves). `next`/`prev` wrap at the grid's ends instead of
//! sticking, so keyboard traversal has no dead-ends on the last row.

use crate::edit::GridKey;
use crate::events::{ActiveCellChangedArgs, ClickArgs};
use crate::types::CellCoord;

use super::Grid;

/// Navigation directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDir {
    Up,
    Down,
    Left,
    Right,
    /// Right, spilling onto the next row; wraps at the end.
    Next,
    /// Left, spilling onto the previous row; wraps at the start.
    Prev,
    RowStart,
    RowEnd,
    PageUp,
    PageDown,
}

impl Grid {
    /// The active cell, if any.
    pub fn active_cell(&self) -> Option<CellCoord> {
        self.active
    }

    /// Clear the active cell.
    pub fn reset_active_cell(&mut self) {
        self.set_active_cell_internal(None, false);
    }

    /// Activate a cell. Returns whether activation happened.
    ///
    /// Fails when the target cannot be active or when a live edit
    /// refuses to commit. With `auto_edit` (or on the synthetic
    /// add-row) the cell continues into edit mode.
    pub fn set_active_cell(&mut self, row: usize, cell: usize) -> bool {
        if self.is_destroyed() || !self.can_cell_be_active(row, cell) {
            return false;
        }
        if !self.ensure_edit_committed() {
            return false;
        }
        self.scroll_cell_into_view(row, cell);
        let edit_mode =
            self.options.editable && (self.options.auto_edit || row == self.data.len());
        self.set_active_cell_internal(Some(CellCoord::new(row, cell)), edit_mode);
        true
    }

    pub(crate) fn set_active_cell_internal(&mut self, new: Option<CellCoord>, edit_mode: bool) {
        if self.editor.is_some() {
            self.make_active_cell_normal();
        }
        let old = self.active;

        if let Some(old_coord) = old {
            if let Some(node) = self.get_cell_node(old_coord.row, old_coord.cell) {
                self.pool.remove_class(node, "active");
            }
            let nodes: Vec<_> = self
                .row_cache
                .get(&old_coord.row)
                .map(|e| e.row_nodes().collect())
                .unwrap_or_default();
            for node in nodes {
                self.pool.remove_class(node, "active");
            }
        }

        self.active = new;

        if let Some(coord) = new {
            if let Some(node) = self.get_cell_node(coord.row, coord.cell) {
                self.pool.add_class(node, "active");
            }
            let nodes: Vec<_> = self
                .row_cache
                .get(&coord.row)
                .map(|e| e.row_nodes().collect())
                .unwrap_or_default();
            for node in nodes {
                self.pool.add_class(node, "active");
            }
        }

        if old != new {
            let args = ActiveCellChangedArgs { active: new };
            self.events.on_active_cell_changed.notify(&args);
        }

        if edit_mode && new.is_some() {
            let _ = self.begin_edit();
        }
    }

    // ---- Focusability --------------------------------------------------

    /// Whether (row, cell) may become the active cell.
    ///
    /// In bounds (including the add-row allowance), and focusable per
    /// cell metadata, row metadata, then the column flag.
    pub fn can_cell_be_active(&self, row: usize, cell: usize) -> bool {
        if !self.options.enable_cell_navigation {
            return false;
        }
        if row >= self.data_length_including_add_row() || cell >= self.columns.len() {
            return false;
        }
        if let Some(meta) = self.row_metadata(row) {
            if let Some(focusable) = meta.cell(cell).and_then(|c| c.focusable) {
                return focusable;
            }
            if let Some(focusable) = meta.focusable {
                return focusable;
            }
        }
        self.columns[cell].focusable
    }

    /// Whether (row, cell) participates in selection.
    pub fn can_cell_be_selected(&self, row: usize, cell: usize) -> bool {
        if row >= self.data.len() || cell >= self.columns.len() {
            return false;
        }
        if let Some(meta) = self.row_metadata(row) {
            if let Some(selectable) = meta.cell(cell).and_then(|c| c.selectable) {
                return selectable;
            }
            if let Some(selectable) = meta.selectable {
                return selectable;
            }
        }
        self.columns[cell].selectable
    }

    // ---- Click ---------------------------------------------------------

    /// A click on a cell: notifies subscribers (cancelable), feeds the
    /// selection model, and activates the cell. Returns whether the
    /// active cell changed.
    pub fn click_cell(&mut self, row: usize, cell: usize) -> bool {
        if self.is_destroyed()
            || row >= self.data_length_including_add_row()
            || cell >= self.columns.len()
        {
            return false;
        }
        let args = ClickArgs { row, cell };
        if self.events.on_click.notify(&args).stopped() {
            return false;
        }
        if self.can_cell_be_selected(row, cell) {
            if let Some(model) = self.selection_model.as_mut() {
                model.handle_cell_click(row, cell);
                self.reconcile_selection();
            }
        }
        if !self.can_cell_be_active(row, cell) {
            return false;
        }
        let before = self.active;
        self.set_active_cell(row, cell);
        before != self.active
    }

    // ---- Directional navigation ----------------------------------------

    /// Navigate from the active cell. Returns whether the active cell
    /// changed; on failure the current cell is re-asserted.
    pub fn navigate(&mut self, dir: NavDir) -> bool {
        if !self.options.enable_cell_navigation || self.is_destroyed() {
            return false;
        }
        if let NavDir::PageUp | NavDir::PageDown = dir {
            if !self.ensure_edit_committed() {
                return false;
            }
            let before = self.active;
            self.scroll_page(if dir == NavDir::PageUp { -1 } else { 1 });
            return before != self.active;
        }

        let Some(active) = self.active.or_else(|| match dir {
            NavDir::Next => self.scan_first_focusable(),
            NavDir::Prev => self.scan_last_focusable(),
            _ => None,
        }) else {
            return false;
        };
        if !self.ensure_edit_committed() {
            return false;
        }

        let target = if self.active.is_none() {
            // Entering the grid via next/prev.
            Some(active)
        } else {
            match dir {
                NavDir::Up => self.goto_up(active.row, active.cell),
                NavDir::Down => self.goto_down(active.row, active.cell),
                NavDir::Left => self.goto_left(active.row, active.cell),
                NavDir::Right => self.goto_right(active.row, active.cell),
                NavDir::Next => self.goto_next(active.row, active.cell),
                NavDir::Prev => self.goto_prev(active.row, active.cell),
                NavDir::RowStart => self
                    .first_focusable_cell(active.row)
                    .map(|c| CellCoord::new(active.row, c)),
                NavDir::RowEnd => self
                    .last_focusable_cell(active.row)
                    .map(|c| CellCoord::new(active.row, c)),
                NavDir::PageUp | NavDir::PageDown => None,
            }
        };

        match target {
            Some(coord) => {
                self.scroll_cell_into_view(coord.row, coord.cell);
                let changed = Some(coord) != self.active;
                let edit_mode = self.options.editable && self.options.auto_edit;
                self.set_active_cell_internal(Some(coord), edit_mode);
                changed
            }
            None => {
                // No candidate: re-assert the current active cell.
                let current = self.active;
                self.set_active_cell_internal(current, false);
                false
            }
        }
    }

    /// Keyboard entry point. Returns whether the key was handled.
    pub fn handle_key(&mut self, key: GridKey) -> bool {
        if self.is_destroyed() {
            return false;
        }
        // Keys the live editor claims are not ours to handle.
        if let Some(editor) = &self.editor {
            if editor.key_capture_list().contains(&key) {
                return false;
            }
        }
        match key {
            GridKey::Up => self.navigate(NavDir::Up),
            GridKey::Down => self.navigate(NavDir::Down),
            GridKey::Left => self.navigate(NavDir::Left),
            GridKey::Right => self.navigate(NavDir::Right),
            GridKey::Tab => self.navigate(NavDir::Next),
            GridKey::ShiftTab => self.navigate(NavDir::Prev),
            GridKey::Home => self.navigate(NavDir::RowStart),
            GridKey::End => self.navigate(NavDir::RowEnd),
            GridKey::PageUp => self.navigate(NavDir::PageUp),
            GridKey::PageDown => self.navigate(NavDir::PageDown),
            GridKey::Enter => {
                if !self.options.editable {
                    return false;
                }
                if self.editor.is_some() {
                    self.commit_edit_and_refocus()
                } else {
                    matches!(self.begin_edit(), Ok(true))
                }
            }
            GridKey::Escape => {
                if self.editor.is_some() {
                    let _ = self.cancel_current_edit();
                    true
                } else {
                    false
                }
            }
        }
    }

    // ---- Candidate computation -----------------------------------------

    /// First focusable cell of a row, honoring colspans.
    pub(crate) fn first_focusable_cell(&self, row: usize) -> Option<usize> {
        let cols = self.columns.len();
        let mut cell = 0;
        while cell < cols {
            if self.can_cell_be_active(row, cell) {
                return Some(cell);
            }
            cell += self.colspan(row, cell).max(1);
        }
        None
    }

    /// Last focusable cell of a row.
    pub(crate) fn last_focusable_cell(&self, row: usize) -> Option<usize> {
        let cols = self.columns.len();
        let mut cell = 0;
        let mut last = None;
        while cell < cols {
            if self.can_cell_be_active(row, cell) {
                last = Some(cell);
            }
            cell += self.colspan(row, cell).max(1);
        }
        last
    }

    /// The cell whose span covers column slot `posx` in `row`.
    fn cell_covering(&self, row: usize, posx: usize) -> usize {
        let cols = self.columns.len();
        let mut cell = 0;
        while cell < cols {
            let span = self.colspan(row, cell).max(1);
            if posx < cell + span {
                return cell;
            }
            cell += span;
        }
        cols.saturating_sub(1)
    }

    fn goto_right(&self, row: usize, cell: usize) -> Option<CellCoord> {
        let cols = self.columns.len();
        let mut c = cell + self.colspan(row, cell).max(1);
        while c < cols {
            if self.can_cell_be_active(row, c) {
                return Some(CellCoord::new(row, c));
            }
            c += self.colspan(row, c).max(1);
        }
        None
    }

    fn goto_left(&self, row: usize, cell: usize) -> Option<CellCoord> {
        let first = self.first_focusable_cell(row)?;
        if first >= cell {
            return None;
        }
        let mut prev = None;
        let mut c = first;
        while c < cell {
            if self.can_cell_be_active(row, c) {
                prev = Some(c);
            }
            c += self.colspan(row, c).max(1);
        }
        prev.map(|c| CellCoord::new(row, c))
    }

    fn goto_down(&self, row: usize, posx: usize) -> Option<CellCoord> {
        let len = self.data_length_including_add_row();
        let mut r = row + 1;
        while r < len {
            let c = self.cell_covering(r, posx);
            if self.can_cell_be_active(r, c) {
                return Some(CellCoord::new(r, c));
            }
            r += 1;
        }
        None
    }

    fn goto_up(&self, row: usize, posx: usize) -> Option<CellCoord> {
        let mut r = row;
        while r > 0 {
            r -= 1;
            let c = self.cell_covering(r, posx);
            if self.can_cell_be_active(r, c) {
                return Some(CellCoord::new(r, c));
            }
        }
        None
    }

    fn goto_next(&self, row: usize, cell: usize) -> Option<CellCoord> {
        if let Some(coord) = self.goto_right(row, cell) {
            return Some(coord);
        }
        let len = self.data_length_including_add_row();
        for r in (row + 1)..len {
            if let Some(c) = self.first_focusable_cell(r) {
                return Some(CellCoord::new(r, c));
            }
        }
        // Wrap to the first focusable cell of the grid.
        for r in 0..=row.min(len.saturating_sub(1)) {
            if let Some(c) = self.first_focusable_cell(r) {
                return Some(CellCoord::new(r, c));
            }
        }
        None
    }

    fn goto_prev(&self, row: usize, cell: usize) -> Option<CellCoord> {
        if let Some(coord) = self.goto_left(row, cell) {
            return Some(coord);
        }
        for r in (0..row).rev() {
            if let Some(c) = self.last_focusable_cell(r) {
                return Some(CellCoord::new(r, c));
            }
        }
        // Wrap to the last focusable cell of the grid.
        let len = self.data_length_including_add_row();
        for r in (row..len).rev() {
            if let Some(c) = self.last_focusable_cell(r) {
                return Some(CellCoord::new(r, c));
            }
        }
        None
    }

    fn scan_first_focusable(&self) -> Option<CellCoord> {
        let len = self.data_length_including_add_row();
        (0..len).find_map(|r| {
            self.first_focusable_cell(r)
                .map(|c| CellCoord::new(r, c))
        })
    }

    fn scan_last_focusable(&self) -> Option<CellCoord> {
        let len = self.data_length_including_add_row();
        (0..len).rev().find_map(|r| {
            self.last_focusable_cell(r)
                .map(|c| CellCoord::new(r, c))
        })
    }
}
