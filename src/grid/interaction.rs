//! Grid-level column interaction: resize drags, reorder, autosize.

use log::{debug, warn};

use crate::columns::{
    apply_move, apply_resize_delta, guide_width, reconcile_widths, validate_move, ColumnGroup,
    FitOutcome, TextMeasurer, ABSOLUTE_COLUMN_MIN_WIDTH,
};
use crate::error::{GridError, Result};
use crate::events::{ColumnsReorderedArgs, ColumnsResizedArgs};
use crate::render::formatter::display_value;

use super::Grid;

/// Start-of-drag snapshot for a column resize.
///
/// Every drag move is applied against the snapshot (not the current
/// widths), so repeated `apply_column_resize` calls with a growing
/// delta behave like a live pointer drag.
#[derive(Debug, Clone)]
pub struct ResizeDrag {
    pub(crate) cell: usize,
    pub(crate) start_widths: Vec<f32>,
}

impl Grid {
    // ---- Resize --------------------------------------------------------

    /// Begin a resize drag on the handle after `cell`.
    pub fn begin_column_resize(&mut self, cell: usize) -> Result<ResizeDrag> {
        if cell >= self.columns.len() {
            return Err(GridError::Precondition(format!(
                "resize on column {cell} out of range"
            )));
        }
        if !self.columns[cell].resizable {
            return Err(GridError::Precondition(format!(
                "column {:?} is not resizable",
                self.columns[cell].id
            )));
        }
        if !self.ensure_edit_committed() {
            return Err(GridError::LockHeld);
        }
        Ok(ResizeDrag {
            cell,
            start_widths: self.columns.iter().map(|c| c.width).collect(),
        })
    }

    /// Apply a pointer delta against the drag snapshot.
    pub fn apply_column_resize(&mut self, drag: &ResizeDrag, delta: f32) {
        let mut delta = delta;

        // The frozen-left pane may never grow into the minimum width
        // guaranteed to the scrolling right pane.
        if let Some(frozen) = self.options.frozen_column {
            if drag.cell <= frozen {
                let start_left: f32 = drag.start_widths.iter().take(frozen + 1).sum();
                let max_left =
                    self.layout.viewport_width - self.options.frozen_right_viewport_min_width;
                delta = delta.min(max_left - start_left);
            }
        }

        let new_widths = apply_resize_delta(
            &self.columns,
            &drag.start_widths,
            drag.cell,
            delta,
            self.options.force_fit_columns,
            ABSOLUTE_COLUMN_MIN_WIDTH,
        );
        let changed: Vec<String> = self
            .columns
            .iter()
            .zip(new_widths.iter())
            .filter(|(c, &w)| (c.width - w).abs() > 0.5)
            .map(|(c, _)| c.id.clone())
            .collect();
        for (col, width) in self.columns.iter_mut().zip(new_widths) {
            col.width = width;
        }
        self.relayout();
        self.apply_header_widths();
        self.invalidate_all_rows();
        self.render();
        if !changed.is_empty() {
            debug!("columns resized: {changed:?}");
            let args = ColumnsResizedArgs {
                column_ids: changed,
            };
            self.events.on_columns_resized.notify(&args);
        }
    }

    /// One-shot resize: a whole drag in a single call.
    pub fn resize_column(&mut self, cell: usize, delta: f32) -> Result<()> {
        let drag = self.begin_column_resize(cell)?;
        self.apply_column_resize(&drag, delta);
        Ok(())
    }

    // ---- Reorder -------------------------------------------------------

    /// Configure grouped (nested) headers for reorder validation.
    pub fn set_column_groups(&mut self, groups: Vec<ColumnGroup>) {
        self.column_groups = groups;
    }

    /// Configured header groups.
    pub fn column_groups(&self) -> &[ColumnGroup] {
        &self.column_groups
    }

    /// Move a column to a new display position.
    ///
    /// With header groups configured the move must keep every group
    /// contiguous; a violating move is rejected and layout reverts to
    /// the pre-drag state.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        validate_move(&self.column_groups, &self.columns, from, to).map_err(|err| {
            warn!("column move {from} -> {to} rejected: {err}");
            err
        })?;
        if !self.ensure_edit_committed() {
            return Err(GridError::LockHeld);
        }
        apply_move(&mut self.columns, from, to);
        self.relayout();
        self.render_header();
        self.invalidate_all_rows();
        self.render();
        let args = ColumnsReorderedArgs {
            order: self.columns.iter().map(|c| c.id.clone()).collect(),
        };
        self.events.on_columns_reordered.notify(&args);
        Ok(())
    }

    // ---- Autosize ------------------------------------------------------

    /// Size every column from its autosize policy, then reconcile the
    /// result against the viewport per the container policy.
    pub fn autosize_columns(&mut self, measurer: &dyn TextMeasurer) -> FitOutcome {
        let guides: Vec<f32> = self
            .columns
            .iter()
            .enumerate()
            .map(|(cell, col)| {
                let samples = self.content_sample(cell, col.autosize.sample_rows);
                guide_width(col, &samples, measurer)
            })
            .collect();

        let mut widths = guides;
        let outcome = reconcile_widths(
            &mut widths,
            &self.columns,
            self.options.viewport_fit,
            self.layout.viewport_width,
        );

        let changed: Vec<String> = self
            .columns
            .iter()
            .zip(widths.iter())
            .filter(|(c, &w)| (c.width - w).abs() > 0.5)
            .map(|(c, _)| c.id.clone())
            .collect();
        for (col, width) in self.columns.iter_mut().zip(widths) {
            col.width = width;
        }
        self.relayout();
        self.apply_header_widths();
        self.invalidate_all_rows();
        self.render();
        if !changed.is_empty() {
            let args = ColumnsResizedArgs {
                column_ids: changed,
            };
            self.events.on_columns_resized.notify(&args);
        }
        outcome
    }

    /// Sampled display strings for a column's autosize measurement.
    fn content_sample(&self, cell: usize, sample_rows: usize) -> Vec<String> {
        let len = self.data.len();
        let limit = if sample_rows == 0 {
            len
        } else {
            len.min(sample_rows)
        };
        let column = &self.columns[cell];
        (0..limit)
            .filter_map(|row| {
                let item = self.data.item_at(row)?;
                let value = self.extract_value(item, column)?;
                Some(display_value(&value))
            })
            .collect()
    }
}
