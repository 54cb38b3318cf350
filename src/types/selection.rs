//! The pluggable selection model seam.
//!
//! The grid renders selection highlighting but delegates range
//! semantics to an installed model. The model is owned by the grid;
//! after any call into it the grid reads `selected_ranges()` back and
//! reconciles its selected-row set (pull-based, no callback cycle).

use crate::types::CellRange;

/// Capability interface for selection models.
pub trait SelectionModel {
    /// Replace the model's ranges. The grid calls this from
    /// `set_selected_rows`; hosts call it for programmatic selection.
    fn set_selected_ranges(&mut self, ranges: &[CellRange]);

    /// Current ranges, read back by the grid after each call in.
    fn selected_ranges(&self) -> Vec<CellRange>;

    /// Extend or replace selection in response to a cell click.
    /// Default: single-cell range replacement.
    fn handle_cell_click(&mut self, row: usize, cell: usize) {
        self.set_selected_ranges(&[CellRange::single(row, cell)]);
    }

    /// Teardown hook, called from grid destroy.
    fn destroy(&mut self) {}
}

/// Row-oriented selection: every range spans all columns of its rows.
#[derive(Debug, Default)]
pub struct RowSelectionModel {
    ranges: Vec<CellRange>,
    column_count: usize,
}

impl RowSelectionModel {
    pub fn new(column_count: usize) -> Self {
        Self {
            ranges: Vec::new(),
            column_count,
        }
    }

    fn full_row(&self, from_row: usize, to_row: usize) -> CellRange {
        CellRange::new(from_row, 0, to_row, self.column_count.saturating_sub(1))
    }
}

impl SelectionModel for RowSelectionModel {
    fn set_selected_ranges(&mut self, ranges: &[CellRange]) {
        // Widen whatever comes in to full rows.
        self.ranges = ranges
            .iter()
            .map(|r| {
                let (top, _, bottom, _) = r.bounds();
                self.full_row(top, bottom)
            })
            .collect();
    }

    fn selected_ranges(&self) -> Vec<CellRange> {
        self.ranges.clone()
    }

    fn handle_cell_click(&mut self, row: usize, _cell: usize) {
        self.ranges = vec![self.full_row(row, row)];
    }
}
