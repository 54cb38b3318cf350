//! The data source seam and per-row/per-cell metadata.
//!
//! The grid does not own data; it owns a view over anything exposing
//! `len`/`item_at`. Rows may be present-but-unloaded: an index below
//! `len` for which `item_at` returns `None` renders as a loading
//! placeholder and cannot be edited until it loads.

use std::collections::HashMap;

use serde_json::Value;

use crate::edit::EditorFactory;
use crate::render::formatter::Formatter;

/// Abstraction over the rows the grid renders.
pub trait DataSource {
    /// Number of rows, including unloaded ones.
    fn len(&self) -> usize;

    /// Whether the source has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, or `None` when the row is not loaded yet.
    fn item_at(&self, index: usize) -> Option<&Value>;

    /// Mutable access for edit commands.
    fn item_at_mut(&mut self, index: usize) -> Option<&mut Value>;

    /// Per-row overrides; `None` means plain defaults.
    fn metadata_for(&self, _index: usize) -> Option<RowMetadata> {
        None
    }

    /// Append an item (used by the synthetic add-row commit).
    fn push(&mut self, item: Value);
}

/// In-memory data source over a `Vec` of JSON objects.
#[derive(Debug, Default)]
pub struct VecDataSource {
    items: Vec<Value>,
}

impl VecDataSource {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Borrow the backing items.
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl DataSource for VecDataSource {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    fn item_at_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    fn push(&mut self, item: Value) {
        self.items.push(item);
    }
}

/// Data source with a fixed length and sparsely loaded items, for
/// hosts that page rows in from a remote store.
#[derive(Debug, Default)]
pub struct SparseDataSource {
    len: usize,
    loaded: HashMap<usize, Value>,
}

impl SparseDataSource {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            loaded: HashMap::new(),
        }
    }

    /// Mark a row as loaded.
    pub fn load(&mut self, index: usize, item: Value) {
        if index < self.len {
            self.loaded.insert(index, item);
        }
    }
}

impl DataSource for SparseDataSource {
    fn len(&self) -> usize {
        self.len
    }

    fn item_at(&self, index: usize) -> Option<&Value> {
        self.loaded.get(&index)
    }

    fn item_at_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.loaded.get_mut(&index)
    }

    fn push(&mut self, item: Value) {
        self.loaded.insert(self.len, item);
        self.len += 1;
    }
}

/// Number of column slots a cell occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colspan {
    /// A fixed span. `Span(1)` is a plain cell.
    Span(usize),
    /// The cell stretches to the end of the row (`"*"`).
    RemainderOfRow,
}

impl Colspan {
    /// Resolve against the column count and the cell's position.
    pub fn resolve(self, cell: usize, column_count: usize) -> usize {
        match self {
            Colspan::Span(n) => n.max(1),
            Colspan::RemainderOfRow => column_count.saturating_sub(cell).max(1),
        }
    }
}

/// Per-cell metadata overrides.
#[derive(Clone, Default)]
pub struct CellMetadata {
    pub colspan: Option<Colspan>,
    pub focusable: Option<bool>,
    pub selectable: Option<bool>,
    pub formatter: Option<Formatter>,
    pub editor: Option<EditorFactory>,
}

/// Per-row metadata overrides, keyed into by display column index.
#[derive(Clone, Default)]
pub struct RowMetadata {
    /// Overrides row-level focusability for every cell.
    pub focusable: Option<bool>,
    /// Overrides row-level selectability for every cell.
    pub selectable: Option<bool>,
    /// Extra classes applied to the row nodes.
    pub css_classes: Option<String>,
    /// Row-level formatter, between column formatter and the default.
    pub formatter: Option<Formatter>,
    /// Per-cell overrides by display column index.
    pub cells: HashMap<usize, CellMetadata>,
}

impl RowMetadata {
    /// Metadata for one cell, if any.
    pub fn cell(&self, cell: usize) -> Option<&CellMetadata> {
        self.cells.get(&cell)
    }

    /// Effective colspan for a cell, honoring `"*"`.
    pub fn colspan(&self, cell: usize, column_count: usize) -> usize {
        self.cell(cell)
            .and_then(|m| m.colspan)
            .map_or(1, |c| c.resolve(cell, column_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vec_source() {
        let mut src = VecDataSource::new(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(src.len(), 2);
        assert_eq!(src.item_at(1), Some(&json!({"a": 2})));
        assert_eq!(src.item_at(2), None);
        src.push(json!({"a": 3}));
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn test_sparse_source_unloaded_rows() {
        let mut src = SparseDataSource::new(10);
        assert_eq!(src.len(), 10);
        assert_eq!(src.item_at(3), None); // present but unloaded
        src.load(3, json!({"a": 1}));
        assert!(src.item_at(3).is_some());
        src.load(99, json!({"a": 1})); // out of range, ignored
        assert_eq!(src.item_at(99), None);
    }

    #[test]
    fn test_colspan_resolve() {
        assert_eq!(Colspan::Span(3).resolve(0, 5), 3);
        assert_eq!(Colspan::Span(0).resolve(0, 5), 1);
        assert_eq!(Colspan::RemainderOfRow.resolve(2, 5), 3);
        assert_eq!(Colspan::RemainderOfRow.resolve(4, 5), 1);
    }

    #[test]
    fn test_row_metadata_colspan_default() {
        let meta = RowMetadata::default();
        assert_eq!(meta.colspan(0, 4), 1);

        let mut meta = RowMetadata::default();
        meta.cells.insert(
            1,
            CellMetadata {
                colspan: Some(Colspan::RemainderOfRow),
                ..CellMetadata::default()
            },
        );
        assert_eq!(meta.colspan(1, 4), 3);
    }
}
