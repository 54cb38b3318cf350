//! Column reorder with header-group validation.
//!
//! When grouped (nested) headers are configured, a column must stay
//! within its group's contiguous index range; a move that would leave
//! it is rejected with [`GridError::CrossGroupMove`] and the layout is
//! left untouched. Presentation of the failure is the host's concern.

use crate::error::{GridError, Result};
use crate::types::Column;

/// A contiguous header group over a set of column ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    /// Display name of the group.
    pub name: String,
    /// Ids of the member columns.
    pub column_ids: Vec<String>,
}

impl ColumnGroup {
    pub fn new(name: impl Into<String>, column_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            column_ids,
        }
    }

    fn contains(&self, column_id: &str) -> bool {
        self.column_ids.iter().any(|id| id == column_id)
    }

    /// Current index span `(first, last)` of the group's members.
    pub fn span(&self, columns: &[Column]) -> Option<(usize, usize)> {
        let mut first = None;
        let mut last = None;
        for (i, col) in columns.iter().enumerate() {
            if self.contains(&col.id) {
                first.get_or_insert(i);
                last = Some(i);
            }
        }
        Some((first?, last?))
    }
}

/// Validate that moving the column at `from` to `to` keeps every
/// group's membership contiguous.
///
/// The move is simulated on the column order and each group checked
/// afterwards, so both "grouped column leaves its group" and
/// "ungrouped column splits a group" are caught.
pub fn validate_move(
    groups: &[ColumnGroup],
    columns: &[Column],
    from: usize,
    to: usize,
) -> Result<()> {
    if from >= columns.len() || to >= columns.len() {
        return Err(GridError::Precondition(format!(
            "move {from} -> {to} out of bounds for {} columns",
            columns.len()
        )));
    }
    let mut order: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
    let moved = order.remove(from);
    order.insert(to, moved);

    for group in groups {
        let positions: Vec<usize> = order
            .iter()
            .enumerate()
            .filter(|(_, id)| group.contains(id))
            .map(|(i, _)| i)
            .collect();
        if let (Some(&first), Some(&last)) = (positions.first(), positions.last()) {
            if last - first + 1 != positions.len() {
                return Err(GridError::CrossGroupMove {
                    column_id: moved.to_string(),
                    group: group.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Move the column at `from` to position `to`.
pub fn apply_move(columns: &mut Vec<Column>, from: usize, to: usize) {
    if from >= columns.len() || to >= columns.len() || from == to {
        return;
    }
    let col = columns.remove(from);
    columns.insert(to, col);
}
