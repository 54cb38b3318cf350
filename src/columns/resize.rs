//! Drag-resize width math.
//!
//! A drag on the handle after column `active` distributes the pointer
//! delta across resizable columns at or left of the handle, bounded by
//! each column's min/max width ("leeway"). With force-fit, the
//! complementary delta is absorbed by resizable columns to the right
//! so total width is conserved.

use crate::types::Column;

/// Smallest width any column may reach regardless of configuration.
pub const ABSOLUTE_COLUMN_MIN_WIDTH: f32 = 20.0;

fn actual_min(col: &Column, absolute_min: f32) -> f32 {
    col.min_width.max(absolute_min)
}

/// Allowed `(min_delta, max_delta)` for a drag starting at `active`.
///
/// Without force-fit only the dragged side's leeway bounds the drag;
/// with force-fit the opposite side must be able to absorb the
/// complement.
pub fn drag_bounds(
    columns: &[Column],
    start_widths: &[f32],
    active: usize,
    force_fit: bool,
    absolute_min: f32,
) -> (f32, f32) {
    let mut shrink_left = 0.0f32;
    let mut stretch_left = 0.0f32;
    for (col, &w) in columns.iter().zip(start_widths).take(active + 1) {
        if !col.resizable {
            continue;
        }
        shrink_left += (w - actual_min(col, absolute_min)).max(0.0);
        stretch_left += (col.max_width - w).max(0.0);
    }

    let mut shrink_right = 0.0f32;
    let mut stretch_right = 0.0f32;
    for (col, &w) in columns.iter().zip(start_widths).skip(active + 1) {
        if !col.resizable {
            continue;
        }
        shrink_right += (w - actual_min(col, absolute_min)).max(0.0);
        stretch_right += (col.max_width - w).max(0.0);
    }

    if force_fit {
        (-shrink_left.min(stretch_right), stretch_left.min(shrink_right))
    } else {
        (-shrink_left, stretch_left)
    }
}

/// Apply a clamped pointer delta to the start-of-drag widths.
///
/// Returns the new width of every column. With `force_fit` the sum of
/// widths is conserved up to per-column clamping.
pub fn apply_resize_delta(
    columns: &[Column],
    start_widths: &[f32],
    active: usize,
    delta: f32,
    force_fit: bool,
    absolute_min: f32,
) -> Vec<f32> {
    let (min_d, max_d) = drag_bounds(columns, start_widths, active, force_fit, absolute_min);
    let d = delta.clamp(min_d, max_d);
    let mut widths = start_widths.to_vec();

    if d < 0.0 {
        // Shrink columns at/left of the handle, right-to-left.
        let mut x = d;
        for j in (0..=active.min(columns.len().saturating_sub(1))).rev() {
            let col = &columns[j];
            if !col.resizable {
                continue;
            }
            let min_w = actual_min(col, absolute_min);
            if x != 0.0 && start_widths[j] + x < min_w {
                x += start_widths[j] - min_w;
                widths[j] = min_w;
            } else {
                widths[j] = start_widths[j] + x;
                x = 0.0;
            }
        }
        if force_fit {
            // Grow columns right of the handle by the complement.
            let mut x = -d;
            for j in (active + 1)..columns.len() {
                let col = &columns[j];
                if !col.resizable {
                    continue;
                }
                if x != 0.0 && col.max_width - start_widths[j] < x {
                    x -= col.max_width - start_widths[j];
                    widths[j] = col.max_width;
                } else {
                    widths[j] = start_widths[j] + x;
                    x = 0.0;
                }
            }
        }
    } else if d > 0.0 {
        // Stretch columns at/left of the handle, right-to-left.
        let mut x = d;
        for j in (0..=active.min(columns.len().saturating_sub(1))).rev() {
            let col = &columns[j];
            if !col.resizable {
                continue;
            }
            if x != 0.0 && col.max_width - start_widths[j] < x {
                x -= col.max_width - start_widths[j];
                widths[j] = col.max_width;
            } else {
                widths[j] = start_widths[j] + x;
                x = 0.0;
            }
        }
        if force_fit {
            // Shrink columns right of the handle by the complement.
            let mut x = -d;
            for j in (active + 1)..columns.len() {
                let col = &columns[j];
                if !col.resizable {
                    continue;
                }
                let min_w = actual_min(col, absolute_min);
                if x != 0.0 && start_widths[j] + x < min_w {
                    x += start_widths[j] - min_w;
                    widths[j] = min_w;
                } else {
                    widths[j] = start_widths[j] + x;
                    x = 0.0;
                }
            }
        }
    }
    widths
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn columns(n: usize) -> Vec<Column> {
        (0..n)
            .map(|i| {
                let mut c = Column::new(format!("c{i}"), format!("C{i}"), format!("f{i}"));
                c.min_width = 30.0;
                c.max_width = 200.0;
                c
            })
            .collect()
    }

    #[test]
    fn test_grow_without_force_fit() {
        let cols = columns(3);
        let start = [100.0, 100.0, 100.0];
        let w = apply_resize_delta(&cols, &start, 1, 40.0, false, ABSOLUTE_COLUMN_MIN_WIDTH);
        assert_eq!(w, vec![100.0, 140.0, 100.0]);
    }

    #[test]
    fn test_shrink_cascades_left() {
        let cols = columns(3);
        let start = [100.0, 40.0, 100.0];
        // Shrinking 80 at column 1: column 1 gives 10 (to its 30 min),
        // column 0 gives the remaining 70.
        let w = apply_resize_delta(&cols, &start, 1, -80.0, false, ABSOLUTE_COLUMN_MIN_WIDTH);
        assert_eq!(w, vec![30.0, 30.0, 100.0]);
    }

    #[test_case(40.0; "grow")]
    #[test_case(-40.0; "shrink")]
    fn test_force_fit_conserves_total(delta: f32) {
        let cols = columns(4);
        let start = [100.0, 100.0, 100.0, 100.0];
        let w = apply_resize_delta(&cols, &start, 1, delta, true, ABSOLUTE_COLUMN_MIN_WIDTH);
        let total: f32 = w.iter().sum();
        assert!((total - 400.0).abs() < 1.0);
    }

    #[test]
    fn test_force_fit_respects_right_min_widths() {
        let cols = columns(3);
        let start = [100.0, 100.0, 35.0];
        // Right side can only absorb 5px before hitting min width 30.
        let w = apply_resize_delta(&cols, &start, 1, 50.0, true, ABSOLUTE_COLUMN_MIN_WIDTH);
        assert_eq!(w[2], 30.0);
        let total: f32 = w.iter().sum();
        assert!((total - 235.0).abs() < 1.0);
    }

    #[test]
    fn test_non_resizable_columns_skipped() {
        let mut cols = columns(3);
        cols[0].resizable = false;
        let start = [100.0, 40.0, 100.0];
        let w = apply_resize_delta(&cols, &start, 1, -50.0, false, ABSOLUTE_COLUMN_MIN_WIDTH);
        // Column 0 untouched; drag clamped to column 1's leeway.
        assert_eq!(w[0], 100.0);
        assert_eq!(w[1], 30.0);
    }

    #[test]
    fn test_drag_bounds_force_fit() {
        let cols = columns(2);
        let start = [100.0, 100.0];
        let (min_d, max_d) = drag_bounds(&cols, &start, 0, true, ABSOLUTE_COLUMN_MIN_WIDTH);
        // Can shrink col0 by 70, bounded by col1's stretch room (100).
        assert_eq!(min_d, -70.0);
        // Can grow col0 by 100, bounded by col1's shrink room (70).
        assert_eq!(max_d, 70.0);
    }
}
