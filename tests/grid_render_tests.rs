//! Render pass tests: the row/cell cache, virtualization bounds,
//! idempotence, and formatter plumbing.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::rc::Rc;

use common::{people, person_columns, person_grid, person_grid_with};
use gridview::render::formatter::FormatterResult;
use gridview::{Grid, GridOptions, SparseDataSource, VecDataSource};
use serde_json::json;

// ============================================================================
// Basic render scenario
// ============================================================================

#[test]
fn test_basic_render_caches_all_rows_and_cells() {
    // 3 columns, 5 rows, viewport tall enough for everything.
    let mut grid = person_grid(5, 800.0, 600.0);
    grid.render();

    assert_eq!(grid.cached_row_count(), 5);
    for row in 0..5 {
        let entry = grid.row_cache_entry(row).expect("cached row");
        assert_eq!(entry.cell_nodes.len(), 3);
        assert!(entry.pending_cells.is_empty());
    }
}

#[test]
fn test_cell_content_comes_from_fields() {
    let mut grid = person_grid(3, 800.0, 600.0);
    grid.render();

    let node = grid.get_cell_node(1, 1).expect("cell node");
    assert_eq!(grid.pool().get(node).unwrap().content, "name1");
}

#[test]
fn test_rows_attach_to_main_canvas() {
    let mut grid = person_grid(5, 800.0, 600.0);
    grid.render();

    let (canvas_l, _) = grid.main_canvases();
    assert_eq!(grid.pool().child_count(canvas_l), 5);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_render_twice_is_a_no_op() {
    let mut grid = person_grid(50, 800.0, 500.0);
    grid.render();

    let cached = grid.cached_row_count();
    let stats = grid.pool().stats();
    grid.render();

    assert_eq!(grid.cached_row_count(), cached);
    assert_eq!(grid.pool().stats(), stats); // zero create/attach/detach
}

// ============================================================================
// Virtualization bound
// ============================================================================

#[test]
fn test_dom_bound_independent_of_data_length() {
    let viewport_h = 500.0;
    let row_height = 25.0;
    let visible = (viewport_h / row_height) as usize; // 20
    let buffer = visible; // travel-direction buffer
    let bound = visible + 2 * buffer + 4; // slack for partial rows

    for &n in &[10usize, 1_000_000] {
        let mut grid = person_grid(n, 800.0, viewport_h + 25.0);
        grid.render();
        assert!(grid.cached_row_count() <= bound.min(n.max(1)));

        // Scroll somewhere in the middle and check again.
        grid.scroll_to((n as f64 / 2.0) * 25.0);
        assert!(
            grid.cached_row_count() <= bound,
            "N={n}: {} cached rows exceeds bound {bound}",
            grid.cached_row_count()
        );
    }
}

#[test]
fn test_eviction_removes_nodes_and_bookkeeping() {
    let mut grid = person_grid(10_000, 800.0, 525.0);
    grid.render();
    let early_row_count = grid.cached_row_count();

    grid.scroll_to(5_000.0 * 25.0);
    // Rows near the top must be gone from cache and pool.
    assert!(grid.row_cache_entry(0).is_none());
    assert!(grid.get_cell_node(0, 0).is_none());
    // The pool is not accumulating: row nodes stay bounded.
    assert!(grid.cached_row_count() <= early_row_count + 30);
}

// ============================================================================
// Placeholders, colspans, metadata
// ============================================================================

#[test]
fn test_unloaded_rows_render_loading_placeholder() {
    let mut source = SparseDataSource::new(5);
    source.load(0, json!({"id": 0, "name": "loaded", "age": 1}));
    let mut grid = Grid::new(
        person_columns(),
        Box::new(source),
        GridOptions::default(),
        800.0,
        600.0,
    )
    .unwrap();
    grid.render();

    let loaded = grid.row_cache_entry(0).unwrap();
    assert!(!grid.pool().has_class(loaded.row_node, "loading"));

    let unloaded = grid.row_cache_entry(3).unwrap();
    assert!(grid.pool().has_class(unloaded.row_node, "loading"));
    // Cells exist but render empty.
    let node = grid.get_cell_node(3, 1).unwrap();
    assert_eq!(grid.pool().get(node).unwrap().content, "");
}

#[test]
fn test_update_cell_reruns_formatter() {
    let mut grid = person_grid(3, 800.0, 600.0);
    grid.render();

    if let Some(item) = grid.data_mut().item_at_mut(1) {
        item["name"] = json!("changed");
    }
    let node = grid.get_cell_node(1, 1).unwrap();
    assert_eq!(grid.pool().get(node).unwrap().content, "name1"); // stale
    grid.update_cell(1, 1);
    assert_eq!(grid.pool().get(node).unwrap().content, "changed");
}

#[test]
fn test_custom_formatter_and_classes() {
    let mut columns = person_columns();
    columns[2].formatter = Some(Rc::new(|ctx| {
        let age = ctx.value.and_then(|v| v.as_i64()).unwrap_or(0);
        FormatterResult::Rich(gridview::render::formatter::RichFormat {
            text: format!("{age} yrs"),
            add_classes: if age >= 40 { vec!["senior".into()] } else { vec![] },
            remove_classes: vec![],
            tool_tip: Some("age".into()),
        })
    }));
    let mut grid = Grid::new(
        columns,
        Box::new(VecDataSource::new(people(30))),
        GridOptions::default(),
        800.0,
        900.0,
    )
    .unwrap();
    grid.render();

    // Row 25 -> age 45.
    let node = grid.get_cell_node(25, 2).unwrap();
    let n = grid.pool().get(node).unwrap();
    assert_eq!(n.content, "45 yrs");
    assert_eq!(n.tool_tip.as_deref(), Some("age"));
    assert!(grid.pool().has_class(node, "senior"));

    // Row 0 -> age 20, no class.
    let node = grid.get_cell_node(0, 2).unwrap();
    assert!(!grid.pool().has_class(node, "senior"));
}

#[test]
fn test_sanitizer_applies_to_formatter_output() {
    let mut options = GridOptions::default();
    options.sanitizer = Some(Rc::new(|dirty: &str| dirty.replace("name", "clean")));
    let mut grid = person_grid_with(2, 800.0, 600.0, options);
    grid.render();

    let node = grid.get_cell_node(0, 1).unwrap();
    assert_eq!(grid.pool().get(node).unwrap().content, "clean0");
}

#[test]
fn test_default_formatter_escapes_html() {
    let data = vec![json!({"id": 0, "name": "<b>x</b>", "age": 1})];
    let mut grid = Grid::new(
        person_columns(),
        Box::new(VecDataSource::new(data)),
        GridOptions::default(),
        800.0,
        600.0,
    )
    .unwrap();
    grid.render();

    let node = grid.get_cell_node(0, 1).unwrap();
    assert_eq!(grid.pool().get(node).unwrap().content, "&lt;b&gt;x&lt;/b&gt;");
}

#[test]
fn test_round_trip_value_extraction() {
    let grid = person_grid(3, 800.0, 600.0);
    // Identity formatting: the extracted value survives a
    // format-then-read cycle.
    let value = grid.value_for_column(2, "name").unwrap();
    assert_eq!(value, json!("name2"));
    assert_eq!(
        gridview::render::formatter::display_value(&value),
        "name2"
    );
}

// ============================================================================
// Invalidation and destroy
// ============================================================================

#[test]
fn test_invalidate_row_rebuilds_on_next_render() {
    let mut grid = person_grid(5, 800.0, 600.0);
    grid.render();

    grid.invalidate_row(2);
    assert!(grid.row_cache_entry(2).is_none());
    grid.render();
    assert!(grid.row_cache_entry(2).is_some());
    assert_eq!(grid.cached_row_count(), 5);
}

#[test]
fn test_update_row_count_drops_rows_beyond_end() {
    let mut grid = person_grid(5, 800.0, 600.0);
    grid.render();
    assert!(grid.set_active_cell(4, 0));

    // Shrink the data source externally.
    grid.set_data(Box::new(VecDataSource::new(people(2))), false);
    assert!(grid.row_cache_entry(4).is_none());
    // Active cell beyond the new end is cleared.
    assert_eq!(grid.active_cell(), None);
}

#[test]
fn test_destroy_detaches_everything() {
    let mut grid = person_grid(20, 800.0, 500.0);
    grid.render();
    assert!(grid.pool().len() > 0);

    grid.destroy();
    assert!(grid.is_destroyed());
    assert_eq!(grid.pool().len(), 0);
    // Further renders are no-ops.
    grid.render();
    assert_eq!(grid.cached_row_count(), 0);
}
