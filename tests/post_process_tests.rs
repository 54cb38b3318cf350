//! Async post-processing tests: deferred per-cell hooks, one row per
//! idle tick, re-invalidation, and generation-batched cleanup.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{people, person_columns};
use gridview::dom::{NodeId, NodePool};
use gridview::{Column, Grid, GridOptions, VecDataSource};
use serde_json::Value;

struct Hooked {
    grid: Grid,
    runs: Rc<RefCell<Vec<(usize, bool)>>>,
    cleanups: Rc<RefCell<usize>>,
}

/// Grid whose `name` column carries post-render and cleanup hooks.
fn hooked_grid(rows: usize, cleanup: bool) -> Hooked {
    let runs: Rc<RefCell<Vec<(usize, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let cleanups = Rc::new(RefCell::new(0usize));

    let mut columns = person_columns();
    let run_sink = Rc::clone(&runs);
    columns[1].async_post_render = Some(Rc::new(
        move |pool: &mut NodePool,
              node: NodeId,
              row: usize,
              _item: Option<&Value>,
              _column: &Column,
              re_render: bool| {
            pool.add_class(node, "post");
            run_sink.borrow_mut().push((row, re_render));
        },
    ));
    let cleanup_sink = Rc::clone(&cleanups);
    columns[1].async_post_render_cleanup = Some(Rc::new(move |_pool: &mut NodePool, _node: NodeId| {
        *cleanup_sink.borrow_mut() += 1;
    }));

    let options = GridOptions {
        enable_async_post_render: true,
        enable_async_post_render_cleanup: cleanup,
        async_post_render_delay_ms: 50.0,
        async_post_render_cleanup_delay_ms: 40.0,
        ..GridOptions::default()
    };
    let grid = Grid::new(
        columns,
        Box::new(VecDataSource::new(people(rows))),
        options,
        800.0,
        150.0,
    )
    .unwrap();
    Hooked {
        grid,
        runs,
        cleanups,
    }
}

/// Pump ticks until the post-render queue drains.
fn drain(grid: &mut Grid, mut now: f64) -> f64 {
    for _ in 0..200 {
        now += 50.0;
        grid.tick(now);
    }
    now
}

// ============================================================================
// Post-render pass
// ============================================================================

#[test]
fn test_hooks_run_after_render_not_during() {
    let mut h = hooked_grid(4, false);
    h.grid.tick(0.0);
    h.grid.render();
    // Nothing ran synchronously.
    assert!(h.runs.borrow().is_empty());

    // One row per tick.
    h.grid.tick(50.0);
    assert_eq!(h.runs.borrow().len(), 1);
    h.grid.tick(100.0);
    assert_eq!(h.runs.borrow().len(), 2);

    drain(&mut h.grid, 100.0);
    // Viewport is 125px tall: 4 rows all visible, all processed once.
    assert_eq!(h.runs.borrow().len(), 4);
    assert!(h.runs.borrow().iter().all(|&(_, re)| !re));

    // The hook's node mutation landed.
    let node = h.grid.get_cell_node(0, 1).unwrap();
    assert!(h.grid.pool().has_class(node, "post"));
}

#[test]
fn test_rendered_cells_not_reprocessed() {
    let mut h = hooked_grid(4, false);
    h.grid.tick(0.0);
    h.grid.render();
    drain(&mut h.grid, 0.0);
    let count = h.runs.borrow().len();

    // Another render re-schedules the pass, but every cell is already
    // marked as processed.
    h.grid.render();
    drain(&mut h.grid, 20_000.0);
    assert_eq!(h.runs.borrow().len(), count);
}

#[test]
fn test_update_cell_marks_for_rerun() {
    let mut h = hooked_grid(4, false);
    h.grid.tick(0.0);
    h.grid.render();
    drain(&mut h.grid, 0.0);
    h.runs.borrow_mut().clear();

    h.grid.update_cell(2, 1);
    drain(&mut h.grid, 30_000.0);

    let runs = h.runs.borrow();
    assert_eq!(runs.len(), 1);
    // Re-run is flagged as such.
    assert_eq!(runs[0], (2, true));
}

// ============================================================================
// Deferred cleanup
// ============================================================================

#[test]
fn test_eviction_batches_cleanup_by_generation() {
    let mut h = hooked_grid(1_000, true);
    h.grid.tick(0.0);
    h.grid.render();
    drain(&mut h.grid, 0.0);
    assert_eq!(*h.cleanups.borrow(), 0);

    let old_row_node = h.grid.row_cache_entry(0).unwrap().row_node;

    // Jump far away: post-processed rows evict with deferred cleanup.
    // Their nodes detach immediately but stay alive until the cleanup
    // tick removes them.
    let now = 20_000.0;
    h.grid.tick(now);
    h.grid.scroll_to(500.0 * 25.0);

    assert!(h.grid.row_cache_entry(0).is_none());
    let node = h.grid.pool().get(old_row_node).expect("queued, not freed");
    assert_eq!(node.parent(), None);
    assert_eq!(*h.cleanups.borrow(), 0);
    let pool_after_evict = h.grid.pool().len();

    // Generations drain one batch per tick until the queue is empty.
    let mut t = now;
    for _ in 0..100 {
        t += 40.0;
        h.grid.tick(t);
    }
    // Each evicted post-processed row had one hooked cell.
    assert!(*h.cleanups.borrow() > 0);
    // The queued nodes are gone from the pool.
    assert!(h.grid.pool().get(old_row_node).is_none());
    assert!(h.grid.pool().len() < pool_after_evict);
}

#[test]
fn test_destroy_cancels_pending_work() {
    let mut h = hooked_grid(10, true);
    h.grid.tick(0.0);
    h.grid.render();
    // Work is pending but never ticked.
    h.grid.destroy();
    h.grid.tick(10_000.0);
    assert!(h.runs.borrow().is_empty());
    assert_eq!(*h.cleanups.borrow(), 0);
}
