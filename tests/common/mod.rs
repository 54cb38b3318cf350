//! Shared helpers for the integration suites.

#![allow(dead_code)]

use gridview::{Column, Grid, GridOptions, VecDataSource};
use serde_json::{json, Value};

/// Generate `n` person rows: `{id, name, age}`.
pub fn people(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("name{i}"),
                "age": 20 + (i % 50),
            })
        })
        .collect()
}

/// The standard three-column layout used across suites.
pub fn person_columns() -> Vec<Column> {
    vec![
        Column::new("id", "Id", "id").with_width(50.0),
        Column::new("name", "Name", "name").with_width(120.0),
        Column::new("age", "Age", "age").with_width(60.0),
    ]
}

/// Grid over `rows` person rows with default options.
pub fn person_grid(rows: usize, container_w: f32, container_h: f32) -> Grid {
    person_grid_with(rows, container_w, container_h, GridOptions::default())
}

/// Grid over `rows` person rows with explicit options.
pub fn person_grid_with(
    rows: usize,
    container_w: f32,
    container_h: f32,
    options: GridOptions,
) -> Grid {
    Grid::new(
        person_columns(),
        Box::new(VecDataSource::new(people(rows))),
        options,
        container_w,
        container_h,
    )
    .expect("grid construction")
}
