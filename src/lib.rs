//! gridview - headless virtualized data grid core
//!
//! Incremental row/cell rendering over pluggable data sources:
//! - Bounded DOM: only the rendered range is ever materialized, for
//!   10 rows or 10 million
//! - Frozen rows/columns with synchronized multi-pane scrolling
//! - Editable cells behind a shared edit lock, with undoable commands
//! - Column resize (force-fit width conservation), reorder with
//!   header-group validation, and autosize
//! - Deferred per-cell post-processing on idle ticks
//!
//! The grid renders into an explicit node pool ([`dom::NodePool`])
//! rather than a platform display; a host mirrors the pool into
//! whatever it draws with and feeds scroll/click/key events back in.
//!
//! # Usage
//!
//! ```
//! use gridview::{Column, Grid, GridOptions, VecDataSource};
//! use serde_json::json;
//!
//! let columns = vec![
//!     Column::new("id", "Id", "id"),
//!     Column::new("name", "Name", "name"),
//! ];
//! let data = VecDataSource::new(vec![
//!     json!({"id": 1, "name": "Ada"}),
//!     json!({"id": 2, "name": "Grace"}),
//! ]);
//! let mut grid = Grid::new(
//!     columns,
//!     Box::new(data),
//!     GridOptions::default(),
//!     800.0,
//!     600.0,
//! )
//! .unwrap();
//! grid.render();
//! assert_eq!(grid.cached_row_count(), 2);
//! ```

pub mod columns;
pub mod dom;
pub mod edit;
pub mod error;
pub mod events;
pub mod grid;
pub mod layout;
pub mod options;
pub mod render;
pub mod types;

pub use edit::{EditCommand, Editor, EditorFactory, EditorLock, GridKey, TextEditor, ValidationResult};
pub use error::{GridError, Result};
pub use events::{EventBus, Handled};
pub use grid::{Grid, GridPlugin, NavDir, PanePositions, ResizeDrag};
pub use options::{GridOptions, ViewportFitPolicy};
pub use types::*;
