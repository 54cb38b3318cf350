//! Layout computation: column geometry, pane split, virtual height,
//! and scroll-range math.

mod grid_layout;
mod viewport;

pub use grid_layout::*;
pub use viewport::*;
