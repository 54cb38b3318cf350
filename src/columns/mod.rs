//! Column interaction algorithms: drag-resize width redistribution,
//! reorder with group validation, and autosize.

mod autosize;
mod reorder;
mod resize;

pub use autosize::*;
pub use reorder::*;
pub use resize::*;
