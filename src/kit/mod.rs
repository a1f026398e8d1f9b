//! Reorderable row widgets built on the drag core

mod list;
mod rows;
mod table;

pub use list::DraggableList;
pub use rows::{ReorderState, RowModel};
pub use table::{DraggableTable, TableModel};
