//! Drag and drop core
//!
//! - [`DropTarget`]: capability any element can opt into to receive drags
//! - [`DragContainer`]: starts sessions and reports their lifecycle
//! - [`DragSession`]: the state of one gesture and its floating drag image

mod container;
mod error;
pub mod preview;
mod registry;
mod session;
mod target;

#[cfg(test)]
mod tests;

pub use container::{DragContainer, DragLifecycle, DragRequest};
pub use error::DragError;
pub use preview::DragImage;
pub use registry::SessionHandle;
pub(crate) use registry::SessionRegistry;
pub use session::{DragOutcome, DragSession, SessionPhase};
pub use target::{DropTarget, SourceDetails};
