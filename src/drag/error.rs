//! Error types for drag operations

use crate::component::{ElementId, TreeError};

/// Errors that can occur when starting or driving a drag
///
/// Contract violations are asserted in debug builds before being returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DragError {
    /// No pointer is mid-drag, so there is no gesture to attach a session to
    #[error("start_dragging must be called while a pointer is dragging")]
    PointerNotDragging,

    /// An in-process drag needs the container to own a host element
    #[error("drag container has no host element to place the drag image in")]
    HostNotVisual,

    /// The element asked to act as drag source does not exist
    #[error("drag source {0} is not in the element tree")]
    SourceNotFound(ElementId),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
