//! Error types for element tree operations

use crate::component::ElementId;

/// Errors specific to tree operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// Element not found in the tree (never existed or already removed)
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
}
