// Core module of the Orbit drag and drop toolkit
pub mod animation;
pub mod component;
pub mod config;
pub mod desktop;
pub mod drag;
pub mod events;
pub mod layout;
pub mod render;

pub mod kit; // Reorderable row widgets

/// Version of the Orbit drag and drop toolkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export of common types for convenience
pub mod prelude {
    pub use crate::animation::{Animator, Transition, TransitionQueue};
    pub use crate::component::{Element, ElementId, ElementTree, TreeError, WindowFlags};
    pub use crate::config::DragConfig;
    pub use crate::desktop::Desktop;
    pub use crate::drag::{
        DragContainer, DragError, DragImage, DragLifecycle, DragOutcome, DragRequest, DropTarget,
        SessionHandle, SourceDetails,
    };
    pub use crate::events::{Key, PointerEvent, PointerEventType, PointerId};
    pub use crate::kit::{DraggableList, DraggableTable, RowModel, TableModel};
    pub use crate::layout::{Point, Rect, Size};
    pub use crate::render::{FlatRenderer, SnapshotRenderer};
    pub use crate::Error;
}

/// Errors that can occur in the Orbit drag and drop toolkit
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Element tree error: {0}")]
    Tree(#[from] component::TreeError),

    #[error("Drag error: {0}")]
    Drag(#[from] drag::DragError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
