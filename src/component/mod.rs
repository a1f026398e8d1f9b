//! Element model for Orbit drag and drop
//!
//! This module contains the retained element hierarchy the drag machinery
//! works against: identities, parent/child relationships, bounds, visibility
//! and the capability slots elements opt into (drop target, drag container).

mod error;
mod tree;

pub use error::TreeError;
pub use tree::{ElementTree, TreeResult};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use image::Rgba;

use crate::drag::{DragContainer, DropTarget};
use crate::layout::Rect;

/// Generational handle to an element in an [`ElementTree`]
///
/// Handles are weak relations: once the element is removed, every lookup
/// through a stale handle resolves to nothing, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

impl ElementId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Flags for elements placed directly on the desktop as top-level windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowFlags {
    /// Pointer events pass through the window
    pub ignores_clicks: bool,
    /// Short-lived window, e.g. a drag overlay
    pub temporary: bool,
    /// The window never takes keyboard focus
    pub ignores_key_presses: bool,
    /// Kept above every normal window
    pub always_on_top: bool,
}

impl WindowFlags {
    /// Flags for a floating overlay that must never steal input
    pub fn overlay() -> Self {
        Self {
            ignores_clicks: true,
            temporary: true,
            ignores_key_presses: true,
            always_on_top: true,
        }
    }
}

/// Shared handle to a drop target capability
pub type SharedDropTarget = Rc<RefCell<dyn DropTarget>>;

/// A node of the element tree
pub struct Element {
    pub(crate) name: String,
    /// Bounds relative to the parent (screen space for top-level windows)
    pub(crate) bounds: Rect,
    pub(crate) visible: bool,
    pub(crate) intercepts_clicks: bool,
    pub(crate) always_on_top: bool,
    pub(crate) opaque: bool,
    pub(crate) fill: Option<Rgba<u8>>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) window: Option<WindowFlags>,
    pub(crate) drop_target: Option<SharedDropTarget>,
    pub(crate) drag_container: Option<Weak<DragContainer>>,
}

impl Element {
    pub(crate) fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            bounds,
            visible: true,
            intercepts_clicks: true,
            always_on_top: false,
            opaque: false,
            fill: None,
            parent: None,
            children: Vec::new(),
            window: None,
            drop_target: None,
            drag_container: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn intercepts_clicks(&self) -> bool {
        self.intercepts_clicks
    }

    pub fn is_always_on_top(&self) -> bool {
        self.always_on_top
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn fill(&self) -> Option<Rgba<u8>> {
        self.fill
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn window_flags(&self) -> Option<WindowFlags> {
        self.window
    }

    pub fn is_window(&self) -> bool {
        self.window.is_some()
    }

    pub fn is_drop_target(&self) -> bool {
        self.drop_target.is_some()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("bounds", &self.bounds)
            .field("visible", &self.visible)
            .field("intercepts_clicks", &self.intercepts_clicks)
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("window", &self.window)
            .field("drop_target", &self.drop_target.is_some())
            .field("drag_container", &self.drag_container.is_some())
            .finish()
    }
}
