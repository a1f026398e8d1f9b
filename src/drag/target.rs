//! Drop target capability and the details carried through every drag callback

use serde_json::Value;

use crate::component::{ElementId, ElementTree};
use crate::layout::Point;

/// Information about an in-flight drag, handed to every [`DropTarget`] callback
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDetails {
    /// Application payload describing what is being dragged
    pub description: Value,
    /// The element the drag started from; `None` once it has been removed
    pub source: Option<ElementId>,
    /// Pointer position relative to the current drop target
    pub local_position: Point,
}

impl SourceDetails {
    pub fn new(description: Value, source: Option<ElementId>, local_position: Point) -> Self {
        Self {
            description,
            source,
            local_position,
        }
    }

    /// Whether the source element still exists in `tree`
    pub fn source_alive(&self, tree: &ElementTree) -> bool {
        self.source.map(|id| tree.contains(id)).unwrap_or(false)
    }
}

/// Capability implemented by anything that can receive dragged items
///
/// Register an implementation on an element with
/// [`ElementTree::set_drop_target`](crate::component::ElementTree::set_drop_target).
pub trait DropTarget {
    /// Whether this target wants the item described by `details`
    ///
    /// May be called several times per pointer move while the hit chain is
    /// probed, so it must not change any state.
    fn is_interested_in_drag_source(&self, details: &SourceDetails) -> bool;

    /// The drag entered this target
    fn item_drag_enter(&mut self, _details: &SourceDetails) {}

    /// The drag moved while over this target
    fn item_drag_move(&mut self, _details: &SourceDetails) {}

    /// The drag left this target, or the session ended while over it
    fn item_drag_exit(&mut self, _details: &SourceDetails) {}

    /// The item was released over this target
    fn item_dropped(&mut self, details: &SourceDetails);

    /// Adjust where the drag image is drawn while over this target
    fn drag_image_move(&mut self, _proposed_top_left: &mut Point) {}

    /// Return false to hide the drag image while over this target
    fn should_draw_drag_image_when_over(&self) -> bool {
        true
    }
}
