//! Single-column list whose rows are reordered by dragging

use std::cell::Ref;
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use crate::component::ElementId;
use crate::desktop::Desktop;
use crate::drag::{DragContainer, DragError, SessionHandle};
use crate::events::{Key, PointerEvent, PointerId};
use crate::kit::rows::{RowGeometry, RowModel, RowWidget};
use crate::layout::Rect;

fn row_index<M>(_model: &M, row: usize) -> Value {
    Value::from(row)
}

/// A list of equally tall rows backed by a [`RowModel`]
///
/// Dragging a row over the list swaps it with the row under the pointer at
/// each step; releasing it outside the list deletes it. The payload of a row
/// drag is the row index at the time the drag started.
///
/// # Examples
///
/// ```
/// use orbit_dnd::prelude::*;
///
/// let mut desktop = Desktop::new();
/// let window = desktop
///     .tree
///     .add_window("main", Rect::new(0.0, 0.0, 400.0, 300.0), WindowFlags::default());
/// let list = DraggableList::new(
///     &mut desktop,
///     window,
///     Rect::new(0.0, 0.0, 200.0, 90.0),
///     30.0,
///     vec!["a", "b", "c"],
/// )?;
/// assert_eq!(list.row_elements().len(), 3);
/// # Ok::<(), orbit_dnd::Error>(())
/// ```
pub struct DraggableList<M: RowModel + 'static> {
    inner: RowWidget<M>,
}

impl<M: RowModel + 'static> DraggableList<M> {
    /// Create the list as a child of `parent`
    pub fn new(
        desktop: &mut Desktop,
        parent: ElementId,
        bounds: Rect,
        row_height: f32,
        model: M,
    ) -> Result<Self, DragError> {
        let inner = RowWidget::new(
            desktop,
            parent,
            "list",
            bounds,
            RowGeometry::new(0.0, row_height),
            model,
            row_index::<M>,
        )?;
        Ok(Self { inner })
    }

    pub fn element(&self) -> ElementId {
        self.inner.element()
    }

    pub fn container(&self) -> &Rc<DragContainer> {
        self.inner.container()
    }

    pub fn model(&self) -> Ref<'_, M> {
        self.inner.model()
    }

    /// Mutate the model and refresh the row elements
    ///
    /// Changing the number of rows while a row is dragged leaves the dragged
    /// index pointing at whatever row now occupies it.
    pub fn update_model<R>(
        &mut self,
        desktop: &mut Desktop,
        f: impl FnOnce(&mut M) -> R,
    ) -> Result<R, DragError> {
        self.inner.update_model(desktop, f)
    }

    /// Current index of the row being dragged
    pub fn drag_row(&self) -> Option<usize> {
        self.inner.drag_row()
    }

    pub fn is_dragging_outside(&self) -> bool {
        self.inner.is_dragging_outside()
    }

    /// Row elements, top to bottom
    pub fn row_elements(&self) -> &[ElementId] {
        self.inner.row_elements()
    }

    /// Start dragging `row`; see [`DragContainer::start_dragging`]
    pub fn row_dragged(
        &mut self,
        desktop: &mut Desktop,
        row: usize,
        pointer: PointerId,
    ) -> Result<Option<SessionHandle>, DragError> {
        self.inner.row_dragged(desktop, row, pointer)
    }

    pub fn handle_pointer_event(
        &mut self,
        desktop: &mut Desktop,
        event: &PointerEvent,
    ) -> Result<bool, DragError> {
        self.inner.handle_pointer_event(desktop, event)
    }

    pub fn handle_key(&mut self, desktop: &mut Desktop, key: Key) -> Result<bool, DragError> {
        self.inner.handle_key(desktop, key)
    }

    pub fn tick(&mut self, desktop: &mut Desktop, now: Instant) -> Result<(), DragError> {
        self.inner.tick(desktop, now)
    }

    /// Refresh the row elements after the model changed
    pub fn update_content(&mut self, desktop: &mut Desktop) -> Result<(), DragError> {
        self.inner.update_content(desktop)
    }

    /// Cancel any drag and remove the list from the tree
    pub fn remove(self, desktop: &mut Desktop) -> Result<(), DragError> {
        self.inner.remove(desktop)
    }
}
