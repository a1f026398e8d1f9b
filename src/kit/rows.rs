//! Shared machinery of the reorderable row widgets
//!
//! A row widget is an element whose children are its rows. It owns a
//! [`DragContainer`] hosted on that element and registers a drop target on it;
//! both roles are played by one [`RowReorderer`] sharing the widget's
//! [`ReorderState`]. Rows are swapped live while a row is dragged over the
//! widget, and a row released outside the widget is deleted.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use log::{debug, trace, warn};
use serde_json::Value;

use crate::component::ElementId;
use crate::desktop::Desktop;
use crate::drag::{
    DragContainer, DragError, DragImage, DragLifecycle, DragOutcome, DragRequest, DropTarget,
    SessionHandle, SourceDetails,
};
use crate::events::{Key, PointerEvent, PointerEventType, PointerId};
use crate::layout::{Point, Rect};

/// An ordered collection of rows that can be reordered by dragging
pub trait RowModel {
    fn num_rows(&self) -> usize;

    /// Exchange the rows at `a` and `b`
    fn swap_rows(&mut self, a: usize, b: usize);

    /// Remove the row at `index`; called for rows dragged out of the widget
    fn delete_row(&mut self, _index: usize) {}
}

impl<T> RowModel for Vec<T> {
    fn num_rows(&self) -> usize {
        self.len()
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a < self.len() && b < self.len() {
            self.swap(a, b);
        }
    }

    fn delete_row(&mut self, index: usize) {
        if index < self.len() {
            self.remove(index);
        }
    }
}

/// The model plus the progress of the row drag in flight
#[derive(Debug)]
pub struct ReorderState<M> {
    pub model: M,
    /// Current index of the row being dragged
    pub drag_row: Option<usize>,
    /// The pointer left the widget since the drag last entered it
    pub dragging_outside: bool,
    /// Row elements need refreshing from the model
    pub content_dirty: bool,
}

impl<M> ReorderState<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            drag_row: None,
            dragging_outside: false,
            content_dirty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RowGeometry {
    pub(crate) header_height: f32,
    pub(crate) row_height: f32,
}

impl RowGeometry {
    pub(crate) fn new(header_height: f32, row_height: f32) -> Self {
        Self {
            header_height: header_height.max(0.0),
            row_height: row_height.max(1.0),
        }
    }

    /// Row under a widget-local `y`, if any
    pub(crate) fn row_at(&self, y: f32, num_rows: usize) -> Option<usize> {
        let y = y - self.header_height;
        if y < 0.0 {
            return None;
        }
        let row = (y / self.row_height).floor() as usize;
        (row < num_rows).then_some(row)
    }

    /// Widget-local bounds of `row`
    pub(crate) fn row_bounds(&self, row: usize, width: f32) -> Rect {
        Rect::new(
            0.0,
            self.header_height + row as f32 * self.row_height,
            width,
            self.row_height,
        )
    }
}

/// Drop target and lifecycle hooks of a row widget
struct RowReorderer<M> {
    state: Rc<RefCell<ReorderState<M>>>,
    geometry: RowGeometry,
}

impl<M> Clone for RowReorderer<M> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            geometry: self.geometry,
        }
    }
}

impl<M: RowModel> DropTarget for RowReorderer<M> {
    /// Only drags of this widget's own rows
    fn is_interested_in_drag_source(&self, _details: &SourceDetails) -> bool {
        self.state
            .try_borrow()
            .map(|state| state.drag_row.is_some())
            .unwrap_or(false)
    }

    fn item_drag_enter(&mut self, _details: &SourceDetails) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.dragging_outside = false;
        }
    }

    fn item_drag_move(&mut self, details: &SourceDetails) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        let Some(dragged) = state.drag_row else {
            return;
        };

        let num_rows = state.model.num_rows();
        if let Some(row) = self.geometry.row_at(details.local_position.y, num_rows) {
            if row != dragged {
                trace!("row {} swapped with row {}", dragged, row);
                state.model.swap_rows(dragged, row);
                state.drag_row = Some(row);
                state.content_dirty = true;
            }
        }
    }

    fn item_drag_exit(&mut self, _details: &SourceDetails) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.dragging_outside = true;
        }
    }

    // rows were already moved while dragging
    fn item_dropped(&mut self, _details: &SourceDetails) {}
}

impl<M: RowModel> DragLifecycle for RowReorderer<M> {
    fn drag_operation_started(&mut self, _details: &SourceDetails) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.dragging_outside = false;
        }
    }

    fn drag_operation_ended(&mut self, _details: &SourceDetails, outcome: DragOutcome) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            warn!("row state busy when the drag ended");
            return;
        };

        if state.dragging_outside && outcome.is_release() {
            if let Some(row) = state.drag_row {
                debug!("row {} dragged out, deleting it", row);
                state.model.delete_row(row);
            }
        }

        state.drag_row = None;
        state.dragging_outside = false;
        state.content_dirty = true;
    }
}

/// Whether a drag description carries nothing
pub(crate) fn is_empty_description(description: &Value) -> bool {
    match description {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// The state and elements behind a reorderable row widget
pub(crate) struct RowWidget<M: RowModel + 'static> {
    element: ElementId,
    rows: Vec<ElementId>,
    geometry: RowGeometry,
    state: Rc<RefCell<ReorderState<M>>>,
    container: Rc<DragContainer>,
    describe: fn(&M, usize) -> Value,
}

impl<M: RowModel + 'static> RowWidget<M> {
    pub(crate) fn new(
        desktop: &mut Desktop,
        parent: ElementId,
        name: &str,
        bounds: Rect,
        geometry: RowGeometry,
        model: M,
        describe: fn(&M, usize) -> Value,
    ) -> Result<Self, DragError> {
        let element = desktop.tree.add_child(parent, name, bounds)?;
        let state = Rc::new(RefCell::new(ReorderState::new(model)));
        let reorderer = RowReorderer {
            state: state.clone(),
            geometry,
        };

        desktop
            .tree
            .set_drop_target(element, Some(Rc::new(RefCell::new(reorderer.clone()))))?;

        let container = Rc::new(DragContainer::new(Some(element)));
        container.attach(&mut desktop.tree)?;
        container.set_lifecycle(Box::new(reorderer));

        let mut widget = Self {
            element,
            rows: Vec::new(),
            geometry,
            state,
            container,
            describe,
        };
        widget.update_content(desktop)?;
        Ok(widget)
    }

    pub(crate) fn element(&self) -> ElementId {
        self.element
    }

    pub(crate) fn container(&self) -> &Rc<DragContainer> {
        &self.container
    }

    pub(crate) fn model(&self) -> Ref<'_, M> {
        Ref::map(self.state.borrow(), |state| &state.model)
    }

    /// Mutate the model and refresh the row elements
    pub(crate) fn update_model<R>(
        &mut self,
        desktop: &mut Desktop,
        f: impl FnOnce(&mut M) -> R,
    ) -> Result<R, DragError> {
        let result = {
            let mut state = self.state.borrow_mut();
            state.content_dirty = true;
            f(&mut state.model)
        };
        self.update_content(desktop)?;
        Ok(result)
    }

    pub(crate) fn drag_row(&self) -> Option<usize> {
        self.state.borrow().drag_row
    }

    pub(crate) fn is_dragging_outside(&self) -> bool {
        self.state.borrow().dragging_outside
    }

    pub(crate) fn row_elements(&self) -> &[ElementId] {
        &self.rows
    }

    /// Row whose element lies under `screen_point`
    pub(crate) fn row_under(&self, desktop: &mut Desktop, screen_point: Point) -> Option<usize> {
        let hit = desktop
            .hit_tester
            .component_at(&desktop.tree, self.element, screen_point)?;
        self.rows
            .iter()
            .position(|row| *row == hit || desktop.tree.ancestors(hit).any(|a| a == *row))
    }

    /// Start dragging `row` with `pointer`
    ///
    /// Does nothing if the widget has no drag container above its rows, a
    /// drag is already active, or the row's description is empty.
    pub(crate) fn row_dragged(
        &mut self,
        desktop: &mut Desktop,
        row: usize,
        pointer: PointerId,
    ) -> Result<Option<SessionHandle>, DragError> {
        let Some(&row_element) = self.rows.get(row) else {
            return Ok(None);
        };
        let Some(container) = DragContainer::find_parent_drag_container_for(&desktop.tree, row_element)
        else {
            warn!("row {} has no drag container", row);
            return Ok(None);
        };
        if container.is_drag_and_drop_active() {
            return Ok(None);
        }

        let description = {
            let state = self.state.borrow();
            (self.describe)(&state.model, row)
        };
        if is_empty_description(&description) {
            debug!("row {} has no drag description", row);
            return Ok(None);
        }

        let mut request = DragRequest::new(description, row_element).with_pointer(pointer);
        if let Some(snapshot) = desktop.renderer.snapshot(&desktop.tree, row_element, 1.0) {
            request = request.with_image(DragImage::new(snapshot, 1.0));
            let pressed_at = desktop
                .inputs
                .source(pointer)
                .and_then(|source| desktop.tree.local_point(row_element, source.last_mouse_down()));
            if let Some(offset) = pressed_at {
                request = request.with_image_offset(offset);
            }
        }

        {
            let mut state = self.state.borrow_mut();
            state.drag_row = Some(row);
            state.dragging_outside = false;
        }

        let started = container.start_dragging(desktop, request);
        if !matches!(started, Ok(Some(_))) {
            self.state.borrow_mut().drag_row = None;
        }
        started
    }

    /// Route a pointer event through the container, starting a row drag when
    /// a pressed pointer starts dragging over a row
    pub(crate) fn handle_pointer_event(
        &mut self,
        desktop: &mut Desktop,
        event: &PointerEvent,
    ) -> Result<bool, DragError> {
        let mut consumed = self.container.handle_pointer_event(desktop, event);

        if !consumed
            && event.event_type == PointerEventType::Drag
            && desktop.inputs.is_dragging(event.pointer)
            && !self.container.is_drag_and_drop_active()
        {
            let pressed_at = desktop
                .inputs
                .source(event.pointer)
                .map(|source| source.last_mouse_down());
            if let Some(row) = pressed_at.and_then(|point| self.row_under(desktop, point)) {
                if self.row_dragged(desktop, row, event.pointer)?.is_some() {
                    consumed = self.container.handle_pointer_event(desktop, event);
                }
            }
        }

        self.update_content(desktop)?;
        Ok(consumed)
    }

    pub(crate) fn handle_key(&mut self, desktop: &mut Desktop, key: Key) -> Result<bool, DragError> {
        let consumed = self.container.handle_key(desktop, key);
        self.update_content(desktop)?;
        Ok(consumed)
    }

    pub(crate) fn tick(&mut self, desktop: &mut Desktop, now: Instant) -> Result<(), DragError> {
        self.container.tick(desktop, now);
        self.update_content(desktop)
    }

    /// Bring the row elements in line with the model
    ///
    /// Row elements keep their identity by position, so the element of a row
    /// being dragged survives reordering.
    pub(crate) fn update_content(&mut self, desktop: &mut Desktop) -> Result<(), DragError> {
        let (num_rows, dirty) = {
            let state = self.state.borrow();
            (state.model.num_rows(), state.content_dirty)
        };
        if !dirty && num_rows == self.rows.len() {
            return Ok(());
        }

        while self.rows.len() > num_rows {
            if let Some(row) = self.rows.pop() {
                desktop.tree.remove(row)?;
                self.container.element_removed(desktop, row);
            }
        }

        let width = desktop
            .tree
            .get(self.element)
            .map(|element| element.bounds().width())
            .unwrap_or_default();

        while self.rows.len() < num_rows {
            let index = self.rows.len();
            let row = desktop.tree.add_child(
                self.element,
                format!("row-{}", index),
                self.geometry.row_bounds(index, width),
            )?;
            self.rows.push(row);
        }

        for (index, row) in self.rows.iter().enumerate() {
            desktop
                .tree
                .set_bounds(*row, self.geometry.row_bounds(index, width))?;
        }

        self.state.borrow_mut().content_dirty = false;
        Ok(())
    }

    /// Cancel any drag and remove the widget's elements
    pub(crate) fn remove(self, desktop: &mut Desktop) -> Result<(), DragError> {
        self.container.cancel_all(desktop);
        desktop.tree.remove(self.element)?;
        Ok(())
    }
}
