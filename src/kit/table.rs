//! Multi-column table whose rows are reordered by dragging

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

/// Row model of a [`DraggableTable`]
pub trait TableModel: RowModel {
    /// Number of header cells, laid out at equal widths
    fn num_columns(&self) -> usize {
        1
    }

    /// Payload for dragging `row`; an empty value refuses the drag
    fn drag_source_description(&self, row: usize) -> Value {
        Value::from(row)
    }
}

impl<T> TableModel for Vec<T> {}

fn describe_row<M: TableModel>(model: &M, row: usize) -> Value {
    model.drag_source_description(row)
}

/// A table with a header strip above rows reordered by dragging
///
/// Behaves like a [`DraggableList`](crate::kit::DraggableList) below the
/// header; the header itself never maps to a row.
pub struct DraggableTable<M: TableModel + 'static> {
    inner: RowWidget<M>,
    header: ElementId,
    columns: Vec<ElementId>,
    header_height: f32,
}

impl<M: TableModel + 'static> DraggableTable<M> {
    pub fn new(
        desktop: &mut Desktop,
        parent: ElementId,
        bounds: Rect,
        header_height: f32,
        row_height: f32,
        model: M,
    ) -> Result<Self, DragError> {
        let geometry = RowGeometry::new(header_height, row_height);
        let inner = RowWidget::new(
            desktop,
            parent,
            "table",
            bounds,
            geometry,
            model,
            describe_row::<M>,
        )?;
        let header = desktop.tree.add_child(
            inner.element(),
            "header",
            Rect::new(0.0, 0.0, bounds.width(), geometry.header_height),
        )?;

        let num_columns = inner.model().num_columns().max(1);
        let column_width = bounds.width() / num_columns as f32;
        let columns = (0..num_columns)
            .map(|column| {
                desktop.tree.add_child(
                    header,
                    format!("column-{}", column),
                    Rect::new(
                        column as f32 * column_width,
                        0.0,
                        column_width,
                        geometry.header_height,
                    ),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            inner,
            header,
            columns,
            header_height: geometry.header_height,
        })
    }

    pub fn element(&self) -> ElementId {
        self.inner.element()
    }

    pub fn header(&self) -> ElementId {
        self.header
    }

    /// Header cells, one per model column
    pub fn columns(&self) -> &[ElementId] {
        &self.columns
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn container(&self) -> &Rc<DragContainer> {
        self.inner.container()
    }

    pub fn model(&self) -> Ref<'_, M> {
        self.inner.model()
    }

    pub fn update_model<R>(
        &mut self,
        desktop: &mut Desktop,
        f: impl FnOnce(&mut M) -> R,
    ) -> Result<R, DragError> {
        self.inner.update_model(desktop, f)
    }

    pub fn drag_row(&self) -> Option<usize> {
        self.inner.drag_row()
    }

    pub fn is_dragging_outside(&self) -> bool {
        self.inner.is_dragging_outside()
    }

    pub fn row_elements(&self) -> &[ElementId] {
        self.inner.row_elements()
    }

    /// Start dragging `row` unless the model gives it an empty description
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

    pub fn update_content(&mut self, desktop: &mut Desktop) -> Result<(), DragError> {
        self.inner.update_content(desktop)
    }

    pub fn remove(self, desktop: &mut Desktop) -> Result<(), DragError> {
        self.inner.remove(desktop)
    }
}
