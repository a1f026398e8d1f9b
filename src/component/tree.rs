//! Element tree management
//!
//! This module owns every element, tracks parent-child relationships and the
//! desktop's z-ordered list of top-level windows, and converts coordinates
//! between screen space and element-local space.

use std::rc::{Rc, Weak};

use image::Rgba;

use crate::component::{Element, ElementId, SharedDropTarget, TreeError, WindowFlags};
use crate::drag::DragContainer;
use crate::layout::{Point, Rect, Size};

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena of elements addressed by generational [`ElementId`]s
///
/// Top-level windows are kept back-to-front; always-on-top windows and
/// children always sort after their normal siblings.
#[derive(Debug, Default)]
pub struct ElementTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    windows: Vec<ElementId>,
}

impl ElementTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, element: Element) -> ElementId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.element = Some(element);
            ElementId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            ElementId::new(index, 0)
        }
    }

    /// Place a new top-level window on the desktop, bounds in screen space
    pub fn add_window(&mut self, name: impl Into<String>, bounds: Rect, flags: WindowFlags) -> ElementId {
        let mut element = Element::new(name, bounds);
        element.window = Some(flags);
        element.intercepts_clicks = !flags.ignores_clicks;
        element.always_on_top = flags.always_on_top;

        let id = self.allocate(element);
        let position = self.insertion_index(&self.windows, flags.always_on_top);
        self.windows.insert(position, id);
        id
    }

    /// Add a child element, bounds relative to the parent
    pub fn add_child(
        &mut self,
        parent: ElementId,
        name: impl Into<String>,
        bounds: Rect,
    ) -> TreeResult<ElementId> {
        if !self.contains(parent) {
            return Err(TreeError::ElementNotFound(parent));
        }

        let mut element = Element::new(name, bounds);
        element.parent = Some(parent);
        let id = self.allocate(element);

        let siblings = &self.element(parent)?.children;
        let position = self.insertion_index(siblings, false);
        self.element_mut(parent)?.children.insert(position, id);
        Ok(id)
    }

    fn insertion_index(&self, siblings: &[ElementId], always_on_top: bool) -> usize {
        if always_on_top {
            return siblings.len();
        }
        siblings
            .iter()
            .position(|s| self.get(*s).map(|e| e.always_on_top).unwrap_or(false))
            .unwrap_or(siblings.len())
    }

    /// Remove an element and its whole subtree
    pub fn remove(&mut self, id: ElementId) -> TreeResult<()> {
        let parent = self.element(id)?.parent;

        match parent {
            Some(parent) => {
                if let Ok(parent) = self.element_mut(parent) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.windows.retain(|w| *w != id),
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index()];
            if let Some(element) = slot.element.take() {
                stack.extend(element.children);
                self.free.push(current.index() as u32);
            }
        }

        Ok(())
    }

    /// Whether the handle still refers to a live element
    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.element.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a handle, `None` when the element is gone
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.element.as_ref())
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.element.as_mut())
    }

    fn element(&self, id: ElementId) -> TreeResult<&Element> {
        self.get(id).ok_or(TreeError::ElementNotFound(id))
    }

    fn element_mut(&mut self, id: ElementId) -> TreeResult<&mut Element> {
        self.get_mut(id).ok_or(TreeError::ElementNotFound(id))
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors of an element, nearest first, excluding the element itself
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Top-level windows, back to front
    pub fn windows(&self) -> &[ElementId] {
        &self.windows
    }

    /// The top-level window an element lives in
    pub fn top_level_of(&self, id: ElementId) -> Option<ElementId> {
        if !self.contains(id) {
            return None;
        }
        self.ancestors(id).last().or(Some(id))
    }

    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> TreeResult<()> {
        self.element_mut(id)?.bounds = bounds;
        Ok(())
    }

    pub fn set_top_left(&mut self, id: ElementId, top_left: Point) -> TreeResult<()> {
        let element = self.element_mut(id)?;
        element.bounds = element.bounds.with_origin(top_left);
        Ok(())
    }

    pub fn set_size(&mut self, id: ElementId, size: Size) -> TreeResult<()> {
        let element = self.element_mut(id)?;
        element.bounds = element.bounds.with_size(size);
        Ok(())
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> TreeResult<()> {
        self.element_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_intercepts_clicks(&mut self, id: ElementId, intercepts: bool) -> TreeResult<()> {
        self.element_mut(id)?.intercepts_clicks = intercepts;
        Ok(())
    }

    pub fn set_opaque(&mut self, id: ElementId, opaque: bool) -> TreeResult<()> {
        self.element_mut(id)?.opaque = opaque;
        Ok(())
    }

    pub fn set_fill(&mut self, id: ElementId, fill: Option<Rgba<u8>>) -> TreeResult<()> {
        self.element_mut(id)?.fill = fill;
        Ok(())
    }

    /// Move the element above its normal siblings and keep it there
    pub fn set_always_on_top(&mut self, id: ElementId, on_top: bool) -> TreeResult<()> {
        let element = self.element_mut(id)?;
        element.always_on_top = on_top;
        let parent = element.parent;

        let siblings = match parent {
            Some(parent) => &mut self.element_mut(parent)?.children,
            None => &mut self.windows,
        };
        siblings.retain(|s| *s != id);
        let snapshot = siblings.clone();
        let position = self.insertion_index(&snapshot, on_top);
        let siblings = match parent {
            Some(parent) => &mut self.element_mut(parent)?.children,
            None => &mut self.windows,
        };
        siblings.insert(position, id);
        Ok(())
    }

    /// Register or clear the drop target capability of an element
    pub fn set_drop_target(&mut self, id: ElementId, target: Option<SharedDropTarget>) -> TreeResult<()> {
        self.element_mut(id)?.drop_target = target;
        Ok(())
    }

    pub fn drop_target(&self, id: ElementId) -> Option<SharedDropTarget> {
        self.get(id).and_then(|e| e.drop_target.clone())
    }

    pub(crate) fn set_drag_container(
        &mut self,
        id: ElementId,
        container: Option<Weak<DragContainer>>,
    ) -> TreeResult<()> {
        self.element_mut(id)?.drag_container = container;
        Ok(())
    }

    pub fn drag_container(&self, id: ElementId) -> Option<Rc<DragContainer>> {
        self.get(id)
            .and_then(|e| e.drag_container.as_ref())
            .and_then(Weak::upgrade)
    }

    /// Screen position of the element's top-left corner
    pub fn screen_position(&self, id: ElementId) -> Option<Point> {
        let mut position = self.get(id)?.bounds.origin;
        for ancestor in self.ancestors(id) {
            position += self.get(ancestor)?.bounds.origin;
        }
        Some(position)
    }

    pub fn screen_bounds(&self, id: ElementId) -> Option<Rect> {
        let bounds = self.get(id)?.bounds;
        Some(bounds.with_origin(self.screen_position(id)?))
    }

    /// Convert a screen point into the element's local space
    pub fn local_point(&self, id: ElementId, screen_point: Point) -> Option<Point> {
        Some(screen_point - self.screen_position(id)?)
    }

    /// Convert an element-local point into screen space
    pub fn local_to_screen(&self, id: ElementId, local_point: Point) -> Option<Point> {
        Some(local_point + self.screen_position(id)?)
    }

    /// Whether the element and all of its ancestors are visible
    pub fn is_showing(&self, id: ElementId) -> bool {
        self.get(id).map(|e| e.visible).unwrap_or(false)
            && self
                .ancestors(id)
                .all(|a| self.get(a).map(|e| e.visible).unwrap_or(false))
    }
}
