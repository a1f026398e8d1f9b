//! Registry of physical pointers (mouse and touch points)
//!
//! The host feeds raw presses, moves and releases in here; the registry keeps
//! each pointer's position and pressed/dragging state and hands back the
//! [`PointerEvent`] to route onwards.

use crate::events::{PointerEvent, PointerEventType, PointerId};
use crate::layout::Point;

/// Distance in pixels a pressed pointer must travel before it counts as dragging
pub const DEFAULT_DRAG_THRESHOLD: f32 = 4.0;

/// State of one pointer
#[derive(Debug, Clone, PartialEq)]
pub struct PointerSource {
    id: PointerId,
    screen_position: Point,
    last_mouse_down: Point,
    pressed: bool,
    dragging: bool,
}

impl PointerSource {
    fn new(id: PointerId, position: Point) -> Self {
        Self {
            id,
            screen_position: position,
            last_mouse_down: position,
            pressed: false,
            dragging: false,
        }
    }

    pub fn id(&self) -> PointerId {
        self.id
    }

    pub fn screen_position(&self) -> Point {
        self.screen_position
    }

    /// Screen position of the most recent press
    pub fn last_mouse_down(&self) -> Point {
        self.last_mouse_down
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Pressed and moved past the drag threshold since the press
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

/// All pointers known to the desktop
#[derive(Debug, Clone)]
pub struct InputSources {
    sources: Vec<PointerSource>,
    drag_threshold: f32,
    cursor_updates: u64,
}

impl Default for InputSources {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSources {
    pub fn new() -> Self {
        Self::with_drag_threshold(DEFAULT_DRAG_THRESHOLD)
    }

    pub fn with_drag_threshold(drag_threshold: f32) -> Self {
        Self {
            sources: Vec::new(),
            drag_threshold: drag_threshold.max(0.0),
            cursor_updates: 0,
        }
    }

    pub fn drag_threshold(&self) -> f32 {
        self.drag_threshold
    }

    fn source_mut(&mut self, id: PointerId, position: Point) -> &mut PointerSource {
        if let Some(index) = self.sources.iter().position(|s| s.id == id) {
            &mut self.sources[index]
        } else {
            self.sources.push(PointerSource::new(id, position));
            let last = self.sources.len() - 1;
            &mut self.sources[last]
        }
    }

    /// Record a press
    pub fn press(&mut self, id: PointerId, position: Point) -> PointerEvent {
        let source = self.source_mut(id, position);
        source.screen_position = position;
        source.last_mouse_down = position;
        source.pressed = true;
        source.dragging = false;
        PointerEvent::new(id, PointerEventType::Down, position)
    }

    /// Record a move; returns a drag event only while the pointer is pressed
    pub fn move_to(&mut self, id: PointerId, position: Point) -> Option<PointerEvent> {
        let threshold = self.drag_threshold;
        let source = self.source_mut(id, position);
        source.screen_position = position;

        if !source.pressed {
            return None;
        }

        if !source.dragging
            && position.distance_squared_from(source.last_mouse_down) >= threshold * threshold
        {
            source.dragging = true;
        }

        Some(PointerEvent::new(id, PointerEventType::Drag, position))
    }

    /// Record a release
    pub fn release(&mut self, id: PointerId, position: Point) -> PointerEvent {
        let source = self.source_mut(id, position);
        source.screen_position = position;
        source.pressed = false;
        source.dragging = false;
        PointerEvent::new(id, PointerEventType::Up, position)
    }

    /// Forget a pointer entirely, e.g. a touch point that lifted off-screen
    pub fn remove(&mut self, id: PointerId) {
        self.sources.retain(|s| s.id != id);
    }

    pub fn source(&self, id: PointerId) -> Option<&PointerSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn sources(&self) -> &[PointerSource] {
        &self.sources
    }

    /// Pointers currently mid-drag
    pub fn dragging_sources(&self) -> impl Iterator<Item = &PointerSource> + '_ {
        self.sources.iter().filter(|s| s.dragging)
    }

    pub fn is_dragging(&self, id: PointerId) -> bool {
        self.source(id).map(|s| s.dragging).unwrap_or(false)
    }

    /// Ask the cursor to be re-evaluated even though the pointer itself did not move
    pub fn force_cursor_update(&mut self) {
        self.cursor_updates += 1;
    }

    /// Number of forced cursor refreshes so far
    pub fn cursor_updates(&self) -> u64 {
        self.cursor_updates
    }
}
