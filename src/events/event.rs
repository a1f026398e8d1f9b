//! Pointer and keyboard event types consumed by the drag machinery

use std::fmt;

use crate::layout::Point;

/// Kind of physical input device behind a pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// Identity of one pointer: device kind plus its index among devices of that kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId {
    pub kind: PointerKind,
    pub index: usize,
}

impl PointerId {
    pub fn new(kind: PointerKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// The primary mouse
    pub fn mouse() -> Self {
        Self::new(PointerKind::Mouse, 0)
    }

    pub fn touch(index: usize) -> Self {
        Self::new(PointerKind::Touch, index)
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.kind, self.index)
    }
}

/// Types of pointer events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventType {
    /// Pointer pressed
    Down,
    /// Pointer moved while pressed
    Drag,
    /// Pointer released
    Up,
}

/// Pointer event in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub event_type: PointerEventType,
    pub screen_position: Point,
}

impl PointerEvent {
    pub fn new(pointer: PointerId, event_type: PointerEventType, screen_position: Point) -> Self {
        Self {
            pointer,
            event_type,
            screen_position,
        }
    }
}

/// Keys the drag machinery reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Return,
    Character(char),
}
