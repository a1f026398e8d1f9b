//! Animation facility consumed by the drag overlay
//!
//! The drag machinery only describes transitions; running them frame by frame
//! is the host's business. [`TransitionQueue`] records requested transitions
//! so a host (or a test) can drain and play them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::component::ElementId;
use crate::layout::Rect;

/// A requested transition of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Move to `bounds` while fading to `final_alpha`
    MoveTo {
        element: ElementId,
        bounds: Rect,
        final_alpha: f32,
        duration: Duration,
    },
    /// Fade out in place
    FadeOut { element: ElementId, duration: Duration },
}

impl Transition {
    pub fn element(&self) -> ElementId {
        match self {
            Self::MoveTo { element, .. } | Self::FadeOut { element, .. } => *element,
        }
    }
}

/// Something that can animate elements
///
/// Implementations must snapshot whatever they need: the element may be
/// removed from the tree right after the call.
pub trait Animator {
    /// Animate an element towards `bounds` (screen space) and `final_alpha`
    fn animate_to(&mut self, element: ElementId, bounds: Rect, final_alpha: f32, duration: Duration);

    /// Fade an element out in place
    fn fade_out(&mut self, element: ElementId, duration: Duration);
}

/// Records transitions; clones share the same queue
#[derive(Debug, Clone, Default)]
pub struct TransitionQueue {
    pending: Rc<RefCell<Vec<Transition>>>,
}

impl TransitionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every recorded transition
    pub fn drain(&self) -> Vec<Transition> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Animator for TransitionQueue {
    fn animate_to(&mut self, element: ElementId, bounds: Rect, final_alpha: f32, duration: Duration) {
        self.pending.borrow_mut().push(Transition::MoveTo {
            element,
            bounds,
            final_alpha,
            duration,
        });
    }

    fn fade_out(&mut self, element: ElementId, duration: Duration) {
        self.pending
            .borrow_mut()
            .push(Transition::FadeOut { element, duration });
    }
}
