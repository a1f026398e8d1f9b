//! Input model for Orbit drag and drop
//!
//! The event system provides:
//! - Pointer identities and pointer/key events
//! - The registry of physical pointers and their drag state
//! - Hit testing against the element tree

pub mod event;
pub mod hit_testing;
pub mod input;

pub use event::{Key, PointerEvent, PointerEventType, PointerId, PointerKind};
pub use hit_testing::{HitTestStats, HitTester, TargetHit};
pub use input::{InputSources, PointerSource, DEFAULT_DRAG_THRESHOLD};
