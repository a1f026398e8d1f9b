//! The toolkit context the drag machinery runs against

use crate::animation::{Animator, TransitionQueue};
use crate::component::ElementTree;
use crate::events::{HitTester, InputSources};
use crate::render::{FlatRenderer, SnapshotRenderer};

/// Everything a drag session needs from the surrounding toolkit
///
/// One desktop per process; it is passed by `&mut` into every drag operation,
/// so drop target callbacks never observe it mid-update.
pub struct Desktop {
    pub tree: ElementTree,
    pub inputs: InputSources,
    pub hit_tester: HitTester,
    pub animator: Box<dyn Animator>,
    pub renderer: Box<dyn SnapshotRenderer>,
    semi_transparent_windows: bool,
}

impl Desktop {
    /// Desktop with a recording animator and the flat renderer
    pub fn new() -> Self {
        Self::with_parts(Box::new(TransitionQueue::new()), Box::new(FlatRenderer))
    }

    pub fn with_parts(animator: Box<dyn Animator>, renderer: Box<dyn SnapshotRenderer>) -> Self {
        Self {
            tree: ElementTree::new(),
            inputs: InputSources::new(),
            hit_tester: HitTester::new(),
            animator,
            renderer,
            semi_transparent_windows: true,
        }
    }

    /// Whether top-level windows may be translucent
    pub fn can_use_semi_transparent_windows(&self) -> bool {
        self.semi_transparent_windows
    }

    pub fn set_semi_transparent_windows(&mut self, supported: bool) {
        self.semi_transparent_windows = supported;
    }
}

impl Default for Desktop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("tree", &self.tree)
            .field("inputs", &self.inputs)
            .field("hit_tester", &self.hit_tester)
            .field("semi_transparent_windows", &self.semi_transparent_windows)
            .finish()
    }
}
