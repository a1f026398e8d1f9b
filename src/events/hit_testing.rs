//! Hit testing functionality for drag-aware event handling
//!
//! This module finds the deepest element under a screen position, either
//! within one subtree or across every top-level window on the desktop, and
//! resolves the nearest interested drop target above that element.

use log::trace;

use crate::component::{ElementId, ElementTree, SharedDropTarget};
use crate::drag::SourceDetails;
use crate::layout::Point;

/// Hit testing engine for determining drag targets from the element tree
#[derive(Debug)]
pub struct HitTester {
    /// Performance statistics
    pub stats: HitTestStats,
}

/// Performance statistics for hit testing
#[derive(Debug, Default, Clone)]
pub struct HitTestStats {
    /// Number of hit tests performed
    pub hit_tests: u64,
    /// Number of elements tested in the last hit test
    pub nodes_tested: u32,
    /// Number of ancestors probed for a drop target in the last resolution
    pub targets_probed: u32,
}

/// A resolved drop target
#[derive(Clone)]
pub struct TargetHit {
    /// Element carrying the drop target capability
    pub element: ElementId,
    /// The capability itself
    pub target: SharedDropTarget,
    /// Hit position in the target element's local space
    pub local_position: Point,
}

impl std::fmt::Debug for TargetHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetHit")
            .field("element", &self.element)
            .field("local_position", &self.local_position)
            .finish()
    }
}

impl HitTester {
    /// Create a new hit tester
    pub fn new() -> Self {
        Self {
            stats: HitTestStats::default(),
        }
    }

    /// Deepest visible, click-intercepting element under `screen_point` within `root`'s subtree
    pub fn component_at(
        &mut self,
        tree: &ElementTree,
        root: ElementId,
        screen_point: Point,
    ) -> Option<ElementId> {
        self.stats.hit_tests += 1;
        self.stats.nodes_tested = 0;

        let parent_origin = tree
            .parent(root)
            .and_then(|parent| tree.screen_position(parent))
            .unwrap_or_else(Point::zero);
        self.component_at_recursive(tree, root, parent_origin, screen_point)
    }

    fn component_at_recursive(
        &mut self,
        tree: &ElementTree,
        id: ElementId,
        parent_origin: Point,
        screen_point: Point,
    ) -> Option<ElementId> {
        self.stats.nodes_tested += 1;

        let element = tree.get(id)?;
        if !element.is_visible() || !element.intercepts_clicks() {
            return None;
        }

        let bounds = element.bounds().translated(parent_origin);
        if !bounds.contains_point(screen_point) {
            return None;
        }

        // Children front to back
        for child in element.children().iter().rev() {
            if let Some(hit) = self.component_at_recursive(tree, *child, bounds.origin, screen_point) {
                return Some(hit);
            }
        }

        Some(id)
    }

    /// Scan the top-level windows front to back for the deepest element under `screen_point`
    pub fn desktop_component_at(&mut self, tree: &ElementTree, screen_point: Point) -> Option<ElementId> {
        tree.windows()
            .iter()
            .rev()
            .find_map(|window| self.component_at(tree, *window, screen_point))
    }

    /// Walk from `start` up through its ancestors until an element with a drop
    /// target is interested in `details`
    pub fn find_drop_target(
        &mut self,
        tree: &ElementTree,
        start: Option<ElementId>,
        screen_point: Point,
        details: &SourceDetails,
    ) -> Option<TargetHit> {
        self.stats.targets_probed = 0;

        let start = start?;
        let chain = std::iter::once(start).chain(tree.ancestors(start));

        for candidate in chain {
            self.stats.targets_probed += 1;

            let Some(target) = tree.drop_target(candidate) else {
                continue;
            };

            let interested = target
                .try_borrow()
                .map(|t| t.is_interested_in_drag_source(details))
                .unwrap_or(false);

            if interested {
                let local_position = tree.local_point(candidate, screen_point)?;
                trace!("drop target {} resolved at {}", candidate, local_position);
                return Some(TargetHit {
                    element: candidate,
                    target,
                    local_position,
                });
            }
        }

        None
    }

    /// Reset hit testing statistics
    pub fn reset_stats(&mut self) {
        self.stats = HitTestStats::default();
    }

    /// Get hit testing statistics
    pub fn get_stats(&self) -> &HitTestStats {
        &self.stats
    }
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HitTestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hit Test Stats: {} tests, {} nodes tested, {} targets probed",
            self.hit_tests, self.nodes_tested, self.targets_probed
        )
    }
}
