//! Drag session state machine
//!
//! A session tracks one drag gesture: it owns the overlay element showing the
//! drag image, follows the pointer that started the gesture, re-resolves the
//! drop target under that pointer on every move and delivers the
//! enter/move/exit/drop notifications.
//!
//! Sessions live in their container's [`SessionRegistry`]. Every step below
//! copies what it needs out of the registry, releases the borrow, runs the
//! drop target callbacks, and writes results back through the
//! generation-checked handle. A callback may therefore query the container,
//! and a session that disappeared meanwhile is simply skipped.

use std::cell::RefCell;
use std::time::Instant;

use log::{trace, warn};

use crate::component::{ElementId, SharedDropTarget};
use crate::config::DragConfig;
use crate::desktop::Desktop;
use crate::drag::{DragImage, SessionHandle, SessionRegistry, SourceDetails};
use crate::events::{PointerId, TargetHit};
use crate::layout::Point;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Pointer down, following movement
    Active,
    /// Pointer released, drop being delivered
    Releasing,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released over an interested drop target, which received the drop
    Dropped { target: ElementId },
    /// Released where no drop target wanted the item
    Released,
    /// Cancelled with the escape key
    Cancelled,
    /// The source element went away
    SourceLost,
    /// The originating pointer stopped dragging without us seeing the release
    PointerLost,
    /// The container cancelled every session
    Shutdown,
}

impl DragOutcome {
    /// The pointer was released normally, with or without a drop
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Dropped { .. } | Self::Released)
    }
}

/// State of one drag gesture
#[derive(Debug)]
pub struct DragSession {
    pub(crate) details: SourceDetails,
    pub(crate) image: DragImage,
    pub(crate) image_offset: Point,
    pub(crate) pointer: PointerId,
    pub(crate) overlay: ElementId,
    pub(crate) overlay_is_window: bool,
    pub(crate) current_target: Option<ElementId>,
    pub(crate) last_time_over_target: Option<Instant>,
    pub(crate) last_liveness_check: Instant,
    pub(crate) phase: SessionPhase,
    pub(crate) listening: bool,
}

impl DragSession {
    pub(crate) fn new(
        details: SourceDetails,
        image: DragImage,
        image_offset: Point,
        pointer: PointerId,
        overlay: ElementId,
        overlay_is_window: bool,
        now: Instant,
    ) -> Self {
        Self {
            details,
            image,
            image_offset,
            pointer,
            overlay,
            overlay_is_window,
            current_target: None,
            last_time_over_target: None,
            last_liveness_check: now,
            phase: SessionPhase::Active,
            listening: true,
        }
    }

    pub fn details(&self) -> &SourceDetails {
        &self.details
    }

    pub fn image(&self) -> &DragImage {
        &self.image
    }

    /// Pointer position within the drag image
    pub fn image_offset(&self) -> Point {
        self.image_offset
    }

    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Element displaying the drag image
    pub fn overlay(&self) -> ElementId {
        self.overlay
    }

    /// Whether the overlay is its own top-level window
    pub fn overlay_is_window(&self) -> bool {
        self.overlay_is_window
    }

    /// Element of the drop target currently under the pointer
    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target
    }

    pub fn last_time_over_target(&self) -> Option<Instant> {
        self.last_time_over_target
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub(crate) fn follows(&self, pointer: PointerId) -> bool {
        self.listening && self.phase == SessionPhase::Active && self.pointer == pointer
    }
}

fn is_interested(target: &SharedDropTarget, details: &SourceDetails) -> bool {
    target
        .try_borrow()
        .map(|t| t.is_interested_in_drag_source(details))
        .unwrap_or(false)
}

/// Drives one session through its transitions
pub(crate) struct SessionDriver<'a> {
    sessions: &'a RefCell<SessionRegistry>,
    handle: SessionHandle,
    config: &'a DragConfig,
}

impl<'a> SessionDriver<'a> {
    pub(crate) fn new(
        sessions: &'a RefCell<SessionRegistry>,
        handle: SessionHandle,
        config: &'a DragConfig,
    ) -> Self {
        Self {
            sessions,
            handle,
            config,
        }
    }

    fn read<R>(&self, f: impl FnOnce(&DragSession) -> R) -> Option<R> {
        self.sessions.borrow().get(self.handle).map(f)
    }

    fn write<R>(&self, f: impl FnOnce(&mut DragSession) -> R) -> Option<R> {
        self.sessions.borrow_mut().get_mut(self.handle).map(f)
    }

    /// Follow the pointer to `screen_pos`
    ///
    /// `now` stamps the last time a target was under the pointer; the
    /// synthetic first update passes `None`. Returns an outcome when the
    /// overlay went away with its host and the session has to end.
    pub(crate) fn update_location(
        &self,
        desktop: &mut Desktop,
        screen_pos: Point,
        now: Option<Instant>,
    ) -> Option<DragOutcome> {
        let (overlay, offset, previous, mut details) = self.read(|s| {
            (s.overlay, s.image_offset, s.current_target, s.details.clone())
        })?;

        if !desktop.tree.contains(overlay) {
            warn!("drag image {} vanished mid-drag", overlay);
            return Some(DragOutcome::SourceLost);
        }

        place_overlay(desktop, overlay, offset, previous, screen_pos);

        let hit = find_target(desktop, overlay, screen_pos, &details);
        if let Some(hit) = &hit {
            details.local_position = hit.local_position;
        }
        self.write(|s| s.details.local_position = details.local_position);

        let draw_image = hit
            .as_ref()
            .map(|h| {
                h.target
                    .try_borrow()
                    .map(|t| t.should_draw_drag_image_when_over())
                    .unwrap_or(true)
            })
            .unwrap_or(true);
        show_overlay(desktop, overlay, draw_image);

        let new_target = hit.as_ref().map(|h| h.element);
        if new_target != previous {
            send_exit(desktop, previous, &details);

            self.write(|s| s.current_target = new_target);

            if let Some(hit) = &hit {
                if is_interested(&hit.target, &details) {
                    trace!("drag enter {}", hit.element);
                    if let Ok(mut target) = hit.target.try_borrow_mut() {
                        target.item_drag_enter(&details);
                    }
                }
            }
        }

        let current = self.read(|s| s.current_target).flatten();
        if let Some(target) = current.and_then(|id| desktop.tree.drop_target(id)) {
            if is_interested(&target, &details) {
                if let Ok(mut target) = target.try_borrow_mut() {
                    target.item_drag_move(&details);
                }
            }
        }

        if let (Some(now), Some(_)) = (now, current) {
            self.write(|s| s.last_time_over_target = Some(now));
        }

        desktop.inputs.force_cursor_update();
        None
    }

    /// Finish the gesture at `screen_pos` and deliver the drop if a target accepts it
    ///
    /// The session stays registered (in [`SessionPhase::Releasing`]) while
    /// the drop is delivered; the caller tears it down afterwards. A target
    /// that was current but does not receive the drop gets its exit first.
    pub(crate) fn release(&self, desktop: &mut Desktop, screen_pos: Point) -> Option<DragOutcome> {
        let (overlay, previous, mut details) = self.write(|s| {
            s.phase = SessionPhase::Releasing;
            s.listening = false;
            (s.overlay, s.current_target, s.details.clone())
        })?;

        if !desktop.tree.contains(overlay) {
            warn!("drag image {} vanished before the release", overlay);
            return Some(DragOutcome::SourceLost);
        }

        let was_visible = desktop.tree.get(overlay).map(|e| e.is_visible()).unwrap_or(false);
        show_overlay(desktop, overlay, false);

        let hit = find_target(desktop, overlay, screen_pos, &details);
        if let Some(hit) = &hit {
            details.local_position = hit.local_position;
        }

        if was_visible {
            dismiss_with_animation(desktop, overlay, &details, hit.is_none(), self.config);
        }

        remove_overlay(desktop, overlay);

        if hit.as_ref().map(|h| h.element) != previous {
            send_exit(desktop, previous, &details);
        }

        self.write(|s| {
            s.current_target = None;
            s.details = details.clone();
        });

        match hit {
            Some(hit) => {
                trace!("drop on {}", hit.element);
                if let Ok(mut target) = hit.target.try_borrow_mut() {
                    target.item_dropped(&details);
                }
                Some(DragOutcome::Dropped { target: hit.element })
            }
            None => Some(DragOutcome::Released),
        }
    }

    /// Snap the overlay back to the source ahead of a cancel
    pub(crate) fn cancel(&self, desktop: &mut Desktop) {
        let Some((overlay, details)) = self.read(|s| (s.overlay, s.details.clone())) else {
            return;
        };
        dismiss_with_animation(desktop, overlay, &details, true, self.config);
    }

    /// Periodic check that the source element and the pointer are still alive
    pub(crate) fn check_liveness(&self, desktop: &mut Desktop, now: Instant) -> Option<DragOutcome> {
        let (last_check, pointer, overlay) =
            self.read(|s| (s.last_liveness_check, s.pointer, s.overlay))?;
        if now.saturating_duration_since(last_check) < self.config.liveness_interval() {
            return None;
        }

        self.write(|s| s.last_liveness_check = now);
        desktop.inputs.force_cursor_update();

        let source_alive = self.read(|s| s.details.source_alive(&desktop.tree))?;
        if !source_alive {
            self.write(|s| s.details.source = None);
            return Some(DragOutcome::SourceLost);
        }

        if !desktop.tree.contains(overlay) {
            warn!("drag image {} vanished mid-drag", overlay);
            return Some(DragOutcome::SourceLost);
        }

        if !desktop.inputs.is_dragging(pointer) {
            self.write(|s| s.listening = false);
            return Some(DragOutcome::PointerLost);
        }

        None
    }

    /// Replace the drag image and resize the overlay to match
    pub(crate) fn set_image(&self, desktop: &mut Desktop, image: DragImage) -> bool {
        let size = image.logical_size();
        let Some(overlay) = self.write(|s| {
            s.image = image;
            s.overlay
        }) else {
            return false;
        };
        desktop.tree.set_size(overlay, size).is_ok()
    }

    /// Remove the session, its overlay, and send the final exit
    ///
    /// Returns the final details; the source is `None` if it no longer exists.
    pub(crate) fn teardown(&self, desktop: &mut Desktop) -> Option<SourceDetails> {
        let session = self.sessions.borrow_mut().remove(self.handle)?;
        remove_overlay(desktop, session.overlay);

        let mut details = session.details;
        if !details.source_alive(&desktop.tree) {
            details.source = None;
        }

        if let Some(target) = session
            .current_target
            .and_then(|id| desktop.tree.drop_target(id))
        {
            if is_interested(&target, &details) {
                trace!("drag exit {:?} on teardown", session.current_target);
                if let Ok(mut target) = target.try_borrow_mut() {
                    target.item_drag_exit(&details);
                }
            }
        }

        Some(details)
    }
}

/// Exit `target` if the source still exists and the target still wants it
fn send_exit(desktop: &Desktop, target: Option<ElementId>, details: &SourceDetails) {
    let Some(last) = target.and_then(|id| desktop.tree.drop_target(id)) else {
        return;
    };
    if details.source_alive(&desktop.tree) && is_interested(&last, details) {
        trace!("drag exit {:?}", target);
        if let Ok(mut last) = last.try_borrow_mut() {
            last.item_drag_exit(details);
        }
    }
}

fn show_overlay(desktop: &mut Desktop, overlay: ElementId, visible: bool) {
    if let Err(err) = desktop.tree.set_visible(overlay, visible) {
        warn!("cannot show drag image: {}", err);
    }
}

fn remove_overlay(desktop: &mut Desktop, overlay: ElementId) {
    if !desktop.tree.contains(overlay) {
        return;
    }
    if let Err(err) = desktop.tree.remove(overlay) {
        warn!("cannot remove drag image: {}", err);
    }
}

/// Move the overlay so the pointer sits at the image offset, letting the
/// current target adjust the position
fn place_overlay(
    desktop: &mut Desktop,
    overlay: ElementId,
    offset: Point,
    current_target: Option<ElementId>,
    screen_pos: Point,
) {
    let mut top_left = screen_pos - offset;

    if let Some(parent) = desktop.tree.parent(overlay) {
        if let Some(local) = desktop.tree.local_point(parent, top_left) {
            top_left = local;
        }
    }

    if let Some(target) = current_target.and_then(|id| desktop.tree.drop_target(id)) {
        if let Ok(mut target) = target.try_borrow_mut() {
            target.drag_image_move(&mut top_left);
        }
    }

    if let Err(err) = desktop.tree.set_top_left(overlay, top_left) {
        warn!("cannot move drag image: {}", err);
    }
}

/// Resolve the interested drop target under `screen_pos`
///
/// Searches the overlay's parent subtree, or every top-level window when the
/// overlay is a window itself. The overlay never intercepts clicks, so it
/// never hides what is underneath it.
fn find_target(
    desktop: &mut Desktop,
    overlay: ElementId,
    screen_pos: Point,
    details: &SourceDetails,
) -> Option<TargetHit> {
    let start = match desktop.tree.parent(overlay) {
        Some(parent) => desktop
            .hit_tester
            .component_at(&desktop.tree, parent, screen_pos),
        None => desktop
            .hit_tester
            .desktop_component_at(&desktop.tree, screen_pos),
    };

    desktop
        .hit_tester
        .find_drop_target(&desktop.tree, start, screen_pos, details)
}

/// Animate the overlay out: back onto the source when snapping back and the
/// source still exists, otherwise a fade in place
fn dismiss_with_animation(
    desktop: &mut Desktop,
    overlay: ElementId,
    details: &SourceDetails,
    snap_back: bool,
    config: &DragConfig,
) {
    show_overlay(desktop, overlay, true);
    let duration = config.dismiss_duration();

    let source_centre = details
        .source
        .and_then(|id| desktop.tree.screen_bounds(id))
        .map(|bounds| bounds.centre());

    match (snap_back, source_centre, desktop.tree.screen_bounds(overlay)) {
        (true, Some(target), Some(bounds)) => {
            let destination = bounds.translated(target - bounds.centre());
            desktop.animator.animate_to(overlay, destination, 0.0, duration);
        }
        _ => desktop.animator.fade_out(overlay, duration),
    }
}
