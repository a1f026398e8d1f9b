//! Drag container: starts drag sessions and mediates their lifecycle
//!
//! A container is attached to a host element; the drag image of an
//! in-process drag is placed inside that element. Draggable leaf elements find
//! their container with [`DragContainer::find_parent_drag_container_for`].

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use image::RgbaImage;
use log::{debug, warn};
use serde_json::Value;

use crate::component::{ElementId, ElementTree, WindowFlags};
use crate::config::DragConfig;
use crate::desktop::Desktop;
use crate::drag::preview::synthesize_preview;
use crate::drag::session::SessionDriver;
use crate::drag::{
    DragError, DragImage, DragOutcome, DragSession, SessionHandle, SessionRegistry, SourceDetails,
};
use crate::events::{Key, PointerEvent, PointerEventType, PointerId};
use crate::layout::Point;

/// Hooks invoked once per session when it starts and when it ends
pub trait DragLifecycle {
    fn drag_operation_started(&mut self, _details: &SourceDetails) {}

    /// `details.source` is `None` if the source element no longer exists
    fn drag_operation_ended(&mut self, _details: &SourceDetails, _outcome: DragOutcome) {}
}

/// Parameters of [`DragContainer::start_dragging`]
#[derive(Debug, Clone)]
pub struct DragRequest {
    pub description: Value,
    pub source: ElementId,
    pub image: Option<DragImage>,
    pub allow_cross_window: bool,
    pub image_offset: Option<Point>,
    pub pointer: Option<PointerId>,
}

impl DragRequest {
    pub fn new(description: impl Into<Value>, source: ElementId) -> Self {
        Self {
            description: description.into(),
            source,
            image: None,
            allow_cross_window: false,
            image_offset: None,
            pointer: None,
        }
    }

    /// Use this image instead of a faded snapshot of the source
    pub fn with_image(mut self, image: DragImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Pointer position within the drag image
    pub fn with_image_offset(mut self, offset: Point) -> Self {
        self.image_offset = Some(offset);
        self
    }

    /// The pointer that started the gesture; otherwise the nearest dragging pointer is used
    pub fn with_pointer(mut self, pointer: PointerId) -> Self {
        self.pointer = Some(pointer);
        self
    }

    /// Show the drag image in its own top-level window so it can leave the host window
    pub fn allow_cross_window(mut self, allow: bool) -> Self {
        self.allow_cross_window = allow;
        self
    }
}

/// Owner of zero or more drag sessions
pub struct DragContainer {
    host: Option<ElementId>,
    config: DragConfig,
    sessions: RefCell<SessionRegistry>,
    lifecycle: RefCell<Option<Box<dyn DragLifecycle>>>,
}

impl std::fmt::Debug for DragContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragContainer")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("sessions", &self.sessions.borrow().len())
            .finish()
    }
}

impl DragContainer {
    /// Create a container hosted by `host` with the default configuration
    pub fn new(host: Option<ElementId>) -> Self {
        Self::with_config(host, DragConfig::default())
    }

    pub fn with_config(host: Option<ElementId>, config: DragConfig) -> Self {
        Self {
            host,
            config,
            sessions: RefCell::new(SessionRegistry::new()),
            lifecycle: RefCell::new(None),
        }
    }

    pub fn host(&self) -> Option<ElementId> {
        self.host
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Register this container on its host element so descendants can find it
    pub fn attach(self: &Rc<Self>, tree: &mut ElementTree) -> Result<(), DragError> {
        let host = self.host.ok_or(DragError::HostNotVisual)?;
        tree.set_drag_container(host, Some(Rc::downgrade(self)))?;
        Ok(())
    }

    /// Install the started/ended hooks
    pub fn set_lifecycle(&self, lifecycle: Box<dyn DragLifecycle>) {
        *self.lifecycle.borrow_mut() = Some(lifecycle);
    }

    fn with_lifecycle(&self, f: impl FnOnce(&mut dyn DragLifecycle)) {
        let taken = self.lifecycle.borrow_mut().take();
        if let Some(mut lifecycle) = taken {
            f(lifecycle.as_mut());
            let mut slot = self.lifecycle.borrow_mut();
            if slot.is_none() {
                *slot = Some(lifecycle);
            }
        }
    }

    fn driver(&self, handle: SessionHandle) -> SessionDriver<'_> {
        SessionDriver::new(&self.sessions, handle, &self.config)
    }

    /// Nearest container attached to an ancestor of `element`
    pub fn find_parent_drag_container_for(
        tree: &ElementTree,
        element: ElementId,
    ) -> Option<Rc<DragContainer>> {
        tree.ancestors(element)
            .find_map(|ancestor| tree.drag_container(ancestor))
    }

    /// Start dragging `request.source`
    ///
    /// Returns `Ok(None)` if that source is already being dragged by this
    /// container. Must be called while a pointer is dragging; calling it
    /// otherwise, or asking for an in-process drag without a host element,
    /// asserts in debug builds and starts nothing.
    pub fn start_dragging(
        &self,
        desktop: &mut Desktop,
        request: DragRequest,
    ) -> Result<Option<SessionHandle>, DragError> {
        let DragRequest {
            description,
            source,
            image,
            allow_cross_window,
            image_offset,
            pointer,
        } = request;

        if self.is_already_dragging(source) {
            debug!("{} is already being dragged", source);
            return Ok(None);
        }

        if !desktop.tree.contains(source) {
            return Err(DragError::SourceNotFound(source));
        }

        let Some(pointer) = self.pointer_for_drag(desktop, source, pointer) else {
            warn!("start_dragging called for {} outside a drag gesture", source);
            debug_assert!(false, "start_dragging must be called while a pointer is dragging");
            return Err(DragError::PointerNotDragging);
        };

        let host = if allow_cross_window {
            None
        } else {
            match self.host.filter(|host| desktop.tree.contains(*host)) {
                Some(host) => Some(host),
                None => {
                    warn!("drag container has no host element for an in-process drag");
                    debug_assert!(false, "drag container needs a host element");
                    return Err(DragError::HostNotVisual);
                }
            }
        };

        let last_mouse_down = desktop
            .inputs
            .source(pointer)
            .map(|s| s.last_mouse_down())
            .unwrap_or_default();
        let pointer_in_source = desktop
            .tree
            .local_point(source, last_mouse_down)
            .unwrap_or_default();

        let (image, offset) = match image.filter(|image| !image.is_empty()) {
            Some(image) => {
                let offset = image.resolve_offset(image_offset);
                (image, offset)
            }
            None => self.snapshot_preview(desktop, source, pointer_in_source),
        };

        let overlay = create_overlay(desktop, host, &image)?;
        let details = SourceDetails::new(description, Some(source), pointer_in_source);
        let session = DragSession::new(
            details,
            image,
            offset,
            pointer,
            overlay,
            host.is_none(),
            Instant::now(),
        );
        let handle = self.sessions.borrow_mut().insert(session);

        debug!(
            "drag {} started from {} by {} (cross window: {})",
            handle, source, pointer, allow_cross_window
        );

        let lost = self.driver(handle).update_location(desktop, last_mouse_down, None);

        if let Some(details) = self.session_details(handle) {
            self.with_lifecycle(|lifecycle| lifecycle.drag_operation_started(&details));
        }

        if let Some(outcome) = lost {
            self.finish(desktop, handle, outcome);
            return Ok(None);
        }

        Ok(Some(handle))
    }

    fn snapshot_preview(
        &self,
        desktop: &Desktop,
        source: ElementId,
        pointer_in_source: Point,
    ) -> (DragImage, Point) {
        let scale = self.config.preview_scale;
        let snapshot = desktop
            .renderer
            .snapshot(&desktop.tree, source, scale)
            .unwrap_or_else(|| {
                let size = desktop
                    .tree
                    .get(source)
                    .map(|e| e.bounds().size)
                    .unwrap_or_default();
                RgbaImage::new(
                    (size.width * scale).round().max(1.0) as u32,
                    (size.height * scale).round().max(1.0) as u32,
                )
            });

        synthesize_preview(snapshot, pointer_in_source, &self.config)
    }

    /// The explicit pointer if it is dragging, otherwise the dragging pointer
    /// closest to the centre of `source`
    fn pointer_for_drag(
        &self,
        desktop: &Desktop,
        source: ElementId,
        explicit: Option<PointerId>,
    ) -> Option<PointerId> {
        let candidate = match explicit {
            Some(pointer) => Some(pointer),
            None => {
                let centre = desktop
                    .tree
                    .screen_bounds(source)
                    .map(|bounds| bounds.centre())
                    .unwrap_or_default();
                desktop
                    .inputs
                    .dragging_sources()
                    .min_by(|a, b| {
                        a.screen_position()
                            .distance_squared_from(centre)
                            .total_cmp(&b.screen_position().distance_squared_from(centre))
                    })
                    .map(|s| s.id())
            }
        };

        candidate.filter(|pointer| desktop.inputs.is_dragging(*pointer))
    }

    fn is_already_dragging(&self, source: ElementId) -> bool {
        self.sessions
            .borrow()
            .iter()
            .any(|(_, session)| session.details.source == Some(source))
    }

    fn handles_following(&self, pointer: PointerId) -> Vec<SessionHandle> {
        self.sessions
            .borrow()
            .iter()
            .filter(|(_, session)| session.follows(pointer))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Route a pointer event to the sessions started by that pointer
    ///
    /// Returns whether any session consumed the event.
    pub fn handle_pointer_event(&self, desktop: &mut Desktop, event: &PointerEvent) -> bool {
        let handles = self.handles_following(event.pointer);

        match event.event_type {
            PointerEventType::Down => return false,
            PointerEventType::Drag => {
                let now = Instant::now();
                for handle in &handles {
                    let outcome = self
                        .driver(*handle)
                        .update_location(desktop, event.screen_position, Some(now));
                    if let Some(outcome) = outcome {
                        self.finish(desktop, *handle, outcome);
                    }
                }
            }
            PointerEventType::Up => {
                for handle in &handles {
                    if let Some(outcome) = self.driver(*handle).release(desktop, event.screen_position) {
                        self.finish(desktop, *handle, outcome);
                    }
                }
            }
        }

        !handles.is_empty()
    }

    /// Escape cancels every session of this container
    pub fn handle_key(&self, desktop: &mut Desktop, key: Key) -> bool {
        if key != Key::Escape {
            return false;
        }

        let handles = self.sessions.borrow().handles();
        for handle in &handles {
            self.driver(*handle).cancel(desktop);
            self.finish(desktop, *handle, DragOutcome::Cancelled);
        }

        !handles.is_empty()
    }

    /// Drive the liveness checks; call regularly from the host's event loop
    pub fn tick(&self, desktop: &mut Desktop, now: Instant) {
        let handles = self.sessions.borrow().handles();
        for handle in handles {
            if let Some(outcome) = self.driver(handle).check_liveness(desktop, now) {
                self.finish(desktop, handle, outcome);
            }
        }
    }

    /// Tear down sessions whose source was `element` or has otherwise
    /// vanished, along with sessions whose drag image went with a removed host
    ///
    /// Call after removing elements from the tree.
    pub fn element_removed(&self, desktop: &mut Desktop, element: ElementId) {
        let orphaned: Vec<SessionHandle> = self
            .sessions
            .borrow()
            .iter()
            .filter(|(_, session)| {
                session.details.source == Some(element)
                    || !session.details.source_alive(&desktop.tree)
                    || !desktop.tree.contains(session.overlay)
            })
            .map(|(handle, _)| handle)
            .collect();

        for handle in orphaned {
            self.finish(desktop, handle, DragOutcome::SourceLost);
        }
    }

    /// End every session without a drop
    pub fn cancel_all(&self, desktop: &mut Desktop) {
        let handles = self.sessions.borrow().handles();
        for handle in handles {
            self.finish(desktop, handle, DragOutcome::Shutdown);
        }
    }

    fn finish(&self, desktop: &mut Desktop, handle: SessionHandle, outcome: DragOutcome) {
        let Some(details) = self.driver(handle).teardown(desktop) else {
            return;
        };
        debug!("drag {} ended: {:?}", handle, outcome);
        self.with_lifecycle(|lifecycle| lifecycle.drag_operation_ended(&details, outcome));
    }

    /// Replace the drag image of a live session
    pub fn set_drag_image(&self, desktop: &mut Desktop, handle: SessionHandle, image: DragImage) -> bool {
        self.driver(handle).set_image(desktop, image)
    }

    /// Whether at least one session is in progress
    pub fn is_drag_and_drop_active(&self) -> bool {
        !self.sessions.borrow().is_empty()
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    /// Payload of the single active session
    ///
    /// Only meaningful with at most one session; concurrent multi-touch
    /// sessions should be inspected through [`DragContainer::session`].
    pub fn current_drag_description(&self) -> Option<Value> {
        let sessions = self.sessions.borrow();
        debug_assert!(
            sessions.len() < 2,
            "current_drag_description assumes a single drag session"
        );
        let description = sessions
            .iter()
            .next()
            .map(|(_, session)| session.details.description.clone());
        description
    }

    pub fn session(&self, handle: SessionHandle) -> Option<Ref<'_, DragSession>> {
        Ref::filter_map(self.sessions.borrow(), |sessions| sessions.get(handle)).ok()
    }

    pub fn session_details(&self, handle: SessionHandle) -> Option<SourceDetails> {
        self.sessions
            .borrow()
            .get(handle)
            .map(|session| session.details.clone())
    }

    pub fn session_handles(&self) -> Vec<SessionHandle> {
        self.sessions.borrow().handles()
    }
}

impl Drop for DragContainer {
    fn drop(&mut self) {
        let live = self.sessions.get_mut().len();
        if live > 0 {
            warn!(
                "drag container dropped with {} live session(s); call cancel_all first",
                live
            );
        }
    }
}

/// Create the element showing the drag image: a hidden, click-through child
/// of `host`, or a click-through overlay window when there is no host
fn create_overlay(
    desktop: &mut Desktop,
    host: Option<ElementId>,
    image: &DragImage,
) -> Result<ElementId, DragError> {
    let bounds = image.scaled_bounds();

    let overlay = match host {
        Some(host) => {
            let overlay = desktop.tree.add_child(host, "drag-image", bounds)?;
            desktop.tree.set_intercepts_clicks(overlay, false)?;
            desktop.tree.set_always_on_top(overlay, true)?;
            overlay
        }
        None => {
            let overlay = desktop
                .tree
                .add_window("drag-image", bounds, WindowFlags::overlay());
            if !desktop.can_use_semi_transparent_windows() {
                desktop.tree.set_opaque(overlay, true)?;
            }
            overlay
        }
    };

    desktop.tree.set_visible(overlay, false)?;
    Ok(overlay)
}
