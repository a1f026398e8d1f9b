//! Tests for drag session lifecycle management

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use serde_json::json;

use crate::animation::{Transition, TransitionQueue};
use crate::component::{ElementId, WindowFlags};
use crate::desktop::Desktop;
use crate::drag::{
    DragContainer, DragError, DragImage, DragLifecycle, DragOutcome, DragRequest, DropTarget,
    SessionHandle, SessionPhase, SourceDetails,
};
use crate::events::PointerId;
use crate::layout::{Point, Rect, Size};
use crate::render::FlatRenderer;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Enter(Point),
    Move(Point),
    Exit,
    Drop(Point),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

struct Recorder {
    calls: CallLog,
    interested: bool,
    draw_image: bool,
    min_x: Option<f32>,
}

impl Recorder {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            interested: true,
            draw_image: true,
            min_x: None,
        }
    }
}

impl DropTarget for Recorder {
    fn is_interested_in_drag_source(&self, _details: &SourceDetails) -> bool {
        self.interested
    }

    fn item_drag_enter(&mut self, details: &SourceDetails) {
        self.calls.borrow_mut().push(Call::Enter(details.local_position));
    }

    fn item_drag_move(&mut self, details: &SourceDetails) {
        self.calls.borrow_mut().push(Call::Move(details.local_position));
    }

    fn item_drag_exit(&mut self, _details: &SourceDetails) {
        self.calls.borrow_mut().push(Call::Exit);
    }

    fn item_dropped(&mut self, details: &SourceDetails) {
        self.calls.borrow_mut().push(Call::Drop(details.local_position));
    }

    fn drag_image_move(&mut self, proposed_top_left: &mut Point) {
        if let Some(min_x) = self.min_x {
            proposed_top_left.x = proposed_top_left.x.max(min_x);
        }
    }

    fn should_draw_drag_image_when_over(&self) -> bool {
        self.draw_image
    }
}

type EndedLog = Rc<RefCell<Vec<(SourceDetails, DragOutcome)>>>;

struct Hooks {
    started: Rc<RefCell<Vec<SourceDetails>>>,
    ended: EndedLog,
    container: Weak<DragContainer>,
    active_when_ended: Rc<RefCell<Vec<bool>>>,
}

impl DragLifecycle for Hooks {
    fn drag_operation_started(&mut self, details: &SourceDetails) {
        self.started.borrow_mut().push(details.clone());
    }

    fn drag_operation_ended(&mut self, details: &SourceDetails, outcome: DragOutcome) {
        self.ended.borrow_mut().push((details.clone(), outcome));
        if let Some(container) = self.container.upgrade() {
            self.active_when_ended
                .borrow_mut()
                .push(container.is_drag_and_drop_active());
        }
    }
}

struct Fixture {
    desktop: Desktop,
    transitions: TransitionQueue,
    container: Rc<DragContainer>,
    window: ElementId,
    source: ElementId,
    target_a: ElementId,
    target_b: ElementId,
    log_a: CallLog,
    log_b: CallLog,
    started: Rc<RefCell<Vec<SourceDetails>>>,
    ended: EndedLog,
    active_when_ended: Rc<RefCell<Vec<bool>>>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_targets(|_| {}, |_| {})
    }

    fn with_targets(configure_a: impl FnOnce(&mut Recorder), configure_b: impl FnOnce(&mut Recorder)) -> Self {
        let transitions = TransitionQueue::new();
        let mut desktop = Desktop::with_parts(Box::new(transitions.clone()), Box::new(FlatRenderer));

        let window = desktop
            .tree
            .add_window("main", Rect::new(0.0, 0.0, 800.0, 600.0), WindowFlags::default());
        let source = desktop
            .tree
            .add_child(window, "source", Rect::new(10.0, 10.0, 100.0, 20.0))
            .unwrap();
        desktop
            .tree
            .set_fill(source, Some(Rgba([200, 100, 50, 255])))
            .unwrap();
        let target_a = desktop
            .tree
            .add_child(window, "a", Rect::new(300.0, 0.0, 200.0, 200.0))
            .unwrap();
        let target_b = desktop
            .tree
            .add_child(window, "b", Rect::new(300.0, 300.0, 200.0, 200.0))
            .unwrap();

        let log_a = CallLog::default();
        let mut recorder_a = Recorder::new(log_a.clone());
        configure_a(&mut recorder_a);
        desktop
            .tree
            .set_drop_target(target_a, Some(Rc::new(RefCell::new(recorder_a))))
            .unwrap();

        let log_b = CallLog::default();
        let mut recorder_b = Recorder::new(log_b.clone());
        configure_b(&mut recorder_b);
        desktop
            .tree
            .set_drop_target(target_b, Some(Rc::new(RefCell::new(recorder_b))))
            .unwrap();

        let container = Rc::new(DragContainer::new(Some(window)));
        container.attach(&mut desktop.tree).unwrap();

        let started = Rc::new(RefCell::new(Vec::new()));
        let ended = EndedLog::default();
        let active_when_ended = Rc::new(RefCell::new(Vec::new()));
        container.set_lifecycle(Box::new(Hooks {
            started: started.clone(),
            ended: ended.clone(),
            container: Rc::downgrade(&container),
            active_when_ended: active_when_ended.clone(),
        }));

        Self {
            desktop,
            transitions,
            container,
            window,
            source,
            target_a,
            target_b,
            log_a,
            log_b,
            started,
            ended,
            active_when_ended,
        }
    }

    fn begin_gesture(&mut self, pointer: PointerId, from: Point, to: Point) {
        self.desktop.inputs.press(pointer, from);
        self.desktop.inputs.move_to(pointer, to);
        assert!(self.desktop.inputs.is_dragging(pointer));
    }

    fn start(&mut self) -> SessionHandle {
        self.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));
        self.container
            .start_dragging(&mut self.desktop, DragRequest::new("payload", self.source))
            .unwrap()
            .unwrap()
    }

    fn drag_to(&mut self, pointer: PointerId, to: Point) -> bool {
        let event = self.desktop.inputs.move_to(pointer, to).unwrap();
        self.container.handle_pointer_event(&mut self.desktop, &event)
    }

    fn release(&mut self, pointer: PointerId, at: Point) -> bool {
        let event = self.desktop.inputs.release(pointer, at);
        self.container.handle_pointer_event(&mut self.desktop, &event)
    }

    fn outcomes(&self) -> Vec<DragOutcome> {
        self.ended.borrow().iter().map(|(_, outcome)| *outcome).collect()
    }
}

#[test]
fn test_start_places_overlay_in_host() {
    let mut fx = Fixture::new();
    let handle = fx.start();

    let session = fx.container.session(handle).unwrap();
    let overlay = session.overlay();
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.pointer(), PointerId::mouse());
    assert!(!session.overlay_is_window());
    assert_eq!(session.image().scale(), 2.0);
    assert_eq!(session.image_offset(), Point::new(10.0, 5.0));
    assert_eq!(session.current_target(), None);
    drop(session);

    let element = fx.desktop.tree.get(overlay).unwrap();
    assert_eq!(element.parent(), Some(fx.window));
    assert!(element.is_visible());
    assert!(!element.intercepts_clicks());
    assert!(element.is_always_on_top());
    assert_eq!(fx.desktop.tree.screen_bounds(overlay), Some(Rect::new(10.0, 10.0, 100.0, 20.0)));

    assert!(fx.container.is_drag_and_drop_active());
    assert_eq!(fx.container.current_drag_description(), Some(json!("payload")));
    assert_eq!(fx.started.borrow().len(), 1);
    assert_eq!(fx.started.borrow()[0].local_position, Point::new(10.0, 5.0));
}

#[test]
fn test_second_start_for_same_source_is_ignored() {
    let mut fx = Fixture::new();
    fx.start();

    let again = fx
        .container
        .start_dragging(&mut fx.desktop, DragRequest::new("again", fx.source))
        .unwrap();

    assert!(again.is_none());
    assert_eq!(fx.container.active_session_count(), 1);
    assert_eq!(fx.container.current_drag_description(), Some(json!("payload")));
    assert_eq!(fx.started.borrow().len(), 1);
}

#[test]
fn test_enter_move_exit_across_targets() {
    let mut fx = Fixture::new();
    let handle = fx.start();

    assert!(fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0)));
    assert_eq!(fx.container.session(handle).unwrap().current_target(), Some(fx.target_a));

    fx.drag_to(PointerId::mouse(), Point::new(360.0, 60.0));
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 350.0));
    fx.drag_to(PointerId::mouse(), Point::new(700.0, 50.0));

    assert_eq!(
        *fx.log_a.borrow(),
        vec![
            Call::Enter(Point::new(50.0, 50.0)),
            Call::Move(Point::new(50.0, 50.0)),
            Call::Move(Point::new(60.0, 60.0)),
            Call::Exit,
        ]
    );
    assert_eq!(
        *fx.log_b.borrow(),
        vec![
            Call::Enter(Point::new(50.0, 50.0)),
            Call::Move(Point::new(50.0, 50.0)),
            Call::Exit,
        ]
    );
    assert_eq!(fx.container.session(handle).unwrap().current_target(), None);
    assert!(fx.container.session(handle).unwrap().last_time_over_target().is_some());
}

#[test]
fn test_release_over_target_drops_once() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));
    assert!(fx.release(PointerId::mouse(), Point::new(355.0, 55.0)));

    assert_eq!(
        *fx.log_a.borrow(),
        vec![
            Call::Enter(Point::new(50.0, 50.0)),
            Call::Move(Point::new(50.0, 50.0)),
            Call::Drop(Point::new(55.0, 55.0)),
        ]
    );
    assert_eq!(fx.outcomes(), vec![DragOutcome::Dropped { target: fx.target_a }]);
    assert_eq!(*fx.active_when_ended.borrow(), vec![false]);
    assert!(!fx.container.is_drag_and_drop_active());
    assert!(fx.container.session(handle).is_none());
    assert!(!fx.desktop.tree.contains(overlay));

    let transitions = fx.transitions.drain();
    assert!(matches!(transitions.as_slice(), [Transition::FadeOut { element, .. }] if *element == overlay));

    // a stray second release reaches nothing
    assert!(!fx.release(PointerId::mouse(), Point::new(355.0, 55.0)));
    assert_eq!(fx.log_a.borrow().len(), 3);
    assert_eq!(fx.ended.borrow().len(), 1);
}

#[test]
fn test_release_outside_targets_snaps_back() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    fx.drag_to(PointerId::mouse(), Point::new(700.0, 550.0));
    fx.release(PointerId::mouse(), Point::new(700.0, 550.0));

    assert_eq!(fx.outcomes(), vec![DragOutcome::Released]);
    assert!(fx.log_a.borrow().is_empty());

    // overlay at (690, 545), 100x20: its centre moves onto the source's centre
    let transitions = fx.transitions.drain();
    assert_eq!(
        transitions,
        vec![Transition::MoveTo {
            element: overlay,
            bounds: Rect::new(10.0, 10.0, 100.0, 20.0),
            final_alpha: 0.0,
            duration: Duration::from_millis(120),
        }]
    );
}

#[test]
fn test_escape_cancels_with_exit_and_no_drop() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    assert!(fx
        .container
        .handle_key(&mut fx.desktop, crate::events::Key::Escape));

    assert_eq!(fx.log_a.borrow().last(), Some(&Call::Exit));
    assert!(!fx.log_a.borrow().iter().any(|c| matches!(c, Call::Drop(_))));
    assert_eq!(fx.outcomes(), vec![DragOutcome::Cancelled]);
    assert!(!fx.container.is_drag_and_drop_active());
    assert!(matches!(fx.transitions.drain().as_slice(), [Transition::MoveTo { .. }]));

    // later pointer traffic is ignored
    assert!(!fx.release(PointerId::mouse(), Point::new(350.0, 50.0)));
}

#[test]
fn test_other_keys_do_not_cancel() {
    let mut fx = Fixture::new();
    fx.start();

    assert!(!fx
        .container
        .handle_key(&mut fx.desktop, crate::events::Key::Character('x')));
    assert!(fx.container.is_drag_and_drop_active());
}

#[test]
fn test_liveness_detects_lost_pointer() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    // the release never reaches the container
    fx.desktop.inputs.release(PointerId::mouse(), Point::new(350.0, 50.0));

    fx.container.tick(&mut fx.desktop, Instant::now());
    assert!(fx.container.is_drag_and_drop_active());

    fx.container
        .tick(&mut fx.desktop, Instant::now() + Duration::from_millis(250));

    assert_eq!(fx.outcomes(), vec![DragOutcome::PointerLost]);
    assert_eq!(fx.log_a.borrow().iter().filter(|c| **c == Call::Exit).count(), 1);
    assert!(!fx.log_a.borrow().iter().any(|c| matches!(c, Call::Drop(_))));
}

#[test]
fn test_liveness_keeps_healthy_session() {
    let mut fx = Fixture::new();
    fx.start();
    let before = fx.desktop.inputs.cursor_updates();

    fx.container
        .tick(&mut fx.desktop, Instant::now() + Duration::from_millis(250));

    assert!(fx.container.is_drag_and_drop_active());
    assert!(fx.desktop.inputs.cursor_updates() > before);
}

#[test]
fn test_vanishing_source_torn_down_on_next_check() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    fx.desktop.tree.remove(fx.source).unwrap();
    assert!(fx.container.is_drag_and_drop_active());

    fx.container
        .tick(&mut fx.desktop, Instant::now() + Duration::from_millis(250));

    assert_eq!(fx.outcomes(), vec![DragOutcome::SourceLost]);
    assert_eq!(fx.ended.borrow()[0].0.source, None);
    assert_eq!(fx.ended.borrow()[0].0.description, json!("payload"));
    assert_eq!(fx.log_a.borrow().iter().filter(|c| **c == Call::Exit).count(), 1);
    assert!(!fx.log_a.borrow().iter().any(|c| matches!(c, Call::Drop(_))));

    fx.container
        .tick(&mut fx.desktop, Instant::now() + Duration::from_millis(500));
    assert_eq!(fx.ended.borrow().len(), 1);
}

#[test]
fn test_element_removed_tears_down_immediately() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 350.0));

    fx.desktop.tree.remove(fx.source).unwrap();
    fx.container.element_removed(&mut fx.desktop, fx.source);

    assert_eq!(fx.outcomes(), vec![DragOutcome::SourceLost]);
    assert_eq!(fx.log_b.borrow().last(), Some(&Call::Exit));
}

#[test]
fn test_release_elsewhere_exits_current_target() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    fx.release(PointerId::mouse(), Point::new(350.0, 350.0));

    assert_eq!(
        *fx.log_a.borrow(),
        vec![
            Call::Enter(Point::new(50.0, 50.0)),
            Call::Move(Point::new(50.0, 50.0)),
            Call::Exit,
        ]
    );
    assert_eq!(*fx.log_b.borrow(), vec![Call::Drop(Point::new(50.0, 50.0))]);
    assert_eq!(fx.outcomes(), vec![DragOutcome::Dropped { target: fx.target_b }]);
}

#[test]
fn test_lost_overlay_ends_session_on_next_move() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    // the host subtree holding the drag image goes away
    fx.desktop.tree.remove(overlay).unwrap();
    assert!(fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0)));

    assert_eq!(fx.outcomes(), vec![DragOutcome::SourceLost]);
    assert!(fx.log_a.borrow().is_empty());
    assert!(!fx.container.is_drag_and_drop_active());
}

#[test]
fn test_lost_overlay_found_by_liveness_and_element_removed() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));
    let overlay = fx.container.session(handle).unwrap().overlay();

    fx.desktop.tree.remove(overlay).unwrap();
    fx.container
        .tick(&mut fx.desktop, Instant::now() + Duration::from_millis(250));

    assert_eq!(fx.outcomes(), vec![DragOutcome::SourceLost]);
    assert_eq!(fx.log_a.borrow().last(), Some(&Call::Exit));

    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();
    fx.desktop.tree.remove(overlay).unwrap();
    fx.container.element_removed(&mut fx.desktop, overlay);
    assert_eq!(fx.outcomes(), vec![DragOutcome::SourceLost]);
}

#[test]
fn test_current_drag_description_follows_session() {
    let mut fx = Fixture::new();
    assert_eq!(fx.container.current_drag_description(), None);

    fx.start();
    assert_eq!(fx.container.current_drag_description(), Some(json!("payload")));

    fx.release(PointerId::mouse(), Point::new(700.0, 550.0));
    assert_eq!(fx.container.current_drag_description(), None);
}

#[test]
fn test_no_exit_on_move_after_source_vanished() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    fx.desktop.tree.remove(fx.source).unwrap();
    fx.drag_to(PointerId::mouse(), Point::new(700.0, 50.0));

    // the transition exit is suppressed; teardown sends none either since no target is current
    fx.container.cancel_all(&mut fx.desktop);
    assert!(!fx.log_a.borrow().contains(&Call::Exit));
    assert_eq!(fx.outcomes(), vec![DragOutcome::Shutdown]);
}

#[test]
fn test_offset_invariance_with_explicit_image() {
    let mut fx = Fixture::new();
    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));

    let image = DragImage::new(RgbaImage::new(40, 40), 1.0);
    let handle = fx
        .container
        .start_dragging(
            &mut fx.desktop,
            DragRequest::new(json!({ "row": 3 }), fx.source)
                .with_image(image)
                .with_image_offset(Point::new(5.0, 8.0)),
        )
        .unwrap()
        .unwrap();
    let overlay = fx.container.session(handle).unwrap().overlay();

    assert_eq!(fx.desktop.tree.screen_position(overlay), Some(Point::new(15.0, 7.0)));

    for pointer in [Point::new(100.0, 100.0), Point::new(350.0, 50.0), Point::new(420.0, 90.0)] {
        fx.drag_to(PointerId::mouse(), pointer);
        assert_eq!(
            fx.desktop.tree.screen_position(overlay),
            Some(pointer - Point::new(5.0, 8.0))
        );
    }
}

#[test]
fn test_explicit_image_defaults_to_centre() {
    let mut fx = Fixture::new();
    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));

    let handle = fx
        .container
        .start_dragging(
            &mut fx.desktop,
            DragRequest::new("x", fx.source).with_image(DragImage::new(RgbaImage::new(60, 20), 2.0)),
        )
        .unwrap()
        .unwrap();

    assert_eq!(
        fx.container.session(handle).unwrap().image_offset(),
        Point::new(15.0, 5.0)
    );
}

#[test]
fn test_target_can_constrain_drag_image() {
    let mut fx = Fixture::with_targets(|a| a.min_x = Some(320.0), |_| {});
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    // entering: the adjustment comes from the previous (absent) target
    fx.drag_to(PointerId::mouse(), Point::new(310.0, 50.0));
    assert_eq!(fx.desktop.tree.screen_position(overlay), Some(Point::new(300.0, 45.0)));

    fx.drag_to(PointerId::mouse(), Point::new(312.0, 50.0));
    assert_eq!(fx.desktop.tree.screen_position(overlay), Some(Point::new(320.0, 45.0)));
}

#[test]
fn test_target_can_hide_drag_image() {
    let mut fx = Fixture::with_targets(|a| a.draw_image = false, |_| {});
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));
    assert!(!fx.desktop.tree.get(overlay).unwrap().is_visible());

    fx.drag_to(PointerId::mouse(), Point::new(350.0, 350.0));
    assert!(fx.desktop.tree.get(overlay).unwrap().is_visible());
}

#[test]
fn test_uninterested_target_is_skipped() {
    let mut fx = Fixture::with_targets(|a| a.interested = false, |_| {});
    let handle = fx.start();

    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));

    assert!(fx.log_a.borrow().is_empty());
    assert_eq!(fx.container.session(handle).unwrap().current_target(), None);
}

#[test]
fn test_cross_window_drag_reaches_other_window() {
    let mut fx = Fixture::new();
    let other = fx
        .desktop
        .tree
        .add_window("other", Rect::new(1000.0, 0.0, 200.0, 200.0), WindowFlags::default());
    let log_c = CallLog::default();
    fx.desktop
        .tree
        .set_drop_target(other, Some(Rc::new(RefCell::new(Recorder::new(log_c.clone())))))
        .unwrap();

    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));
    let handle = fx
        .container
        .start_dragging(
            &mut fx.desktop,
            DragRequest::new("x", fx.source).allow_cross_window(true),
        )
        .unwrap()
        .unwrap();
    let overlay = fx.container.session(handle).unwrap().overlay();

    assert!(fx.container.session(handle).unwrap().overlay_is_window());
    assert!(fx.desktop.tree.windows().contains(&overlay));
    assert_eq!(fx.desktop.tree.windows().last(), Some(&overlay));

    fx.drag_to(PointerId::mouse(), Point::new(1050.0, 50.0));
    assert_eq!(fx.desktop.tree.screen_position(overlay), Some(Point::new(1040.0, 45.0)));
    fx.release(PointerId::mouse(), Point::new(1050.0, 50.0));

    assert_eq!(
        *log_c.borrow(),
        vec![
            Call::Enter(Point::new(50.0, 50.0)),
            Call::Move(Point::new(50.0, 50.0)),
            Call::Drop(Point::new(50.0, 50.0)),
        ]
    );
    assert!(!fx.desktop.tree.windows().contains(&overlay));
}

#[test]
fn test_opaque_overlay_without_translucent_windows() {
    let mut fx = Fixture::new();
    fx.desktop.set_semi_transparent_windows(false);
    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));

    let handle = fx
        .container
        .start_dragging(&mut fx.desktop, DragRequest::new("x", fx.source).allow_cross_window(true))
        .unwrap()
        .unwrap();
    let overlay = fx.container.session(handle).unwrap().overlay();

    assert!(fx.desktop.tree.get(overlay).unwrap().is_opaque());
}

#[test]
fn test_nearest_dragging_pointer_is_used() {
    let mut fx = Fixture::new();
    fx.begin_gesture(PointerId::touch(1), Point::new(400.0, 400.0), Point::new(420.0, 400.0));
    fx.begin_gesture(PointerId::touch(0), Point::new(50.0, 20.0), Point::new(60.0, 22.0));

    let handle = fx
        .container
        .start_dragging(&mut fx.desktop, DragRequest::new("x", fx.source))
        .unwrap()
        .unwrap();
    assert_eq!(fx.container.session(handle).unwrap().pointer(), PointerId::touch(0));

    // the other finger does not drive this session
    assert!(!fx.drag_to(PointerId::touch(1), Point::new(350.0, 50.0)));
    assert!(fx.log_a.borrow().is_empty());

    assert!(fx.drag_to(PointerId::touch(0), Point::new(350.0, 50.0)));
    assert_eq!(fx.log_a.borrow().len(), 2);
}

#[test]
fn test_concurrent_sessions_per_pointer() {
    let mut fx = Fixture::new();
    let second_source = fx
        .desktop
        .tree
        .add_child(fx.window, "second", Rect::new(10.0, 100.0, 100.0, 20.0))
        .unwrap();

    fx.begin_gesture(PointerId::touch(0), Point::new(20.0, 15.0), Point::new(30.0, 15.0));
    fx.begin_gesture(PointerId::touch(1), Point::new(20.0, 105.0), Point::new(30.0, 105.0));

    fx.container
        .start_dragging(
            &mut fx.desktop,
            DragRequest::new("first", fx.source).with_pointer(PointerId::touch(0)),
        )
        .unwrap()
        .unwrap();
    fx.container
        .start_dragging(
            &mut fx.desktop,
            DragRequest::new("second", second_source).with_pointer(PointerId::touch(1)),
        )
        .unwrap()
        .unwrap();
    assert_eq!(fx.container.active_session_count(), 2);

    fx.release(PointerId::touch(1), Point::new(30.0, 105.0));
    assert_eq!(fx.container.active_session_count(), 1);
    assert_eq!(fx.container.current_drag_description(), Some(json!("first")));
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "while a pointer is dragging"))]
fn test_start_without_drag_gesture_is_rejected() {
    let mut fx = Fixture::new();
    fx.desktop.inputs.press(PointerId::mouse(), Point::new(20.0, 15.0));

    let result = fx
        .container
        .start_dragging(&mut fx.desktop, DragRequest::new("x", fx.source));

    assert_eq!(result, Err(DragError::PointerNotDragging));
    assert!(!fx.container.is_drag_and_drop_active());
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "needs a host element"))]
fn test_in_process_drag_requires_host() {
    let mut fx = Fixture::new();
    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));
    let hostless = DragContainer::new(None);

    let result = hostless.start_dragging(&mut fx.desktop, DragRequest::new("x", fx.source));

    assert_eq!(result, Err(DragError::HostNotVisual));
    assert!(!hostless.is_drag_and_drop_active());
}

#[test]
fn test_unknown_source_is_an_error() {
    let mut fx = Fixture::new();
    fx.begin_gesture(PointerId::mouse(), Point::new(20.0, 15.0), Point::new(30.0, 15.0));
    let gone = fx
        .desktop
        .tree
        .add_child(fx.window, "gone", Rect::new(0.0, 0.0, 1.0, 1.0))
        .unwrap();
    fx.desktop.tree.remove(gone).unwrap();

    let result = fx
        .container
        .start_dragging(&mut fx.desktop, DragRequest::new("x", gone));

    assert_eq!(result, Err(DragError::SourceNotFound(gone)));
}

#[test]
fn test_find_parent_drag_container() {
    let fx = Fixture::new();

    let found = DragContainer::find_parent_drag_container_for(&fx.desktop.tree, fx.source).unwrap();
    assert!(Rc::ptr_eq(&found, &fx.container));

    // containers are found from descendants, never from the host itself
    assert!(DragContainer::find_parent_drag_container_for(&fx.desktop.tree, fx.window).is_none());
}

#[test]
fn test_container_lookup_fails_once_dropped() {
    let mut fx = Fixture::new();
    let panel = fx
        .desktop
        .tree
        .add_child(fx.window, "panel", Rect::new(0.0, 500.0, 100.0, 100.0))
        .unwrap();
    let leaf = fx
        .desktop
        .tree
        .add_child(panel, "leaf", Rect::new(0.0, 0.0, 10.0, 10.0))
        .unwrap();

    {
        let inner = Rc::new(DragContainer::new(Some(panel)));
        inner.attach(&mut fx.desktop.tree).unwrap();
        let found = DragContainer::find_parent_drag_container_for(&fx.desktop.tree, leaf).unwrap();
        assert!(Rc::ptr_eq(&found, &inner));
    }

    // falls through to the outer container
    let found = DragContainer::find_parent_drag_container_for(&fx.desktop.tree, leaf).unwrap();
    assert!(Rc::ptr_eq(&found, &fx.container));
}

#[test]
fn test_set_drag_image_resizes_overlay() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    assert!(fx.container.set_drag_image(
        &mut fx.desktop,
        handle,
        DragImage::new(RgbaImage::new(80, 10), 2.0)
    ));

    assert_eq!(
        fx.desktop.tree.get(overlay).unwrap().bounds().size,
        Size::new(40.0, 5.0)
    );
    assert_eq!(fx.container.session(handle).unwrap().image().scale(), 2.0);
}

#[test]
fn test_cancel_all_ends_every_session() {
    let mut fx = Fixture::new();
    let handle = fx.start();
    let overlay = fx.container.session(handle).unwrap().overlay();

    fx.container.cancel_all(&mut fx.desktop);

    assert!(!fx.container.is_drag_and_drop_active());
    assert!(!fx.desktop.tree.contains(overlay));
    assert_eq!(fx.outcomes(), vec![DragOutcome::Shutdown]);
    assert!(!fx.container.set_drag_image(
        &mut fx.desktop,
        handle,
        DragImage::new(RgbaImage::new(1, 1), 1.0)
    ));
}

#[test]
fn test_synthesized_preview_uses_source_pixels() {
    let mut fx = Fixture::new();
    let handle = fx.start();

    let session = fx.container.session(handle).unwrap();
    let image = session.image().image();
    assert_eq!(image.dimensions(), (200, 40));
    let pixel = image.get_pixel(20, 10);
    assert_eq!(pixel[0], 200);
    assert_eq!(pixel[3], 153);
}

#[test]
fn test_target_b_untouched_by_unrelated_moves() {
    let mut fx = Fixture::new();
    fx.start();
    fx.drag_to(PointerId::mouse(), Point::new(350.0, 50.0));
    fx.release(PointerId::mouse(), Point::new(350.0, 50.0));

    assert!(fx.log_b.borrow().is_empty());
    assert!(fx.desktop.tree.contains(fx.target_b));
}
