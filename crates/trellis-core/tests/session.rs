//! Full session runs on the headless surface.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Style;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_core::testing::TestSurface;
use trellis_core::{
    BorderStyle, ComponentId, Dashboard, EventPoster, FloatPlacement, HorizontalAlignment,
    LayoutMode, Session, SessionConfig, SessionError, SessionState, SizeConstraints, Surface,
    SurfaceError, SurfaceEvent, Tree, TreeError, VerticalAlignment, Weight,
};

fn press(code: KeyCode) -> SurfaceEvent {
    SurfaceEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Two columns; Enter toggles a centered overlay, Right widens the left
/// column by one cell.
#[derive(Default)]
struct Panels {
    left: Option<ComponentId>,
    overlay: Option<ComponentId>,
}

impl Dashboard for Panels {
    fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
        let root = tree.root();
        tree.set_layout(root, LayoutMode::HorizontalGrid)?;
        let left = tree.new_box(BorderStyle::Plain);
        let right = tree.new_box(BorderStyle::Plain);
        tree.set_weight(left, Weight::width(50.0))?;
        tree.attach(root, left)?;
        tree.attach(root, right)?;
        self.left = Some(left);
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent, tree: &mut Tree) -> Result<(), TreeError> {
        match key.code {
            KeyCode::Enter => match self.overlay.take() {
                Some(overlay) => {
                    tree.delete(overlay)?;
                }
                None => {
                    let placement = FloatPlacement::new(6, 3)
                        .align(HorizontalAlignment::Center, VerticalAlignment::Center);
                    let overlay = tree.new_floating_box(placement, BorderStyle::Rounded);
                    tree.attach(tree.root(), overlay)?;
                    self.overlay = Some(overlay);
                }
            },
            KeyCode::Right => {
                if let Some(left) = self.left {
                    let width = tree.get(left)?.width();
                    tree.set_constraints(
                        left,
                        SizeConstraints {
                            min_width: Some(width + 1),
                            ..SizeConstraints::default()
                        },
                    )?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn run(surface: TestSurface) -> (Session<TestSurface>, Panels) {
    let mut session = Session::new(surface, SessionConfig::default()).unwrap();
    let mut app = Panels::default();
    session.run(&mut app).unwrap();
    (session, app)
}

#[test]
fn first_frame_draws_both_columns() {
    let (session, _) = run(TestSurface::new(12, 3));
    assert_eq!(
        session.surface().render_string(),
        "┌────┐┌────┐\n│    ││    │\n└────┘└────┘"
    );
}

#[test]
fn overlay_toggles_on_and_off() {
    let events = [press(KeyCode::Enter)];
    let (session, app) = run(TestSurface::new(12, 5).with_events(events));
    assert!(app.overlay.is_some());
    assert_eq!(session.surface().row(1), "│  ╭────╮  │");

    let events = [press(KeyCode::Enter), press(KeyCode::Enter)];
    let (session, app) = run(TestSurface::new(12, 5).with_events(events));
    assert!(app.overlay.is_none());
    assert_eq!(session.surface().row(1), "│    ││    │");
}

#[test]
fn constraint_change_relayouts_columns() {
    let events = [press(KeyCode::Right), press(KeyCode::Right)];
    let (session, app) = run(TestSurface::new(12, 3).with_events(events));
    let tree = session.tree();
    assert_eq!(tree.get(app.left.unwrap()).unwrap().width(), 8);
    drop(tree);
    assert_eq!(session.surface().row(0), "┌──────┐┌──┐");
}

#[test]
fn resize_redraws_at_new_size() {
    let events = [SurfaceEvent::Resize(8, 3)];
    let (session, _) = run(TestSurface::new(12, 3).with_events(events));
    assert_eq!(session.surface().size(), (8, 3));
    assert_eq!(session.surface().row(0), "┌──┐┌──┐");
}

#[test]
fn quit_keys_stop_before_later_events() {
    let ctrl_c = SurfaceEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    let events = [ctrl_c, press(KeyCode::Enter)];
    let (session, app) = run(TestSurface::new(12, 5).with_events(events));
    assert_eq!(session.state(), SessionState::Terminating);
    assert!(app.overlay.is_none());
}

#[test]
fn background_thread_updates_through_handle() {
    let mut session = Session::new(TestSurface::new(12, 3), SessionConfig::default()).unwrap();
    let handle = session.handle();
    let worker = std::thread::spawn(move || {
        handle.update(|tree| {
            let label = tree.new_text("bg");
            tree.attach(tree.root(), label).map(|()| label)
        })
    });
    let label = worker.join().unwrap().unwrap();
    session.run(&mut Panels::default()).unwrap();
    assert!(session.tree().is_live(label));
}

/// Counts finalize calls even after the session (and the surface) is gone.
struct CountingSurface {
    inner: TestSurface,
    finalized: Arc<AtomicUsize>,
}

impl Surface for CountingSurface {
    fn size(&self) -> (u16, u16) {
        self.inner.size()
    }
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.inner.clear()
    }
    fn put(&mut self, x: i32, y: i32, ch: char, style: Style) -> Result<(), SurfaceError> {
        self.inner.put(x, y, ch, style)
    }
    fn flush(&mut self) -> Result<(), SurfaceError> {
        self.inner.flush()
    }
    fn enable_mouse(&mut self) -> Result<(), SurfaceError> {
        self.inner.enable_mouse()
    }
    fn enable_paste(&mut self) -> Result<(), SurfaceError> {
        self.inner.enable_paste()
    }
    fn sync(&mut self) -> Result<(), SurfaceError> {
        self.inner.sync()
    }
    fn next_event(&mut self) -> Result<SurfaceEvent, SurfaceError> {
        self.inner.next_event()
    }
    fn poster(&self) -> Option<EventPoster> {
        self.inner.poster()
    }
    fn finalize(&mut self) -> Result<(), SurfaceError> {
        self.finalized.fetch_add(1, Ordering::SeqCst);
        self.inner.finalize()
    }
}

#[test]
fn surface_is_finalized_exactly_once() {
    let finalized = Arc::new(AtomicUsize::new(0));
    let surface = CountingSurface {
        inner: TestSurface::new(4, 3),
        finalized: finalized.clone(),
    };
    let session = Session::new(surface, SessionConfig::default()).unwrap();
    drop(session);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);

    let surface = CountingSurface {
        inner: TestSurface::new(4, 3),
        finalized: finalized.clone(),
    };
    let mut session = Session::new(surface, SessionConfig::default()).unwrap();
    session.run(&mut Panels::default()).unwrap();
    drop(session);
    assert_eq!(finalized.load(Ordering::SeqCst), 2);
}

fn counting(inner: TestSurface, finalized: &Arc<AtomicUsize>) -> CountingSurface {
    CountingSurface {
        inner,
        finalized: finalized.clone(),
    }
}

/// Panics on the first key it is given.
struct Explodes;

impl Dashboard for Explodes {
    fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
        let panel = tree.new_box(BorderStyle::Plain);
        tree.attach(tree.root(), panel)
    }

    fn on_key(&mut self, _key: KeyEvent, _tree: &mut Tree) -> Result<(), TreeError> {
        panic!("key handler blew up");
    }
}

#[test]
fn surface_is_finalized_once_when_a_handler_panics() {
    let finalized = Arc::new(AtomicUsize::new(0));
    let surface = counting(
        TestSurface::new(6, 3).with_events([press(KeyCode::Enter)]),
        &finalized,
    );
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut session = Session::new(surface, SessionConfig::default()).unwrap();
        session.run(&mut Explodes)
    }));
    assert!(outcome.is_err());
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
}

#[test]
fn input_failure_ends_the_session_while_a_handle_is_alive() {
    let finalized = Arc::new(AtomicUsize::new(0));
    let surface = counting(
        TestSurface::new(12, 3).with_event_failure(io::ErrorKind::BrokenPipe),
        &finalized,
    );
    let mut session = Session::new(surface, SessionConfig::default()).unwrap();
    let handle = session.handle();
    assert!(handle.wake());

    let result = session.run(&mut Panels::default());
    match result {
        Err(SessionError::Surface(SurfaceError::Io(err))) => {
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe)
        }
        other => panic!("expected an input failure, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Terminating);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);

    drop(session);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
    assert!(!handle.wake());
}

#[tokio::test(flavor = "multi_thread")]
async fn session_runs_on_a_blocking_thread_inside_a_runtime() {
    let mut session = Session::new(TestSurface::new(12, 3), SessionConfig::default()).unwrap();
    let handle = session.handle();
    let label = tokio::spawn(async move {
        handle.update(|tree| {
            let label = tree.new_text("async");
            tree.attach(tree.root(), label).map(|()| label)
        })
    })
    .await
    .unwrap()
    .unwrap();

    let session = tokio::task::spawn_blocking(move || {
        session.run(&mut Panels::default()).map(|()| session)
    })
    .await
    .unwrap()
    .unwrap();
    assert!(session.tree().is_live(label));
    assert_eq!(session.surface().finalize_count(), 1);
}
