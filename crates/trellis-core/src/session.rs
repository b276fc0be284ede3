//! The session: owns the surface and the component tree and runs the
//! blocking frame/event loop.
//!
//! Each iteration draws a frame (pending layout first, then the dirty
//! components), blocks for the next surface event and dispatches it. The
//! tree sits behind one coarse lock so a [`SessionHandle`] can mutate it
//! from other threads between frames.

use crate::component::{ComponentId, LayoutMode, SizeConstraints, Weight};
use crate::draw::BorderStyle;
use crate::event::{is_press, is_quit_key, SurfaceEvent};
use crate::geometry::Geometry;
use crate::layout::update_geometry;
use crate::scheduler::{draw_frame, FrameReport};
use crate::surface::{EventPoster, Surface, SurfaceError};
use crate::tree::{PendingLayout, Tree, TreeError};
use crossterm::event::KeyEvent;
use ratatui::style::{Color, Style};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Errors that end a session or prevent it from starting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("component tree error: {0}")]
    Tree(#[from] TreeError),
    /// An I/O error outside the surface, e.g. opening the log file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminating,
}

/// Configuration for a [`Session`].
///
/// All fields have defaults (see the [`Default`] impl). Use struct update
/// syntax to override only what you need:
///
/// ```rust,ignore
/// let config = SessionConfig {
///     root_layout: LayoutMode::HorizontalGrid,
///     root_padding: 1,
///     ..SessionConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How the root arranges its children (default: `Fill`).
    pub root_layout: LayoutMode,
    /// Root padding in cells (default: 0).
    pub root_padding: u16,
    /// Style given to every new component (default: white on the terminal
    /// background).
    pub default_style: Style,
    /// Enable mouse capture (default: true).
    pub mouse_capture: bool,
    /// Enable bracketed paste (default: true).
    pub bracketed_paste: bool,
    /// Log file path; when set, `tracing` output is sent there.
    pub log_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_layout: LayoutMode::Fill,
            root_padding: 0,
            default_style: Style::default().fg(Color::White).bg(Color::Reset),
            mouse_capture: true,
            bracketed_paste: true,
            log_file: None,
        }
    }
}

/// Application hooks driven by [`Session::run`].
pub trait Dashboard {
    /// Create the initial component tree under `tree.root()`.
    fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError>;

    /// Handle a key press that is not a quit key.
    ///
    /// An error is logged and the session keeps running.
    fn on_key(&mut self, key: KeyEvent, tree: &mut Tree) -> Result<(), TreeError>;

    /// Handle mouse, paste and focus events.
    fn on_event(&mut self, event: &SurfaceEvent, tree: &mut Tree) -> Result<(), TreeError> {
        let _ = (event, tree);
        Ok(())
    }
}

fn lock(tree: &Mutex<Tree>) -> MutexGuard<'_, Tree> {
    tree.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A cloneable handle to a [`Session`] for use from other threads or tasks.
///
/// Mutations made through [`update`](SessionHandle::update) run under the
/// session lock and wake the loop so they are drawn without waiting for
/// input.
#[derive(Clone)]
pub struct SessionHandle {
    tree: Arc<Mutex<Tree>>,
    poster: Option<EventPoster>,
    quit: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Run `f` on the tree under the session lock, then request a frame.
    pub fn update<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let result = f(&mut lock(&self.tree));
        self.wake();
        result
    }

    /// Ask the loop to draw a frame. Returns `false` if the session is gone
    /// or its surface cannot take posted events.
    pub fn wake(&self) -> bool {
        self.poster
            .as_ref()
            .is_some_and(|p| p.post(SurfaceEvent::Wake))
    }

    /// Ask the session to terminate after the current event.
    pub fn quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
        self.wake();
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

/// A dashboard session bound to one surface.
///
/// The surface is finalized when the session stops running, on every exit
/// path: a quit key, a closed event source, an error out of
/// [`run`](Session::run), or dropping the session.
///
/// # Example
///
/// ```rust,ignore
/// let surface = TerminalSurface::new(SurfaceOptions::default())?;
/// let mut session = Session::new(surface, SessionConfig::default())?;
/// session.run(&mut MyDashboard::default())?;
/// ```
pub struct Session<S: Surface> {
    surface: S,
    tree: Arc<Mutex<Tree>>,
    state: SessionState,
    quit: Arc<AtomicBool>,
    finalized: bool,
}

impl<S: Surface> Session<S> {
    /// Bind a session to `surface`.
    ///
    /// If setup fails, the surface is finalized before the error is
    /// returned.
    pub fn new(mut surface: S, config: SessionConfig) -> Result<Self, SessionError> {
        if let Err(err) = Self::setup(&mut surface, &config) {
            let _ = surface.finalize();
            return Err(err);
        }
        let tree = Tree::new(config.root_layout, config.root_padding, config.default_style);
        let (columns, rows) = surface.size();
        tracing::info!(columns, rows, "session started");
        Ok(Self {
            surface,
            tree: Arc::new(Mutex::new(tree)),
            state: SessionState::Running,
            quit: Arc::new(AtomicBool::new(false)),
            finalized: false,
        })
    }

    fn setup(surface: &mut S, config: &SessionConfig) -> Result<(), SessionError> {
        if let Some(path) = &config.log_file {
            crate::logging::log_to_file(path)?;
        }
        if config.mouse_capture {
            surface.enable_mouse()?;
        }
        if config.bracketed_paste {
            surface.enable_paste()?;
        }
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tree: self.tree.clone(),
            poster: self.surface.poster(),
            quit: self.quit.clone(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Lock and borrow the tree.
    pub fn tree(&self) -> MutexGuard<'_, Tree> {
        lock(&self.tree)
    }

    pub fn new_box(&self, border: BorderStyle) -> ComponentId {
        self.tree().new_box(border)
    }

    pub fn new_text(&self, content: impl Into<String>) -> ComponentId {
        self.tree().new_text(content)
    }

    pub fn attach(&self, parent: ComponentId, child: ComponentId) -> Result<(), TreeError> {
        self.tree().attach(parent, child)
    }

    pub fn detach(&self, id: ComponentId) -> Result<ComponentId, TreeError> {
        self.tree().detach(id)
    }

    pub fn set_geometry(&self, id: ComponentId, geometry: Geometry) -> Result<bool, TreeError> {
        self.tree().set_geometry(id, geometry)
    }

    pub fn set_style(&self, id: ComponentId, style: Style) -> Result<(), TreeError> {
        self.tree().set_style(id, style)
    }

    pub fn set_constraints(
        &self,
        id: ComponentId,
        constraints: SizeConstraints,
    ) -> Result<(), TreeError> {
        self.tree().set_constraints(id, constraints)
    }

    pub fn set_weight(&self, id: ComponentId, weight: Weight) -> Result<(), TreeError> {
        self.tree().set_weight(id, weight)
    }

    /// Request termination. The loop stops before the next frame.
    pub fn terminate(&mut self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    /// Build the tree and run the loop until a quit key, a quit request or
    /// the end of the event source. Blocks the calling thread.
    ///
    /// The surface is finalized before this returns, whatever the outcome.
    ///
    /// Do not call this from async code: a [`TerminalSurface`] blocks on its
    /// event queue and tokio panics if that happens on a runtime thread. From
    /// inside a runtime, move the session into `tokio::task::spawn_blocking`
    /// and talk to it through a [`SessionHandle`].
    ///
    /// [`TerminalSurface`]: crate::surface::TerminalSurface
    pub fn run(&mut self, dashboard: &mut impl Dashboard) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Ok(());
        }
        let result = self.build(dashboard).and_then(|()| self.event_loop(dashboard));
        if let Err(err) = &result {
            tracing::error!(error = %err, "session failed");
        }
        let finalized = self.finish();
        result?;
        finalized.map_err(SessionError::from)
    }

    fn build(&mut self, dashboard: &mut impl Dashboard) -> Result<(), SessionError> {
        self.surface.clear()?;
        let mut tree = lock(&self.tree);
        dashboard.build(&mut tree)?;
        tree.request_full_layout();
        tree.mark_all_dirty();
        Ok(())
    }

    fn event_loop(&mut self, dashboard: &mut impl Dashboard) -> Result<(), SessionError> {
        while self.state == SessionState::Running {
            if self.quit.load(Ordering::SeqCst) {
                self.state = SessionState::Terminating;
                break;
            }
            self.frame()?;
            let event = match self.surface.next_event() {
                Ok(event) => event,
                Err(SurfaceError::Closed) => {
                    tracing::info!("event source closed");
                    self.state = SessionState::Terminating;
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            self.dispatch(event, dashboard)?;
        }
        Ok(())
    }

    /// Run pending layout, then paint and flush one frame.
    pub fn frame(&mut self) -> Result<FrameReport, SessionError> {
        let mut tree = lock(&self.tree);
        let size = self.surface.size();
        match tree.take_pending_layout() {
            PendingLayout::None => {}
            PendingLayout::Full => update_geometry(&mut tree, size, None),
            PendingLayout::Scopes(scopes) => {
                for scope in scopes {
                    update_geometry(&mut tree, size, Some(scope));
                }
            }
        }
        Ok(draw_frame(&mut tree, &mut self.surface)?)
    }

    fn dispatch(
        &mut self,
        event: SurfaceEvent,
        dashboard: &mut impl Dashboard,
    ) -> Result<(), SessionError> {
        let mut tree = lock(&self.tree);
        match event {
            SurfaceEvent::Resize(columns, rows) => {
                tracing::debug!(columns, rows, "resized");
                self.surface.sync()?;
                tree.request_full_layout();
                tree.mark_all_dirty();
            }
            SurfaceEvent::Key(key) if !is_press(&key) => {}
            SurfaceEvent::Key(key) if is_quit_key(&key) => {
                self.state = SessionState::Terminating;
            }
            SurfaceEvent::Key(key) => {
                if let Err(err) = dashboard.on_key(key, &mut tree) {
                    tracing::warn!(error = %err, ?key, "key handler failed");
                }
            }
            SurfaceEvent::Wake => {}
            other => {
                if let Err(err) = dashboard.on_event(&other, &mut tree) {
                    tracing::warn!(error = %err, "event handler failed");
                }
            }
        }
        Ok(())
    }

    /// Leave the running state and finalize the surface, once.
    fn finish(&mut self) -> Result<(), SurfaceError> {
        self.state = SessionState::Terminating;
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        tracing::info!("session stopped");
        self.surface.finalize()
    }
}

impl<S: Surface> Drop for Session<S> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
