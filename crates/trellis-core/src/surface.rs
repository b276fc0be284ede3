//! The screen surface: a cell-addressable terminal plus its event source.
//!
//! [`Surface`] is the capability set the rest of the crate draws through.
//! [`TerminalSurface`] implements it on a real terminal with crossterm; the
//! headless [`TestSurface`](crate::testing::TestSurface) implements it for
//! tests.

use crate::event::SurfaceEvent;
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

/// How often the input thread wakes up to check for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised by a [`Surface`].
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// An I/O error from terminal setup, output, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A cell outside the surface was addressed.
    #[error("cell ({x}, {y}) is outside the surface")]
    OutOfBounds { x: i32, y: i32 },
    /// The event source has shut down; no further events will arrive.
    #[error("surface event source closed")]
    Closed,
}

/// Capability set the core needs from a terminal.
///
/// Construction is initialization; [`finalize`](Surface::finalize) restores
/// the terminal and must be safe to call more than once.
pub trait Surface {
    /// Current size as (columns, rows).
    fn size(&self) -> (u16, u16);

    /// Blank every cell.
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Write one styled character at an absolute cell.
    fn put(&mut self, x: i32, y: i32, ch: char, style: Style) -> Result<(), SurfaceError>;

    /// Push buffered changes to the terminal.
    fn flush(&mut self) -> Result<(), SurfaceError>;

    fn enable_mouse(&mut self) -> Result<(), SurfaceError>;

    fn enable_paste(&mut self) -> Result<(), SurfaceError>;

    /// Re-synchronize with the terminal after a resize.
    fn sync(&mut self) -> Result<(), SurfaceError>;

    /// Block until the next event arrives.
    fn next_event(&mut self) -> Result<SurfaceEvent, SurfaceError>;

    /// A sender other threads can use to inject events, if supported.
    fn poster(&self) -> Option<EventPoster> {
        None
    }

    /// Restore the terminal. Idempotent.
    fn finalize(&mut self) -> Result<(), SurfaceError>;
}

/// Cloneable, `Send` handle that injects events into a surface's queue.
///
/// A poster does not keep the queue open: once the surface and its input
/// source are gone, posting fails.
#[derive(Debug, Clone)]
pub struct EventPoster {
    tx: mpsc::WeakUnboundedSender<SurfaceEvent>,
}

impl EventPoster {
    pub fn new(tx: mpsc::WeakUnboundedSender<SurfaceEvent>) -> Self {
        Self { tx }
    }

    /// Enqueue an event. Returns `false` if the surface is gone.
    pub fn post(&self, event: SurfaceEvent) -> bool {
        self.tx.upgrade().is_some_and(|tx| tx.send(event).is_ok())
    }
}

/// Where the input thread leaves the error that stopped it.
type InputFailure = Arc<Mutex<Option<io::Error>>>;

/// Output target for the terminal UI.
///
/// By default the UI renders to **stdout**.  When your program's stdout is
/// piped (e.g. to capture structured output), switch to [`Stderr`](OutputTarget::Stderr)
/// so the UI goes to the terminal while data flows through the pipe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout (default).
    #[default]
    Stdout,
    /// Write to stderr (useful when stdout is piped).
    Stderr,
}

/// Writer that wraps either stdout or stderr.
enum Output {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

impl Output {
    fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

/// Configuration for a [`TerminalSurface`].
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    /// Render in the alternate screen (default: true).
    pub alt_screen: bool,
    /// Output target: stdout (default) or stderr.
    pub output: OutputTarget,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            alt_screen: true,
            output: OutputTarget::default(),
        }
    }
}

/// A [`Surface`] on the real terminal.
///
/// Draw specs paint into a persistent back buffer; [`flush`](Surface::flush)
/// diffs it against a copy of what the terminal currently shows and writes
/// only the changed cells. Input is read on a background thread and queued,
/// so [`EventPoster`]s can interleave their own events.
///
/// The terminal is restored by [`finalize`](Surface::finalize) or, at the
/// latest, when the surface is dropped, whichever comes first.
///
/// [`next_event`](Surface::next_event) blocks the calling thread and panics
/// when called from async code on a tokio runtime. Drive a session on a
/// plain thread, or move it into `tokio::task::spawn_blocking`.
pub struct TerminalSurface {
    backend: CrosstermBackend<Output>,
    back: Buffer,
    front: Buffer,
    size: (u16, u16),
    options: SurfaceOptions,
    events: mpsc::UnboundedReceiver<SurfaceEvent>,
    poster: mpsc::WeakUnboundedSender<SurfaceEvent>,
    failure: InputFailure,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    mouse_enabled: bool,
    paste_enabled: bool,
    finalized: bool,
}

impl TerminalSurface {
    /// Put the terminal into raw mode (and the alternate screen) and start
    /// reading input.
    ///
    /// Fails before touching terminal modes when there is no terminal to
    /// query; if a later step fails, whatever was already enabled is undone.
    pub fn new(options: SurfaceOptions) -> Result<Self, SurfaceError> {
        let size = crossterm::terminal::size()?;

        enable_raw_mode()?;
        let mut writer = Output::new(options.output);
        let entered = if options.alt_screen {
            execute!(writer, EnterAlternateScreen, cursor::Hide)
        } else {
            execute!(writer, cursor::Hide)
        };
        if let Err(err) = entered {
            let _ = restore_terminal(&options, false, false);
            return Err(err.into());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let poster = tx.downgrade();
        let shutdown = Arc::new(AtomicBool::new(false));
        let failure = InputFailure::default();
        let reader = match spawn_reader(tx, shutdown.clone(), failure.clone()) {
            Ok(handle) => handle,
            Err(err) => {
                let _ = restore_terminal(&options, false, false);
                return Err(err.into());
            }
        };

        let area = Rect::new(0, 0, size.0, size.1);
        tracing::debug!(columns = size.0, rows = size.1, "terminal surface initialized");
        Ok(Self {
            backend: CrosstermBackend::new(writer),
            back: Buffer::empty(area),
            front: Buffer::empty(area),
            size,
            options,
            events: rx,
            poster,
            failure,
            shutdown,
            reader: Some(reader),
            mouse_enabled: false,
            paste_enabled: false,
            finalized: false,
        })
    }

    fn area(&self) -> Rect {
        Rect::new(0, 0, self.size.0, self.size.1)
    }

    fn writer(&self) -> Output {
        Output::new(self.options.output)
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        let area = self.area();
        self.back = Buffer::empty(area);
        self.front = Buffer::empty(area);
        self.backend.clear()?;
        Ok(())
    }

    fn put(&mut self, x: i32, y: i32, ch: char, style: Style) -> Result<(), SurfaceError> {
        let (Ok(cx), Ok(cy)) = (u16::try_from(x), u16::try_from(y)) else {
            return Err(SurfaceError::OutOfBounds { x, y });
        };
        match self.back.cell_mut((cx, cy)) {
            Some(cell) => {
                cell.set_char(ch).set_style(style);
                Ok(())
            }
            None => Err(SurfaceError::OutOfBounds { x, y }),
        }
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        let updates = self.front.diff(&self.back);
        if !updates.is_empty() {
            self.backend.draw(updates.into_iter())?;
        }
        Backend::flush(&mut self.backend)?;
        self.front = self.back.clone();
        Ok(())
    }

    fn enable_mouse(&mut self) -> Result<(), SurfaceError> {
        let mut writer = self.writer();
        execute!(writer, EnableMouseCapture)?;
        self.mouse_enabled = true;
        Ok(())
    }

    fn enable_paste(&mut self) -> Result<(), SurfaceError> {
        let mut writer = self.writer();
        execute!(writer, EnableBracketedPaste)?;
        self.paste_enabled = true;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SurfaceError> {
        self.size = crossterm::terminal::size()?;
        let area = self.area();
        let mut back = Buffer::empty(area);
        let keep_w = area.width.min(self.back.area.width);
        let keep_h = area.height.min(self.back.area.height);
        for y in 0..keep_h {
            for x in 0..keep_w {
                back[(x, y)] = self.back[(x, y)].clone();
            }
        }
        self.back = back;
        // The terminal is blank after this; diffing against a blank front
        // re-emits everything that is not blank.
        self.front = Buffer::empty(area);
        self.backend.clear()?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<SurfaceEvent, SurfaceError> {
        let event = receive(&mut self.events, &self.failure)?;
        if let SurfaceEvent::Resize(w, h) = event {
            self.size = (w, h);
        }
        Ok(event)
    }

    fn poster(&self) -> Option<EventPoster> {
        Some(EventPoster::new(self.poster.clone()))
    }

    fn finalize(&mut self) -> Result<(), SurfaceError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.shutdown.store(true, Ordering::SeqCst);
        let restored = restore_terminal(&self.options, self.mouse_enabled, self.paste_enabled);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        tracing::debug!("terminal surface finalized");
        restored.map_err(SurfaceError::from)
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

fn spawn_reader(
    tx: mpsc::UnboundedSender<SurfaceEvent>,
    shutdown: Arc<AtomicBool>,
    failure: InputFailure,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("trellis-input".into())
        .spawn(move || {
            pump_input(tx, &shutdown, &failure, |timeout| {
                if crossterm::event::poll(timeout)? {
                    crossterm::event::read().map(Some)
                } else {
                    Ok(None)
                }
            });
        })
}

/// Forward terminal input into the queue until shutdown or a read error.
///
/// A read error is stored in `failure` before the sender is dropped, so the
/// receiving side sees it once the queue drains.
fn pump_input(
    tx: mpsc::UnboundedSender<SurfaceEvent>,
    shutdown: &AtomicBool,
    failure: &Mutex<Option<io::Error>>,
    mut read: impl FnMut(Duration) -> io::Result<Option<crossterm::event::Event>>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match read(POLL_INTERVAL) {
            Ok(None) => {}
            Ok(Some(event)) => {
                if tx.send(SurfaceEvent::from(event)).is_err() {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "terminal input failed");
                *failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
                return;
            }
        }
    }
}

/// Block for the next queued event.
///
/// When the queue has closed, the input thread's error is reported if it
/// left one; otherwise the source simply ended.
fn receive(
    events: &mut mpsc::UnboundedReceiver<SurfaceEvent>,
    failure: &Mutex<Option<io::Error>>,
) -> Result<SurfaceEvent, SurfaceError> {
    if let Some(event) = events.blocking_recv() {
        return Ok(event);
    }
    match failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
        Some(err) => Err(SurfaceError::Io(err)),
        None => Err(SurfaceError::Closed),
    }
}

fn restore_terminal(
    options: &SurfaceOptions,
    mouse_enabled: bool,
    paste_enabled: bool,
) -> Result<(), io::Error> {
    // Best-effort cleanup: continue even if individual steps fail, so as
    // much terminal state as possible is restored.
    let r1 = disable_raw_mode();
    let mut writer = Output::new(options.output);
    if paste_enabled {
        execute!(writer, DisableBracketedPaste).ok();
    }
    if mouse_enabled {
        execute!(writer, DisableMouseCapture).ok();
    }
    execute!(writer, cursor::Show).ok();
    if options.alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    r1
}
