use crate::event::SurfaceEvent;
use crate::surface::{EventPoster, Surface, SurfaceError};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::collections::VecDeque;
use std::io;
use tokio::sync::mpsc;

/// A headless [`Surface`] backed by an in-memory ratatui [`Buffer`].
///
/// `TestSurface` lets you drive a whole session in a plain `#[test]`
/// function, with no terminal and no tokio runtime. Events are scripted up
/// front with [`push_event`](TestSurface::push_event); events posted through
/// [`poster`](Surface::poster) are delivered first. Once both queues are
/// empty, [`next_event`](Surface::next_event) reports
/// [`SurfaceError::Closed`], which ends a session loop normally.
///
/// # Example
///
/// ```rust,ignore
/// use trellis_core::testing::TestSurface;
///
/// let mut surface = TestSurface::new(20, 5)
///     .with_events([SurfaceEvent::Resize(30, 6)]);
/// let mut session = Session::new(surface, SessionConfig::default())?;
/// session.run(&mut MyDashboard)?;
/// assert!(session.surface().row(0).starts_with("┌"));
/// ```
#[derive(Debug)]
pub struct TestSurface {
    buffer: Buffer,
    scripted: VecDeque<SurfaceEvent>,
    posted: mpsc::UnboundedReceiver<SurfaceEvent>,
    tx: mpsc::UnboundedSender<SurfaceEvent>,
    faulty_cell: Option<(i32, i32)>,
    event_failure: Option<io::ErrorKind>,
    put_count: usize,
    flush_count: usize,
    sync_count: usize,
    finalize_count: usize,
    mouse_enabled: bool,
    paste_enabled: bool,
}

impl TestSurface {
    /// A blank `width`×`height` surface with no scripted events.
    pub fn new(width: u16, height: u16) -> Self {
        let (tx, posted) = mpsc::unbounded_channel();
        Self {
            buffer: Buffer::empty(Rect::new(0, 0, width, height)),
            scripted: VecDeque::new(),
            posted,
            tx,
            faulty_cell: None,
            event_failure: None,
            put_count: 0,
            flush_count: 0,
            sync_count: 0,
            finalize_count: 0,
            mouse_enabled: false,
            paste_enabled: false,
        }
    }

    /// Script events to be returned, in order, by `next_event`.
    pub fn with_events(mut self, events: impl IntoIterator<Item = SurfaceEvent>) -> Self {
        self.scripted.extend(events);
        self
    }

    pub fn push_event(&mut self, event: SurfaceEvent) {
        self.scripted.push_back(event);
    }

    /// Make every `put` at `(x, y)` fail, to exercise draw-fault handling.
    pub fn with_faulty_cell(mut self, x: i32, y: i32) -> Self {
        self.faulty_cell = Some((x, y));
        self
    }

    /// Fail the event source with an I/O error of `kind` once the scripted
    /// events run out. The failure is reported once; after that the source
    /// is closed.
    pub fn with_event_failure(mut self, kind: io::ErrorKind) -> Self {
        self.event_failure = Some(kind);
        self
    }

    /// The raw buffer, for cell-by-cell inspection (styles included).
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Symbol at `(x, y)`, or `None` outside the surface.
    pub fn symbol(&self, x: u16, y: u16) -> Option<&str> {
        self.buffer.cell((x, y)).map(|cell| cell.symbol())
    }

    /// Style at `(x, y)`, or `None` outside the surface.
    pub fn style(&self, x: u16, y: u16) -> Option<Style> {
        self.buffer.cell((x, y)).map(|cell| cell.style())
    }

    /// One row as a string; empty when `y` is off the surface.
    pub fn row(&self, y: u16) -> String {
        let area = self.buffer.area;
        if y >= area.height {
            return String::new();
        }
        (0..area.width)
            .filter_map(|x| self.buffer.cell((x, y)))
            .map(|cell| cell.symbol())
            .collect()
    }

    /// The whole surface as text.
    ///
    /// Rows are separated by newlines. Trailing whitespace within each row
    /// is preserved.
    pub fn render_string(&self) -> String {
        (0..self.buffer.area.height)
            .map(|y| self.row(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.put_count
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn sync_count(&self) -> usize {
        self.sync_count
    }

    pub fn finalize_count(&self) -> usize {
        self.finalize_count
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    pub fn paste_enabled(&self) -> bool {
        self.paste_enabled
    }

    /// Resize the buffer, keeping the cells that still fit.
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut next = Buffer::empty(Rect::new(0, 0, width, height));
        let keep_w = width.min(self.buffer.area.width);
        let keep_h = height.min(self.buffer.area.height);
        for y in 0..keep_h {
            for x in 0..keep_w {
                next[(x, y)] = self.buffer[(x, y)].clone();
            }
        }
        self.buffer = next;
    }
}

impl Surface for TestSurface {
    fn size(&self) -> (u16, u16) {
        (self.buffer.area.width, self.buffer.area.height)
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.buffer.reset();
        Ok(())
    }

    fn put(&mut self, x: i32, y: i32, ch: char, style: Style) -> Result<(), SurfaceError> {
        if self.faulty_cell == Some((x, y)) {
            return Err(SurfaceError::OutOfBounds { x, y });
        }
        let (Ok(cx), Ok(cy)) = (u16::try_from(x), u16::try_from(y)) else {
            return Err(SurfaceError::OutOfBounds { x, y });
        };
        let cell = self
            .buffer
            .cell_mut((cx, cy))
            .ok_or(SurfaceError::OutOfBounds { x, y })?;
        cell.set_char(ch).set_style(style);
        self.put_count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        self.flush_count += 1;
        Ok(())
    }

    fn enable_mouse(&mut self) -> Result<(), SurfaceError> {
        self.mouse_enabled = true;
        Ok(())
    }

    fn enable_paste(&mut self) -> Result<(), SurfaceError> {
        self.paste_enabled = true;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SurfaceError> {
        self.sync_count += 1;
        Ok(())
    }

    fn next_event(&mut self) -> Result<SurfaceEvent, SurfaceError> {
        let event = match self.posted.try_recv() {
            Ok(event) => event,
            Err(_) => match self.scripted.pop_front() {
                Some(event) => event,
                None => {
                    return Err(match self.event_failure.take() {
                        Some(kind) => io::Error::new(kind, "scripted input failure").into(),
                        None => SurfaceError::Closed,
                    });
                }
            },
        };
        if let SurfaceEvent::Resize(w, h) = event {
            self.resize(w, h);
        }
        Ok(event)
    }

    fn poster(&self) -> Option<EventPoster> {
        Some(EventPoster::new(self.tx.downgrade()))
    }

    fn finalize(&mut self) -> Result<(), SurfaceError> {
        self.finalize_count += 1;
        Ok(())
    }
}
