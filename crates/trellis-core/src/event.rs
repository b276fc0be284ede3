use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};

/// Events delivered by a [`Surface`](crate::surface::Surface) to the session
/// loop.
///
/// Terminal variants wrap the corresponding [`crossterm::event::Event`]
/// payload, so key codes and modifiers can be matched with the full
/// crossterm API. [`Wake`](SurfaceEvent::Wake) is never produced by the
/// terminal itself: it is posted by a
/// [`SessionHandle`](crate::session::SessionHandle) after a background
/// mutation so the loop draws another frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Terminal window gained focus.
    FocusGained,
    /// Terminal window lost focus.
    FocusLost,
    /// Bracketed paste content.
    Paste(String),
    /// Posted from outside the loop to request a frame.
    Wake,
}

impl SurfaceEvent {
    /// Keys that end the session: Escape and Ctrl+C.
    pub fn is_quit_key(&self) -> bool {
        match self {
            SurfaceEvent::Key(key) => is_quit_key(key),
            _ => false,
        }
    }
}

/// Escape, or Ctrl+C (which arrives as a key press in raw mode).
pub fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Whether a key event is a press (or a repeat), not a release.
pub fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}

impl From<crossterm::event::Event> for SurfaceEvent {
    fn from(event: crossterm::event::Event) -> Self {
        match event {
            crossterm::event::Event::Key(k) => SurfaceEvent::Key(k),
            crossterm::event::Event::Mouse(m) => SurfaceEvent::Mouse(m),
            crossterm::event::Event::Resize(w, h) => SurfaceEvent::Resize(w, h),
            crossterm::event::Event::FocusGained => SurfaceEvent::FocusGained,
            crossterm::event::Event::FocusLost => SurfaceEvent::FocusLost,
            crossterm::event::Event::Paste(s) => SurfaceEvent::Paste(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_and_ctrl_c_quit() {
        let esc = SurfaceEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let ctrl_c = SurfaceEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let plain_c = SurfaceEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(esc.is_quit_key());
        assert!(ctrl_c.is_quit_key());
        assert!(!plain_c.is_quit_key());
        assert!(!SurfaceEvent::Resize(80, 24).is_quit_key());
    }

    #[test]
    fn converts_crossterm_resize() {
        let ev = SurfaceEvent::from(crossterm::event::Event::Resize(100, 40));
        assert_eq!(ev, SurfaceEvent::Resize(100, 40));
    }

    #[test]
    fn release_is_not_a_press() {
        let mut key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert!(is_press(&key));
        key.kind = KeyEventKind::Release;
        assert!(!is_press(&key));
    }
}
