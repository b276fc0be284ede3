//! Draw specs: how a component paints itself.
//!
//! The set of specs is closed, so a component carries a [`DrawSpec`] value
//! and the scheduler matches on it. Both specs paint only inside the
//! component's absolute rectangle.

mod border;
mod text;

pub use border::{BorderGlyphs, BorderStyle, BoxSpec};
pub use text::{render_line, wrap_words, TextAlignment, TextSpec, TEXT_INSET};

use crate::geometry::Bounds;
use crate::surface::{Surface, SurfaceError};
use ratatui::style::Style;

/// Rendering strategy attached to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawSpec {
    Box(BoxSpec),
    Text(TextSpec),
}

impl DrawSpec {
    /// Paint into `bounds` on `surface`.
    ///
    /// Cells that fall off the surface are skipped, so a component hanging
    /// over the screen edge paints its visible part.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        bounds: Bounds,
        style: Style,
    ) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(surface);
        match self {
            DrawSpec::Box(spec) => spec.draw(&mut canvas, bounds, style),
            DrawSpec::Text(spec) => spec.draw(&mut canvas, bounds, style),
        }
    }

    /// Whether painting covers every cell of the component's rectangle.
    ///
    /// Only opaque components can hide what lies beneath them.
    pub fn is_opaque(&self) -> bool {
        matches!(self, DrawSpec::Box(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrawSpec::Box(_) => "box",
            DrawSpec::Text(_) => "text",
        }
    }

    pub fn as_box(&self) -> Option<&BoxSpec> {
        match self {
            DrawSpec::Box(spec) => Some(spec),
            DrawSpec::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextSpec> {
        match self {
            DrawSpec::Text(spec) => Some(spec),
            DrawSpec::Box(_) => None,
        }
    }
}

/// A surface clipped to its own extent.
pub(crate) struct Canvas<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    clip: Bounds,
}

impl<'a, S: Surface + ?Sized> Canvas<'a, S> {
    pub(crate) fn new(surface: &'a mut S) -> Self {
        let (width, height) = surface.size();
        Self {
            surface,
            clip: Bounds::new(0, 0, width, height),
        }
    }

    pub(crate) fn put(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        style: Style,
    ) -> Result<(), SurfaceError> {
        if self.clip.contains_cell(x, y) {
            self.surface.put(x, y, ch, style)
        } else {
            Ok(())
        }
    }
}

impl From<BoxSpec> for DrawSpec {
    fn from(spec: BoxSpec) -> Self {
        DrawSpec::Box(spec)
    }
}

impl From<TextSpec> for DrawSpec {
    fn from(spec: TextSpec) -> Self {
        DrawSpec::Text(spec)
    }
}
