use crate::geometry::Bounds;
use crate::surface::{Surface, SurfaceError};
use ratatui::style::Style;
use super::Canvas;

/// Line-drawing set used for a box outline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    #[default]
    None,
    Plain,
    Thick,
    Rounded,
    Double,
}

/// The six glyphs that make up a box outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub horizontal: char,
    pub vertical: char,
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
}

impl BorderStyle {
    pub fn glyphs(self) -> Option<BorderGlyphs> {
        let glyphs = match self {
            BorderStyle::None => return None,
            BorderStyle::Plain => BorderGlyphs {
                horizontal: '─',
                vertical: '│',
                top_left: '┌',
                top_right: '┐',
                bottom_left: '└',
                bottom_right: '┘',
            },
            BorderStyle::Thick => BorderGlyphs {
                horizontal: '━',
                vertical: '┃',
                top_left: '┏',
                top_right: '┓',
                bottom_left: '┗',
                bottom_right: '┛',
            },
            BorderStyle::Rounded => BorderGlyphs {
                horizontal: '─',
                vertical: '│',
                top_left: '╭',
                top_right: '╮',
                bottom_left: '╰',
                bottom_right: '╯',
            },
            BorderStyle::Double => BorderGlyphs {
                horizontal: '═',
                vertical: '║',
                top_left: '╔',
                top_right: '╗',
                bottom_left: '╚',
                bottom_right: '╝',
            },
        };
        Some(glyphs)
    }
}

/// A filled rectangle with an optional outline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoxSpec {
    pub border: BorderStyle,
}

impl BoxSpec {
    pub fn new(border: BorderStyle) -> Self {
        Self { border }
    }

    /// Glyph for the cell at `(col, row)` inside a `width`×`height` box.
    ///
    /// Corners win over edges; interior cells are blank.
    pub fn glyph_at(&self, col: u16, row: u16, width: u16, height: u16) -> char {
        let Some(g) = self.border.glyphs() else {
            return ' ';
        };
        let last_col = width.saturating_sub(1);
        let last_row = height.saturating_sub(1);
        match (col, row) {
            (0, 0) => g.top_left,
            (c, 0) if c == last_col => g.top_right,
            (0, r) if r == last_row => g.bottom_left,
            (c, r) if c == last_col && r == last_row => g.bottom_right,
            (_, r) if r == 0 || r == last_row => g.horizontal,
            (c, _) if c == 0 || c == last_col => g.vertical,
            _ => ' ',
        }
    }

    pub(crate) fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut Canvas<'_, S>,
        bounds: Bounds,
        style: Style,
    ) -> Result<(), SurfaceError> {
        for row in 0..bounds.height {
            for col in 0..bounds.width {
                surface.put(
                    bounds.x + i32::from(col),
                    bounds.y + i32::from(row),
                    self.glyph_at(col, row, bounds.width, bounds.height),
                    style,
                )?;
            }
        }
        Ok(())
    }
}
