use crate::geometry::Bounds;
use crate::surface::{Surface, SurfaceError};
use ratatui::style::Style;
use super::Canvas;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cells reserved on every side of a text component for border/padding.
pub const TEXT_INSET: u16 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    /// Stretch inter-word gaps so multi-word lines fill the width exactly.
    Justify,
}

/// Word-wrapped, aligned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    pub content: String,
    pub alignment: TextAlignment,
    pub word_wrap: bool,
}

impl TextSpec {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            alignment: TextAlignment::Left,
            word_wrap: true,
        }
    }

    pub fn alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn word_wrap(mut self, word_wrap: bool) -> Self {
        self.word_wrap = word_wrap;
        self
    }

    /// Lines as they will appear in a content area `width` cells wide,
    /// before vertical clipping.
    pub fn layout_lines(&self, width: u16) -> Vec<String> {
        let width = usize::from(width);
        if width == 0 {
            return Vec::new();
        }
        let lines = if self.word_wrap {
            wrap_words(&self.content, width)
        } else {
            let words: Vec<&str> = self.content.split_whitespace().collect();
            if words.is_empty() {
                Vec::new()
            } else {
                vec![words]
            }
        };
        lines
            .iter()
            .map(|words| render_line(words, self.alignment, width))
            .collect()
    }

    pub(crate) fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut Canvas<'_, S>,
        bounds: Bounds,
        style: Style,
    ) -> Result<(), SurfaceError> {
        let inset = TEXT_INSET * 2;
        let allowed_width = bounds.width.saturating_sub(inset);
        let allowed_height = bounds.height.saturating_sub(inset);
        let left = bounds.x + i32::from(TEXT_INSET);
        let top = bounds.y + i32::from(TEXT_INSET);

        for row in 0..allowed_height {
            for col in 0..allowed_width {
                surface.put(left + i32::from(col), top + i32::from(row), ' ', style)?;
            }
        }

        let lines = self.layout_lines(allowed_width);
        for (row, line) in lines.iter().take(usize::from(allowed_height)).enumerate() {
            let y = top + row as i32;
            let mut col = 0usize;
            for ch in line.chars() {
                let w = ch.width().unwrap_or(0);
                if w == 0 {
                    continue;
                }
                if col + w > usize::from(allowed_width) {
                    break;
                }
                surface.put(left + col as i32, y, ch, style)?;
                col += w;
            }
        }
        Ok(())
    }
}

/// Greedily pack whitespace-separated words into lines at most `width`
/// cells wide.
///
/// A word joins the current line when the line plus one separating space
/// plus the word still fits. Words wider than `width` are split into
/// `width`-cell chunks.
pub fn wrap_words(content: &str, width: usize) -> Vec<Vec<&str>> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    let mut current: Vec<&str> = Vec::new();
    let mut current_width = 0usize;

    for word in content.split_whitespace().flat_map(|w| split_wide(w, width)) {
        let word_width = word.width();
        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + 1 + word_width
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push(word);
            current_width = word_width;
        } else {
            current.push(word);
            current_width = needed;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a single word into pieces no wider than `width` cells.
///
/// A glyph that is wider than `width` on its own can never be shown and is
/// dropped.
fn split_wide(word: &str, width: usize) -> Vec<&str> {
    if word.width() <= width {
        return vec![word];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, ch) in word.char_indices() {
        let end = idx + ch.len_utf8();
        if word[start..end].width() <= width {
            continue;
        }
        if idx > start {
            pieces.push(&word[start..idx]);
            start = idx;
        }
        if word[start..end].width() > width {
            start = end;
        }
    }
    if start < word.len() {
        pieces.push(&word[start..]);
    }
    pieces
}

/// Render one wrapped line against `width` cells.
///
/// Left leaves the line unpadded; Right and Center pad with spaces (an odd
/// remainder goes after the text when centering); Justify spreads the spare
/// cells over the gaps round-robin starting from the first gap, and leaves
/// single-word lines unpadded.
pub fn render_line(words: &[&str], alignment: TextAlignment, width: usize) -> String {
    if words.is_empty() {
        return String::new();
    }
    let joined = words.join(" ");
    let spare = width.saturating_sub(joined.width());
    match alignment {
        TextAlignment::Left => joined,
        TextAlignment::Right => format!("{}{joined}", " ".repeat(spare)),
        TextAlignment::Center => {
            let before = spare / 2;
            let after = spare - before;
            format!("{}{joined}{}", " ".repeat(before), " ".repeat(after))
        }
        TextAlignment::Justify => {
            if words.len() == 1 {
                return joined;
            }
            let gaps = words.len() - 1;
            let mut out = String::with_capacity(width.max(joined.len()));
            for (i, word) in words.iter().enumerate() {
                out.push_str(word);
                if i < gaps {
                    let extra = spare / gaps + usize::from(i < spare % gaps);
                    out.push_str(&" ".repeat(1 + extra));
                }
            }
            out
        }
    }
}
