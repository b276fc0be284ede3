//! # Dashboard Demo
//!
//! Three panels on a horizontal grid, a vertical grid of five rows in the
//! middle panel, and a floating overlay:
//! - `Enter` toggles a rounded overlay with a text child
//! - `Left` / `Right` shrink or widen the first panel's minimum width
//! - `Esc` or `Ctrl+C` quits
//!
//! A tokio task rewrites the status line once per second through a
//! [`SessionHandle`], the way background work talks to a running session.
//!
//! Run with: `cargo run --example dashboard`

use std::time::Duration;
use trellis::crossterm::event::{KeyCode, KeyEvent};
use trellis::ratatui::style::{Color, Style};
use trellis::{
    BorderStyle, ComponentId, Dashboard, FloatPlacement, HorizontalAlignment, LayoutMode,
    Session, SessionConfig, SessionHandle, SizeConstraints, SurfaceOptions, TerminalSurface,
    TextAlignment, Tree, TreeError, VerticalAlignment, Weight,
};

const QUOTE: &str = "Everyone is a genius. But if you judge a fish by its ability to \
    climb a tree, it will live its whole life believing that it is stupid.";

/// Ids the key handler needs, plus the overlay toggle state.
struct Demo {
    handle: SessionHandle,
    runtime: tokio::runtime::Handle,
    left_panel: Option<ComponentId>,
    overlay: Option<ComponentId>,
}

fn style(fg: Color, bg: Color) -> Style {
    Style::default().fg(fg).bg(bg)
}

impl Demo {
    fn toggle_overlay(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
        if let Some(overlay) = self.overlay.take() {
            tree.delete(overlay)?;
            return Ok(());
        }
        let placement = FloatPlacement::new(30, 9)
            .align(HorizontalAlignment::Center, VerticalAlignment::Center);
        let overlay = tree.new_floating_box(placement, BorderStyle::Rounded);
        tree.set_style(overlay, style(Color::White, Color::Green))?;
        tree.set_padding(overlay, 2)?;
        let text = tree.new_text("Hello World");
        tree.set_style(text, style(Color::White, Color::Green))?;
        tree.set_alignment(text, TextAlignment::Center)?;
        tree.attach(overlay, text)?;
        tree.attach(tree.root(), overlay)?;
        self.overlay = Some(overlay);
        Ok(())
    }

    fn nudge_left_panel(&mut self, tree: &mut Tree, grow: bool) -> Result<(), TreeError> {
        let Some(panel) = self.left_panel else {
            return Ok(());
        };
        let step = |v: Option<u16>| {
            let v = v.unwrap_or(0);
            Some(if grow { v.saturating_add(1) } else { v.saturating_sub(1) })
        };
        tree.update_constraints(panel, |c| {
            c.min_width = step(c.min_width);
            c.max_width = c.max_width.and_then(|m| step(Some(m)));
        })?;
        Ok(())
    }
}

impl Dashboard for Demo {
    fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
        let root = tree.root();

        let left = tree.new_box(BorderStyle::Plain);
        tree.set_style(left, style(Color::White, Color::Green))?;
        tree.set_weight(left, Weight::width(50.0))?;
        tree.set_constraints(
            left,
            SizeConstraints {
                min_width: Some(80),
                ..SizeConstraints::default()
            },
        )?;
        let status = tree.new_text("starting...");
        tree.set_style(status, style(Color::White, Color::Green))?;
        tree.attach(left, status)?;

        let middle = tree.new_box(BorderStyle::None);
        tree.set_layout(middle, LayoutMode::VerticalGrid)?;
        tree.set_style(middle, style(Color::Red, Color::LightCyan))?;
        for i in 0..5 {
            let row = tree.new_box(BorderStyle::None);
            let (fg, bg) = if i % 2 == 0 {
                (Color::White, Color::Black)
            } else {
                (Color::Black, Color::White)
            };
            tree.set_style(row, style(fg, bg))?;
            match i {
                1 => {
                    let constraints = SizeConstraints {
                        min_height: Some(25),
                        ..Default::default()
                    };
                    tree.set_constraints(row, constraints)?;
                    tree.set_style(row, style(Color::Black, Color::Yellow))?;
                }
                2 => {
                    let quote = tree.new_text(QUOTE);
                    tree.set_style(quote, style(fg, bg))?;
                    tree.set_alignment(quote, TextAlignment::Justify)?;
                    tree.attach(row, quote)?;
                }
                3 => {
                    let constraints = SizeConstraints {
                        max_height: Some(2),
                        ..Default::default()
                    };
                    tree.set_constraints(row, constraints)?;
                    tree.set_style(row, style(Color::Black, Color::Yellow))?;
                }
                4 => tree.set_border(row, BorderStyle::Double)?,
                _ => {}
            }
            tree.attach(middle, row)?;
        }

        let right = tree.new_box(BorderStyle::Thick);
        tree.set_layout(right, LayoutMode::VerticalGrid)?;
        tree.set_style(right, style(Color::White, Color::Red))?;

        tree.set_layout(root, LayoutMode::HorizontalGrid)?;
        tree.attach(root, left)?;
        tree.attach(root, middle)?;
        tree.attach(root, right)?;

        self.left_panel = Some(left);
        self.runtime.spawn(tick_status(self.handle.clone(), status));
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent, tree: &mut Tree) -> Result<(), TreeError> {
        match key.code {
            KeyCode::Enter => self.toggle_overlay(tree),
            KeyCode::Right => self.nudge_left_panel(tree, true),
            KeyCode::Left => self.nudge_left_panel(tree, false),
            code => {
                tracing::debug!(?code, "unbound key");
                Ok(())
            }
        }
    }
}

/// Rewrite the status text once per second until the session goes away.
async fn tick_status(handle: SessionHandle, status: ComponentId) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut ticks: u64 = 0;
    loop {
        interval.tick().await;
        if handle.is_quit_requested() {
            break;
        }
        let text = format!("uptime: {ticks}s  (Enter: overlay, Left/Right: resize, Esc: quit)");
        if handle.update(|tree| tree.set_text(status, text)).is_err() {
            break;
        }
        ticks += 1;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let surface = TerminalSurface::new(SurfaceOptions::default())?;
    let config = SessionConfig {
        log_file: Some("dashboard.log".into()),
        ..SessionConfig::default()
    };
    let mut session = Session::new(surface, config)?;
    let mut demo = Demo {
        handle: session.handle(),
        runtime: runtime.handle().clone(),
        left_panel: None,
        overlay: None,
    };
    session.run(&mut demo)?;
    demo.handle.quit();
    println!("Bye");
    Ok(())
}
