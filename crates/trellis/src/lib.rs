//! **trellis** -- a retained-mode dashboard toolkit for the terminal.
//!
//! This is the umbrella crate that re-exports everything you need to build a
//! trellis dashboard from a single dependency:
//!
//! ```toml
//! [dependencies]
//! trellis = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`trellis_core`] are available at the crate root
//!   ([`Tree`], [`Session`], [`Dashboard`], [`TerminalSurface`], etc.).
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly: styles come from
//!   `ratatui`, key events from `crossterm`, and background work usually runs
//!   on a `tokio` runtime that talks to the session through a
//!   [`SessionHandle`].
//!
//! # Quick start
//!
//! ```ignore
//! use trellis::crossterm::event::KeyEvent;
//! use trellis::*;
//!
//! struct Hello;
//!
//! impl Dashboard for Hello {
//!     fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
//!         let text = tree.new_text("Hello, trellis!");
//!         tree.attach(tree.root(), text)
//!     }
//!     fn on_key(&mut self, _: KeyEvent, _: &mut Tree) -> Result<(), TreeError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), SessionError> {
//!     let surface = TerminalSurface::new(SurfaceOptions::default())?;
//!     Session::new(surface, SessionConfig::default())?.run(&mut Hello)
//! }
//! ```

pub use trellis_core::*;

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
