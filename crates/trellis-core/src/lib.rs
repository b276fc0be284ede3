//! Core of the **trellis** terminal dashboard toolkit.
//!
//! `trellis-core` keeps a retained tree of components, lays it out with a
//! percentage-weighted grid solver, and repaints only what changed. A
//! [`Session`] ties the pieces to a terminal and runs a blocking loop.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Tree`] | Id-indexed component store plus dirty/damage bookkeeping |
//! | [`Component`] | One node: geometry, constraints, weights, style, draw spec |
//! | [`DrawSpec`] | How a component paints itself: a [`BoxSpec`] or a [`TextSpec`] |
//! | [`Surface`] | Cell-addressable screen with an event source |
//! | [`TerminalSurface`] | [`Surface`] on a real terminal via crossterm |
//! | [`Session`] | Owns surface and tree, runs the frame/event loop |
//! | [`Dashboard`] | Application hooks: build the tree, react to keys |
//! | [`TestSurface`](testing::TestSurface) | Headless surface for tests |
//!
//! # Frame cycle
//!
//! 1. **layout** -- subtrees whose structure or constraints changed are
//!    re-laid out ([`layout::update_geometry`]).
//! 2. **plan** -- dirty and damaged components, plus everything stacked
//!    above them, become candidates; candidates hidden under a higher
//!    opaque box are culled ([`scheduler::plan_frame`]).
//! 3. **paint** -- survivors draw in `(z-index, id)` order, then the surface
//!    is flushed.
//! 4. **event** -- the loop blocks for the next event and dispatches it.
//!
//! # Quick example
//!
//! ```ignore
//! use trellis_core::*;
//! use crossterm::event::KeyEvent;
//!
//! struct Hello;
//!
//! impl Dashboard for Hello {
//!     fn build(&mut self, tree: &mut Tree) -> Result<(), TreeError> {
//!         let panel = tree.new_box(BorderStyle::Rounded);
//!         let text = tree.new_text("Hello, trellis!");
//!         tree.attach(tree.root(), panel)?;
//!         tree.attach(panel, text)
//!     }
//!
//!     fn on_key(&mut self, _key: KeyEvent, _tree: &mut Tree) -> Result<(), TreeError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), SessionError> {
//!     let surface = TerminalSurface::new(SurfaceOptions::default())?;
//!     Session::new(surface, SessionConfig::default())?.run(&mut Hello)
//! }
//! ```

pub mod component;
pub mod draw;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod testing;
pub mod tree;

pub use component::{
    Component, ComponentId, FloatPlacement, HorizontalAlignment, LayoutMode, SizeConstraints,
    VerticalAlignment, Weight,
};
pub use draw::{BorderStyle, BoxSpec, DrawSpec, TextAlignment, TextSpec};
pub use event::SurfaceEvent;
pub use geometry::{Bounds, Geometry};
pub use layout::{resolve_grid, GridItem};
pub use logging::log_to_file;
pub use scheduler::{FramePlan, FrameReport};
pub use session::{Dashboard, Session, SessionConfig, SessionError, SessionHandle, SessionState};
pub use surface::{
    EventPoster, OutputTarget, Surface, SurfaceError, SurfaceOptions, TerminalSurface,
};
pub use tree::{PendingLayout, Tree, TreeError};
