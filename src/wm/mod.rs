//! Window Manager Module
//!
//! Everything that talks to the X server: atoms, the session, the focus
//! tracker and the tiling layouts.

pub mod display;
pub mod events;
pub mod ewmh;
pub mod focus;
pub mod placement;

pub use display::X11Session;
pub use focus::{FocusReport, FocusTracker};
pub use placement::{PlacementManager, TileMode};
