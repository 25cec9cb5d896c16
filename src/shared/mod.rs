//! Types shared between the tiling actions and the X11 session.

pub mod window_state;

pub use window_state::Geometry;
