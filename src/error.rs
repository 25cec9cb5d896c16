//! Error types for talking to the X server.
//!
//! Only failures that invalidate the connection end up here. A window that
//! disappears between being reported and being queried is not an error; see
//! [`crate::wm::events::Lookup`].

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::x11_utils::X11Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("failed to connect to X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X11 connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    /// An X11 error delivered as an event rather than as a reply
    #[error("unexpected X11 error: {0:?}")]
    Protocol(X11Error),

    #[error("screen {0} does not exist")]
    InvalidScreen(usize),

    #[error("no active window")]
    NoActiveWindow,
}

pub type Result<T> = std::result::Result<T, TileError>;
