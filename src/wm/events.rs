//! Events Module
//!
//! The window-system seam the focus tracker is driven through: the events it
//! consumes, the properties it watches and the lookups it performs.

use x11rb::protocol::xproto::Window;

use crate::error::Result;

/// Properties the focus tracker cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedProperty {
    /// `_NET_ACTIVE_WINDOW` on the root window
    ActiveWindow,
    /// `_NET_WM_NAME` (UTF-8 title)
    NetWmName,
    /// `WM_NAME` (legacy title)
    WmName,
}

impl WatchedProperty {
    pub fn is_title(self) -> bool {
        matches!(self, Self::NetWmName | Self::WmName)
    }
}

/// A notification pulled from the window system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// A property changed on `window`. `property` is `None` for properties
    /// we don't watch.
    PropertyChanged {
        window: Window,
        property: Option<WatchedProperty>,
    },
    /// Anything else
    Other,
}

/// Result of querying a property on a window that may have been destroyed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The window exists and the property has a value
    Found(T),
    /// The window exists but the property is not set
    Absent,
    /// The window no longer exists
    Vanished,
}

/// Everything the focus tracker needs from the display server.
///
/// Errors returned from these methods are fatal. Implementations must map
/// "window no longer exists" to [`Lookup::Vanished`] (or to success for
/// subscribe/unsubscribe) instead of returning an error.
pub trait WindowSystem {
    /// Read a property from the root window. `None` means it is not set.
    fn root_property(&mut self, property: WatchedProperty) -> Result<Option<Vec<u8>>>;

    /// Read a property from a client window
    fn window_property(
        &mut self,
        window: Window,
        property: WatchedProperty,
    ) -> Result<Lookup<Vec<u8>>>;

    /// Start receiving property-change notifications for `window`
    fn subscribe(&mut self, window: Window) -> Result<()>;

    /// Stop receiving notifications for `window`
    fn unsubscribe(&mut self, window: Window) -> Result<()>;

    /// Block until the next notification arrives
    fn next_event(&mut self) -> Result<WindowEvent>;
}

/// Decode the value of `_NET_ACTIVE_WINDOW`.
///
/// Returns `None` for a value too short to hold a window id. `Some(None)` is
/// the explicit "no window focused" value (id 0).
pub fn parse_window_id(value: &[u8]) -> Option<Option<Window>> {
    let bytes: [u8; 4] = value.get(..4)?.try_into().ok()?;
    match u32::from_ne_bytes(bytes) {
        0 => Some(None),
        id => Some(Some(id)),
    }
}
