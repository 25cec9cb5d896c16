//! Focus Module
//!
//! Tracks which window holds input focus and what its title is, and reports
//! each real change exactly once. Driven by property-change notifications
//! pulled from a [`WindowSystem`].

use serde::Serialize;
use tracing::{debug, trace, warn};
use x11rb::protocol::xproto::Window;

use crate::error::Result;
use crate::wm::events::{Lookup, WatchedProperty, WindowEvent, WindowSystem, parse_window_id};

/// Title reported for windows that set neither `_NET_WM_NAME` nor `WM_NAME`
pub const UNNAMED_TITLE: &str = "unnamed";

/// Title reported when `_NET_WM_NAME` holds bytes that are not UTF-8
pub const UNDECODABLE_TITLE: &str = "<undecodable title>";

/// Last known focus state.
///
/// `active_title` belongs to `active_id` and is stale whenever the id
/// changes until it has been fetched again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFocus {
    pub active_id: Option<Window>,
    pub active_title: Option<String>,
}

/// Focus tracker
pub struct FocusTracker<W: WindowSystem> {
    system: W,
    state: TrackedFocus,
}

impl<W: WindowSystem> FocusTracker<W> {
    /// Create a tracker with no known focus. Call [`prime`](Self::prime)
    /// (or [`run`](Self::run)) to read the initial state.
    pub fn new(system: W) -> Self {
        Self {
            system,
            state: TrackedFocus::default(),
        }
    }

    pub fn state(&self) -> &TrackedFocus {
        &self.state
    }

    #[cfg(test)]
    fn system_mut(&mut self) -> &mut W {
        &mut self.system
    }

    /// Re-read `_NET_ACTIVE_WINDOW` and move the title subscription along
    /// with it.
    ///
    /// Returns the current window and whether it differs from the stored
    /// one. A root without the property at all leaves the state untouched.
    pub fn detect_focus_change(&mut self) -> Result<(Option<Window>, bool)> {
        let Some(value) = self.system.root_property(WatchedProperty::ActiveWindow)? else {
            trace!("_NET_ACTIVE_WINDOW is not set on the root window");
            return Ok((None, false));
        };
        let Some(window) = parse_window_id(&value) else {
            warn!("Ignoring malformed _NET_ACTIVE_WINDOW ({} bytes)", value.len());
            return Ok((None, false));
        };

        if window == self.state.active_id {
            return Ok((window, false));
        }

        debug!("Focus moved from {:?} to {:?}", self.state.active_id, window);

        let mut pending = PendingUnsubscribe {
            system: &mut self.system,
            window: self.state.active_id,
        };
        self.state.active_id = window;
        if let Some(window) = window {
            pending.system.subscribe(window)?;
        }
        pending.finish()?;

        Ok((window, true))
    }

    /// Re-read the title of `id` and compare it with the stored one.
    ///
    /// `None` always counts as a change so consumers see the defocus. A
    /// window that vanished mid-query keeps the previous title and reports
    /// no change.
    pub fn detect_title_change(&mut self, id: Option<Window>) -> Result<(Option<String>, bool)> {
        let changed = self.refresh_title(id)?.unwrap_or(false);
        Ok((self.state.active_title.clone(), changed))
    }

    /// Update the stored title for `id`. `None` if the window vanished before
    /// its title could be read, otherwise whether the title changed.
    fn refresh_title(&mut self, id: Option<Window>) -> Result<Option<bool>> {
        let Some(window) = id else {
            self.state.active_title = None;
            return Ok(Some(true));
        };

        let Some(title) = self.fetch_title(window)? else {
            debug!("Window 0x{:x} vanished before its title could be read", window);
            return Ok(None);
        };

        let changed = self.state.active_title.as_deref() != Some(title.as_str());
        if changed {
            trace!("Title of 0x{:x} is now {:?}", window, title);
            self.state.active_title = Some(title);
        }
        Ok(Some(changed))
    }

    /// Read the initial focus and title, then report them once.
    pub fn prime<F>(&mut self, on_change: &mut F) -> Result<()>
    where
        F: FnMut(Option<Window>, Option<&str>),
    {
        let (id, _) = self.detect_focus_change()?;
        self.detect_title_change(id)?;
        self.notify(on_change);
        Ok(())
    }

    /// Process one notification.
    ///
    /// Invokes `on_change` at most once and returns whether it did.
    pub fn handle_event<F>(&mut self, event: WindowEvent, on_change: &mut F) -> Result<bool>
    where
        F: FnMut(Option<Window>, Option<&str>),
    {
        let WindowEvent::PropertyChanged {
            window,
            property: Some(property),
        } = event
        else {
            return Ok(false);
        };

        match property {
            WatchedProperty::ActiveWindow => {
                let (id, focus_changed) = self.detect_focus_change()?;
                if !focus_changed {
                    return Ok(false);
                }
                // A new window always gets reported, title or not. The stored
                // title belongs to the previous window if this one vanished.
                let title = match self.refresh_title(id)? {
                    Some(_) => self.state.active_title.as_deref(),
                    None => None,
                };
                on_change(id, title);
                Ok(true)
            }
            _ if property.is_title() && self.state.active_id == Some(window) => {
                let changed = self.refresh_title(Some(window))? == Some(true);
                if changed {
                    self.notify(on_change);
                }
                Ok(changed)
            }
            _ => {
                trace!("Ignoring {:?} change on untracked window 0x{:x}", property, window);
                Ok(false)
            }
        }
    }

    /// Prime, then block on notifications forever. Only returns on a fatal
    /// error from the window system.
    pub fn run<F>(&mut self, mut on_change: F) -> Result<()>
    where
        F: FnMut(Option<Window>, Option<&str>),
    {
        self.prime(&mut on_change)?;
        loop {
            let event = self.system.next_event()?;
            self.handle_event(event, &mut on_change)?;
        }
    }

    fn notify<F>(&self, on_change: &mut F)
    where
        F: FnMut(Option<Window>, Option<&str>),
    {
        on_change(self.state.active_id, self.state.active_title.as_deref());
    }

    /// `None` means the window is gone
    fn fetch_title(&mut self, window: Window) -> Result<Option<String>> {
        for property in [WatchedProperty::NetWmName, WatchedProperty::WmName] {
            match self.system.window_property(window, property)? {
                Lookup::Vanished => return Ok(None),
                Lookup::Found(bytes) if !bytes.is_empty() => {
                    return Ok(Some(decode_title(property, bytes)));
                }
                Lookup::Found(_) | Lookup::Absent => {}
            }
        }
        Ok(Some(UNNAMED_TITLE.to_string()))
    }
}

/// Releases the previous window's subscription on every exit path out of
/// [`FocusTracker::detect_focus_change`]
struct PendingUnsubscribe<'a, W: WindowSystem> {
    system: &'a mut W,
    window: Option<Window>,
}

impl<W: WindowSystem> PendingUnsubscribe<'_, W> {
    fn finish(mut self) -> Result<()> {
        match self.window.take() {
            Some(window) => self.system.unsubscribe(window),
            None => Ok(()),
        }
    }
}

impl<W: WindowSystem> Drop for PendingUnsubscribe<'_, W> {
    fn drop(&mut self) {
        if let Some(window) = self.window.take() {
            if let Err(e) = self.system.unsubscribe(window) {
                warn!("Failed to unsubscribe from window 0x{:x}: {}", window, e);
            }
        }
    }
}

fn decode_title(property: WatchedProperty, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(title) => title,
        // WM_NAME of type STRING is ISO 8859-1
        Err(e) if property == WatchedProperty::WmName => {
            e.into_bytes().into_iter().map(char::from).collect()
        }
        // Cut off inside the last character, keep everything before it
        Err(e) if e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            String::from_utf8(bytes).unwrap_or_else(|_| UNDECODABLE_TITLE.to_string())
        }
        Err(_) => UNDECODABLE_TITLE.to_string(),
    }
}

/// One focus transition as printed by `tilewin watch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusReport<'a> {
    pub window: Option<Window>,
    pub title: Option<&'a str>,
}

impl std::fmt::Display for FocusReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.window, self.title) {
            (None, _) => write!(f, "none"),
            (Some(window), Some(title)) => write!(f, "0x{:x} {:?}", window, title),
            (Some(window), None) => write!(f, "0x{:x} -", window),
        }
    }
}
