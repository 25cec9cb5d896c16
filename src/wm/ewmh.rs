//! EWMH (Extended Window Manager Hints) atoms
//!
//! The handful of root and client properties tilewin reads.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt};

use crate::error::Result;
use crate::wm::events::WatchedProperty;

/// Holds all interned atoms
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub net_active_window: Atom,
    pub net_wm_name: Atom,
    pub net_workarea: Atom,
    pub wm_name: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        // Helper to intern a single atom
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_workarea: intern("_NET_WORKAREA")?,
            // Predefined, no round trip needed
            wm_name: AtomEnum::WM_NAME.into(),
        })
    }

    pub fn atom_for(&self, property: WatchedProperty) -> Atom {
        match property {
            WatchedProperty::ActiveWindow => self.net_active_window,
            WatchedProperty::NetWmName => self.net_wm_name,
            WatchedProperty::WmName => self.wm_name,
        }
    }

    /// Map a `PropertyNotify` atom back to the property it stands for
    pub fn watched(&self, atom: Atom) -> Option<WatchedProperty> {
        if atom == self.net_active_window {
            Some(WatchedProperty::ActiveWindow)
        } else if atom == self.net_wm_name {
            Some(WatchedProperty::NetWmName)
        } else if atom == self.wm_name {
            Some(WatchedProperty::WmName)
        } else {
            None
        }
    }
}
