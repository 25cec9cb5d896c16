//! Display Module
//!
//! Owns the X11 connection and implements [`WindowSystem`] on top of it, plus
//! the geometry queries and configure request the tiling actions need.

use tracing::{debug, info, trace};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;

use crate::error::{Result, TileError};
use crate::shared::Geometry;
use crate::wm::events::{Lookup, WatchedProperty, WindowEvent, WindowSystem, parse_window_id};
use crate::wm::ewmh::Atoms;

/// Size of one property read, in 32-bit units. Longer values take several
/// round trips.
const MAX_PROPERTY_LENGTH: u32 = 1024;

/// A connection to the X server plus the state derived from it at startup
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    screen_width: u16,
    screen_height: u16,
    atoms: Atoms,
}

impl X11Session {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(TileError::InvalidScreen(screen_num))?;
        let root = screen.root;
        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        info!("Connected to X server, screen {}, root window 0x{:x}", screen_num, root);
        debug!("Screen size: {}x{}", screen_width, screen_height);

        let atoms = Atoms::new(&conn)?;

        Ok(Self {
            conn,
            root,
            screen_width,
            screen_height,
            atoms,
        })
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width as u32, self.screen_height as u32)
    }

    /// Ask for `PropertyNotify` on the root so `_NET_ACTIVE_WINDOW` changes
    /// are delivered
    pub fn watch_root(&self) -> Result<()> {
        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
            )?
            .check()?;
        debug!("Selected PropertyChangeMask on root 0x{:x}", self.root);
        Ok(())
    }

    /// Currently focused window, if the window manager reports one
    pub fn active_window(&mut self) -> Result<Option<Window>> {
        let value = self.root_property(WatchedProperty::ActiveWindow)?;
        Ok(value.as_deref().and_then(parse_window_id).flatten())
    }

    pub fn geometry(&self, window: Window) -> Result<Geometry> {
        let reply = self.conn.get_geometry(window)?.reply()?;
        Ok(Geometry::new(
            reply.x as i32,
            reply.y as i32,
            reply.width as u32,
            reply.height as u32,
        ))
    }

    /// `_NET_WORKAREA` of the first desktop, if the window manager sets it
    pub fn work_area(&self) -> Result<Option<Geometry>> {
        let reply = self
            .conn
            .get_property(false, self.root, self.atoms.net_workarea, AtomEnum::CARDINAL, 0, 4)?
            .reply()?;

        let values: Vec<u32> = match reply.value32() {
            Some(values) => values.collect(),
            None => return Ok(None),
        };

        Ok(Geometry::from_cardinals(&values))
    }

    /// Move and resize `window` and raise it. Fails if the server rejects
    /// the request, e.g. because the window closed in the meantime.
    pub fn configure(&self, window: Window, geometry: &Geometry) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new()
                    .x(geometry.x)
                    .y(geometry.y)
                    .width(geometry.width)
                    .height(geometry.height)
                    .border_width(0)
                    .stack_mode(StackMode::ABOVE),
            )?
            .check()?;
        Ok(())
    }

    /// Full value of `atom` on `window`, or `None` if it is not set
    fn property_value(
        &self,
        window: Window,
        atom: Atom,
    ) -> std::result::Result<Option<Vec<u8>>, ReplyError> {
        read_full_value(|offset| {
            let reply = self
                .conn
                .get_property(false, window, atom, AtomEnum::ANY, offset, MAX_PROPERTY_LENGTH)?
                .reply()?;

            if reply.type_ == x11rb::NONE {
                return Ok(None);
            }
            Ok(Some((reply.value, reply.bytes_after)))
        })
    }

    fn set_event_mask(&self, window: Window, mask: EventMask) -> Result<()> {
        let result = self
            .conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check();

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_bad_window(&e) => {
                debug!("Window 0x{:x} is gone, skipping event mask change", window);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl WindowSystem for X11Session {
    fn root_property(&mut self, property: WatchedProperty) -> Result<Option<Vec<u8>>> {
        let atom = self.atoms.atom_for(property);
        Ok(self.property_value(self.root, atom)?)
    }

    fn window_property(
        &mut self,
        window: Window,
        property: WatchedProperty,
    ) -> Result<Lookup<Vec<u8>>> {
        let atom = self.atoms.atom_for(property);

        match self.property_value(window, atom) {
            Ok(None) => Ok(Lookup::Absent),
            Ok(Some(value)) => Ok(Lookup::Found(value)),
            Err(e) if is_bad_window(&e) => Ok(Lookup::Vanished),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&mut self, window: Window) -> Result<()> {
        self.set_event_mask(window, EventMask::PROPERTY_CHANGE)
    }

    fn unsubscribe(&mut self, window: Window) -> Result<()> {
        self.set_event_mask(window, EventMask::NO_EVENT)
    }

    fn next_event(&mut self) -> Result<WindowEvent> {
        let event = self.conn.wait_for_event()?;
        translate_event(&self.atoms, event)
    }
}

/// Every request on the watch path is checked, so an error arriving as an
/// event means the session is in a state nothing here expects.
fn translate_event(atoms: &Atoms, event: Event) -> Result<WindowEvent> {
    match event {
        Event::PropertyNotify(e) => Ok(WindowEvent::PropertyChanged {
            window: e.window,
            property: atoms.watched(e.atom),
        }),
        Event::Error(e) => Err(TileError::Protocol(e)),
        other => {
            trace!("Ignoring event {:?}", other);
            Ok(WindowEvent::Other)
        }
    }
}

/// Read a property value that may be longer than one request returns.
///
/// `fetch` is called with an offset in 32-bit units and yields one chunk plus
/// the number of bytes still left after it, or `None` when the property is
/// not set (or was deleted between two chunks).
fn read_full_value<E, F>(mut fetch: F) -> std::result::Result<Option<Vec<u8>>, E>
where
    F: FnMut(u32) -> std::result::Result<Option<(Vec<u8>, u32)>, E>,
{
    let mut value = Vec::new();
    let mut offset = 0;

    loop {
        let Some((chunk, bytes_after)) = fetch(offset)? else {
            return Ok(None);
        };
        let units = (chunk.len() / 4) as u32;
        value.extend_from_slice(&chunk);

        if bytes_after == 0 || units == 0 {
            return Ok(Some(value));
        }
        offset += units;
    }
}

fn is_bad_window(error: &ReplyError) -> bool {
    matches!(error, ReplyError::X11Error(e) if e.error_kind == ErrorKind::Window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::x11_utils::X11Error;

    /// Serves `value` the way the server does, at most `MAX_PROPERTY_LENGTH`
    /// units per request
    fn serve(value: &[u8]) -> impl FnMut(u32) -> std::result::Result<Option<(Vec<u8>, u32)>, ()> + '_ {
        move |offset| {
            let start = (offset as usize * 4).min(value.len());
            let end = (start + MAX_PROPERTY_LENGTH as usize * 4).min(value.len());
            Ok(Some((value[start..end].to_vec(), (value.len() - end) as u32)))
        }
    }

    fn atoms() -> Atoms {
        Atoms {
            net_active_window: 300,
            net_wm_name: 301,
            net_workarea: 302,
            wm_name: AtomEnum::WM_NAME.into(),
        }
    }

    #[test]
    fn test_long_title_is_read_whole() {
        // The first chunk ends inside the two-byte "é"
        let title = format!("{}é", "a".repeat(4095));
        let mut requests = 0;
        let mut fetch = serve(title.as_bytes());

        let value = read_full_value(|offset| {
            requests += 1;
            fetch(offset)
        })
        .unwrap();

        assert_eq!(requests, 2);
        assert_eq!(String::from_utf8(value.unwrap()).unwrap(), title);
    }

    #[test]
    fn test_short_value_takes_one_request() {
        let mut requests = 0;
        let mut fetch = serve(b"xterm");

        let value = read_full_value(|offset| {
            requests += 1;
            fetch(offset)
        })
        .unwrap();

        assert_eq!(requests, 1);
        assert_eq!(value.as_deref(), Some(&b"xterm"[..]));
    }

    #[test]
    fn test_unset_property_is_none() {
        let value = read_full_value(|_| Ok::<_, ()>(None)).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_property_deleted_between_chunks_is_none() {
        let value = read_full_value(|offset| {
            Ok::<_, ()>(if offset == 0 {
                Some((vec![b'a'; 4096], 10))
            } else {
                None
            })
        })
        .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_read_error_propagates() {
        let result = read_full_value(|_| Err::<Option<(Vec<u8>, u32)>, _>("gone"));
        assert_eq!(result, Err("gone"));
    }

    #[test]
    fn test_property_notify_is_translated() {
        let event = Event::PropertyNotify(PropertyNotifyEvent {
            response_type: PROPERTY_NOTIFY_EVENT,
            sequence: 7,
            window: 0x0140_0003,
            atom: 301,
            time: 0,
            state: Property::NEW_VALUE,
        });

        let translated = translate_event(&atoms(), event).unwrap();
        assert_eq!(
            translated,
            WindowEvent::PropertyChanged {
                window: 0x0140_0003,
                property: Some(WatchedProperty::NetWmName),
            }
        );
    }

    #[test]
    fn test_error_event_is_fatal() {
        let error = X11Error {
            error_kind: ErrorKind::Window,
            error_code: 3,
            sequence: 12,
            bad_value: 0x0140_0003,
            minor_opcode: 0,
            major_opcode: 12,
            extension_name: None,
            request_name: Some("ConfigureWindow"),
        };

        let err = translate_event(&atoms(), Event::Error(error)).unwrap_err();
        assert!(matches!(err, TileError::Protocol(e) if e.error_kind == ErrorKind::Window));
    }

    #[test]
    #[ignore] // Requires X11 display
    fn test_configure_vanished_window_fails() {
        let session = X11Session::connect().unwrap();
        let geometry = Geometry::new(0, 0, 100, 100);

        // Window ids with no client bits set are never handed out
        assert!(session.configure(0x1, &geometry).is_err());
    }
}
