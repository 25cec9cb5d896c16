//! Placement Module
//!
//! The fixed tiling layouts: halves, thirds, two-thirds, centered and
//! maximized, computed from the screen size and the usable height.

use tracing::{debug, info};

use crate::config::TilingConfig;
use crate::error::{Result, TileError};
use crate::shared::Geometry;
use crate::wm::display::X11Session;

/// Tiling layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TileMode {
    /// Center the window, optionally keeping its size
    #[value(name = "center")]
    Center,
    /// Left half
    #[value(name = "tile_left")]
    Left,
    /// Right half
    #[value(name = "tile_right")]
    Right,
    /// Left two thirds
    #[value(name = "tile_leftcenter")]
    LeftCenter,
    /// Right two thirds
    #[value(name = "tile_rightcenter")]
    RightCenter,
    /// Left third
    #[value(name = "tile_leftleft")]
    LeftLeft,
    /// Right third
    #[value(name = "tile_rightright")]
    RightRight,
    /// Full width, usable height
    #[value(name = "maximize")]
    Maximize,
}

/// Screen dimensions a layout is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenArea {
    pub width: u32,
    pub height: u32,
    /// Height left for normal windows once panels are accounted for
    pub usable_height: u32,
}

impl ScreenArea {
    /// Derive the usable height from `_NET_WORKAREA`.
    ///
    /// The usable height is `|workarea.height - workarea.y|`. Without a work
    /// area (or with a degenerate one) the full screen height is used.
    pub fn new(width: u32, height: u32, work_area: Option<Geometry>) -> Self {
        let usable_height = work_area
            .map(|wa| (wa.height as i64 - wa.y as i64).unsigned_abs())
            .and_then(|h| u32::try_from(h).ok())
            .filter(|&h| h > 0)
            .unwrap_or(height);

        Self {
            width,
            height,
            usable_height,
        }
    }
}

/// Placement manager
pub struct PlacementManager {
    pub tiling: TilingConfig,
}

impl PlacementManager {
    pub fn new(tiling: TilingConfig) -> Self {
        Self { tiling }
    }

    /// Compute the target geometry for `mode`.
    ///
    /// `current` is only consulted for [`TileMode::Center`] with `keep_size`.
    pub fn place(
        &self,
        mode: TileMode,
        keep_size: bool,
        current: &Geometry,
        screen: &ScreenArea,
    ) -> Geometry {
        let width = screen.width;
        let height = screen.usable_height.max(1);
        let half = width / 2;
        let third = width / 3;
        // X rejects zero-sized windows
        let span = |w: u32| w.max(1);

        match mode {
            TileMode::Left => Geometry::new(0, 0, span(half), height),
            TileMode::Right => Geometry::new(
                half as i32,
                0,
                span(half.saturating_sub(self.tiling.right_border)),
                height,
            ),
            TileMode::LeftCenter => Geometry::new(0, 0, span(third * 2), height),
            TileMode::RightCenter => Geometry::new(third as i32, 0, span(third * 2), height),
            TileMode::LeftLeft => Geometry::new(0, 0, span(third), height),
            TileMode::RightRight => Geometry::new((third * 2) as i32, 0, span(third), height),
            TileMode::Maximize => Geometry::new(0, 0, span(width), height),
            TileMode::Center if keep_size => self.place_center(current, screen),
            TileMode::Center => self.place_center_resized(screen),
        }
    }

    /// Center without resizing
    fn place_center(&self, current: &Geometry, screen: &ScreenArea) -> Geometry {
        let x = (screen.width as i32 - current.width as i32) / 2;
        let y = (screen.height as i32 - current.height as i32) / 2;

        Geometry::new(x.max(0), y.max(0), current.width, current.height)
    }

    /// Center with fixed margins on every side
    fn place_center_resized(&self, screen: &ScreenArea) -> Geometry {
        let margin_x = self.tiling.center_margin_x;
        let margin_y = self.tiling.center_margin_y;

        Geometry::new(
            margin_x as i32,
            margin_y as i32,
            screen.width.saturating_sub(margin_x.saturating_mul(2)).max(1),
            screen.height.saturating_sub(margin_y.saturating_mul(2)).max(1),
        )
    }

    /// Apply `mode` to the currently focused window
    pub fn tile_active_window(
        &self,
        session: &mut X11Session,
        mode: TileMode,
        keep_size: bool,
    ) -> Result<Geometry> {
        let window = session.active_window()?.ok_or(TileError::NoActiveWindow)?;

        let current = session.geometry(window)?;
        info!("Tiling window 0x{:x} ({:?})", window, mode);
        debug!("Window geometry: {}", current);

        let (width, height) = session.screen_size();
        let screen = ScreenArea::new(width, height, session.work_area()?);
        debug!("Screen area: {:?}", screen);

        let target = self.place(mode, keep_size, &current, &screen);
        info!("New window geometry: {}", target);

        session.configure(window, &target)?;
        Ok(target)
    }
}

impl Default for PlacementManager {
    fn default() -> Self {
        Self::new(TilingConfig::default())
    }
}
