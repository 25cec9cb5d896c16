//! Window and work-area geometry

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Build a geometry from the first four CARDINALs of `_NET_WORKAREA`
    /// (`x, y, width, height` of the current desktop).
    ///
    /// Returns `None` when fewer than four values are present.
    pub fn from_cardinals(values: &[u32]) -> Option<Self> {
        match values {
            [x, y, width, height, ..] => Some(Self {
                x: *x as i32,
                y: *y as i32,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cardinals_uses_first_desktop() {
        // Two desktops worth of work area; only the first one counts
        let values = [0, 30, 1920, 1050, 0, 30, 1920, 1050];
        let geom = Geometry::from_cardinals(&values).unwrap();
        assert_eq!(geom, Geometry::new(0, 30, 1920, 1050));
    }

    #[test]
    fn test_from_cardinals_too_short() {
        assert_eq!(Geometry::from_cardinals(&[0, 30, 1920]), None);
        assert_eq!(Geometry::from_cardinals(&[]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Geometry::new(-5, 10, 800, 600).to_string(), "(-5, 10) 800x600");
    }
}
