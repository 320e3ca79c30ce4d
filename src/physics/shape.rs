use glam::DVec2;

/// Collision shape attached to a body.
///
/// Shapes are passive geometry descriptors, centered on the owning body's
/// position. A body carries at most one shape at a time; dimensions are a
/// caller contract and are not validated (degenerate dimensions simply
/// never overlap).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle; `width` and `height` are full extents
    Rectangle { width: f64, height: f64 },
    /// Circle
    Circle { radius: f64 },
}

impl Shape {
    /// Create a rectangle shape
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::Rectangle { width, height }
    }

    /// Create a circle shape
    pub fn circle(radius: f64) -> Self {
        Self::Circle { radius }
    }

    /// Half extents for rectangles, `None` for circles
    pub fn half_extents(&self) -> Option<DVec2> {
        match *self {
            Shape::Rectangle { width, height } => Some(DVec2::new(width * 0.5, height * 0.5)),
            Shape::Circle { .. } => None,
        }
    }
}
