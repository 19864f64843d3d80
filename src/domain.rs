//! Geometry types shared by the bounce selector and the animation loop.

/// Pointer velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub const ZERO: Self = Self { vx: 0.0, vy: 0.0 };

    /// Create a new velocity.
    pub fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    /// Euclidean length of the vector.
    pub fn magnitude(self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Cosine of the angle between two velocities.
    ///
    /// Returns `None` when either vector is (numerically) zero.
    pub fn cosine_similarity(self, other: Self) -> Option<f64> {
        let denom = self.magnitude() * other.magnitude();
        if denom <= f64::EPSILON {
            return None;
        }
        Some((self.vx * other.vx + self.vy * other.vy) / denom)
    }
}

/// Sub-pixel pointer position, integrated frame by frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Advance by `velocity` over `dt` seconds.
    pub fn advance(&mut self, velocity: Velocity, dt: f64) {
        self.x += velocity.vx * dt;
        self.y += velocity.vy * dt;
    }

    /// Nearest whole pixel, as sent to the display server.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Which screen edges were crossed during a frame.
///
/// More than one flag may be set on a corner hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeHits {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl EdgeHits {
    pub const NONE: Self = Self {
        left: false,
        right: false,
        top: false,
        bottom: false,
    };

    /// Returns true if any edge was hit.
    pub fn any(self) -> bool {
        self.left || self.right || self.top || self.bottom
    }

    /// Sign the horizontal velocity is forced to, if a side wall was hit.
    pub fn forced_x(self) -> Option<f64> {
        if self.left {
            Some(1.0)
        } else if self.right {
            Some(-1.0)
        } else {
            None
        }
    }

    /// Sign the vertical velocity is forced to, if the top or bottom was hit.
    pub fn forced_y(self) -> Option<f64> {
        if self.top {
            Some(1.0)
        } else if self.bottom {
            Some(-1.0)
        } else {
            None
        }
    }
}

/// Inclusive pixel rectangle the pointer is allowed to occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a `width` x `height` screen: `[0, width-1] x [0, height-1]`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: f64::from(width.saturating_sub(1)),
            max_y: f64::from(height.saturating_sub(1)),
        }
    }

    /// Edges the position lies strictly beyond.
    pub fn hits(&self, pos: Position) -> EdgeHits {
        EdgeHits {
            left: pos.x < self.min_x,
            right: pos.x > self.max_x,
            top: pos.y < self.min_y,
            bottom: pos.y > self.max_y,
        }
    }

    /// Detect edge hits and pull the position back inside.
    ///
    /// A hit axis ends up one pixel inward from its wall so the next frame
    /// doesn't trip over the same edge again. The result always lies within
    /// the bounds, even on screens only one or two pixels wide.
    pub fn resolve(&self, pos: &mut Position) -> EdgeHits {
        let hits = self.hits(*pos);
        if !hits.any() {
            return hits;
        }

        pos.x = pos.x.clamp(self.min_x, self.max_x);
        pos.y = pos.y.clamp(self.min_y, self.max_y);

        if hits.left {
            pos.x = self.min_x + 1.0;
        }
        if hits.right {
            pos.x = self.max_x - 1.0;
        }
        if hits.top {
            pos.y = self.min_y + 1.0;
        }
        if hits.bottom {
            pos.y = self.max_y - 1.0;
        }

        // Degenerate screens: the nudge itself may leave the rectangle.
        pos.x = pos.x.clamp(self.min_x, self.max_x);
        pos.y = pos.y.clamp(self.min_y, self.max_y);

        hits
    }
}

/// Cursor shapes the backend can force while animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    /// Standard left-pointing arrow.
    #[default]
    Arrow,
}
