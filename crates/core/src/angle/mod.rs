use serde::{Deserialize, Serialize};

/// Normalised image-space position. `y` grows downwards, as produced by the
/// landmark detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the point moved by `dy` along the vertical axis.
    pub fn offset_y(self, dy: f32) -> Self {
        Self::new(self.x, self.y + dy)
    }
}

/// Angle in degrees at vertex `b` between the rays `b -> a` and `b -> c`.
///
/// The bearing difference is folded back into `[0, 180]`, so the result does
/// not depend on the winding of the three points.
pub fn joint_angle(a: Point2, b: Point2, c: Point2) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
