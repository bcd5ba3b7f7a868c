use derive_more::{Add, Sub};

/// A point in device pixels, origin top-left. Output of `Camera::world_to_screen` and
/// the input coordinate space for pointer events.
#[derive(Copy, Clone, PartialEq, Debug, Default, Add, Sub)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
