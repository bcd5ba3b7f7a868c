use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::{Add, AddAssign, Sub};

use common::{NotNan, Vector2};

use crate::CellPos;

/// A point anywhere on the 2D battlefield, in world units. All finite, non-NaN values
/// are valid.
#[derive(Copy, Clone, PartialEq, Default, PartialOrd)]
pub struct WorldPoint(NotNan<f32>, NotNan<f32>);

#[inline]
fn not_nan(x: f32) -> Option<NotNan<f32>> {
    if x.is_finite() {
        // safety: is_finite rules out nan
        Some(unsafe { NotNan::new_unchecked(x) })
    } else {
        None
    }
}

impl WorldPoint {
    /// `None` if either coord is not finite.
    pub fn new(x: f32, y: f32) -> Option<Self> {
        match (not_nan(x), not_nan(y)) {
            (Some(x), Some(y)) => Some(Self(x, y)),
            _ => None,
        }
    }

    /// Panics if not finite.
    pub fn new_unchecked(x: f32, y: f32) -> Self {
        Self::new(x, y).unwrap_or_else(|| panic!("bad coords {:?}", (x, y)))
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.0.into_inner()
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.1.into_inner()
    }

    #[inline]
    pub fn xy(self) -> (f32, f32) {
        (self.x(), self.y())
    }

    pub fn distance2(self, other: Self) -> f32 {
        (self.0 - other.0).powi(2) + (self.1 - other.1).powi(2)
    }

    pub fn distance(self, other: Self) -> f32 {
        self.distance2(other).sqrt()
    }

    /// The cell of a grid with the given cell size (world units per cell) this point falls in.
    pub fn to_cell(self, cell_size: f32) -> CellPos {
        CellPos::new((self.x() / cell_size).floor() as i32, (self.y() / cell_size).floor() as i32)
    }
}

impl From<WorldPoint> for Vector2 {
    fn from(p: WorldPoint) -> Self {
        Vector2 { x: p.x(), y: p.y() }
    }
}

impl Add<Vector2> for WorldPoint {
    type Output = Self;

    fn add(self, rhs: Vector2) -> Self::Output {
        Self::new_unchecked(self.x() + rhs.x, self.y() + rhs.y)
    }
}

impl AddAssign<Vector2> for WorldPoint {
    fn add_assign(&mut self, rhs: Vector2) {
        *self = *self + rhs;
    }
}

impl Sub for WorldPoint {
    type Output = Vector2;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x() - rhs.x(), self.y() - rhs.y())
    }
}

impl Eq for WorldPoint {}

impl Display for WorldPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "({:.2}, {:.2})", self.x(), self.y())
    }
}

impl Debug for WorldPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("WorldPoint")
            .field(&self.x())
            .field(&self.y())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(WorldPoint::new(2.0, 5.1).is_some());
        assert!(WorldPoint::new(f32::INFINITY, 1.0).is_none());
        assert!(WorldPoint::new(5.0, f32::NAN).is_none());
    }

    #[test]
    fn cell_conversion() {
        let p = WorldPoint::new_unchecked(50.0, 49.9);
        assert_eq!(p.to_cell(24.0), CellPos::new(2, 2));
    }
}
