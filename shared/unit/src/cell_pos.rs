use derive_more::{Add, Sub};

use common::Vector2;

use crate::WorldPoint;

/// A coordinate on the pathfinding grid. Distinct from `WorldPoint` so systems can't
/// accidentally mix cell indices with world-unit distances.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Add, Sub)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the number of octile steps between two cells ignoring obstacles.
    pub fn octile_distance(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }

    pub fn is_adjacent(self, other: Self) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        (dx, dy) != (0, 0) && dx <= 1 && dy <= 1
    }

    /// Center of this cell in world units.
    pub fn center(self, cell_size: f32) -> WorldPoint {
        WorldPoint::new_unchecked(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
        )
    }

    pub fn to_index(self, width: i32) -> usize {
        (self.y * width + self.x) as usize
    }

    pub fn from_index(index: usize, width: i32) -> Self {
        let index = index as i32;
        Self::new(index % width, index / width)
    }
}

impl From<CellPos> for Vector2 {
    fn from(c: CellPos) -> Self {
        Vector2::new(c.x as f32, c.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency() {
        let a = CellPos::new(5, 5);
        assert!(a.is_adjacent(CellPos::new(6, 6)));
        assert!(a.is_adjacent(CellPos::new(4, 5)));
        assert!(!a.is_adjacent(CellPos::new(5, 5)));
        assert!(!a.is_adjacent(CellPos::new(7, 5)));
    }

    #[test]
    fn index_roundtrip() {
        let width = 83;
        for i in 0..width * width {
            let c = CellPos::from_index(i as usize, width);
            assert_eq!(c.to_index(width), i as usize);
        }
    }
}
