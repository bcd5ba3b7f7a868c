use common::SmallVec;
use grid::DynamicGrid;
use unit::CellPos;

/// Opaque entity handle, decoupled from `ecs::Entity` so this crate doesn't need to depend
/// on the ECS - callers convert their own entity type to and from this when populating
/// occupants.
pub type EntityId = u64;

#[derive(Clone, Debug)]
pub struct Cell {
    pub passable: bool,
    pub cost: f32,
    occupants: SmallVec<[EntityId; 4]>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            passable: true,
            cost: 1.0,
            occupants: SmallVec::new(),
        }
    }
}

/// Fixed-size battlefield grid: static passability and movement cost per cell, plus a
/// dynamic set of occupant entities used by higher layers to block cells that units are
/// standing in.
pub struct PathGrid {
    cells: DynamicGrid<Cell>,
    width: i32,
    height: i32,
    cell_size: f32,
}

impl PathGrid {
    pub fn new(width: i32, height: i32, cell_size: f32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            cells: DynamicGrid::new([width as usize, height as usize, 1]),
            width,
            height,
            cell_size,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn in_bounds(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: CellPos) -> usize {
        cell.to_index(self.width)
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    pub fn is_passable(&self, pos: CellPos) -> bool {
        self.cell(pos).map_or(false, |c| c.passable)
    }

    pub fn set_passable(&mut self, pos: CellPos, passable: bool) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].passable = passable;
        }
    }

    pub fn set_cost(&mut self, pos: CellPos, cost: f32) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].cost = cost.max(1.0);
        }
    }

    pub fn add_occupant(&mut self, pos: CellPos, entity: EntityId) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            let occupants = &mut self.cells[idx].occupants;
            if !occupants.contains(&entity) {
                occupants.push(entity);
            }
        }
    }

    pub fn remove_occupant(&mut self, pos: CellPos, entity: EntityId) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].occupants.retain(|&e| e != entity);
        }
    }

    pub fn occupants(&self, pos: CellPos) -> &[EntityId] {
        self.cell(pos).map_or(&[], |c| &c.occupants)
    }

    /// 8-connected neighbours of `pos` that are in bounds and passable, paired with the
    /// step cost to enter them. Diagonal moves are excluded when both orthogonal cells
    /// they'd cut the corner of are blocked.
    pub fn neighbours(&self, pos: CellPos) -> impl Iterator<Item = (CellPos, f32)> + '_ {
        const OFFSETS: [(i32, i32); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];

        OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let next = CellPos::new(pos.x + dx, pos.y + dy);
            if !self.is_passable(next) {
                return None;
            }

            let diagonal = dx != 0 && dy != 0;
            if diagonal {
                let a = CellPos::new(pos.x + dx, pos.y);
                let b = CellPos::new(pos.x, pos.y + dy);
                if !self.is_passable(a) || !self.is_passable(b) {
                    return None;
                }
            }

            let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
            let cost = self.cell(next).map_or(1.0, |c| c.cost);
            Some((next, step * cost))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_corner_cutting() {
        let mut grid = PathGrid::new(3, 3, 1.0);
        grid.set_passable(CellPos::new(1, 0), false);
        grid.set_passable(CellPos::new(0, 1), false);

        let neighbours: Vec<_> = grid.neighbours(CellPos::new(0, 0)).collect();
        assert!(!neighbours.iter().any(|(c, _)| *c == CellPos::new(1, 1)));
    }

    #[test]
    fn allows_diagonal_when_one_side_open() {
        let mut grid = PathGrid::new(3, 3, 1.0);
        grid.set_passable(CellPos::new(1, 0), false);

        let neighbours: Vec<_> = grid.neighbours(CellPos::new(0, 0)).collect();
        assert!(neighbours.iter().any(|(c, _)| *c == CellPos::new(1, 1)));
    }

    #[test]
    fn occupants_round_trip() {
        let mut grid = PathGrid::new(2, 2, 1.0);
        let pos = CellPos::new(0, 0);
        grid.add_occupant(pos, 7);
        assert_eq!(grid.occupants(pos), &[7]);
        grid.remove_occupant(pos, 7);
        assert!(grid.occupants(pos).is_empty());
    }
}
