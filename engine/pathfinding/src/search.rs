use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use common::OrderedFloat;
use unit::CellPos;

use crate::grid::PathGrid;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

fn octile_heuristic(a: CellPos, b: CellPos) -> f32 {
    let dx = (a.x - b.x).abs() as f32;
    let dy = (a.y - b.y).abs() as f32;
    dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
}

/// Open-set entry. `BinaryHeap` is a max-heap, so `Ord` is reversed on the f-score to make
/// it behave as a min-heap; ties are broken towards the larger g-score by keeping g
/// ascending in the same reversed comparison.
#[derive(Copy, Clone, PartialEq)]
struct ScoredCell {
    f: OrderedFloat<f32>,
    g: OrderedFloat<f32>,
    cell: CellPos,
}

impl Eq for ScoredCell {}

impl Ord for ScoredCell {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
    }
}

impl PartialOrd for ScoredCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) enum StepResult {
    Found(Vec<CellPos>),
    Pending,
    Exhausted,
}

/// Resumable A* search over a single start/goal pair. Expansion is budget-limited per
/// call to `step`, preserving the open/closed sets between calls so a search can span
/// several ticks.
pub(crate) struct SearchState {
    open: BinaryHeap<ScoredCell>,
    g_score: HashMap<CellPos, f32>,
    came_from: HashMap<CellPos, CellPos>,
    closed: HashSet<CellPos>,
    goal: CellPos,
}

impl SearchState {
    pub fn new(start: CellPos, goal: CellPos) -> Self {
        let mut open = BinaryHeap::new();
        let mut g_score = HashMap::new();
        g_score.insert(start, 0.0);
        open.push(ScoredCell {
            f: OrderedFloat(octile_heuristic(start, goal)),
            g: OrderedFloat(0.0),
            cell: start,
        });

        Self {
            open,
            g_score,
            came_from: HashMap::new(),
            closed: HashSet::new(),
            goal,
        }
    }

    /// Number of cells fully expanded (popped from the open set and closed) so far,
    /// across every call to `step`. Used by the caller to measure per-tick progress.
    pub fn expanded_count(&self) -> usize {
        self.closed.len()
    }

    /// Expands up to `budget` nodes from the open set. `Exhausted` means the open set
    /// ran dry before reaching the goal - unreachable from the start cell.
    pub fn step(&mut self, grid: &PathGrid, budget: usize) -> StepResult {
        let mut expanded = 0;

        while expanded < budget {
            let current = match self.open.pop() {
                Some(c) => c,
                None => return StepResult::Exhausted,
            };

            if self.closed.contains(&current.cell) {
                continue;
            }

            if current.cell == self.goal {
                return StepResult::Found(self.reconstruct(current.cell));
            }

            self.closed.insert(current.cell);
            expanded += 1;

            for (neighbour, step_cost) in grid.neighbours(current.cell) {
                if self.closed.contains(&neighbour) {
                    continue;
                }

                let tentative_g = current.g.0 + step_cost;
                let improves = self
                    .g_score
                    .get(&neighbour)
                    .map_or(true, |&g| tentative_g < g);

                if improves {
                    self.g_score.insert(neighbour, tentative_g);
                    self.came_from.insert(neighbour, current.cell);
                    let f = tentative_g + octile_heuristic(neighbour, self.goal);
                    self.open.push(ScoredCell {
                        f: OrderedFloat(f),
                        g: OrderedFloat(tentative_g),
                        cell: neighbour,
                    });
                }
            }
        }

        StepResult::Pending
    }

    /// Cells currently in the open set, for debug visualization.
    pub fn open_cells(&self) -> Vec<CellPos> {
        self.open.iter().map(|s| s.cell).collect()
    }

    pub fn closed_cells(&self) -> Vec<CellPos> {
        self.closed.iter().copied().collect()
    }

    fn reconstruct(&self, mut cell: CellPos) -> Vec<CellPos> {
        let mut path = vec![cell];
        while let Some(&prev) = self.came_from.get(&cell) {
            path.push(prev);
            cell = prev;
        }
        path.pop(); // drop the start cell, excluded from the result
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PathGrid;

    #[test]
    fn finds_straight_path() {
        let grid = PathGrid::new(10, 10, 1.0);
        let mut state = SearchState::new(CellPos::new(0, 0), CellPos::new(3, 0));
        let path = loop {
            match state.step(&grid, 1000) {
                StepResult::Found(p) => break p,
                StepResult::Pending => continue,
                StepResult::Exhausted => panic!("should be reachable"),
            }
        };
        assert_eq!(path.last(), Some(&CellPos::new(3, 0)));
        assert!(!path.contains(&CellPos::new(0, 0)));
    }

    #[test]
    fn resumes_across_calls() {
        let grid = PathGrid::new(20, 20, 1.0);
        let mut state = SearchState::new(CellPos::new(0, 0), CellPos::new(19, 19));

        let mut found = None;
        for _ in 0..1000 {
            match state.step(&grid, 1) {
                StepResult::Found(p) => {
                    found = Some(p);
                    break;
                }
                StepResult::Pending => continue,
                StepResult::Exhausted => panic!("should be reachable"),
            }
        }
        assert!(found.is_some());
    }

    #[test]
    fn unreachable_goal_exhausts() {
        let mut grid = PathGrid::new(5, 5, 1.0);
        for y in 0..5 {
            grid.set_passable(CellPos::new(2, y), false);
        }
        let mut state = SearchState::new(CellPos::new(0, 0), CellPos::new(4, 4));
        let result = loop {
            match state.step(&grid, 1000) {
                StepResult::Pending => continue,
                other => break other,
            }
        };
        assert!(matches!(result, StepResult::Exhausted));
    }
}
