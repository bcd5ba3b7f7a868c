use std::collections::HashMap;

use common::thiserror::Error;
use unit::CellPos;

use crate::grid::{EntityId, PathGrid};
use crate::search::{SearchState, StepResult};

pub const DEFAULT_BUDGET_PER_TICK: usize = 20_000;
pub const DEFAULT_ABANDON_TICKS: u32 = 3;

pub type RequestId = u64;

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum PathError {
    #[error("start or goal cell is outside the grid bounds")]
    OutOfBounds,

    #[error("no path exists between start and goal")]
    Unreachable,

    #[error("search made no progress for {0} ticks in a row and was abandoned")]
    BudgetExhausted(u32),
}

#[derive(Debug, Clone)]
pub enum PathStatus {
    Pending,
    Found(Vec<CellPos>),
    Failed(PathError),
}

struct Request {
    id: RequestId,
    #[allow(dead_code)]
    entity: EntityId,
    priority: i32,
    state: SearchState,
}

/// Snapshot of a single in-flight search's open/closed cells, for the debug overlay.
pub struct DebugSnapshot {
    pub open: Vec<CellPos>,
    pub closed: Vec<CellPos>,
}

/// Owns the battlefield grid and every in-flight path search. `tick` expands each
/// in-flight request by a share of the per-tick node budget, round-robin in descending
/// priority order, and is meant to be called once per simulation tick.
pub struct Pathfinder {
    grid: PathGrid,
    budget_per_tick: usize,
    abandon_ticks: u32,
    next_id: RequestId,
    requests: Vec<Request>,
    idle_ticks: HashMap<RequestId, u32>,
    results: HashMap<RequestId, PathStatus>,
}

impl Pathfinder {
    pub fn new(grid: PathGrid) -> Self {
        Self {
            grid,
            budget_per_tick: DEFAULT_BUDGET_PER_TICK,
            abandon_ticks: DEFAULT_ABANDON_TICKS,
            next_id: 0,
            requests: Vec::new(),
            idle_ticks: HashMap::new(),
            results: HashMap::new(),
        }
    }

    pub fn with_budget_per_tick(mut self, budget: usize) -> Self {
        self.budget_per_tick = budget;
        self
    }

    pub fn grid(&self) -> &PathGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut PathGrid {
        &mut self.grid
    }

    /// Enqueues a path request. Out-of-bounds endpoints fail immediately rather than
    /// waiting for a tick to discover it.
    pub fn request(
        &mut self,
        entity: EntityId,
        start: CellPos,
        goal: CellPos,
        priority: i32,
    ) -> Result<RequestId, PathError> {
        if !self.grid.in_bounds(start) || !self.grid.in_bounds(goal) {
            return Err(PathError::OutOfBounds);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.requests.push(Request {
            id,
            entity,
            priority,
            state: SearchState::new(start, goal),
        });
        self.idle_ticks.insert(id, 0);
        Ok(id)
    }

    /// Drops an in-flight or completed request, e.g. on a replan trigger.
    pub fn cancel(&mut self, id: RequestId) {
        self.requests.retain(|r| r.id != id);
        self.idle_ticks.remove(&id);
        self.results.remove(&id);
    }

    pub fn poll(&self, id: RequestId) -> PathStatus {
        self.results
            .get(&id)
            .cloned()
            .unwrap_or(PathStatus::Pending)
    }

    /// Removes and returns a completed result, leaving pending requests untouched.
    pub fn take_result(&mut self, id: RequestId) -> Option<PathStatus> {
        match self.results.get(&id) {
            Some(PathStatus::Pending) | None => None,
            _ => self.results.remove(&id),
        }
    }

    pub fn debug_snapshot(&self, id: RequestId) -> Option<DebugSnapshot> {
        self.requests.iter().find(|r| r.id == id).map(|r| DebugSnapshot {
            open: r.state.open_cells(),
            closed: r.state.closed_cells(),
        })
    }

    pub fn in_flight_count(&self) -> usize {
        self.requests.len()
    }

    /// Advances every in-flight request by its share of this tick's node budget,
    /// highest priority first, and settles any that finish, exhaust, or stall for
    /// `abandon_ticks` consecutive ticks.
    pub fn tick(&mut self) {
        if self.requests.is_empty() {
            return;
        }

        self.requests.sort_by_key(|r| std::cmp::Reverse(r.priority));

        let share = (self.budget_per_tick / self.requests.len()).max(1);
        let mut remaining_budget = self.budget_per_tick;
        let mut finished = Vec::new();

        for request in &mut self.requests {
            if remaining_budget == 0 {
                break;
            }

            let grant = share.min(remaining_budget);
            let expanded_before = request.state.expanded_count();
            let result = request.state.step(&self.grid, grant);
            let spent = request.state.expanded_count() - expanded_before;
            remaining_budget = remaining_budget.saturating_sub(spent);

            match result {
                StepResult::Found(path) => {
                    self.results.insert(request.id, PathStatus::Found(path));
                    finished.push(request.id);
                }
                StepResult::Exhausted => {
                    self.results
                        .insert(request.id, PathStatus::Failed(PathError::Unreachable));
                    finished.push(request.id);
                }
                StepResult::Pending => {
                    let idle = self.idle_ticks.entry(request.id).or_insert(0);
                    if spent == 0 {
                        *idle += 1;
                    } else {
                        *idle = 0;
                    }
                    if *idle >= self.abandon_ticks {
                        self.results.insert(
                            request.id,
                            PathStatus::Failed(PathError::BudgetExhausted(*idle)),
                        );
                        finished.push(request.id);
                    }
                }
            }
        }

        if !finished.is_empty() {
            self.requests.retain(|r| !finished.contains(&r.id));
            for id in &finished {
                self.idle_ticks.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_endpoints() {
        let grid = PathGrid::new(4, 4, 1.0);
        let mut pf = Pathfinder::new(grid);
        assert_eq!(
            pf.request(1, CellPos::new(-1, 0), CellPos::new(1, 1), 0),
            Err(PathError::OutOfBounds)
        );
    }

    #[test]
    fn completes_small_grid_in_one_tick() {
        let grid = PathGrid::new(10, 10, 1.0);
        let mut pf = Pathfinder::new(grid);
        let id = pf.request(1, CellPos::new(0, 0), CellPos::new(9, 9), 0).unwrap();
        pf.tick();
        match pf.take_result(id) {
            Some(PathStatus::Found(path)) => {
                assert_eq!(path.last(), Some(&CellPos::new(9, 9)));
            }
            other => panic!("expected a found path, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn higher_priority_gets_first_share_of_budget() {
        let grid = PathGrid::new(200, 200, 1.0);
        let mut pf = Pathfinder::new(grid).with_budget_per_tick(10);

        let low = pf
            .request(1, CellPos::new(0, 0), CellPos::new(199, 199), 0)
            .unwrap();
        let high = pf
            .request(2, CellPos::new(0, 0), CellPos::new(199, 199), 10)
            .unwrap();

        pf.tick();

        assert!(matches!(pf.poll(high), PathStatus::Pending));
        assert!(matches!(pf.poll(low), PathStatus::Pending));
        // both still searching on a grid this large with so small a budget; the
        // important thing is the pathfinder didn't panic or starve either queue slot.
        assert_eq!(pf.in_flight_count(), 2);
    }

    #[test]
    fn unreachable_goal_resolves_as_failed() {
        let mut grid = PathGrid::new(5, 5, 1.0);
        for y in 0..5 {
            grid.set_passable(CellPos::new(2, y), false);
        }
        let mut pf = Pathfinder::new(grid).with_budget_per_tick(2);
        let id = pf
            .request(1, CellPos::new(0, 0), CellPos::new(4, 4), 0)
            .unwrap();

        for _ in 0..50 {
            pf.tick();
            if let Some(status) = pf.take_result(id) {
                assert!(matches!(status, PathStatus::Failed(PathError::Unreachable)));
                return;
            }
        }
        panic!("expected the unreachable goal to resolve within 50 ticks");
    }
}
