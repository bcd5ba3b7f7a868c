//! Budgeted, resumable A* pathfinding over a 2D battlefield grid.
//!
//! Callers own a [`Pathfinder`], enqueue [`Pathfinder::request`]s as units need to move,
//! and call [`Pathfinder::tick`] once per simulation tick to advance every in-flight
//! search by its share of the per-tick node budget. Deciding *when* to request a replan
//! (path blocked, goal moved, stale plan) is the caller's job - this crate only knows
//! about grid cells and search budgets, not units or targets.

mod grid;
mod pathfinder;
mod search;

pub use grid::{Cell, EntityId, PathGrid};
pub use pathfinder::{
    DebugSnapshot, PathError, PathStatus, Pathfinder, RequestId, DEFAULT_ABANDON_TICKS,
    DEFAULT_BUDGET_PER_TICK,
};
