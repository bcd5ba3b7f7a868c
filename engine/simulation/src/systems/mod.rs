mod ai;
mod combat;
mod movement;
mod pathfinding;
mod selection;

pub use ai::AiSystem;
pub use combat::{CombatSystem, ProjectileSystem};
pub use movement::UnitMovementSystem;
pub use pathfinding::PathfindingSystem;
pub use selection::SelectionSystem;
