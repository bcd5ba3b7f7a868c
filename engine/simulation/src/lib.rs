//! Wires the ECS World together with the pathfinding, camera and input crates into a
//! single tickable simulation: component/resource registration, system priority order,
//! and the entity factories that turn catalog keys into live entities.

pub mod components;
pub mod entity_id;
pub mod events;
pub mod lifecycle;
pub mod resources;
mod systems;

pub use lifecycle::{spawn_building, spawn_unit, SpawnError};
pub use systems::{AiSystem, CombatSystem, PathfindingSystem, ProjectileSystem, SelectionSystem, UnitMovementSystem};

use ecs::{EcsWorld, SystemFailure, WorldExt};

use components::*;
use events::EventQueue;
use resources::{CameraResource, PendingCommands, PlayerFaction, SimTime};

/// System priorities, ascending, matching the recommended tick order: pathfinding
/// resolves before movement consumes it, selection applies input before combat reads
/// `Target`, and AI runs last so it can issue fresh requests for next tick.
mod priority {
    pub const PATHFINDING: u32 = 10;
    pub const MOVEMENT: u32 = 20;
    pub const SELECTION: u32 = 30;
    pub const COMBAT: u32 = 40;
    pub const PROJECTILES: u32 = 45;
    pub const AI: u32 = 50;
    pub const DEATH_SWEEP: u32 = 60;
}

/// Builds a fresh `EcsWorld` with every component type registered, the simulation's
/// resources inserted, and the full system pipeline wired in priority order.
pub fn build_world(
    grid: pathfinding::PathGrid,
    viewport_width: u32,
    viewport_height: u32,
    player_faction: catalog::Faction,
) -> EcsWorld {
    let mut world = EcsWorld::new();

    world.register::<Transform>();
    world.register::<Velocity>();
    world.register::<PathFollower>();
    world.register::<Sprite>();
    world.register::<Selectable>();
    world.register::<Combat>();
    world.register::<Target>();
    world.register::<AiControlled>();
    world.register::<Building>();
    world.register::<Projectile>();
    world.register::<FactionAffinity>();

    world.insert(SimTime::default());
    world.insert(PendingCommands::default());
    world.insert(EventQueue::default());
    world.insert(PlayerFaction(player_faction));
    world.insert(CameraResource(camera::Camera::new(viewport_width, viewport_height)));
    world.insert(pathfinding::Pathfinder::new(grid));

    world.add_system(priority::PATHFINDING, "pathfinding", Box::new(PathfindingSystem));
    world.add_system(priority::MOVEMENT, "unit_movement", Box::new(UnitMovementSystem));
    world.add_system(priority::SELECTION, "selection", Box::new(SelectionSystem));
    world.add_system(priority::COMBAT, "combat", Box::new(CombatSystem));
    world.add_system(priority::PROJECTILES, "projectiles", Box::new(ProjectileSystem));
    world.add_system(priority::AI, "ai", Box::new(AiSystem::new()));
    world.add_system(priority::DEATH_SWEEP, "death_sweep", Box::new(lifecycle::DeathSystem));

    world
}

/// Advances the simulation by one fixed tick of `dt_seconds`, running every registered
/// system in priority order and committing structural mutations atomically at the end.
/// Returns any system failures observed this tick (see `ecs::EcsWorld::tick`), for the
/// caller to forward to its diagnostic channel.
pub fn tick(world: &mut EcsWorld, dt_seconds: f32) -> Vec<SystemFailure> {
    {
        let mut sim_time = world.write_resource::<SimTime>();
        sim_time.now += dt_seconds;
        sim_time.dt = dt_seconds;
    }
    world.tick()
}
