//! Entity factories from catalog keys, and the tick-end death sweep.

use catalog::{BuildingDefinition, Registry, UnitDefinition};
use common::thiserror::Error;
use ecs::{Builder, ComponentWorld, EcsWorld, Entity};
use unit::{CellPos, WorldPoint};

use crate::components::{
    AiControlled, AiState, Building, Combat, DrawLayer, Faction, FactionAffinity, LoopPolicy,
    PathFollower, Selectable, SelectionState, Sprite, Target, Transform, Velocity, Weapon,
};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("no unit or infantry definition for catalog key '{0}'")]
    UnknownUnit(String),

    #[error("no building definition for catalog key '{0}'")]
    UnknownBuilding(String),
}

/// Spawns a unit entity from its catalog key at `position`, wiring up the full component
/// set a mobile combatant needs: transform, velocity, sprite, selectable, combat, target
/// and (if `ai_controlled`) an `AiControlled` state machine leashed to its spawn point.
pub fn spawn_unit(
    world: &mut EcsWorld,
    catalog: &Registry,
    key: &str,
    position: WorldPoint,
    color: color::ColorRgb,
    ai_controlled: bool,
) -> Result<Entity, SpawnError> {
    let def: &UnitDefinition = catalog
        .unit(key)
        .ok_or_else(|| SpawnError::UnknownUnit(key.to_owned()))?;

    let faction: Faction = def.faction;
    let weapon = def.weapon.as_ref().map(Weapon::from);

    let mut builder = world
        .spawn()
        .with(Transform::new(position))
        .with(Velocity {
            target: position,
            desired_speed_cells_per_sec: def.speed_cells_per_sec,
            current_speed_cells_per_sec: 0.0,
            arrival_tolerance: 0.1,
        })
        .with(Sprite {
            sprite_key: def.sprites.sprite_key.clone(),
            frame_index: 0,
            frame_count: def.sprites.frame_count,
            frame_rate: def.sprites.frame_rate,
            animation_phase: 0.0,
            loop_policy: LoopPolicy::Loop,
            tint: color,
            layer: DrawLayer::Unit,
        })
        .with(Selectable {
            radius_cells: 0.5,
            state: SelectionState::Unselected,
            faction,
        })
        .with(FactionAffinity { faction, color })
        .with(Combat {
            max_hp: def.max_hp,
            current_hp: def.max_hp,
            weapon,
            last_fired: f32::NEG_INFINITY,
        })
        .with(Target::default());

    if ai_controlled {
        builder = builder
            .with(AiControlled {
                state: AiState::Idle,
                acquisition_radius_cells: def.acquisition_radius_cells,
                leash_origin: position,
            })
            .with(PathFollower::new(Vec::new()));
    }

    Ok(Entity::from(builder.build()))
}

/// Spawns a building entity from its catalog key at `position`, static and stationary:
/// no `Velocity`/`PathFollower`, but still selectable and able to carry a defensive
/// weapon if the catalog entry names one.
pub fn spawn_building(
    world: &mut EcsWorld,
    catalog: &Registry,
    key: &str,
    position: WorldPoint,
    color: color::ColorRgb,
) -> Result<Entity, SpawnError> {
    let def: &BuildingDefinition = catalog
        .building(key)
        .ok_or_else(|| SpawnError::UnknownBuilding(key.to_owned()))?;

    let faction: Faction = def.faction;
    let weapon = def.weapon.as_ref().map(Weapon::from);
    let exit_cell = CellPos::new(def.exit_cell.0, def.exit_cell.1);

    let entity = world
        .spawn()
        .with(Transform::new(position))
        .with(Sprite {
            sprite_key: def.sprites.sprite_key.clone(),
            frame_index: 0,
            frame_count: def.sprites.frame_count,
            frame_rate: def.sprites.frame_rate,
            animation_phase: 0.0,
            loop_policy: LoopPolicy::Loop,
            tint: color,
            layer: DrawLayer::Building,
        })
        .with(Selectable {
            radius_cells: def.footprint.0.max(def.footprint.1) as f32 * 0.5,
            state: SelectionState::Unselected,
            faction,
        })
        .with(FactionAffinity { faction, color })
        .with(Combat {
            max_hp: def.max_hp,
            current_hp: def.max_hp,
            weapon,
            last_fired: f32::NEG_INFINITY,
        })
        .with(Target::default())
        .with(Building {
            footprint: def.footprint,
            construction_progress: 1.0,
            exit_cell,
        })
        .build();

    Ok(Entity::from(entity))
}

/// Despawns any entity whose `Combat.current_hp` has reached zero, pushing a `Died`
/// event for each so the renderer can play a death animation before the next tick's
/// `maintain()` actually removes it.
pub struct DeathSystem;

impl<'a> ecs::System<'a> for DeathSystem {
    type SystemData = (
        ecs::Entities<'a>,
        ecs::Write<'a, crate::events::EventQueue>,
        ecs::WriteExpect<'a, pathfinding::Pathfinder>,
        ecs::ReadStorage<'a, Combat>,
        ecs::WriteStorage<'a, PathFollower>,
    );

    fn run(&mut self, (entities, mut events, mut pathfinder, combat, mut follower): Self::SystemData) {
        use ecs::Join;

        for (e, c) in (&entities, &combat).join() {
            if c.is_dead() {
                let e = Entity::from(e);
                if let Some(f) = follower.get_mut(*e) {
                    if let Some(request_id) = f.active_request.take() {
                        pathfinder.cancel(request_id);
                    }
                }
                events.push(crate::events::GameEvent::Died { entity: e });
                let _ = entities.delete(*e);
            }
        }
    }
}
