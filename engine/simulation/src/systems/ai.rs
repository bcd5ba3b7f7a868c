use common::logging::prelude::*;
use ecs::{Entities, Join, Read, ReadStorage, System, WriteExpect, WriteStorage};

use crate::components::{AiControlled, AiState, Combat, CommandKind, FactionAffinity, PathFollower, Target, Transform};
use crate::entity_id::to_path_entity_id;
use crate::resources::SimTime;

/// Upper bound on how many AI-controlled entities are scanned for enemies in one tick;
/// the rest are scanned on subsequent ticks in round-robin order (spec's amortized scan).
const MAX_SCANS_PER_TICK: usize = 32;

pub struct AiSystem {
    scan_cursor: usize,
}

impl AiSystem {
    pub fn new() -> Self {
        Self { scan_cursor: 0 }
    }
}

impl Default for AiSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> System<'a> for AiSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, SimTime>,
        WriteExpect<'a, pathfinding::Pathfinder>,
        ReadStorage<'a, Transform>,
        ReadStorage<'a, Combat>,
        ReadStorage<'a, FactionAffinity>,
        WriteStorage<'a, Target>,
        WriteStorage<'a, AiControlled>,
        WriteStorage<'a, PathFollower>,
    );

    fn run(
        &mut self,
        (entities, sim_time, mut pathfinder, transform, combat, affinity, mut target, mut ai, mut follower): Self::SystemData,
    ) {
        let retreat_threshold = config::get().simulation.retreat_hp_fraction;
        let cell_size = pathfinder.grid().cell_size();

        let controlled: Vec<ecs::Entity> = (&entities, &ai)
            .join()
            .map(|(e, _)| ecs::Entity::from(e))
            .collect();
        if controlled.is_empty() {
            return;
        }

        let scan_budget = MAX_SCANS_PER_TICK.min(controlled.len());

        for offset in 0..controlled.len() {
            let e = controlled[(self.scan_cursor + offset) % controlled.len()];
            let may_scan = offset < scan_budget;

            let (state, acquisition_radius, leash_origin) = {
                let a = match ai.get(*e) {
                    Some(a) => a,
                    None => continue,
                };
                (a.state, a.acquisition_radius_cells, a.leash_origin)
            };

            let my_pos = match transform.get(*e) {
                Some(t) => t.position,
                None => continue,
            };
            let my_hp_fraction = combat.get(*e).map(Combat::hp_fraction).unwrap_or(1.0);
            let my_faction = affinity.get(*e).map(|a| a.faction);

            let nearest_enemy = |radius_cells: f32| -> Option<ecs::Entity> {
                let mut best: Option<(ecs::Entity, f32)> = None;
                for (candidate, t, c, a) in (&entities, &transform, &combat, &affinity).join() {
                    let candidate = ecs::Entity::from(candidate);
                    if candidate == e || c.is_dead() {
                        continue;
                    }
                    if my_faction.map(|f| f == a.faction).unwrap_or(false) {
                        continue;
                    }
                    let dist2 = my_pos.distance2(t.position);
                    if dist2 <= radius_cells * radius_cells
                        && best.map(|(_, best_dist2)| dist2 < best_dist2).unwrap_or(true)
                    {
                        best = Some((candidate, dist2));
                    }
                }
                best.map(|(e, _)| e)
            };

            let next_state = match state {
                AiState::Idle if may_scan => {
                    match nearest_enemy(acquisition_radius) {
                        Some(enemy) => {
                            if let Some(t) = target.get_mut(*e) {
                                t.entity = Some(enemy);
                                t.command = CommandKind::AttackTarget;
                            }
                            AiState::Pursuing
                        }
                        None => AiState::Idle,
                    }
                }
                AiState::Idle => AiState::Idle,
                AiState::Pursuing => {
                    let current_target = target.get(*e).and_then(|t| t.entity);
                    match current_target.filter(|&t| entities.is_alive(*t)) {
                        None => AiState::Idle,
                        Some(enemy) => {
                            let weapon_range = combat.get(*e).and_then(|c| c.weapon.as_ref()).map(|w| w.range_cells);
                            let enemy_pos = transform.get(*enemy).map(|t| t.position);
                            match (weapon_range, enemy_pos) {
                                (Some(range), Some(enemy_pos)) => {
                                    let cells_away =
                                        my_pos.to_cell(cell_size).octile_distance(enemy_pos.to_cell(cell_size));
                                    if (cells_away as f32) <= range {
                                        AiState::Engaging
                                    } else {
                                        let start = my_pos.to_cell(cell_size);
                                        let goal = enemy_pos.to_cell(cell_size);
                                        if let Ok(id) = pathfinder.request(to_path_entity_id(e), start, goal, 1) {
                                            follower
                                                .entry(*e)
                                                .expect("entity must exist")
                                                .or_insert_with(|| PathFollower::new(Vec::new()))
                                                .active_request = Some(id);
                                        }
                                        AiState::Pursuing
                                    }
                                }
                                _ => AiState::Idle,
                            }
                        }
                    }
                }
                AiState::Engaging => {
                    let current_target = target.get(*e).and_then(|t| t.entity);
                    let target_alive = current_target.map(|t| entities.is_alive(*t)).unwrap_or(false);
                    if !target_alive {
                        AiState::Idle
                    } else if my_hp_fraction < retreat_threshold {
                        debug!("retreating"; "entity" => e, "hp_fraction" => my_hp_fraction);
                        AiState::Retreating
                    } else {
                        AiState::Engaging
                    }
                }
                AiState::Retreating => {
                    let cells_away = my_pos.to_cell(cell_size).octile_distance(leash_origin.to_cell(cell_size));
                    if cells_away == 0 {
                        if let Some(t) = target.get_mut(*e) {
                            t.entity = None;
                            t.command = CommandKind::Idle;
                        }
                        AiState::Idle
                    } else {
                        if let Some(t) = target.get_mut(*e) {
                            t.command = CommandKind::Move;
                        }
                        let start = my_pos.to_cell(cell_size);
                        let goal = leash_origin.to_cell(cell_size);
                        if let Ok(id) = pathfinder.request(to_path_entity_id(e), start, goal, 1) {
                            follower
                                .entry(*e)
                                .expect("entity must exist")
                                .or_insert_with(|| PathFollower::new(Vec::new()))
                                .active_request = Some(id);
                        }
                        AiState::Retreating
                    }
                }
            };

            if let Some(a) = ai.get_mut(*e) {
                a.state = next_state;
            }
        }

        self.scan_cursor = (self.scan_cursor + scan_budget) % controlled.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecs::{Builder, ComponentWorld, EcsWorld, RunNow, WorldExt};
    use unit::WorldPoint;

    fn test_world() -> EcsWorld {
        let grid = pathfinding::PathGrid::new(32, 32, 1.0);
        crate::build_world(grid, 800, 600, catalog::Faction::Gdi)
    }

    fn combatant(world: &mut EcsWorld, pos: WorldPoint, faction: catalog::Faction) -> ecs::Entity {
        let color = color::ColorRgb::new_float(1.0, 1.0, 1.0);
        let e = world
            .create_entity()
            .with(Transform::new(pos))
            .with(Combat {
                max_hp: 10.0,
                current_hp: 10.0,
                weapon: None,
                last_fired: f32::NEG_INFINITY,
            })
            .with(FactionAffinity { faction, color })
            .with(Target::default())
            .build();
        ecs::Entity::from(e)
    }

    #[test]
    fn idle_ai_acquires_nearby_enemy_and_starts_pursuing() {
        let mut world = test_world();
        let friendly = combatant(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), catalog::Faction::Gdi);
        world.add_component(
            friendly,
            AiControlled {
                state: AiState::Idle,
                acquisition_radius_cells: 10.0,
                leash_origin: WorldPoint::new(0.0, 0.0).unwrap(),
            },
        );
        let enemy = combatant(&mut world, WorldPoint::new(3.0, 0.0).unwrap(), catalog::Faction::Nod);
        world.maintain();

        let mut system = AiSystem::new();
        RunNow::run_now(&mut system, &world);

        let ai = world.component::<AiControlled>(friendly).unwrap();
        assert_eq!(ai.state, AiState::Pursuing);
        let target = world.component::<Target>(friendly).unwrap();
        assert_eq!(target.entity, Some(enemy));
    }

    #[test]
    fn pursuing_ai_out_of_weapon_range_stores_its_path_request() {
        let mut world = test_world();
        let friendly = combatant(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), catalog::Faction::Gdi);
        world.component_mut::<Combat>(friendly).unwrap().weapon = Some(crate::components::Weapon {
            damage: 5.0,
            cooldown_secs: 1.0,
            range_cells: 1.0,
            kind: crate::components::WeaponKind::Melee,
        });
        world.add_component(
            friendly,
            AiControlled {
                state: AiState::Pursuing,
                acquisition_radius_cells: 20.0,
                leash_origin: WorldPoint::new(0.0, 0.0).unwrap(),
            },
        );
        let enemy = combatant(&mut world, WorldPoint::new(5.0, 0.0).unwrap(), catalog::Faction::Nod);
        world.component_mut::<Target>(friendly).unwrap().entity = Some(enemy);
        world.maintain();

        let mut system = AiSystem::new();
        RunNow::run_now(&mut system, &world);

        let follower = world.component::<PathFollower>(friendly).unwrap();
        assert!(follower.active_request.is_some(), "pursuing out of range should issue and keep a path request");
    }

    #[test]
    fn idle_ai_ignores_enemies_outside_acquisition_radius() {
        let mut world = test_world();
        let friendly = combatant(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), catalog::Faction::Gdi);
        world.add_component(
            friendly,
            AiControlled {
                state: AiState::Idle,
                acquisition_radius_cells: 2.0,
                leash_origin: WorldPoint::new(0.0, 0.0).unwrap(),
            },
        );
        combatant(&mut world, WorldPoint::new(50.0, 0.0).unwrap(), catalog::Faction::Nod);
        world.maintain();

        let mut system = AiSystem::new();
        RunNow::run_now(&mut system, &world);

        let ai = world.component::<AiControlled>(friendly).unwrap();
        assert_eq!(ai.state, AiState::Idle);
    }
}
