use ecs::{Entities, Join, LazyUpdate, Read, ReadExpect, ReadStorage, System, Write, WriteStorage};

use crate::components::{Combat, CommandKind, FactionAffinity, Projectile, Target, Transform, WeaponKind};
use crate::events::{EventQueue, GameEvent};
use crate::resources::SimTime;

/// Range, in cells, within which a shot is resolved instantly rather than spawning a
/// `Projectile` entity that travels to its target.
const HITSCAN_RANGE_CELLS: f32 = 1.5;

pub struct CombatSystem;

impl<'a> System<'a> for CombatSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, SimTime>,
        Read<'a, LazyUpdate>,
        ReadExpect<'a, pathfinding::Pathfinder>,
        Write<'a, EventQueue>,
        ReadStorage<'a, Transform>,
        ReadStorage<'a, FactionAffinity>,
        WriteStorage<'a, Combat>,
        WriteStorage<'a, Target>,
    );

    fn run(
        &mut self,
        (entities, sim_time, lazy, pathfinder, mut events, transform, affinity, mut combat, mut target): Self::SystemData,
    ) {
        let now = sim_time.now;
        let cell_size = pathfinder.grid().cell_size();

        for (e, t, target) in (&entities, &transform, &mut target).join() {
            let e = ecs::Entity::from(e);

            let enemy = match target.entity {
                Some(enemy) if entities.is_alive(*enemy) => enemy,
                _ => {
                    if target.command == CommandKind::AttackMove {
                        if let Some(enemy) =
                            acquire_attack_move_target(e, t.position, &entities, &transform, &combat, &affinity)
                        {
                            target.entity = Some(enemy);
                            target.command = CommandKind::AttackTarget;
                        }
                    }
                    continue;
                }
            };

            let enemy_pos = match transform.get(*enemy) {
                Some(enemy_transform) => enemy_transform.position,
                None => continue,
            };

            let (weapon_range, weapon_kind, cooldown, damage, last_fired) = {
                let attacker_combat = match combat.get(*e) {
                    Some(c) if !c.is_dead() => c,
                    _ => continue,
                };
                let weapon = match &attacker_combat.weapon {
                    Some(w) => w,
                    None => continue,
                };
                (
                    weapon.range_cells,
                    weapon.kind,
                    weapon.cooldown_secs,
                    weapon.damage,
                    attacker_combat.last_fired,
                )
            };

            let cells_away = t.position.to_cell(cell_size).octile_distance(enemy_pos.to_cell(cell_size));
            let in_range = (cells_away as f32) <= weapon_range;

            if !in_range {
                continue;
            }

            if now - last_fired < cooldown {
                continue;
            }
            combat.get_mut(*e).expect("checked above").last_fired = now;

            if weapon_range <= HITSCAN_RANGE_CELLS {
                if let Some(victim) = combat.get_mut(*enemy) {
                    victim.current_hp = (victim.current_hp - damage).max(0.0);
                }
            } else {
                let speed = match weapon_kind {
                    WeaponKind::Projectile { speed_cells_per_sec } => speed_cells_per_sec,
                    WeaponKind::Melee => HITSCAN_RANGE_CELLS,
                };
                let origin = t.position;
                lazy.exec_mut(move |world| {
                    use ecs::{Builder, WorldExt};
                    world
                        .create_entity()
                        .with(crate::components::Transform::new(origin))
                        .with(Projectile {
                            target: enemy,
                            damage,
                            speed_cells_per_sec: speed,
                        })
                        .build();
                });
            }

            events.push(GameEvent::WeaponFired { attacker: e, target: enemy });
        }
    }
}

/// Looks for the nearest living enemy within `attacker`'s weapon range, for attack-move
/// units that haven't acquired a target yet. Uses the same range the in-range check
/// above uses, so a unit engages as soon as an enemy comes within firing distance of
/// its current path, rather than needing a separate acquisition radius.
fn acquire_attack_move_target(
    attacker: ecs::Entity,
    attacker_pos: unit::WorldPoint,
    entities: &Entities<'_>,
    transform: &ReadStorage<'_, Transform>,
    combat: &WriteStorage<'_, Combat>,
    affinity: &ReadStorage<'_, FactionAffinity>,
) -> Option<ecs::Entity> {
    let attacker_combat = combat.get(*attacker).filter(|c| !c.is_dead())?;
    let range = attacker_combat.weapon.as_ref()?.range_cells;
    let my_faction = affinity.get(*attacker).map(|a| a.faction);

    let mut best: Option<(ecs::Entity, f32)> = None;
    for (candidate, t, c, a) in (entities, transform, combat, affinity).join() {
        let candidate = ecs::Entity::from(candidate);
        if candidate == attacker || c.is_dead() {
            continue;
        }
        if my_faction.map(|f| f == a.faction).unwrap_or(false) {
            continue;
        }
        let dist2 = attacker_pos.distance2(t.position);
        if dist2 <= range * range && best.map(|(_, best_dist2)| dist2 < best_dist2).unwrap_or(true) {
            best = Some((candidate, dist2));
        }
    }
    best.map(|(e, _)| e)
}

/// Steps in-flight `Projectile` entities towards their target and applies damage on
/// arrival, deleting the projectile regardless of whether the target was still alive.
pub struct ProjectileSystem;

impl<'a> System<'a> for ProjectileSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, SimTime>,
        WriteStorage<'a, Transform>,
        WriteStorage<'a, Projectile>,
        WriteStorage<'a, Combat>,
    );

    fn run(&mut self, (entities, sim_time, mut transform, projectile, mut combat): Self::SystemData) {
        use common::InnerSpace;

        let dt = sim_time.dt;
        let mut arrived = Vec::new();

        for (e, p) in (&entities, &projectile).join() {
            let e = ecs::Entity::from(e);

            let target_pos = match transform.get(*p.target) {
                Some(t) => t.position,
                None => {
                    arrived.push(e);
                    continue;
                }
            };

            let my_pos = match transform.get(*e) {
                Some(t) => t.position,
                None => continue,
            };

            let to_target = target_pos - my_pos;
            let distance = to_target.magnitude();
            let step = p.speed_cells_per_sec.max(0.0) * dt;

            if distance <= step.max(f32::EPSILON) {
                if let Some(victim) = combat.get_mut(*p.target) {
                    victim.current_hp = (victim.current_hp - p.damage).max(0.0);
                }
                arrived.push(e);
            } else if let Some(t) = transform.get_mut(*e) {
                t.position += to_target.normalize_to(step);
            }
        }

        for e in arrived {
            let _ = entities.delete(*e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecs::{Builder, ComponentWorld, EcsWorld, RunNow, WorldExt};
    use unit::WorldPoint;

    fn test_world() -> EcsWorld {
        let grid = pathfinding::PathGrid::new(16, 16, 1.0);
        crate::build_world(grid, 800, 600, catalog::Faction::Gdi)
    }

    fn unit_at(world: &mut EcsWorld, pos: WorldPoint, weapon: Option<crate::components::Weapon>) -> ecs::Entity {
        let e = world
            .create_entity()
            .with(Transform::new(pos))
            .with(Combat {
                max_hp: 20.0,
                current_hp: 20.0,
                weapon,
                last_fired: f32::NEG_INFINITY,
            })
            .with(Target::default())
            .build();
        ecs::Entity::from(e)
    }

    fn melee_weapon() -> crate::components::Weapon {
        crate::components::Weapon {
            damage: 5.0,
            cooldown_secs: 1.0,
            range_cells: 1.0,
            kind: WeaponKind::Melee,
        }
    }

    #[test]
    fn hitscan_attack_applies_damage_immediately() {
        let mut world = test_world();
        let attacker = unit_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), Some(melee_weapon()));
        let victim = unit_at(&mut world, WorldPoint::new(1.0, 0.0).unwrap(), None);
        world
            .component_mut::<Target>(attacker)
            .unwrap()
            .entity = Some(victim);
        world.maintain();

        let mut system = CombatSystem;
        RunNow::run_now(&mut system, &world);
        world.maintain();

        let victim_combat = world.component::<Combat>(victim).unwrap();
        assert_eq!(victim_combat.current_hp, 15.0);
    }

    #[test]
    fn weapon_on_cooldown_does_not_fire_twice_in_one_tick() {
        let mut world = test_world();
        let attacker = unit_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), Some(melee_weapon()));
        let victim = unit_at(&mut world, WorldPoint::new(1.0, 0.0).unwrap(), None);
        world
            .component_mut::<Target>(attacker)
            .unwrap()
            .entity = Some(victim);
        world.maintain();

        let mut system = CombatSystem;
        RunNow::run_now(&mut system, &world);
        RunNow::run_now(&mut system, &world);
        world.maintain();

        // the first run_now fires (last_fired starts at -inf); the second is blocked by
        // cooldown since sim_time.now never advances between the two calls here
        let victim_combat = world.component::<Combat>(victim).unwrap();
        assert_eq!(victim_combat.current_hp, 15.0);
    }

    #[test]
    fn attack_move_unit_acquires_enemy_within_weapon_range() {
        let mut world = test_world();
        let attacker = unit_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), Some(melee_weapon()));
        let enemy = unit_at(&mut world, WorldPoint::new(1.0, 0.0).unwrap(), None);
        world.add_component(
            attacker,
            FactionAffinity { faction: catalog::Faction::Gdi, color: color::ColorRgb::new_float(1.0, 1.0, 1.0) },
        );
        world.add_component(
            enemy,
            FactionAffinity { faction: catalog::Faction::Nod, color: color::ColorRgb::new_float(1.0, 1.0, 1.0) },
        );
        world.component_mut::<Target>(attacker).unwrap().command = CommandKind::AttackMove;
        world.maintain();

        let mut system = CombatSystem;
        RunNow::run_now(&mut system, &world);
        world.maintain();

        let target = world.component::<Target>(attacker).unwrap();
        assert_eq!(target.entity, Some(enemy));
        assert_eq!(target.command, CommandKind::AttackTarget);
    }

    #[test]
    fn attack_move_unit_ignores_enemy_outside_weapon_range() {
        let mut world = test_world();
        let attacker = unit_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), Some(melee_weapon()));
        let enemy = unit_at(&mut world, WorldPoint::new(10.0, 0.0).unwrap(), None);
        world.add_component(
            attacker,
            FactionAffinity { faction: catalog::Faction::Gdi, color: color::ColorRgb::new_float(1.0, 1.0, 1.0) },
        );
        world.add_component(
            enemy,
            FactionAffinity { faction: catalog::Faction::Nod, color: color::ColorRgb::new_float(1.0, 1.0, 1.0) },
        );
        world.component_mut::<Target>(attacker).unwrap().command = CommandKind::AttackMove;
        world.maintain();

        let mut system = CombatSystem;
        RunNow::run_now(&mut system, &world);
        world.maintain();

        let target = world.component::<Target>(attacker).unwrap();
        assert_eq!(target.entity, None);
        assert_eq!(target.command, CommandKind::AttackMove);
    }

    #[test]
    fn out_of_range_target_is_ignored() {
        let mut world = test_world();
        let attacker = unit_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), Some(melee_weapon()));
        let victim = unit_at(&mut world, WorldPoint::new(10.0, 0.0).unwrap(), None);
        world
            .component_mut::<Target>(attacker)
            .unwrap()
            .entity = Some(victim);
        world.maintain();

        let mut system = CombatSystem;
        RunNow::run_now(&mut system, &world);
        world.maintain();

        let victim_combat = world.component::<Combat>(victim).unwrap();
        assert_eq!(victim_combat.current_hp, 20.0);
    }
}
