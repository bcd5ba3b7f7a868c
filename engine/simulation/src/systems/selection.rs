use ecs::{Entities, Join, Read, ReadExpect, ReadStorage, System, Write, WriteExpect, WriteStorage};
use input::{Command, CommandKind as InputCommandKind};
use unit::WorldPoint;

use crate::components::{CommandKind, PathFollower, Selectable, SelectionState, Target, Transform};
use crate::entity_id::to_path_entity_id;
use crate::events::{EventQueue, GameEvent};
use crate::resources::{CameraResource, PendingCommands, PlayerFaction};

pub struct SelectionSystem;

impl<'a> System<'a> for SelectionSystem {
    type SystemData = (
        Entities<'a>,
        Write<'a, PendingCommands>,
        Write<'a, EventQueue>,
        Read<'a, PlayerFaction>,
        ReadExpect<'a, CameraResource>,
        WriteExpect<'a, pathfinding::Pathfinder>,
        ReadStorage<'a, Transform>,
        WriteStorage<'a, Selectable>,
        WriteStorage<'a, Target>,
        WriteStorage<'a, PathFollower>,
    );

    fn run(
        &mut self,
        (entities, mut pending, mut events, player_faction, camera, mut pathfinder, transform, mut selectable, mut target, mut follower): Self::SystemData,
    ) {
        let player_faction = player_faction.0;
        let cell_size = pathfinder.grid().cell_size();
        let commands = std::mem::take(&mut pending.0);

        for command in commands {
            match command {
                Command::SelectAtScreen { x, y, additive } => {
                    let world = screen_to_world(&camera.0, x, y);
                    let picked = pick_frontmost(&entities, &transform, &selectable, world);

                    if !additive {
                        clear_selection(&entities, &mut selectable, &mut events);
                    }
                    if let Some(picked) = picked {
                        toggle_or_select(picked, additive, &mut selectable, &mut events);
                    }
                }
                Command::BoxSelect { x0, y0, x1, y1, additive } => {
                    let w0 = screen_to_world(&camera.0, x0, y0);
                    let w1 = screen_to_world(&camera.0, x1, y1);
                    let (min_x, max_x) = (w0.x().min(w1.x()), w0.x().max(w1.x()));
                    let (min_y, max_y) = (w0.y().min(w1.y()), w0.y().max(w1.y()));

                    if !additive {
                        clear_selection(&entities, &mut selectable, &mut events);
                    }

                    for (e, t, s) in (&entities, &transform, &mut selectable).join() {
                        if s.faction != player_faction {
                            continue;
                        }
                        let (px, py) = t.position.xy();
                        if px >= min_x && px <= max_x && py >= min_y && py <= max_y {
                            let e = ecs::Entity::from(e);
                            set_selected(e, s, true, &mut events);
                        }
                    }
                }
                Command::CommandAtScreen { x, y, kind } => {
                    let world = screen_to_world(&camera.0, x, y);
                    let goal_cell = world.to_cell(cell_size);
                    let enemy_at_point = pick_frontmost(&entities, &transform, &selectable, world)
                        .filter(|&e| selectable.get(*e).map(|s| s.faction != player_faction).unwrap_or(false));

                    let selected: Vec<ecs::Entity> = (&entities, &selectable)
                        .join()
                        .filter(|(_, s)| s.faction == player_faction && s.state == SelectionState::Selected)
                        .map(|(e, _)| ecs::Entity::from(e))
                        .collect();

                    for e in selected {
                        let start = match transform.get(*e) {
                            Some(t) => t.position.to_cell(cell_size),
                            None => continue,
                        };

                        let smart_attack = kind == InputCommandKind::Smart && enemy_at_point.is_some();

                        if let Some(t) = target.get_mut(*e) {
                            if smart_attack {
                                t.entity = enemy_at_point;
                                t.command = CommandKind::AttackTarget;
                            } else if kind == InputCommandKind::Attack {
                                t.entity = None;
                                t.command = CommandKind::AttackMove;
                            } else {
                                t.entity = None;
                                t.command = CommandKind::Move;
                            }
                        }

                        if let Ok(request_id) = pathfinder.request(to_path_entity_id(e), start, goal_cell, 2) {
                            follower
                                .entry(*e)
                                .expect("entity must exist")
                                .or_insert_with(|| crate::components::PathFollower::new(Vec::new()))
                                .active_request = Some(request_id);
                        }
                    }
                }
                // Pan/Zoom/Move/Hotkey are handled upstream by the camera/input wiring in
                // the runtime crate before commands reach the ECS world.
                _ => {}
            }
        }
    }
}

fn screen_to_world(camera: &camera::Camera, x: f32, y: f32) -> WorldPoint {
    let p = camera.screen_to_world(unit::ScreenPoint::new(x, y));
    WorldPoint::new(p.x, p.y).unwrap_or_else(|| WorldPoint::new_unchecked(0.0, 0.0))
}

/// All `Selectable` entities are drawn on the same layer, so "frontmost" reduces to the
/// smallest entity id among the candidates under the point.
fn pick_frontmost(
    entities: &ecs::Entities<'_>,
    transform: &ecs::ReadStorage<'_, Transform>,
    selectable: &ecs::WriteStorage<'_, Selectable>,
    world: WorldPoint,
) -> Option<ecs::Entity> {
    let mut best: Option<ecs::Entity> = None;

    for (e, t, s) in (entities, transform, selectable).join() {
        let e = ecs::Entity::from(e);
        if world.distance2(t.position) > s.radius_cells * s.radius_cells {
            continue;
        }
        if best.map(|best_e| e < best_e).unwrap_or(true) {
            best = Some(e);
        }
    }

    best
}

fn clear_selection(
    entities: &ecs::Entities<'_>,
    selectable: &mut ecs::WriteStorage<'_, Selectable>,
    events: &mut EventQueue,
) {
    for (e, s) in (entities, selectable).join() {
        if s.state == SelectionState::Selected {
            set_selected(ecs::Entity::from(e), s, false, events);
        }
    }
}

fn toggle_or_select(
    entity: ecs::Entity,
    additive: bool,
    selectable: &mut ecs::WriteStorage<Selectable>,
    events: &mut EventQueue,
) {
    if let Some(s) = selectable.get_mut(*entity) {
        let now_selected = if additive {
            s.state != SelectionState::Selected
        } else {
            true
        };
        set_selected(entity, s, now_selected, events);
    }
}

fn set_selected(entity: ecs::Entity, s: &mut Selectable, selected: bool, events: &mut EventQueue) {
    let new_state = if selected { SelectionState::Selected } else { SelectionState::Unselected };
    if s.state != new_state {
        s.state = new_state;
        events.push(GameEvent::SelectionChanged { entity, selected });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecs::{Builder, ComponentWorld, EcsWorld, RunNow, WorldExt};
    use input::CommandKind as InputCommandKind;

    // Camera::new(800, 600) has pos (0,0) and scale 1, so screen (400, 300) is world origin.
    const SCREEN_ORIGIN_X: f32 = 400.0;
    const SCREEN_ORIGIN_Y: f32 = 300.0;

    fn test_world() -> EcsWorld {
        let grid = pathfinding::PathGrid::new(16, 16, 1.0);
        crate::build_world(grid, 800, 600, catalog::Faction::Gdi)
    }

    fn selectable_at(world: &mut EcsWorld, pos: WorldPoint, faction: catalog::Faction) -> ecs::Entity {
        let e = world
            .create_entity()
            .with(Transform::new(pos))
            .with(Selectable {
                radius_cells: 1.0,
                state: SelectionState::Unselected,
                faction,
            })
            .with(Target::default())
            .build();
        ecs::Entity::from(e)
    }

    #[test]
    fn select_at_screen_picks_entity_under_cursor() {
        let mut world = test_world();
        let entity = selectable_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), catalog::Faction::Gdi);
        world.maintain();

        world.write_resource::<PendingCommands>().0.push(Command::SelectAtScreen {
            x: SCREEN_ORIGIN_X,
            y: SCREEN_ORIGIN_Y,
            additive: false,
        });

        let mut system = SelectionSystem;
        RunNow::run_now(&mut system, &world);

        let selectable = world.component::<Selectable>(entity).unwrap();
        assert_eq!(selectable.state, SelectionState::Selected);
    }

    #[test]
    fn select_at_screen_ignores_empty_ground() {
        let mut world = test_world();
        let entity = selectable_at(&mut world, WorldPoint::new(20.0, 20.0).unwrap(), catalog::Faction::Gdi);
        world.maintain();

        world.write_resource::<PendingCommands>().0.push(Command::SelectAtScreen {
            x: SCREEN_ORIGIN_X,
            y: SCREEN_ORIGIN_Y,
            additive: false,
        });

        let mut system = SelectionSystem;
        RunNow::run_now(&mut system, &world);

        let selectable = world.component::<Selectable>(entity).unwrap();
        assert_eq!(selectable.state, SelectionState::Unselected);
    }

    #[test]
    fn command_at_screen_moves_selected_units() {
        let mut world = test_world();
        let entity = selectable_at(&mut world, WorldPoint::new(0.0, 0.0).unwrap(), catalog::Faction::Gdi);
        world.component_mut::<Selectable>(entity).unwrap().state = SelectionState::Selected;
        world.maintain();

        world.write_resource::<PendingCommands>().0.push(Command::CommandAtScreen {
            x: SCREEN_ORIGIN_X + 3.0,
            y: SCREEN_ORIGIN_Y,
            kind: InputCommandKind::Move,
        });

        let mut system = SelectionSystem;
        RunNow::run_now(&mut system, &world);
        world.maintain();

        let target = world.component::<Target>(entity).unwrap();
        assert_eq!(target.command, CommandKind::Move);
        let follower = world.component::<PathFollower>(entity).unwrap();
        assert!(follower.active_request.is_some());
    }
}
