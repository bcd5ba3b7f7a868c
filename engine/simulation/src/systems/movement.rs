use common::{facing_8, logging::prelude::*, InnerSpace};
use ecs::{Entities, Join, System, WriteExpect, WriteStorage};

use crate::components::{PathFollower, Transform, Velocity};
use crate::entity_id::to_path_entity_id;
use crate::resources::SimTime;

/// Advances path-following and direct-move entities at their configured speed,
/// recording the previous position for render interpolation first.
pub struct UnitMovementSystem;

impl<'a> System<'a> for UnitMovementSystem {
    type SystemData = (
        Entities<'a>,
        ecs::Read<'a, SimTime>,
        WriteExpect<'a, pathfinding::Pathfinder>,
        WriteStorage<'a, Transform>,
        WriteStorage<'a, Velocity>,
        WriteStorage<'a, PathFollower>,
    );

    fn run(
        &mut self,
        (entities, sim_time, mut pathfinder, mut transform, mut velocity, mut follower): Self::SystemData,
    ) {
        let dt = sim_time.dt;
        let cell_size = pathfinder.grid().cell_size();

        for t in (&mut transform).join() {
            t.last_position = t.position;
        }

        for (e, transform, velocity, follower) in
            (&entities, &mut transform, &mut velocity, &mut follower).join()
        {
            let e = ecs::Entity::from(e);

            let waypoint = match follower.current_waypoint() {
                Some(cell) => cell,
                None => continue,
            };

            // blocked mid-path: request a replan and hold position this tick
            if !pathfinder.grid().is_passable(waypoint) {
                if let Some(request_id) = follower.active_request.take() {
                    pathfinder.cancel(request_id);
                }
                let start = transform.position.to_cell(cell_size);
                let goal = follower.path.last().copied().unwrap_or(waypoint);
                if let Ok(id) = pathfinder.request(to_path_entity_id(e), start, goal, 0) {
                    follower.active_request = Some(id);
                }
                continue;
            }

            let target_world = waypoint.center(cell_size);
            let to_target = target_world - transform.position;
            let distance = to_target.magnitude();

            if distance <= velocity.arrival_tolerance {
                follower.index += 1;
                if follower.is_exhausted() {
                    debug!("path follower reached its final waypoint"; "entity" => e);
                }
                continue;
            }

            let speed_world_units = velocity.desired_speed_cells_per_sec * cell_size;
            let step_len = distance.min(speed_world_units * dt);
            let direction = to_target / distance;

            transform.position += direction * step_len;
            transform.facing = facing_8(direction);
            velocity.current_speed_cells_per_sec = if dt > f32::EPSILON {
                (step_len / cell_size) / dt
            } else {
                0.0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecs::{Builder, ComponentWorld, EcsWorld, RunNow, WorldExt};
    use unit::{CellPos, WorldPoint};

    fn test_world() -> EcsWorld {
        let grid = pathfinding::PathGrid::new(16, 16, 1.0);
        crate::build_world(grid, 800, 600, catalog::Faction::Gdi)
    }

    #[test]
    fn steps_towards_waypoint_without_overshooting() {
        let mut world = test_world();
        world.write_resource::<SimTime>().dt = 0.5;

        let entity = world
            .create_entity()
            .with(Transform::new(WorldPoint::new(0.0, 0.0).unwrap()))
            .with(Velocity {
                target: WorldPoint::new(0.0, 0.0).unwrap(),
                desired_speed_cells_per_sec: 1.0,
                current_speed_cells_per_sec: 0.0,
                arrival_tolerance: 0.05,
            })
            .with(PathFollower::new(vec![CellPos::new(5, 0)]))
            .build();
        world.maintain();

        let mut system = UnitMovementSystem;
        RunNow::run_now(&mut system, &world);

        let transform = world.component::<Transform>(ecs::Entity::from(entity)).unwrap();
        // speed 1 cell/sec * 0.5s dt = 0.5 world units, far short of the 5.5-unit target
        assert!((transform.position.x() - 0.5).abs() < 1e-4);
        assert_eq!(transform.facing, facing_8(common::Vector2::new(1.0, 0.0)));
    }

    #[test]
    fn advances_waypoint_index_on_arrival() {
        let mut world = test_world();
        world.write_resource::<SimTime>().dt = 10.0;

        let entity = world
            .create_entity()
            .with(Transform::new(WorldPoint::new(0.5, 0.5).unwrap()))
            .with(Velocity {
                target: WorldPoint::new(0.0, 0.0).unwrap(),
                desired_speed_cells_per_sec: 5.0,
                current_speed_cells_per_sec: 0.0,
                arrival_tolerance: 0.05,
            })
            .with(PathFollower::new(vec![CellPos::new(0, 0)]))
            .build();
        world.maintain();

        let mut system = UnitMovementSystem;
        RunNow::run_now(&mut system, &world);

        let follower = world.component::<PathFollower>(ecs::Entity::from(entity)).unwrap();
        assert!(follower.is_exhausted());
    }
}
