use common::logging::prelude::*;
use ecs::{Entities, Join, ReadStorage, System, WriteExpect, WriteStorage};
use pathfinding::PathStatus;

use crate::components::{PathFollower, Transform};
use crate::entity_id::to_path_entity_id;

/// Cell-goal followers (as opposed to AI/combat's entity-goal requests) replan on this
/// cadence while still moving, independent of whether anything actually blocked them.
const REPLAN_INTERVAL_SECS: f32 = 2.0;

/// Advances the shared pathfinding budget once per tick and folds completed searches
/// into each requester's `PathFollower`, bridging the entity-agnostic `Pathfinder`
/// crate back into ECS component state.
pub struct PathfindingSystem;

impl<'a> System<'a> for PathfindingSystem {
    type SystemData = (
        Entities<'a>,
        ecs::Read<'a, crate::resources::SimTime>,
        WriteExpect<'a, pathfinding::Pathfinder>,
        ReadStorage<'a, Transform>,
        WriteStorage<'a, PathFollower>,
    );

    fn run(&mut self, (entities, sim_time, mut pathfinder, transform, mut follower): Self::SystemData) {
        pathfinder.tick();

        let dt = sim_time.dt;
        let cell_size = pathfinder.grid().cell_size();

        for (e, t, follower) in (&entities, &transform, &mut follower).join() {
            let e = ecs::Entity::from(e);

            if let Some(request_id) = follower.active_request {
                if let Some(status) = pathfinder.take_result(request_id) {
                    follower.active_request = None;
                    match status {
                        PathStatus::Found(path) => {
                            follower.path = path;
                            follower.index = 0;
                            follower.replan_cooldown = REPLAN_INTERVAL_SECS;
                        }
                        PathStatus::Failed(err) => {
                            debug!("pathfinding request failed"; "entity" => e, "error" => %err);
                            follower.path.clear();
                            follower.index = 0;
                        }
                        PathStatus::Pending => unreachable!("take_result never returns Pending"),
                    }
                }
                continue;
            }

            if follower.is_exhausted() {
                continue;
            }

            follower.replan_cooldown -= dt;
            if follower.replan_cooldown > 0.0 {
                continue;
            }

            let goal = match follower.path.last() {
                Some(&cell) => cell,
                None => continue,
            };
            let current_cell = t.position.to_cell(cell_size);
            if let Ok(id) = pathfinder.request(to_path_entity_id(e), current_cell, goal, 0) {
                follower.active_request = Some(id);
            }
            follower.replan_cooldown = REPLAN_INTERVAL_SECS;
        }
    }
}
