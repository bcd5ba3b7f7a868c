//! Conversion between `ecs::Entity` and the opaque `u64` id `pathfinding::Pathfinder`
//! tracks occupants and requesters by, so that crate doesn't need a dependency on the ECS.

pub fn to_path_entity_id(entity: ecs::Entity) -> pathfinding::EntityId {
    ((entity.gen().id() as u64) << 32) | entity.id() as u64
}
