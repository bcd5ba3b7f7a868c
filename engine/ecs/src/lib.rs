mod entity;
mod world;

pub use specs::{
    Builder, Component, DenseVecStorage, Entities, Join, LazyUpdate, NullStorage, Read,
    ReadExpect, ReadStorage, RunNow, System, SystemData, VecStorage, World, WorldExt, Write,
    WriteExpect, WriteStorage,
};
pub use specs_derive::Component;

pub use entity::{Entity, EntityWrapper};
pub use world::{ComponentGetError, ComponentWorld, EcsError, EcsWorld, SystemFailure};
