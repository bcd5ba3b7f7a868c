use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};

use common::logging::prelude::*;
use common::thiserror::Error;
use specs::prelude::*;
use specs::storage::InsertResult;
use specs::world::EntitiesRes;

use crate::entity::Entity;

/// A system is marked degraded after this many consecutive ticks in which it panicked,
/// per the Game Loop's graceful-degradation contract: it keeps its place in the schedule
/// but is skipped every tick from then on rather than risking another panic.
const DEGRADE_AFTER_CONSECUTIVE_FAILURES: u32 = 3;

/// A system scheduled onto the world at a fixed priority. Specs' `RunNow` is already
/// object-safe (unlike `System` itself, which is generic over `SystemData`), so a plain
/// boxed trait object gives us the priority-ordered list the world needs without a full
/// `Dispatcher`.
pub struct ScheduledSystem {
    priority: u32,
    name: &'static str,
    system: Box<dyn for<'a> RunNow<'a>>,
    consecutive_failures: u32,
    degraded: bool,
}

/// Reported once per tick for each system that panicked, so the host can surface it on
/// its diagnostic channel instead of it only ever living in the log.
#[derive(Copy, Clone, Debug)]
pub struct SystemFailure {
    pub tick: u64,
    pub system: &'static str,
    pub consecutive_failures: u32,
    pub newly_degraded: bool,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[derive(Debug, Error)]
pub enum ComponentGetError {
    #[error("entity {0} doesn't exist")]
    NoSuchEntity(Entity),

    #[error("entity {0} doesn't have component '{1}'")]
    NoSuchComponent(Entity, &'static str),
}

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity {0} is stale or already despawned")]
    StaleHandle(Entity),
}

/// Thin abstraction over the backing specs `World`, giving the rest of the runtime a
/// stable vocabulary (`spawn`/`despawn`/`add_component`/...) per the ECS World module
/// contract, independent of which ECS crate backs it.
pub trait ComponentWorld: Sized {
    fn component<T: Component>(&self, entity: Entity) -> Result<&T, ComponentGetError>;
    fn component_mut<T: Component>(&self, entity: Entity) -> Result<&mut T, ComponentGetError>;
    fn has_component<T: Component>(&self, entity: Entity) -> bool;

    fn resource<T: Resource>(&self) -> &T;
    #[allow(clippy::mut_from_ref)]
    fn resource_mut<T: Resource>(&self) -> &mut T;

    /// Commits immediately; only valid outside of a running system (no storage borrowed).
    fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> InsertResult<T>;
    fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T>;

    /// Deferred via `LazyUpdate`; applied at the next `maintain()`.
    fn add_component_lazy<T: Component>(&self, entity: Entity, component: T);
    fn remove_component_lazy<T: Component>(&self, entity: Entity);

    fn spawn(&self) -> EntityBuilder;
    fn despawn(&self, entity: Entity) -> Result<(), EcsError>;
    fn is_alive(&self, entity: Entity) -> bool;
}

pub struct EcsWorld {
    world: World,
    systems: Vec<ScheduledSystem>,
    tick_number: u64,
}

impl Deref for EcsWorld {
    type Target = World;

    fn deref(&self) -> &Self::Target {
        &self.world
    }
}

impl DerefMut for EcsWorld {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.world
    }
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EcsWorld {
    pub fn new() -> Self {
        EcsWorld {
            world: World::new(),
            systems: Vec::new(),
            tick_number: 0,
        }
    }

    /// Registers `system` to run every tick at `priority` (ascending). Systems with equal
    /// priority run in registration order, so registration order alone is enough to make
    /// tick order deterministic.
    pub fn add_system(
        &mut self,
        priority: u32,
        name: &'static str,
        mut system: Box<dyn for<'a> RunNow<'a>>,
    ) {
        system.setup(&mut self.world);
        self.systems.push(ScheduledSystem {
            priority,
            name,
            system,
            consecutive_failures: 0,
            degraded: false,
        });
        self.systems.sort_by_key(|s| s.priority);
    }

    /// Runs every registered system in priority order, then commits all queued structural
    /// mutations (spawns, despawns, lazily-added/removed components) atomically.
    ///
    /// A system that panics is caught rather than allowed to unwind out of the loop: the
    /// panic is logged with the tick number and system name, and after three consecutive
    /// failing ticks the system is marked degraded and skipped on every subsequent tick.
    /// Returns the failures observed this tick, if any, for the caller to forward to its
    /// diagnostic channel.
    pub fn tick(&mut self) -> Vec<SystemFailure> {
        self.tick_number += 1;
        let mut failures = Vec::new();
        let world = &self.world;

        for scheduled in &mut self.systems {
            if scheduled.degraded {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| scheduled.system.run_now(world)));
            match result {
                Ok(()) => scheduled.consecutive_failures = 0,
                Err(payload) => {
                    scheduled.consecutive_failures += 1;
                    let newly_degraded = scheduled.consecutive_failures >= DEGRADE_AFTER_CONSECUTIVE_FAILURES;
                    scheduled.degraded = newly_degraded;

                    error!("system panicked during tick";
                        "tick" => self.tick_number,
                        "system" => scheduled.name,
                        "consecutive_failures" => scheduled.consecutive_failures,
                        "error" => panic_message(&*payload),
                    );
                    if newly_degraded {
                        error!("system marked degraded after consecutive failing ticks";
                            "system" => scheduled.name,
                            "consecutive_failures" => scheduled.consecutive_failures,
                        );
                    }

                    failures.push(SystemFailure {
                        tick: self.tick_number,
                        system: scheduled.name,
                        consecutive_failures: scheduled.consecutive_failures,
                        newly_degraded,
                    });
                }
            }
        }

        self.world.maintain();
        failures
    }

    pub fn tick_number(&self) -> u64 {
        self.tick_number
    }

    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().map(|s| s.name)
    }

    pub fn is_degraded(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s.name == name && s.degraded)
    }

    pub fn degraded_systems(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().filter(|s| s.degraded).map(|s| s.name)
    }
}

impl ComponentWorld for EcsWorld {
    fn component<T: Component>(&self, entity: Entity) -> Result<&T, ComponentGetError> {
        let storage = self.world.read_storage::<T>();
        // safety: storage borrows from self.world, which outlives it; upcasting the
        // lifetime to self's is sound since the two share a single owner
        let result: Option<&T> = unsafe { std::mem::transmute(storage.get(*entity)) };
        result.ok_or_else(|| self.mk_component_error::<T>(entity))
    }

    fn component_mut<T: Component>(&self, entity: Entity) -> Result<&mut T, ComponentGetError> {
        let mut storage = self.world.write_storage::<T>();
        // safety: see component()
        let result: Option<&mut T> = unsafe { std::mem::transmute(storage.get_mut(*entity)) };
        result.ok_or_else(|| self.mk_component_error::<T>(entity))
    }

    fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.read_storage::<T>().contains(*entity)
    }

    fn resource<T: Resource>(&self) -> &T {
        let res = self.world.read_resource::<T>();
        // safety: see component()
        unsafe { std::mem::transmute(&*res) }
    }

    fn resource_mut<T: Resource>(&self) -> &mut T {
        let mut res = self.world.write_resource::<T>();
        // safety: see component()
        unsafe { std::mem::transmute(&mut *res) }
    }

    fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> InsertResult<T> {
        self.world.write_storage::<T>().insert(*entity, component)
    }

    fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.write_storage::<T>().remove(*entity)
    }

    fn add_component_lazy<T: Component>(&self, entity: Entity, component: T) {
        self.world
            .read_resource::<LazyUpdate>()
            .insert(*entity, component);
    }

    fn remove_component_lazy<T: Component>(&self, entity: Entity) {
        self.world.read_resource::<LazyUpdate>().remove::<T>(*entity);
    }

    fn spawn(&self) -> EntityBuilder {
        self.world.create_entity_unchecked()
    }

    fn despawn(&self, entity: Entity) -> Result<(), EcsError> {
        let entities = self.world.read_resource::<EntitiesRes>();
        entities
            .delete(*entity)
            .map_err(|_| EcsError::StaleHandle(entity))
    }

    fn is_alive(&self, entity: Entity) -> bool {
        entity.gen().is_alive() && self.world.is_alive(*entity)
    }
}

impl EcsWorld {
    fn mk_component_error<T: Component>(&self, entity: Entity) -> ComponentGetError {
        if self.is_alive(entity) {
            ComponentGetError::NoSuchComponent(entity, std::any::type_name::<T>())
        } else {
            ComponentGetError::NoSuchEntity(entity)
        }
    }
}
