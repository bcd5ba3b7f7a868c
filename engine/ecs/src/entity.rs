use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroI32;
use std::ops::Deref;

use common::logging::prelude::{slog, Key, Record, Serializer};

/// A stable handle to an entity: opaque index plus a generation, so a reused slot never
/// compares equal to the handle that referenced its previous occupant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Entity(specs::Entity);

/// A copy of [Entity]'s bit layout, constructable from a raw index+generation pair - used
/// by save/replay or scripting bridges that only have the two integers.
///
/// It's technically undefined behaviour to transmute like this, but it's exercised by a
/// unit test to confirm specs hasn't changed its entity layout underneath us.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct EntityWrapper(pub specs::world::Index, pub NonZeroI32);

impl Deref for Entity {
    type Target = specs::Entity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "E{}:{}", self.0.gen().id(), self.0.id())
    }
}

impl Debug for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl Display for EntityWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&Entity::from(*self), f)
    }
}

impl From<specs::Entity> for Entity {
    #[inline(always)]
    fn from(e: specs::Entity) -> Self {
        Self(e)
    }
}

impl From<Entity> for specs::Entity {
    #[inline(always)]
    fn from(e: Entity) -> Self {
        e.0
    }
}

impl From<EntityWrapper> for Entity {
    fn from(e: EntityWrapper) -> Self {
        // safety: see doc comment on EntityWrapper, and the layout test below
        let specs = unsafe { std::mem::transmute::<_, specs::Entity>(e) };
        Self(specs)
    }
}

impl slog::Value for Entity {
    fn serialize(
        &self,
        _record: &Record,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result<()> {
        serializer.emit_arguments(key, &format_args!("{}", self))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroI32;

    use specs::WorldExt;

    use super::*;

    #[test]
    fn entity_layout_matches_specs() {
        let mut world = specs::World::new();

        for i in 0..50 {
            let e = world.create_entity().build();

            let index = e.id();
            let gen = e.gen();

            let my_e = EntityWrapper(index, NonZeroI32::new(gen.id()).unwrap());
            let my_e = Entity::from(my_e);
            assert_eq!(e, my_e.0, "specs entity layout has changed");
            assert_eq!(Entity::from(e), my_e, "specs entity layout has changed");

            if i % 2 == 0 {
                world.delete_entity(e).unwrap();
            }
        }
    }
}
