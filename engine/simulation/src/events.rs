use ecs::Entity;

/// Notable things that happened during a tick, for the renderer and any observers
/// (metrics, scripting) to react to without polling component state every frame.
#[derive(Copy, Clone, Debug)]
pub enum GameEvent {
    Died { entity: Entity },
    WeaponFired { attacker: Entity, target: Entity },
    SelectionChanged { entity: Entity, selected: bool },
}

/// Dispatched event queue, drained by the runtime once per tick after every system has
/// run. Cleared at the start of each tick's dispatch phase, not by individual systems.
#[derive(Default)]
pub struct EventQueue(Vec<GameEvent>);

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.0.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.0)
    }
}
