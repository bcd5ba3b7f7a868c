/// Simulation clock as seen by systems: `now` is seconds since the world was created,
/// `dt` is the fixed timestep of the tick currently running.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimTime {
    pub now: f32,
    pub dt: f32,
}

/// Commands translated by the Input Aggregator, queued for `SelectionSystem` to consume
/// this tick. Cleared after every tick regardless of whether anything read them.
#[derive(Default)]
pub struct PendingCommands(pub Vec<input::Command>);

/// The faction whose `CommandAtScreen`/`SelectAtScreen` input is honored by
/// `SelectionSystem`; other factions are AI- or scripted-only.
pub struct PlayerFaction(pub catalog::Faction);

/// The live camera, read by `SelectionSystem` to resolve screen-space input commands to
/// world coordinates.
pub struct CameraResource(pub camera::Camera);
