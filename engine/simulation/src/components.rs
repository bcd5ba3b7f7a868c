use color::ColorRgb;
use ecs::{Component, DenseVecStorage, VecStorage};
use unit::{CellPos, WorldPoint};

pub use catalog::Faction;

/// Where in the draw order a sprite belongs; also used by `SelectionSystem` to resolve
/// overlapping selection circles to the frontmost entity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum DrawLayer {
    Terrain,
    Shadow,
    Ground,
    Unit,
    Building,
    Projectile,
    Ui,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LoopPolicy {
    Once,
    Loop,
    HoldLast,
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Transform {
    pub position: WorldPoint,
    pub last_position: WorldPoint,
    /// 8-direction facing index, 0 = north, clockwise (see `common::facing_8`).
    pub facing: u8,
}

impl Transform {
    pub fn new(position: WorldPoint) -> Self {
        Self {
            position,
            last_position: position,
            facing: 0,
        }
    }
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Velocity {
    pub target: WorldPoint,
    pub desired_speed_cells_per_sec: f32,
    pub current_speed_cells_per_sec: f32,
    pub arrival_tolerance: f32,
}

#[derive(Clone, Debug, Default, Component)]
#[storage(VecStorage)]
pub struct PathFollower {
    pub path: Vec<CellPos>,
    pub index: usize,
    /// Seconds until this entity is allowed to request another replan.
    pub replan_cooldown: f32,
    pub active_request: Option<pathfinding::RequestId>,
}

impl PathFollower {
    pub fn new(path: Vec<CellPos>) -> Self {
        Self {
            path,
            index: 0,
            replan_cooldown: 0.0,
            active_request: None,
        }
    }

    pub fn current_waypoint(&self) -> Option<CellPos> {
        self.path.get(self.index).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.path.len()
    }
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Sprite {
    pub sprite_key: String,
    pub frame_index: u32,
    pub frame_count: u32,
    pub frame_rate: f32,
    pub animation_phase: f32,
    pub loop_policy: LoopPolicy,
    pub tint: ColorRgb,
    pub layer: DrawLayer,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SelectionState {
    Unselected,
    Selected,
    Highlighted,
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Selectable {
    pub radius_cells: f32,
    pub state: SelectionState,
    pub faction: Faction,
}

#[derive(Copy, Clone, Debug)]
pub enum WeaponKind {
    Melee,
    Projectile { speed_cells_per_sec: f32 },
}

#[derive(Clone, Debug)]
pub struct Weapon {
    pub damage: f32,
    pub cooldown_secs: f32,
    pub range_cells: f32,
    pub kind: WeaponKind,
}

impl From<&catalog::WeaponDescriptor> for Weapon {
    fn from(d: &catalog::WeaponDescriptor) -> Self {
        let kind = match d.kind {
            catalog::WeaponKind::Melee => WeaponKind::Melee,
            catalog::WeaponKind::Projectile { speed_cells_per_sec } => {
                WeaponKind::Projectile { speed_cells_per_sec }
            }
        };
        Self {
            damage: d.damage,
            cooldown_secs: d.cooldown_secs,
            range_cells: d.range_cells,
            kind,
        }
    }
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Combat {
    pub max_hp: f32,
    pub current_hp: f32,
    pub weapon: Option<Weapon>,
    /// Simulation-clock seconds at which the weapon last fired.
    pub last_fired: f32,
}

impl Combat {
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            (self.current_hp / self.max_hp).clamp(0.0, 1.0)
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current_hp <= 0.0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CommandKind {
    Idle,
    Move,
    AttackMove,
    AttackTarget,
    Guard,
}

impl Default for CommandKind {
    fn default() -> Self {
        CommandKind::Idle
    }
}

#[derive(Copy, Clone, Debug, Default, Component)]
#[storage(VecStorage)]
pub struct Target {
    pub entity: Option<ecs::Entity>,
    pub command: CommandKind,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AiState {
    Idle,
    Pursuing,
    Engaging,
    Retreating,
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct AiControlled {
    pub state: AiState,
    pub acquisition_radius_cells: f32,
    pub leash_origin: WorldPoint,
}

#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Building {
    pub footprint: (u32, u32),
    pub construction_progress: f32,
    pub exit_cell: CellPos,
}

/// Marker for entities spawned as projectiles, carrying just enough state to fly
/// towards their target and apply damage on arrival.
#[derive(Clone, Debug, Component)]
#[storage(VecStorage)]
pub struct Projectile {
    pub target: ecs::Entity,
    pub damage: f32,
    pub speed_cells_per_sec: f32,
}

/// Per-entity team affiliation and shared team color, decoupled from `Selectable`
/// so non-selectable entities (e.g. projectiles) can still be attributed to a faction.
#[derive(Copy, Clone, Debug, Component)]
#[storage(DenseVecStorage)]
pub struct FactionAffinity {
    pub faction: Faction,
    pub color: ColorRgb,
}
