mod load;

pub use load::{CatalogError, Registry, RegistryBuilder};

use serde::Deserialize;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Gdi,
    Nod,
    Neutral,
}

#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeaponKind {
    Melee,
    Projectile { speed_cells_per_sec: f32 },
}

#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct WeaponDescriptor {
    pub damage: f32,
    pub cooldown_secs: f32,
    pub range_cells: f32,
    #[serde(flatten)]
    pub kind: WeaponKind,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpriteSheet {
    /// Logical key into the texture atlas, not a file path - asset decoding is out of scope.
    pub sprite_key: String,
    pub frame_count: u32,
    pub frame_rate: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UnitDefinition {
    pub faction: Faction,
    pub sprites: SpriteSheet,
    pub max_hp: f32,
    pub speed_cells_per_sec: f32,
    pub weapon: Option<WeaponDescriptor>,
    pub acquisition_radius_cells: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BuildingDefinition {
    pub faction: Faction,
    pub sprites: SpriteSheet,
    pub max_hp: f32,
    pub footprint: (u32, u32),
    pub exit_cell: (i32, i32),
    pub weapon: Option<WeaponDescriptor>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct RawCatalog {
    #[serde(default)]
    pub units: std::collections::HashMap<String, UnitDefinition>,
    #[serde(default)]
    pub buildings: std::collections::HashMap<String, BuildingDefinition>,
    #[serde(default)]
    pub infantry: std::collections::HashMap<String, UnitDefinition>,
}
