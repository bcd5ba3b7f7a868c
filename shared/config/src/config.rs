use serde::Deserialize;

#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: Display,
    pub engine: Engine,
    pub simulation: Simulation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: Display::default(),
            engine: Engine::default(),
            simulation: Simulation::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Display {
    /// Falls back to the host surface's reported size when unset.
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub max_atlas_size: u32,
    pub texture_unit_cap: u32,
    pub upload_budget_bytes_per_frame: u32,
    pub edge_scroll_threshold_px: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            viewport_width: None,
            viewport_height: None,
            max_atlas_size: 2048,
            texture_unit_cap: 16,
            upload_budget_bytes_per_frame: 4 * 2u32.pow(20),
            edge_scroll_threshold_px: 50.0,
            zoom_min: 0.25,
            zoom_max: 4.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Engine {
    pub tick_rate_hz: u32,
    pub path_expansion_budget_per_tick: u32,
    pub debug_pathfinding: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            path_expansion_budget_per_tick: 20_000,
            debug_pathfinding: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Simulation {
    pub random_seed: Option<u64>,
    pub retreat_hp_fraction: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            random_seed: None,
            retreat_hp_fraction: 0.2,
        }
    }
}
