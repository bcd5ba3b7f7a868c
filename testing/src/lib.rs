//! Shared fixtures for integration tests: a deterministic asset catalog, a small
//! headless `Harness` that drives the ECS world and a `SoftwareBackend` render
//! pipeline without any host event loop, and helpers for spawning fixture entities.
//!
//! Tests that need the full host-embeddable surface (`Runtime::initialize` reading a
//! catalog from disk, `feed_event`, `run_frame`) use [`write_test_catalog`] to
//! materialize [`TEST_CATALOG_JSON`] as a real file; tests that only need the ECS/render
//! plumbing drive [`Harness`] directly.

use std::io::Write as _;

use catalog::{Faction, Registry};
use color::ColorRgb;
use ecs::{Entity, Join, SystemFailure, WorldExt};
use render::software::SoftwareBackend;
use render::RenderPipeline;
use unit::WorldPoint;

pub use simulation::SpawnError;

/// One unit per faction plus a building, enough to exercise combat, movement and
/// selection without pulling in a real asset pack. Keys mirror the naming the catalog's
/// own doctest/unit tests use (`<faction>_<role>`).
pub const TEST_CATALOG_JSON: &str = r#"{
    "units": {
        "gdi_rifleman": {
            "faction": "gdi",
            "sprites": { "sprite_key": "gdi_rifleman", "frame_count": 4, "frame_rate": 8.0 },
            "max_hp": 50.0,
            "speed_cells_per_sec": 2.5,
            "weapon": {
                "damage": 5.0,
                "cooldown_secs": 0.5,
                "range_cells": 6.0,
                "kind": "projectile",
                "speed_cells_per_sec": 20.0
            },
            "acquisition_radius_cells": 8.0
        },
        "nod_rifleman": {
            "faction": "nod",
            "sprites": { "sprite_key": "nod_rifleman", "frame_count": 4, "frame_rate": 8.0 },
            "max_hp": 45.0,
            "speed_cells_per_sec": 2.75,
            "weapon": {
                "damage": 4.0,
                "cooldown_secs": 0.4,
                "range_cells": 6.0,
                "kind": "projectile",
                "speed_cells_per_sec": 22.0
            },
            "acquisition_radius_cells": 8.0
        }
    },
    "buildings": {
        "gdi_barracks": {
            "faction": "gdi",
            "sprites": { "sprite_key": "gdi_barracks", "frame_count": 1, "frame_rate": 0.0 },
            "max_hp": 400.0,
            "footprint": [3, 3],
            "exit_cell": [1, 3],
            "weapon": null
        }
    },
    "infantry": {}
}"#;

/// Parses [`TEST_CATALOG_JSON`]. Panics on malformed JSON - a broken fixture is a bug in
/// this crate, not a condition a caller needs to handle.
pub fn test_catalog() -> Registry {
    Registry::load_str(TEST_CATALOG_JSON).expect("TEST_CATALOG_JSON is well-formed")
}

/// Writes [`TEST_CATALOG_JSON`] out to a temp file for tests exercising
/// `Runtime::initialize`'s file-based loading path. The `NamedTempFile` must outlive the
/// `Runtime` built from its path.
pub fn write_test_catalog() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp catalog file");
    file.write_all(TEST_CATALOG_JSON.as_bytes())
        .expect("failed to write temp catalog file");
    file
}

/// A GDI position near the middle of a 16x16 grid, far enough from the edges that
/// pathfinding and acquisition radii don't clip against grid bounds.
pub fn fixture_position(x: f32, y: f32) -> WorldPoint {
    WorldPoint::new(x, y).expect("fixture coordinates are finite")
}

/// Headless harness: an `EcsWorld` plus a `SoftwareBackend`-backed `RenderPipeline`,
/// with no clock and no host event loop. Tests step it by calling [`Harness::tick`]
/// directly, mirroring what `runtime::Runtime::step_tick` does each fixed timestep.
pub struct Harness {
    pub world: ecs::EcsWorld,
    pub catalog: Registry,
    pub render: RenderPipeline,
}

impl Harness {
    pub fn new(grid_width: i32, grid_height: i32, cell_size: f32, viewport_width: u32, viewport_height: u32, player_faction: Faction) -> Self {
        let grid = pathfinding::PathGrid::new(grid_width, grid_height, cell_size);
        let world = simulation::build_world(grid, viewport_width, viewport_height, player_faction);
        let render = RenderPipeline::from_config(Box::new(SoftwareBackend::new(viewport_width, viewport_height)));

        Self { world, catalog: test_catalog(), render }
    }

    pub fn spawn_unit(&mut self, key: &str, position: WorldPoint, color: ColorRgb, ai_controlled: bool) -> Result<Entity, SpawnError> {
        simulation::spawn_unit(&mut self.world, &self.catalog, key, position, color, ai_controlled)
    }

    pub fn spawn_building(&mut self, key: &str, position: WorldPoint, color: ColorRgb) -> Result<Entity, SpawnError> {
        simulation::spawn_building(&mut self.world, &self.catalog, key, position, color)
    }

    pub fn tick(&mut self, dt_seconds: f32) -> Vec<SystemFailure> {
        simulation::tick(&mut self.world, dt_seconds)
    }

    /// Runs `count` fixed ticks of `dt_seconds` each, returning every system failure
    /// encountered across all of them in tick order.
    pub fn run_ticks(&mut self, count: u32, dt_seconds: f32) -> Vec<SystemFailure> {
        let mut failures = Vec::new();
        for _ in 0..count {
            failures.extend(self.tick(dt_seconds));
        }
        failures
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().join().count()
    }
}
