//! Wires the ECS world, pathfinding grid, camera, input aggregator and rendering
//! pipeline into a single host-embeddable runtime driven by a fixed-timestep clock.
//!
//! `initialize` builds everything up front (fatal on a missing catalog or an unusable
//! render backend); `feed_event`/`run`/`pause`/`stop` are the host's per-frame surface;
//! `take_snapshot` exists purely for diagnostic readouts, not persistence - the core
//! runtime persists nothing across restarts.

mod diagnostics;
mod error;
mod event;
mod options;
mod snapshot;

pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use error::RuntimeError;
pub use event::{EventOutcome, HostEvent};
pub use options::RuntimeConfig;
pub use snapshot::Snapshot;

use std::collections::HashMap;
use std::time::Instant;

use common::input::{EventHandled, KeyCode};
use common::logging::prelude::*;
use common::Vector2;

use ecs::{ComponentWorld, Join, WorldExt};
use gameloop::{Clock, FrameAction};
use input::{Command, InputAggregator};
use render::atlas::{AtlasId, UvRect};
use render::backend::{ContextState, GpuTier, RenderBackend};
use render::batch::{SpriteDraw, ViewBounds};
use render::RenderPipeline;
use simulation::components::{Selectable, SelectionState, Sprite, Transform};
use simulation::resources::{CameraResource, PendingCommands};

/// Sampled counters (FPS, draw calls, sprite count) refresh at this rate by default,
/// matching `metrics::SAMPLE_RATE_HZ`.
const SAMPLE_INTERVAL_SECS: f32 = 1.0 / metrics::SAMPLE_RATE_HZ as f32;
const DIAGNOSTICS_CAPACITY: usize = 256;

pub struct Runtime {
    world: ecs::EcsWorld,
    #[allow(dead_code)] // read by lifecycle::spawn_unit/spawn_building call sites the host drives directly
    catalog: catalog::Registry,
    input: InputAggregator,
    render: RenderPipeline,
    clock: Clock,
    diagnostics: Diagnostics,
    frame_cache: HashMap<String, (AtlasId, UvRect)>,
    viewport_width: u32,
    viewport_height: u32,
    cell_size: f32,
    sample_accum: f32,
    sampled_fps: f32,
    paused: bool,
}

impl Runtime {
    /// Validates configuration, loads the asset catalog (fatal if missing/malformed),
    /// builds the ECS world and render pipeline, and starts the clock. Catalog load and
    /// config validation are the two fatal-init paths the spec calls out; an unusable
    /// render backend (zero texture units available) is the third.
    pub fn initialize(opts: RuntimeConfig, backend: Box<dyn RenderBackend>) -> Result<Self, RuntimeError> {
        if let Some(path) = &opts.config_path {
            config::init(path)?;
        }

        {
            let cfg = config::get();
            if cfg.display.zoom_min <= 0.0 || cfg.display.zoom_min >= cfg.display.zoom_max {
                return Err(RuntimeError::InvalidConfig(format!(
                    "zoom_min ({}) must be positive and less than zoom_max ({})",
                    cfg.display.zoom_min, cfg.display.zoom_max
                )));
            }
            if cfg.engine.tick_rate_hz == 0 {
                return Err(RuntimeError::InvalidConfig("tick_rate_hz must be non-zero".to_owned()));
            }
        }

        if opts.grid_width <= 0 || opts.grid_height <= 0 || opts.cell_size <= 0.0 {
            return Err(RuntimeError::InvalidConfig(
                "grid dimensions and cell size must be positive".to_owned(),
            ));
        }

        info!("loading asset catalog"; "path" => opts.catalog_path.display().to_string());
        let catalog = catalog::Registry::load(&opts.catalog_path)?;
        info!("asset catalog loaded"; "entries" => catalog.len());

        let grid = pathfinding::PathGrid::new(opts.grid_width, opts.grid_height, opts.cell_size);
        let world = simulation::build_world(grid, opts.viewport_width, opts.viewport_height, opts.player_faction);

        let render = RenderPipeline::from_config(backend);
        if render.texture_unit_capacity() == 0 {
            return Err(RuntimeError::NoRenderBackend);
        }

        let tick_rate_hz = config::get().engine.tick_rate_hz;
        let mut clock = Clock::new(tick_rate_hz);
        clock.start();

        Ok(Self {
            world,
            catalog,
            input: InputAggregator::new(opts.viewport_width, opts.viewport_height),
            render,
            clock,
            diagnostics: Diagnostics::new(DIAGNOSTICS_CAPACITY),
            frame_cache: HashMap::new(),
            viewport_width: opts.viewport_width,
            viewport_height: opts.viewport_height,
            cell_size: opts.cell_size,
            sample_accum: 0.0,
            sampled_fps: 0.0,
            paused: false,
        })
    }

    /// Spawns a unit entity from its catalog key, for scenario/map loading and in-match
    /// production - the host drives both through this seam rather than the runtime
    /// owning any notion of "starting units" or a build queue itself.
    pub fn spawn_unit(
        &mut self,
        key: &str,
        position: unit::WorldPoint,
        color: color::ColorRgb,
        ai_controlled: bool,
    ) -> Result<ecs::Entity, simulation::SpawnError> {
        simulation::spawn_unit(&mut self.world, &self.catalog, key, position, color, ai_controlled)
    }

    pub fn spawn_building(
        &mut self,
        key: &str,
        position: unit::WorldPoint,
        color: color::ColorRgb,
    ) -> Result<ecs::Entity, simulation::SpawnError> {
        simulation::spawn_building(&mut self.world, &self.catalog, key, position, color)
    }

    /// Registers a decoded sprite frame's pixel dimensions with the render pipeline.
    /// Actual PNG decoding is the host's job (spec's asset-loading scope boundary); this
    /// is the seam where a `<sprite_key>-<NNNN>.png` the host has read becomes a packed
    /// atlas slot the batcher can draw from.
    pub fn register_sprite_frame(&mut self, sprite_key: &str, frame_index: u32, width: u32, height: u32) {
        let key = frame_key(sprite_key, frame_index);
        if let Some(slot) = self.render.resolve_frame(&key, width, height) {
            self.frame_cache.insert(key, slot);
        }
    }

    /// Feeds one host-originated event into the runtime. Most kinds are translated and
    /// handed to the `InputAggregator`; `Resize` is handled directly here since it needs
    /// to reach both the input layer and the camera; unrecognized kinds are dropped and
    /// counted in diagnostics rather than propagated as an error.
    pub fn feed_event(&mut self, event: HostEvent) -> EventOutcome {
        match event {
            HostEvent::Resize { width, height } => {
                self.viewport_width = width;
                self.viewport_height = height;
                self.input.resize(width, height);
                self.world.write_resource::<CameraResource>().0.resize(width, height);
                EventOutcome::HandledDirectly
            }
            HostEvent::Unknown { kind } => {
                warn!("dropping input event of unrecognized kind"; "kind" => &kind);
                self.diagnostics.push(DiagnosticEvent::UnknownInputEventDropped { kind });
                EventOutcome::Dropped
            }
            other => {
                let raw = other.to_raw().expect("every non-Resize/Unknown variant translates");
                match self.input.handle_event(raw) {
                    EventHandled::Handled => EventOutcome::Dispatched,
                    EventHandled::NotHandled => EventOutcome::Dropped,
                }
            }
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stops the clock; takes effect at the next tick boundary, per the concurrency
    /// model's cancellation contract. Idempotent.
    pub fn stop(&mut self) {
        let _ = self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Drives ticks and a single render pass for one host wake-up (e.g. one
    /// `requestAnimationFrame` callback), per `gameloop::Clock::begin_frame`.
    pub fn run_frame(&mut self, now: Instant) {
        if self.paused {
            return;
        }

        let mut tick_rate_hz = None;
        {
            let cfg = config::get();
            if cfg.engine.tick_rate_hz != self.clock.target_rate() {
                tick_rate_hz = Some(cfg.engine.tick_rate_hz);
            }
        }
        if let Some(hz) = tick_rate_hz {
            self.clock.set_target_rate(hz);
        }

        let dt_seconds = 1.0 / self.clock.target_rate().max(1) as f32;
        let actions: Vec<FrameAction> = self.clock.begin_frame(now).collect();

        for action in actions {
            match action {
                FrameAction::Tick => self.step_tick(dt_seconds),
                FrameAction::Render { alpha } => self.render_frame(alpha as f32),
            }
        }
    }

    fn step_tick(&mut self, dt_seconds: f32) {
        self.dispatch_commands(dt_seconds);

        {
            let mut camera = self.world.write_resource::<CameraResource>();
            camera.0.update(dt_seconds);
        }

        for failure in simulation::tick(&mut self.world, dt_seconds) {
            self.diagnostics.push(DiagnosticEvent::SystemFailed {
                tick: failure.tick,
                system: failure.system,
                consecutive_failures: failure.consecutive_failures,
            });
            if failure.newly_degraded {
                self.diagnostics.push(DiagnosticEvent::SystemDegraded {
                    tick: failure.tick,
                    system: failure.system,
                });
            }
        }

        self.sample_accum += dt_seconds;
        if self.sample_accum >= SAMPLE_INTERVAL_SECS {
            self.sampled_fps = 1.0 / self.sample_accum.max(f32::EPSILON);
            self.sample_accum = 0.0;
        }
    }

    /// Commands that move or zoom the camera are applied directly here rather than
    /// reaching the ECS world - `SelectionSystem` only ever sees selection/move-order
    /// commands, per its own note that camera commands are resolved upstream.
    fn dispatch_commands(&mut self, dt_seconds: f32) {
        let mut commands = self.input.take_commands();
        if let Some(pan) = self.input.poll_edge_scroll(dt_seconds) {
            commands.push(pan);
        }

        let mut forwarded = Vec::with_capacity(commands.len());
        {
            let cfg = config::get();
            let (zoom_min, zoom_max) = (cfg.display.zoom_min, cfg.display.zoom_max);
            let mut camera = self.world.write_resource::<CameraResource>();

            for command in commands {
                match command {
                    Command::Move { dx, dy } | Command::Pan { dx, dy } => {
                        camera.0.pan_by(Vector2::new(dx, dy));
                    }
                    Command::ZoomAtScreen { delta, screen_x, screen_y } => {
                        let new_scale = (camera.0.target_scale() + delta).clamp(zoom_min, zoom_max);
                        camera.0.zoom_to_screen_point(new_scale, screen_x, screen_y);
                    }
                    Command::Hotkey { code } if code == KeyCode::TOGGLE_PATHFINDING_DEBUG => {
                        // debug overlay toggling is a host/UI presentation concern; the
                        // runtime only needs to not misroute the hotkey into selection.
                    }
                    other => forwarded.push(other),
                }
            }
        }

        self.world.write_resource::<PendingCommands>().0 = forwarded;
    }

    fn render_frame(&mut self, alpha: f32) {
        let view = self.view_bounds();
        let sprites = self.collect_sprite_draws(alpha);

        match self.render.render(&sprites, view) {
            Ok(()) => {}
            Err(err) => warn!("frame submission failed"; "error" => %err),
        }

        self.reconcile_context_state();
    }

    fn collect_sprite_draws(&self, alpha: f32) -> Vec<SpriteDraw> {
        let transforms = self.world.read_storage::<Transform>();
        let sprites = self.world.read_storage::<Sprite>();
        let mut draws = Vec::new();

        for (t, s) in (&transforms, &sprites).join() {
            let key = frame_key(&s.sprite_key, s.frame_index);
            let (atlas, uv) = match self.frame_cache.get(&key) {
                Some(slot) => *slot,
                None => continue,
            };
            let delta = t.position - t.last_position;
            let pos = t.last_position + delta * alpha;

            draws.push(SpriteDraw {
                pos: common::Point2::new(pos.x(), pos.y()),
                uv,
                atlas,
                tint: s.tint,
                facing: t.facing,
                layer: s.layer as u32,
            });
        }

        draws
    }

    fn view_bounds(&self) -> ViewBounds {
        let camera = &self.world.read_resource::<CameraResource>().0;
        let a = camera.screen_to_world(unit::ScreenPoint::new(0.0, 0.0));
        let b = camera.screen_to_world(unit::ScreenPoint::new(
            self.viewport_width as f32,
            self.viewport_height as f32,
        ));
        // the camera's screen/world y-flip means `b` isn't necessarily the larger corner
        let min = common::Point2::new(a.x.min(b.x), a.y.min(b.y));
        let max = common::Point2::new(a.x.max(b.x), a.y.max(b.y));
        ViewBounds::expanded(min, max, self.cell_size)
    }

    /// Drives the context-loss retry schedule once per render; transitions are logged
    /// as diagnostics so the host's readouts reflect the same state the render crate's
    /// own logging already captures.
    fn reconcile_context_state(&mut self) {
        if !self.render.is_render_suspended() {
            return;
        }

        let was_lost = matches!(self.render.context_state(), ContextState::Lost { .. });
        let (vw, vh) = (self.viewport_width, self.viewport_height);
        self.render
            .try_recover(move || Box::new(render::software::SoftwareBackend::new(vw, vh)));

        match self.render.context_state() {
            ContextState::Active if was_lost => {
                if self.render.tier() == GpuTier::SoftwareBlit {
                    self.diagnostics.push(DiagnosticEvent::RenderFallenBackToSoftware);
                } else {
                    self.diagnostics.push(DiagnosticEvent::RenderContextRestored);
                }
            }
            _ => {}
        }
    }

    /// Call when the host's GPU context reports loss (spec's recoverable-runtime-error
    /// path). The simulation keeps ticking; rendering becomes a no-op until recovered.
    pub fn notify_context_lost(&mut self) {
        self.render.on_context_lost();
        self.diagnostics.push(DiagnosticEvent::RenderContextLost);
    }

    pub fn take_diagnostics(&mut self) -> Vec<DiagnosticEvent> {
        self.diagnostics.drain()
    }

    pub fn take_snapshot(&self) -> Snapshot {
        let entity_count = self.world.entities().join().count();
        let selected = self.world.read_storage::<Selectable>();
        let selected_count = (&selected).join().filter(|s| s.state == SelectionState::Selected).count();

        Snapshot {
            tick: self.world.tick_number(),
            sim_time_secs: self.world.read_resource::<simulation::resources::SimTime>().now,
            entity_count,
            selected_count,
            degraded_systems: self.world.degraded_systems().collect(),
            render_tier: self.render.tier(),
            render_suspended: self.render.is_render_suspended(),
        }
    }

    pub fn sampled_fps(&self) -> f32 {
        self.sampled_fps
    }
}

fn frame_key(sprite_key: &str, frame_index: u32) -> String {
    format!("{}-{:04}", sprite_key, frame_index)
}
