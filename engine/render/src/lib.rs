//! Amortizes texture binds and survives GPU memory pressure / context loss behind a
//! small capability-checked backend facade (see `backend::RenderBackend`).
//!
//! This crate is host-agnostic: it owns atlas packing, texture-unit allocation, the
//! upload queue, and the sprite batcher, but never opens a window or GPU context
//! itself. The embedding host picks a concrete `RenderBackend` (a real GPU adapter, or
//! the `SoftwareBackend` shipped here) based on a `backend::FeatureProbe`.

pub mod atlas;
pub mod backend;
pub mod batch;
pub mod memory;
pub mod software;
pub mod texture_pool;

use common::logging::prelude::*;
use common::thiserror::Error;

use atlas::{AtlasId, AtlasSet, UvRect};
use backend::{retries_exhausted, ContextState, GpuTier, RenderBackend};
use batch::{DrawCall, SpriteBatcher, SpriteDraw, ViewBounds};
use memory::{MemoryBudget, PressureLevel};
use texture_pool::{TextureUnitPool, UploadQueue};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no rendering backend tier is available, including software fallback")]
    NoBackendAvailable,
    #[error("upload buffer length {got} does not match expected {expected} for the given dimensions")]
    MalformedUpload { expected: usize, got: usize },
    #[error("atlas packing failed: {0}")]
    Atlas(#[from] atlas::AtlasError),
    #[error("backend rejected the draw submission: {0}")]
    Submit(String),
}

/// Owns atlas/texture-unit/upload state and the active backend, and drives context
/// loss recovery. One instance per render surface.
pub struct RenderPipeline {
    backend: Box<dyn RenderBackend>,
    state: ContextState,
    atlases: AtlasSet,
    texture_units: TextureUnitPool,
    uploads: UploadQueue,
    memory: MemoryBudget,
    tick: u64,
}

impl RenderPipeline {
    pub fn new(
        backend: Box<dyn RenderBackend>,
        max_atlas_size: u32,
        texture_unit_cap: u32,
        upload_budget_bytes_per_frame: usize,
        memory_budget_bytes: usize,
    ) -> Self {
        let probe = backend.probe_features();
        let texture_units = TextureUnitPool::new(probe.max_texture_units, texture_unit_cap);
        Self {
            backend,
            state: ContextState::Active,
            atlases: AtlasSet::new(max_atlas_size),
            texture_units,
            uploads: UploadQueue::new(upload_budget_bytes_per_frame),
            memory: MemoryBudget::new(memory_budget_bytes),
            tick: 0,
        }
    }

    /// Builds a pipeline from the recognized configuration defaults (`max_atlas_size`,
    /// `texture_unit_cap`, `upload_budget_bytes_per_frame`), with a memory budget
    /// derived from the atlas size and texture-unit cap.
    pub fn from_config(backend: Box<dyn RenderBackend>) -> Self {
        let cfg = config::get();
        let memory_budget =
            (cfg.display.max_atlas_size as usize).pow(2) * 4 * cfg.display.texture_unit_cap as usize;
        Self::new(
            backend,
            cfg.display.max_atlas_size,
            cfg.display.texture_unit_cap,
            cfg.display.upload_budget_bytes_per_frame as usize,
            memory_budget,
        )
    }

    pub fn tier(&self) -> GpuTier {
        self.backend.tier()
    }

    pub fn context_state(&self) -> ContextState {
        self.state
    }

    pub fn texture_unit_capacity(&self) -> usize {
        self.texture_units.capacity()
    }

    /// Looks up a sprite frame's atlas slot, packing it into an atlas and enqueueing
    /// its upload on first use. Returns `None` if the frame is larger than the
    /// configured max atlas size even on an empty atlas.
    pub fn resolve_frame(&mut self, key: &str, width: u32, height: u32) -> Option<(AtlasId, UvRect)> {
        if let Some(hit) = self.atlases.get(key) {
            return Some(hit);
        }
        match self.atlases.insert(key, width, height, self.tick) {
            Ok((id, uv)) => {
                self.uploads.enqueue(id, (width as usize) * (height as usize) * 4);
                Some((id, uv))
            }
            Err(err) => {
                warn!("dropping sprite frame that doesn't fit any atlas"; "key" => key, "error" => %err);
                None
            }
        }
    }

    /// Marks the context as lost: drops backend-side GPU state and the atlas index
    /// (atlases are rebuilt lazily on next use), and suspends rendering until restored.
    pub fn on_context_lost(&mut self) {
        if self.state == ContextState::Active {
            self.backend.handle_context_loss();
            self.atlases = AtlasSet::new(self.atlases.max_atlas_size());
            self.state = ContextState::Lost { attempt: 0 };
        }
    }

    /// True while the context is lost and rendering is a no-op; the simulation keeps
    /// ticking regardless.
    pub fn is_render_suspended(&self) -> bool {
        matches!(self.state, ContextState::Lost { .. })
    }

    /// Advances one retry attempt. Once the schedule (`backend::retries_exhausted`) is
    /// exhausted, swaps in `fallback` (expected to build a `SoftwareBackend`) and marks
    /// the pipeline as permanently fallen back.
    pub fn try_recover(&mut self, fallback: impl FnOnce() -> Box<dyn RenderBackend>) {
        let attempt = match self.state {
            ContextState::Lost { attempt } => attempt,
            _ => return,
        };

        if retries_exhausted(attempt) {
            warn!("GPU context retry schedule exhausted, falling back to software rendering");
            self.backend = fallback();
            self.state = ContextState::Active;
            return;
        }

        match self.backend.try_restore() {
            Ok(()) => {
                info!("GPU context restored"; "attempt" => attempt);
                self.state = ContextState::Active;
            }
            Err(_) => {
                self.state = ContextState::Lost { attempt: attempt + 1 };
            }
        }
    }

    /// Culls, batches, and submits `sprites`. A no-op while the context is lost.
    pub fn render(&mut self, sprites: &[SpriteDraw], view: ViewBounds) -> Result<(), RenderError> {
        if self.is_render_suspended() {
            return Ok(());
        }
        self.tick += 1;

        for atlas_id in self.uploads.drain_for_frame() {
            self.atlases.mark_used(atlas_id, self.tick);
            if let Ok(outcome) = self.texture_units.bind(atlas_id, self.tick) {
                if let texture_pool::BindOutcome::Evicted { evicted, .. } = outcome {
                    trace!("texture unit evicted to make room"; "evicted_atlas" => evicted.0);
                }
            }
        }

        match self.memory.level(self.atlases.total_bytes()) {
            PressureLevel::Aggressive => {
                self.atlases.shrink_max_size(1024);
                if let Some(evicted) = self.atlases.evict_least_recently_used() {
                    warn!("aggressive eviction under memory pressure"; "atlas" => evicted.0);
                }
            }
            PressureLevel::Warn => {
                if let Some(evicted) = self.atlases.evict_least_recently_used() {
                    debug!("evicting least-recently-used atlas under memory pressure"; "atlas" => evicted.0);
                }
            }
            PressureLevel::Normal => {}
        }

        let calls = SpriteBatcher::batch(sprites, view);
        self.backend.submit(&calls)
    }
}

#[cfg(test)]
mod tests {
    use common::Point2;

    use super::*;
    use crate::backend::{CanvasSize, FeatureProbe};
    use crate::software::SoftwareBackend;

    /// A GPU stand-in whose context never comes back, to exercise the retry-exhaustion
    /// path without depending on `SoftwareBackend`'s trivially-always-succeeds restore.
    struct NeverRestoresBackend;

    impl RenderBackend for NeverRestoresBackend {
        fn tier(&self) -> GpuTier {
            GpuTier::BaselineGpu
        }

        fn probe_features(&self) -> FeatureProbe {
            FeatureProbe {
                max_texture_size: 2048,
                max_texture_units: 8,
                supports_non_power_of_two: true,
                supports_instanced_draws: false,
            }
        }

        fn probe_canvas_size(&mut self, requested: CanvasSize) -> CanvasSize {
            requested
        }

        fn upload_texture(&mut self, _atlas: AtlasId, _w: u32, _h: u32, _pixels: &[u8]) -> Result<(), RenderError> {
            Ok(())
        }

        fn submit(&mut self, _calls: &[DrawCall]) -> Result<(), RenderError> {
            Ok(())
        }

        fn handle_context_loss(&mut self) {}

        fn try_restore(&mut self) -> Result<(), RenderError> {
            Err(RenderError::NoBackendAvailable)
        }
    }

    fn pipeline() -> RenderPipeline {
        RenderPipeline::new(Box::new(SoftwareBackend::new(64, 64)), 64, 4, 1_000_000, 1_000_000)
    }

    #[test]
    fn resolving_the_same_frame_twice_reuses_its_atlas_slot() {
        let mut pipeline = pipeline();
        let first = pipeline.resolve_frame("unit-rifleman-0000", 16, 16).unwrap();
        let second = pipeline.resolve_frame("unit-rifleman-0000", 16, 16).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn render_is_a_no_op_while_context_is_lost() {
        let mut pipeline = pipeline();
        pipeline.on_context_lost();
        assert!(pipeline.is_render_suspended());

        let view = ViewBounds::expanded(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 1.0);
        assert!(pipeline.render(&[], view).is_ok());
    }

    #[test]
    fn exhausting_retries_falls_back_to_the_software_backend() {
        let mut pipeline = RenderPipeline::new(Box::new(NeverRestoresBackend), 64, 4, 1_000_000, 1_000_000);
        pipeline.on_context_lost();

        for _ in 0..6 {
            pipeline.try_recover(|| Box::new(SoftwareBackend::new(64, 64)));
        }

        assert!(!pipeline.is_render_suspended());
        assert_eq!(pipeline.tier(), GpuTier::SoftwareBlit);
    }

    #[test]
    fn canvas_probe_delegates_to_the_backend() {
        let mut backend = SoftwareBackend::new(64, 64);
        let size = backend.probe_canvas_size(CanvasSize {
            width: 128,
            height: 128,
        });
        assert_eq!(size, CanvasSize { width: 128, height: 128 });
    }
}
