//! Capability-checked facade over the GPU context: feature probing selects the
//! highest tier the host can support, and a retry schedule governs how the facade
//! behaves across context loss/restore.

use std::time::Duration;

use crate::batch::DrawCall;
use crate::RenderError;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum GpuTier {
    /// Indexed triangles, large vertex buffers, uniform buffer objects.
    ModernGpu,
    /// Indexed triangles, smaller buffers, per-draw uniforms.
    BaselineGpu,
    /// Per-sprite CPU copy into a framebuffer; always available.
    SoftwareBlit,
}

/// What `RenderBackend::probe_features` reports about the host's GPU context at init.
#[derive(Copy, Clone, Debug)]
pub struct FeatureProbe {
    pub max_texture_size: u32,
    pub max_texture_units: u32,
    pub supports_non_power_of_two: bool,
    pub supports_instanced_draws: bool,
}

impl FeatureProbe {
    /// Chooses the highest tier whose requirements the probe satisfies.
    pub fn select_tier(&self) -> GpuTier {
        if self.supports_instanced_draws
            && self.supports_non_power_of_two
            && self.max_texture_size >= 2048
            && self.max_texture_units >= 16
        {
            GpuTier::ModernGpu
        } else if self.max_texture_size >= 1024 && self.max_texture_units >= 4 {
            GpuTier::BaselineGpu
        } else {
            GpuTier::SoftwareBlit
        }
    }
}

const MAX_CONTEXT_RETRIES: u32 = 5;
const BASE_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// `100ms * 2^attempt`, capped at 5s. `attempt` is 0-based, so the first retry is
/// scheduled immediately after the initial loss is detected.
pub fn retry_backoff(attempt: u32) -> Duration {
    let scaled = BASE_RETRY_DELAY.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    scaled.min(MAX_RETRY_DELAY)
}

pub fn retries_exhausted(attempt: u32) -> bool {
    attempt >= MAX_CONTEXT_RETRIES
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ContextState {
    Active,
    /// The context was lost; `attempt` retries have been made so far.
    Lost { attempt: u32 },
    /// Every retry was exhausted; the facade has fallen back to the software tier.
    FallenBack,
}

/// Canvas size a backend was able to obtain, vs. what was requested.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Binary search for the largest `(w, h)` pair `accepts` returns `true` for, scaling
/// both dimensions together from `requested` down to `1x1`. Used by backends whose
/// `probe_canvas_size` can't just ask the OS for a hard limit.
pub fn binary_search_canvas_size(requested: CanvasSize, accepts: impl Fn(CanvasSize) -> bool) -> CanvasSize {
    if accepts(requested) {
        return requested;
    }

    let mut lo = 1u32;
    let mut hi = 100u32; // percent of requested size
    let mut best = CanvasSize { width: 1, height: 1 };

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = CanvasSize {
            width: (requested.width * mid / 100).max(1),
            height: (requested.height * mid / 100).max(1),
        };
        if accepts(candidate) {
            best = candidate;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    best
}

/// Implemented once per GPU tier (or by a host-specific adapter wrapping a real GPU
/// API); `render::` only ships the always-available `SoftwareBackend`. Concrete
/// hardware-accelerated tiers are provided by the embedding host.
pub trait RenderBackend {
    fn tier(&self) -> GpuTier;
    fn probe_features(&self) -> FeatureProbe;
    fn probe_canvas_size(&mut self, requested: CanvasSize) -> CanvasSize;

    /// Uploads raw RGBA8 pixel data for one atlas. Called from the `UploadQueue`'s
    /// per-frame drain, never more than the configured byte budget per frame.
    fn upload_texture(&mut self, atlas: crate::atlas::AtlasId, width: u32, height: u32, pixels: &[u8]) -> Result<(), RenderError>;

    /// Issues one draw call per `DrawCall`; called once per frame with everything the
    /// `SpriteBatcher` produced, in order.
    fn submit(&mut self, calls: &[DrawCall]) -> Result<(), RenderError>;

    /// Drops all GPU-side state; called once when context loss is first detected.
    fn handle_context_loss(&mut self);

    /// Attempts to rebuild a GPU context after loss. Atlases are expected to be
    /// re-uploaded lazily from source frames on next use, not eagerly here.
    fn try_restore(&mut self) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_gpu_requires_every_feature() {
        let probe = FeatureProbe {
            max_texture_size: 4096,
            max_texture_units: 32,
            supports_non_power_of_two: true,
            supports_instanced_draws: true,
        };
        assert_eq!(probe.select_tier(), GpuTier::ModernGpu);
    }

    #[test]
    fn missing_instancing_falls_back_to_baseline() {
        let probe = FeatureProbe {
            max_texture_size: 4096,
            max_texture_units: 32,
            supports_non_power_of_two: true,
            supports_instanced_draws: false,
        };
        assert_eq!(probe.select_tier(), GpuTier::BaselineGpu);
    }

    #[test]
    fn very_limited_probe_falls_back_to_software() {
        let probe = FeatureProbe {
            max_texture_size: 256,
            max_texture_units: 1,
            supports_non_power_of_two: false,
            supports_instanced_draws: false,
        };
        assert_eq!(probe.select_tier(), GpuTier::SoftwareBlit);
    }

    #[test]
    fn retry_backoff_doubles_then_caps_at_five_seconds() {
        assert_eq!(retry_backoff(0), Duration::from_millis(100));
        assert_eq!(retry_backoff(1), Duration::from_millis(200));
        assert_eq!(retry_backoff(2), Duration::from_millis(400));
        assert_eq!(retry_backoff(10), Duration::from_secs(5));
    }

    #[test]
    fn five_retries_exhausts_the_schedule() {
        assert!(!retries_exhausted(4));
        assert!(retries_exhausted(5));
    }

    #[test]
    fn canvas_probe_returns_requested_size_when_accepted() {
        let requested = CanvasSize {
            width: 1920,
            height: 1080,
        };
        let size = binary_search_canvas_size(requested, |_| true);
        assert_eq!(size, requested);
    }

    #[test]
    fn canvas_probe_shrinks_to_the_largest_accepted_size() {
        let requested = CanvasSize {
            width: 4000,
            height: 3000,
        };
        let cap = 2048u32;
        let size = binary_search_canvas_size(requested, |c| c.width <= cap && c.height <= cap);
        assert!(size.width <= cap && size.height <= cap);
        assert!(size.width > 0 && size.height > 0);
        // the search found something close to the true boundary, not a trivial 1x1
        assert!(size.width > cap / 2);
    }
}
