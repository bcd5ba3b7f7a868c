//! 2D affine camera: pan plus uniform zoom, smoothly interpolating towards a target
//! and exposing pure screen/world coordinate transforms.
//!
//! The teacher's own camera (`engine/src/camera.rs`) is a 3D free-look debug camera with
//! no target-interpolation or screen-point-preserving zoom; there's no direct 2D
//! counterpart to crib from, so the approach-and-snap update and the zoom solve below
//! are built from scratch in the surrounding crates' idiom (`cgmath` types via `common`,
//! bounds read from `config`).

use common::num_traits::clamp;
use common::Point2;
use unit::ScreenPoint;

/// How fast `pos` and `scale` approach their targets, in 1/seconds. Matches the teacher's
/// convention of naming smoothing rates `k_*`.
const K_POS: f32 = 10.0;
const K_SCALE: f32 = 8.0;

/// Below this distance from the target, snap instead of asymptotically approaching
/// forever.
const SNAP_EPSILON: f32 = 1e-3;

pub struct Camera {
    pos: Point2,
    target_pos: Point2,
    scale: f32,
    target_scale: f32,

    scale_min: f32,
    scale_max: f32,
    world_min: Point2,
    world_max: Point2,

    viewport_width: f32,
    viewport_height: f32,
}

impl Camera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let cfg = config::get();
        Self {
            pos: Point2::new(0.0, 0.0),
            target_pos: Point2::new(0.0, 0.0),
            scale: 1.0,
            target_scale: 1.0,
            scale_min: cfg.display.zoom_min,
            scale_max: cfg.display.zoom_max,
            world_min: Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
            world_max: Point2::new(f32::INFINITY, f32::INFINITY),
            viewport_width: viewport_width as f32,
            viewport_height: viewport_height as f32,
        }
    }

    pub fn with_world_bounds(mut self, min: Point2, max: Point2) -> Self {
        self.world_min = min;
        self.world_max = max;
        self
    }

    pub fn pos(&self) -> Point2 {
        self.pos
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn target_pos(&self) -> Point2 {
        self.target_pos
    }

    pub fn target_scale(&self) -> f32 {
        self.target_scale
    }

    /// Sets the pan target, clamped to the world bounds.
    pub fn pan_to(&mut self, target: Point2) {
        self.target_pos = self.clamp_to_world(target);
    }

    pub fn pan_by(&mut self, delta: common::Vector2) {
        self.pan_to(self.target_pos + delta);
    }

    fn clamp_to_world(&self, p: Point2) -> Point2 {
        Point2::new(
            clamp(p.x, self.world_min.x, self.world_max.x),
            clamp(p.y, self.world_min.y, self.world_max.y),
        )
    }

    /// Advances `pos`/`scale` a step towards their targets; snaps once within epsilon
    /// rather than approaching forever.
    pub fn update(&mut self, dt_seconds: f32) {
        let dpos = self.target_pos - self.pos;
        if dpos.x.abs() < SNAP_EPSILON && dpos.y.abs() < SNAP_EPSILON {
            self.pos = self.target_pos;
        } else {
            self.pos += dpos * (K_POS * dt_seconds).min(1.0);
        }

        let dscale = self.target_scale - self.scale;
        if dscale.abs() < SNAP_EPSILON {
            self.scale = self.target_scale;
        } else {
            self.scale += dscale * (K_SCALE * dt_seconds).min(1.0);
        }
    }

    /// Updates the viewport dimensions used by the coordinate transforms; never moves
    /// the camera itself.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport_width = width as f32;
        self.viewport_height = height as f32;
    }

    /// Sets a new target zoom level, adjusting the pan target so the world point
    /// currently under `(screen_x, screen_y)` stays under the cursor once the camera
    /// has converged to the new scale.
    pub fn zoom_to_screen_point(&mut self, new_scale: f32, screen_x: f32, screen_y: f32) {
        let new_scale = clamp(new_scale, self.scale_min, self.scale_max);
        let world_point = self.screen_to_world_at(screen_x, screen_y, self.pos, self.scale);

        self.target_scale = new_scale;
        self.target_pos = self.clamp_to_world(Point2::new(
            world_point.x - (screen_x - self.viewport_width / 2.0) / new_scale,
            world_point.y + (screen_y - self.viewport_height / 2.0) / new_scale,
        ));
    }

    pub fn screen_to_world(&self, screen: ScreenPoint) -> Point2 {
        self.screen_to_world_at(screen.x, screen.y, self.pos, self.scale)
    }

    fn screen_to_world_at(&self, screen_x: f32, screen_y: f32, pos: Point2, scale: f32) -> Point2 {
        Point2::new(
            pos.x + (screen_x - self.viewport_width / 2.0) / scale,
            pos.y - (screen_y - self.viewport_height / 2.0) / scale,
        )
    }

    pub fn world_to_screen(&self, world: Point2) -> ScreenPoint {
        ScreenPoint {
            x: self.viewport_width / 2.0 + (world.x - self.pos.x) * self.scale,
            y: self.viewport_height / 2.0 - (world.y - self.pos.y) * self.scale,
        }
    }
}
