//! Per-frame collection of visible sprite draws into layer/atlas-grouped draw calls,
//! so the backend issues one draw call per (layer, atlas) pair instead of one per
//! sprite.

use color::ColorRgb;
use common::Point2;

use crate::atlas::{AtlasId, UvRect};

#[derive(Copy, Clone, Debug)]
pub struct SpriteDraw {
    pub pos: Point2,
    pub uv: UvRect,
    pub atlas: AtlasId,
    pub tint: ColorRgb,
    /// 8-direction facing index, or a rotation encoded the same way the caller encodes
    /// `Transform::facing` (see `simulation::components::Transform`).
    pub facing: u8,
    pub layer: u32,
}

#[derive(Debug)]
pub struct DrawCall {
    pub layer: u32,
    pub atlas: AtlasId,
    pub sprites: Vec<SpriteDraw>,
}

#[derive(Copy, Clone, Debug)]
pub struct ViewBounds {
    pub min: Point2,
    pub max: Point2,
}

impl ViewBounds {
    /// The camera's world-space view, expanded by `margin` on every side so sprites
    /// whose center has just scrolled off-screen don't pop out before they've fully
    /// left the visible area.
    pub fn expanded(min: Point2, max: Point2, margin: f32) -> Self {
        Self {
            min: Point2::new(min.x - margin, min.y - margin),
            max: Point2::new(max.x + margin, max.y + margin),
        }
    }

    fn contains(&self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

pub struct SpriteBatcher;

impl SpriteBatcher {
    /// Culls to `view`, sorts by `(layer, atlas, y)`, then groups consecutive sprites
    /// sharing a `(layer, atlas)` pair into a single draw call.
    pub fn batch(sprites: &[SpriteDraw], view: ViewBounds) -> Vec<DrawCall> {
        let mut visible: Vec<SpriteDraw> = sprites.iter().copied().filter(|s| view.contains(s.pos)).collect();

        visible.sort_by(|a, b| {
            a.layer
                .cmp(&b.layer)
                .then(a.atlas.cmp(&b.atlas))
                .then(a.pos.y.partial_cmp(&b.pos.y).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut calls: Vec<DrawCall> = Vec::new();
        for sprite in visible {
            match calls.last_mut() {
                Some(call) if call.layer == sprite.layer && call.atlas == sprite.atlas => {
                    call.sprites.push(sprite);
                }
                _ => calls.push(DrawCall {
                    layer: sprite.layer,
                    atlas: sprite.atlas,
                    sprites: vec![sprite],
                }),
            }
        }
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(x: f32, y: f32, layer: u32, atlas: u32) -> SpriteDraw {
        SpriteDraw {
            pos: Point2::new(x, y),
            uv: UvRect {
                u0: 0.0,
                v0: 0.0,
                u1: 1.0,
                v1: 1.0,
            },
            atlas: AtlasId(atlas),
            tint: ColorRgb::new(255, 255, 255),
            facing: 0,
            layer,
        }
    }

    #[test]
    fn culls_sprites_outside_the_expanded_view() {
        let view = ViewBounds::expanded(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 1.0);
        let sprites = [sprite(5.0, 5.0, 0, 0), sprite(100.0, 100.0, 0, 0)];
        let calls = SpriteBatcher::batch(&sprites, view);
        assert_eq!(calls.iter().map(|c| c.sprites.len()).sum::<usize>(), 1);
    }

    #[test]
    fn groups_same_layer_and_atlas_into_one_call() {
        let view = ViewBounds::expanded(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 0.0);
        let sprites = [sprite(1.0, 1.0, 0, 0), sprite(2.0, 2.0, 0, 0)];
        let calls = SpriteBatcher::batch(&sprites, view);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sprites.len(), 2);
    }

    #[test]
    fn separate_atlases_produce_separate_calls() {
        let view = ViewBounds::expanded(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 0.0);
        let sprites = [sprite(1.0, 1.0, 0, 0), sprite(2.0, 2.0, 0, 1)];
        let calls = SpriteBatcher::batch(&sprites, view);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn within_a_call_sprites_are_sorted_by_y() {
        let view = ViewBounds::expanded(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 0.0);
        let sprites = [sprite(1.0, 5.0, 0, 0), sprite(1.0, 1.0, 0, 0)];
        let calls = SpriteBatcher::batch(&sprites, view);
        assert_eq!(calls[0].sprites[0].pos.y, 1.0);
        assert_eq!(calls[0].sprites[1].pos.y, 5.0);
    }
}
