//! Bin-packs sprite frames into fixed-size atlases and tracks which atlas/UV rect each
//! frame key currently lives at. Mirrors the shelf-packing approach common to sprite
//! engines: frames are placed left-to-right along a shelf, and a new shelf is opened
//! when the current one runs out of width.

use std::collections::HashMap;

use common::thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct AtlasId(pub u32);

/// Normalized UV rectangle, (0,0) top-left to (1,1) bottom-right of the atlas.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("frame {0}x{1} does not fit in an atlas of size {2}x{2}, even on an empty shelf")]
    FrameTooLarge(u32, u32, u32),
    #[error("atlas is full")]
    Full,
}

struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
}

struct ShelfPacker {
    size: u32,
    shelves: Vec<Shelf>,
    cursor_y: u32,
}

impl ShelfPacker {
    fn new(size: u32) -> Self {
        Self {
            size,
            shelves: Vec::new(),
            cursor_y: 0,
        }
    }

    fn try_place(&mut self, w: u32, h: u32) -> Result<(u32, u32), AtlasError> {
        if w > self.size || h > self.size {
            return Err(AtlasError::FrameTooLarge(w, h, self.size));
        }

        if let Some(shelf) = self
            .shelves
            .iter_mut()
            .find(|s| s.height >= h && s.cursor_x + w <= self.size)
        {
            let x = shelf.cursor_x;
            shelf.cursor_x += w;
            return Ok((x, shelf.y));
        }

        if self.cursor_y + h > self.size {
            return Err(AtlasError::Full);
        }

        let y = self.cursor_y;
        self.shelves.push(Shelf {
            y,
            height: h,
            cursor_x: w,
        });
        self.cursor_y += h;
        Ok((0, y))
    }
}

/// A single fixed-size atlas: a packer plus the frames it currently holds.
pub struct TextureAtlas {
    id: AtlasId,
    size: u32,
    packer: ShelfPacker,
    frames: HashMap<String, UvRect>,
    bytes_used: usize,
    last_used_tick: u64,
}

impl TextureAtlas {
    fn new(id: AtlasId, size: u32) -> Self {
        Self {
            id,
            size,
            packer: ShelfPacker::new(size),
            frames: HashMap::new(),
            bytes_used: 0,
            last_used_tick: 0,
        }
    }

    pub fn id(&self) -> AtlasId {
        self.id
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    pub fn uv(&self, key: &str) -> Option<UvRect> {
        self.frames.get(key).copied()
    }

    /// 4 bytes (RGBA8) per pixel, matching how most sprite atlases are stored.
    fn try_insert(&mut self, key: &str, w: u32, h: u32) -> Result<UvRect, AtlasError> {
        let (x, y) = self.packer.try_place(w, h)?;
        let scale = self.size as f32;
        let uv = UvRect {
            u0: x as f32 / scale,
            v0: y as f32 / scale,
            u1: (x + w) as f32 / scale,
            v1: (y + h) as f32 / scale,
        };
        self.frames.insert(key.to_owned(), uv);
        self.bytes_used += (w * h * 4) as usize;
        Ok(uv)
    }
}

/// Owns every live atlas and the frame -> (atlas, uv) index used for O(1) lookup.
pub struct AtlasSet {
    atlases: Vec<TextureAtlas>,
    next_id: u32,
    max_atlas_size: u32,
    index: HashMap<String, AtlasId>,
}

impl AtlasSet {
    pub fn new(max_atlas_size: u32) -> Self {
        Self {
            atlases: Vec::new(),
            next_id: 0,
            max_atlas_size,
            index: HashMap::new(),
        }
    }

    pub fn max_atlas_size(&self) -> u32 {
        self.max_atlas_size
    }

    /// Reduces the atlas budget for newly created atlases; existing ones are left as-is
    /// until evicted, since shrinking them in place would invalidate every live UV rect.
    pub fn shrink_max_size(&mut self, size: u32) {
        self.max_atlas_size = self.max_atlas_size.min(size);
    }

    pub fn get(&self, key: &str) -> Option<(AtlasId, UvRect)> {
        let id = *self.index.get(key)?;
        let atlas = self.atlases.iter().find(|a| a.id == id)?;
        atlas.uv(key).map(|uv| (id, uv))
    }

    pub fn atlas(&self, id: AtlasId) -> Option<&TextureAtlas> {
        self.atlases.iter().find(|a| a.id == id)
    }

    pub fn total_bytes(&self) -> usize {
        self.atlases.iter().map(TextureAtlas::bytes_used).sum()
    }

    /// Touches an atlas's recency, used for least-recently-used eviction under memory
    /// pressure.
    pub fn mark_used(&mut self, id: AtlasId, tick: u64) {
        if let Some(atlas) = self.atlases.iter_mut().find(|a| a.id == id) {
            atlas.last_used_tick = tick;
        }
    }

    /// Inserts a frame on first use, opening a new atlas if every existing one is full.
    pub fn insert(&mut self, key: &str, w: u32, h: u32, tick: u64) -> Result<(AtlasId, UvRect), AtlasError> {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        for atlas in &mut self.atlases {
            if let Ok(uv) = atlas.try_insert(key, w, h) {
                atlas.last_used_tick = tick;
                self.index.insert(key.to_owned(), atlas.id);
                return Ok((atlas.id, uv));
            }
        }

        let id = AtlasId(self.next_id);
        self.next_id += 1;
        let mut atlas = TextureAtlas::new(id, self.max_atlas_size);
        let uv = atlas.try_insert(key, w, h)?;
        atlas.last_used_tick = tick;
        self.atlases.push(atlas);
        self.index.insert(key.to_owned(), id);
        Ok((id, uv))
    }

    /// Drops the least-recently-used atlas, returning its id so the caller can release
    /// the matching GPU texture and texture-unit binding.
    pub fn evict_least_recently_used(&mut self) -> Option<AtlasId> {
        let (idx, _) = self
            .atlases
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| a.last_used_tick)?;
        let atlas = self.atlases.remove(idx);
        self.index.retain(|_, id| *id != atlas.id);
        Some(atlas.id)
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_frames_onto_the_same_shelf() {
        let mut set = AtlasSet::new(256);
        let (id_a, uv_a) = set.insert("a", 32, 32, 0).unwrap();
        let (id_b, uv_b) = set.insert("b", 32, 32, 0).unwrap();
        assert_eq!(id_a, id_b);
        assert_eq!(uv_a.v0, uv_b.v0);
        assert!(uv_b.u0 >= uv_a.u1);
    }

    #[test]
    fn repeated_insert_of_same_key_is_idempotent() {
        let mut set = AtlasSet::new(64);
        let first = set.insert("a", 16, 16, 0).unwrap();
        let second = set.insert("a", 16, 16, 5).unwrap();
        assert_eq!(first, second);
        assert_eq!(set.atlas_count(), 1);
    }

    #[test]
    fn opens_a_new_atlas_once_the_first_is_full() {
        let mut set = AtlasSet::new(32);
        set.insert("a", 32, 32, 0).unwrap();
        let (id_b, _) = set.insert("b", 32, 32, 0).unwrap();
        assert_eq!(set.atlas_count(), 2);
        assert_eq!(id_b, AtlasId(1));
    }

    #[test]
    fn frame_larger_than_atlas_size_is_rejected() {
        let mut set = AtlasSet::new(64);
        let err = set.insert("huge", 128, 128, 0).unwrap_err();
        assert!(matches!(err, AtlasError::FrameTooLarge(128, 128, 64)));
    }

    #[test]
    fn eviction_removes_the_least_recently_used_atlas() {
        let mut set = AtlasSet::new(16);
        set.insert("a", 16, 16, 0).unwrap();
        set.insert("b", 16, 16, 0).unwrap();
        set.mark_used(AtlasId(0), 10);
        set.mark_used(AtlasId(1), 1);

        let evicted = set.evict_least_recently_used().unwrap();
        assert_eq!(evicted, AtlasId(1));
        assert!(set.get("b").is_none());
        assert!(set.get("a").is_some());
    }
}
