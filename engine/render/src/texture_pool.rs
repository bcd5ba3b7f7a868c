//! Allocation of a fixed pool of GPU texture units to atlases, with LRU eviction, an
//! optional per-draw priority lock, and a byte-budgeted streaming upload queue.

use std::collections::VecDeque;

use common::thiserror::Error;

use crate::atlas::AtlasId;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BindOutcome {
    /// The atlas was already bound to this unit; nothing changed.
    AlreadyBound(usize),
    /// A free unit was bound.
    Bound(usize),
    /// `evicted` was unbound to make room for the new atlas at `unit`.
    Evicted { unit: usize, evicted: AtlasId },
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("all {0} texture units are locked")]
    AllUnitsLocked(usize),
}

struct TextureUnit {
    bound: Option<AtlasId>,
    last_used_tick: u64,
    locked: bool,
}

/// `K = min(max-units-reported, configured cap, default 16)` texture units, bound to
/// atlases on demand and evicted least-recently-used first.
pub struct TextureUnitPool {
    units: Vec<TextureUnit>,
}

impl TextureUnitPool {
    pub fn new(max_units_reported: u32, configured_cap: u32) -> Self {
        let k = (max_units_reported.min(configured_cap)).max(1) as usize;
        let units = (0..k)
            .map(|_| TextureUnit {
                bound: None,
                last_used_tick: 0,
                locked: false,
            })
            .collect();
        Self { units }
    }

    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    pub fn unit_for(&self, atlas: AtlasId) -> Option<usize> {
        self.units.iter().position(|u| u.bound == Some(atlas))
    }

    pub fn lock(&mut self, unit: usize) {
        if let Some(u) = self.units.get_mut(unit) {
            u.locked = true;
        }
    }

    pub fn unlock(&mut self, unit: usize) {
        if let Some(u) = self.units.get_mut(unit) {
            u.locked = false;
        }
    }

    /// Binds `atlas` to a unit, evicting the least-recently-used unlocked unit if the
    /// pool is full.
    pub fn bind(&mut self, atlas: AtlasId, tick: u64) -> Result<BindOutcome, PoolError> {
        if let Some(idx) = self.unit_for(atlas) {
            self.units[idx].last_used_tick = tick;
            return Ok(BindOutcome::AlreadyBound(idx));
        }

        if let Some(idx) = self.units.iter().position(|u| u.bound.is_none()) {
            self.units[idx].bound = Some(atlas);
            self.units[idx].last_used_tick = tick;
            return Ok(BindOutcome::Bound(idx));
        }

        let victim = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, u)| !u.locked)
            .min_by_key(|(_, u)| u.last_used_tick)
            .map(|(idx, _)| idx)
            .ok_or(PoolError::AllUnitsLocked(self.units.len()))?;

        let evicted = self.units[victim].bound.take().expect("victim was bound");
        self.units[victim].bound = Some(atlas);
        self.units[victim].last_used_tick = tick;
        Ok(BindOutcome::Evicted {
            unit: victim,
            evicted,
        })
    }
}

struct PendingUpload {
    atlas: AtlasId,
    bytes: usize,
}

/// Frames not yet resident on the GPU queue here; `drain_for_frame` releases only as
/// many as the per-frame byte budget allows, leaving the rest for later frames.
pub struct UploadQueue {
    pending: VecDeque<PendingUpload>,
    budget_bytes_per_frame: usize,
}

impl UploadQueue {
    pub fn new(budget_bytes_per_frame: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            budget_bytes_per_frame,
        }
    }

    pub fn enqueue(&mut self, atlas: AtlasId, bytes: usize) {
        self.pending.push_back(PendingUpload { atlas, bytes });
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pops uploads from the front of the queue until the budget is exhausted.
    pub fn drain_for_frame(&mut self) -> Vec<AtlasId> {
        let mut uploaded = Vec::new();
        let mut spent = 0usize;

        while let Some(next) = self.pending.front() {
            if spent > 0 && spent + next.bytes > self.budget_bytes_per_frame {
                break;
            }
            let upload = self.pending.pop_front().expect("just peeked");
            spent += upload.bytes;
            uploaded.push(upload.atlas);
        }

        uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_atlases_to_free_units_first() {
        let mut pool = TextureUnitPool::new(16, 16);
        let outcome = pool.bind(AtlasId(0), 1).unwrap();
        assert_eq!(outcome, BindOutcome::Bound(0));
    }

    #[test]
    fn rebinding_the_same_atlas_is_a_cache_hit() {
        let mut pool = TextureUnitPool::new(2, 2);
        let first = pool.bind(AtlasId(0), 1).unwrap();
        let BindOutcome::Bound(unit) = first else {
            panic!("expected Bound");
        };
        let second = pool.bind(AtlasId(0), 2).unwrap();
        assert_eq!(second, BindOutcome::AlreadyBound(unit));
    }

    #[test]
    fn evicts_the_least_recently_used_unit_once_full() {
        let mut pool = TextureUnitPool::new(2, 2);
        pool.bind(AtlasId(0), 1).unwrap();
        pool.bind(AtlasId(1), 2).unwrap();

        let outcome = pool.bind(AtlasId(2), 3).unwrap();
        assert_eq!(
            outcome,
            BindOutcome::Evicted {
                unit: 0,
                evicted: AtlasId(0)
            }
        );
    }

    #[test]
    fn locked_units_are_never_evicted() {
        let mut pool = TextureUnitPool::new(1, 1);
        pool.bind(AtlasId(0), 1).unwrap();
        pool.lock(0);

        let err = pool.bind(AtlasId(1), 2).unwrap_err();
        assert!(matches!(err, PoolError::AllUnitsLocked(1)));
    }

    #[test]
    fn upload_queue_respects_the_per_frame_byte_budget() {
        let mut queue = UploadQueue::new(100);
        queue.enqueue(AtlasId(0), 60);
        queue.enqueue(AtlasId(1), 60);
        queue.enqueue(AtlasId(2), 10);

        let first_frame = queue.drain_for_frame();
        assert_eq!(first_frame, vec![AtlasId(0)]);

        let second_frame = queue.drain_for_frame();
        assert_eq!(second_frame, vec![AtlasId(1), AtlasId(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn a_single_upload_larger_than_budget_still_goes_through_alone() {
        let mut queue = UploadQueue::new(10);
        queue.enqueue(AtlasId(0), 500);
        assert_eq!(queue.drain_for_frame(), vec![AtlasId(0)]);
    }
}
