// PooledFactoryResource - bounded pool of reusable objects
//
// Objects are pre-allocated into slots and handed out by handle so the render
// loop never allocates in steady state. Acquire and release are O(1) via a
// free list of idle slots.
//
// Policies:
// - Acquiring beyond `max` fails fast with `PoolExhausted` (no blocking, the
//   caller is a real-time loop and skips the work for this tick).
// - Releasing a handle from another pool, a stale handle or the same handle
//   twice fails with `ForeignInstance` and leaves the pool untouched.

use crate::resource::{ResourceError, ResourceResult};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Types that can be recycled by a pool
pub trait Poolable {
    /// Return to the freshly constructed state
    fn reset(&mut self);
}

/// Ticket for an acquired instance
///
/// The generation changes every time the slot is released, so a handle kept
/// after release no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pool: u64,
    slot: usize,
    generation: u32,
}

impl PoolHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: usize,
    pub in_use: usize,
    pub idle: usize,
    pub max: usize,
}

struct Slot<T> {
    value: T,
    generation: u32,
    in_use: bool,
}

pub struct PooledFactoryResource<T> {
    id: u64,
    slots: Vec<Slot<T>>,
    idle: Vec<usize>,
    min: usize,
    max: usize,
    factory: Box<dyn Fn() -> T + Send>,
}

impl<T: Poolable> PooledFactoryResource<T> {
    /// Create a pool holding at most `max` instances, `min` of them built up front
    pub fn new(min: usize, max: usize, factory: impl Fn() -> T + Send + 'static) -> Self {
        let min = min.min(max);
        let mut pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::with_capacity(max),
            idle: Vec::with_capacity(max),
            min,
            max,
            factory: Box::new(factory),
        };

        for index in 0..min {
            pool.slots.push(Slot {
                value: (pool.factory)(),
                generation: 0,
                in_use: false,
            });
            // Pop order hands out slot 0 first
            pool.idle.push(min - 1 - index);
        }

        pool
    }

    /// Hand out an idle instance, building a new one while under `max`
    pub fn acquire(&mut self) -> ResourceResult<PoolHandle> {
        let slot = match self.idle.pop() {
            Some(slot) => slot,
            None if self.slots.len() < self.max => {
                self.slots.push(Slot {
                    value: (self.factory)(),
                    generation: 0,
                    in_use: false,
                });
                self.slots.len() - 1
            }
            None => return Err(ResourceError::PoolExhausted { max: self.max }),
        };

        let entry = &mut self.slots[slot];
        entry.in_use = true;
        log::trace!("Pool {} acquired slot {}", self.id, slot);

        Ok(PoolHandle {
            pool: self.id,
            slot,
            generation: entry.generation,
        })
    }

    /// Reset the instance and return it to the idle set
    pub fn release(&mut self, handle: PoolHandle) -> ResourceResult<()> {
        let entry = self.checked_slot_mut(handle)?;
        entry.value.reset();
        entry.in_use = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.idle.push(handle.slot);
        log::trace!("Pool {} released slot {}", self.id, handle.slot);
        Ok(())
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.slot)
            .filter(|s| handle.pool == self.id && s.in_use && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.checked_slot_mut(handle).ok().map(|s| &mut s.value)
    }

    pub fn owns(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Handles of every instance currently handed out
    pub fn in_use_handles(&self) -> Vec<PoolHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.in_use)
            .map(|(slot, s)| PoolHandle {
                pool: self.id,
                slot,
                generation: s.generation,
            })
            .collect()
    }

    pub fn in_use(&self) -> usize {
        self.slots.len() - self.idle.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated(),
            in_use: self.in_use(),
            idle: self.idle_count(),
            max: self.max,
        }
    }

    fn checked_slot_mut(&mut self, handle: PoolHandle) -> ResourceResult<&mut Slot<T>> {
        if handle.pool != self.id {
            return Err(ResourceError::ForeignInstance);
        }
        match self.slots.get_mut(handle.slot) {
            Some(slot) if slot.in_use && slot.generation == handle.generation => Ok(slot),
            _ => Err(ResourceError::ForeignInstance),
        }
    }
}

impl<T> std::fmt::Debug for PooledFactoryResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFactoryResource")
            .field("id", &self.id)
            .field("allocated", &self.slots.len())
            .field("idle", &self.idle.len())
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}
