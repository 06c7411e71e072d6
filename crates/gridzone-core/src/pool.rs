//! Object recycling: [`Pool`] and the generation-checked [`Arena`].
//!
//! A [`Pool`] hands out reset values and takes them back, keeping their heap
//! capacity for the next renter. An [`Arena`] stores values in slots
//! addressed by [`Handle`]s; each slot carries a generation counter that is
//! bumped on removal, so a handle to a released value can never observe the
//! value that later reuses the slot.

use std::fmt;

/// A value that can be returned to a [`Pool`] and rented again.
pub trait Poolable {
    /// Restore the value to its freshly-created state, keeping allocations.
    fn reset(&mut self);
}

impl<T> Poolable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Rent/return counters, for tuning retention limits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: usize,
    pub reused: usize,
    pub returned: usize,
    pub dropped: usize,
}

/// A free list of reusable values.
#[derive(Clone)]
pub struct Pool<T> {
    free: Vec<T>,
    retain: usize,
    stats: PoolStats,
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("available", &self.free.len())
            .field("retain", &self.retain)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    /// An unbounded pool.
    pub fn new() -> Self {
        Self::with_retention(usize::MAX)
    }

    /// A pool that keeps at most `retain` idle values; extra returns are
    /// dropped.
    pub fn with_retention(retain: usize) -> Self {
        Self {
            free: Vec::new(),
            retain,
            stats: PoolStats::default(),
        }
    }

    /// Take an idle value, or build one with `create` if none is left.
    pub fn rent_with(&mut self, create: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(v) => {
                self.stats.reused += 1;
                v
            }
            None => {
                self.stats.created += 1;
                create()
            }
        }
    }

    /// Keep `value` for the next renter after restoring it with `reset`, or
    /// drop it if the pool already holds its retention limit.
    pub fn give_back_with(&mut self, mut value: T, reset: impl FnOnce(&mut T)) {
        if self.free.len() >= self.retain {
            log::trace!("pool full ({} idle), dropping value", self.free.len());
            self.stats.dropped += 1;
            return;
        }
        reset(&mut value);
        self.stats.returned += 1;
        self.free.push(value);
    }

    /// Number of idle values.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T: Poolable + Default> Pool<T> {
    /// Take a value out of the pool, creating one if none is idle.
    pub fn rent(&mut self) -> T {
        self.rent_with(T::default)
    }

    /// Reset `value` and keep it for the next [`rent`](Self::rent).
    pub fn give_back(&mut self, value: T) {
        self.give_back_with(value, T::reset);
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Generation-checked reference to a value stored in an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with stable, generation-checked handles.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value`, reusing a released slot if one exists.
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        assert!(self.slots.len() < u32::MAX as usize, "arena slot index overflow");
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Release the value behind `h`. Stale handles return `None`.
    pub fn remove(&mut self, h: Handle) -> Option<T> {
        let slot = self.slots.get_mut(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(h.index);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, h: Handle) -> Option<&T> {
        let slot = self.slots.get(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        slot.value.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, h: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(h.index as usize)?;
        if slot.generation != h.generation {
            return None;
        }
        slot.value.as_mut()
    }

    #[inline]
    pub fn contains(&self, h: Handle) -> bool {
        self.get(h).is_some()
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live values with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    /// Release every value, invalidating all outstanding handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(v) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
                out.push(v);
            }
        }
        self.len = 0;
        out
    }

    /// Drop every value, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        self.drain();
    }
}
