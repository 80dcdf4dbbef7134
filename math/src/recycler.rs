//! Bounded object pools that recycle fixed-size buffers.
//!
//! A [`RecycleBin`] hands out objects seeded from a source value and takes
//! them back once their owner is done with them. Checking an object out
//! moves it out of the pool and checking it in moves it back, so a recycled
//! buffer can never still be referenced by a live element.

use tracing::trace;

/// Builds pooled objects from a source value and refills recycled ones.
pub trait Creator<T, S: ?Sized> {
    /// Construct a fresh object seeded with `source`.
    fn create(&self, source: &S) -> T;

    /// Overwrite a recycled object's contents with `source`.
    fn refill(&self, target: &mut T, source: &S);
}

/// Creates and refills limb buffers of one fixed length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimbCreator {
    len: usize,
}

impl LimbCreator {
    pub const fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Creator<Box<[u32]>, [u32]> for LimbCreator {
    fn create(&self, source: &[u32]) -> Box<[u32]> {
        debug_assert_eq!(source.len(), self.len);
        Box::from(source)
    }

    fn refill(&self, target: &mut Box<[u32]>, source: &[u32]) {
        target.copy_from_slice(source);
    }
}

/// Counters describing how well a pool absorbs allocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// `get` calls served from a recycled object.
    pub hits: u64,
    /// `get` calls that had to allocate.
    pub misses: u64,
    /// `put` calls that kept the object.
    pub returned: u64,
    /// `put` calls that dropped the object because the pool was full.
    pub discarded: u64,
}

impl PoolStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            returned: self.returned + other.returned,
            discarded: self.discarded + other.discarded,
        }
    }
}

/// A bounded pool of reusable objects.
#[derive(Debug)]
pub struct RecycleBin<T, C> {
    name: &'static str,
    slots: Vec<T>,
    capacity: usize,
    creator: C,
    stats: PoolStats,
}

impl<T, C> RecycleBin<T, C> {
    pub fn new(name: &'static str, capacity: usize, creator: C) -> Self {
        Self {
            name,
            slots: Vec::with_capacity(capacity),
            capacity,
            creator,
            stats: PoolStats::default(),
        }
    }

    /// Check an object back in. Dropped if the pool is already full.
    pub fn put(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
            self.stats.returned += 1;
        } else {
            self.stats.discarded += 1;
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of objects currently waiting for reuse.
    #[inline]
    pub fn available(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T, C> RecycleBin<T, C> {
    /// Check out an object whose contents equal `source`, reusing a pooled
    /// one when available.
    pub fn get<S>(&mut self, source: &S) -> T
    where
        S: ?Sized,
        C: Creator<T, S>,
    {
        match self.slots.pop() {
            Some(mut recycled) => {
                self.creator.refill(&mut recycled, source);
                self.stats.hits += 1;
                recycled
            }
            None => {
                self.stats.misses += 1;
                trace!(pool = self.name, misses = self.stats.misses, "pool miss");
                self.creator.create(source)
            }
        }
    }
}
