//! Reusable object pools for the hot logging path
//!
//! Every log call borrows its scratch storage (encoder buffers, string
//! payloads, nested field lists, the per-entry facility list) from one of the
//! process-wide pools below and hands it back when the owning value is
//! dropped. Pools are bounded: at most `max_idle` items are kept, and items
//! that grew beyond `max_footprint` are released to the allocator instead.

use super::facility::Facility;
use super::field::Field;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Storage that can be cleared and handed out again
pub trait Recycle: Default {
    /// Clear contents while keeping the allocation
    fn recycle(&mut self);

    /// Retained allocation, in elements
    fn footprint(&self) -> usize;
}

impl Recycle for String {
    fn recycle(&mut self) {
        self.clear();
    }

    fn footprint(&self) -> usize {
        self.capacity()
    }
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }

    fn footprint(&self) -> usize {
        self.capacity()
    }
}

/// Counters describing how a pool is being used
#[derive(Debug)]
pub struct PoolStats {
    gets: AtomicU64,
    reuses: AtomicU64,
    returns: AtomicU64,
    discards: AtomicU64,
}

impl PoolStats {
    const fn new() -> Self {
        Self {
            gets: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            discards: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PoolStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Items handed out
    pub gets: u64,
    /// Items handed out that came from the free list
    pub reuses: u64,
    /// Items accepted back into the free list
    pub returns: u64,
    /// Items refused on return (pool full or item too large)
    pub discards: u64,
}

/// Bounded free list of reusable values
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::pool::Pool;
///
/// let pool: Pool<String> = Pool::new(8, 1024);
/// let mut s = pool.get();
/// s.push_str("hello");
/// pool.put(s);
///
/// let again = pool.get();
/// assert!(again.is_empty());
/// assert_eq!(pool.stats().reuses, 1);
/// ```
pub struct Pool<T> {
    items: Mutex<Vec<T>>,
    max_idle: usize,
    max_footprint: usize,
    stats: PoolStats,
}

impl<T: Recycle> Pool<T> {
    pub const fn new(max_idle: usize, max_footprint: usize) -> Self {
        Self {
            items: parking_lot::const_mutex(Vec::new()),
            max_idle,
            max_footprint,
            stats: PoolStats::new(),
        }
    }

    /// Take an empty item, reusing a returned one when available
    pub fn get(&self) -> T {
        self.stats.gets.fetch_add(1, Ordering::Relaxed);
        match self.items.lock().pop() {
            Some(item) => {
                self.stats.reuses.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => T::default(),
        }
    }

    /// Hand an item back; empty allocations are ignored
    pub fn put(&self, mut item: T) {
        let footprint = item.footprint();
        if footprint == 0 {
            return;
        }
        if footprint > self.max_footprint {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
            return;
        }

        item.recycle();
        let mut items = self.items.lock();
        if items.len() < self.max_idle {
            items.push(item);
            self.stats.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.discards.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn idle(&self) -> usize {
        self.items.lock().len()
    }

    pub fn stats(&self) -> PoolSnapshot {
        self.stats.snapshot()
    }
}

pub(crate) static BUFFERS: Pool<Vec<u8>> = Pool::new(256, 64 * 1024);
pub(crate) static STRINGS: Pool<String> = Pool::new(1024, 4 * 1024);
pub(crate) static FIELD_LISTS: Pool<Vec<Field>> = Pool::new(256, 64);
pub(crate) static FACILITY_LISTS: Pool<Vec<Arc<dyn Facility>>> = Pool::new(256, 16);

/// Usage of every process-wide pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub buffers: PoolSnapshot,
    pub strings: PoolSnapshot,
    pub field_lists: PoolSnapshot,
    pub facility_lists: PoolSnapshot,
}

pub fn stats() -> PoolReport {
    PoolReport {
        buffers: BUFFERS.stats(),
        strings: STRINGS.stats(),
        field_lists: FIELD_LISTS.stats(),
        facility_lists: FACILITY_LISTS.stats(),
    }
}

/// Pooled byte buffer, returned to the buffer pool on drop
#[derive(Debug, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn get() -> Self {
        Self {
            bytes: BUFFERS.get(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Contents as text; encoders only ever write UTF-8
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

impl Deref for Buffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.bytes
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl Clone for Buffer {
    fn clone(&self) -> Self {
        let mut copy = Buffer::get();
        copy.extend_from_slice(&self.bytes);
        copy
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        BUFFERS.put(std::mem::take(&mut self.bytes));
    }
}
