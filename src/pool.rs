//! Scratch buffer pools.
//!
//! Sorted-map encoding, map hashing and the writer façade need a temporary
//! buffer per call. Buffers are taken from a small process-wide free list and
//! handed back automatically when the [`Pooled`] guard drops.
//!
//! - Buffers are cleared before they are reused.
//! - At most [`MAX_POOLED`] buffers are kept per pool.
//! - Buffers that grew past [`MAX_RETAINED_CAPACITY`] elements are freed
//!   instead of being kept.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

pub(crate) const MAX_POOLED: usize = 16;
pub(crate) const MAX_RETAINED_CAPACITY: usize = 1 << 16;

/// A free list of vectors.
pub(crate) struct Pool<T> {
    free: Mutex<Vec<Vec<T>>>,
}

impl<T> Pool<T> {
    pub(crate) const fn new() -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Takes an empty vector from the pool, allocating when the pool is dry.
    pub(crate) fn get(&'static self) -> Pooled<T> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Pooled { buf, pool: self }
    }

    fn put(&self, mut buf: Vec<T>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < MAX_POOLED {
            free.push(buf);
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A vector borrowed from a [`Pool`]; returned on drop.
pub(crate) struct Pooled<T: 'static> {
    buf: Vec<T>,
    pool: &'static Pool<T>,
}

impl<T> Deref for Pooled<T> {
    type Target = Vec<T>;

    #[inline]
    fn deref(&self) -> &Vec<T> {
        &self.buf
    }
}

impl<T> DerefMut for Pooled<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buf
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}

static BYTES: Pool<u8> = Pool::new();
static DIGESTS: Pool<u64> = Pool::new();

/// Scratch byte buffer.
#[inline]
pub(crate) fn bytes() -> Pooled<u8> {
    BYTES.get()
}

/// Scratch list of 64-bit digests.
#[inline]
pub(crate) fn digests() -> Pooled<u64> {
    DIGESTS.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_cleared_and_reused() {
        static POOL: Pool<u8> = Pool::new();
        {
            let mut buf = POOL.get();
            buf.extend_from_slice(b"scratch");
        }
        assert_eq!(POOL.idle(), 1);
        let buf = POOL.get();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 7);
        assert_eq!(POOL.idle(), 0);
    }

    #[test]
    fn test_oversized_buffer_is_dropped() {
        static POOL: Pool<u8> = Pool::new();
        {
            let mut buf = POOL.get();
            buf.reserve(MAX_RETAINED_CAPACITY + 1);
        }
        assert_eq!(POOL.idle(), 0);
    }

    #[test]
    fn test_pool_is_bounded() {
        static POOL: Pool<u64> = Pool::new();
        let held: Vec<_> = (0..MAX_POOLED + 4).map(|_| POOL.get()).collect();
        drop(held);
        assert_eq!(POOL.idle(), MAX_POOLED);
    }
}
