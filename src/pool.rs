//! Object pool for reusable per-request values
//!
//! `Pool::acquire` hands out a `Pooled` guard with exclusive access to one
//! value. Dropping the guard resets the value and returns it to the pool, so
//! nothing from one request is visible to the next.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Values that can be cleared for reuse
pub trait Reset {
    fn reset(&mut self);
}

/// Bounded pool of idle values
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Reset + Default> Pool<T> {
    /// Pool keeping at most `capacity` idle values; extra returned values are dropped
    pub const fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Take an idle value, or create a fresh one
    pub fn acquire(&self) -> Pooled<'_, T> {
        let value = self.lock().pop().unwrap_or_default();
        Pooled {
            pool: self,
            value: Some(value),
        }
    }

    /// Number of idle values
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, mut value: T) {
        value.reset();
        let mut idle = self.lock();
        if idle.len() < self.capacity {
            idle.push(value);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive handle to a pooled value; resets and returns it on drop
pub struct Pooled<'a, T: Reset + Default> {
    pool: &'a Pool<T>,
    value: Option<T>,
}

impl<T: Reset + Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // `value` is only taken in `drop`
        self.value.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reset + Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reset + Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Buffer {
        data: Vec<u8>,
        resets: usize,
    }

    impl Reset for Buffer {
        fn reset(&mut self) {
            self.data.clear();
            self.resets += 1;
        }
    }

    #[test]
    fn test_release_resets_value() {
        let pool = Pool::<Buffer>::new(4);
        {
            let mut buf = pool.acquire();
            buf.data.extend_from_slice(b"secret");
        }
        assert_eq!(pool.idle(), 1);
        let buf = pool.acquire();
        assert!(buf.data.is_empty());
        assert_eq!(buf.resets, 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_capacity_bounds_idle() {
        let pool = Pool::<Buffer>::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_concurrent_acquire_is_exclusive() {
        let pool = Arc::new(Pool::<Buffer>::new(8));
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.acquire();
                        assert!(buf.data.is_empty());
                        buf.data.push(i);
                        assert_eq!(buf.data, [i]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}
