//! Reader/writer discipline around the backend scene.
//!
//! Every scene access goes through a [`SceneLock`]: writes (stepping,
//! adding and removing bodies, teleports) take the exclusive guard, reads
//! (poses, queries, queue polling) take the shared one. Guards release on
//! every exit path, including unwinding.
//!
//! A panic while a guard is held poisons the underlying `RwLock`. The scene
//! itself is still consistent at that point (every mutation is a single
//! backend call), so the lock recovers the guard and logs a warning rather
//! than turning every later access into an error.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// A read/write lock around scene state.
pub struct SceneLock<T> {
    inner: RwLock<T>,
}

/// Shared access to the scene. Many may exist at once.
pub struct SceneReadGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
}

/// Exclusive access to the scene.
pub struct SceneWriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
}

fn recovered<G>(poisoned: PoisonError<G>) -> G {
    log::warn!("scene lock poisoned by an earlier panic; recovering");
    poisoned.into_inner()
}

impl<T> SceneLock<T> {
    /// Wrap `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Block until shared access is available.
    pub fn read(&self) -> SceneReadGuard<'_, T> {
        SceneReadGuard {
            guard: self.inner.read().unwrap_or_else(recovered),
        }
    }

    /// Block until exclusive access is available.
    pub fn write(&self) -> SceneWriteGuard<'_, T> {
        SceneWriteGuard {
            guard: self.inner.write().unwrap_or_else(recovered),
        }
    }

    /// Shared access if no writer holds the lock.
    pub fn try_read(&self) -> Option<SceneReadGuard<'_, T>> {
        match self.inner.try_read() {
            Ok(guard) => Some(SceneReadGuard { guard }),
            Err(TryLockError::Poisoned(p)) => Some(SceneReadGuard {
                guard: recovered(p),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Exclusive access if nobody holds the lock.
    pub fn try_write(&self) -> Option<SceneWriteGuard<'_, T>> {
        match self.inner.try_write() {
            Ok(guard) => Some(SceneWriteGuard { guard }),
            Err(TryLockError::Poisoned(p)) => Some(SceneWriteGuard {
                guard: recovered(p),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Direct access through `&mut self`; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unwrap the lock.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Deref for SceneReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Deref for SceneWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for SceneWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> fmt::Debug for SceneLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneLock").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn readers_share_writers_exclude() {
        let lock = SceneLock::new(5u32);
        let r1 = lock.read();
        let r2 = lock.read();
        assert_eq!(*r1 + *r2, 10);
        assert!(lock.try_write().is_none());
        drop((r1, r2));

        let mut w = lock.write();
        *w += 1;
        assert!(lock.try_read().is_none());
        drop(w);
        assert_eq!(*lock.read(), 6);
    }

    #[test]
    fn guard_releases_on_unwind() {
        let lock = Arc::new(SceneLock::new(Vec::<u32>::new()));
        let l2 = Arc::clone(&lock);
        let result = std::thread::spawn(move || {
            let mut w = l2.write();
            w.push(1);
            panic!("writer failed");
        })
        .join();
        assert!(result.is_err());
        // Poisoned but recovered; the completed push is visible.
        assert_eq!(*lock.read(), vec![1]);
        lock.write().push(2);
        assert_eq!(lock.try_read().map(|g| g.len()), Some(2));
    }
}
