//! Buffers shared through an explicit arena
//!
//! A [`SharedArena`] maps integer handles to backing buffers. Each handle
//! carries a reference count that only changes through [`SharedArena::acquire`]
//! and [`SharedArena::release`]; a buffer is freed when its count reaches
//! zero, never as a side effect of dropping a wrapper.

use super::{subspace, Array};
use crate::element::Element;
use crate::errors::{CfArrayError, Result};
use crate::indexing::Indices;
use crate::masked::MaskedArray;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::debug;

/// Identifier of a buffer registered in an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedHandle(u64);

impl SharedHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SharedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ArenaEntry {
    buffer: Arc<dyn Any + Send + Sync>,
    refs: usize,
}

/// Registry of reference-counted buffers
pub struct SharedArena {
    next: AtomicU64,
    entries: Mutex<HashMap<u64, ArenaEntry>>,
}

impl SharedArena {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide arena
    pub fn global() -> Arc<SharedArena> {
        static ARENA: OnceLock<Arc<SharedArena>> = OnceLock::new();
        Arc::clone(ARENA.get_or_init(|| Arc::new(SharedArena::new())))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, ArenaEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `array` with a reference count of one
    pub fn insert<T: Element>(&self, array: MaskedArray<T>) -> SharedHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            id,
            ArenaEntry {
                buffer: Arc::new(array),
                refs: 1,
            },
        );
        debug!(handle = id, "registered shared buffer");
        SharedHandle(id)
    }

    /// Take another reference to a registered buffer
    ///
    /// # Errors
    ///
    /// Returns `SharedBuffer` if the handle is not registered.
    pub fn acquire(&self, handle: SharedHandle) -> Result<()> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&handle.0).ok_or_else(|| released(handle))?;
        entry.refs += 1;
        Ok(())
    }

    /// Drop one reference; returns `true` if this freed the buffer
    ///
    /// # Errors
    ///
    /// Returns `SharedBuffer` if the handle is not registered.
    pub fn release(&self, handle: SharedHandle) -> Result<bool> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&handle.0).ok_or_else(|| released(handle))?;
        entry.refs -= 1;
        if entry.refs == 0 {
            entries.remove(&handle.0);
            debug!(handle = handle.0, "freed shared buffer");
            return Ok(true);
        }
        Ok(false)
    }

    /// The buffer behind `handle`
    ///
    /// # Errors
    ///
    /// Returns `SharedBuffer` if the handle is not registered or holds a
    /// different element type.
    pub fn lookup<T: Element>(&self, handle: SharedHandle) -> Result<Arc<MaskedArray<T>>> {
        let buffer = self
            .lock()
            .get(&handle.0)
            .map(|entry| Arc::clone(&entry.buffer))
            .ok_or_else(|| released(handle))?;
        buffer
            .downcast::<MaskedArray<T>>()
            .map_err(|_| CfArrayError::SharedBuffer {
                handle: handle.0,
                message: format!("buffer does not hold {} elements", T::DATA_TYPE),
            })
    }

    /// Current reference count, or `None` once freed
    pub fn ref_count(&self, handle: SharedHandle) -> Option<usize> {
        self.lock().get(&handle.0).map(|entry| entry.refs)
    }

    /// Number of live buffers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SharedArena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedArena")
            .field("buffers", &self.len())
            .finish()
    }
}

fn released(handle: SharedHandle) -> CfArrayError {
    CfArrayError::SharedBuffer {
        handle: handle.0,
        message: "handle is not registered (already released?)".to_string(),
    }
}

/// An array whose values live in a [`SharedArena`]
///
/// Copies made with [`Array::copy`] share the handle without counting;
/// [`SharedArray::acquire`] creates a counted reference that must be
/// [`release`](SharedArray::release)d.
#[derive(Debug, Clone)]
pub struct SharedArray<T> {
    arena: Arc<SharedArena>,
    handle: SharedHandle,
    shape: Vec<usize>,
    _element: PhantomData<T>,
}

impl<T: Element> SharedArray<T> {
    /// Register `array` in `arena` and wrap the new handle
    pub fn create(arena: &Arc<SharedArena>, array: MaskedArray<T>) -> Self {
        let shape = array.shape().to_vec();
        let handle = arena.insert(array);
        Self {
            arena: Arc::clone(arena),
            handle,
            shape,
            _element: PhantomData,
        }
    }

    pub fn handle(&self) -> SharedHandle {
        self.handle
    }

    pub fn arena(&self) -> &Arc<SharedArena> {
        &self.arena
    }

    /// A counted reference to the same buffer
    ///
    /// # Errors
    ///
    /// Returns `SharedBuffer` if the buffer was already freed.
    pub fn acquire(&self) -> Result<Self> {
        self.arena.acquire(self.handle)?;
        Ok(self.clone())
    }

    /// Give up this reference; returns `true` if the buffer was freed
    ///
    /// # Errors
    ///
    /// Returns `SharedBuffer` if the buffer was already freed.
    pub fn release(self) -> Result<bool> {
        self.arena.release(self.handle)
    }
}

impl<T: Element> Array for SharedArray<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        let buffer = self.arena.lookup::<T>(self.handle)?;
        subspace(&buffer, indices)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_in_memory(&self) -> bool {
        true
    }
}
