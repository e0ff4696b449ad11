//! The handle table: one wrapper per live VCL pointer.
//!
//! Wrappers are heap-allocated and owned by the table through raw pointers,
//! because their addresses are also held by the host as handle payloads.
//! All reads and writes of a wrapper go through that single allocation.
//!
//! # Invariants
//!
//! - Keys are unique: a pointer maps to at most one wrapper.
//! - Every stored wrapper has a positive refcount.
//! - A wrapper leaves the table only through [`HandleTable::remove`], which
//!   hands ownership back to the caller.

use std::collections::HashMap;
use std::ptr::NonNull;

use tether_types::RawPtr;

use crate::error::{CoreError, CoreResult};
use crate::wrapper::Wrapper;

/// Associative index from raw VCL pointer to its wrapper.
#[derive(Default)]
pub struct HandleTable {
    entries: HashMap<RawPtr, NonNull<Wrapper>>,
}

// SAFETY: the table is the sole owner of every wrapper allocation it holds,
// and wrappers contain only plain data.
unsafe impl Send for HandleTable {}

impl HandleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live wrappers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no wrapper is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `ptr` has a wrapper.
    pub fn contains(&self, ptr: RawPtr) -> bool {
        self.entries.contains_key(&ptr)
    }

    /// The wrapper for `ptr`, if any.
    pub fn lookup(&self, ptr: RawPtr) -> Option<&Wrapper> {
        // SAFETY: stored pointers come from Box::into_raw and stay valid
        // until removed; shared access to the table excludes mutation.
        self.entries.get(&ptr).map(|w| unsafe { w.as_ref() })
    }

    /// Refcount of the wrapper for `ptr`, if any.
    pub fn refcount(&self, ptr: RawPtr) -> Option<usize> {
        self.lookup(ptr).map(Wrapper::refcount)
    }

    /// The stable address of the wrapper for `ptr`.
    ///
    /// Taking `&mut self` ties mutation through the returned pointer to
    /// exclusive access to the table.
    pub(crate) fn entry(&mut self, ptr: RawPtr) -> Option<NonNull<Wrapper>> {
        self.entries.get(&ptr).copied()
    }

    /// Add `wrapper` under its pointer and return its stable address.
    pub fn insert(&mut self, wrapper: Wrapper) -> CoreResult<NonNull<Wrapper>> {
        let ptr = wrapper.ptr();
        if self.entries.contains_key(&ptr) {
            return Err(CoreError::DuplicateEntry(ptr));
        }
        let raw = NonNull::from(Box::leak(Box::new(wrapper)));
        self.entries.insert(ptr, raw);
        Ok(raw)
    }

    /// Remove the wrapper for `ptr` and hand its allocation back.
    pub fn remove(&mut self, ptr: RawPtr) -> CoreResult<Box<Wrapper>> {
        let raw = self
            .entries
            .remove(&ptr)
            .ok_or(CoreError::MissingEntry(ptr))?;
        // SAFETY: raw came from Box::leak in insert and was just unlinked, so
        // this is the only owner.
        Ok(unsafe { Box::from_raw(raw.as_ptr()) })
    }
}

impl Drop for HandleTable {
    fn drop(&mut self) {
        for (_, raw) in self.entries.drain() {
            // SAFETY: see remove.
            drop(unsafe { Box::from_raw(raw.as_ptr()) });
        }
    }
}

impl std::fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}
