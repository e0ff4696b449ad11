use tether_types::{HandleKind, RawPtr};

/// The record behind every host handle.
///
/// A wrapper is allocated once per wrapped pointer and lives in the
/// [`HandleTable`](crate::HandleTable) until its refcount reaches zero. Its
/// address is the payload of every host handle that refers to it, so it
/// never moves.
#[derive(Debug, PartialEq, Eq)]
pub struct Wrapper {
    kind: HandleKind,
    ptr: RawPtr,
    refcount: usize,
}

impl Wrapper {
    /// A fresh wrapper holding one reference.
    pub(crate) fn new(kind: HandleKind, ptr: RawPtr) -> Self {
        Self {
            kind,
            ptr,
            refcount: 1,
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn ptr(&self) -> RawPtr {
        self.ptr
    }

    /// Host handles plus child wrappers currently pinning this wrapper.
    pub fn refcount(&self) -> usize {
        self.refcount
    }

    pub(crate) fn incref(&mut self) -> usize {
        self.refcount += 1;
        self.refcount
    }

    pub(crate) fn decref(&mut self) -> usize {
        debug_assert!(self.refcount > 0, "decref of dead wrapper {}", self.ptr);
        self.refcount = self.refcount.saturating_sub(1);
        self.refcount
    }
}
