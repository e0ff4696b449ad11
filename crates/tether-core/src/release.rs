//! The release protocol: what happens when the host drops a handle.
//!
//! Releasing drops one reference. When the last one goes, the wrapper leaves
//! the table, the VCL resource is freed, and only then is the reference the
//! child held on its repository dropped in turn. The ownership graph is two
//! levels deep, so the cascade recurses at most once.

use std::ffi::c_void;

use tracing::{debug, error};

use tether_types::{HandleKind, OwnerEdge, RawPtr};
use tether_vcl::Vcl;

use crate::error::{CoreError, CoreResult};
use crate::store::HandleStore;
use crate::wrapper::Wrapper;

/// What a release did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Released {
    /// Wrappers this release removed from the table, in the order their VCL
    /// resources were freed. Unknown wrappers are removed without a VCL call.
    pub removed: Vec<(HandleKind, RawPtr)>,
}

impl Released {
    /// Returns `true` if the release only dropped a reference.
    pub fn is_retained(&self) -> bool {
        self.removed.is_empty()
    }
}

impl<V: Vcl> HandleStore<V> {
    /// Release the reference held by a host handle whose finalizer received
    /// `payload`.
    ///
    /// # Safety
    ///
    /// `payload` must be the payload of a handle produced by this store, and
    /// each handle may be released only once.
    pub unsafe fn release(&mut self, payload: *mut c_void) -> CoreResult<Released> {
        let wrapper = payload.cast::<Wrapper>();
        let ptr = (*wrapper).ptr();
        match self.table.entry(ptr) {
            Some(stored) if stored.as_ptr() == wrapper => self.release_ptr(ptr),
            Some(_) => Err(CoreError::ForeignPayload(ptr)),
            None => Err(CoreError::MissingEntry(ptr)),
        }
    }

    /// Release one reference on the wrapper for `ptr`.
    ///
    /// This is release-by-pointer: the same path the cascade takes from a
    /// freed child to its repository.
    pub fn release_ptr(&mut self, ptr: RawPtr) -> CoreResult<Released> {
        let mut released = Released::default();
        self.release_into(ptr, &mut released)?;
        Ok(released)
    }

    fn release_into(&mut self, ptr: RawPtr, released: &mut Released) -> CoreResult<()> {
        let entry = self
            .table
            .entry(ptr)
            .ok_or(CoreError::MissingEntry(ptr))?;
        // SAFETY: the entry is owned by the table and we hold it exclusively
        // through &mut self.
        let remaining = unsafe { (*entry.as_ptr()).decref() };
        if remaining > 0 {
            debug!(ptr = %ptr, refcount = remaining, "released handle reference");
            return Ok(());
        }

        let wrapper = self.table.remove(ptr)?;
        let kind = wrapper.kind();

        // SAFETY: the wrapper held the last reference, so nothing else can
        // reach `ptr`; its owner is still pinned by the edge dropped below.
        let owner = unsafe { self.free(kind, ptr) };
        released.removed.push((kind, ptr));
        debug!(kind = %kind, ptr = %ptr, "freed VCL resource");

        if let Some(owner) = owner {
            if !self.table.contains(owner) {
                error!(child = %ptr, owner = %owner, "owner wrapper missing during release");
                return Err(CoreError::MissingOwner { child: ptr, owner });
            }
            self.release_into(owner, released)?;
        }
        drop(wrapper);
        Ok(())
    }

    /// Free `ptr` on the VCL side and return the owner whose reference must
    /// now be dropped. The owner is read before the free.
    unsafe fn free(&mut self, kind: HandleKind, ptr: RawPtr) -> Option<RawPtr> {
        match kind {
            HandleKind::Commit
            | HandleKind::Tree
            | HandleKind::Blob
            | HandleKind::Tag
            | HandleKind::Object => {
                let owner = self.owner_of(OwnerEdge::ObjectOwner, ptr);
                self.vcl.object_free(ptr);
                Some(owner)
            }
            HandleKind::Reference => {
                let owner = self.owner_of(OwnerEdge::ReferenceOwner, ptr);
                self.vcl.reference_free(ptr);
                Some(owner)
            }
            HandleKind::Repository => {
                self.vcl.repository_free(ptr);
                None
            }
            HandleKind::Unknown => None,
        }
    }
}
