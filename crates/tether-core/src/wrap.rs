//! The wrap protocol: from a raw VCL pointer to a host handle.
//!
//! Wrapping refines a generic object kind through the VCL and takes one
//! reference on the pointer's wrapper for the new host handle. When the
//! wrapper is created, a child also takes one reference on its repository's
//! wrapper for the child-to-owner edge; the release that removes the child
//! drops it again. Nothing is ever freed on this path.

use std::ffi::c_void;
use std::ptr::NonNull;

use tracing::debug;

use tether_host::Host;
use tether_types::{HandleKind, OwnerEdge, RawPtr};
use tether_vcl::Vcl;

use crate::error::{CoreError, CoreResult};
use crate::store::HandleStore;
use crate::wrapper::Wrapper;

impl<V: Vcl> HandleStore<V> {
    /// Wrap `ptr` and hand the host a new handle for it.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live VCL pointer of the class `kind_hint` names (any
    /// object for [`HandleKind::Object`]), whose ownership the caller
    /// transfers to the store.
    pub unsafe fn wrap<H: Host>(
        &mut self,
        host: &mut H,
        kind_hint: HandleKind,
        ptr: RawPtr,
    ) -> CoreResult<H::Value> {
        let wrapper = self.retain(kind_hint, ptr)?;
        Ok(host.make_user_ptr(self.finalizer, wrapper.as_ptr().cast::<c_void>()))
    }

    /// Take the references a new handle for `ptr` needs and return the
    /// payload that handle must carry.
    ///
    /// This is [`HandleStore::wrap`] without the host call, for callers that
    /// must not hold a lock on the store while the host allocates.
    ///
    /// # Safety
    ///
    /// Same contract as [`HandleStore::wrap`].
    pub unsafe fn retain(
        &mut self,
        kind_hint: HandleKind,
        ptr: RawPtr,
    ) -> CoreResult<NonNull<Wrapper>> {
        if ptr.is_null() {
            return Err(CoreError::NullPointer { kind: kind_hint });
        }
        let kind = self.refine(kind_hint, ptr);

        // A pointer already in the table keeps its stored kind, and its owner
        // edge was taken when its wrapper was created.
        if let Some(existing) = self.table.entry(ptr) {
            // SAFETY: the entry is owned by the table and we hold it
            // exclusively through &mut self.
            let wrapper = unsafe { &mut *existing.as_ptr() };
            wrapper.incref();
            debug!(
                kind = %wrapper.kind(),
                ptr = %ptr,
                refcount = wrapper.refcount(),
                "rewrapped handle"
            );
            return Ok(existing);
        }

        let owner = match kind.owner_edge() {
            Some(edge) => {
                let owner = self.owner_of(edge, ptr);
                if owner.is_null() {
                    return Err(CoreError::NullOwner { kind, child: ptr });
                }
                Some(owner)
            }
            None => None,
        };

        let wrapper = self.table.insert(Wrapper::new(kind, ptr))?;
        if let Some(owner) = owner {
            self.incref_owner(owner)?;
        }

        debug!(kind = %kind, ptr = %ptr, owner = ?owner, "wrapped handle");
        Ok(wrapper)
    }

    /// Resolve a generic object to its concrete kind, if the VCL knows it.
    unsafe fn refine(&self, kind_hint: HandleKind, ptr: RawPtr) -> HandleKind {
        if kind_hint != HandleKind::Object {
            return kind_hint;
        }
        self.vcl
            .object_type(ptr)
            .handle_kind()
            .unwrap_or(HandleKind::Object)
    }

    pub(crate) unsafe fn owner_of(&self, edge: OwnerEdge, ptr: RawPtr) -> RawPtr {
        match edge {
            OwnerEdge::ObjectOwner => self.vcl.object_owner(ptr),
            OwnerEdge::ReferenceOwner => self.vcl.reference_owner(ptr),
        }
    }

    /// Take one reference on the repository wrapper `owner` for a new child,
    /// creating it if the repository has not been wrapped yet.
    fn incref_owner(&mut self, owner: RawPtr) -> CoreResult<()> {
        match self.table.entry(owner) {
            Some(existing) => {
                // SAFETY: see retain.
                unsafe { (*existing.as_ptr()).incref() };
            }
            None => {
                self.table.insert(Wrapper::new(HandleKind::Repository, owner))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tether_host::Host;
    use tether_types::{HandleKind, ObjectType, RawPtr};

    use crate::error::CoreError;
    use crate::testutil::fixture;

    #[test]
    fn first_wrap_creates_wrapper_with_one_reference() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let handle = unsafe { store.wrap(&mut host, HandleKind::Repository, repo) }.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.refcount(repo), Some(1));
        assert_eq!(store.kind_of(&host, &handle), HandleKind::Repository);
        assert_eq!(store.raw_ptr_of(&host, &handle), Some(repo));
    }

    #[test]
    fn double_wrap_shares_one_wrapper() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let h1 = unsafe { store.wrap(&mut host, HandleKind::Repository, repo) }.unwrap();
        let h2 = unsafe { store.wrap(&mut host, HandleKind::Repository, repo) }.unwrap();

        assert_ne!(h1, h2);
        assert_eq!(host.user_ptr(&h1), host.user_ptr(&h2));
        assert_eq!(store.len(), 1);
        assert_eq!(store.refcount(repo), Some(2));
    }

    #[test]
    fn child_wrap_pins_owner() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let head = store.vcl_mut().lookup_reference(repo);
        unsafe {
            store.wrap(&mut host, HandleKind::Repository, repo).unwrap();
            store.wrap(&mut host, HandleKind::Reference, head).unwrap();
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.refcount(repo), Some(2));
        assert_eq!(store.refcount(head), Some(1));
    }

    #[test]
    fn child_wrap_creates_unseen_owner() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let blob = store.vcl_mut().lookup_object(repo, ObjectType::Blob);
        unsafe { store.wrap(&mut host, HandleKind::Blob, blob) }.unwrap();

        let owner = store.table().lookup(repo).unwrap();
        assert_eq!(owner.kind(), HandleKind::Repository);
        assert_eq!(owner.refcount(), 1);
    }

    #[test]
    fn generic_object_is_refined() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        for (ty, kind) in [
            (ObjectType::Commit, HandleKind::Commit),
            (ObjectType::Tree, HandleKind::Tree),
            (ObjectType::Blob, HandleKind::Blob),
            (ObjectType::Tag, HandleKind::Tag),
        ] {
            let obj = store.vcl_mut().lookup_object(repo, ty);
            let handle = unsafe { store.wrap(&mut host, HandleKind::Object, obj) }.unwrap();
            assert_eq!(store.kind_of(&host, &handle), kind);
        }
        assert_eq!(store.refcount(repo), Some(4));
    }

    #[test]
    fn unclassified_object_stays_generic() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let delta = store.vcl_mut().lookup_object(repo, ObjectType::OffsetDelta);
        let handle = unsafe { store.wrap(&mut host, HandleKind::Object, delta) }.unwrap();
        assert_eq!(store.kind_of(&host, &handle), HandleKind::Object);
        assert_eq!(store.refcount(repo), Some(1));
    }

    #[test]
    fn stored_kind_is_not_upgraded() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let commit = store.vcl_mut().lookup_object(repo, ObjectType::Commit);
        let h1 = unsafe { store.wrap(&mut host, HandleKind::Commit, commit) }.unwrap();
        let h2 = unsafe { store.wrap(&mut host, HandleKind::Tree, commit) }.unwrap();
        assert_eq!(store.kind_of(&host, &h1), HandleKind::Commit);
        assert_eq!(store.kind_of(&host, &h2), HandleKind::Commit);
        assert_eq!(store.refcount(commit), Some(2));
    }

    #[test]
    fn rewrapped_child_pins_owner_once() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let head = store.vcl_mut().lookup_reference(repo);
        unsafe {
            store.wrap(&mut host, HandleKind::Reference, head).unwrap();
            store.wrap(&mut host, HandleKind::Reference, head).unwrap();
            store.wrap(&mut host, HandleKind::Reference, head).unwrap();
        }
        assert_eq!(store.refcount(head), Some(3));
        assert_eq!(store.refcount(repo), Some(1));
    }

    #[test]
    fn unknown_kind_is_stored_without_owner() {
        let (mut store, mut host) = fixture();
        let stray = RawPtr::from_addr(0xdead_0000);
        let handle = unsafe { store.wrap(&mut host, HandleKind::Unknown, stray) }.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.table().lookup(stray).unwrap().kind(), HandleKind::Unknown);
        assert!(host.user_ptr(&handle).is_some());
    }

    #[test]
    fn null_pointer_is_rejected() {
        let (mut store, mut host) = fixture();
        let err = unsafe { store.wrap(&mut host, HandleKind::Repository, RawPtr::null()) }
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::NullPointer {
                kind: HandleKind::Repository
            }
        );
        assert!(store.is_empty());
        assert_eq!(host.live_user_ptrs(), 0);
    }

    #[test]
    fn wrap_never_frees() {
        let (mut store, mut host) = fixture();
        let repo = store.vcl_mut().open_repository();
        let tag = store.vcl_mut().lookup_object(repo, ObjectType::Tag);
        unsafe {
            store.wrap(&mut host, HandleKind::Repository, repo).unwrap();
            store.wrap(&mut host, HandleKind::Object, tag).unwrap();
            store.wrap(&mut host, HandleKind::Tag, tag).unwrap();
        }
        assert!(store.vcl().frees().is_empty());
        assert!(store.vcl().violations().is_empty());
    }
}
