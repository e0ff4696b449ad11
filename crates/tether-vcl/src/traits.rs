//! The [`Vcl`] trait defining the calls Tether makes into the VCL.

use tether_types::{ObjectType, RawPtr, VclError};

/// The subset of the version-control library Tether depends on.
///
/// # Safety
///
/// Every pointer-taking method is `unsafe`: the caller guarantees that the
/// pointer was produced by this VCL, has not been freed yet, and is of the
/// class the method expects (an object, a reference, or a repository).
pub trait Vcl {
    /// The dynamic type of an object.
    unsafe fn object_type(&self, object: RawPtr) -> ObjectType;

    /// The repository that owns an object.
    unsafe fn object_owner(&self, object: RawPtr) -> RawPtr;

    /// The repository that owns a reference.
    unsafe fn reference_owner(&self, reference: RawPtr) -> RawPtr;

    /// Free an object. Its owning repository must still be live.
    unsafe fn object_free(&mut self, object: RawPtr);

    /// Free a reference. Its owning repository must still be live.
    unsafe fn reference_free(&mut self, reference: RawPtr);

    /// Free a repository. Every object and reference it owns must already
    /// have been freed.
    unsafe fn repository_free(&mut self, repository: RawPtr);

    /// The error recorded by the most recent failing VCL call, if any.
    fn last_error(&self) -> Option<VclError>;
}

impl<T: Vcl + ?Sized> Vcl for Box<T> {
    unsafe fn object_type(&self, object: RawPtr) -> ObjectType {
        (**self).object_type(object)
    }

    unsafe fn object_owner(&self, object: RawPtr) -> RawPtr {
        (**self).object_owner(object)
    }

    unsafe fn reference_owner(&self, reference: RawPtr) -> RawPtr {
        (**self).reference_owner(reference)
    }

    unsafe fn object_free(&mut self, object: RawPtr) {
        (**self).object_free(object)
    }

    unsafe fn reference_free(&mut self, reference: RawPtr) {
        (**self).reference_free(reference)
    }

    unsafe fn repository_free(&mut self, repository: RawPtr) {
        (**self).repository_free(repository)
    }

    fn last_error(&self) -> Option<VclError> {
        (**self).last_error()
    }
}
