//! Handle-lifetime core for Tether.
//!
//! Every VCL object the host can see is represented by exactly one
//! [`Wrapper`], kept in a [`HandleTable`] keyed by the object's raw pointer.
//! A wrapper's refcount counts the host handles pointing at it plus the child
//! wrappers that list it as their owner, so a repository outlives every
//! reference and object wrapped from it.
//!
//! # Design Rules
//!
//! 1. At most one wrapper per live pointer. Wrapping a pointer twice returns
//!    the same wrapper.
//! 2. A child wrapper pins its repository wrapper with one refcount.
//! 3. A wrapper is in the table iff its refcount is positive.
//! 4. A child is freed on the VCL side before its owner's refcount drops on
//!    its behalf.
//! 5. The wrap path never frees anything.
//!
//! [`HandleStore`] owns the table and the VCL backend and implements the wrap
//! and release protocols. The type-discrimination helpers in
//! [`discriminate`] only need the finalizer identity, so they work without
//! access to the store.

pub mod discriminate;
pub mod error;
pub mod predicates;
pub mod release;
pub mod store;
pub mod table;
pub mod wrap;
pub mod wrapper;

pub use discriminate::{
    assert_is_object, assert_kind, dispatch_error, kind_of, raw_ptr_of, signal_error,
};
pub use error::{CoreError, CoreResult};
pub use release::Released;
pub use store::HandleStore;
pub use table::HandleTable;
pub use wrapper::Wrapper;
