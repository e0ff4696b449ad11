//! Error types for the handle-lifetime core.
//!
//! Every variant except [`CoreError::NullPointer`] means one of the table
//! invariants was broken. The store refuses to continue the operation rather
//! than risk a double free.

use tether_types::{HandleKind, RawPtr};

/// Errors from wrap and release operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    /// A null pointer was offered for wrapping.
    #[error("cannot wrap a null {kind} pointer")]
    NullPointer { kind: HandleKind },

    /// The VCL reported no owner for a child that must have one.
    #[error("{kind} {child} has no owning repository")]
    NullOwner { kind: HandleKind, child: RawPtr },

    /// Inserting a wrapper for a pointer that already has one.
    #[error("pointer {0} already has a wrapper")]
    DuplicateEntry(RawPtr),

    /// Releasing or removing a pointer that has no wrapper.
    #[error("pointer {0} has no wrapper")]
    MissingEntry(RawPtr),

    /// A child's owner has no wrapper while the child still pins it.
    #[error("owner {owner} of {child} has no wrapper")]
    MissingOwner { child: RawPtr, owner: RawPtr },

    /// A finalizer payload does not match the wrapper stored for its pointer.
    #[error("payload for {0} is not the wrapper in the table")]
    ForeignPayload(RawPtr),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
