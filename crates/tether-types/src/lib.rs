//! Foundation types for Tether.
//!
//! Tether exposes a native version-control library (the VCL, libgit2 in
//! production) to a host runtime that only understands opaque user pointers
//! with finalizers. This crate holds the vocabulary shared by every other
//! Tether crate.
//!
//! # Key Types
//!
//! - [`HandleKind`] — Closed set of wrapper kinds, and the ownership edge each one carries
//! - [`ObjectType`] — The VCL's dynamic classification of an object pointer
//! - [`RawPtr`] — A VCL-owned address, used as the handle table key
//! - [`ErrorClass`] / [`VclError`] — The VCL's last-error record

pub mod error;
pub mod error_class;
pub mod kind;
pub mod object;
pub mod ptr;

pub use error::TypeError;
pub use error_class::{ErrorClass, VclError};
pub use kind::{HandleKind, OwnerEdge};
pub use object::ObjectType;
pub use ptr::RawPtr;
