//! The version-control library (VCL) seam.
//!
//! Tether never links against a VCL directly from its handle-lifetime core.
//! Every call it needs is expressed by the [`Vcl`] trait: the dynamic type of
//! an object, the repository that owns an object or a reference, the three
//! type-specific free functions, and the last-error record.
//!
//! # Backends
//!
//! - [`InMemoryVcl`] — simulated VCL for tests and embedding. Records every
//!   free and every contract violation (double free, use after free, a
//!   repository freed before its children).
//! - `LibGit2` — the production backend over `libgit2-sys`, behind the
//!   `libgit2` cargo feature.

pub mod memory;
pub mod traits;

#[cfg(feature = "libgit2")]
pub mod libgit2;

pub use memory::{FreeClass, FreeEvent, InMemoryVcl, Violation};
pub use traits::Vcl;

#[cfg(feature = "libgit2")]
pub use libgit2::LibGit2;
