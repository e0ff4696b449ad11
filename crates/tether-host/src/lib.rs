//! The host-runtime seam.
//!
//! The host runtime that loads Tether only knows how to hold opaque user
//! pointers, run a finalizer on each one when it becomes unreachable, and
//! raise signals. [`Host`] captures exactly that contract.
//!
//! # Modules
//!
//! - [`traits`] — The [`Host`] trait and the [`Finalizer`] ABI
//! - [`memory`] — [`InMemoryHost`], a simulated host for tests

pub mod memory;
pub mod traits;

pub use memory::{HostValue, InMemoryHost, Signal};
pub use traits::{same_finalizer, Finalizer, Host};
