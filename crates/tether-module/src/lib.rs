//! The module layer of Tether: what a host loads.
//!
//! A host module has one handle store for the life of the process. This
//! crate owns it and exposes:
//!
//! - [`init`] / [`teardown`] for module load and unload, with optional log
//!   setup from [`ModuleConfig`];
//! - [`finalize_handle`], the finalizer every handle carries;
//! - the handle operations bindings call ([`wrap`], [`kind_of`],
//!   [`assert_kind`], [`assert_is_object`], [`dispatch_error`]);
//! - [`Defun`] and [`FunctionRegistry`] for exporting functions with
//!   optional arguments.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handles;
pub mod lifecycle;

pub use tether_core::predicates;

pub use config::ModuleConfig;
pub use dispatch::{Callable, Defun, FunctionRegistry};
pub use error::{ModuleError, ModuleResult};
pub use handles::{assert_is_object, assert_kind, dispatch_error, kind_of, raw_ptr_of, wrap};
pub use lifecycle::{
    finalize_handle, init, is_initialized, live_handles, teardown, DynVcl, TeardownReport,
};
