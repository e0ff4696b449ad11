//! The [`Host`] trait defining what Tether needs from the host runtime.

use std::ffi::c_void;

use tether_types::ErrorClass;

/// A finalizer as the host runtime calls it: with the payload of the user
/// pointer that just became unreachable.
pub type Finalizer = unsafe extern "C" fn(*mut c_void);

/// Returns `true` if both finalizers are the same function.
pub fn same_finalizer(a: Finalizer, b: Finalizer) -> bool {
    a as usize == b as usize
}

/// The host runtime, as seen from a native module.
///
/// Hosts run every call on one thread. A host may run finalizers whenever it
/// allocates, including inside [`Host::make_user_ptr`], so callers must not
/// hold module-level locks across host calls.
pub trait Host {
    /// A host value.
    type Value;

    /// Create a user pointer carrying `payload`. The host calls `finalizer`
    /// with `payload` exactly once, after the value becomes unreachable.
    fn make_user_ptr(&mut self, finalizer: Finalizer, payload: *mut c_void) -> Self::Value;

    /// The payload of a user pointer, or `None` if `value` is not one.
    fn user_ptr(&self, value: &Self::Value) -> Option<*mut c_void>;

    /// The finalizer of a user pointer, or `None` if `value` is not one.
    fn user_finalizer(&self, value: &Self::Value) -> Option<Finalizer>;

    /// The host's nil value.
    fn nil(&mut self) -> Self::Value;

    /// Signal a type error: `value` does not satisfy `predicate`.
    fn signal_wrong_type(&mut self, predicate: &str, value: &Self::Value);

    /// Signal a VCL error under the error symbol `symbol`.
    fn signal_vcl_error(&mut self, symbol: &str, class: ErrorClass, message: &str);
}
