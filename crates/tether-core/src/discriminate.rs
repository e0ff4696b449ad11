//! Type discrimination and error signalling for the binding layer.
//!
//! A host value is one of our handles iff it is a user pointer carrying our
//! finalizer. These helpers need only that finalizer, not the store, so the
//! module layer can use them without taking its lock.

use tether_host::{same_finalizer, Finalizer, Host};
use tether_types::{HandleKind, RawPtr, VclError};
use tether_vcl::Vcl;
use tracing::debug;

use crate::wrapper::Wrapper;

fn wrapper_of<'h, H: Host>(
    host: &'h H,
    value: &H::Value,
    finalizer: Finalizer,
) -> Option<&'h Wrapper> {
    let fin = host.user_finalizer(value)?;
    if !same_finalizer(fin, finalizer) {
        return None;
    }
    let payload = host.user_ptr(value)?;
    // SAFETY: a reachable handle carrying our finalizer holds a reference on
    // its wrapper, so the wrapper is still allocated in the table.
    unsafe { payload.cast::<Wrapper>().as_ref() }
}

/// The kind of the handle `value`, or [`HandleKind::Unknown`] if `value` is
/// not one of our handles.
pub fn kind_of<H: Host>(host: &H, value: &H::Value, finalizer: Finalizer) -> HandleKind {
    wrapper_of(host, value, finalizer).map_or(HandleKind::Unknown, Wrapper::kind)
}

/// The VCL pointer behind the handle `value`, for passing back into the VCL.
pub fn raw_ptr_of<H: Host>(host: &H, value: &H::Value, finalizer: Finalizer) -> Option<RawPtr> {
    wrapper_of(host, value, finalizer).map(Wrapper::ptr)
}

/// Check that `value` is a handle of kind `expected`.
///
/// On mismatch a type error naming `predicate` is signalled to the host and
/// `false` is returned. The table is never touched.
pub fn assert_kind<H: Host>(
    host: &mut H,
    value: &H::Value,
    expected: HandleKind,
    predicate: &str,
    finalizer: Finalizer,
) -> bool {
    let actual = kind_of(host, value, finalizer);
    if actual == expected {
        return true;
    }
    debug!(%expected, %actual, predicate, "handle kind mismatch");
    host.signal_wrong_type(predicate, value);
    false
}

/// Check that `value` is a handle of any object kind.
pub fn assert_is_object<H: Host>(
    host: &mut H,
    value: &H::Value,
    predicate: &str,
    finalizer: Finalizer,
) -> bool {
    let actual = kind_of(host, value, finalizer);
    if actual.is_object() {
        return true;
    }
    debug!(%actual, predicate, "handle is not an object");
    host.signal_wrong_type(predicate, value);
    false
}

/// Turn a failing VCL return code into a host signal.
///
/// For `rc < 0` with a last-error record available, the host is signalled
/// with the record's class and message and `true` is returned. Otherwise
/// nothing happens.
pub fn dispatch_error<H: Host, V: Vcl + ?Sized>(host: &mut H, vcl: &V, rc: i32) -> bool {
    if rc >= 0 {
        return false;
    }
    let Some(err) = vcl.last_error() else {
        return false;
    };
    debug!(rc, "VCL call failed");
    signal_error(host, &err);
    true
}

/// Signal a VCL error record to the host under its class symbol.
pub fn signal_error<H: Host>(host: &mut H, err: &VclError) {
    debug!(class = %err.class, message = %err.message, "signalling VCL error");
    host.signal_vcl_error(&err.class.signal_symbol(), err.class, &err.message);
}
