//! Handle operations over the process-wide store.
//!
//! These are what bindings call. None of them holds the store lock across a
//! host call, since the host may run finalizers whenever it allocates.

use tracing::error;

use tether_core::signal_error;
use tether_host::Host;
use tether_types::{HandleKind, RawPtr};

use crate::error::ModuleResult;
use crate::lifecycle::{finalize_handle, with_state};

/// Wrap `ptr` and return a new host handle for it.
///
/// # Safety
///
/// `ptr` must be a live VCL pointer of the class `kind` names (any object
/// for [`HandleKind::Object`]), whose ownership passes to the module.
pub unsafe fn wrap<H: Host>(host: &mut H, kind: HandleKind, ptr: RawPtr) -> ModuleResult<H::Value> {
    let payload = with_state(|state| unsafe { state.store.retain(kind, ptr) })??;
    Ok(host.make_user_ptr(finalize_handle, payload.as_ptr().cast()))
}

pub fn kind_of<H: Host>(host: &H, value: &H::Value) -> HandleKind {
    tether_core::kind_of(host, value, finalize_handle)
}

pub fn raw_ptr_of<H: Host>(host: &H, value: &H::Value) -> Option<RawPtr> {
    tether_core::raw_ptr_of(host, value, finalize_handle)
}

/// Signal `predicate` as a type error unless `value` is a handle of kind
/// `expected`.
pub fn assert_kind<H: Host>(
    host: &mut H,
    value: &H::Value,
    expected: HandleKind,
    predicate: &str,
) -> bool {
    tether_core::assert_kind(host, value, expected, predicate, finalize_handle)
}

pub fn assert_is_object<H: Host>(host: &mut H, value: &H::Value, predicate: &str) -> bool {
    tether_core::assert_is_object(host, value, predicate, finalize_handle)
}

/// Signal the VCL's last error if `rc` reports a failure.
pub fn dispatch_error<H: Host>(host: &mut H, rc: i32) -> bool {
    if rc >= 0 {
        return false;
    }
    let last = match with_state(|state| state.store.vcl().last_error()) {
        Ok(last) => last,
        Err(err) => {
            error!(%err, rc, "cannot read the VCL error");
            return false;
        }
    };
    match last {
        Some(err) => {
            signal_error(host, &err);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use tether_host::{HostValue, InMemoryHost, Signal};
    use tether_types::{ErrorClass, ObjectType, VclError};

    use super::*;
    use crate::config::ModuleConfig;
    use crate::error::ModuleError;
    use crate::lifecycle::{init, live_handles, teardown};
    use crate::testutil::{serial, SharedVcl};

    #[test]
    fn wrap_requires_init() {
        let _serial = serial();
        let mut host = InMemoryHost::new();
        let err = unsafe { wrap(&mut host, HandleKind::Repository, RawPtr::from_addr(0x10)) }
            .unwrap_err();
        assert_eq!(err, ModuleError::NotInitialized);
        assert_eq!(host.live_user_ptrs(), 0);
    }

    #[test]
    fn handles_carry_the_module_finalizer() {
        let _serial = serial();
        let (vcl, inner) = SharedVcl::new();
        let (repo, commit) = {
            let mut v = inner.lock().unwrap();
            let repo = v.open_repository();
            (repo, v.lookup_object(repo, ObjectType::Commit))
        };
        init(Box::new(vcl), ModuleConfig::default()).unwrap();

        let mut host = InMemoryHost::new();
        let h_repo = unsafe { wrap(&mut host, HandleKind::Repository, repo) }.unwrap();
        let h_commit = unsafe { wrap(&mut host, HandleKind::Object, commit) }.unwrap();
        let again = unsafe { wrap(&mut host, HandleKind::Commit, commit) }.unwrap();

        assert_eq!(kind_of(&host, &h_repo), HandleKind::Repository);
        assert_eq!(kind_of(&host, &h_commit), HandleKind::Commit);
        assert_eq!(raw_ptr_of(&host, &again), Some(commit));
        assert_eq!(kind_of(&host, &HostValue::Int(1)), HandleKind::Unknown);
        assert_eq!(live_handles(), Ok(2));

        assert!(assert_kind(&mut host, &h_commit, HandleKind::Commit, "git-commit-p"));
        assert!(assert_is_object(&mut host, &h_commit, "git-object-p"));
        assert!(!assert_kind(&mut host, &h_repo, HandleKind::Commit, "git-commit-p"));
        assert!(!assert_is_object(&mut host, &h_repo, "git-object-p"));
        assert_eq!(host.signals().len(), 2);

        for h in [&h_commit, &again, &h_repo] {
            assert!(host.collect(h));
        }
        assert_eq!(inner.lock().unwrap().live_count(), 0);
        assert!(teardown().unwrap().is_clean());
    }

    #[test]
    fn failure_codes_signal_the_last_error() {
        let _serial = serial();
        let (vcl, inner) = SharedVcl::new();
        inner
            .lock()
            .unwrap()
            .fail_with(VclError::new(ErrorClass::REPOSITORY, "could not find repository"));
        init(Box::new(vcl), ModuleConfig::default()).unwrap();

        let mut host = InMemoryHost::new();
        assert!(!dispatch_error(&mut host, 0));
        assert!(dispatch_error(&mut host, -3));
        assert_eq!(
            host.signals(),
            &[Signal::VclError {
                symbol: "giterr-repository".into(),
                class: ErrorClass::REPOSITORY,
                message: "could not find repository".into(),
            }]
        );
        assert!(teardown().unwrap().is_clean());
    }

    #[test]
    fn failure_without_store_signals_nothing() {
        let _serial = serial();
        let mut host = InMemoryHost::new();
        assert!(!dispatch_error(&mut host, -1));
        assert!(host.signals().is_empty());
    }
}
