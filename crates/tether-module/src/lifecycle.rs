//! The process-wide handle store and its lifecycle.
//!
//! A host loads the module once and calls back into it from one thread, so
//! the store lives in a static behind a mutex that is only ever
//! `try_lock`ed: a lock that is already held can only mean re-entry from a
//! finalizer, which is refused instead of deadlocking.

use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard, TryLockError};

use tracing::{debug, error, info, warn, Level};

use tether_core::HandleStore;
use tether_vcl::Vcl;

use crate::config::ModuleConfig;
use crate::error::{ModuleError, ModuleResult};

/// The VCL backend as the process-wide store holds it.
pub type DynVcl = Box<dyn Vcl + Send>;

pub(crate) struct State {
    pub(crate) store: HandleStore<DynVcl>,
    config: ModuleConfig,
}

static STATE: Mutex<Option<State>> = Mutex::new(None);

/// What teardown found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Wrappers still live. Their VCL resources were not freed.
    pub residual: usize,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.residual == 0
    }
}

fn lock() -> ModuleResult<MutexGuard<'static, Option<State>>> {
    match STATE.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(ModuleError::Reentrant),
        Err(TryLockError::Poisoned(poisoned)) => {
            warn!("handle store lock was poisoned; continuing");
            Ok(poisoned.into_inner())
        }
    }
}

/// Run `f` on the installed state while holding the store lock.
///
/// `f` must not call into the host.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> ModuleResult<R> {
    let mut guard = lock()?;
    let state = guard.as_mut().ok_or(ModuleError::NotInitialized)?;
    Ok(f(state))
}

/// Install the process-wide store over `vcl`.
pub fn init(vcl: DynVcl, config: ModuleConfig) -> ModuleResult<()> {
    if let Some(level) = config.level()? {
        install_logging(level);
    }
    let mut guard = lock()?;
    if guard.is_some() {
        return Err(ModuleError::AlreadyInitialized);
    }
    *guard = Some(State {
        store: HandleStore::new(vcl, finalize_handle),
        config,
    });
    info!("tether module initialised");
    Ok(())
}

fn install_logging(level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    debug!(%level, installed, "log subscriber configured");
}

/// Remove the process-wide store.
///
/// Live wrappers are left allocated and their VCL resources unfreed: a host
/// may still finalize handles pointing at them.
pub fn teardown() -> ModuleResult<TeardownReport> {
    let state = lock()?.take().ok_or(ModuleError::NotInitialized)?;
    let report = TeardownReport {
        residual: state.store.len(),
    };
    if report.is_clean() {
        info!("tether module torn down");
    } else {
        if state.config.report_leaks {
            warn!(residual = report.residual, "handles still live at teardown; leaking them");
        }
        std::mem::forget(state);
    }
    Ok(report)
}

/// Returns `true` if a store is installed.
pub fn is_initialized() -> bool {
    // A held lock means a store call is in progress.
    lock().map(|guard| guard.is_some()).unwrap_or(true)
}

/// Number of live wrappers in the process-wide store.
pub fn live_handles() -> ModuleResult<usize> {
    with_state(|state| state.store.len())
}

/// The finalizer attached to every handle the module hands out.
///
/// # Safety
///
/// Only the host may call this, once per handle, with that handle's payload.
pub unsafe extern "C" fn finalize_handle(payload: *mut c_void) {
    match with_state(|state| unsafe { state.store.release(payload) }) {
        Ok(Ok(released)) => {
            if !released.is_retained() {
                debug!(removed = released.removed.len(), "handle finalized");
            }
        }
        Ok(Err(err)) => error!(%err, "handle release refused"),
        Err(ModuleError::NotInitialized) => warn!("handle finalized after teardown"),
        Err(err) => error!(%err, "finalizer could not reach the handle store"),
    }
}
