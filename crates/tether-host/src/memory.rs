//! Simulated host runtime for tests.
//!
//! [`InMemoryHost`] keeps user pointers in a slot vector and records signals
//! instead of unwinding. Garbage collection is driven explicitly: a test
//! chooses which values become unreachable and in what order, which is
//! exactly the freedom a real host has when it runs finalizers.

use std::ffi::c_void;

use tether_types::ErrorClass;

use crate::traits::{Finalizer, Host};

/// A host value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostValue {
    Nil,
    Int(i64),
    Str(String),
    /// A user pointer, by slot index.
    UserPtr(usize),
}

/// A signal raised through the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    WrongType {
        predicate: String,
        value: HostValue,
    },
    VclError {
        symbol: String,
        class: ErrorClass,
        message: String,
    },
}

struct Slot {
    payload: *mut c_void,
    finalizer: Finalizer,
    reachable: bool,
}

/// An in-memory implementation of [`Host`].
#[derive(Default)]
pub struct InMemoryHost {
    slots: Vec<Slot>,
    signals: Vec<Signal>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every signal raised so far, in order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Number of user pointers still reachable.
    pub fn live_user_ptrs(&self) -> usize {
        self.slots.iter().filter(|slot| slot.reachable).count()
    }

    fn reachable_slot(&mut self, value: &HostValue) -> Option<&mut Slot> {
        match value {
            HostValue::UserPtr(idx) => self.slots.get_mut(*idx).filter(|slot| slot.reachable),
            _ => None,
        }
    }

    /// Make `value` unreachable and run its finalizer.
    ///
    /// Returns `false` if `value` is not a user pointer or was already
    /// collected.
    pub fn collect(&mut self, value: &HostValue) -> bool {
        let Some(slot) = self.reachable_slot(value) else {
            return false;
        };
        slot.reachable = false;
        let (finalizer, payload) = (slot.finalizer, slot.payload);
        // SAFETY: the finalizer was registered together with this payload and
        // the slot is no longer reachable, so it runs exactly once.
        unsafe { finalizer(payload) };
        true
    }

    /// Make `value` unreachable and hand its payload back without running
    /// the finalizer, so a test can drive release itself.
    pub fn reclaim(&mut self, value: &HostValue) -> Option<*mut c_void> {
        let slot = self.reachable_slot(value)?;
        slot.reachable = false;
        Some(slot.payload)
    }
}

impl Host for InMemoryHost {
    type Value = HostValue;

    fn make_user_ptr(&mut self, finalizer: Finalizer, payload: *mut c_void) -> HostValue {
        self.slots.push(Slot {
            payload,
            finalizer,
            reachable: true,
        });
        HostValue::UserPtr(self.slots.len() - 1)
    }

    fn user_ptr(&self, value: &HostValue) -> Option<*mut c_void> {
        match value {
            HostValue::UserPtr(idx) => self.slots.get(*idx).map(|slot| slot.payload),
            _ => None,
        }
    }

    fn user_finalizer(&self, value: &HostValue) -> Option<Finalizer> {
        match value {
            HostValue::UserPtr(idx) => self.slots.get(*idx).map(|slot| slot.finalizer),
            _ => None,
        }
    }

    fn nil(&mut self) -> HostValue {
        HostValue::Nil
    }

    fn signal_wrong_type(&mut self, predicate: &str, value: &HostValue) {
        self.signals.push(Signal::WrongType {
            predicate: predicate.to_string(),
            value: value.clone(),
        });
    }

    fn signal_vcl_error(&mut self, symbol: &str, class: ErrorClass, message: &str) {
        self.signals.push(Signal::VclError {
            symbol: symbol.to_string(),
            class,
            message: message.to_string(),
        });
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("user_ptrs", &self.slots.len())
            .field("live_user_ptrs", &self.live_user_ptrs())
            .field("signals", &self.signals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::same_finalizer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FINALIZED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_finalizer(payload: *mut c_void) {
        FINALIZED.fetch_add(payload as usize, Ordering::SeqCst);
    }

    unsafe extern "C" fn other_finalizer(_payload: *mut c_void) {}

    #[test]
    fn user_ptr_round_trip() {
        let mut host = InMemoryHost::new();
        let payload = 0x40 as *mut c_void;
        let value = host.make_user_ptr(other_finalizer, payload);
        assert_eq!(host.user_ptr(&value), Some(payload));
        let fin = host.user_finalizer(&value).unwrap();
        assert!(same_finalizer(fin, other_finalizer));
        assert!(!same_finalizer(fin, count_finalizer));
    }

    #[test]
    fn non_user_ptrs_have_no_payload() {
        let mut host = InMemoryHost::new();
        let nil = host.nil();
        assert_eq!(host.user_ptr(&nil), None);
        assert_eq!(host.user_ptr(&HostValue::Int(3)), None);
        assert!(host.user_finalizer(&HostValue::Str("x".into())).is_none());
    }

    #[test]
    fn collect_runs_finalizer_once() {
        let mut host = InMemoryHost::new();
        let value = host.make_user_ptr(count_finalizer, 5 as *mut c_void);
        let before = FINALIZED.load(Ordering::SeqCst);
        assert!(host.collect(&value));
        assert!(!host.collect(&value));
        assert_eq!(FINALIZED.load(Ordering::SeqCst) - before, 5);
        assert_eq!(host.live_user_ptrs(), 0);
    }

    #[test]
    fn reclaim_skips_finalizer() {
        let mut host = InMemoryHost::new();
        let payload = 0x80 as *mut c_void;
        let value = host.make_user_ptr(other_finalizer, payload);
        assert_eq!(host.reclaim(&value), Some(payload));
        assert_eq!(host.reclaim(&value), None);
        assert!(!host.collect(&value));
    }

    #[test]
    fn signals_are_recorded_in_order() {
        let mut host = InMemoryHost::new();
        host.signal_wrong_type("git-commit-p", &HostValue::Int(1));
        host.signal_vcl_error("giterr-os", ErrorClass::OS, "no such file");
        assert_eq!(host.signals().len(), 2);
        assert!(matches!(
            &host.signals()[0],
            Signal::WrongType { predicate, .. } if predicate == "git-commit-p"
        ));
        assert!(matches!(
            &host.signals()[1],
            Signal::VclError { class, .. } if *class == ErrorClass::OS
        ));
    }
}
