use tether_host::{Finalizer, Host};
use tether_types::{HandleKind, RawPtr};
use tether_vcl::Vcl;

use crate::discriminate;
use crate::table::HandleTable;

/// The handle table together with the VCL it wraps and the finalizer every
/// handle it produces carries.
///
/// The wrap protocol lives in [`crate::wrap`], the release protocol in
/// [`crate::release`].
pub struct HandleStore<V> {
    pub(crate) vcl: V,
    pub(crate) table: HandleTable,
    pub(crate) finalizer: Finalizer,
}

impl<V: Vcl> HandleStore<V> {
    /// Create a store with an empty table.
    ///
    /// `finalizer` must route the host's finalizer calls back to
    /// [`HandleStore::release`] on this store.
    pub fn new(vcl: V, finalizer: Finalizer) -> Self {
        Self {
            vcl,
            table: HandleTable::new(),
            finalizer,
        }
    }

    pub fn vcl(&self) -> &V {
        &self.vcl
    }

    pub fn vcl_mut(&mut self) -> &mut V {
        &mut self.vcl
    }

    pub fn table(&self) -> &HandleTable {
        &self.table
    }

    /// The finalizer attached to every handle this store produces.
    pub fn finalizer(&self) -> Finalizer {
        self.finalizer
    }

    /// Number of live wrappers.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Refcount of the wrapper for `ptr`, if it is live.
    pub fn refcount(&self, ptr: RawPtr) -> Option<usize> {
        self.table.refcount(ptr)
    }

    // ---------------------------------------------------------------
    // Discrimination
    // ---------------------------------------------------------------

    /// See [`discriminate::kind_of`].
    pub fn kind_of<H: Host>(&self, host: &H, value: &H::Value) -> HandleKind {
        discriminate::kind_of(host, value, self.finalizer)
    }

    /// See [`discriminate::raw_ptr_of`].
    pub fn raw_ptr_of<H: Host>(&self, host: &H, value: &H::Value) -> Option<RawPtr> {
        discriminate::raw_ptr_of(host, value, self.finalizer)
    }

    /// See [`discriminate::assert_kind`].
    pub fn assert_kind<H: Host>(
        &self,
        host: &mut H,
        value: &H::Value,
        expected: HandleKind,
        predicate: &str,
    ) -> bool {
        discriminate::assert_kind(host, value, expected, predicate, self.finalizer)
    }

    /// See [`discriminate::assert_is_object`].
    pub fn assert_is_object<H: Host>(&self, host: &mut H, value: &H::Value, predicate: &str) -> bool {
        discriminate::assert_is_object(host, value, predicate, self.finalizer)
    }

    /// See [`discriminate::dispatch_error`].
    pub fn dispatch_error<H: Host>(&self, host: &mut H, rc: i32) -> bool {
        discriminate::dispatch_error(host, &self.vcl, rc)
    }
}

impl<V> std::fmt::Debug for HandleStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
