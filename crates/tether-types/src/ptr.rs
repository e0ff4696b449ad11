use std::ffi::c_void;
use std::fmt;

/// An opaque, VCL-owned address.
///
/// `RawPtr` is the identity of a wrapped VCL object and the key of the
/// handle table. Tether never dereferences it; it is only handed back to the
/// VCL accessor and free functions it came from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawPtr(*mut c_void);

// SAFETY: a RawPtr is an address, not a borrow. Tether never reads through
// it, and every VCL call that does is made by the single thread that owns
// the handle store at that moment.
unsafe impl Send for RawPtr {}

impl RawPtr {
    /// Wrap a raw VCL pointer.
    pub fn new<T>(ptr: *mut T) -> Self {
        Self(ptr.cast())
    }

    /// Build a pointer from a bare address. Used by simulated backends.
    pub fn from_addr(addr: usize) -> Self {
        Self(addr as *mut c_void)
    }

    /// The null pointer.
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Returns `true` if this is the null pointer.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// The numeric address.
    pub fn addr(&self) -> usize {
        self.0 as usize
    }

    /// The pointer, cast to the VCL type the caller expects.
    pub fn cast<T>(&self) -> *mut T {
        self.0.cast()
    }
}

impl fmt::Debug for RawPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPtr({:#x})", self.addr())
    }
}

impl fmt::Display for RawPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}

impl<T> From<*mut T> for RawPtr {
    fn from(ptr: *mut T) -> Self {
        Self::new(ptr)
    }
}
