//! The production backend over libgit2.

use std::ffi::CStr;

use libgit2_sys as raw;
use tether_types::{ErrorClass, ObjectType, RawPtr, VclError};

use crate::traits::Vcl;

/// [`Vcl`] implemented by calling into libgit2.
#[derive(Debug)]
pub struct LibGit2 {
    _private: (),
}

impl LibGit2 {
    /// Initialise libgit2 (once per process) and return the backend.
    pub fn new() -> Self {
        raw::init();
        Self { _private: () }
    }
}

impl Default for LibGit2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcl for LibGit2 {
    unsafe fn object_type(&self, object: RawPtr) -> ObjectType {
        ObjectType::from_raw(raw::git_object_type(object.cast::<raw::git_object>()) as i32)
    }

    unsafe fn object_owner(&self, object: RawPtr) -> RawPtr {
        RawPtr::new(raw::git_object_owner(object.cast::<raw::git_object>()))
    }

    unsafe fn reference_owner(&self, reference: RawPtr) -> RawPtr {
        RawPtr::new(raw::git_reference_owner(
            reference.cast::<raw::git_reference>(),
        ))
    }

    unsafe fn object_free(&mut self, object: RawPtr) {
        raw::git_object_free(object.cast::<raw::git_object>());
    }

    unsafe fn reference_free(&mut self, reference: RawPtr) {
        raw::git_reference_free(reference.cast::<raw::git_reference>());
    }

    unsafe fn repository_free(&mut self, repository: RawPtr) {
        raw::git_repository_free(repository.cast::<raw::git_repository>());
    }

    fn last_error(&self) -> Option<VclError> {
        // SAFETY: git_error_last returns null or a pointer to a thread-local
        // record that stays valid until the next libgit2 call on this thread.
        unsafe {
            let err = raw::git_error_last();
            if err.is_null() {
                return None;
            }
            let message = if (*err).message.is_null() {
                String::new()
            } else {
                CStr::from_ptr((*err).message).to_string_lossy().into_owned()
            };
            Some(VclError::new(
                ErrorClass::from_raw((*err).klass as i32),
                message,
            ))
        }
    }
}
