//! RAII wrapper for spvc_module_t

use crate::{Error, Result};
use spvcompiler::{
    SPIRV_MAGIC, spvc_module_get_bytes, spvc_module_get_error_message, spvc_module_get_length,
    spvc_module_get_success, spvc_module_release, spvc_module_t,
};
use std::ffi::CStr;
use std::ops::Deref;
use std::{ptr, slice};

/// RAII wrapper for a compiled module.
///
/// Owns the handle exclusively and releases it when dropped. A null module
/// (from [`SpvModule::null`], [`Default`], or [`SpvModule::take`]) is always
/// safe to query: it reports failure, no bytes and an empty message.
pub struct SpvModule {
    ptr: spvc_module_t,
}

impl SpvModule {
    /// Takes ownership of a raw module handle, which may be null.
    ///
    /// # Safety
    /// The pointer must be null or a live module not owned by anything else.
    pub unsafe fn from_raw(ptr: spvc_module_t) -> Self {
        SpvModule { ptr }
    }

    /// Creates a module that owns nothing.
    pub const fn null() -> Self {
        SpvModule {
            ptr: ptr::null_mut(),
        }
    }

    /// Returns true if a module handle is owned.
    pub fn is_valid(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Moves the handle out, leaving this wrapper null.
    pub fn take(&mut self) -> SpvModule {
        std::mem::take(self)
    }

    /// Returns true if the compilation succeeded.
    pub fn success(&self) -> bool {
        unsafe { spvc_module_get_success(self.ptr) }
    }

    /// Returns the size of the SPIR-V payload in bytes.
    pub fn len(&self) -> usize {
        unsafe { spvc_module_get_length(self.ptr) }
    }

    /// Returns true if there is no payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the SPIR-V payload as bytes.
    pub fn data(&self) -> &[u8] {
        let len = self.len();
        if len == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(spvc_module_get_bytes(self.ptr).cast::<u8>(), len) }
    }

    /// Returns the SPIR-V payload as words.
    pub fn words(&self) -> &[u32] {
        bytemuck::try_cast_slice(self.data()).unwrap_or(&[])
    }

    /// Returns the compiler diagnostics; empty on success.
    pub fn error_message(&self) -> &str {
        let message = unsafe { CStr::from_ptr(spvc_module_get_error_message(self.ptr)) };
        message.to_str().unwrap_or_default()
    }

    /// Returns true if the payload starts with the SPIR-V magic number.
    pub fn has_spirv_magic(&self) -> bool {
        self.words().first() == Some(&SPIRV_MAGIC)
    }

    /// Converts a failed module into [`Error::Compilation`].
    pub fn into_result(self) -> Result<SpvModule> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::Compilation {
                message: self.error_message().to_string(),
            })
        }
    }

    /// Returns the raw handle (for FFI).
    pub fn as_ptr(&self) -> spvc_module_t {
        self.ptr
    }
}

impl Default for SpvModule {
    fn default() -> Self {
        Self::null()
    }
}

impl Drop for SpvModule {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { spvc_module_release(self.ptr) };
        }
    }
}

impl Deref for SpvModule {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl AsRef<[u8]> for SpvModule {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl std::fmt::Debug for SpvModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpvModule")
            .field("success", &self.success())
            .field("len", &self.len())
            .field("ptr", &self.ptr)
            .finish()
    }
}

// Accessors only read the module; anything that mutates or releases it
// needs `&mut self` or ownership.
unsafe impl Send for SpvModule {}
unsafe impl Sync for SpvModule {}
