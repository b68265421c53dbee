//! Compilation result owned by one module handle

use crate::backend::BackendOutput;
use std::ffi::{CStr, CString};

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Outcome of one compile call: success flag, SPIR-V payload and
/// diagnostics, released as a single unit.
///
/// The payload is stored as words so the byte view handed across the C ABI
/// is always castable to `*const u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpvModule {
    success: bool,
    words: Vec<u32>,
    error_message: CString,
}

impl SpvModule {
    /// A successful module holding `words`.
    pub fn succeeded(words: Vec<u32>) -> Self {
        SpvModule {
            success: true,
            words,
            error_message: CString::default(),
        }
    }

    /// A failed module carrying `message` verbatim.
    ///
    /// Interior NUL bytes cannot cross the C ABI and are dropped.
    pub fn failed(message: &str) -> Self {
        let error_message = CString::new(message.replace('\0', "")).unwrap_or_default();
        SpvModule {
            success: false,
            words: Vec::new(),
            error_message,
        }
    }

    /// Returns true if the compilation succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Returns the payload as SPIR-V words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Returns the payload as bytes (host endian).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        self.words.len() * std::mem::size_of::<u32>()
    }

    /// Returns true if there is no payload.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the diagnostic text; empty on success.
    pub fn error_message(&self) -> &CStr {
        &self.error_message
    }

    /// Returns true if the payload starts with [`SPIRV_MAGIC`].
    pub fn has_spirv_magic(&self) -> bool {
        self.words.first() == Some(&SPIRV_MAGIC)
    }
}

impl From<BackendOutput> for SpvModule {
    fn from(output: BackendOutput) -> Self {
        if output.success {
            SpvModule::succeeded(output.words)
        } else {
            SpvModule::failed(&output.diagnostics)
        }
    }
}
