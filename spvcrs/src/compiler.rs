//! RAII wrapper for spvc_compiler_t

use crate::{Error, Result, ShaderKind, SpvModule};
use spvcompiler::{
    Backend, spvc_compile_into_spv, spvc_compiler_initialize, spvc_compiler_release,
    spvc_compiler_t,
};
use std::ffi::{CStr, c_int};
use std::ptr;
use std::sync::Arc;

/// RAII wrapper for a compiler handle.
///
/// Compilation borrows the compiler immutably, so a single `Compiler` can be
/// shared by reference between threads. It is never cloned; ownership moves
/// with the value, or explicitly with [`Compiler::take`], which leaves the
/// source invalid but still safe to use.
///
/// # Example
/// ```
/// use spvcrs::{Compiler, ShaderKind};
///
/// let compiler = Compiler::new();
/// let module = compiler.compile("void main(){}", ShaderKind::Fragment);
/// assert!(module.success());
/// assert!(module.has_spirv_magic());
/// ```
pub struct Compiler {
    ptr: spvc_compiler_t,
}

impl Compiler {
    /// Initializes a compiler with the default backend.
    ///
    /// Check [`Compiler::is_valid`] before relying on the result.
    pub fn new() -> Self {
        Compiler {
            ptr: spvc_compiler_initialize(),
        }
    }

    /// Initializes a compiler that delegates to `backend`.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        let compiler = spvcompiler::Compiler::with_backend(backend);
        Compiler {
            ptr: Box::into_raw(Box::new(compiler)),
        }
    }

    /// Returns true if this wrapper owns a live compiler.
    pub fn is_valid(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Moves the handle out, leaving this wrapper invalid.
    pub fn take(&mut self) -> Compiler {
        Compiler {
            ptr: std::mem::replace(&mut self.ptr, ptr::null_mut()),
        }
    }

    /// Returns [`Error::InvalidCompiler`] for an invalid wrapper.
    pub fn check(&self) -> Result<&Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(Error::InvalidCompiler)
        }
    }

    /// Compiles GLSL text with entry point `main`.
    pub fn compile(&self, source: &str, kind: ShaderKind) -> SpvModule {
        self.compile_bytes(source.as_bytes(), kind)
    }

    /// Compiles a NUL-terminated source; the length is implied by the
    /// terminator.
    pub fn compile_cstr(&self, source: &CStr, kind: ShaderKind) -> SpvModule {
        self.compile_bytes(source.to_bytes(), kind)
    }

    /// Compiles an explicit-length source buffer with entry point `main`.
    pub fn compile_bytes(&self, source: &[u8], kind: ShaderKind) -> SpvModule {
        self.compile_with_entry_point(source, kind, c"main")
    }

    /// Compiles a source buffer, exporting the entry point as `entry_point`.
    ///
    /// An invalid compiler, or a source longer than `c_int::MAX` bytes,
    /// yields a null module.
    pub fn compile_with_entry_point(
        &self,
        source: &[u8],
        kind: ShaderKind,
        entry_point: &CStr,
    ) -> SpvModule {
        self.try_compile_with_entry_point(source, kind, entry_point)
            .unwrap_or_else(|err| {
                log::warn!("{err}");
                SpvModule::null()
            })
    }

    /// Like [`Compiler::compile_with_entry_point`], but reports an invalid
    /// compiler or an oversized source as an error instead of a null module.
    ///
    /// A failed compilation is still `Ok`; see [`SpvModule::into_result`].
    pub fn try_compile_with_entry_point(
        &self,
        source: &[u8],
        kind: ShaderKind,
        entry_point: &CStr,
    ) -> Result<SpvModule> {
        self.check()?;
        let len = c_int::try_from(source.len()).map_err(|_| Error::SourceTooLarge(source.len()))?;
        Ok(unsafe {
            SpvModule::from_raw(spvc_compile_into_spv(
                self.ptr,
                source.as_ptr().cast(),
                len,
                kind.raw(),
                entry_point.as_ptr(),
            ))
        })
    }

    /// Returns the raw handle (for FFI).
    pub fn as_ptr(&self) -> spvc_compiler_t {
        self.ptr
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Compiler {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { spvc_compiler_release(self.ptr) };
        }
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler").field("ptr", &self.ptr).finish()
    }
}

// Compiling takes the handle as const and is safe from any thread; release
// requires ownership.
unsafe impl Send for Compiler {}
unsafe impl Sync for Compiler {}

#[cfg(test)]
mod tests {
    use super::*;
    use spvcompiler::{BackendOutput, SPIRV_MAGIC};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    impl Backend for CountingBackend {
        fn compile(&self, source: &str, _: ShaderKind, entry_point: &str) -> BackendOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut words = vec![SPIRV_MAGIC];
            words.extend(entry_point.bytes().map(u32::from));
            words.push(source.len() as u32);
            BackendOutput::succeeded(words)
        }
    }

    #[test]
    fn test_release_exactly_once() {
        let backend = Arc::new(CountingBackend::default());
        let mut compiler = Compiler::with_backend(backend.clone());
        assert_eq!(Arc::strong_count(&backend), 2);

        let moved = compiler.take();
        drop(compiler);
        assert_eq!(Arc::strong_count(&backend), 2, "Moved-from drop must not release");

        drop(moved);
        assert_eq!(Arc::strong_count(&backend), 1);
    }

    #[test]
    fn test_entry_point_passed_through() {
        let backend = Arc::new(CountingBackend::default());
        let compiler = Compiler::with_backend(backend.clone());

        let module = compiler.compile_with_entry_point(b"abcd", ShaderKind::Vertex, c"vs");
        assert_eq!(module.words(), &[SPIRV_MAGIC, u32::from(b'v'), u32::from(b's'), 4]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_oversized_source_rejected() {
        let backend = Arc::new(CountingBackend::default());
        let compiler = Compiler::with_backend(backend.clone());
        let len = c_int::MAX as usize + 1;
        // Zeroed allocation; the pages are never touched.
        let source = vec![0u8; len];

        let err = compiler
            .try_compile_with_entry_point(&source, ShaderKind::Vertex, c"main")
            .unwrap_err();
        assert!(matches!(err, Error::SourceTooLarge(n) if n == len));

        let module = compiler.compile_bytes(&source, ShaderKind::Vertex);
        assert!(!module.is_valid());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_compiler_skips_backend() {
        let backend = Arc::new(CountingBackend::default());
        let mut compiler = Compiler::with_backend(backend.clone());
        let _owner = compiler.take();

        let module = compiler.compile("void main(){}", ShaderKind::Vertex);
        assert!(!module.is_valid());
        assert!(!module.success());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(compiler.check(), Err(Error::InvalidCompiler)));
        assert!(matches!(
            compiler.try_compile_with_entry_point(b"", ShaderKind::Vertex, c"main"),
            Err(Error::InvalidCompiler)
        ));
    }
}
