//! GLSL to SPIR-V compiler behind an opaque-handle C ABI
//!
//! This crate owns the compiler and module lifecycles and exports them as
//! `spvc_*` functions for C callers. The safe Rust API lives in `spvcrs`.
//!
//! Thread safety follows the basic guarantee: concurrent calls on different
//! handles never need synchronization; concurrent calls on the same handle
//! need it only if one of them takes the handle as non-const.
//! `spvc_compile_into_spv` takes the compiler as const.

#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

mod backend;
mod compiler;
mod error;
mod kind;
mod module;

pub use backend::{Backend, BackendOutput, DEFAULT_ENTRY_POINT, NagaBackend};
pub use compiler::Compiler;
pub use error::{Error, Result};
pub use kind::{ShaderKind, spvc_shader_kind};
pub use module::{SPIRV_MAGIC, SpvModule};

use std::borrow::Cow;
use std::ffi::{CStr, c_char, c_int};
use std::panic;

/// Opaque handle to a [`Compiler`].
pub type spvc_compiler_t = *mut Compiler;

/// Opaque handle to an [`SpvModule`].
pub type spvc_module_t = *mut SpvModule;

// Returned for the bytes and message of null or empty modules.
static EMPTY: &CStr = c"";

/// Returns a compiler handle, or null if initialization failed.
///
/// Safe to call from several threads at once.
#[unsafe(no_mangle)]
pub extern "C" fn spvc_compiler_initialize() -> spvc_compiler_t {
    match panic::catch_unwind(Compiler::new) {
        Ok(compiler) => Box::into_raw(Box::new(compiler)),
        Err(_) => {
            log::warn!("compiler initialization failed");
            std::ptr::null_mut()
        }
    }
}

/// Releases a compiler. Null is ignored.
///
/// The handle must not be used again after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_compiler_release(compiler: spvc_compiler_t) {
    if !compiler.is_null() {
        drop(unsafe { Box::from_raw(compiler) });
    }
}

/// Compiles `source_text_size` bytes of GLSL into a SPIR-V module.
///
/// `entry_point_name` may be null, in which case `"main"` is used. A null
/// compiler yields a null module; every other outcome, including rejected
/// arguments, is a module whose success flag and message describe it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_compile_into_spv(
    compiler: *const Compiler,
    source_text: *const c_char,
    source_text_size: c_int,
    shader_kind: spvc_shader_kind,
    entry_point_name: *const c_char,
) -> spvc_module_t {
    let Some(compiler) = (unsafe { compiler.as_ref() }) else {
        return std::ptr::null_mut();
    };

    let module = match unsafe { source_arguments(source_text, source_text_size, shader_kind) } {
        Ok((source, kind)) => {
            let entry_point = if entry_point_name.is_null() {
                Cow::Borrowed(DEFAULT_ENTRY_POINT)
            } else {
                unsafe { CStr::from_ptr(entry_point_name) }.to_string_lossy()
            };
            compiler.compile(source, kind, &entry_point)
        }
        Err(err) => {
            log::warn!("rejected compile request: {err}");
            SpvModule::failed(&err.to_string())
        }
    };
    Box::into_raw(Box::new(module))
}

/// Validates the raw source pointer, length and kind.
unsafe fn source_arguments<'a>(
    source_text: *const c_char,
    source_text_size: c_int,
    shader_kind: spvc_shader_kind,
) -> Result<(&'a [u8], ShaderKind)> {
    let kind = ShaderKind::try_from(shader_kind)?;
    let len = usize::try_from(source_text_size)
        .map_err(|_| Error::NegativeLength(source_text_size))?;
    let source = if source_text.is_null() || len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(source_text.cast::<u8>(), len) }
    };
    Ok((source, kind))
}

/// Releases a module. Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_module_release(module: spvc_module_t) {
    if !module.is_null() {
        drop(unsafe { Box::from_raw(module) });
    }
}

/// Returns true if the module holds a successful compilation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_module_get_success(module: *const SpvModule) -> bool {
    unsafe { module.as_ref() }.is_some_and(SpvModule::success)
}

/// Returns the number of bytes in the SPIR-V payload.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_module_get_length(module: *const SpvModule) -> usize {
    unsafe { module.as_ref() }.map_or(0, SpvModule::len)
}

/// Returns a pointer to the SPIR-V bytes, castable to `uint32_t*`.
///
/// Valid for `spvc_module_get_length` bytes while the module is alive. For
/// null or empty modules this points at an empty string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_module_get_bytes(module: *const SpvModule) -> *const c_char {
    match unsafe { module.as_ref() } {
        Some(module) if !module.is_empty() => module.words().as_ptr().cast(),
        _ => EMPTY.as_ptr(),
    }
}

/// Returns the null-terminated diagnostic text of the module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spvc_module_get_error_message(module: *const SpvModule) -> *const c_char {
    unsafe { module.as_ref() }.map_or(EMPTY.as_ptr(), |module| module.error_message().as_ptr())
}
