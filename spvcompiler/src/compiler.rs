//! Compiler state behind an `spvc_compiler_t` handle

use crate::backend::{Backend, NagaBackend};
use crate::{Error, ShaderKind, SpvModule};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

// Process-wide default backend. Created on first use and kept until exit.
static DEFAULT_BACKEND: OnceLock<Arc<dyn Backend>> = OnceLock::new();

fn default_backend() -> Arc<dyn Backend> {
    DEFAULT_BACKEND
        .get_or_init(|| {
            log::debug!("initializing default naga backend");
            Arc::new(NagaBackend::new())
        })
        .clone()
}

/// Everything needed to compile modules.
///
/// Compiling only needs `&self`, so one compiler may be shared between
/// threads with no external lock. Releasing it needs ownership.
pub struct Compiler {
    backend: Arc<dyn Backend>,
}

impl Compiler {
    /// Creates a compiler using the process-wide naga backend.
    pub fn new() -> Self {
        Self::with_backend(default_backend())
    }

    /// Creates a compiler delegating to `backend`.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        log::debug!("compiler initialized");
        Compiler { backend }
    }

    /// Compiles `source` into a module.
    ///
    /// Never fails as a call: rejected input, non-UTF-8 text and backend
    /// panics all come back as a failed module with diagnostics.
    pub fn compile(&self, source: &[u8], kind: ShaderKind, entry_point: &str) -> SpvModule {
        let source = match std::str::from_utf8(source) {
            Ok(source) => source,
            Err(err) => return SpvModule::failed(&Error::from(err).to_string()),
        };

        log::trace!(
            "compiling {} bytes as {} (entry point {:?})",
            source.len(),
            kind,
            entry_point
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.backend.compile(source, kind, entry_point)
        }));
        match result {
            Ok(output) => {
                if !output.success {
                    log::trace!("compilation failed: {}", output.diagnostics.trim_end());
                }
                output.into()
            }
            Err(payload) => {
                let err = Error::BackendPanic(panic_message(payload.as_ref()));
                log::warn!("{err}");
                SpvModule::failed(&err.to_string())
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Compiler {
    fn drop(&mut self) {
        log::debug!("compiler released");
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("backend_refs", &Arc::strong_count(&self.backend))
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "backend panicked".to_string()
    }
}
