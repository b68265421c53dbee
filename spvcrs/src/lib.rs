//! Safe, ergonomic Rust API for spvcompiler
//!
//! This crate wraps the spvcompiler C ABI in owning handles that release
//! exactly once, adds `Result`-based compilation with include expansion,
//! and provides search-path file lookup.
//!
//! # Example
//!
//! ```
//! use spvcrs::{Compiler, ShaderKind};
//!
//! let compiler = Compiler::new();
//! let module = compiler.compile("void main(){}", ShaderKind::Vertex);
//! assert!(module.success());
//! assert!(module.has_spirv_magic());
//!
//! let broken = compiler.compile("int f(){return wrongname;}", ShaderKind::Vertex);
//! assert!(!broken.success());
//! println!("{}", broken.error_message());
//! ```

mod compile;
mod compiler;
mod error;
mod include;
mod module;
mod search_path;

pub use compile::{CompileBuilder, compile};
pub use compiler::Compiler;
pub use error::{Error, Result};
pub use include::{
    IncludeHandler, IncludeType, MAX_INCLUDE_DEPTH, MemoryInclude, SearchPathInclude,
    expand_includes,
};
pub use module::SpvModule;
pub use search_path::FileFinder;
pub use spvcompiler::{Backend, BackendOutput, NagaBackend, SPIRV_MAGIC, ShaderKind};
