//! Error types for spvcompiler

use thiserror::Error;

/// Reasons a compile request is rejected before or while reaching the backend.
///
/// None of these cross the C ABI as errors: they are rendered into the
/// diagnostic text of a failed module.
#[derive(Error, Debug)]
pub enum Error {
    /// Source text is not UTF-8
    #[error("source text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A negative byte count was passed for the source text
    #[error("invalid source length: {0}")]
    NegativeLength(i32),

    /// Raw shader kind outside the known range
    #[error("unknown shader kind: {0}")]
    UnknownShaderKind(i32),

    /// Shader kind name that does not parse
    #[error("unknown shader kind name: {0}")]
    UnknownShaderName(String),

    /// Backend panicked while compiling
    #[error("internal compiler error: {0}")]
    BackendPanic(String),
}

/// Result type for spvcompiler operations
pub type Result<T> = std::result::Result<T, Error>;
