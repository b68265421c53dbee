//! Error types for spvcrs operations

use thiserror::Error;

/// Error type for spvcrs operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shader compilation failed
    #[error("Compilation failed: {message}")]
    Compilation {
        /// Diagnostics from the compiler
        message: String,
    },

    /// The compiler handle is null (initialization failed or moved out)
    #[error("Invalid compiler handle")]
    InvalidCompiler,

    /// Invalid parameter provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Source longer than the C ABI can describe
    #[error("Source too large: {0} bytes")]
    SourceTooLarge(usize),

    /// Include file not found
    #[error("Include file not found: {0}")]
    IncludeNotFound(String),

    /// Includes nested deeper than the expansion limit
    #[error("Include nesting exceeds {limit} levels at {name}")]
    IncludeDepthExceeded {
        /// The include that crossed the limit
        name: String,
        /// The nesting limit
        limit: usize,
    },

    /// IO error during include resolution
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for spvcrs operations
pub type Result<T> = std::result::Result<T, Error>;
