//! Shader compilation API

use crate::{Compiler, Error, IncludeHandler, Result, ShaderKind, SpvModule, expand_includes};
use std::borrow::Cow;
use std::ffi::CString;

/// Builder for shader compilation with fluent API
///
/// # Example
/// ```
/// use spvcrs::{CompileBuilder, Compiler, MemoryInclude, ShaderKind};
///
/// let compiler = Compiler::new();
/// let mut includes = MemoryInclude::new().with_file("color.glsl", "const float red = 1.0;");
///
/// let module = CompileBuilder::new(&compiler, "#include \"color.glsl\"\nvoid main(){}", ShaderKind::Fragment)
///     .entry_point("shade")
///     .include_handler(&mut includes)
///     .compile()
///     .unwrap();
/// assert!(module.has_spirv_magic());
/// ```
pub struct CompileBuilder<'a> {
    compiler: &'a Compiler,
    source: &'a str,
    kind: ShaderKind,
    entry_point: String,
    include: Option<&'a mut dyn IncludeHandler>,
}

impl<'a> CompileBuilder<'a> {
    /// Creates a builder compiling `source` as `kind` with entry point `main`.
    pub fn new(compiler: &'a Compiler, source: &'a str, kind: ShaderKind) -> Self {
        CompileBuilder {
            compiler,
            source,
            kind,
            entry_point: spvcompiler::DEFAULT_ENTRY_POINT.to_string(),
            include: None,
        }
    }

    /// Sets the name the entry point is exported under.
    pub fn entry_point(mut self, name: &str) -> Self {
        self.entry_point = name.to_string();
        self
    }

    /// Expands `#include` lines through `handler` before compiling.
    pub fn include_handler(mut self, handler: &'a mut dyn IncludeHandler) -> Self {
        self.include = Some(handler);
        self
    }

    /// Compiles the shader.
    ///
    /// Returns the module on success; diagnostics become
    /// [`Error::Compilation`].
    pub fn compile(self) -> Result<SpvModule> {
        let entry_point = CString::new(self.entry_point)
            .map_err(|_| Error::InvalidParameter("entry point contains a NUL byte".into()))?;

        let source = match self.include {
            Some(handler) => Cow::Owned(expand_includes(self.source, handler)?),
            None => Cow::Borrowed(self.source),
        };
        self.compiler
            .try_compile_with_entry_point(source.as_bytes(), self.kind, &entry_point)?
            .into_result()
    }
}

/// Convenience function for simple shader compilation.
///
/// # Example
/// ```
/// use spvcrs::{compile, ShaderKind};
///
/// let module = compile("void main(){}", ShaderKind::Vertex).unwrap();
/// assert!(module.len() >= 20);
/// ```
pub fn compile(source: &str, kind: ShaderKind) -> Result<SpvModule> {
    let compiler = Compiler::new();
    CompileBuilder::new(&compiler, source, kind).compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryInclude;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_simple_shader() {
        let module = compile("void main(){}", ShaderKind::Fragment).unwrap();
        assert!(module.success());
        assert!(module.has_spirv_magic(), "Module should start with SPIR-V magic");
        assert_eq!(module.len() % 4, 0);
    }

    #[test]
    fn test_compile_error() {
        let result = compile("void main() { int x = -; }", ShaderKind::Vertex);
        match result {
            Err(Error::Compilation { message }) => assert!(!message.is_empty()),
            other => panic!("Expected compilation error, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_point_with_nul() {
        let compiler = Compiler::new();
        let result = CompileBuilder::new(&compiler, "void main(){}", ShaderKind::Vertex)
            .entry_point("ma\0in")
            .compile();
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_include() {
        let compiler = Compiler::new();
        let mut includes = MemoryInclude::new();
        let result = CompileBuilder::new(&compiler, "#include <nope.glsl>\n", ShaderKind::Vertex)
            .include_handler(&mut includes)
            .compile();
        assert!(matches!(result, Err(Error::IncludeNotFound(name)) if name == "nope.glsl"));
    }

    #[test]
    fn test_invalid_compiler() {
        let mut compiler = Compiler::new();
        let _owner = compiler.take();
        let result = CompileBuilder::new(&compiler, "void main(){}", ShaderKind::Vertex).compile();
        assert!(matches!(result, Err(Error::InvalidCompiler)));
    }
}
