//! Backend capability and the naga-based default implementation
//!
//! A [`Backend`] turns one source string into SPIR-V words plus diagnostics.
//! It is invoked through a shared reference from any number of threads, so
//! implementations keep all per-compile state on the stack.

use crate::ShaderKind;
use naga::back::spv;
use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::borrow::Cow;
use std::fmt::Write as _;

/// Entry point name used when the caller does not supply one.
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Output of a single backend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutput {
    /// Whether the source was accepted
    pub success: bool,
    /// SPIR-V words; empty unless `success`
    pub words: Vec<u32>,
    /// Human-readable compiler messages
    pub diagnostics: String,
}

impl BackendOutput {
    /// A successful compilation with no diagnostics.
    pub fn succeeded(words: Vec<u32>) -> Self {
        BackendOutput {
            success: true,
            words,
            diagnostics: String::new(),
        }
    }

    /// A rejected compilation. The payload is always empty.
    pub fn failed(diagnostics: impl Into<String>) -> Self {
        BackendOutput {
            success: false,
            words: Vec::new(),
            diagnostics: diagnostics.into(),
        }
    }
}

/// Compiles shader source into SPIR-V.
///
/// `compile` takes `&self`: a backend shared between threads is called
/// concurrently without any locking by the caller.
pub trait Backend: Send + Sync {
    /// Compiles `source` for the given stage, exporting the entry point under
    /// `entry_point`.
    fn compile(&self, source: &str, kind: ShaderKind, entry_point: &str) -> BackendOutput;
}

/// GLSL frontend + SPIR-V writer from the `naga` crate.
///
/// # Example
/// ```
/// use spvcompiler::{Backend, NagaBackend, ShaderKind};
///
/// let backend = NagaBackend::new().spv_version(1, 3);
/// let output = backend.compile("void main(){}", ShaderKind::Fragment, "main");
/// assert!(output.success);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NagaBackend {
    spv_version: (u8, u8),
    default_glsl_version: u16,
}

impl NagaBackend {
    /// SPIR-V 1.0 output, `#version 450` assumed for unversioned sources.
    pub const fn new() -> Self {
        NagaBackend {
            spv_version: (1, 0),
            default_glsl_version: 450,
        }
    }

    /// Sets the SPIR-V version written into the module header.
    pub const fn spv_version(mut self, major: u8, minor: u8) -> Self {
        self.spv_version = (major, minor);
        self
    }

    /// Sets the GLSL version assumed when a source has no `#version` line.
    pub const fn default_glsl_version(mut self, version: u16) -> Self {
        self.default_glsl_version = version;
        self
    }

    /// Prepends a `#version` line if the source lacks one.
    ///
    /// Returns the text handed to the frontend and the number of lines added
    /// in front of the caller's source.
    fn prepare<'a>(&self, source: &'a str) -> (Cow<'a, str>, u32) {
        if has_version_directive(source) {
            (Cow::Borrowed(source), 0)
        } else {
            let text = format!("#version {}\n{}", self.default_glsl_version, source);
            (Cow::Owned(text), 1)
        }
    }

    fn emit(&self, module: &naga::Module) -> BackendOutput {
        let info = match Validator::new(ValidationFlags::all(), Capabilities::all()).validate(module)
        {
            Ok(info) => info,
            Err(error) => return BackendOutput::failed(render_error_chain(error.as_inner())),
        };

        let options = spv::Options {
            lang_version: self.spv_version,
            ..spv::Options::default()
        };
        match spv::write_vec(module, &info, &options, None) {
            Ok(words) => BackendOutput::succeeded(words),
            Err(error) => BackendOutput::failed(render_error_chain(&error)),
        }
    }
}

impl Default for NagaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NagaBackend {
    fn compile(&self, source: &str, kind: ShaderKind, entry_point: &str) -> BackendOutput {
        // A blank translation unit is a module without entry points.
        if source.trim().is_empty() {
            return self.emit(&naga::Module::default());
        }

        let (text, injected_lines) = self.prepare(source);
        let mut frontend = glsl::Frontend::default();
        let mut module = match frontend.parse(&glsl::Options::from(kind.stage()), &text) {
            Ok(module) => module,
            Err(errors) => {
                return BackendOutput::failed(render_parse_errors(&errors, &text, injected_lines));
            }
        };

        let name = if entry_point.is_empty() {
            DEFAULT_ENTRY_POINT
        } else {
            entry_point
        };
        for ep in module.entry_points.iter_mut() {
            ep.name = name.to_string();
        }
        if kind == ShaderKind::Vertex {
            default_vertex_position(&mut module);
        }

        self.emit(&module)
    }
}

fn has_version_directive(source: &str) -> bool {
    source.lines().any(|line| {
        line.trim_start()
            .strip_prefix('#')
            .is_some_and(|rest| rest.trim_start().starts_with("version"))
    })
}

/// Gives vertex entry points that never write `gl_Position` a zero position
/// output so the module passes interface validation.
///
/// The frontend returns outputs as one struct, so the position is either the
/// whole result (no other outputs) or an extra member of that struct.
fn default_vertex_position(module: &mut naga::Module) {
    let missing: Vec<usize> = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| {
            ep.stage == naga::ShaderStage::Vertex
                && !has_position_output(&module.types, ep.function.result.as_ref())
        })
        .map(|(index, _)| index)
        .collect();
    if missing.is_empty() {
        return;
    }

    let vec4 = module.types.insert(
        naga::Type {
            name: None,
            inner: naga::TypeInner::Vector {
                size: naga::VectorSize::Quad,
                scalar: naga::Scalar::F32,
            },
        },
        naga::Span::UNDEFINED,
    );

    for index in missing {
        let function = &mut module.entry_points[index].function;
        if function.result.is_some() {
            append_position_member(&mut module.types, function, vec4);
        } else {
            add_position_result(function, vec4);
        }
    }
}

fn is_position(binding: Option<&naga::Binding>) -> bool {
    matches!(
        binding,
        Some(naga::Binding::BuiltIn(naga::BuiltIn::Position { .. }))
    )
}

fn has_position_output(
    types: &naga::UniqueArena<naga::Type>,
    result: Option<&naga::FunctionResult>,
) -> bool {
    let Some(result) = result else {
        return false;
    };
    if is_position(result.binding.as_ref()) {
        return true;
    }
    match &types[result.ty].inner {
        naga::TypeInner::Struct { members, .. } => {
            members.iter().any(|member| is_position(member.binding.as_ref()))
        }
        _ => false,
    }
}

fn position_binding() -> Option<naga::Binding> {
    Some(naga::Binding::BuiltIn(naga::BuiltIn::Position {
        invariant: false,
    }))
}

/// Output-free entry point: the result becomes a bare zero position.
fn add_position_result(function: &mut naga::Function, vec4: naga::Handle<naga::Type>) {
    let zero = function
        .expressions
        .append(naga::Expression::ZeroValue(vec4), naga::Span::UNDEFINED);
    function.result = Some(naga::FunctionResult {
        ty: vec4,
        binding: position_binding(),
    });

    for statement in function.body.iter_mut() {
        if let naga::Statement::Return { value } = statement {
            value.get_or_insert(zero);
        }
    }
    if !matches!(function.body.last(), Some(naga::Statement::Return { .. })) {
        function.body.push(
            naga::Statement::Return { value: Some(zero) },
            naga::Span::UNDEFINED,
        );
    }
}

/// Struct-returning entry point: the struct gains a trailing zero position
/// member and every `Return` of a composed struct is recomposed with it.
fn append_position_member(
    types: &mut naga::UniqueArena<naga::Type>,
    function: &mut naga::Function,
    vec4: naga::Handle<naga::Type>,
) {
    let Some(old_ty) = function.result.as_ref().map(|result| result.ty) else {
        return;
    };
    let naga::TypeInner::Struct { members, span } = &types[old_ty].inner else {
        return;
    };

    let mut members = members.clone();
    members.push(naga::StructMember {
        name: Some("gl_Position".to_string()),
        ty: vec4,
        binding: position_binding(),
        offset: *span,
    });
    let span = *span + 16;
    let new_ty = types.insert(
        naga::Type {
            name: None,
            inner: naga::TypeInner::Struct { members, span },
        },
        naga::Span::UNDEFINED,
    );
    if let Some(result) = function.result.as_mut() {
        result.ty = new_ty;
    }

    // Operands must precede their users, so the zero and the new composite
    // are appended rather than patched into the old composite.
    let zero = function
        .expressions
        .append(naga::Expression::ZeroValue(vec4), naga::Span::UNDEFINED);
    let mut body = naga::Block::with_capacity(function.body.len() + 1);
    for (statement, statement_span) in std::mem::take(&mut function.body).span_into_iter() {
        let components = match statement {
            naga::Statement::Return { value: Some(value) } => match &function.expressions[value] {
                naga::Expression::Compose { ty, components } if *ty == old_ty => {
                    Some(components.clone())
                }
                _ => None,
            },
            _ => None,
        };
        let Some(mut components) = components else {
            body.push(statement, statement_span);
            continue;
        };

        components.push(zero);
        let len = function.expressions.len();
        let compose = function.expressions.append(
            naga::Expression::Compose {
                ty: new_ty,
                components,
            },
            statement_span,
        );
        body.push(
            naga::Statement::Emit(function.expressions.range_from(len)),
            statement_span,
        );
        body.push(
            naga::Statement::Return {
                value: Some(compose),
            },
            statement_span,
        );
    }
    function.body = body;
}

/// Formats frontend errors as `line:column: error: message`, with line
/// numbers relative to the caller's source.
fn render_parse_errors(errors: &glsl::ParseErrors, text: &str, injected_lines: u32) -> String {
    let mut out = String::new();
    for error in &errors.errors {
        let location = error.meta.location(text);
        let _ = writeln!(
            out,
            "{}:{}: error: {}",
            location.line_number.saturating_sub(injected_lines),
            location.line_position,
            error.kind
        );
    }
    out
}

fn render_error_chain(error: &dyn std::error::Error) -> String {
    let mut out = format!("error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, ": {cause}");
        source = cause.source();
    }
    out.push('\n');
    out
}
