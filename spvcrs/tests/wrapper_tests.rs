//! Integration tests for the owning wrappers

use pretty_assertions::assert_eq;
use spvcrs::*;
use std::fs;
use std::thread;
use tempfile::tempdir;

const MINIMAL_SHADER: &str = "void main(){}";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_minimal(module: &SpvModule) {
    assert!(module.is_valid());
    assert!(module.success(), "Compile failed: {}", module.error_message());
    assert!(module.len() >= 20, "SPIR-V should hold at least a header");
    assert!(module.has_spirv_magic());
    assert_eq!(module.error_message(), "");
}

#[test]
fn test_multiple_calls() {
    init_logging();
    let compiler = Compiler::new();
    assert!(compiler.is_valid());

    for kind in [ShaderKind::Vertex, ShaderKind::Fragment] {
        let first = compiler.compile(MINIMAL_SHADER, kind);
        let second = compiler.compile(MINIMAL_SHADER, kind);
        assert_minimal(&first);
        assert_minimal(&second);
        assert_eq!(first.data(), second.data(), "Compilation should be deterministic");
    }
}

#[test]
fn test_multiple_threads_initializing() {
    init_logging();
    let compilers: Vec<Compiler> = thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(Compiler::new)).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for compiler in &compilers {
        assert!(compiler.is_valid());
        assert_minimal(&compiler.compile(MINIMAL_SHADER, ShaderKind::Vertex));
    }
}

#[test]
fn test_compiler_moves() {
    let mut compiler = Compiler::new();
    assert!(compiler.is_valid());

    let moved = compiler.take();
    assert!(!compiler.is_valid(), "Moved-from compiler should be invalid");
    assert!(moved.is_valid());

    let module = compiler.compile(MINIMAL_SHADER, ShaderKind::Vertex);
    assert!(!module.is_valid());
    assert!(!module.success());
    assert!(module.is_empty());

    assert_minimal(&moved.compile(MINIMAL_SHADER, ShaderKind::Vertex));
}

#[test]
fn test_module_moves() {
    let compiler = Compiler::new();
    let mut module = compiler.compile(MINIMAL_SHADER, ShaderKind::Fragment);
    assert_minimal(&module);
    let bytes = module.data().to_vec();

    let mut moved = module.take();
    assert!(!module.is_valid(), "Moved-from module should be null");
    assert!(!module.success());
    assert_eq!(module.len(), 0);
    assert_eq!(moved.data(), bytes.as_slice());

    let last = std::mem::take(&mut moved);
    assert!(!moved.is_valid());
    assert_eq!(last.data(), bytes.as_slice());
}

#[test]
fn test_empty_string() {
    let compiler = Compiler::new();
    for kind in [ShaderKind::Vertex, ShaderKind::Fragment] {
        let module = compiler.compile("", kind);
        assert!(module.success(), "Empty {kind} source should compile");
        assert!(module.has_spirv_magic());
    }
}

#[test]
fn test_garbage_string() {
    let compiler = Compiler::new();
    for kind in [ShaderKind::Vertex, ShaderKind::Fragment] {
        let module = compiler.compile("jfalkds", kind);
        assert!(module.is_valid());
        assert!(!module.success());
        assert!(module.is_empty());
        assert!(!module.error_message().is_empty());
    }
}

#[test]
fn test_str_and_cstr_agree() {
    let compiler = Compiler::new();
    let from_str = compiler.compile(MINIMAL_SHADER, ShaderKind::Vertex);
    let from_cstr = compiler.compile_cstr(c"void main(){}", ShaderKind::Vertex);
    assert_minimal(&from_cstr);
    assert_eq!(from_str.data(), from_cstr.data());
}

#[test]
fn test_errors_reported() {
    let compiler = Compiler::new();
    let module = compiler.compile("int f(){return wrongname;}", ShaderKind::Vertex);
    assert!(!module.success());
    assert!(module.is_empty());
    assert!(
        module.error_message().contains("wrongname"),
        "Error should mention the identifier: {}",
        module.error_message()
    );

    let err = module.into_result().unwrap_err();
    assert!(matches!(err, Error::Compilation { message } if !message.is_empty()));
}

#[test]
fn test_multiple_threads_calling() {
    init_logging();
    let compiler = Compiler::new();
    let reference = compiler.compile(MINIMAL_SHADER, ShaderKind::Fragment);
    assert_minimal(&reference);

    thread::scope(|s| {
        for _ in 0..10 {
            s.spawn(|| {
                let module = compiler.compile(MINIMAL_SHADER, ShaderKind::Fragment);
                assert_minimal(&module);
                assert_eq!(module.data(), reference.data());
            });
        }
    });
}

#[test]
fn test_modules_outlive_compiler() {
    let module = {
        let compiler = Compiler::new();
        compiler.compile(MINIMAL_SHADER, ShaderKind::Vertex)
    };
    assert_minimal(&module);
}

#[test]
fn test_null_module() {
    let module = SpvModule::default();
    assert!(!module.success());
    assert_eq!(module.len(), 0);
    assert_eq!(module.error_message(), "");
    assert!(module.is_empty());
}

#[test]
fn test_file_finder_search_order() {
    let dir = tempdir().unwrap();
    let shaders = dir.path().join("shaders");
    fs::create_dir_all(&shaders).unwrap();
    fs::write(shaders.join("a.glsl"), MINIMAL_SHADER).unwrap();
    fs::write(dir.path().join("b.glsl"), MINIMAL_SHADER).unwrap();

    let root = dir.path().to_str().unwrap();
    let finder = FileFinder::from_iter([format!("{root}/"), format!("{root}/shaders/")]);

    assert_eq!(
        finder.find_readable_path("a.glsl"),
        Some(format!("{root}/shaders/a.glsl"))
    );
    assert_eq!(finder.find_readable_path("b.glsl"), Some(format!("{root}/b.glsl")));
    assert_eq!(finder.find_readable_path("c.glsl"), None);
}

#[test]
fn test_compile_with_search_path_includes() {
    let dir = tempdir().unwrap();
    let include_dir = dir.path().join("include");
    fs::create_dir_all(&include_dir).unwrap();
    fs::write(
        include_dir.join("color.glsl"),
        "#include \"scale.glsl\"\nvec4 tint() { return vec4(scale); }\n",
    )
    .unwrap();
    fs::write(include_dir.join("scale.glsl"), "const float scale = 0.5;\n").unwrap();

    let finder = FileFinder::new().with_prefix(include_dir.to_str().unwrap());
    let mut includes = SearchPathInclude::new(finder);
    let source = "#version 450\n\
                  #include <color.glsl>\n\
                  layout(location = 0) out vec4 frag_color;\n\
                  void main() { frag_color = tint(); }\n";

    let compiler = Compiler::new();
    let module = CompileBuilder::new(&compiler, source, ShaderKind::Fragment)
        .include_handler(&mut includes)
        .compile()
        .unwrap();
    assert_minimal(&module);
}

#[test]
fn test_custom_entry_point_name() {
    let compiler = Compiler::new();
    let module = CompileBuilder::new(&compiler, MINIMAL_SHADER, ShaderKind::Vertex)
        .entry_point("vs_main")
        .compile()
        .unwrap();
    assert_minimal(&module);
    assert!(
        module.windows(8).any(|w| w == b"vs_main\0"),
        "Entry point name should appear in the module"
    );
}

#[test]
fn test_custom_backend() {
    let backend = NagaBackend::new().spv_version(1, 3);
    let compiler = Compiler::with_backend(std::sync::Arc::new(backend));
    let module = compiler.compile(MINIMAL_SHADER, ShaderKind::Fragment);
    assert_minimal(&module);
    assert_eq!(module.words()[1], 0x0001_0300, "Header should carry SPIR-V 1.3");
}
