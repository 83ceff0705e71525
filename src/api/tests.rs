use super::*;
use crate::config::resolve::MemoryProvider;
use crate::diagnostic::DiagnosticKind;

fn run(provider: &MemoryProvider, source: &str) -> Compilation {
    Compiler::new(CompileOptions::default(), provider).compile(source, "main.tl")
}

fn messages(compilation: &Compilation) -> Vec<String> {
    compilation
        .errors()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn test_compile_end_to_end() {
    let asm = compile(
        "let a = 1; let b = \"123\"; function logic(txn, gtxn, args) {a = 5; return 6;}",
        "main.tl",
    )
    .unwrap();
    assert!(asm.starts_with("#pragma version 5\nintcblock 0 1 5 6\nbytecblock 0x313233\n"));
    assert!(asm.ends_with("intc_3\nreturn\nend_main:\n"));
}

#[test]
fn test_type_error_produces_no_code() {
    let source = "let c = 1; let e = if c == 1 {1} else {\"1\"}; function logic(txn, gtxn, args) { return 1; }";
    let compilation = run(&MemoryProvider::new(), source);
    assert!(compilation.assembly.is_none());
    assert!(compilation.has_errors());
    assert!(messages(&compilation)[0].contains("if branches are integer and byte[]"));
}

#[test]
fn test_all_build_errors_reported_together() {
    let source = "function logic(txn, gtxn, args) { x = 1; break; return y; }";
    let errors: Vec<String> = compile(source, "main.tl")
        .unwrap_err()
        .into_iter()
        .map(|d| d.message)
        .collect();
    assert!(errors.contains(&"identifier 'x' not defined".to_string()), "{:?}", errors);
    assert!(errors.contains(&"break outside of a loop".to_string()), "{:?}", errors);
    assert!(errors.contains(&"identifier 'y' not defined".to_string()), "{:?}", errors);
}

#[test]
fn test_syntax_error_stops_before_build() {
    let errors = compile("function logic(txn, gtxn, args) { return 1 }", "main.tl").unwrap_err();
    assert!(errors.iter().all(|d| d.kind == DiagnosticKind::Syntax));
}

#[test]
fn test_ambiguity_is_a_warning() {
    let source = "function logic(txn, gtxn, args) { return 1 < 2 < 3; }";
    let compilation = run(&MemoryProvider::new(), source);
    assert!(compilation.assembly.is_some());
    assert_eq!(compilation.warnings().count(), 1);
    assert!(compilation.errors().is_empty());
}

#[test]
fn test_check_does_not_emit() {
    let provider = MemoryProvider::new();
    let compilation = Compiler::new(CompileOptions::default(), &provider)
        .check("function logic(txn, gtxn, args) { return 1; }", "main.tl");
    assert!(!compilation.has_errors());
    assert!(compilation.assembly.is_none());
}

#[test]
fn test_unsupported_version() {
    let provider = MemoryProvider::new();
    let options = CompileOptions {
        version: 7,
        ..CompileOptions::default()
    };
    let compilation =
        Compiler::new(options, &provider).compile("function logic(txn, gtxn, args) { return 1; }", "main.tl");
    assert_eq!(
        messages(&compilation),
        vec!["target version 7 is not supported (expected 2 to 5)"]
    );
}

#[test]
fn test_imported_module_is_included() {
    let provider = MemoryProvider::new().with_file(
        "lib/fees.tl",
        "const MinFee = 1000;\ninline function enough(fee) { return fee >= MinFee; }",
    );
    let source = "import lib.fees;\nfunction logic(txn, gtxn, args) { return enough(txn.Fee); }";
    let compilation = run(&provider, source);
    assert!(!compilation.has_errors(), "{:?}", messages(&compilation));
    let asm = compilation.assembly.unwrap();
    assert!(asm.contains("intcblock 0 1 1000"));
    assert!(asm.contains("txn Fee"));
    assert!(asm.contains("inline_enough_end_0:"));
    assert_eq!(compilation.sources.len(), 2);
}

#[test]
fn test_stdlib_math_and_const() {
    let source = "import stdlib.const;\nimport stdlib.math;\n\
                  function logic(txn, gtxn, args) {\n\
                      if txn.OnCompletion == OptIn { return 1; }\n\
                      return max(txn.Fee, 1000) == 1000;\n\
                  }";
    let compilation = run(&MemoryProvider::new(), source);
    assert!(!compilation.has_errors(), "{:?}", messages(&compilation));
    let asm = compilation.assembly.unwrap();
    assert!(!asm.contains("callsub"));
    assert!(asm.contains("txn OnCompletion"));
}

#[test]
fn test_entry_point_in_import_is_rejected() {
    let provider = MemoryProvider::new()
        .with_file("other.tl", "function logic(txn, gtxn, args) { return 1; }");
    let compilation = run(&provider, "import \"other\";");
    let errors = messages(&compilation);
    assert!(errors.iter().any(|e| e.contains("must be defined in the main file")), "{:?}", errors);
}

#[test]
fn test_import_cycle_fails() {
    let provider = MemoryProvider::new()
        .with_file("a.tl", "import \"b\";")
        .with_file("b.tl", "import \"a\";");
    let compilation = run(
        &provider,
        "import \"a\";\nfunction logic(txn, gtxn, args) { return 1; }",
    );
    assert!(compilation.assembly.is_none());
    assert_eq!(messages(&compilation), vec!["import cycle: a.tl -> b.tl -> a.tl"]);
}

#[test]
fn test_compile_file_reads_imports_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("util.tl"), "const Limit = 10;").unwrap();
    let main = dir.path().join("main.tl");
    std::fs::write(
        &main,
        "import \"util\";\nfunction logic(txn, gtxn, args) { return args[0] == itob(Limit); }",
    )
    .unwrap();
    let compilation = compile_file(&main, &CompileOptions::default()).unwrap();
    assert!(!compilation.has_errors(), "{:?}", messages(&compilation));
    assert!(compilation.assembly.unwrap().contains("arg_0"));
}
