use std::fs;

use tealang::project::Project;
use tealang::resolve::MemoryProvider;
use tealang::{compile, compile_file, CompileOptions, Compiler};

fn compile_ok(source: &str) -> String {
    compile(source, "main.tl").unwrap_or_else(|errs| {
        panic!(
            "should compile, got {} errors: {:?}",
            errs.len(),
            errs.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
    })
}

#[test]
fn test_globals_then_entry() {
    let asm = compile_ok(
        r#"let a = 1; let b = "123"; function logic(txn, gtxn, args) {a = 5; return 6;}"#,
    );
    insta::assert_snapshot!(asm.trim_end(), @r"
    #pragma version 5
    intcblock 0 1 5 6
    bytecblock 0x313233
    intc_1
    store 0
    bytec_0
    store 1
    intc_2
    store 0
    intc_3
    return
    end_main:
    ");
}

#[test]
fn test_subroutine_call() {
    let asm = compile_ok(
        "function double(x) { return x * 2; }\n\
         function logic(txn, gtxn, args) { return double(txn.Amount) > 10; }",
    );
    insta::assert_snapshot!(asm.trim_end(), @r"
    #pragma version 5
    intcblock 0 1 2 10
    b end_double
    fun_double:
    load 0
    intc_2
    *
    retsub
    end_double:
    txn Amount
    store 0
    callsub fun_double
    intc_3
    >
    return
    end_main:
    ");
}

#[test]
fn test_stdlib_inline_max() {
    let provider = MemoryProvider::new();
    let compilation = Compiler::new(CompileOptions::default(), &provider).compile(
        "import stdlib.math;\n\
         function logic(txn, gtxn, args) { return max(txn.Fee, 1000) == 1000; }",
        "main.tl",
    );
    let asm = compilation.into_result().unwrap();
    insta::assert_snapshot!(asm.trim_end(), @r"
    #pragma version 5
    intcblock 0 1 1000
    txn Fee
    intc_2
    store 3
    store 2
    load 2
    load 3
    >
    bz if_end_1_2
    load 2
    b inline_max_end_2
    if_end_1_2:
    load 3
    b inline_max_end_2
    inline_max_end_2:
    intc_2
    ==
    return
    end_main:
    ");
}

#[test]
fn test_recompile_is_identical() {
    let source = "inline function pick(c) { return if c > 1 { c } else { 1 }; }\n\
                  function logic(txn, gtxn, args) {\n\
                      let i = 0;\n\
                      for i < 3 { if gtxn[i].Amount > 0 { break; } i = i + 1; }\n\
                      return pick(i) + pick(2);\n\
                  }";
    assert_eq!(compile_ok(source), compile_ok(source));
}

#[test]
fn test_project_settings_apply() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("tealang.toml"),
        "[project]\nname = \"escrow\"\nentry = \"escrow.tl\"\nversion = 3\n\n[modules]\npaths = [\"shared\"]\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("shared")).unwrap();
    fs::write(dir.path().join("shared/limits.tl"), "const MaxFee = 2000;").unwrap();
    fs::write(
        dir.path().join("escrow.tl"),
        "import \"limits\";\nfunction logic(txn, gtxn, args) { return txn.Fee <= MaxFee; }",
    )
    .unwrap();

    let toml_path = Project::find(dir.path()).unwrap();
    let project = Project::load(&toml_path).unwrap();
    let options = CompileOptions::default().with_project(&project);
    let entry = project.entry.clone().unwrap();
    let compilation = compile_file(&entry, &options).unwrap();
    let asm = compilation.into_result().unwrap();
    assert!(asm.starts_with("#pragma version 3\nintcblock 0 1 2000\n"));
}

#[test]
fn test_version_gate_reported_with_position() {
    let options = CompileOptions {
        version: 2,
        ..CompileOptions::default()
    };
    let provider = MemoryProvider::new();
    let source = "function f() { return 1; }\nfunction logic(txn, gtxn, args) { return f(); }";
    let compilation = Compiler::new(options, &provider).compile(source, "main.tl");
    let errors = compilation.errors();
    assert_eq!(errors.len(), 1);
    let text = errors[0].render_plain(&compilation.sources);
    assert!(
        text.starts_with("main.tl:1:10: semantic error: subroutine 'f' requires version 4 (target is 2)"),
        "{}",
        text
    );
}

#[test]
fn test_missing_import_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.tl");
    fs::write(
        &main,
        "import lib.absent;\nfunction logic(txn, gtxn, args) { return 1; }",
    )
    .unwrap();
    let errors = compile_file(&main, &CompileOptions::default())
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(errors[0].message, "module 'lib/absent.tl' not found");
}
