use super::*;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::pool::PoolRef;

fn module(source: &str, name: &str, file_id: u16, is_main: bool) -> SourceModule {
    let (tokens, lex_diags) = Lexer::new(source, file_id).tokenize();
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let parsed = match Parser::new(tokens).parse_file() {
        Ok(parsed) => parsed,
        Err(diags) => panic!("parse errors: {:?}", diags),
    };
    SourceModule {
        name: name.to_string(),
        file_id,
        module: parsed.module,
        is_main,
    }
}

fn build_at(source: &str, version: u8) -> (Option<Program>, Vec<Diagnostic>) {
    build_program(&[module(source, "main", 0, true)], version)
}

fn build_ok(source: &str) -> Program {
    let (program, diags) = build_at(source, 5);
    assert!(diags.is_empty(), "unexpected errors: {:?}", messages(&diags));
    match program {
        Some(p) => p,
        None => panic!("no program"),
    }
}

fn errors(source: &str) -> Vec<String> {
    errors_at(source, 5)
}

fn errors_at(source: &str, version: u8) -> Vec<String> {
    let (_, diags) = build_at(source, version);
    assert!(!diags.is_empty(), "expected errors for: {}", source);
    messages(&diags)
}

fn messages(diags: &[Diagnostic]) -> Vec<String> {
    diags.iter().map(|d| d.message.clone()).collect()
}

fn has(errors: &[String], needle: &str) -> bool {
    errors.iter().any(|e| e.contains(needle))
}

fn entry_body(program: &Program) -> &Block {
    &program.function(program.entry).body
}

fn logic(body: &str) -> String {
    format!("function logic(txn, gtxn, args) {{ {} }}", body)
}

fn slot_of(program: &Program, scope: ScopeId, name: &str) -> u8 {
    match program.scopes.lookup(scope, name).map(|s| s.kind) {
        Some(SymbolKind::Variable { slot }) => slot,
        other => panic!("'{}' is not a variable: {:?}", name, other),
    }
}

#[test]
fn test_minimal_program() {
    let program = build_ok(&logic("return 1;"));
    assert_eq!(program.functions.len(), 1);
    let entry = program.function(program.entry);
    assert!(entry.is_entry);
    assert_eq!(entry.return_ty, Ty::Integer);
    assert_eq!(entry.body.stmts.len(), 1);
}

#[test]
fn test_missing_entry() {
    let (program, diags) = build_at("let a = 1;", 5);
    assert!(program.is_none());
    assert!(has(&messages(&diags), "missing entry point"));
}

#[test]
fn test_malformed_entry() {
    let errs = errors("inline function logic(txn, gtxn) { return 1; }");
    assert!(has(&errs, "cannot be inline"));
    assert!(has(&errs, "exactly 3 parameters, found 2"));

    let errs = errors("function logic(txn: int, gtxn, args) { return 1; }");
    assert!(has(&errs, "cannot have a type annotation"));
}

#[test]
fn test_entry_in_imported_module_rejected() {
    let lib = module("function logic(txn, gtxn, args) { return 1; }", "lib", 1, false);
    let main = module("let a = 1;", "main", 0, true);
    let (program, diags) = build_program(&[lib, main], 5);
    assert!(program.is_none());
    let errs = messages(&diags);
    assert!(has(&errs, "must be defined in the main file"));
    assert!(has(&errs, "missing entry point"));
}

#[test]
fn test_entry_not_callable() {
    let src = format!(
        "{} function f() {{ return logic(1, 2, 3); }}",
        logic("return 1;")
    );
    assert!(has(&errors(&src), "entry point 'logic' cannot be called"));
}

#[test]
fn test_undefined_identifier() {
    let errs = errors(&logic("let a = b + 1; return 1;"));
    assert_eq!(errs, vec!["identifier 'b' not defined"]);
}

#[test]
fn test_failed_node_is_left_out() {
    let (program, diags) = build_at(&logic("let a = 1; a = nope; return 1;"), 5);
    assert_eq!(diags.len(), 1);
    let program = program.unwrap();
    let body = entry_body(&program);
    // The declaration and the return survive; the broken assignment does not.
    assert_eq!(body.stmts.len(), 2);
    assert!(matches!(body.stmts[1].node, Stmt::Return(_)));
}

#[test]
fn test_errors_are_collected() {
    let errs = errors(&logic("let a = x; let b = y; c = 1; return z;"));
    assert!(errs.len() >= 4, "{:?}", errs);
}

#[test]
fn test_assign_to_constant_and_function_rejected() {
    let src = format!(
        "const c = 1; function f() {{ return 1; }} {}",
        logic("c = 2; f = 3; return 1;")
    );
    let errs = errors(&src);
    assert!(has(&errs, "cannot assign to constant 'c'"));
    assert!(has(&errs, "cannot assign to function 'f'"));
}

#[test]
fn test_assign_to_runtime_rejected() {
    let errs = errors(&logic("txn = 1; return 1;"));
    assert!(has(&errs, "cannot assign to runtime pseudo-variable 'txn'"));
}

#[test]
fn test_call_non_function() {
    let errs = errors(&logic("let a = 1; let b = a(2); return 1;"));
    assert!(has(&errs, "'a' is a variable, not a function"));
}

#[test]
fn test_function_used_as_value() {
    let src = format!("function f() {{ return 1; }} {}", logic("let a = f; return 1;"));
    assert!(has(&errors(&src), "function 'f' used as a value"));
}

#[test]
fn test_internal_builtin_not_callable() {
    let errs = errors(&logic("let s = substring3(\"abc\", 0, 1); return 1;"));
    assert!(has(&errs, "internal opcode"));
}

#[test]
fn test_builtin_argument_count() {
    let errs = errors(&logic("let h = sha256(\"a\", \"b\"); return 1;"));
    assert!(has(&errs, "builtin 'sha256' expects 1 argument, found 2"));
}

#[test]
fn test_user_call_argument_count() {
    let src = format!(
        "function add(a, b) {{ return a + b; }} {}",
        logic("return add(1);")
    );
    assert!(has(&errors(&src), "function 'add' expects 2 arguments, found 1"));
}

#[test]
fn test_no_recursion() {
    let src = format!("function f(n) {{ return f(n); }} {}", logic("return 1;"));
    assert!(has(&errors(&src), "identifier 'f' not defined"));
}

#[test]
fn test_builtin_name_cannot_be_function() {
    let src = format!("function sha256(x) {{ return 1; }} {}", logic("return 1;"));
    assert!(has(&errors(&src), "'sha256' is a builtin"));
}

#[test]
fn test_break_outside_loop() {
    let errs = errors(&logic("break; return 1;"));
    assert_eq!(errs, vec!["break outside of a loop"]);

    let errs = errors(&logic("let a = 1; if a == 1 { break; } return 1;"));
    assert_eq!(errs, vec!["break outside of a loop"]);
}

#[test]
fn test_break_inside_loop() {
    let program = build_ok(&logic(
        "let i = 0; for i < 10 { if i == 5 { break; } i = i + 1; } return i;",
    ));
    assert_eq!(entry_body(&program).stmts.len(), 3);
}

#[test]
fn test_break_after_nested_loop() {
    build_ok(&logic(
        "let i = 0; for i < 3 { for 1 { break; } break; } return i;",
    ));
}

#[test]
fn test_loop_depth_does_not_leak_into_functions() {
    let src = format!("function f() {{ break; return 1; }} {}", logic("return 1;"));
    assert!(has(&errors(&src), "break outside of a loop"));
}

#[test]
fn test_literal_dedup() {
    let program = build_ok(&logic("let a = 7; let b = 7; let s = \"x\"; let t = \"x\"; return a;"));
    assert_eq!(program.pool.ints(), &[0, 1, 7]);
    assert_eq!(program.pool.bytes().len(), 1);
}

#[test]
fn test_slots_unique_across_scopes() {
    let program = build_ok(&logic(
        "let a = 1; if a == 1 { let b = 2; } else { let c = 3; } for a < 2 { let d = 4; a = d; } return a;",
    ));
    assert_eq!(program.scopes.slots_used(), 4);
}

#[test]
fn test_let_initializer_sees_outer_binding() {
    let program = build_ok(&logic("let x = 1; if x == 1 { let x = x + 1; } return x;"));
    let body = entry_body(&program);
    let Stmt::VarDecl { scope: outer, .. } = &body.stmts[0].node else {
        panic!("expected declaration");
    };
    let Stmt::If { then_block, .. } = &body.stmts[1].node else {
        panic!("expected if");
    };
    let Stmt::VarDecl { scope: inner, value, .. } = &then_block.stmts[0].node else {
        panic!("expected declaration");
    };
    assert_eq!(slot_of(&program, *outer, "x"), 0);
    assert_eq!(slot_of(&program, *inner, "x"), 1);
    // The initializer resolves `x` in the scope before the new binding.
    let Expr::Binary { lhs, .. } = &value.node else {
        panic!("expected binary");
    };
    let Expr::Ident { scope, .. } = &lhs.node else {
        panic!("expected ident");
    };
    assert_eq!(slot_of(&program, *scope, "x"), 0);
}

#[test]
fn test_same_block_redeclaration_rejected() {
    let errs = errors(&logic("let a = 1; let a = 2; return a;"));
    assert!(has(&errs, "'a' is already declared in this scope"));
}

#[test]
fn test_constant_shadowing_rejected() {
    let errs = errors(&format!("const c = 1; {}", logic("if 1 { let c = 2; } return 1;")));
    assert!(has(&errs, "'c' is a constant and cannot be redeclared"));
}

#[test]
fn test_runtime_names_cannot_be_redeclared() {
    let errs = errors(&format!("let global = 1; {}", logic("return 1;")));
    assert!(has(&errs, "'global' is a runtime pseudo-variable"));
}

#[test]
fn test_constant_declaration() {
    let program = build_ok(&format!("const k = 9; const j = k; {}", logic("return j;")));
    let sym = program.scopes.lookup(program.function(program.entry).scope, "j").unwrap();
    assert_eq!(sym.kind, SymbolKind::Constant(PoolRef::Int(2)));
    assert_eq!(sym.ty, Ty::Integer);
    assert_eq!(program.scopes.slots_used(), 0);
}

#[test]
fn test_constant_requires_literal() {
    let errs = errors(&logic("let a = 1; const c = a + 1; return 1;"));
    assert!(has(&errs, "must be initialized with a literal or another constant"));
}

#[test]
fn test_tuple_declaration() {
    let program = build_ok(&logic("let carry, sum = addw(10, 20); return sum;"));
    let Stmt::VarDecl { scope, names, .. } = &entry_body(&program).stmts[0].node else {
        panic!("expected declaration");
    };
    assert_eq!(names.len(), 2);
    assert_eq!(slot_of(&program, *scope, "carry"), 0);
    assert_eq!(slot_of(&program, *scope, "sum"), 1);
}

#[test]
fn test_tuple_count_mismatch() {
    let errs = errors(&logic("let a, b = 1; return 1;"));
    assert!(has(&errs, "expression produces 1 value but 2 names are given"));

    let errs = errors(&logic("let a = addw(1, 2); return 1;"));
    assert!(has(&errs, "expression produces 2 values but 1 name is given"));

    let errs = errors(&logic("let a, b, c = divmodw(1, 2, 3, 4); return 1;"));
    assert!(has(&errs, "a declaration binds 1, 2 or 4 names, found 3"));
}

#[test]
fn test_substring_folds_constant_indices() {
    let program = build_ok(&logic("let s = substring(\"hello\", 1, 3); return len(s);"));
    let Stmt::VarDecl { value, .. } = &entry_body(&program).stmts[0].node else {
        panic!("expected declaration");
    };
    let Expr::Builtin(call) = &value.node else {
        panic!("expected builtin");
    };
    assert_eq!(call.op, "substring");
    assert_eq!(call.immediates, vec!["1", "3"]);
    assert_eq!(call.args.len(), 1);
}

#[test]
fn test_substring_with_constant_names() {
    let program = build_ok(&format!(
        "const lo = 0; const hi = 2; {}",
        logic("let s = substring(\"hello\", lo, hi); return len(s);")
    ));
    let Stmt::VarDecl { value, .. } = &entry_body(&program).stmts[0].node else {
        panic!("expected declaration");
    };
    let Expr::Builtin(call) = &value.node else {
        panic!("expected builtin");
    };
    assert_eq!(call.immediates, vec!["0", "2"]);
}

#[test]
fn test_substring_dynamic() {
    let program = build_ok(&logic("let i = 1; let s = substring(\"hello\", i, 3); return len(s);"));
    let Stmt::VarDecl { value, .. } = &entry_body(&program).stmts[1].node else {
        panic!("expected declaration");
    };
    let Expr::Builtin(call) = &value.node else {
        panic!("expected builtin");
    };
    assert_eq!(call.op, "substring3");
    assert_eq!(call.args.len(), 3);
}

#[test]
fn test_asset_field_argument() {
    let program = build_ok(&logic(
        "let name, ok = asset_params_get(AssetName, 5); return ok;",
    ));
    let Stmt::VarDecl { scope, .. } = &entry_body(&program).stmts[0].node else {
        panic!("expected declaration");
    };
    assert_eq!(program.scopes.lookup(*scope, "name").unwrap().ty, Ty::Bytes);

    let errs = errors(&logic("let v, ok = asset_params_get(1, 5); return ok;"));
    assert!(has(&errs, "argument 1 of 'asset_params_get' must be a field name"));
}

#[test]
fn test_field_access_forms() {
    let program = build_ok(&logic(
        "let a = txn.Sender; let b = gtxn[1].Amount; let c = txn.Accounts[0]; \
         let d = global.GroupSize; let e = args[0]; let i = 1; let f = gtxn[i].Fee; return 1;",
    ));
    let body = entry_body(&program);
    let value = move |i: usize| match &body.stmts[i].node {
        Stmt::VarDecl { value, .. } => &value.node,
        other => panic!("expected declaration, got {:?}", other),
    };
    assert!(matches!(value(0), Expr::Field(FieldAccess { source: FieldSource::Txn, index: None, .. })));
    assert!(matches!(
        value(1),
        Expr::Field(FieldAccess { source: FieldSource::Gtxn(Index::Const(1)), .. })
    ));
    assert!(matches!(value(2), Expr::Field(FieldAccess { index: Some(Index::Const(0)), .. })));
    assert!(matches!(value(3), Expr::Field(FieldAccess { source: FieldSource::Global, .. })));
    assert!(matches!(value(4), Expr::Arg(Index::Const(0))));
    assert!(matches!(
        value(6),
        Expr::Field(FieldAccess { source: FieldSource::Gtxn(Index::Dynamic(_)), .. })
    ));
}

#[test]
fn test_field_errors() {
    let errs = errors(&logic("let a = txn.Bogus; return 1;"));
    assert!(has(&errs, "unknown field 'Bogus' for 'txn'"));

    let errs = errors(&logic("let a = txn.Accounts; return 1;"));
    assert!(has(&errs, "is an array and needs an index"));

    let errs = errors(&logic("let a = txn.Fee[0]; return 1;"));
    assert!(has(&errs, "field 'Fee' is not an array"));

    let errs = errors(&logic("let a = gtxn.Fee; return 1;"));
    assert!(has(&errs, "'gtxn' needs a transaction index"));

    let errs = errors(&logic("let a = txn; return 1;"));
    assert!(has(&errs, "'txn' cannot be used as a value"));

    let errs = errors(&logic("let x = 1; let a = x.Fee; return 1;"));
    assert!(has(&errs, "'x' has no fields"));
}

#[test]
fn test_version_gating() {
    let errs = errors_at(&logic("let a = txn.NumLogs; return 1;"), 4);
    assert!(has(&errs, "field 'NumLogs' requires version 5 (target is 4)"));

    let errs = errors_at(&logic("let i = 0; let a = txn.Accounts[i]; return 1;"), 4);
    assert!(has(&errs, "dynamic array index requires version 5"));

    let errs = errors_at(&logic("let a = bzero(4); return 1;"), 3);
    assert!(has(&errs, "builtin 'bzero' requires version 4"));

    let src = format!("function f() {{ return 1; }} {}", logic("return f();"));
    assert!(has(&errors_at(&src, 3), "subroutine 'f' requires version 4"));

    let errs = errors_at(&logic("itxn.begin(); return 1;"), 4);
    assert!(has(&errs, "inner transactions requires version 5"));
}

#[test]
fn test_inner_transaction_statements() {
    let program = build_ok(&logic(
        "itxn.begin(); itxn.Amount = 5; itxn.Receiver = txn.Sender; itxn.submit(); return 1;",
    ));
    let body = entry_body(&program);
    assert!(matches!(body.stmts[0].node, Stmt::InnerBegin));
    assert!(matches!(&body.stmts[1].node, Stmt::AssignField { field, .. } if field.name == "Amount"));
    assert!(matches!(body.stmts[3].node, Stmt::InnerSubmit));
}

#[test]
fn test_inner_transaction_errors() {
    let errs = errors(&logic("itxn.TxID = 1; return 1;"));
    assert!(has(&errs, "field 'TxID' cannot be set"));

    let errs = errors(&logic("txn.Amount = 1; return 1;"));
    assert!(has(&errs, "cannot assign to field of 'txn'"));

    let errs = errors(&logic("let a = itxn.begin(); return 1;"));
    assert!(has(&errs, "must be used as a statement"));

    let errs = errors(&logic("itxn.launch(); return 1;"));
    assert!(has(&errs, "unknown method 'launch' on 'itxn'"));

    let errs = errors(&logic("let a = 1; a, itxn.Fee = addw(1, 2); return 1;"));
    assert!(has(&errs, "cannot be set as part of a multi-value assignment"));
}

#[test]
fn test_labels_are_monotonic() {
    let program = build_ok(&logic(
        "let a = if 1 {2} else {3}; if a == 2 { a = 1; } for a < 5 { a = a + 1; } return a;",
    ));
    let body = entry_body(&program);
    let mut labels = Vec::new();
    for stmt in &body.stmts {
        match &stmt.node {
            Stmt::VarDecl { value, .. } => {
                if let Expr::If { label, .. } = &value.node {
                    labels.push(*label);
                }
            }
            Stmt::If { label, .. } | Stmt::For { label, .. } => labels.push(*label),
            _ => {}
        }
    }
    assert_eq!(labels, vec![0, 1, 2]);
}

#[test]
fn test_function_return_type_from_first_return() {
    let src = format!(
        "function f(x: byte) {{ return len(x); }} function g(b: byte) {{ if 1 {{ return b; }} return b; }} {}",
        logic("return f(\"a\");")
    );
    let program = build_ok(&src);
    assert_eq!(program.functions[0].return_ty, Ty::Integer);
    assert_eq!(program.functions[0].param_tys, vec![Ty::Bytes]);
    assert_eq!(program.functions[1].return_ty, Ty::Bytes);
}

#[test]
fn test_cast() {
    let program = build_ok(&logic("let v = toint(app_global_get(\"k\")); return v;"));
    let Stmt::VarDecl { scope, .. } = &entry_body(&program).stmts[0].node else {
        panic!("expected declaration");
    };
    assert_eq!(program.scopes.lookup(*scope, "v").unwrap().ty, Ty::Integer);

    let errs = errors(&logic("let v = toint(1, 2); return 1;"));
    assert!(has(&errs, "'toint' expects 1 argument, found 2"));
}
