//! Assembly emitter: a read-only walk that lowers a checked program to
//! stack-machine text, one instruction or label per line.
//!
//! Layout:
//!
//! ```text
//! #pragma version N
//! intcblock ... / bytecblock ...
//! <top-level declarations>
//! b end_f / fun_f: ... / end_f:      (each subroutine)
//! <entry body>
//! end_main:
//! ```

mod expr;
mod stmt;

use tracing::debug;

use crate::ast::*;
use crate::scope::{ScopeId, SymbolKind};
use crate::span::Spanned;

/// Label closing the entry body.
pub const END_MAIN: &str = "end_main";

/// How `return` leaves the code being emitted.
#[derive(Clone, Debug)]
pub(super) enum ReturnMode {
    /// Entry point: terminate the program.
    Program,
    /// Subroutine body: `retsub`.
    Subroutine,
    /// Inlined body: jump to the end label of this call site.
    Inline(String),
}

/// Lowering context threaded through the recursive walk.
#[derive(Clone, Debug)]
pub(super) struct Ctx {
    /// End labels of the enclosing loops, innermost last.
    pub(super) loop_ends: Vec<String>,
    pub(super) ret: ReturnMode,
    /// Appended to every label, unique per inlined call site.
    pub(super) suffix: String,
}

impl Ctx {
    fn new(ret: ReturnMode) -> Self {
        Self {
            loop_ends: Vec::new(),
            ret,
            suffix: String::new(),
        }
    }

    pub(super) fn label(&self, prefix: &str, id: u32) -> String {
        format!("{}_{}{}", prefix, id, self.suffix)
    }
}

pub struct Emitter<'a> {
    pub(super) program: &'a Program,
    output: Vec<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            output: Vec::new(),
        }
    }

    /// Emit the whole program.
    pub fn emit(mut self) -> String {
        let program = self.program;
        self.inst(&format!("#pragma version {}", program.version));
        for line in program.pool.preamble() {
            self.inst(&line);
        }

        let mut top = Ctx::new(ReturnMode::Program);
        for stmt in &program.globals {
            self.emit_stmt(&stmt.node, &mut top);
        }

        for func in &program.functions {
            if !func.inline && !func.is_entry {
                self.emit_subroutine(func);
            }
        }

        let entry = program.function(program.entry);
        let mut ctx = Ctx::new(ReturnMode::Program);
        self.emit_block(&entry.body, &mut ctx);
        self.emit_label(END_MAIN);

        debug!(lines = self.output.len(), "assembly emitted");
        let mut text = self.output.join("\n");
        text.push('\n');
        text
    }

    /// Subroutines sit inline in the program flow, so execution jumps over
    /// each body.
    fn emit_subroutine(&mut self, func: &FunctionDef) {
        let name = &func.name.node;
        let end = format!("end_{}", name);
        self.inst(&format!("b {}", end));
        self.emit_label(&format!("fun_{}", name));
        let mut ctx = Ctx::new(ReturnMode::Subroutine);
        self.emit_block(&func.body, &mut ctx);
        self.emit_label(&end);
    }

    pub(super) fn emit_block(&mut self, block: &Block, ctx: &mut Ctx) {
        for stmt in &block.stmts {
            self.emit_stmt(&stmt.node, ctx);
        }
    }

    /// Storage slot of a variable. A miss means the tree was not checked.
    pub(super) fn slot(&self, scope: ScopeId, name: &str) -> u8 {
        match self.program.scopes.lookup(scope, name).map(|s| s.kind) {
            Some(SymbolKind::Variable { slot }) => slot,
            other => panic!(
                "internal error: '{}' is not a variable in scope {}: {:?}",
                name, scope.0, other
            ),
        }
    }

    /// Store the values on top of the stack into `names`. The last name
    /// takes the topmost value.
    pub(super) fn store_all(&mut self, scope: ScopeId, names: &[Spanned<String>]) {
        for name in names.iter().rev() {
            let slot = self.slot(scope, &name.node);
            self.inst(&format!("store {}", slot));
        }
    }

    pub(super) fn inst(&mut self, instruction: &str) {
        self.output.push(instruction.to_string());
    }

    pub(super) fn emit_label(&mut self, label: &str) {
        self.output.push(format!("{}:", label));
    }
}

/// Lower a checked program to assembly text.
pub fn emit_program(program: &Program) -> String {
    Emitter::new(program).emit()
}
