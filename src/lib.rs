pub mod api;
pub mod ast;
pub mod build;
pub mod builtins;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod logging;
pub mod pool;
pub mod scope;
pub mod syntax;
pub mod typecheck;

// Re-exports: short `crate::X` paths for the front end and config.
pub use config::{project, resolve, stdlib};
pub use syntax::{cst, lexeme, lexer, literal, parser, span};
pub use typecheck::types;

pub use api::*;
pub use config::CompileOptions;
