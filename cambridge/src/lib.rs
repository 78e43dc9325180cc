//! Cambridge Pseudocode Interpreter Library
//!
//! Lexer, parser and tree-walking interpreter for 9618-style pseudocode,
//! plus the interactive REPL and language server built on them.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod lsp;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::{CompileError, Result};
