//! Tree-walking interpreter for pseudocode programs
//!
//! Runs a parsed [`Program`](crate::ast::Program) directly. Scopes are
//! reference-counted environments, arrays and object instances are shared
//! by reference, records are copied on assignment.
//!
//! # Example
//!
//! ```ignore
//! use cambridge::interp::Interpreter;
//! use cambridge::parser::parse_source;
//!
//! let (program, errors) = parse_source("OUTPUT 5 / 2");
//! assert!(errors.is_empty());
//! let mut interp = Interpreter::new();
//! interp.run(&program).unwrap(); // prints 2.5
//! ```

pub mod builtins;
mod env;
mod error;
mod eval;
mod files;
mod value;

pub use builtins::{BUILTIN_DOCS, HostContext};
pub use env::{EnvRef, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{Interpreter, InterpreterOptions, binary_op};
pub use files::FileTable;
pub use value::{ArrayValue, BoundMethod, Builtin, Class, Instance, RecordValue, Routine, Value};

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// In-memory OUTPUT sink whose contents stay readable after the
/// interpreter takes ownership of a clone
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
