//! LUX interpreter library
//!
//! Symbol table and object model for an interactive array-processing
//! language, with the statement front end and interpreter built on it.

pub mod config;
pub mod convert;
pub mod error;
pub mod interp;
pub mod repl;
pub mod script;
pub mod symbol;

pub use config::Config;
pub use error::{CompileError, Result};
pub use interp::Interpreter;
pub use script::Span;
pub use symbol::{Handle, SymbolTable};
