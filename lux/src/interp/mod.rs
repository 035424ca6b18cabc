//! Interpreter: executes statement handles produced by the script front end

pub mod arith;
pub mod builtins;
pub mod error;
pub mod eval;

pub use eval::Interpreter;
