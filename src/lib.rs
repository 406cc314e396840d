#[macro_use]
pub mod macros;

pub mod ast;
pub mod cli;
pub mod errors;
pub mod generate;
pub mod program;
pub mod recondition;
pub mod sema;
pub mod strutils;
pub mod typing;
pub mod utils;
