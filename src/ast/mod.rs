mod decl;
mod expr;
mod kind;
mod stmt;

pub use decl::*;
pub use expr::*;
pub use kind::*;
pub use stmt::*;
