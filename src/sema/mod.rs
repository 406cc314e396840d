mod funcs;
mod globals;
mod scope;

pub use funcs::*;
pub use globals::*;
pub use scope::*;
