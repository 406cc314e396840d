pub mod structs;
pub mod ty;
mod zero;

pub use zero::zero_value;
