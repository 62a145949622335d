#[macro_use]
pub mod macros;

pub mod cost;
pub mod current;
pub mod energy;
pub mod rate;
