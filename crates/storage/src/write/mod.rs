#![forbid(unsafe_code)]

mod executor;
mod op;

pub use executor::*;
pub use op::*;
