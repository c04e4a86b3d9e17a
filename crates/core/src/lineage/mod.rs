#![forbid(unsafe_code)]

mod edge;
mod error;
mod ids;
pub mod key;
mod order;
mod path;
mod record;

pub use edge::*;
pub use error::*;
pub use ids::*;
pub use key::{KeyError, decode_hash, decode_range, encode_hash, encode_range, encode_range_prefix};
pub use order::*;
pub use path::*;
pub use record::*;

#[cfg(test)]
mod tests;
