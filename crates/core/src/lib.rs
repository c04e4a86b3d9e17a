#![forbid(unsafe_code)]

pub mod lineage;
