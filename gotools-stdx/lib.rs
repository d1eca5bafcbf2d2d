//! Extensions to the standard library used across the gotools crates.

pub mod env;
pub mod path;
