//! Editor-independent building blocks: buffer positions, tool output
//! correlation, decorations and the Go function type lexer.

pub mod buffer;
pub mod decoration;
pub mod diagnostics;
pub mod position;
pub mod signature;

pub use ropey::{
  Rope,
  RopeSlice,
};
