//! Deferred event handling for the gotools hooks.

mod debounce;

pub use debounce::{
  AsyncHook,
  send_blocking,
};
