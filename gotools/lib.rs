//! Editor integration for the Go command line tools.
//!
//! An editor implements [`EditorHost`] and forwards its events to
//! [`GoTools`]; the handlers shell out to gofmt, goimports, godef, oracle,
//! gocode, go vet and golint and report back through the host.

pub mod application;
pub mod handlers;
pub mod health;
pub mod host;
pub mod runner;
pub mod settings;

pub use application::GoTools;
pub use host::{
  EditorHost,
  Target,
};
pub use runner::{
  Invocation,
  ToolError,
  ToolOutput,
  ToolRunner,
};
pub use settings::Settings;
