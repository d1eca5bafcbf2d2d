use std::{
  path::PathBuf,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::runner::DEFAULT_TIMEOUT;

/// Which formatter runs on `format` and on save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatBackend {
  #[default]
  Gofmt,
  Goimports,
  /// goimports, then gofmt over its output.
  Both,
}

pub const GODEF: &str = "godef";
pub const ORACLE: &str = "oracle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Settings {
  pub format_backend:       FormatBackend,
  pub format_on_save:       bool,
  /// Kept as a string so an unsupported backend is reported when used.
  pub goto_def_backend:     String,
  pub lint_on_save:         bool,
  pub lint_on_modified:     bool,
  pub autocomplete:         bool,
  pub show_type:            bool,
  pub project_package:      String,
  pub build_packages:       Vec<String>,
  pub test_packages:        Vec<String>,
  pub tagged_test_packages: Vec<String>,
  /// Overrides `GOPATH`; environment variables and `~` are expanded.
  pub gopath:               Option<String>,
  /// Extra directories searched for tools before `GOPATH/bin` and `PATH`.
  pub path:                 Vec<String>,
  /// Seconds.
  pub tool_timeout:         f64,
  pub debug_enabled:        bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      format_backend:       FormatBackend::Gofmt,
      format_on_save:       true,
      goto_def_backend:     GODEF.to_owned(),
      lint_on_save:         true,
      lint_on_modified:     true,
      autocomplete:         true,
      show_type:            true,
      project_package:      String::new(),
      build_packages:       Vec::new(),
      test_packages:        Vec::new(),
      tagged_test_packages: Vec::new(),
      gopath:               None,
      path:                 Vec::new(),
      tool_timeout:         DEFAULT_TIMEOUT.as_secs_f64(),
      debug_enabled:        false,
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("{0:#}")]
  Read(anyhow::Error),
  #[error("bad config: {0}")]
  BadConfig(#[from] toml::de::Error),
}

impl Settings {
  /// Loads the global settings merged with the workspace settings.
  pub fn load() -> Result<Self, ConfigLoadError> {
    Self::load_from(&gotools_loader::config::config_files())
  }

  /// Loads and merges `files` in order; missing files are skipped.
  pub fn load_from(files: &[PathBuf]) -> Result<Self, ConfigLoadError> {
    let value = gotools_loader::config::load_merged(files).map_err(ConfigLoadError::Read)?;
    Ok(value.try_into()?)
  }

  pub fn timeout(&self) -> Duration {
    match Duration::try_from_secs_f64(self.tool_timeout) {
      Ok(timeout) if !timeout.is_zero() => timeout,
      _ => {
        log::warn!(
          "invalid tool-timeout {}, using {:?}",
          self.tool_timeout,
          DEFAULT_TIMEOUT
        );
        DEFAULT_TIMEOUT
      },
    }
  }

  /// The configured definition backend; an empty name means godef.
  pub fn goto_def_backend(&self) -> &str {
    match self.goto_def_backend.trim() {
      "" => GODEF,
      backend => backend,
    }
  }

  /// Packages passed to oracle as its analysis scope: every configured build,
  /// test and tagged test package, relative to `project-package`.
  pub fn package_scope(&self) -> Vec<String> {
    let project = self.project_package.trim_end_matches('/');
    self
      .build_packages
      .iter()
      .chain(&self.test_packages)
      .chain(&self.tagged_test_packages)
      .map(|package| {
        if project.is_empty() {
          package.clone()
        } else {
          format!("{project}/{package}")
        }
      })
      .collect()
  }
}
