pub mod config;

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use gotools_stdx::{
  env::current_working_dir,
  path,
};

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Name of the per-workspace settings directory.
pub const WORKSPACE_DIR: &str = ".gotools";

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  ensure_parent_dir(&config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  ensure_parent_dir(&log_file);
  LOG_FILE.set(log_file).ok();
}

pub fn config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("GOTOOLS_CONFIG_DIR") {
    return path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned();
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.config_dir().join("gotools"),
    Err(err) => {
      log::warn!("unable to find the config directory: {err}");
      std::env::temp_dir().join("gotools")
    },
  }
}

pub fn cache_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("GOTOOLS_CACHE_DIR") {
    return path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned();
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.cache_dir().join("gotools"),
    Err(err) => {
      log::warn!("unable to find the cache directory: {err}");
      std::env::temp_dir().join("gotools")
    },
  }
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE.get_or_init(default_config_file).clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE
    .get_or_init(|| {
      let path = default_log_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn workspace_config_file() -> PathBuf {
  find_workspace().0.join(WORKSPACE_DIR).join("config.toml")
}

pub fn default_log_file() -> PathBuf {
  cache_dir().join("gotools.log")
}

/// Merge two TOML documents, merging values from `right` onto `left`
///
/// `merge_depth` sets the nesting depth up to which tables are merged instead
/// of overridden. Arrays are always replaced by the right-hand value, so a
/// workspace `build-packages` list replaces the global one.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

/// Finds the current workspace folder.
///
/// Searches upward from the CWD for the first directory containing `.git`,
/// `.svn`, `.jj`, `go.mod` or `.gotools`. If no workspace was found returns
/// (CWD, true). Otherwise (workspace, false) is returned
pub fn find_workspace() -> (PathBuf, bool) {
  match current_working_dir() {
    Ok(current_dir) => find_workspace_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if [".git", ".svn", ".jj", "go.mod", WORKSPACE_DIR]
      .iter()
      .any(|marker| ancestor.join(marker).exists())
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

fn default_config_file() -> PathBuf {
  config_dir().join("config.toml")
}

fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}

#[cfg(test)]
mod tests {
  use toml::Value;

  use super::{
    find_workspace_in,
    merge_toml_values,
  };

  #[test]
  fn workspace_values_win() {
    let global: Value = toml::from_str(
      r#"
        format-backend = "gofmt"
        build-packages = ["cmd/a", "cmd/b"]
        autocomplete = true
      "#,
    )
    .unwrap();
    let local: Value = toml::from_str(
      r#"
        format-backend = "both"
        build-packages = ["cmd/c"]
      "#,
    )
    .unwrap();

    let merged = merge_toml_values(global, local, 3);
    assert_eq!(merged["format-backend"].as_str(), Some("both"));
    assert_eq!(merged["autocomplete"].as_bool(), Some(true));
    assert_eq!(
      merged["build-packages"].as_array().unwrap(),
      &vec![Value::String("cmd/c".into())]
    );
  }

  #[test]
  fn workspace_root_is_nearest_marker() {
    let dir = tempfile::tempdir().unwrap();
    let module = dir.path().join("module");
    let nested = module.join("pkg").join("inner");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(module.join("go.mod"), "module example.com/m\n").unwrap();

    let (root, is_cwd) = find_workspace_in(&nested);
    assert_eq!(root, module);
    assert!(!is_cwd);
  }
}
