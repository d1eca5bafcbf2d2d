use std::{
  io::ErrorKind,
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::{
  Context,
  Result,
};

/// Settings files in merge order: the global file, then the workspace one.
pub fn config_files() -> Vec<PathBuf> {
  vec![crate::config_file(), crate::workspace_config_file()]
}

/// Reads and merges the given settings files. Missing files are skipped.
pub fn load_merged(files: &[PathBuf]) -> Result<toml::Value> {
  files
    .iter()
    .filter_map(|file| read_config(file).transpose())
    .collect::<Result<Vec<_>>>()?
    .into_iter()
    .try_fold(toml::Value::Table(Default::default()), |merged, value| {
      Ok(crate::merge_toml_values(merged, value, 3))
    })
}

fn read_config(file: &Path) -> Result<Option<toml::Value>> {
  let text = match std::fs::read_to_string(file) {
    Ok(text) => text,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
    Err(err) => {
      return Err(err).with_context(|| format!("failed to read {}", file.display()));
    },
  };
  log::debug!("loading settings from {}", file.display());
  toml::from_str(&text)
    .map(Some)
    .with_context(|| format!("failed to parse {}", file.display()))
}

#[cfg(test)]
mod tests {
  use super::load_merged;

  #[test]
  fn missing_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("global.toml");
    std::fs::write(&global, "autocomplete = false\n").unwrap();

    let merged = load_merged(&[global, dir.path().join("missing.toml")]).unwrap();
    assert_eq!(merged["autocomplete"].as_bool(), Some(false));
  }

  #[test]
  fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "autocomplete = \n").unwrap();

    let err = load_merged(&[broken]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse"));
  }
}
