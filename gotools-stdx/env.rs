//! Functions for working with the host environment.

use std::{
  borrow::Cow,
  ffi::{
    OsStr,
    OsString,
  },
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::{
  Context,
  Result,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex_automata::meta::Regex;

static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
///
/// The value is cached on first use since `std::env::current_dir` fails once
/// the directory has been deleted.
pub fn current_working_dir() -> Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  // pwd -L, so symlinked directories keep their logical name
  let mut cwd = std::env::current_dir().context("failed to get current working directory")?;

  if let Some(pwd) = std::env::var_os("PWD").map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}

/// Attempts to find a binary in an explicit search path.
///
/// `search_path` uses the platform `PATH` syntax. Relative binary names
/// containing a separator are resolved against `cwd`.
pub fn which_in<T: AsRef<OsStr>>(binary_name: T, search_path: &OsStr, cwd: &Path) -> Result<PathBuf> {
  let binary_name = binary_name.as_ref();
  which::which_in(binary_name, Some(search_path), cwd).with_context(|| {
    format!(
      "command '{}' not found in {}",
      binary_name.to_string_lossy(),
      search_path.to_string_lossy()
    )
  })
}

/// Builds a search path with `dirs` placed in front of `inherited`.
///
/// Empty entries and duplicates are dropped, keeping the first occurrence.
pub fn prepend_search_path(dirs: &[PathBuf], inherited: Option<&OsStr>) -> Result<OsString> {
  let mut entries: Vec<PathBuf> = Vec::new();
  let inherited = inherited
    .map(|path| std::env::split_paths(path).collect::<Vec<_>>())
    .unwrap_or_default();

  for dir in dirs.iter().chain(inherited.iter()) {
    if dir.as_os_str().is_empty() || entries.contains(dir) {
      continue;
    }
    entries.push(dir.clone());
  }

  std::env::join_paths(entries).context("search path contains an invalid entry")
}

fn var_regex() -> &'static Regex {
  static REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::builder()
      .build_many(&[
        r"\$\{([A-Za-z_][A-Za-z0-9_]*):-([^}]*)\}", // 0: ${VAR:-default}
        r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}",          // 1: ${VAR}
        r"\$([A-Za-z_][A-Za-z0-9_]*)",              // 2: $VAR
      ])
      .expect("env var expansion regexes should compile")
  });
  &REGEX
}

fn expand_impl<'a>(src: &'a str, mut resolve: impl FnMut(&str) -> Option<String>) -> Cow<'a, str> {
  let mut result = String::new();
  let mut pos = 0;

  for captures in var_regex().captures_iter(src.as_bytes()) {
    let (Some(mat), Some(name)) = (captures.get_match(), captures.get_group(1)) else {
      continue;
    };
    let value = resolve(&src[name.range()]);
    let expansion = match (mat.pattern().as_usize(), value) {
      (0, Some(value)) if !value.is_empty() => value,
      (0, _) => {
        captures
          .get_group(2)
          .map(|default| src[default.range()].to_owned())
          .unwrap_or_default()
      },
      (_, value) => value.unwrap_or_default(),
    };

    result.push_str(&src[pos..mat.start()]);
    result.push_str(&expansion);
    pos = mat.end();
  }

  if pos == 0 {
    return Cow::Borrowed(src);
  }

  result.push_str(&src[pos..]);
  Cow::Owned(result)
}

/// Substitutes environment variables in `src`. Supports `$VAR`, `${VAR}` and
/// `${VAR:-default}`; unset variables expand to the empty string.
pub fn expand(src: &str) -> Cow<'_, str> {
  expand_impl(src, |var| {
    std::env::var_os(var).map(|value| value.to_string_lossy().into_owned())
  })
}

#[cfg(test)]
mod tests {
  use std::{
    ffi::OsStr,
    path::PathBuf,
  };

  use super::{
    current_working_dir,
    expand_impl,
    prepend_search_path,
  };

  #[test]
  fn current_dir_is_cached() {
    let first = current_working_dir().expect("should get cwd");
    let second = current_working_dir().expect("should get cwd");
    assert_eq!(first, second);
  }

  #[test]
  fn expands_variables() {
    let env = |var: &str| {
      match var {
        "GOPATH" => Some("/home/gopher/go".to_owned()),
        "EMPTY" => Some(String::new()),
        _ => None,
      }
    };
    assert_eq!(expand_impl("plain", env), "plain");
    assert_eq!(expand_impl("$GOPATH/bin", env), "/home/gopher/go/bin");
    assert_eq!(expand_impl("${GOPATH}/src", env), "/home/gopher/go/src");
    assert_eq!(expand_impl("${MISSING:-/opt/go}/bin", env), "/opt/go/bin");
    assert_eq!(expand_impl("${EMPTY:-fallback}", env), "fallback");
    assert_eq!(expand_impl("a/$MISSING/b", env), "a//b");
  }

  #[cfg(unix)]
  #[test]
  fn search_path_puts_configured_dirs_first() {
    let path = prepend_search_path(
      &[PathBuf::from("/opt/go/bin"), PathBuf::from("/usr/bin")],
      Some(OsStr::new("/usr/bin:/bin")),
    )
    .unwrap();
    assert_eq!(path, OsStr::new("/opt/go/bin:/usr/bin:/bin"));
  }
}
