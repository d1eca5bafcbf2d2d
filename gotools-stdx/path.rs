//! Path helpers: home expansion and lexical normalization.

use std::{
  borrow::Cow,
  path::{
    Component,
    Path,
    PathBuf,
  },
};

use etcetera::home_dir;

use crate::env::current_working_dir;

/// Replaces a leading `~` with the user's home directory.
pub fn expand_tilde<'a, P>(path: P) -> Cow<'a, Path>
where
  P: Into<Cow<'a, Path>>,
{
  let path = path.into();
  let mut components = path.components();
  if let Some(Component::Normal(c)) = components.next()
    && c == "~"
    && let Ok(mut buf) = home_dir()
  {
    buf.push(components);
    return Cow::Owned(buf);
  }

  path
}

/// Normalize a path without resolving symlinks.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let path = path.as_ref();
  let mut components = path.components().peekable();
  let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().cloned() {
    components.next();
    PathBuf::from(c.as_os_str())
  } else {
    PathBuf::new()
  };

  for component in components {
    match component {
      Component::Prefix(..) => unreachable!(),
      Component::RootDir => ret.push(component.as_os_str()),
      Component::CurDir => {},
      Component::ParentDir => {
        ret.pop();
      },
      Component::Normal(c) => ret.push(c),
    }
  }
  ret
}

/// Returns the canonical, absolute form of a path with all intermediate
/// components normalized. Falls back to lexical normalization when the path
/// does not exist.
pub fn canonicalize(path: impl AsRef<Path>) -> PathBuf {
  let path = expand_tilde(path.as_ref());
  let path = if path.is_relative() {
    Cow::Owned(
      current_working_dir()
        .unwrap_or_default()
        .join(path),
    )
  } else {
    path
  };

  dunce::canonicalize(&path).unwrap_or_else(|_| normalize(&path))
}
