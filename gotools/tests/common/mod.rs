//! Fake Go tools and a recording editor host shared by the integration tests.

#![allow(dead_code)]

use std::{
  collections::HashMap,
  fs,
  os::unix::fs::PermissionsExt,
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
};

use gotools::{
  EditorHost,
  GoTools,
  Settings,
  Target,
};
use gotools_lib::{
  buffer::{
    Buffer,
    Range,
    ViewId,
  },
  decoration::{
    Decoration,
    DecorationStore,
    Feature,
  },
};
use parking_lot::Mutex;
use tempfile::TempDir;

/// A directory of shell scripts standing in for the real tools.
pub struct FakeTools {
  dir: TempDir,
}

impl FakeTools {
  pub fn new() -> Self {
    Self {
      dir: tempfile::tempdir().unwrap(),
    }
  }

  pub fn dir(&self) -> &Path {
    self.dir.path()
  }

  /// Installs `name` running `body` under `/bin/sh`.
  pub fn install(&self, name: &str, body: &str) -> PathBuf {
    let path = self.dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// Installs `name` so that every run appends a line to the returned file.
  pub fn install_counted(&self, name: &str, body: &str) -> PathBuf {
    let counter = self.dir.path().join(format!("{name}.runs"));
    self.install(
      name,
      &format!("echo run >> '{}'\n{body}", counter.display()),
    );
    counter
  }

  /// Settings that resolve tools from this directory first.
  pub fn settings(&self) -> Settings {
    Settings {
      path: vec![self.dir.path().display().to_string()],
      ..Settings::default()
    }
  }

  /// Writes a source file next to the tools and returns its path.
  pub fn source(&self, name: &str, text: &str) -> PathBuf {
    let path = self.dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
  }
}

pub fn runs(counter: &Path) -> usize {
  fs::read_to_string(counter)
    .map(|text| text.lines().count())
    .unwrap_or(0)
}

/// Records everything handlers send to the editor.
#[derive(Default)]
pub struct RecordingHost {
  pub decorations: Mutex<DecorationStore>,
  pub messages:    Mutex<Vec<String>>,
  pub slots:       Mutex<HashMap<(ViewId, String), String>>,
  pub replaced:    Mutex<Vec<(ViewId, String)>>,
  pub opened:      Mutex<Vec<Target>>,
}

impl RecordingHost {
  pub fn decorations(&self, view: ViewId, feature: Feature) -> Vec<Decoration> {
    self.decorations.lock().get(view, feature).to_vec()
  }

  pub fn messages(&self) -> Vec<String> {
    self.messages.lock().clone()
  }

  pub fn slot(&self, view: ViewId, key: &str) -> Option<String> {
    self.slots.lock().get(&(view, key.to_owned())).cloned()
  }
}

impl EditorHost for RecordingHost {
  fn status_message(&self, message: &str) {
    self.messages.lock().push(message.to_owned());
  }

  fn set_status(&self, view: ViewId, key: &str, text: &str) {
    self
      .slots
      .lock()
      .insert((view, key.to_owned()), text.to_owned());
  }

  fn update_decorations(&self, view: ViewId, feature: Feature, decorations: Vec<Decoration>) {
    self.decorations.lock().replace(view, feature, decorations);
  }

  fn replace_text(&self, view: ViewId, text: &str) {
    self.replaced.lock().push((view, text.to_owned()));
  }

  fn open_location(&self, target: &Target) {
    self.opened.lock().push(target.clone());
  }
}

pub const VIEW: ViewId = ViewId(7);

pub fn buffer(path: &Path, text: &str, cursor: usize) -> Buffer {
  Buffer::new(VIEW, Some(path.to_path_buf()), text).with_selection(Range::point(cursor))
}

pub fn setup(settings: Settings) -> (Arc<RecordingHost>, GoTools) {
  let host = Arc::new(RecordingHost::default());
  let gotools = GoTools::new(host.clone(), settings).unwrap();
  (host, gotools)
}
