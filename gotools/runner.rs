//! Runs the external Go tools: one child process per invocation, stdin fed
//! from the buffer, stdout and stderr collected, bounded by a timeout.

use std::{
  ffi::OsString,
  io::{
    self,
    Read,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
  process::{
    Child,
    Command,
    ExitStatus,
    Stdio,
  },
  string::FromUtf8Error,
  sync::mpsc::{
    self,
    Receiver,
    RecvTimeoutError,
  },
  thread,
  time::{
    Duration,
    Instant,
  },
};

use gotools_stdx::{
  env,
  path,
};
use thiserror::Error;

use crate::settings::Settings;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("{tool} not found: {reason}")]
  NotFound { tool: String, reason: String },
  #[error("failed to launch {tool}: {source}")]
  Launch {
    tool:   String,
    #[source]
    source: io::Error,
  },
  #[error("{tool} timed out after {timeout:?}")]
  Timeout { tool: String, timeout: Duration },
  #[error("i/o error while running {tool}: {source}")]
  Io {
    tool:   String,
    #[source]
    source: io::Error,
  },
  #[error("{tool} produced invalid UTF-8")]
  Decode {
    tool:   String,
    #[source]
    source: FromUtf8Error,
  },
  #[error("invalid tool search path: {0}")]
  SearchPath(String),
  #[error("failed to start the background runtime: {0}")]
  Runtime(#[source] io::Error),
}

impl ToolError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Timeout { .. })
  }
}

/// A single external tool call.
#[derive(Debug, Clone)]
pub struct Invocation {
  pub tool:    String,
  pub args:    Vec<String>,
  pub stdin:   Option<Vec<u8>>,
  pub cwd:     Option<PathBuf>,
  pub timeout: Duration,
}

impl Invocation {
  pub fn new(tool: impl Into<String>) -> Self {
    Self {
      tool:    tool.into(),
      args:    Vec::new(),
      stdin:   None,
      cwd:     None,
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
    self.stdin = Some(input.into());
    self
  }

  pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
    self.cwd = Some(cwd.into());
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  fn command_line(&self) -> String {
    std::iter::once(self.tool.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// What a tool printed and how it exited. A signal-terminated process
/// reports status `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
  pub stdout: String,
  pub stderr: String,
  pub status: i32,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.status == 0
  }
}

/// Resolves tools against the configured search path and runs them.
#[derive(Debug, Clone)]
pub struct ToolRunner {
  search_path: OsString,
  gopath:      Option<OsString>,
  timeout:     Duration,
  cwd:         PathBuf,
}

impl ToolRunner {
  /// Search order: the configured `path` entries, every `GOPATH/bin`, then
  /// the inherited `PATH`.
  pub fn new(settings: &Settings) -> Result<Self, ToolError> {
    let gopath = settings
      .gopath
      .as_deref()
      .map(|gopath| expand_path(gopath).into_os_string())
      .or_else(|| std::env::var_os("GOPATH"));

    let mut dirs: Vec<PathBuf> = settings.path.iter().map(|dir| expand_path(dir)).collect();
    if let Some(gopath) = &gopath {
      dirs.extend(std::env::split_paths(gopath).map(|dir| dir.join("bin")));
    }

    let search_path = env::prepend_search_path(&dirs, std::env::var_os("PATH").as_deref())
      .map_err(|err| ToolError::SearchPath(format!("{err:#}")))?;

    Ok(Self {
      search_path,
      gopath,
      timeout: settings.timeout(),
      cwd: env::current_working_dir().unwrap_or_default(),
    })
  }

  pub fn search_path(&self) -> &OsString {
    &self.search_path
  }

  /// A new invocation of `tool` using the configured timeout.
  pub fn invocation(&self, tool: &str) -> Invocation {
    Invocation::new(tool).timeout(self.timeout)
  }

  /// Resolves the executable and environment once for repeated calls.
  pub fn prepare(&self, tool: &str) -> Result<PreparedTool, ToolError> {
    let path = env::which_in(tool, &self.search_path, &self.cwd).map_err(|err| {
      ToolError::NotFound {
        tool:   tool.to_owned(),
        reason: format!("{err:#}"),
      }
    })?;

    let mut env = vec![(OsString::from("PATH"), self.search_path.clone())];
    if let Some(gopath) = &self.gopath {
      env.push((OsString::from("GOPATH"), gopath.clone()));
    }

    Ok(PreparedTool {
      name: tool.to_owned(),
      path,
      env,
      timeout: self.timeout,
    })
  }

  pub fn run(&self, invocation: Invocation) -> Result<ToolOutput, ToolError> {
    self.prepare(&invocation.tool)?.run(invocation)
  }
}

fn expand_path(raw: &str) -> PathBuf {
  let expanded = env::expand(raw);
  path::expand_tilde(Path::new(&*expanded)).into_owned()
}

/// A tool whose executable path and environment are already resolved.
#[derive(Debug, Clone)]
pub struct PreparedTool {
  name:    String,
  path:    PathBuf,
  env:     Vec<(OsString, OsString)>,
  timeout: Duration,
}

impl PreparedTool {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn invocation(&self) -> Invocation {
    Invocation::new(self.name.clone()).timeout(self.timeout)
  }

  /// Runs the resolved executable with the arguments, input and limits of
  /// `invocation`; the invocation's tool name is only used for reporting.
  pub fn run(&self, invocation: Invocation) -> Result<ToolOutput, ToolError> {
    let tool = invocation.tool.clone();
    log::debug!("spawning process...");
    log::debug!("\tcommand:     {}", invocation.command_line());
    log::debug!("\texecutable:  {}", self.path.display());
    if let Some(cwd) = &invocation.cwd {
      log::debug!("\tcwd:         {}", cwd.display());
    }

    let mut command = Command::new(&self.path);
    command
      .args(&invocation.args)
      .envs(self.env.iter().map(|(key, value)| (key, value)))
      .stdin(if invocation.stdin.is_some() {
        Stdio::piped()
      } else {
        Stdio::null()
      })
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }

    let start = Instant::now();
    let mut child = command.spawn().map_err(|source| {
      ToolError::Launch {
        tool: tool.clone(),
        source,
      }
    })?;

    let stdin = match (invocation.stdin, child.stdin.take()) {
      (Some(input), Some(mut pipe)) => {
        Some(spawn_io(move || {
          pipe.write_all(&input)?;
          Ok(Vec::new())
        }))
      },
      _ => None,
    };
    let stdout = child.stdout.take().map(|mut pipe| {
      spawn_io(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
      })
    });
    let stderr = child.stderr.take().map(|mut pipe| {
      spawn_io(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
      })
    });

    let io_err = |source| {
      ToolError::Io {
        tool: tool.clone(),
        source,
      }
    };

    let deadline = start + invocation.timeout;
    let timed_out = || {
      log::debug!("{tool} timed out after {:?}", invocation.timeout);
      ToolError::Timeout {
        tool:    tool.clone(),
        timeout: invocation.timeout,
      }
    };

    let Some(status) = wait_deadline(&mut child, deadline).map_err(io_err)? else {
      // the reader threads finish once the killed child's pipes close
      if let Err(err) = child.kill() {
        log::warn!("failed to kill {tool}: {err}");
      }
      let _ = child.wait();
      return Err(timed_out());
    };

    // a background child of the tool can keep the pipes open past its exit
    if let Some(rx) = stdin {
      match recv_io(&rx, deadline) {
        None => return Err(timed_out()),
        Some(Err(err)) if err.kind() != io::ErrorKind::BrokenPipe => {
          // tools that exit before reading all input close the pipe early
          return Err(io_err(err));
        },
        Some(_) => {},
      }
    }
    let collect = |rx: Option<Receiver<io::Result<Vec<u8>>>>| {
      match rx {
        None => Ok(Vec::new()),
        Some(rx) => {
          match recv_io(&rx, deadline) {
            None => Err(timed_out()),
            Some(result) => result.map_err(io_err),
          }
        },
      }
    };
    let stdout = collect(stdout)?;
    let stderr = collect(stderr)?;

    let status = status.code().unwrap_or(-1);
    log::debug!(
      "process returned ({status}) in {:.2} seconds",
      start.elapsed().as_secs_f64()
    );

    let stdout = String::from_utf8(stdout).map_err(|source| {
      ToolError::Decode {
        tool: tool.clone(),
        source,
      }
    })?;
    let stderr = String::from_utf8(stderr).map_err(|source| {
      ToolError::Decode {
        tool: tool.clone(),
        source,
      }
    })?;
    if !stderr.is_empty() {
      log::debug!("stderr:\n{stderr}");
    }

    Ok(ToolOutput {
      stdout,
      stderr,
      status,
    })
  }
}

fn spawn_io<F>(f: F) -> Receiver<io::Result<Vec<u8>>>
where
  F: FnOnce() -> io::Result<Vec<u8>> + Send + 'static,
{
  let (tx, rx) = mpsc::sync_channel(1);
  thread::spawn(move || {
    let _ = tx.send(f());
  });
  rx
}

/// Waits for a pipe thread until `deadline`. Returns `None` when the
/// deadline passed first.
fn recv_io(rx: &Receiver<io::Result<Vec<u8>>>, deadline: Instant) -> Option<io::Result<Vec<u8>>> {
  match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
    Ok(result) => Some(result),
    Err(RecvTimeoutError::Timeout) => None,
    Err(RecvTimeoutError::Disconnected) => Some(Err(io::Error::other("pipe thread panicked"))),
  }
}

/// Waits for `child` until `deadline`. Returns `None` when the deadline
/// passed first.
fn wait_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
  loop {
    if let Some(status) = child.try_wait()? {
      return Ok(Some(status));
    }
    let now = Instant::now();
    if now >= deadline {
      return Ok(None);
    }
    thread::sleep(POLL_INTERVAL.min(deadline - now));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn invocation_builder() {
    let invocation = Invocation::new("gofmt")
      .args(["-e", "-s"])
      .stdin("package main\n")
      .timeout(Duration::from_secs(1));
    assert_eq!(invocation.command_line(), "gofmt -e -s");
    assert_eq!(invocation.stdin.as_deref(), Some(&b"package main\n"[..]));
    assert_eq!(invocation.timeout, Duration::from_secs(1));
  }

  #[test]
  fn missing_tool_is_not_found() {
    let runner = ToolRunner::new(&Settings::default()).unwrap();
    let err = runner
      .prepare("gotools-definitely-not-a-real-tool")
      .unwrap_err();
    assert!(matches!(err, ToolError::NotFound { .. }));
  }

  #[cfg(unix)]
  #[test]
  fn configured_dirs_are_searched_first() {
    let settings = Settings {
      path: vec!["/opt/gotools/bin".to_owned()],
      gopath: Some("/home/gopher/go".to_owned()),
      ..Settings::default()
    };
    let runner = ToolRunner::new(&settings).unwrap();
    let search_path = runner.search_path().to_string_lossy().into_owned();
    assert!(search_path.starts_with("/opt/gotools/bin:/home/gopher/go/bin"));
  }
}
