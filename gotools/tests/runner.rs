#![cfg(unix)]

mod common;

use std::time::{
  Duration,
  Instant,
};

use common::FakeTools;
use gotools::{
  Settings,
  ToolError,
  ToolRunner,
};

#[test]
fn slow_tool_times_out() {
  let tools = FakeTools::new();
  tools.install("slow", "exec sleep 5");
  let settings = Settings {
    tool_timeout: 0.2,
    ..tools.settings()
  };
  let runner = ToolRunner::new(&settings).unwrap();

  let start = Instant::now();
  let err = runner.run(runner.invocation("slow")).unwrap_err();
  assert!(err.is_timeout(), "unexpected error: {err}");
  assert!(matches!(err, ToolError::Timeout { ref tool, .. } if tool == "slow"));
  assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn background_child_holding_the_pipes_times_out() {
  let tools = FakeTools::new();
  tools.install("detached", "sleep 3 &\necho hi");
  let settings = Settings {
    tool_timeout: 0.2,
    ..tools.settings()
  };
  let runner = ToolRunner::new(&settings).unwrap();

  let start = Instant::now();
  let err = runner.run(runner.invocation("detached")).unwrap_err();
  assert!(err.is_timeout(), "unexpected error: {err}");
  assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn stdin_is_piped_to_the_tool() {
  let tools = FakeTools::new();
  tools.install("echo-input", "exec cat");
  let runner = ToolRunner::new(&tools.settings()).unwrap();

  let source = "package main\n\nfunc main() {\n\tprintln(\"héllo\")\n}\n";
  let output = runner
    .run(runner.invocation("echo-input").stdin(source))
    .unwrap();
  assert!(output.success());
  assert_eq!(output.stdout, source);
  assert_eq!(output.stderr, "");
}

#[test]
fn exit_code_and_stderr_are_reported() {
  let tools = FakeTools::new();
  tools.install("broken", "echo oops >&2\nexit 3");
  let runner = ToolRunner::new(&tools.settings()).unwrap();

  let output = runner.run(runner.invocation("broken")).unwrap();
  assert_eq!(output.status, 3);
  assert_eq!(output.stderr, "oops\n");
  assert!(!output.success());
}

#[test]
fn tool_ignoring_its_input_still_succeeds() {
  let tools = FakeTools::new();
  tools.install("quiet", "exit 0");
  let runner = ToolRunner::new(&tools.settings()).unwrap();

  let output = runner
    .run(runner.invocation("quiet").stdin(vec![b'x'; 1 << 20]))
    .unwrap();
  assert!(output.success());
}

#[test]
fn gopath_bin_is_searched_and_exported() {
  let gopath = tempfile::tempdir().unwrap();
  let bin = gopath.path().join("bin");
  std::fs::create_dir(&bin).unwrap();
  let tools = FakeTools::new();
  let tool = tools.install("print-gopath", "echo \"$GOPATH\"");
  std::fs::rename(&tool, bin.join("print-gopath")).unwrap();

  let settings = Settings {
    gopath: Some(gopath.path().display().to_string()),
    ..Settings::default()
  };
  let runner = ToolRunner::new(&settings).unwrap();
  let prepared = runner.prepare("print-gopath").unwrap();
  assert_eq!(
    prepared.path().canonicalize().unwrap(),
    bin.join("print-gopath").canonicalize().unwrap()
  );

  let output = prepared.run(prepared.invocation()).unwrap();
  assert_eq!(output.stdout.trim_end(), gopath.path().display().to_string());
}

#[test]
fn runs_in_the_requested_directory() {
  let tools = FakeTools::new();
  tools.install("where", "pwd -P");
  let runner = ToolRunner::new(&tools.settings()).unwrap();

  let output = runner
    .run(runner.invocation("where").cwd(tools.dir()))
    .unwrap();
  assert_eq!(
    output.stdout.trim_end(),
    tools.dir().canonicalize().unwrap().display().to_string()
  );
}

#[test]
fn missing_tool_is_not_found() {
  let tools = FakeTools::new();
  let runner = ToolRunner::new(&tools.settings()).unwrap();
  let err = runner.run(runner.invocation("gotools-no-such-tool")).unwrap_err();
  assert!(matches!(err, ToolError::NotFound { .. }));
}
