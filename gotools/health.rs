use std::io::{
  self,
  Write,
};

use anyhow::Result;
use crossterm::{
  style::{
    Color,
    StyledContent,
    Stylize,
  },
  tty::IsTty,
};

use crate::{
  runner::ToolRunner,
  settings::{
    FormatBackend,
    GODEF,
    ORACLE,
    Settings,
  },
};

/// A tool and the feature that needs it.
struct Requirement {
  tool:    &'static str,
  feature: &'static str,
  needed:  fn(&Settings) -> bool,
}

const REQUIREMENTS: &[Requirement] = &[
  Requirement {
    tool:    "gofmt",
    feature: "format",
    needed:  |settings| settings.format_backend != FormatBackend::Goimports,
  },
  Requirement {
    tool:    "goimports",
    feature: "format",
    needed:  |settings| settings.format_backend != FormatBackend::Gofmt,
  },
  Requirement {
    tool:    GODEF,
    feature: "goto definition",
    needed:  |settings| settings.goto_def_backend() == GODEF,
  },
  Requirement {
    tool:    ORACLE,
    feature: "goto definition",
    needed:  |settings| settings.goto_def_backend() == ORACLE,
  },
  Requirement {
    tool:    "gocode",
    feature: "autocomplete, show type",
    needed:  |settings| settings.autocomplete || settings.show_type,
  },
  Requirement {
    tool:    "go",
    feature: "lint (go vet)",
    needed:  |settings| settings.lint_on_save || settings.lint_on_modified,
  },
  Requirement {
    tool:    "golint",
    feature: "lint",
    needed:  |settings| settings.lint_on_save || settings.lint_on_modified,
  },
];

pub fn run() -> Result<()> {
  let settings = general()?;
  writeln!(io::stdout().lock())?;
  tools(&settings)?;
  Ok(())
}

fn general() -> io::Result<Settings> {
  let stdout = io::stdout();
  let mut stdout = stdout.lock();

  let config_file = gotools_loader::config_file();
  let workspace_file = gotools_loader::workspace_config_file();
  let log_file = gotools_loader::log_file();

  for (title, file) in [("Config file", &config_file), ("Workspace config file", &workspace_file)] {
    if file.exists() {
      writeln!(stdout, "{title}: {}", file.display())?;
    } else {
      writeln!(stdout, "{title}: default")?;
    }
  }
  writeln!(stdout, "Log file: {}", log_file.display())?;

  let settings = match Settings::load() {
    Ok(settings) => settings,
    Err(err) => {
      writeln!(stdout, "{}", "Configuration file malformed".red())?;
      writeln!(stdout, "{err}")?;
      Settings::default()
    },
  };
  Ok(settings)
}

fn tools(settings: &Settings) -> io::Result<()> {
  let stdout = io::stdout();
  let mut stdout = stdout.lock();
  let is_terminal = io::stdout().is_tty();

  let color = |content: StyledContent<String>, tone: Color| {
    if is_terminal {
      content.with(tone)
    } else {
      content
    }
  };

  let runner = match ToolRunner::new(settings) {
    Ok(runner) => runner,
    Err(err) => {
      writeln!(stdout, "{}", format!("Tool search path unusable: {err}").red())?;
      return Ok(());
    },
  };
  writeln!(
    stdout,
    "Tool search path: {}",
    runner.search_path().to_string_lossy()
  )?;

  for requirement in REQUIREMENTS {
    let line = match runner.prepare(requirement.tool) {
      Ok(tool) => {
        color(
          format!("✓ {:<10} {}", requirement.tool, tool.path().display()).stylize(),
          Color::Green,
        )
      },
      Err(_) if (requirement.needed)(settings) => {
        color(
          format!("✘ {:<10} needed for {}", requirement.tool, requirement.feature).stylize(),
          Color::Red,
        )
      },
      Err(_) => {
        color(
          format!("- {:<10} not installed (unused)", requirement.tool).stylize(),
          Color::Yellow,
        )
      },
    };
    writeln!(stdout, "{line}")?;
  }

  Ok(())
}
