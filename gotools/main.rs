use std::{
  io,
  path::Path,
  process::ExitCode,
  sync::Arc,
};

use anyhow::{
  Context,
  Result,
};
use clap::Parser;
use crossterm::tty::IsTty;
use gotools::{
  GoTools,
  Settings,
  handlers::{
    format::FormatOutcome,
    show_type,
  },
  health,
};

use crate::{
  cli::{
    Cli,
    Command,
    load_buffer,
  },
  terminal::TerminalHost,
};

mod cli;
mod terminal;

fn setup_logging(verbosity: u8) -> Result<()> {
  let mut base_config = fern::Dispatch::new();

  base_config = match verbosity {
    0 => base_config.level(log::LevelFilter::Warn),
    1 => base_config.level(log::LevelFilter::Info),
    2 => base_config.level(log::LevelFilter::Debug),
    _3_or_more => base_config.level(log::LevelFilter::Trace),
  };

  let file_config = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(fern::log_file(gotools_loader::log_file())?);

  base_config.chain(file_config).apply()?;

  Ok(())
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  gotools_loader::initialize_config_file(cli.config_file.clone());
  gotools_loader::initialize_log_file(cli.log_file.clone());

  let (settings, config_error) = match Settings::load() {
    Ok(settings) => (settings, None),
    Err(err) => (Settings::default(), Some(err)),
  };

  let verbosity = if settings.debug_enabled {
    cli.verbosity.max(2)
  } else {
    cli.verbosity
  };
  setup_logging(verbosity).context("failed to initialize logging")?;

  if let Some(err) = config_error {
    log::error!("bad config: {err}");
    eprintln!("Bad config: {err}");
    eprintln!("Continuing with the default settings");
  }

  run(cli.command, settings)
}

fn tools_for(file: &Path, settings: Settings) -> Result<(Arc<TerminalHost>, GoTools)> {
  let host = Arc::new(TerminalHost::new(file.to_path_buf(), io::stdout().is_tty()));
  let gotools = GoTools::new(host.clone(), settings)?;
  Ok((host, gotools))
}

fn exit(success: bool) -> ExitCode {
  if success {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  }
}

fn run(command: Command, settings: Settings) -> Result<ExitCode> {
  match command {
    Command::Fmt { file, write } => {
      let buffer = load_buffer(&file, None)?;
      let (host, gotools) = tools_for(&file, settings)?;
      match gotools.format(&buffer) {
        Some(FormatOutcome::Formatted(text)) => {
          if write {
            if let Some(text) = host.take_replaced() {
              std::fs::write(&file, text)
                .with_context(|| format!("failed to write {}", file.display()))?;
            }
          } else {
            print!("{text}");
          }
          Ok(ExitCode::SUCCESS)
        },
        Some(FormatOutcome::SyntaxErrors(_)) => Ok(ExitCode::from(2)),
        Some(FormatOutcome::Failed(_)) | None => Ok(ExitCode::FAILURE),
      }
    },
    Command::Lint { file } => {
      let buffer = load_buffer(&file, None)?;
      let (_host, gotools) = tools_for(&file, settings)?;
      Ok(exit(gotools.lint(&buffer) == Some(0)))
    },
    Command::Def { file, position } => {
      let buffer = load_buffer(&file, Some(position))?;
      let (_host, gotools) = tools_for(&file, settings)?;
      Ok(exit(matches!(gotools.goto_definition(&buffer, None), Some(Ok(_)))))
    },
    Command::Complete { file, position } => {
      let buffer = load_buffer(&file, Some(position))?;
      let (_host, mut gotools) = tools_for(&file, settings)?;
      let completions = gotools.on_query_completions(&buffer).unwrap_or_default();
      for item in &completions.items {
        println!("{}\t{}", item.label, item.insert_text);
      }
      Ok(exit(!completions.items.is_empty()))
    },
    Command::Type { file, position } => {
      let buffer = load_buffer(&file, Some(position))?;
      let (_host, gotools) = tools_for(&file, settings)?;
      let typ = show_type::symbol_type(gotools.runner(), &buffer)?;
      if !typ.is_empty() {
        println!("{typ}");
      }
      Ok(exit(!typ.is_empty()))
    },
    Command::TestName { file, position } => {
      let buffer = load_buffer(&file, Some(position))?;
      match buffer.test_name_at_cursor() {
        Some(name) => {
          println!("{name}");
          Ok(ExitCode::SUCCESS)
        },
        None => Ok(ExitCode::FAILURE),
      }
    },
    Command::Health => {
      health::run()?;
      Ok(ExitCode::SUCCESS)
    },
  }
}
