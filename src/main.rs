use anyhow::{Context, Result};
use clap::Parser;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use sortbox::cli::{Cli, run, wait_for_enter};
use sortbox::output::OutputFormatter;
use std::fs::File;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout only carries the run report.
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        cli.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }

    CombinedLogger::init(loggers)?;

    match run(&cli.run_options()) {
        Ok(summary) => {
            log::info!("Run finished in {:?}", summary.elapsed);
            if !cli.no_wait {
                wait_for_enter()?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            if cli.fail_on_error {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
