// ABOUTME: Main entry point for the imgcat application
// ABOUTME: Displays image files inline in iTerm2-compatible terminals

use anyhow::Result;
use clap::Parser;
use imgcat_cli::cli::Cli;
use imgcat_cli::cli_output::CliOutput;
use imgcat_cli::config::Config;
use imgcat_cli::display::{Display, Settings};
use imgcat_cli::logging;
use imgcat_core::ImgcatError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let output = if cli.no_color {
        CliOutput::with_color(false)
    } else {
        CliOutput::new()
    };

    match run(&cli, &output) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            log::debug!("{} image(s) failed", failures);
            ExitCode::FAILURE
        }
        Err(err) => {
            output.error(&format!("{:#}", err));
            if let Some(help) = err.downcast_ref::<ImgcatError>().and_then(ImgcatError::help_text) {
                output.hint(help);
            }
            ExitCode::FAILURE
        }
    }
}

/// Returns how many inputs could not be displayed.
fn run(cli: &Cli, output: &CliOutput) -> Result<usize> {
    let config = Config::load()?;
    let settings = Settings::resolve(cli, &config);
    let terminal = settings.terminal();

    let mut display = Display::new(std::io::stdout(), settings, terminal)?;

    let mut failures = 0;
    for input in cli.inputs() {
        if let Err(err) = display.show(&input) {
            log::debug!("Skipping {:?}: {:?}", input, err);
            output.error(&format!("{:#}", err));
            failures += 1;
        }
    }

    Ok(failures)
}
