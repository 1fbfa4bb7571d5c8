// ABOUTME: CLI argument definitions for the imgcat application
// ABOUTME: Defines the command-line interface structure using clap derive macros

use clap::Parser;
use imgcat_core::Length;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgcat")]
#[command(about = "Display images inline in iTerm2-compatible terminals", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Image files to display; `-` or nothing reads standard input
    pub paths: Vec<PathBuf>,

    /// Width to render: cells (10), pixels (10px), percent (10%) or auto
    #[arg(long, short = 'W')]
    pub width: Option<Length>,

    /// Height to render: cells (10), pixels (10px), percent (10%) or auto
    #[arg(long, short = 'H')]
    pub height: Option<Length>,

    /// Stretch the image to the given width and height
    #[arg(long)]
    pub no_preserve_aspect_ratio: bool,

    /// Send the file as a download instead of displaying it
    #[arg(long)]
    pub download: bool,

    /// Skip the terminal support check
    #[arg(long, short)]
    pub force: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Paths to encode, with stdin standing in for an empty list.
    pub fn inputs(&self) -> Vec<Input> {
        if self.paths.is_empty() {
            return vec![Input::Stdin];
        }

        self.paths
            .iter()
            .map(|path| {
                if path.as_os_str() == "-" {
                    Input::Stdin
                } else {
                    Input::File(path.clone())
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}
