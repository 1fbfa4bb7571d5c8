// ABOUTME: Sends image files and stdin to the terminal as inline image frames
// ABOUTME: Resolves display settings from flags and config into protocol options

use crate::cli::{Cli, Input};
use crate::config::Config;
use anyhow::{Context, Result};
use imgcat_core::{Encoder, EncoderConfig, ImageOption, Length, TerminalCapabilities};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Display settings after merging config file values and command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub width: Length,
    pub height: Option<Length>,
    pub inline: bool,
    pub preserve_aspect_ratio: bool,
    pub force: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: Length::Percent(100),
            height: None,
            inline: true,
            preserve_aspect_ratio: true,
            force: false,
        }
    }
}

impl Settings {
    /// Flags win over config values, which win over defaults.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let defaults = Settings::default();

        Self {
            width: cli.width.or(config.width).unwrap_or(defaults.width),
            height: cli.height.or(config.height),
            inline: if cli.download {
                false
            } else {
                config.inline.unwrap_or(defaults.inline)
            },
            preserve_aspect_ratio: if cli.no_preserve_aspect_ratio {
                false
            } else {
                config
                    .preserve_aspect_ratio
                    .unwrap_or(defaults.preserve_aspect_ratio)
            },
            force: cli.force || config.force.unwrap_or(defaults.force),
        }
    }

    /// Protocol options for one image. Name and size come first, as iTerm2's own
    /// tooling sends them.
    pub fn options(&self, name: Option<&str>, size: Option<u64>) -> Vec<ImageOption> {
        let mut options = Vec::new();

        if let Some(name) = name {
            options.push(ImageOption::name(name));
        }
        if let Some(size) = size {
            options.push(ImageOption::size(size));
        }
        options.push(ImageOption::inline(self.inline));
        options.push(ImageOption::width(self.width));
        if let Some(height) = self.height {
            options.push(ImageOption::height(height));
        }
        if !self.preserve_aspect_ratio {
            options.push(ImageOption::preserve_aspect_ratio(false));
        }

        options
    }

    pub fn terminal(&self) -> TerminalCapabilities {
        let detected = TerminalCapabilities::detect();
        if self.force && !detected.supports_inline_images {
            // Keep the detected multiplexer wrapping
            TerminalCapabilities {
                supports_inline_images: true,
                ..detected
            }
        } else {
            detected
        }
    }
}

/// Writes one frame per image onto a shared output.
pub struct Display<W> {
    out: Option<W>,
    settings: Settings,
    terminal: TerminalCapabilities,
}

impl<W: Write + Send + 'static> Display<W> {
    /// Fails when the terminal cannot show inline images, before anything is written.
    pub fn new(out: W, settings: Settings, terminal: TerminalCapabilities) -> Result<Self> {
        terminal.ensure_supported()?;
        log::debug!(
            "Displaying images on {} (passthrough: {:?})",
            terminal.terminal_name,
            terminal.passthrough
        );

        Ok(Self {
            out: Some(out),
            settings,
            terminal,
        })
    }

    pub fn show(&mut self, input: &Input) -> Result<()> {
        match input {
            Input::Stdin => self.show_reader(io::stdin().lock(), None, None),
            Input::File(path) => self.show_file(path),
        }
    }

    pub fn show_file(&mut self, path: &Path) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Could not read metadata for {}", path.display()))?
            .len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        self.show_reader(file, name.as_deref(), Some(size))
            .with_context(|| format!("Could not display {}", path.display()))
    }

    pub fn show_reader<R: Read>(
        &mut self,
        reader: R,
        name: Option<&str>,
        size: Option<u64>,
    ) -> Result<()> {
        let out = self
            .out
            .take()
            .context("Output is no longer available after an earlier failure")?;

        let config = EncoderConfig::builder()
            .options(self.settings.options(name, size))
            .terminal(self.terminal.clone())
            .build();
        let mut encoder = Encoder::with_config(out, config)?;

        let result = encoder.encode(reader);
        self.out = encoder.into_inner();
        result?;
        Ok(())
    }

    pub fn into_inner(self) -> Option<W> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["imgcat"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_settings_match_original_command() {
        let settings = Settings::resolve(&cli(&[]), &Config::default());
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings
                .options(None, None)
                .iter()
                .map(ImageOption::as_str)
                .collect::<Vec<_>>(),
            vec!["inline=1", "width=100%"]
        );
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            width: Some(Length::Cells(40)),
            height: Some(Length::Auto),
            inline: Some(true),
            preserve_aspect_ratio: Some(true),
            force: Some(false),
        };
        let settings = Settings::resolve(
            &cli(&["--width", "200px", "--download", "--no-preserve-aspect-ratio", "-f"]),
            &config,
        );

        assert_eq!(settings.width, Length::Pixels(200));
        assert_eq!(settings.height, Some(Length::Auto));
        assert!(!settings.inline);
        assert!(!settings.preserve_aspect_ratio);
        assert!(settings.force);
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let config = Config {
            width: Some(Length::Cells(40)),
            inline: Some(false),
            force: Some(true),
            ..Default::default()
        };
        let settings = Settings::resolve(&cli(&[]), &config);
        assert_eq!(settings.width, Length::Cells(40));
        assert!(!settings.inline);
        assert!(settings.force);
    }

    #[test]
    fn test_options_for_named_file() {
        let settings = Settings {
            height: Some(Length::Percent(50)),
            preserve_aspect_ratio: false,
            ..Default::default()
        };
        let options = settings.options(Some("cat.png"), Some(1234));
        assert_eq!(
            options.iter().map(ImageOption::as_str).collect::<Vec<_>>(),
            vec![
                "name=Y2F0LnBuZw==",
                "size=1234",
                "inline=1",
                "width=100%",
                "height=50%",
                "preserveAspectRatio=0",
            ]
        );
    }

    #[test]
    fn test_display_rejects_unsupported_terminal() {
        let result = Display::new(
            Vec::<u8>::new(),
            Settings::default(),
            TerminalCapabilities::unsupported(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_display_several_readers() {
        let mut display = Display::new(
            Vec::<u8>::new(),
            Settings::default(),
            TerminalCapabilities::forced(),
        )
        .unwrap();

        display.show_reader(&b"test"[..], Some("test"), Some(4)).unwrap();
        display.show_reader(&b"test"[..], None, None).unwrap();

        let out = String::from_utf8(display.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "\x1b]1337;File=name=dGVzdA==;size=4;inline=1;width=100%:dGVzdA==\x07\n\
             \x1b]1337;File=inline=1;width=100%:dGVzdA==\x07\n"
        );
    }

    #[test]
    fn test_missing_file_keeps_output_usable() {
        let mut display = Display::new(
            Vec::<u8>::new(),
            Settings::default(),
            TerminalCapabilities::forced(),
        )
        .unwrap();

        let err = display
            .show_file(Path::new("/definitely/not/here.png"))
            .unwrap_err();
        assert!(err.to_string().contains("Could not open"));

        display.show_reader(&b"test"[..], None, None).unwrap();
        assert!(display.into_inner().unwrap().ends_with(b"dGVzdA==\x07\n"));
    }
}
