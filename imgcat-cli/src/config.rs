// ABOUTME: Configuration file loading, validation, and hierarchical merging for imgcat
// ABOUTME: Supports TOML config files with XDG Base Directory specification compliance

use anyhow::{Context, Result};
use imgcat_core::Length;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, deserialize_with = "parse_length")]
    pub width: Option<Length>,
    #[serde(default, deserialize_with = "parse_length")]
    pub height: Option<Length>,
    #[serde(default)]
    pub inline: Option<bool>,
    #[serde(default)]
    pub preserve_aspect_ratio: Option<bool>,
    /// Skip the terminal support check
    #[serde(default)]
    pub force: Option<bool>,
}

impl Config {
    /// Load configuration from standard XDG-compliant locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        Self::load_from_paths(paths.as_slice())
    }

    /// Load configuration from file paths in increasing order of precedence.
    ///
    /// Missing files are skipped; a file that exists but does not parse is an error.
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                continue;
            }
            log::debug!("Loading config from {}", path.display());
            config = config.merge(Self::load_from_file(path)?);
        }

        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })
    }

    /// Standard config file paths, lowest precedence first
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("imgcat").join("config.toml"));
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(config_home).join("imgcat").join("config.toml"));
        }

        // 3. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join("imgcat.toml"));
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            inline: other.inline.or(self.inline),
            preserve_aspect_ratio: other.preserve_aspect_ratio.or(self.preserve_aspect_ratio),
            force: other.force.or(self.force),
        }
    }
}

// Lengths are written the same way as on the command line: 10, 10px, 10%, auto
fn parse_length<'de, D>(deserializer: D) -> Result<Option<Length>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLength {
        Cells(u32),
        Text(String),
    }

    match Option::<RawLength>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawLength::Cells(cells)) => Ok(Some(Length::Cells(cells))),
        Some(RawLength::Text(text)) => text.parse().map(Some).map_err(D::Error::custom),
    }
}
