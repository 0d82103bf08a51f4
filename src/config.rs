use crate::debugger::Syntax;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Logger settings, `[logger]` section of a config file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Instruction log path.
    pub output: PathBuf,
    /// Assembly syntax of log entries.
    pub syntax: Syntax,
    /// Stop stepping after this number of instructions.
    pub max_steps: Option<u64>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("instructions.txt"),
            syntax: Syntax::default(),
            max_steps: None,
        }
    }
}

/// Plotter settings, `[plot]` section of a config file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Instruction log of a baseline run.
    pub baseline: PathBuf,
    /// Instruction log of an optimized run.
    pub optimized: PathBuf,
    /// Chart image path, `.svg` extension selects vector output.
    pub output: PathBuf,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Label font size in pixels.
    pub font_size: u32,
    /// TrueType font used for all labels, a well known system font if not set.
    pub font: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            baseline: PathBuf::from("instructions_nothreaded_ray_color_5n_nog.txt"),
            optimized: PathBuf::from("instructions_nothreaded_ray_color_5n_o2.txt"),
            output: PathBuf::from("instruction_count.png"),
            // 19.2x14.4 inches at 100 dpi
            width: 1920,
            height: 1440,
            // 18pt at 100 dpi
            font_size: 25,
            font: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logger: LoggerConfig,
    pub plot: PlotConfig,
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/steptrace/config.toml";

    /// Parse a TOML config, missing keys take default values.
    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(data)
    }

    /// Load config from file, if `path` is `None` - from `~/.config/steptrace/config.toml`.
    /// Return [`None`] on errors.
    pub fn from_file(path: Option<&Path>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?;
                let path = path.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load config file {}: {err}", path.display());
                    return None;
                }
            },
        };

        weak_error!(Self::from_toml(&data), "invalid config:")
    }
}
