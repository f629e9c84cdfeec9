use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use term_input::DecoderConfig;
use thiserror::Error;

use crate::cli::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid decoder settings: {0}")]
    Invalid(#[from] term_input::ConfigError),
}

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Decoder settings. Paste support is on when the section is absent.
    #[serde(default = "DecoderConfig::bracketed_paste")]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// One JSON object per line instead of readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::bracketed_paste(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load with precedence: CLI args > config file > defaults.
    ///
    /// A missing default config file is not an error; a missing file passed
    /// with `--config` is.
    pub fn load_with_args(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_cli_args(args);
        config.decoder.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keyscope").join("config.toml"))
    }

    fn apply_cli_args(&mut self, args: &Args) {
        if args.no_paste {
            self.decoder.paste_enabled = false;
        }
        if args.keep_stray_markers {
            self.decoder.strip_unmatched_markers = false;
        }
        if let Some(max) = args.max_paste_bytes {
            self.decoder.max_paste_bytes = max;
        }
        if let Some(ms) = args.paste_timeout_ms {
            self.decoder.paste_timeout_ms = ms;
        }
        if args.json {
            self.output.json = true;
        }
    }
}
