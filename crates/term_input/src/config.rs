use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 10 MiB.
pub const DEFAULT_MAX_PASTE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_PASTE_TIMEOUT_MS: u64 = 5000;

/// Decoder settings. Can be replaced at runtime with
/// [`crate::KeypressDecoder::set_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Recognise bracketed paste markers (default: false).
    #[serde(default)]
    pub paste_enabled: bool,
    /// Drop end markers seen outside a paste (default: true).
    #[serde(default = "default_strip_unmatched_markers")]
    pub strip_unmatched_markers: bool,
    /// Largest paste accepted, in UTF-8 bytes (default: 10 MiB).
    #[serde(default = "default_max_paste_bytes")]
    pub max_paste_bytes: usize,
    /// Time allowed between start and end marker (default: 5000).
    #[serde(default = "default_paste_timeout_ms")]
    pub paste_timeout_ms: u64,
}

fn default_strip_unmatched_markers() -> bool {
    true
}

fn default_max_paste_bytes() -> usize {
    DEFAULT_MAX_PASTE_BYTES
}

fn default_paste_timeout_ms() -> u64 {
    DEFAULT_PASTE_TIMEOUT_MS
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            paste_enabled: false,
            strip_unmatched_markers: true,
            max_paste_bytes: DEFAULT_MAX_PASTE_BYTES,
            paste_timeout_ms: DEFAULT_PASTE_TIMEOUT_MS,
        }
    }
}

impl DecoderConfig {
    /// Defaults with bracketed paste switched on.
    pub fn bracketed_paste() -> Self {
        Self {
            paste_enabled: true,
            ..Self::default()
        }
    }

    pub fn with_paste_enabled(mut self, enabled: bool) -> Self {
        self.paste_enabled = enabled;
        self
    }

    pub fn with_strip_unmatched_markers(mut self, strip: bool) -> Self {
        self.strip_unmatched_markers = strip;
        self
    }

    pub fn with_max_paste_bytes(mut self, max: usize) -> Self {
        self.max_paste_bytes = max;
        self
    }

    pub fn with_paste_timeout_ms(mut self, ms: u64) -> Self {
        self.paste_timeout_ms = ms;
        self
    }

    pub fn paste_timeout(&self) -> Duration {
        Duration::from_millis(self.paste_timeout_ms)
    }

    /// Check limits. The decoder itself accepts any value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_paste_bytes == 0 {
            return Err(ConfigError::ZeroPasteLimit);
        }
        if self.paste_timeout_ms == 0 {
            return Err(ConfigError::ZeroPasteTimeout);
        }
        Ok(())
    }
}
