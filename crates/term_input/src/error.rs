//! Error types for decoder configuration.

use thiserror::Error;

/// Rejected [`crate::DecoderConfig`] values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero limit would overflow every nonempty paste.
    #[error("max_paste_bytes must be greater than zero")]
    ZeroPasteLimit,

    /// A zero timeout would expire a paste before its first chunk is read.
    #[error("paste_timeout_ms must be greater than zero")]
    ZeroPasteTimeout,
}
