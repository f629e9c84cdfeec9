mod config;
mod decoder;
pub mod driver;
mod emitter;
mod error;
mod event;
pub mod keys;
pub mod mode;
mod paste;
pub mod tokenizer;

pub use config::{DecoderConfig, DEFAULT_MAX_PASTE_BYTES, DEFAULT_PASTE_TIMEOUT_MS};
pub use decoder::KeypressDecoder;
pub use emitter::{InputListener, ListenerError, ListenerResult};
pub use error::ConfigError;
pub use event::{EventKind, InputEvent, KeyEvent, KeyName, Keypress, PasteOverflow, PasteTimeout};
pub use mode::BracketedPaste;
