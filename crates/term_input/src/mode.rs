//! Bracketed paste wire constants and the terminal mode switch.

use std::io::{self, Write};

/// Sent by the terminal before pasted text.
pub const PASTE_START: &str = "\x1b[200~";
/// Sent by the terminal after pasted text.
pub const PASTE_END: &str = "\x1b[201~";
/// Asks the terminal to wrap pastes in markers.
pub const ENABLE_BRACKETED_PASTE: &str = "\x1b[?2004h";
/// Restores plain paste behaviour.
pub const DISABLE_BRACKETED_PASTE: &str = "\x1b[?2004l";

/// Keeps bracketed paste mode on for as long as it lives.
///
/// Writes [`ENABLE_BRACKETED_PASTE`] on creation and
/// [`DISABLE_BRACKETED_PASTE`] on [`disable`](Self::disable) or drop.
pub struct BracketedPaste<W: Write> {
    writer: W,
    active: bool,
}

impl<W: Write> BracketedPaste<W> {
    pub fn enable(mut writer: W) -> io::Result<Self> {
        writer.write_all(ENABLE_BRACKETED_PASTE.as_bytes())?;
        writer.flush()?;
        Ok(Self {
            writer,
            active: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Leave bracketed paste mode now. Idempotent.
    pub fn disable(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.writer.write_all(DISABLE_BRACKETED_PASTE.as_bytes())?;
        self.writer.flush()
    }
}

impl<W: Write> Drop for BracketedPaste<W> {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}
