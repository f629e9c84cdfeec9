//! Listeners that report decoded input back to the user.

use std::io::Write;
use std::sync::Arc;

use term_input::{
    InputEvent, InputListener, KeyName, Keypress, ListenerResult, PasteOverflow, PasteTimeout,
};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

/// Writes one line per event.
pub struct EventPrinter<W> {
    out: W,
    format: Format,
}

impl<W: Write + Send> EventPrinter<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self { out, format }
    }
}

impl<W: Write + Send> InputListener for EventPrinter<W> {
    fn on_event(&mut self, event: &InputEvent) -> ListenerResult {
        match self.format {
            Format::Human => self.out.write_all(describe(event).as_bytes())?,
            Format::Json => serde_json::to_writer(&mut self.out, event)?,
        }
        // Raw mode: no implicit carriage return.
        self.out.write_all(b"\r\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Readable one-line summary of an event.
pub fn describe(event: &InputEvent) -> String {
    match event {
        InputEvent::Keypress(press) => describe_keypress(press),
        InputEvent::Paste { content } => format!(
            "paste: {} bytes, {} lines {:?}",
            content.len(),
            content.lines().count(),
            content
        ),
        InputEvent::PasteOverflow(PasteOverflow {
            current_size,
            attempted_size,
            max_size,
        }) => format!(
            "paste-overflow: {attempted_size} bytes over limit {max_size} (had {current_size})"
        ),
        InputEvent::PasteTimeout(PasteTimeout {
            buffer,
            size,
            elapsed,
        }) => format!(
            "paste-timeout: {size} bytes after {}ms {:?}",
            elapsed.as_millis(),
            buffer
        ),
    }
}

fn describe_keypress(press: &Keypress) -> String {
    let mut line = String::from("keypress:");
    if let Some(key) = &press.key {
        for (held, label) in [(key.ctrl, "ctrl"), (key.meta, "meta"), (key.shift, "shift")] {
            if held {
                line.push(' ');
                line.push_str(label);
            }
        }
        line.push_str(&format!(" {} {:?}", key.name, key.sequence));
        if let Some(code) = &key.code {
            line.push_str(&format!(" code={code:?}"));
        }
    }
    if let Some(ch) = press.ch {
        line.push_str(&format!(" ch={ch:?}"));
    }
    line
}

/// Wakes `quit` on ctrl-c or ctrl-d. Raw mode turns both into plain keys.
pub struct QuitOnInterrupt {
    quit: Arc<Notify>,
}

impl QuitOnInterrupt {
    pub fn new(quit: Arc<Notify>) -> Self {
        Self { quit }
    }
}

impl InputListener for QuitOnInterrupt {
    fn on_keypress(&mut self, press: &Keypress) -> ListenerResult {
        let interrupt = press.key.as_ref().is_some_and(|key| {
            key.ctrl && !key.meta && matches!(key.name, KeyName::Char('c' | 'd'))
        });
        if interrupt {
            self.quit.notify_one();
        }
        Ok(())
    }
}
