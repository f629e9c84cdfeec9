//! Listener registry and the emission boundary.
//!
//! Policy: a listener that returns an error or panics affects only its own
//! delivery. The failure is logged and dropped; every other listener still
//! receives the event and the decoder never observes it.
//!
//! A caught panic still runs the process panic hook, which by default
//! prints to stderr. Hosts drawing to a raw-mode terminal should install
//! their own hook.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::event::{InputEvent, Keypress, PasteOverflow, PasteTimeout};

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;
pub type ListenerResult = Result<(), ListenerError>;

/// Receives decoded input. Every method defaults to doing nothing.
pub trait InputListener: Send {
    /// Entry point used by the emitter; routes to the typed methods.
    fn on_event(&mut self, event: &InputEvent) -> ListenerResult {
        match event {
            InputEvent::Keypress(keypress) => self.on_keypress(keypress),
            InputEvent::Paste { content } => self.on_paste(content),
            InputEvent::PasteOverflow(info) => self.on_paste_overflow(info),
            InputEvent::PasteTimeout(info) => self.on_paste_timeout(info),
        }
    }

    fn on_keypress(&mut self, _keypress: &Keypress) -> ListenerResult {
        Ok(())
    }

    fn on_paste(&mut self, _content: &str) -> ListenerResult {
        Ok(())
    }

    fn on_paste_overflow(&mut self, _info: &PasteOverflow) -> ListenerResult {
        Ok(())
    }

    fn on_paste_timeout(&mut self, _info: &PasteTimeout) -> ListenerResult {
        Ok(())
    }
}

#[derive(Default)]
pub struct Emitter {
    listeners: Vec<Box<dyn InputListener>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn InputListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener, isolating each delivery.
    pub fn emit(&mut self, event: &InputEvent) {
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener = index, event = %event.kind(), error = %err, "input listener failed");
                }
                Err(_) => {
                    warn!(listener = index, event = %event.kind(), "input listener panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
