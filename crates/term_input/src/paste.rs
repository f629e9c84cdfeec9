//! Bracketed paste state machine.
//!
//! Runs ahead of the tokenizer. Splits decoded text into ordinary key input
//! and paste content, reassembling markers split across chunks. Pastes are
//! bounded by size (`max_paste_bytes`) and time (`paste_timeout_ms`).

use std::mem;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::event::{InputEvent, PasteOverflow, PasteTimeout};
use crate::mode::{PASTE_END, PASTE_START};

/// Marker prefixes held back at the end of a chunk. Outside a paste a bare
/// `ESC` or `ESC[` is never held: both are complete keys on their own.
const PARTIAL_MARKERS: [&str; 4] = ["\x1b[200", "\x1b[201", "\x1b[20", "\x1b[2"];

/// Output of one step of the state machine, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Ordinary input for the tokenizer.
    Keys(String),
    Event(InputEvent),
}

#[derive(Debug, Default)]
enum PasteState {
    #[default]
    Idle,
    Buffering(PasteBuffer),
}

#[derive(Debug)]
struct PasteBuffer {
    content: String,
    started_at: Instant,
    /// Timeout expiry; lives and dies with the buffer.
    deadline: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct PasteMachine {
    state: PasteState,
    /// Bytes carried over to the next chunk: a strict marker prefix, or
    /// inside a paste also a trailing `ESC` / `ESC[`.
    partial: String,
}

impl PasteMachine {
    /// Process one chunk of decoded text.
    pub(crate) fn feed(&mut self, text: &str, config: &DecoderConfig, now: Instant) -> Vec<Segment> {
        let mut out = Vec::new();
        if !config.paste_enabled {
            let mut keys = self.cancel().unwrap_or_default();
            keys.push_str(&mem::take(&mut self.partial));
            keys.push_str(text);
            push_keys(&mut out, keys);
            return out;
        }

        let mut text = mem::take(&mut self.partial) + text;
        if let Some(cut) = partial_marker_start(&text) {
            self.partial = text.split_off(cut);
            trace!(partial = ?self.partial, "holding partial paste marker");
        }
        self.scan(&text, config, now, &mut out);
        out
    }

    fn scan(&mut self, mut rest: &str, config: &DecoderConfig, now: Instant, out: &mut Vec<Segment>) {
        loop {
            match &mut self.state {
                PasteState::Idle => {
                    let Some(at) = rest.find(PASTE_START) else {
                        push_keys(out, ordinary(rest, config));
                        return;
                    };
                    push_keys(out, ordinary(&rest[..at], config));
                    self.state = PasteState::Buffering(PasteBuffer {
                        content: String::new(),
                        started_at: now,
                        deadline: now + config.paste_timeout(),
                    });
                    debug!(timeout_ms = config.paste_timeout_ms, "paste started");
                    rest = &rest[at + PASTE_START.len()..];
                }
                PasteState::Buffering(paste) => {
                    let (content, after) = match rest.find(PASTE_END) {
                        Some(at) => (&rest[..at], Some(&rest[at + PASTE_END.len()..])),
                        None => {
                            // Inside a paste no key is waiting on a trailing ESC.
                            let cut = escape_tail_start(rest);
                            self.partial.insert_str(0, &rest[cut..]);
                            (&rest[..cut], None)
                        }
                    };

                    let current_size = paste.content.len();
                    if current_size + content.len() > config.max_paste_bytes {
                        // Bytes held for the next chunk arrived as part of the paste too.
                        let held = if after.is_none() { self.partial.len() } else { 0 };
                        let attempted_size = current_size + content.len() + held;
                        self.reset();
                        warn!(
                            current_size,
                            attempted_size,
                            max_size = config.max_paste_bytes,
                            "paste overflow, buffer discarded"
                        );
                        out.push(Segment::Event(InputEvent::PasteOverflow(PasteOverflow {
                            current_size,
                            attempted_size,
                            max_size: config.max_paste_bytes,
                        })));
                        // No marker scanning past an overflow.
                        if let Some(after) = after {
                            push_keys(out, after.to_string());
                        }
                        return;
                    }

                    paste.content.push_str(content);
                    let Some(after) = after else {
                        return;
                    };
                    let content = mem::take(&mut paste.content);
                    self.state = PasteState::Idle;
                    debug!(size = content.len(), "paste finished");
                    out.push(Segment::Event(InputEvent::Paste { content }));
                    rest = after;
                }
            }
        }
    }

    /// Fire the paste timeout if `now` is past the deadline.
    pub(crate) fn expire(&mut self, now: Instant) -> Option<InputEvent> {
        match mem::take(&mut self.state) {
            PasteState::Buffering(mut paste) if now >= paste.deadline => {
                paste.content.push_str(&mem::take(&mut self.partial));
                let elapsed = now.saturating_duration_since(paste.started_at);
                let size = paste.content.len();
                warn!(size, elapsed_ms = elapsed.as_millis() as u64, "paste timed out");
                Some(InputEvent::PasteTimeout(PasteTimeout {
                    buffer: paste.content,
                    size,
                    elapsed,
                }))
            }
            state => {
                self.state = state;
                None
            }
        }
    }

    /// Leave `Buffering` without an event, returning the buffered text
    /// followed by any bytes held for the next chunk.
    pub(crate) fn cancel(&mut self) -> Option<String> {
        match mem::take(&mut self.state) {
            PasteState::Buffering(mut paste) => {
                paste.content.push_str(&mem::take(&mut self.partial));
                Some(paste.content)
            }
            PasteState::Idle => None,
        }
    }

    pub(crate) fn take_partial(&mut self) -> String {
        mem::take(&mut self.partial)
    }

    pub(crate) fn reset(&mut self) {
        self.state = PasteState::Idle;
        self.partial.clear();
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        match &self.state {
            PasteState::Buffering(paste) => Some(paste.deadline),
            PasteState::Idle => None,
        }
    }

    pub(crate) fn is_buffering(&self) -> bool {
        matches!(self.state, PasteState::Buffering(_))
    }

    pub(crate) fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}

fn partial_marker_start(text: &str) -> Option<usize> {
    PARTIAL_MARKERS
        .iter()
        .find(|marker| text.ends_with(*marker))
        .map(|marker| text.len() - marker.len())
}

fn escape_tail_start(text: &str) -> usize {
    ["\x1b[", "\x1b"]
        .iter()
        .find(|tail| text.ends_with(*tail))
        .map_or(text.len(), |tail| text.len() - tail.len())
}

/// Ordinary input outside a paste, with stray end markers removed if
/// configured.
fn ordinary(segment: &str, config: &DecoderConfig) -> String {
    if config.strip_unmatched_markers && segment.contains(PASTE_END) {
        debug!("stripping unmatched paste end marker");
        return segment.replace(PASTE_END, "");
    }
    segment.to_string()
}

fn push_keys(out: &mut Vec<Segment>, keys: String) {
    if !keys.is_empty() {
        out.push(Segment::Keys(keys));
    }
}
