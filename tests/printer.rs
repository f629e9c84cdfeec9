//! Tests for the event printer and quit listener driven by a real decoder.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use keyscope::printer::{describe, EventPrinter, Format, QuitOnInterrupt};
use parking_lot::Mutex;
use term_input::{DecoderConfig, InputEvent, KeypressDecoder, PasteTimeout};
use tokio::sync::Notify;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("utf8 output")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn decoder_printing(format: Format) -> (KeypressDecoder, SharedBuf) {
    let out = SharedBuf::default();
    let decoder = KeypressDecoder::new(DecoderConfig::bracketed_paste())
        .with_listener(EventPrinter::new(out.clone(), format));
    (decoder, out)
}

#[test]
fn human_output_lists_keys_and_pastes() {
    let (mut decoder, out) = decoder_printing(Format::Human);
    decoder.feed(b"\x1b[1;5A\x1b[200~two\nlines\x1b[201~");

    assert_eq!(
        out.text(),
        "keypress: ctrl up \"\\u{1b}[1;5A\" code=\"[A\"\r\n\
         paste: 9 bytes, 2 lines \"two\\nlines\"\r\n"
    );
}

#[test]
fn json_output_is_one_object_per_line() {
    let (mut decoder, out) = decoder_printing(Format::Json);
    decoder.feed(b"x\x1b[200~hi\x1b[201~");

    let text = out.text();
    let lines: Vec<serde_json::Value> = text
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "keypress");
    assert_eq!(lines[0]["ch"], "x");
    assert_eq!(lines[0]["key"]["name"], "x");
    assert_eq!(lines[1]["kind"], "paste");
    assert_eq!(lines[1]["content"], "hi");
}

#[test]
fn timeout_is_described_with_buffer() {
    let event = InputEvent::PasteTimeout(PasteTimeout {
        buffer: "abc".to_string(),
        size: 3,
        elapsed: Duration::from_millis(75),
    });
    assert_eq!(describe(&event), "paste-timeout: 3 bytes after 75ms \"abc\"");
}

#[tokio::test]
async fn ctrl_c_wakes_quit() {
    let quit = Arc::new(Notify::new());
    let mut decoder =
        KeypressDecoder::default().with_listener(QuitOnInterrupt::new(Arc::clone(&quit)));

    decoder.feed(b"c");
    decoder.feed(b"\x03");

    tokio::time::timeout(Duration::from_secs(1), quit.notified())
        .await
        .expect("quit notified");
}
