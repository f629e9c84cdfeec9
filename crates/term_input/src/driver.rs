//! Async pump: reads an input source into a [`KeypressDecoder`] and fires the
//! paste timeout when nothing arrives before the deadline.

use std::future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{self, Instant};
use tracing::debug;

use crate::decoder::KeypressDecoder;

const READ_BUF_SIZE: usize = 4096;

/// Drive `decoder` from `source` until EOF.
///
/// Events reach the decoder's listeners as they are decoded. The decoder is
/// closed on return, whether the source ended or failed.
pub async fn drive<R>(decoder: &mut KeypressDecoder, mut source: R) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let result = loop {
        let deadline = decoder.paste_deadline();
        tokio::select! {
            read = source.read(&mut buf) => match read {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    decoder.feed(&buf[..n]);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => break Err(err),
            },
            () = wait_for(deadline) => {
                decoder.expire(Instant::now());
            }
        }
    };

    debug!(ok = result.is_ok(), "input source finished");
    decoder.close();
    result
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
