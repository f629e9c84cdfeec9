use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use term_input::driver::drive;
use term_input::{BracketedPaste, KeypressDecoder};
use tokio::sync::Notify;
use tracing::info;

use crate::cli::Args;
use crate::config::AppConfig;
use crate::logging::PanicToLog;
use crate::printer::{EventPrinter, Format, QuitOnInterrupt};

pub fn run(args: Args) -> Result<()> {
    let config = AppConfig::load_with_args(&args).context("failed to load configuration")?;
    info!(?config, "starting keyscope");

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    let result = runtime.block_on(session(config));
    // The stdin reader thread may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn session(config: AppConfig) -> Result<()> {
    let interactive = stdin_is_tty();
    let format = if config.output.json {
        Format::Json
    } else {
        Format::Human
    };

    let quit = Arc::new(Notify::new());
    let mut decoder = KeypressDecoder::new(config.decoder.clone())
        .with_listener(EventPrinter::new(io::stdout(), format))
        .with_listener(QuitOnInterrupt::new(Arc::clone(&quit)));

    let _raw_mode = if interactive {
        enable_raw_mode().context("failed to enable raw mode")?;
        Some(scopeguard::guard((), |()| {
            let _ = disable_raw_mode();
        }))
    } else {
        None
    };
    let _panics = interactive.then(PanicToLog::install);
    let _paste_mode = if interactive && config.decoder.paste_enabled {
        Some(BracketedPaste::enable(io::stdout()).context("failed to enable bracketed paste")?)
    } else {
        None
    };
    if interactive {
        eprint!("keyscope: type or paste, ctrl-c to quit\r\n");
    }

    tokio::select! {
        result = drive(&mut decoder, tokio::io::stdin()) => {
            result.context("failed to read stdin")?;
            info!("stdin closed");
        }
        () = quit.notified() => info!("interrupted"),
    }
    Ok(())
}

fn stdin_is_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}
