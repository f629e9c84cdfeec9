//! Diagnostics for keyscope.
//!
//! Stdout carries the decoded events and the terminal is in raw mode while
//! they are printed, so diagnostics never go to the terminal. Logs and panic
//! messages go to the file named by `KEYSCOPE_LOG`, or nowhere.

use std::fs::File;
use std::panic::{self, PanicHookInfo};
use std::path::Path;

use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var naming the log file.
pub const LOG_ENV: &str = "KEYSCOPE_LOG";

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Install the file subscriber when `KEYSCOPE_LOG` is set.
///
/// Verbosity comes from `RUST_LOG`, default `info`. Runs before raw mode, so
/// a log file that cannot be created is still reported on stderr.
pub fn init_tracing() {
    let Some(file) = log_file() else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}

fn log_file() -> Option<File> {
    let path = std::env::var_os(LOG_ENV)?;
    match File::create(&path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!(
                "keyscope: cannot create log file {}: {err}",
                Path::new(&path).display()
            );
            None
        }
    }
}

/// Sends panic messages to the log instead of stderr while alive.
///
/// Listener panics are caught by the decoder, but the hook still runs and the
/// default one would print over the event output. The previous hook is
/// restored on drop.
pub struct PanicToLog {
    previous: Option<PanicHook>,
}

impl PanicToLog {
    pub fn install() -> Self {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(|info| {
            error!(%info, "panic");
        }));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for PanicToLog {
    fn drop(&mut self) {
        // set_hook itself panics while unwinding.
        if std::thread::panicking() {
            return;
        }
        if let Some(previous) = self.previous.take() {
            panic::set_hook(previous);
        }
    }
}
