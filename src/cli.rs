use std::path::PathBuf;

use clap::Parser;

/// Command line for keyscope. Every option overrides the config file.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "keyscope")]
#[command(version)]
#[command(about = "Print decoded keypresses and bracketed pastes", long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Decode paste markers as ordinary keys
    #[arg(long)]
    pub no_paste: bool,

    /// Report stray paste end markers instead of dropping them
    #[arg(long)]
    pub keep_stray_markers: bool,

    /// Largest accepted paste in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_paste_bytes: Option<usize>,

    /// Time allowed for a paste to finish
    #[arg(long, value_name = "MS")]
    pub paste_timeout_ms: Option<u64>,

    /// Print one JSON object per event
    #[arg(long)]
    pub json: bool,
}
