//! CLI argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streamlog")]
#[command(about = "Record live-stream chat to a resumable JSON log")]
#[command(
    long_about = r#"Record live-stream chat to a resumable JSON log

USAGE:
  streamlog <URL>                # Record chat, output to <live_id>.json
  streamlog <URL> -o chat.json   # Record chat to a chosen file

If the output file already exists, its history is loaded and the recording
resumes where it left off; only genuinely new messages are appended. When
the server's retained chat window no longer overlaps the recovered history,
a warning is printed because messages in between may be lost."#
)]
#[command(version)]
pub struct Cli {
    /// Live stream URL to record chat from
    pub url: String,

    /// Output file name (default: <live_id>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds to sleep between poll cycles
    #[arg(long, default_value_t = 1)]
    pub interval: u64,

    /// Seconds without new messages before the staleness warning
    #[arg(long = "stale-after", default_value_t = 120)]
    pub stale_after: u64,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}
