//! Streamlog CLI application
//!
//! Records the live chat of a stream into a JSON file that survives
//! restarts: rerunning against the same output file resumes the recording
//! and appends only messages that were not already captured.

mod args;
mod console;

use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use streamlog_core::{
    bootstrap_session, ChatPoller, ChatTransport, FileHistoryStorage, HttpTransport, Recorder,
    RecorderConfig, ResumeReport, RunOutcome, StreamlogError, StreamlogResult,
};

use args::Cli;
use console::Console;

#[tokio::main]
async fn main() -> StreamlogResult<()> {
    // Initialize logging with environment-based filtering
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let console = Console::new(cli.verbose);

    let transport: Arc<dyn ChatTransport> = Arc::new(HttpTransport::new());

    console.info(&format!("Fetching stream page {}", cli.url));
    let session = bootstrap_session(transport.as_ref(), &cli.url).await?;
    debug!("Session bootstrapped for live id {}", session.live_id);

    if session.is_replay {
        return Err(StreamlogError::unsupported(
            "stream is offline; replay chat recording is not implemented",
        ));
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.json", session.live_id)));

    let config = RecorderConfig {
        poll_interval_secs: cli.interval,
        stale_after_secs: cli.stale_after,
    };

    let storage = Arc::new(FileHistoryStorage::new(&output));
    let poller = ChatPoller::new(transport, &session);
    let mut recorder = Recorder::new(poller, storage, config, session.continuation);

    if output.exists() {
        console.status(&format!("Loading existing history from {}", output.display()));
        if let Some(report) = recorder.resume().await? {
            report_resume(&console, &report);
        }
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    console.status(&format!(
        "[{}] Started live chat recording to {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        output.display()
    ));

    let result = recorder.run(shutdown).await;

    console.status(&format!(
        "[{}] Stopped live chat recording with {} messages",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        recorder.log().len()
    ));

    match result {
        Ok(RunOutcome::ContinuationExhausted) => {
            console.success("Live chat ended");
            Ok(())
        }
        Ok(RunOutcome::Cancelled) => {
            console.status("Recording cancelled");
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Recording stopped after error: {e}"));
            Err(e)
        }
    }
}

fn report_resume(console: &Console, report: &ResumeReport) {
    if let Some(usec) = report.last_timestamp_micros {
        if let Some(when) = chrono::DateTime::from_timestamp_micros(usec as i64) {
            console.status(&format!(
                "Found previous data that ended at [{}]",
                when.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }

    if report.gap_possible {
        console.warn(
            "WARNING: all chat history from the server is newer than the recovered file; \
             messages may be missing between the recovered and current data",
        );
    } else {
        console.status(&format!("Added {} new chats", report.appended));
    }
}
