use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use dirhound_scanner::{
    CancelSignal, Dispatcher, ProbeFailure, ProbeResult, RequestPolicy, ScanObserver, ScanPhase,
    ScanReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Options for configuring a scan run
pub struct ScanOptions {
    pub policy: RequestPolicy,
    pub wordlist: Vec<String>,
    pub user_agents: Vec<String>,
    pub show_progress: bool,
}

/// Prints matches as they arrive and keeps a spinner with running totals.
pub struct ConsoleObserver {
    bar: Option<ProgressBar>,
    requests: AtomicUsize,
    matches: AtomicUsize,
}

impl ConsoleObserver {
    pub fn new(show_progress: bool) -> Self {
        let bar = show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Loading candidates...");
            pb
        });

        Self {
            bar,
            requests: AtomicUsize::new(0),
            matches: AtomicUsize::new(0),
        }
    }

    fn refresh(&self) {
        if let Some(ref pb) = self.bar {
            pb.set_message(format!(
                "{} requests, {} matches",
                self.requests.load(Ordering::Relaxed),
                self.matches.load(Ordering::Relaxed)
            ));
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_and_clear();
        }
    }
}

impl ScanObserver for ConsoleObserver {
    fn on_phase(&self, phase: ScanPhase) {
        debug!("Scan phase: {}", phase);
        if let Some(ref pb) = self.bar
            && phase == ScanPhase::Draining
        {
            pb.set_message("Waiting for in-flight requests...");
        }
    }

    fn on_probe(&self, _url: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_match(&self, result: &ProbeResult) {
        self.matches.fetch_add(1, Ordering::Relaxed);
        let line = format_match(result);
        match self.bar {
            Some(ref pb) => pb.println(line),
            None => println!("{}", line),
        }
        self.refresh();
    }

    fn on_failure(&self, url: &str, failure: &ProbeFailure) {
        debug!("Failed: {} ({})", url, failure);
    }
}

pub fn colored_status(status_code: u16) -> ColoredString {
    let text = status_code.to_string();
    match status_code {
        200..=299 => text.green().bold(),
        300..=399 => text.cyan().bold(),
        400..=499 => text.yellow().bold(),
        500..=599 => text.red().bold(),
        _ => text.white(),
    }
}

/// One console line for a live match: status, timing, size and URL.
pub fn format_match(result: &ProbeResult) -> String {
    format!(
        "[{}] {:>7.3}s {:>9}B  {}",
        colored_status(result.status_code),
        result.elapsed.as_secs_f64(),
        result.content_length,
        result.url
    )
}

/// Execute a scan with the given options
pub async fn execute_scan(options: ScanOptions, cancel: CancelSignal) -> Result<ScanReport> {
    let ScanOptions {
        policy,
        wordlist,
        user_agents,
        show_progress,
    } = options;

    let observer = Arc::new(ConsoleObserver::new(show_progress));
    let dispatcher = Dispatcher::with_http_client(policy)
        .context("Failed to set up the HTTP client")?
        .with_observer(observer.clone());

    let report = dispatcher.run(wordlist, user_agents, cancel).await;
    observer.finish();

    report.context("Scan aborted")
}
