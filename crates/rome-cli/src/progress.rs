//! Live progress spinner

use indicatif::{ProgressBar, ProgressStyle};
use rome_engine::ProgressCounter;
use std::time::Duration;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(100);

/// Spinner showing the live entry count of a running build
pub struct ProgressTicker {
    progress_bar: Option<ProgressBar>,
    updater: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Start ticking; does nothing in quiet mode
    pub fn start(counter: ProgressCounter, quiet: bool) -> Self {
        if quiet {
            return Self {
                progress_bar: None,
                updater: None,
            };
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Walking source tree...");
        pb.enable_steady_tick(TICK);

        let bar = pb.clone();
        let updater = tokio::spawn(async move {
            loop {
                bar.set_message(format!("Processed {} entries", counter.get()));
                tokio::time::sleep(TICK).await;
            }
        });

        Self {
            progress_bar: Some(pb),
            updater: Some(updater),
        }
    }

    /// Stop the spinner and clear it from the terminal
    pub fn finish(self) {
        if let Some(updater) = self.updater {
            updater.abort();
        }
        if let Some(pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }
}
