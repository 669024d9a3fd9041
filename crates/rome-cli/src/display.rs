//! Display utilities for the rome CLI

use console::style;
use rome_engine::MirrorReport;
use std::time::Duration;

/// Print the end of run summary
pub fn print_build_summary(report: &MirrorReport) {
    let stats = &report.stats;

    println!();
    println!(
        "{} Built {} files in {}",
        style("✓").green().bold(),
        style(stats.entries).green(),
        style(format_duration(stats.duration)).blue()
    );
    println!(
        "  Files: {}  Links: {}  Skipped directories: {}",
        style(stats.files_built).cyan(),
        style(stats.links_created).cyan(),
        style(stats.directories_skipped).yellow()
    );
    if stats.completed() > 0 {
        println!(
            "  Rate: {:.0} entries/s",
            style(stats.entries_per_second()).dim()
        );
    }
    if stats.backpressure_events > 0 {
        println!(
            "  Queue full waits: {}",
            style(stats.backpressure_events).dim()
        );
    }

    if report.has_failures() {
        display_warning(&format!("Completed with {} errors", report.failures.len()));
        for failure in &report.failures {
            println!("    {} {}", style("•").red(), style(failure).dim());
        }
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message with proper formatting
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display an info message with proper formatting
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}
