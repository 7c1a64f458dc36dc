//! Printable summaries of crawl and download runs
//!
//! This module renders the merged entry list and the final tallies the
//! operator sees.

use crate::crawler::CrawlReport;
use crate::download::DownloadReport;
use crate::state::Entry;

/// Formats a byte count, switching to MB above 1 MiB
///
/// ```
/// use audio_harvest::output::format_size;
///
/// assert_eq!(format_size(2048), "2,048 bytes");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes > 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{} bytes", group_thousands(bytes))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Shortens a URL for list display
fn truncate_url(url: &str, max_chars: usize) -> String {
    if url.chars().count() <= max_chars {
        url.to_string()
    } else {
        let head: String = url.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Prints the merged entry list, grouped by page
pub fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }

    println!("=== Entries ({}) ===", entries.len());

    let mut current_page = None;
    for entry in entries {
        if current_page != Some(entry.page) {
            current_page = Some(entry.page);
            println!("\n--- Page {} ---", entry.page);
        }
        println!("{:3}. {}", entry.index, entry.title);
        println!(
            "     {} [{}]",
            truncate_url(&entry.source_ref, 60),
            entry.origin
        );
    }
    println!();
}

/// Prints crawl tallies
pub fn print_crawl_summary(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");
    println!(
        "  Pages succeeded: {}/{}",
        report.succeeded_pages, report.total_pages
    );
    println!(
        "  Pages failed: {}/{}",
        report.failed_pages, report.total_pages
    );
    println!("  Success rate: {:.1}%", report.success_ratio() * 100.0);
    println!("  Entries found: {}", report.entries.len());
    println!(
        "  Duration: {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );

    if !report.failures.is_empty() {
        println!("\nFailed pages:");
        for (page, reason) in &report.failures {
            println!("  - page {}: {}", page, reason);
        }
    }
    println!();
}

/// Prints download tallies
pub fn print_download_summary(report: &DownloadReport) {
    println!("=== Download Summary ===\n");
    println!("  Succeeded: {}/{}", report.succeeded, report.total());
    println!("  Failed: {}/{}", report.failed, report.total());
    println!("  Success rate: {:.1}%", report.success_ratio() * 100.0);
    println!("  Total size: {}", format_size(report.total_bytes));
    println!("  Directory: {}", report.destination.display());

    let failed: Vec<_> = report.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        println!("\nFailed entries:");
        for result in failed {
            println!(
                "  - {:3}. {}: {}",
                result.entry_index,
                result.filename,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    println!();
}
