//! Main entry point for the zipseek CLI application.
//!
//! Parses arguments (or prompts for them in interactive mode), runs the
//! archive search and prints per-entry occurrences followed by a summary.

use anyhow::{Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use zipseek::{ArchiveSource, Cli, PatternSet, SearchConfig, SearchResult, search_archive};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; anything else is a
            // usage error.
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let (location, keywords) = if cli.interactive {
        prompt_for_search().await?
    } else {
        (cli.archive.clone().unwrap_or_default(), cli.keywords.clone())
    };

    let source = ArchiveSource::parse(&location);
    if let ArchiveSource::Local(path) = &source
        && !path.exists()
    {
        bail!("File does not exist: {}", path.display());
    }

    let config = SearchConfig::default()
        .case_insensitive(cli.ignore_case)
        .workers(cli.jobs);
    let patterns = PatternSet::new(keywords, &config)?;

    let quiet = cli.quiet;
    let summary = search_archive(&source, patterns, config, move |result| {
        print_result(result, quiet)
    })
    .await?;

    println!(
        "Search complete. Total occurrences: {}",
        summary.total_matches
    );
    println!("Time taken: {:.3} seconds", summary.elapsed.as_secs_f64());

    if source.is_remote() {
        eprintln!(
            "Total bytes transferred: {}",
            format_size(summary.bytes_transferred)
        );
    }
    if !summary.failed_entries.is_empty() {
        eprintln!(
            "{} entries could not be searched",
            summary.failed_entries.len()
        );
    }

    Ok(())
}

/// Log to stderr so match output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Interactive mode: read keywords (whitespace separated) and the archive
/// location from stdin.
async fn prompt_for_search() -> Result<(String, Vec<String>)> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(b"Enter the keywords to search: ").await?;
    stdout.flush().await?;
    let keywords: Vec<String> = lines
        .next_line()
        .await?
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    stdout.write_all(b"Enter the zip filename to search in: ").await?;
    stdout.flush().await?;
    let location = lines.next_line().await?.unwrap_or_default().trim().to_string();

    if location.is_empty() {
        bail!("No archive given");
    }
    Ok((location, keywords))
}

/// Print one entry's occurrences. Runs under the aggregation lock, so lines
/// from different entries never interleave.
fn print_result(result: &SearchResult, quiet: bool) {
    if quiet && result.occurrences.is_empty() {
        return;
    }

    println!(
        "Occurrences in \"{}\": {}",
        result.entry_name,
        result.occurrences.len()
    );
    for occurrence in &result.occurrences {
        println!(
            "  Line {}, Column {} [{}]: {}",
            occurrence.line,
            occurrence.column,
            occurrence.pattern,
            occurrence.context.replace(['\n', '\r'], " ")
        );
    }
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
