//! Main entry point for the folderzip CLI application.
//!
//! This binary provides a command-line interface for archiving folders into
//! ZIP files, extracting them again, and listing their contents.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;

use folderzip::cli::Command;
use folderzip::{
    CancellationToken, Cli, CompressionMethod, Error, ProgressSink, TransferOptions, ZipReader,
};

/// Application entry point.
///
/// Parses command-line arguments, installs logging and Ctrl-C handling, and
/// dispatches to the requested subcommand.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C requests cooperative cancellation; the worker stops at the next chunk
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let mut options = TransferOptions::default().with_cancel(cancel);
    if cli.shows_progress() {
        options = options.with_progress(Arc::new(PercentPrinter::new()));
    }

    let outcome = match cli.command {
        Command::Create {
            ref folder,
            ref archive,
            store,
            buffer_size,
        } => {
            let compression = if store {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflate
            };
            let options = options
                .with_compression(compression)
                .with_buffer_size(buffer_size);
            folderzip::create_from_folder(folder, archive, options).await
        }
        Command::Extract {
            ref archive,
            ref dest,
        } => folderzip::extract_to_folder(archive, dest, options).await,
        Command::List { ref archive } => return list_files(archive).map(|_| ExitCode::SUCCESS),
    };

    if cli.shows_progress() {
        eprintln!();
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(Error::Canceled) => {
            eprintln!("canceled");
            Ok(ExitCode::from(130))
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints whole percentages to stderr, skipping repeats.
struct PercentPrinter {
    last: AtomicU32,
}

impl PercentPrinter {
    fn new() -> Self {
        Self {
            last: AtomicU32::new(u32::MAX),
        }
    }
}

impl ProgressSink for PercentPrinter {
    fn report(&self, fraction: f64) {
        let percent = (fraction * 100.0).floor() as u32;
        if self.last.swap(percent, Ordering::Relaxed) != percent {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r{:>3}%", percent);
            let _ = stderr.flush();
        }
    }
}

/// List files in the archive as a table with sizes, ratio and timestamps.
fn list_files(archive: &Path) -> Result<()> {
    let reader = ZipReader::open(archive)?;
    let entries = reader.entries()?;

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    // Track totals for summary line
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files ({})",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count,
        format_size(total_uncompressed)
    );

    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "   0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_column_has_fixed_width() {
        assert_eq!(ratio(0, 0), "   0%");
        assert_eq!(ratio(50, 100), "  50%");
        assert_eq!(ratio(200, 100), "   0%");
        assert_eq!(ratio(0, 100).len(), ratio(0, 0).len());
    }
}
